//! Rolling hash implementation for delta generation
//!
//! Uses a polynomial rolling checksum over a fixed-width window so the
//! delta generator can slide one byte at a time in O(1).

/// Trait for rolling hash implementations
pub trait RollingHash {
    /// Clear the hash state for a fresh window
    fn reset(&mut self);

    /// Fold one byte in while the window is still filling
    fn absorb(&mut self, byte: u8);

    /// Fold `incoming` in and evict `outgoing` from a full window
    fn slide(&mut self, incoming: u8, outgoing: u8);

    /// Get the current hash value
    fn value(&self) -> u32;
}

/// Multiplier of the polynomial
const BASE: u32 = 31;

/// Polynomial rolling checksum
///
/// For a window `b0..b(n-1)` the hash is `b0*31^(n-1) + ... + b(n-1)`,
/// computed in wrapping 32-bit arithmetic. Bytes are folded in as signed
/// values (-128..=127), which fixes the weak hash stored in signature files.
/// It is a cheap pre-filter only; collisions are resolved by the strong hash.
#[derive(Debug, Clone)]
pub struct PolynomialRolling {
    hash: u32,
    /// `31^window`, the weight a byte carries once it leaves a full window
    base_pow: u32,
    window: usize,
}

/// Sign-extend a byte into the hash's 32-bit ring
#[inline]
fn term(byte: u8) -> u32 {
    byte as i8 as i32 as u32
}

impl PolynomialRolling {
    /// Create a rolling hash for windows of `window` bytes
    pub fn new(window: usize) -> Self {
        let base_pow = (0..window).fold(1u32, |acc, _| acc.wrapping_mul(BASE));
        Self {
            hash: 0,
            base_pow,
            window,
        }
    }

    /// Window width this hash was built for
    pub fn window(&self) -> usize {
        self.window
    }

    /// Fold a run of bytes in, as repeated `absorb`
    pub fn absorb_slice(&mut self, data: &[u8]) {
        for &byte in data {
            self.absorb(byte);
        }
    }

    /// Compute the hash of `data` from scratch (for verification)
    pub fn checksum(data: &[u8]) -> u32 {
        data.iter()
            .fold(0u32, |hash, &byte| hash.wrapping_mul(BASE).wrapping_add(term(byte)))
    }
}

impl RollingHash for PolynomialRolling {
    fn reset(&mut self) {
        self.hash = 0;
    }

    fn absorb(&mut self, byte: u8) {
        self.hash = self.hash.wrapping_mul(BASE).wrapping_add(term(byte));
    }

    fn slide(&mut self, incoming: u8, outgoing: u8) {
        self.hash = self
            .hash
            .wrapping_mul(BASE)
            .wrapping_add(term(incoming))
            .wrapping_sub(term(outgoing).wrapping_mul(self.base_pow));
    }

    fn value(&self) -> u32 {
        self.hash
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absorb_matches_checksum() {
        let data = b"Hello, World!";

        let mut rolling = PolynomialRolling::new(data.len());
        rolling.absorb_slice(data);

        assert_eq!(rolling.value(), PolynomialRolling::checksum(data));
    }

    #[test]
    fn test_known_value() {
        // 'a' * 31^2 + 'b' * 31 + 'c'
        let expected = 97 * 961 + 98 * 31 + 99;
        assert_eq!(PolynomialRolling::checksum(b"abc"), expected);
    }

    #[test]
    fn test_high_bytes_are_signed() {
        // (-1 * 31 + -128) * 31 + 16 = -4913
        assert_eq!(PolynomialRolling::checksum(&[0xFF, 0x80, 0x10]), 0xFFFF_ECCF);
        assert_eq!(PolynomialRolling::checksum(&[0xFF]), u32::MAX);
        assert_eq!(PolynomialRolling::checksum(&[0x7F]), 127);

        let mut rolling = PolynomialRolling::new(3);
        rolling.absorb_slice(&[0x00, 0xFF, 0x80]);
        rolling.slide(0x10, 0x00);
        assert_eq!(rolling.value(), 0xFFFF_ECCF);
    }

    #[test]
    fn test_sliding_matches_full_computation() {
        let data = b"The quick brown fox jumps over the lazy dog";

        for window in [1, 4, 8, 16] {
            let mut rolling = PolynomialRolling::new(window);
            rolling.absorb_slice(&data[..window]);
            assert_eq!(rolling.value(), PolynomialRolling::checksum(&data[..window]));

            for i in 1..=data.len() - window {
                rolling.slide(data[i + window - 1], data[i - 1]);

                let expected = PolynomialRolling::checksum(&data[i..i + window]);
                assert_eq!(
                    rolling.value(),
                    expected,
                    "Window {}, position {}",
                    window,
                    i
                );
            }
        }
    }

    #[test]
    fn test_sliding_wraps_on_overflow() {
        // Long windows of high bytes overflow 32 bits many times over
        let data: Vec<u8> = (0..4096u32).map(|i| (i * 7 % 251) as u8 | 0x80).collect();
        let window = 2048;

        let mut rolling = PolynomialRolling::new(window);
        rolling.absorb_slice(&data[..window]);

        for i in 1..=data.len() - window {
            rolling.slide(data[i + window - 1], data[i - 1]);
        }

        assert_eq!(
            rolling.value(),
            PolynomialRolling::checksum(&data[data.len() - window..])
        );
    }

    #[test]
    fn test_reset() {
        let mut rolling = PolynomialRolling::new(4);
        rolling.absorb_slice(b"test");
        let first = rolling.value();

        rolling.reset();
        assert_eq!(rolling.value(), 0);

        rolling.absorb_slice(b"test");
        assert_eq!(rolling.value(), first);
        assert_eq!(rolling.window(), 4);
    }

    #[test]
    fn test_rolling_hash_trait() {
        fn feed<H: RollingHash>(hasher: &mut H, data: &[u8]) -> u32 {
            hasher.reset();
            for &b in data {
                hasher.absorb(b);
            }
            hasher.value()
        }

        let mut hasher = PolynomialRolling::new(4);
        let d1 = feed(&mut hasher, b"test");
        let d2 = feed(&mut hasher, b"test");
        assert_eq!(d1, d2);
        assert_ne!(d1, feed(&mut hasher, b"tesT"));
    }
}
