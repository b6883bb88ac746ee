use crate::integrity::error::{IntegrityError, IntegrityResult};
use blake3::Hasher;
use std::io::{ErrorKind, Read};
use std::path::Path;
use tokio::io::AsyncReadExt;

/// Checks that a reconstructed target matches the source it came from
///
/// Deltas carry no checksum of their own, so callers that want end-to-end
/// assurance compare digests of source and target out of band.
pub struct IntegrityVerifier;

impl IntegrityVerifier {
    /// Calculate BLAKE3 checksum for byte slice
    pub fn calculate_checksum(data: &[u8]) -> [u8; 32] {
        let mut hasher = Hasher::new();
        hasher.update(data);
        *hasher.finalize().as_bytes()
    }

    /// Calculate BLAKE3 checksum of everything a reader yields
    pub fn calculate_reader_checksum<R: Read>(reader: &mut R) -> IntegrityResult<[u8; 32]> {
        let mut hasher = Hasher::new();
        let mut buffer = vec![0u8; 8192];

        loop {
            let n = match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };
            hasher.update(&buffer[..n]);
        }

        Ok(*hasher.finalize().as_bytes())
    }

    /// Calculate BLAKE3 checksum for file (streaming)
    pub async fn calculate_file_checksum(path: &Path) -> IntegrityResult<[u8; 32]> {
        let mut file = tokio::fs::File::open(path).await.map_err(|e| {
            IntegrityError::FileNotFound(format!("{}: {}", path.display(), e))
        })?;

        let mut hasher = Hasher::new();
        let mut buffer = vec![0u8; 8192];

        loop {
            let n = file.read(&mut buffer).await?;
            if n == 0 {
                break;
            }
            hasher.update(&buffer[..n]);
        }

        Ok(*hasher.finalize().as_bytes())
    }

    /// Verify that `actual` has the same content as `expected`
    pub fn verify_reconstruction(expected: &[u8], actual: &[u8]) -> IntegrityResult<()> {
        Self::verify_checksum(
            Self::calculate_checksum(expected),
            Self::calculate_checksum(actual),
        )
    }

    /// Verify that two files have identical content
    pub async fn verify_files(expected: &Path, actual: &Path) -> IntegrityResult<()> {
        let expected_sum = Self::calculate_file_checksum(expected).await?;
        let actual_sum = Self::calculate_file_checksum(actual).await?;
        Self::verify_checksum(expected_sum, actual_sum)
    }

    fn verify_checksum(expected: [u8; 32], actual: [u8; 32]) -> IntegrityResult<()> {
        if expected != actual {
            return Err(IntegrityError::ChecksumMismatch { expected, actual });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::TempDir;
    use tokio::io::AsyncWriteExt;

    #[test]
    fn test_checksum_calculation() {
        let data = b"Hello, World!";
        let checksum = IntegrityVerifier::calculate_checksum(data);
        assert_eq!(checksum.len(), 32);

        // Same data should produce same checksum
        let checksum2 = IntegrityVerifier::calculate_checksum(data);
        assert_eq!(checksum, checksum2);

        // Different data should produce different checksum
        let data2 = b"Hello, Rust!";
        let checksum3 = IntegrityVerifier::calculate_checksum(data2);
        assert_ne!(checksum, checksum3);
    }

    #[test]
    fn test_reader_checksum() {
        let data = vec![7u8; 20_000];
        let from_reader =
            IntegrityVerifier::calculate_reader_checksum(&mut Cursor::new(&data)).unwrap();

        assert_eq!(from_reader, IntegrityVerifier::calculate_checksum(&data));
    }

    #[tokio::test]
    async fn test_file_checksum() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("test.txt");

        let data = b"Test file content for checksum verification";
        let mut file = tokio::fs::File::create(&file_path).await.unwrap();
        file.write_all(data).await.unwrap();
        file.sync_all().await.unwrap();
        drop(file);

        let file_checksum = IntegrityVerifier::calculate_file_checksum(&file_path)
            .await
            .unwrap();
        let data_checksum = IntegrityVerifier::calculate_checksum(data);

        assert_eq!(file_checksum, data_checksum);
    }

    #[tokio::test]
    async fn test_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let result =
            IntegrityVerifier::calculate_file_checksum(&temp_dir.path().join("missing")).await;

        assert!(matches!(result, Err(IntegrityError::FileNotFound(_))));
    }

    #[test]
    fn test_verify_reconstruction() {
        assert!(IntegrityVerifier::verify_reconstruction(b"same", b"same").is_ok());

        let result = IntegrityVerifier::verify_reconstruction(b"source", b"target");
        assert!(matches!(
            result,
            Err(IntegrityError::ChecksumMismatch { .. })
        ));
    }

    #[tokio::test]
    async fn test_verify_files() {
        let temp_dir = TempDir::new().unwrap();
        let a = temp_dir.path().join("a");
        let b = temp_dir.path().join("b");
        tokio::fs::write(&a, b"content").await.unwrap();
        tokio::fs::write(&b, b"content").await.unwrap();

        assert!(IntegrityVerifier::verify_files(&a, &b).await.is_ok());

        tokio::fs::write(&b, b"changed").await.unwrap();
        assert!(IntegrityVerifier::verify_files(&a, &b).await.is_err());
    }
}
