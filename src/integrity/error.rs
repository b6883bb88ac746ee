use thiserror::Error;

#[derive(Error, Debug)]
pub enum IntegrityError {
    #[error("Checksum mismatch: expected {expected:?}, got {actual:?}")]
    ChecksumMismatch {
        expected: [u8; 32],
        actual: [u8; 32],
    },

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type IntegrityResult<T> = Result<T, IntegrityError>;
