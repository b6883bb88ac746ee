use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid signature file: {length} bytes is not a multiple of the {record_width}-byte record width")]
    InvalidSignatureFile { length: u64, record_width: usize },

    #[error("Unsupported strong hash algorithm: {0}")]
    UnsupportedDigest(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid delta: unknown opcode {opcode} at offset {offset}")]
    InvalidDelta { offset: u64, opcode: u8 },

    #[error("Delta references block {block_index}, which is past the end of the base file")]
    BlockOutOfRange { block_index: u32 },

    #[error("Base file has more blocks than a 32-bit block index can address")]
    BlockIndexOverflow,

    #[error("Background task failed: {0}")]
    BackgroundTask(String),
}

pub type Result<T> = std::result::Result<T, SyncError>;
