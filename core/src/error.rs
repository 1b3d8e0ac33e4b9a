use thiserror::Error;

#[derive(Debug, Error)]
pub enum FatError {
    #[error("Invalid boot signature: {0:#06x} (expected 0xaa55)")]
    InvalidSignature(u16),

    #[error("Unsupported filesystem: {0}")]
    UnsupportedFilesystem(String),

    #[error("Unsupported volume geometry: {0}")]
    UnsupportedGeometry(String),

    #[error("FAT cache truncated: volume has {sectors_per_fat} sectors per FAT, cache holds {capacity}")]
    FatCacheTruncated {
        sectors_per_fat: u32,
        capacity: usize,
    },

    #[error("Cluster {0} is outside the cached FAT region")]
    OutOfRange(u16),

    #[error("Corrupt cluster chain: {0}")]
    CorruptChain(String),

    #[error("Too many open files (limit {0})")]
    TooManyOpenFiles(usize),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid file descriptor: {0}")]
    InvalidDescriptor(usize),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl From<FatError> for std::io::Error {
    fn from(err: FatError) -> Self {
        match err {
            FatError::IoError(e) => e,
            other => std::io::Error::new(std::io::ErrorKind::Other, other),
        }
    }
}
