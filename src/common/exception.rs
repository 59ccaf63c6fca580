use std::collections::TryReserveError;
use thiserror::Error;

/// Result type alias using HashTableError.
pub type Result<T> = std::result::Result<T, HashTableError>;

#[derive(Error, Debug)]
pub enum HashTableError {
    #[error("Failed to allocate hash table storage: {0}")]
    AllocationFailed(#[from] TryReserveError),
    #[error("Split cascade reached local depth {local_depth} (max depth {max_depth}), hash function is degenerate")]
    DepthLimitExceeded { local_depth: u32, max_depth: u32 },
    #[error("Bucket capacity must be positive, got {0}")]
    InvalidBucketCapacity(usize),
    #[error("Max depth {max_depth} exceeds hash width of {hash_bits} bits")]
    InvalidMaxDepth { max_depth: u32, hash_bits: u32 },
    #[error("Hash table integrity violated: {0}")]
    IntegrityViolation(String),
}
