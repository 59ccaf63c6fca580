use crate::common::exception::HashTableError;

pub type FrameId = u64; // frame id type
pub type PageId = u64; // page id type

pub const BUCKET_SIZE: usize = 50; // size of extendible hash bucket

/// Width of the hash produced by `HashFunction`, in bits.
pub const HASH_BITS: u32 = u64::BITS;

/// Default cap on how many hash bits a bucket may consume before a split
/// cascade is reported as a degenerate hash rather than growing further.
pub const HTABLE_DIRECTORY_MAX_DEPTH: u32 = 32;

/// Construction parameters for an extendible hash table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashTableConfig {
    /// Maximum number of entries a single bucket holds before it splits.
    pub bucket_capacity: usize,
    /// Upper bound for both local and global depth.
    pub max_depth: u32,
}

impl Default for HashTableConfig {
    fn default() -> Self {
        Self {
            bucket_capacity: BUCKET_SIZE,
            max_depth: HTABLE_DIRECTORY_MAX_DEPTH,
        }
    }
}

impl HashTableConfig {
    pub fn new(bucket_capacity: usize) -> Self {
        Self {
            bucket_capacity,
            ..Self::default()
        }
    }

    pub fn with_bucket_capacity(mut self, bucket_capacity: usize) -> Self {
        self.bucket_capacity = bucket_capacity;
        self
    }

    pub fn with_max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Checks that the capacity is positive and the depth cap fits inside the hash width.
    pub fn validate(&self) -> Result<(), HashTableError> {
        if self.bucket_capacity == 0 {
            return Err(HashTableError::InvalidBucketCapacity(self.bucket_capacity));
        }
        if self.max_depth > HASH_BITS {
            return Err(HashTableError::InvalidMaxDepth {
                max_depth: self.max_depth,
                hash_bits: HASH_BITS,
            });
        }
        Ok(())
    }
}
