pub mod common;
pub mod container;

pub use common::config::{FrameId, HashTableConfig, PageId};
pub use common::exception::{HashTableError, Result};
pub use container::extendible_hash_table::{ExtendibleHashTable, HashTableStats, PageTable};
pub use container::hash_function::{HashFunction, IdentityHasher, KeyHasher};
pub use container::hash_table::HashTable;
