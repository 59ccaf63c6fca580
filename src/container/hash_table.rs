use crate::common::exception::Result;

/// Key/value map contract the buffer pool programs its page table against.
pub trait HashTable<K, V> {
    fn find(&self, key: &K) -> Option<V>;
    fn remove(&self, key: &K) -> bool;
    fn insert(&self, key: K, value: V) -> Result<()>;
}
