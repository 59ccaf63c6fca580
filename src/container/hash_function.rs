use std::any::Any;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use xxhash_rust::xxh3;

/// Produces the 64-bit hash a table uses to address its directory.
///
/// Only the low-order bits are consumed, so implementations must spread
/// entropy into the bottom of the word.
pub trait KeyHasher<K> {
    fn hash_key(&self, key: &K) -> u64;
}

/// Represents a hash function for a given key type.
pub struct HashFunction<K> {
    _marker: PhantomData<fn(&K)>,
}

impl<K> HashFunction<K> {
    /// Creates a new `HashFunction`.
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<K> Default for HashFunction<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> Clone for HashFunction<K> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<K> fmt::Debug for HashFunction<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("HashFunction(xxh3)")
    }
}

impl<K> HashFunction<K>
where
    K: Any + Hash,
{
    /// Returns the xxh3 hash value of the given key.
    ///
    /// Integer and string keys are fed to the hasher directly; everything else
    /// goes through its `Hash` impl.
    pub fn get_hash(&self, key: &K) -> u64 {
        let mut hasher = xxh3::Xxh3::new();
        let any = key as &dyn Any;

        if let Some(v) = any.downcast_ref::<u64>() {
            hasher.write_u64(*v);
        } else if let Some(v) = any.downcast_ref::<u32>() {
            hasher.write_u32(*v);
        } else if let Some(v) = any.downcast_ref::<i64>() {
            hasher.write_i64(*v);
        } else if let Some(v) = any.downcast_ref::<i32>() {
            hasher.write_i32(*v);
        } else if let Some(v) = any.downcast_ref::<usize>() {
            hasher.write_usize(*v);
        } else if let Some(v) = any.downcast_ref::<String>() {
            hasher.write(v.as_bytes());
        } else if let Some(v) = any.downcast_ref::<&'static str>() {
            hasher.write(v.as_bytes());
        } else {
            key.hash(&mut hasher);
        }

        hasher.finish()
    }
}

impl<K> KeyHasher<K> for HashFunction<K>
where
    K: Any + Hash,
{
    #[inline]
    fn hash_key(&self, key: &K) -> u64 {
        self.get_hash(key)
    }
}

/// Uses the key's own integer value as its hash.
///
/// Suited to dense identifiers such as page ids, whose low bits already
/// differ from one key to the next.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityHasher;

impl<K> KeyHasher<K> for IdentityHasher
where
    K: Copy + Into<u64>,
{
    #[inline]
    fn hash_key(&self, key: &K) -> u64 {
        (*key).into()
    }
}
