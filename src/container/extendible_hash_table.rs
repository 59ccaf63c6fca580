//! In-memory extendible hash table.
//!
//! The buffer pool uses this as its page table (`PageId -> FrameId`). A
//! directory of `2^global_depth` slots indexes buckets by the low-order bits
//! of each key's hash. Several slots may share one bucket; when a bucket
//! overflows it splits on its next hash bit, and the directory doubles only
//! when that bit is not yet part of the global depth.
//!
//! Buckets live in an arena and slots hold arena indices, so repointing a slot
//! after a split is a single write. The whole table sits behind one
//! `RwLock`: lookups share it, mutations hold it exclusively.

use crate::common::config::{FrameId, HashTableConfig, PageId, BUCKET_SIZE};
use crate::common::exception::{HashTableError, Result};
use crate::container::hash_function::{HashFunction, KeyHasher};
use crate::container::hash_table::HashTable;
use log::{debug, error, info, trace, warn};
use parking_lot::RwLock;
use std::collections::{HashMap, TryReserveError};
use std::fmt;
use std::hash::Hash;

/// Index of a bucket inside the table's bucket arena.
pub type BucketId = usize;

/// Page table used by the buffer pool manager.
pub type PageTable = ExtendibleHashTable<PageId, FrameId>;

/// Returns a mask of `depth` 1's in the low-order bits.
#[inline]
fn depth_mask(depth: u32) -> u64 {
    1u64.checked_shl(depth).map_or(u64::MAX, |bit| bit - 1)
}

fn allocation_failed(err: TryReserveError) -> HashTableError {
    error!("Hash table allocation failed: {}", err);
    HashTableError::AllocationFailed(err)
}

struct Bucket<K, V> {
    local_depth: u32,
    entries: Vec<(K, V)>,
}

impl<K: Eq, V> Bucket<K, V> {
    /// Creates an empty bucket. Storage is reserved when the first entry arrives.
    fn new(local_depth: u32) -> Self {
        Self {
            local_depth,
            entries: Vec::new(),
        }
    }

    /// Reserves room for a full bucket so later pushes never reallocate.
    fn reserve(&mut self, capacity: usize) -> Result<()> {
        if self.entries.capacity() == 0 {
            self.entries
                .try_reserve_exact(capacity)
                .map_err(allocation_failed)?;
        }
        Ok(())
    }

    fn position(&self, key: &K) -> Option<usize> {
        self.entries.iter().position(|(k, _)| k == key)
    }

    fn get(&self, key: &K) -> Option<&V> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    fn remove(&mut self, key: &K) -> Option<V> {
        let pos = self.position(key)?;
        Some(self.entries.swap_remove(pos).1)
    }
}

/// The latched state: directory slots, bucket arena and entry count.
struct Directory<K, V> {
    global_depth: u32,
    slots: Vec<BucketId>,
    buckets: Vec<Bucket<K, V>>,
    len: usize,
}

impl<K: Eq, V> Directory<K, V> {
    fn new() -> Self {
        Self {
            global_depth: 0,
            slots: vec![0],
            buckets: vec![Bucket::new(0)],
            len: 0,
        }
    }

    #[inline]
    fn hash_to_bucket_index(&self, hash: u64) -> usize {
        (hash & depth_mask(self.global_depth)) as usize
    }

    #[inline]
    fn bucket_for(&self, hash: u64) -> BucketId {
        self.slots[self.hash_to_bucket_index(hash)]
    }

    /// Doubles the directory. Slot `i + old_size` references the same bucket as slot `i`.
    fn grow(&mut self) -> Result<()> {
        let old_size = self.slots.len();
        self.slots
            .try_reserve_exact(old_size)
            .map_err(allocation_failed)?;
        self.slots.extend_from_within(..);
        self.global_depth += 1;

        debug!(
            "Directory doubled from {} to {} slots, global depth now {}",
            old_size,
            self.slots.len(),
            self.global_depth
        );
        Ok(())
    }

    /// Splits `bucket_id` on its next hash bit, doubling the directory first if needed.
    ///
    /// Every allocation happens before any state changes, so an error leaves
    /// the directory exactly as it was.
    fn split_bucket<H: KeyHasher<K>>(
        &mut self,
        bucket_id: BucketId,
        bucket_capacity: usize,
        max_depth: u32,
        hasher: &H,
    ) -> Result<()> {
        let local_depth = self.buckets[bucket_id].local_depth;
        if local_depth >= max_depth {
            warn!(
                "Bucket {} cannot split past max depth {}, {} entries share the same low hash bits",
                bucket_id,
                max_depth,
                self.buckets[bucket_id].entries.len()
            );
            return Err(HashTableError::DepthLimitExceeded {
                local_depth,
                max_depth,
            });
        }

        let new_depth = local_depth + 1;
        let split_bit = 1u64 << local_depth;
        let to_move = self.buckets[bucket_id]
            .entries
            .iter()
            .filter(|(key, _)| hasher.hash_key(key) & split_bit != 0)
            .count();

        let must_grow = new_depth > self.global_depth;
        if must_grow {
            self.slots
                .try_reserve_exact(self.slots.len())
                .map_err(allocation_failed)?;
        }
        self.buckets.try_reserve(1).map_err(allocation_failed)?;
        let mut sibling = Bucket::new(new_depth);
        if to_move > 0 {
            sibling.reserve(bucket_capacity)?;
        }

        if must_grow {
            self.grow()?;
        }

        let bucket = &mut self.buckets[bucket_id];
        bucket.local_depth = new_depth;

        let mut i = 0;
        while i < bucket.entries.len() {
            if hasher.hash_key(&bucket.entries[i].0) & split_bit != 0 {
                sibling.entries.push(bucket.entries.swap_remove(i));
            } else {
                i += 1;
            }
        }

        let kept = bucket.entries.len();
        let moved = sibling.entries.len();
        let sibling_id = self.buckets.len();
        self.buckets.push(sibling);

        for (slot_idx, slot) in self.slots.iter_mut().enumerate() {
            if *slot == bucket_id && (slot_idx as u64) & split_bit != 0 {
                *slot = sibling_id;
            }
        }

        debug!(
            "Split bucket {} at local depth {}: kept {}, moved {} to bucket {}",
            bucket_id, new_depth, kept, moved, sibling_id
        );
        Ok(())
    }

    fn insert<H: KeyHasher<K>>(
        &mut self,
        key: K,
        value: V,
        bucket_capacity: usize,
        max_depth: u32,
        hasher: &H,
    ) -> Result<()> {
        let hash = hasher.hash_key(&key);
        loop {
            let bucket_id = self.bucket_for(hash);
            let bucket = &mut self.buckets[bucket_id];

            if let Some(pos) = bucket.position(&key) {
                bucket.entries[pos].1 = value;
                trace!("Overwrote entry in bucket {}", bucket_id);
                return Ok(());
            }

            if bucket.entries.len() < bucket_capacity {
                bucket.reserve(bucket_capacity)?;
                bucket.entries.push((key, value));
                self.len += 1;
                trace!("Inserted entry into bucket {}", bucket_id);
                return Ok(());
            }

            self.split_bucket(bucket_id, bucket_capacity, max_depth, hasher)?;
        }
    }

    fn verify_integrity<H: KeyHasher<K>>(&self, bucket_capacity: usize, hasher: &H) -> Result<()> {
        let violation = |msg: String| Err(HashTableError::IntegrityViolation(msg));

        let expected_size = 1usize.checked_shl(self.global_depth);
        if expected_size != Some(self.slots.len()) {
            return violation(format!(
                "directory has {} slots, global depth {} implies {:?}",
                self.slots.len(),
                self.global_depth,
                expected_size
            ));
        }

        // bucket id -> (reference count, first slot referencing it)
        let mut references: HashMap<BucketId, (usize, usize)> = HashMap::new();
        for (slot_idx, &bucket_id) in self.slots.iter().enumerate() {
            if bucket_id >= self.buckets.len() {
                return violation(format!(
                    "slot {} references missing bucket {}",
                    slot_idx, bucket_id
                ));
            }
            let (count, first_slot) = references.entry(bucket_id).or_insert((0, slot_idx));
            *count += 1;

            let local_depth = self.buckets[bucket_id].local_depth;
            let mask = depth_mask(local_depth);
            if slot_idx as u64 & mask != *first_slot as u64 & mask {
                return violation(format!(
                    "slot {} disagrees with slot {} on the low {} bits of bucket {}",
                    slot_idx, first_slot, local_depth, bucket_id
                ));
            }
        }

        if references.len() != self.buckets.len() {
            return violation(format!(
                "{} buckets allocated but only {} reachable",
                self.buckets.len(),
                references.len()
            ));
        }

        let mut total = 0;
        for (&bucket_id, &(count, first_slot)) in &references {
            let bucket = &self.buckets[bucket_id];
            if bucket.local_depth > self.global_depth {
                return violation(format!(
                    "bucket {} local depth {} exceeds global depth {}",
                    bucket_id, bucket.local_depth, self.global_depth
                ));
            }

            let expected = 1usize.checked_shl(self.global_depth - bucket.local_depth);
            if expected != Some(count) {
                return violation(format!(
                    "bucket {} at local depth {} has {} slots, expected {:?}",
                    bucket_id, bucket.local_depth, count, expected
                ));
            }

            let mask = depth_mask(bucket.local_depth);
            let pattern = first_slot as u64 & mask;

            if bucket.entries.len() > bucket_capacity {
                return violation(format!(
                    "bucket {} holds {} entries, capacity is {}",
                    bucket_id,
                    bucket.entries.len(),
                    bucket_capacity
                ));
            }

            for (i, (key, _)) in bucket.entries.iter().enumerate() {
                if hasher.hash_key(key) & mask != pattern {
                    return violation(format!(
                        "bucket {} holds an entry addressed to another bucket",
                        bucket_id
                    ));
                }
                if bucket.entries[..i].iter().any(|(other, _)| other == key) {
                    return violation(format!("bucket {} holds a duplicate key", bucket_id));
                }
            }
            total += bucket.entries.len();
        }

        if total != self.len {
            return violation(format!(
                "table reports {} entries but buckets hold {}",
                self.len, total
            ));
        }
        Ok(())
    }
}

/// Point-in-time counters for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashTableStats {
    pub global_depth: u32,
    pub num_buckets: usize,
    pub num_slots: usize,
    pub len: usize,
    pub bucket_capacity: usize,
}

impl HashTableStats {
    /// Fraction of allocated bucket space holding entries.
    pub fn fill_ratio(&self) -> f64 {
        self.len as f64 / (self.num_buckets * self.bucket_capacity) as f64
    }
}

/// Thread-safe extendible hash table with upsert semantics.
pub struct ExtendibleHashTable<K, V, H = HashFunction<K>> {
    bucket_capacity: usize,
    max_depth: u32,
    hasher: H,
    latch: RwLock<Directory<K, V>>,
}

impl<K, V> ExtendibleHashTable<K, V, HashFunction<K>>
where
    K: Hash + Eq + 'static,
{
    /// Creates a table whose buckets hold `bucket_capacity` entries each.
    ///
    /// # Panics
    ///
    /// Panics if `bucket_capacity` is zero. Use [`Self::from_config`] to get an
    /// error instead.
    pub fn new(bucket_capacity: usize) -> Self {
        assert!(bucket_capacity > 0, "bucket capacity must be positive");
        Self::build(HashTableConfig::new(bucket_capacity), HashFunction::new())
    }

    pub fn from_config(config: HashTableConfig) -> Result<Self> {
        Self::with_hasher(config, HashFunction::new())
    }
}

impl<K, V> Default for ExtendibleHashTable<K, V, HashFunction<K>>
where
    K: Hash + Eq + 'static,
{
    fn default() -> Self {
        Self::new(BUCKET_SIZE)
    }
}

impl<K, V, H> ExtendibleHashTable<K, V, H>
where
    K: Eq,
    H: KeyHasher<K>,
{
    /// Creates a table that addresses its directory with `hasher`.
    pub fn with_hasher(config: HashTableConfig, hasher: H) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config, hasher))
    }

    fn build(config: HashTableConfig, hasher: H) -> Self {
        info!(
            "Initializing ExtendibleHashTable with bucket capacity {} and max depth {}",
            config.bucket_capacity, config.max_depth
        );
        Self {
            bucket_capacity: config.bucket_capacity,
            max_depth: config.max_depth,
            hasher,
            latch: RwLock::new(Directory::new()),
        }
    }

    /// Looks up `key` and returns a copy of its value.
    pub fn find(&self, key: &K) -> Option<V>
    where
        V: Clone,
    {
        let hash = self.hasher.hash_key(key);
        let dir = self.latch.read();
        dir.buckets[dir.bucket_for(hash)].get(key).cloned()
    }

    pub fn contains(&self, key: &K) -> bool {
        let hash = self.hasher.hash_key(key);
        let dir = self.latch.read();
        dir.buckets[dir.bucket_for(hash)].position(key).is_some()
    }

    /// Inserts `key -> value`, replacing the value if the key is present.
    ///
    /// A full bucket is split, repeatedly if its entries keep landing on the
    /// same side, until the key fits.
    ///
    /// # Errors
    ///
    /// [`HashTableError::AllocationFailed`] if a split could not allocate, and
    /// [`HashTableError::DepthLimitExceeded`] if the bucket reached `max_depth`
    /// without making room. The table is unchanged apart from splits that
    /// completed before the failure, and the key is not inserted.
    pub fn insert(&self, key: K, value: V) -> Result<()> {
        let mut dir = self.latch.write();
        dir.insert(key, value, self.bucket_capacity, self.max_depth, &self.hasher)
    }

    /// Removes `key`, returning whether it was present. Buckets never merge.
    pub fn remove(&self, key: &K) -> bool {
        let hash = self.hasher.hash_key(key);
        let mut dir = self.latch.write();
        let bucket_id = dir.bucket_for(hash);
        let removed = dir.buckets[bucket_id].remove(key).is_some();
        if removed {
            dir.len -= 1;
            trace!("Removed entry from bucket {}", bucket_id);
        }
        removed
    }

    /// Drops every entry and returns the directory to a single bucket.
    pub fn clear(&self) {
        let mut dir = self.latch.write();
        *dir = Directory::new();
        debug!("Hash table cleared");
    }

    pub fn global_depth(&self) -> u32 {
        self.latch.read().global_depth
    }

    /// Local depth of the bucket referenced by directory slot `slot`.
    pub fn local_depth(&self, slot: usize) -> Option<u32> {
        let dir = self.latch.read();
        dir.slots
            .get(slot)
            .map(|&bucket_id| dir.buckets[bucket_id].local_depth)
    }

    pub fn num_buckets(&self) -> usize {
        self.latch.read().buckets.len()
    }

    pub fn len(&self) -> usize {
        self.latch.read().len
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn bucket_capacity(&self) -> usize {
        self.bucket_capacity
    }

    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    pub fn stats(&self) -> HashTableStats {
        let dir = self.latch.read();
        HashTableStats {
            global_depth: dir.global_depth,
            num_buckets: dir.buckets.len(),
            num_slots: dir.slots.len(),
            len: dir.len,
            bucket_capacity: self.bucket_capacity,
        }
    }

    /// Verifies the integrity of the directory and its buckets.
    ///
    /// Ensures that:
    /// 1. The directory holds exactly `2^global_depth` slots.
    /// 2. Every local depth is at most the global depth.
    /// 3. Each bucket has precisely `2^(global_depth - local_depth)` slots
    ///    pointing to it, all sharing its low `local_depth` bits.
    /// 4. Buckets respect their capacity, hold unique keys, and only hold keys
    ///    whose hash addresses them.
    /// 5. The entry count matches the buckets' contents.
    pub fn verify_integrity(&self) -> Result<()> {
        let dir = self.latch.read();
        dir.verify_integrity(self.bucket_capacity, &self.hasher)
    }
}

impl<K, V, H> HashTable<K, V> for ExtendibleHashTable<K, V, H>
where
    K: Eq,
    V: Clone,
    H: KeyHasher<K>,
{
    fn find(&self, key: &K) -> Option<V> {
        ExtendibleHashTable::find(self, key)
    }

    fn remove(&self, key: &K) -> bool {
        ExtendibleHashTable::remove(self, key)
    }

    fn insert(&self, key: K, value: V) -> Result<()> {
        ExtendibleHashTable::insert(self, key, value)
    }
}

impl<K, V, H> fmt::Debug for ExtendibleHashTable<K, V, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dir = self.latch.read();
        writeln!(
            f,
            "ExtendibleHashTable {{ global_depth: {}, buckets: {}, entries: {}, bucket_capacity: {} }}",
            dir.global_depth,
            dir.buckets.len(),
            dir.len,
            self.bucket_capacity
        )?;
        for (slot_idx, &bucket_id) in dir.slots.iter().enumerate() {
            let bucket = &dir.buckets[bucket_id];
            writeln!(
                f,
                "  slot {:>4} -> bucket {:>4} (local depth {}, {}/{})",
                slot_idx,
                bucket_id,
                bucket.local_depth,
                bucket.entries.len(),
                self.bucket_capacity
            )?;
        }
        Ok(())
    }
}
