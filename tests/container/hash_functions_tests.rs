use ferrite_hash::container::hash_function::{HashFunction, IdentityHasher, KeyHasher};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_function() {
        let hash_function = HashFunction::<String>::new();
        let hash = hash_function.get_hash(&"test_key".to_string());
        assert_ne!(hash, 0);
        assert_eq!(hash, hash_function.hash_key(&"test_key".to_string()));
    }

    #[test]
    fn test_page_id_hashes_differ_in_low_bits() {
        let hash_function = HashFunction::<u64>::new();
        let low = |page_id: u64| hash_function.hash_key(&page_id) & 0xFF;
        let distinct: std::collections::HashSet<u64> = (0..64u64).map(low).collect();
        assert!(distinct.len() > 32, "only {} distinct low bytes", distinct.len());
    }

    #[test]
    fn test_identity_hasher_is_the_key() {
        for page_id in [0u64, 1, 255, u64::MAX] {
            assert_eq!(IdentityHasher.hash_key(&page_id), page_id);
        }
    }
}
