//! Fast hash map and hash set type aliases.
//!
//! Declaration and model lookups are keyed by short identifier strings, which
//! is exactly the workload the Fx hash from `rustc-hash` is tuned for.
//! None of these tables are exposed to untrusted keys, so `HashDoS`
//! resistance is not needed.

/// A [`HashMap`](std::collections::HashMap) using the Fx hash algorithm.
pub type FxHashMap<K, V> = rustc_hash::FxHashMap<K, V>;

/// A [`HashSet`](std::collections::HashSet) using the Fx hash algorithm.
pub type FxHashSet<V> = rustc_hash::FxHashSet<V>;

/// The hasher used by [`FxHashMap`] and [`FxHashSet`].
pub type FxBuildHasher = rustc_hash::FxBuildHasher;

/// Creates a new [`FxHashMap`] sized for `capacity` declarations.
///
/// # Examples
///
/// ```
/// use tg_core::hash::fx_hash_map_with_capacity;
///
/// let map: tg_core::FxHashMap<String, usize> = fx_hash_map_with_capacity(16);
/// assert!(map.capacity() >= 16);
/// ```
#[inline]
#[must_use]
pub fn fx_hash_map_with_capacity<K, V>(capacity: usize) -> FxHashMap<K, V> {
    FxHashMap::with_capacity_and_hasher(capacity, FxBuildHasher::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fx_hash_map_with_capacity() {
        let mut map: FxHashMap<&str, usize> = fx_hash_map_with_capacity(8);
        assert!(map.capacity() >= 8);
        map.insert("User", 0);
        assert_eq!(map.get("User"), Some(&0));
    }

    #[test]
    fn test_fx_hash_set_dedup() {
        let mut set: FxHashSet<&str> = FxHashSet::default();
        assert!(set.insert("A"));
        assert!(!set.insert("A"));
        assert_eq!(set.len(), 1);
    }
}
