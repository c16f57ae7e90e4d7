//! Sorted integer array helpers
//!
//! Small, allocation-free helpers over `Vec<T>` kept sorted and deduplicated.
//! Used for the facet-to-group reverse index and the per-entity price id lists.

/// Insert `value` keeping `array` sorted. Returns `false` if it was already present.
pub fn insert_sorted<T: Ord + Copy>(array: &mut Vec<T>, value: T) -> bool {
    match array.binary_search(&value) {
        Ok(_) => false,
        Err(position) => {
            array.insert(position, value);
            true
        }
    }
}

/// Remove `value` from a sorted `array`. Returns `false` if it wasn't present.
pub fn remove_sorted<T: Ord + Copy>(array: &mut Vec<T>, value: T) -> bool {
    match array.binary_search(&value) {
        Ok(position) => {
            array.remove(position);
            true
        }
        Err(_) => false,
    }
}

/// Binary search membership test over a sorted slice
#[inline]
pub fn contains_sorted<T: Ord>(array: &[T], value: &T) -> bool {
    array.binary_search(value).is_ok()
}
