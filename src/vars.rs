//! Sparse variable store: integer keys, nonzero integer values.

use rustc_hash::FxHashMap;

/// Variables are a sparse map where absence and zero are the same thing:
/// reading a missing key yields 0 and writing 0 deletes the key.
#[derive(Debug, Clone, Default)]
pub struct Vars {
    map: FxHashMap<i32, i32>,
}

impl Vars {
    pub fn new() -> Self {
        Vars::default()
    }

    pub fn get(&self, key: i32) -> i32 {
        self.map.get(&key).copied().unwrap_or(0)
    }

    pub fn set(&mut self, key: i32, value: i32) {
        if value == 0 {
            self.map.remove(&key);
        } else {
            self.map.insert(key, value);
        }
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Entries sorted by key, for deterministic trace output.
    pub fn sorted_entries(&self) -> Vec<(i32, i32)> {
        let mut entries: Vec<(i32, i32)> = self.map.iter().map(|(&k, &v)| (k, v)).collect();
        entries.sort_unstable_by_key(|&(k, _)| k);
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_key_reads_zero() {
        let vars = Vars::new();
        assert_eq!(vars.get(42), 0);
        assert_eq!(vars.get(-1), 0);
    }

    #[test]
    fn test_set_get() {
        let mut vars = Vars::new();
        vars.set(3, 17);
        vars.set(-8, 5);
        assert_eq!(vars.get(3), 17);
        assert_eq!(vars.get(-8), 5);
        assert_eq!(vars.len(), 2);
    }

    #[test]
    fn test_writing_zero_deletes() {
        let mut vars = Vars::new();
        vars.set(3, 17);
        vars.set(3, 0);
        assert_eq!(vars.get(3), 0);
        assert!(vars.is_empty());
        // Deleting a key that was never set is fine.
        vars.set(9, 0);
        assert!(vars.is_empty());
    }

    #[test]
    fn test_sorted_entries() {
        let mut vars = Vars::new();
        vars.set(5, 1);
        vars.set(-2, 2);
        vars.set(0, 3);
        assert_eq!(vars.sorted_entries(), vec![(-2, 2), (0, 3), (5, 1)]);
    }
}
