//! The bounded source→destination key table.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::keys::KeyCode;

/// Maximum number of distinct source keys a [`KeyMapping`] may hold.
pub const MAX_MAPPINGS: usize = 5;

/// Error type for mapping mutations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MappingError {
    /// The table already holds `max` distinct sources and the new source is not one of them.
    #[error("mapping table is full (max {max} entries)")]
    CapacityExceeded { max: usize },
}

/// Source→destination key table with at most [`MAX_MAPPINGS`] entries.
///
/// Entries iterate in ascending source order.  Serializes as a flat object
/// keyed by the decimal source code: `{ "65": 66 }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyMapping {
    entries: BTreeMap<KeyCode, KeyCode>,
}

impl KeyMapping {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a table from arbitrary pairs, keeping the lowest sources when
    /// more than [`MAX_MAPPINGS`] distinct sources are supplied.
    ///
    /// Returns the table and the number of entries that were dropped.
    pub fn from_pairs_truncated(pairs: impl IntoIterator<Item = (KeyCode, KeyCode)>) -> (Self, usize) {
        let mut all: BTreeMap<KeyCode, KeyCode> = pairs.into_iter().collect();
        let dropped = all.len().saturating_sub(MAX_MAPPINGS);
        if dropped > 0 {
            let keep: Vec<KeyCode> = all.keys().take(MAX_MAPPINGS).copied().collect();
            all.retain(|k, _| keep.contains(k));
        }
        (Self { entries: all }, dropped)
    }

    /// Inserts or overwrites the destination for `source`.
    ///
    /// # Errors
    ///
    /// Returns [`MappingError::CapacityExceeded`] when the table is full and
    /// `source` is new.  The table is left unchanged in that case.
    pub fn assign(&mut self, source: KeyCode, destination: KeyCode) -> Result<(), MappingError> {
        if !self.entries.contains_key(&source) && self.entries.len() >= MAX_MAPPINGS {
            return Err(MappingError::CapacityExceeded { max: MAX_MAPPINGS });
        }
        self.entries.insert(source, destination);
        Ok(())
    }

    /// Removes every entry.
    pub fn reset(&mut self) {
        self.entries.clear();
    }

    /// Returns the destination mapped to `source`, if any.
    #[inline]
    pub fn get(&self, source: KeyCode) -> Option<KeyCode> {
        self.entries.get(&source).copied()
    }

    pub fn contains(&self, source: KeyCode) -> bool {
        self.entries.contains_key(&source)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.entries.len() >= MAX_MAPPINGS
    }

    /// Iterates `(source, destination)` pairs in ascending source order.
    pub fn iter(&self) -> impl Iterator<Item = (KeyCode, KeyCode)> + '_ {
        self.entries.iter().map(|(s, d)| (*s, *d))
    }

    /// Returns the pairs as an owned vector.
    pub fn pairs(&self) -> Vec<(KeyCode, KeyCode)> {
        self.iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_mapping() -> KeyMapping {
        let mut m = KeyMapping::new();
        for i in 0..MAX_MAPPINGS as u16 {
            m.assign(KeyCode(0x41 + i), KeyCode(0x61 + i)).unwrap();
        }
        m
    }

    #[test]
    fn test_assign_below_capacity_is_retrievable() {
        // Arrange
        let mut m = KeyMapping::new();

        // Act
        m.assign(KeyCode(65), KeyCode(66)).unwrap();

        // Assert
        assert_eq!(m.get(KeyCode(65)), Some(KeyCode(66)));
        assert_eq!(m.len(), 1);
    }

    #[test]
    fn test_assign_every_size_below_max_succeeds() {
        for size in 0..MAX_MAPPINGS {
            let mut m = KeyMapping::new();
            for i in 0..size as u16 {
                m.assign(KeyCode(100 + i), KeyCode(1)).unwrap();
            }

            let result = m.assign(KeyCode(200), KeyCode(201));

            assert!(result.is_ok(), "size {size} must accept a new source");
            assert_eq!(m.get(KeyCode(200)), Some(KeyCode(201)));
        }
    }

    #[test]
    fn test_assign_new_source_when_full_fails_and_leaves_table_unchanged() {
        // Arrange
        let mut m = full_mapping();
        let before = m.clone();

        // Act
        let result = m.assign(KeyCode(0x5A), KeyCode(0x41));

        // Assert
        assert_eq!(result, Err(MappingError::CapacityExceeded { max: 5 }));
        assert_eq!(m, before);
    }

    #[test]
    fn test_assign_existing_source_when_full_overwrites() {
        let mut m = full_mapping();

        m.assign(KeyCode(0x41), KeyCode(0x20)).unwrap();

        assert_eq!(m.get(KeyCode(0x41)), Some(KeyCode(0x20)));
        assert_eq!(m.len(), MAX_MAPPINGS);
    }

    #[test]
    fn test_reset_clears_all_entries() {
        let mut m = full_mapping();

        m.reset();

        assert!(m.is_empty());
        assert!(!m.is_full());
    }

    #[test]
    fn test_iter_is_sorted_by_source() {
        let mut m = KeyMapping::new();
        m.assign(KeyCode(90), KeyCode(1)).unwrap();
        m.assign(KeyCode(10), KeyCode(2)).unwrap();
        m.assign(KeyCode(50), KeyCode(3)).unwrap();

        let sources: Vec<u16> = m.iter().map(|(s, _)| s.0).collect();

        assert_eq!(sources, vec![10, 50, 90]);
    }

    #[test]
    fn test_from_pairs_truncated_keeps_lowest_sources() {
        let pairs = (0..7u16).rev().map(|i| (KeyCode(10 + i), KeyCode(i)));

        let (m, dropped) = KeyMapping::from_pairs_truncated(pairs);

        assert_eq!(dropped, 2);
        assert_eq!(m.len(), MAX_MAPPINGS);
        assert!(m.contains(KeyCode(10)));
        assert!(m.contains(KeyCode(14)));
        assert!(!m.contains(KeyCode(15)));
        assert!(!m.contains(KeyCode(16)));
    }

    #[test]
    fn test_serializes_as_flat_object_with_string_keys() {
        let mut m = KeyMapping::new();
        m.assign(KeyCode(65), KeyCode(66)).unwrap();

        let json = serde_json::to_string(&m).unwrap();

        assert_eq!(json, r#"{"65":66}"#);
    }

    #[test]
    fn test_deserializes_from_flat_object() {
        let m: KeyMapping = serde_json::from_str(r#"{ "65": 66, "40": 38 }"#).unwrap();

        assert_eq!(m.get(KeyCode(65)), Some(KeyCode(66)));
        assert_eq!(m.get(KeyCode(40)), Some(KeyCode(38)));
    }

    #[test]
    fn test_deserialize_rejects_out_of_range_codes() {
        let result: Result<KeyMapping, _> = serde_json::from_str(r#"{ "70000": 66 }"#);
        assert!(result.is_err());
    }
}
