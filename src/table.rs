//! Config tables
//!
//! A table holds every record of one configuration type, keyed by a 32-bit id
//! that is unique within the table. The registry stores tables behind a
//! type-erased slot and recovers the concrete type with a checked downcast.

use std::any::{self, Any, TypeId};
use std::collections::HashMap;

use crate::error::{ConfigError, Result};

/// Reserved id marking the sole entry of a singleton table
pub const SINGLETON_ID: i32 = 0;

/// All records of one configuration type, keyed by record id
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigTable<T> {
    records: HashMap<i32, T>,
}

impl<T> ConfigTable<T> {
    /// Create a one-entry table holding `value` under [`SINGLETON_ID`]
    pub fn singleton(value: T) -> Self {
        let mut records = HashMap::with_capacity(1);
        records.insert(SINGLETON_ID, value);
        Self { records }
    }

    /// Build a table by deriving each record's id through `id_of`
    ///
    /// Fails with [`ConfigError::DuplicateIdInBatch`] if the selector yields
    /// the same id twice within the batch.
    pub fn from_records(id_of: impl Fn(&T) -> i32, records: Vec<T>) -> Result<Self> {
        Self::from_pairs(records.into_iter().map(|r| (id_of(&r), r)))
    }

    /// Build a table from an ordered sequence of `(id, value)` pairs
    ///
    /// This is the boundary with asset-authoring adapters: they hand over
    /// their pairs once, and a duplicate id surfaces here as
    /// [`ConfigError::DuplicateIdInBatch`].
    pub fn from_pairs(pairs: impl IntoIterator<Item = (i32, T)>) -> Result<Self> {
        let iter = pairs.into_iter();
        let mut records = HashMap::with_capacity(iter.size_hint().0);

        for (id, value) in iter {
            if records.insert(id, value).is_some() {
                return Err(ConfigError::DuplicateIdInBatch {
                    type_name: any::type_name::<T>().to_string(),
                    id,
                });
            }
        }

        Ok(Self { records })
    }

    /// Wrap an already-built id map, trusting its keys
    pub fn from_map(records: HashMap<i32, T>) -> Self {
        Self { records }
    }

    /// Get the record with the given id
    pub fn get(&self, id: i32) -> Option<&T> {
        self.records.get(&id)
    }

    /// Whether a record with the given id exists
    pub fn contains(&self, id: i32) -> bool {
        self.records.contains_key(&id)
    }

    /// All records, in no particular order
    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.records.values()
    }

    /// All `(id, record)` entries, in no particular order
    pub fn iter(&self) -> impl Iterator<Item = (i32, &T)> {
        self.records.iter().map(|(id, r)| (*id, r))
    }

    /// Number of records in the table
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the table holds no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The underlying id map
    pub fn records(&self) -> &HashMap<i32, T> {
        &self.records
    }
}

/// A type-erased table slot as stored by the registry
///
/// Holds a concrete [`ConfigTable<T>`] behind `dyn Any`, together with the
/// Rust type name for diagnostics. Access always goes through a checked
/// downcast; a mismatch reports the stored type rather than panicking.
pub struct ErasedTable {
    type_id: TypeId,
    type_name: &'static str,
    len: usize,
    records: Box<dyn Any + Send + Sync>,
}

impl ErasedTable {
    /// Erase a concrete table
    pub fn new<T: Send + Sync + 'static>(table: ConfigTable<T>) -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: any::type_name::<T>(),
            len: table.len(),
            records: Box::new(table),
        }
    }

    /// The `TypeId` of the record type stored in this slot
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Rust type name of the record type, for diagnostics
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Number of records in the erased table
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the erased table holds no records
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Recover the concrete table, if `T` matches the stored type
    pub fn downcast_ref<T: 'static>(&self) -> Option<&ConfigTable<T>> {
        self.records.downcast_ref::<ConfigTable<T>>()
    }
}

impl std::fmt::Debug for ErasedTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErasedTable")
            .field("type_name", &self.type_name)
            .field("len", &self.len)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_singleton_table() {
        let table = ConfigTable::singleton("only");
        assert_eq!(table.get(SINGLETON_ID), Some(&"only"));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_from_records_derives_ids() {
        let table = ConfigTable::from_records(|v: &(i32, &str)| v.0, vec![(1, "a"), (2, "b")])
            .unwrap();
        assert_eq!(table.get(1), Some(&(1, "a")));
        assert_eq!(table.get(2), Some(&(2, "b")));
        assert_eq!(table.get(3), None);
    }

    #[test]
    fn test_duplicate_id_in_batch() {
        let result = ConfigTable::from_pairs(vec![(7, "a"), (7, "b")]);
        assert!(matches!(
            result,
            Err(ConfigError::DuplicateIdInBatch { id: 7, .. })
        ));
    }

    #[test]
    fn test_erased_downcast() {
        let table = ConfigTable::from_pairs(vec![(1, 10u32), (2, 20u32)]).unwrap();
        let erased = ErasedTable::new(table);

        assert_eq!(erased.len(), 2);
        assert!(erased.downcast_ref::<u32>().is_some());
        assert!(erased.downcast_ref::<String>().is_none());
    }
}
