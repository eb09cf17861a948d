//! Config Registry
//!
//! The process-wide collection of config tables, one per record type, plus the
//! version counter the update protocol compares against.
//!
//! The registry is not internally synchronized. The expected lifecycle is
//! two-phase: an initialization/update phase in which `add_*`, `replace_all`
//! and `update_to` run with no concurrent readers, followed by a read-only
//! phase in which any number of readers call `try_get`/`get`/`get_all`.
//! Concurrent `update_to` calls must be serialized by the caller.

use std::any::{self, TypeId};
use std::collections::HashMap;

use crate::error::{ConfigError, Result};
use crate::table::{ConfigTable, ErasedTable, SINGLETON_ID};

/// The main configuration registry
#[derive(Debug, Default)]
pub struct ConfigRegistry {
    /// Erased tables, one slot per record type
    tables: HashMap<TypeId, ErasedTable>,
    /// Version of the currently applied configuration
    version: u64,
}

impl ConfigRegistry {
    /// Create an empty registry at version 0
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the version of the currently applied configuration
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Set the current configuration version
    pub fn set_version(&mut self, version: u64) {
        self.version = version;
    }

    /// Register a singleton config of type `T`
    ///
    /// The value lands under the reserved id and is read back with
    /// [`get_single`](Self::get_single). Fails with
    /// [`ConfigError::DuplicateTypeRegistration`] if `T` already has a table.
    pub fn add_singleton<T: Send + Sync + 'static>(&mut self, value: T) -> Result<()> {
        self.add_table(ConfigTable::singleton(value))
    }

    /// Register a table of `T` records, deriving each id through `id_of`
    ///
    /// Fails with [`ConfigError::DuplicateTypeRegistration`] if `T` already
    /// has a table, or [`ConfigError::DuplicateIdInBatch`] if the selector
    /// yields a repeated id.
    pub fn add_many<T: Send + Sync + 'static>(
        &mut self,
        id_of: impl Fn(&T) -> i32,
        records: Vec<T>,
    ) -> Result<()> {
        self.add_table(ConfigTable::from_records(id_of, records)?)
    }

    /// Register an already-built table for `T`
    ///
    /// This is the entry point for tables produced outside the registry, such
    /// as asset-adapter output converted via [`ConfigTable::from_pairs`].
    pub fn add_table<T: Send + Sync + 'static>(&mut self, table: ConfigTable<T>) -> Result<()> {
        if self.tables.contains_key(&TypeId::of::<T>()) {
            return Err(ConfigError::DuplicateTypeRegistration {
                type_name: any::type_name::<T>().to_string(),
            });
        }
        self.tables.insert(TypeId::of::<T>(), ErasedTable::new(table));
        Ok(())
    }

    /// Get the config of type `T` with the given id, if present
    ///
    /// Never errors: `None` covers both a missing table and a missing id.
    pub fn try_get<T: 'static>(&self, id: i32) -> Option<&T> {
        self.table::<T>()?.get(id)
    }

    /// Get the single unique config of type `T`
    ///
    /// Fails with [`ConfigError::NotSingletonConfig`] if `T` has no table or
    /// no entry under the reserved id; such types are meant to be read with
    /// [`get`](Self::get) or [`get_all`](Self::get_all) instead.
    pub fn get_single<T: 'static>(&self) -> Result<&T> {
        self.table::<T>()
            .and_then(|t| t.get(SINGLETON_ID))
            .ok_or_else(|| ConfigError::NotSingletonConfig {
                type_name: any::type_name::<T>().to_string(),
            })
    }

    /// Get the config of type `T` with the given id
    pub fn get<T: 'static>(&self, id: i32) -> Result<&T> {
        let table = self
            .table::<T>()
            .ok_or_else(|| ConfigError::ConfigTypeNotRegistered {
                type_name: any::type_name::<T>().to_string(),
            })?;

        table.get(id).ok_or_else(|| ConfigError::ConfigIdNotFound {
            type_name: any::type_name::<T>().to_string(),
            id,
        })
    }

    /// Get every config of type `T`, in no particular order
    ///
    /// An unregistered type yields an empty vec rather than an error; this
    /// accessor alone treats "no table" as "no records".
    pub fn get_all<T: 'static>(&self) -> Vec<&T> {
        self.table::<T>()
            .map(|t| t.values().collect())
            .unwrap_or_default()
    }

    /// Number of registered tables
    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    /// Read-only snapshot of every table, keyed by record type
    ///
    /// This is what the envelope codec iterates when encoding.
    pub fn export_all(&self) -> &HashMap<TypeId, ErasedTable> {
        &self.tables
    }

    /// Overwrite the registry's tables with those in `mapping`
    ///
    /// Each type present in `mapping` replaces (never merges with) the
    /// registry's table for that type; types absent from `mapping` are left
    /// untouched. Tables are applied sequentially with no rollback, so
    /// callers needing all-or-nothing semantics must fully stage and validate
    /// `mapping` before calling.
    pub fn replace_all(&mut self, mapping: HashMap<TypeId, ErasedTable>) {
        for (type_id, table) in mapping {
            self.tables.insert(type_id, table);
        }
    }

    /// Replace tables from `mapping` and advance to `version`
    ///
    /// The version is set unconditionally, even when `mapping` is empty.
    pub fn update_to(&mut self, version: u64, mapping: HashMap<TypeId, ErasedTable>) {
        self.replace_all(mapping);
        self.set_version(version);
    }

    fn table<T: 'static>(&self) -> Option<&ConfigTable<T>> {
        self.tables.get(&TypeId::of::<T>())?.downcast_ref::<T>()
    }
}
