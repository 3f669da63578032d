//! In-memory ordered backend
//!
//! Rows live in a `BTreeMap` per table behind a `parking_lot::RwLock`, so
//! scans walk keys in order. Every worker thread gets its own
//! [`MemoryBackend`]; all of them share one [`MemoryStore`] through a
//! [`SharedResource`], opened by the first `init` and dropped by the last
//! `cleanup`.
//!
//! Rows are stored encoded with the configured [`RowCodec`].

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use strata_bench_core::{Backend, Error, Field, Result, Status};

use crate::codec::{codec_for, RowCodec, SingleRowCodec};
use crate::shared::SharedResource;

/// `[storage]` configuration section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageOptions {
    /// Row format name; only `"single"` is known
    pub format: String,
    /// Decode rows on read and scan; when false, reads return no fields
    pub deserialize_on_read: bool,
}

impl Default for StorageOptions {
    fn default() -> Self {
        Self {
            format: SingleRowCodec::FORMAT.to_string(),
            deserialize_on_read: false,
        }
    }
}

/// Table name -> (key -> encoded row)
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<BTreeMap<String, BTreeMap<String, Vec<u8>>>>,
}

impl MemoryStore {
    /// Empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows in `table`
    pub fn len(&self, table: &str) -> usize {
        self.tables.read().get(table).map_or(0, BTreeMap::len)
    }

    /// Whether `table` has no rows
    pub fn is_empty(&self, table: &str) -> bool {
        self.len(table) == 0
    }
}

/// Shared handle type used by every [`MemoryBackend`] of one run
pub type SharedMemoryStore = Arc<SharedResource<MemoryStore>>;

/// Create a closed shared store
pub fn shared_memory_store() -> SharedMemoryStore {
    Arc::new(SharedResource::new("memory", || Ok(MemoryStore::new())))
}

/// Per-thread [`Backend`] over a shared [`MemoryStore`]
#[derive(Debug)]
pub struct MemoryBackend {
    resource: SharedMemoryStore,
    store: RwLock<Option<Arc<MemoryStore>>>,
    codec: Box<dyn RowCodec>,
    deserialize_on_read: bool,
}

impl MemoryBackend {
    /// Backend bound to `resource`; nothing is opened until `init`
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for an unknown row format.
    pub fn new(resource: SharedMemoryStore, options: &StorageOptions) -> Result<Self> {
        Ok(Self {
            resource,
            store: RwLock::new(None),
            codec: codec_for(&options.format)?,
            deserialize_on_read: options.deserialize_on_read,
        })
    }

    fn store(&self) -> Result<Arc<MemoryStore>> {
        self.store
            .read()
            .clone()
            .ok_or_else(|| Error::backend("memory backend used before init"))
    }

    fn decode_into(
        &self,
        data: &[u8],
        fields: Option<&[String]>,
        out: &mut Vec<Field>,
    ) -> Result<()> {
        let row = match fields {
            Some(names) => self.codec.decode_filtered(data, names)?,
            None => self.codec.decode(data)?,
        };
        out.extend(row);
        Ok(())
    }
}

impl Backend for MemoryBackend {
    fn init(&self) -> Result<()> {
        let mut slot = self.store.write();
        if slot.is_some() {
            return Err(Error::backend("memory backend initialized twice"));
        }
        *slot = Some(self.resource.acquire()?);
        Ok(())
    }

    fn cleanup(&self) -> Result<()> {
        let mut slot = self.store.write();
        if slot.take().is_none() {
            return Err(Error::backend("memory backend cleaned up before init"));
        }
        self.resource.release()
    }

    fn read(
        &self,
        table: &str,
        key: &str,
        fields: Option<&[String]>,
        result: &mut Vec<Field>,
    ) -> Result<Status> {
        let store = self.store()?;
        let tables = store.tables.read();
        let Some(data) = tables.get(table).and_then(|t| t.get(key)) else {
            return Ok(Status::NotFound);
        };
        if self.deserialize_on_read {
            self.decode_into(data, fields, result)?;
        }
        Ok(Status::Ok)
    }

    fn scan(
        &self,
        table: &str,
        start_key: &str,
        record_count: usize,
        fields: Option<&[String]>,
        result: &mut Vec<Vec<Field>>,
    ) -> Result<Status> {
        let store = self.store()?;
        let tables = store.tables.read();
        let Some(rows) = tables.get(table) else {
            return Ok(Status::Ok);
        };
        if !self.deserialize_on_read {
            return Ok(Status::Ok);
        }
        for (_, data) in rows.range(start_key.to_string()..).take(record_count) {
            let mut row = Vec::new();
            self.decode_into(data, fields, &mut row)?;
            result.push(row);
        }
        Ok(Status::Ok)
    }

    fn update(&self, table: &str, key: &str, values: &[Field]) -> Result<Status> {
        let store = self.store()?;
        let mut tables = store.tables.write();
        let Some(data) = tables.get_mut(table).and_then(|t| t.get_mut(key)) else {
            return Ok(Status::NotFound);
        };
        let mut current = self.codec.decode(data)?;
        for new_field in values {
            match current.iter_mut().find(|f| f.name == new_field.name) {
                Some(existing) => existing.value.clone_from(&new_field.value),
                None => current.push(new_field.clone()),
            }
        }
        *data = self.codec.encode(&current)?;
        Ok(Status::Ok)
    }

    fn insert(&self, table: &str, key: &str, values: &[Field]) -> Result<Status> {
        let encoded = self.codec.encode(values)?;
        let store = self.store()?;
        store
            .tables
            .write()
            .entry(table.to_string())
            .or_default()
            .insert(key.to_string(), encoded);
        Ok(Status::Ok)
    }

    fn delete(&self, table: &str, key: &str) -> Result<Status> {
        let store = self.store()?;
        if let Some(rows) = store.tables.write().get_mut(table) {
            rows.remove(key);
        }
        Ok(Status::Ok)
    }
}
