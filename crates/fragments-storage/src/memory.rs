//! Ephemeral storage implementations
//!
//! Process-local maps for tests and short-lived runs. Contents are lost on
//! restart or [`EphemeralStorage::reset`].
//!
//! Both maps are `DashMap`s, so every mutation holds its shard's write lock
//! and concurrent puts/deletes cannot lose each other's updates.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use fragments_core::Fragment;
use tracing::trace;

use crate::error::StorageError;
use crate::{FragmentKey, Listing, MetadataStore, ObjectStore, Storage};

/// A metadata record plus the sequence number of its first insertion
#[derive(Debug)]
struct Slot {
    seq: u64,
    fragment: Fragment,
}

/// In-memory implementation of [`MetadataStore`]
///
/// Queries return records in insertion order. Overwriting an existing key
/// keeps its original position.
#[derive(Debug, Default)]
pub struct EphemeralMetadataStore {
    records: DashMap<FragmentKey, Slot>,
    next_seq: AtomicU64,
}

impl EphemeralMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records across all owners
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Drop every record
    pub fn clear(&self) {
        self.records.clear();
    }
}

#[async_trait]
impl MetadataStore for EphemeralMetadataStore {
    async fn put(&self, fragment: &Fragment) -> Result<(), StorageError> {
        let key = FragmentKey::new(fragment.owner_id(), fragment.id());
        trace!(key = %key, "Putting fragment metadata");

        self.records
            .entry(key)
            .and_modify(|slot| slot.fragment = fragment.clone())
            .or_insert_with(|| Slot {
                seq: self.next_seq.fetch_add(1, Ordering::SeqCst),
                fragment: fragment.clone(),
            });
        Ok(())
    }

    async fn get(&self, owner_id: &str, id: &str) -> Result<Option<Fragment>, StorageError> {
        let key = FragmentKey::new(owner_id, id);
        Ok(self.records.get(&key).map(|slot| slot.fragment.clone()))
    }

    async fn query(&self, owner_id: &str, expand: bool) -> Result<Listing, StorageError> {
        let mut owned: Vec<(u64, Fragment)> = self
            .records
            .iter()
            .filter(|entry| entry.key().owner_id == owner_id)
            .map(|entry| (entry.seq, entry.fragment.clone()))
            .collect();
        owned.sort_by_key(|(seq, _)| *seq);

        let fragments = owned.into_iter().map(|(_, fragment)| fragment);
        Ok(if expand {
            Listing::Fragments(fragments.collect())
        } else {
            Listing::Ids(fragments.map(|f| f.id().to_string()).collect())
        })
    }

    async fn delete(&self, owner_id: &str, id: &str) -> Result<(), StorageError> {
        let key = FragmentKey::new(owner_id, id);
        trace!(key = %key, "Deleting fragment metadata");

        match self.records.remove(&key) {
            Some(_) => Ok(()),
            None => Err(StorageError::missing(key.to_string())),
        }
    }
}

/// In-memory implementation of [`ObjectStore`]
#[derive(Debug, Default)]
pub struct EphemeralObjectStore {
    objects: DashMap<FragmentKey, Bytes>,
}

impl EphemeralObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored objects across all owners
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Total bytes held
    pub fn total_bytes(&self) -> usize {
        self.objects.iter().map(|entry| entry.value().len()).sum()
    }

    /// Drop every object
    pub fn clear(&self) {
        self.objects.clear();
    }
}

#[async_trait]
impl ObjectStore for EphemeralObjectStore {
    async fn put(&self, owner_id: &str, id: &str, data: Bytes) -> Result<(), StorageError> {
        let key = FragmentKey::new(owner_id, id);
        trace!(key = %key, size = data.len(), "Putting fragment content");
        self.objects.insert(key, data);
        Ok(())
    }

    async fn get(&self, owner_id: &str, id: &str) -> Result<Option<Bytes>, StorageError> {
        let key = FragmentKey::new(owner_id, id);
        Ok(self.objects.get(&key).map(|data| data.value().clone()))
    }

    async fn delete(&self, owner_id: &str, id: &str) -> Result<(), StorageError> {
        let key = FragmentKey::new(owner_id, id);
        trace!(key = %key, "Deleting fragment content");

        match self.objects.remove(&key) {
            Some(_) => Ok(()),
            None => Err(StorageError::missing(key.to_string())),
        }
    }
}

/// Ephemeral backend: one metadata map and one object map.
///
/// Cloning shares the underlying maps.
#[derive(Debug, Clone, Default)]
pub struct EphemeralStorage {
    metadata: Arc<EphemeralMetadataStore>,
    objects: Arc<EphemeralObjectStore>,
}

impl EphemeralStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage context backed by these maps
    pub fn storage(&self) -> Storage {
        Storage::new(self.metadata.clone(), self.objects.clone())
    }

    pub fn metadata(&self) -> &Arc<EphemeralMetadataStore> {
        &self.metadata
    }

    pub fn objects(&self) -> &Arc<EphemeralObjectStore> {
        &self.objects
    }

    /// Clear both maps
    pub fn reset(&self) {
        self.metadata.clear();
        self.objects.clear();
    }
}
