//! Durable storage implementations
//!
//! Network-backed stores built on the `object_store` crate, so the same code
//! runs against S3 in production and against a local directory or an
//! in-memory object store in tests.
//!
//! ## Key layout
//!
//! ```text
//! metadata:  <owner_id>/<id>    partition key = owner_id, sort key = id
//!            value: JSON StoredRecord
//! content:   <owner_id>/<id>    composite path key
//!            value: raw bytes
//! ```
//!
//! Absence is `None`, never an error. Query order is whatever the backend's
//! listing returns.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use fragments_core::Fragment;
use futures::TryStreamExt;
use futures::future::try_join_all;
use object_store::path::Path;
use object_store::ObjectStore as _;
use object_store::{DynObjectStore, PutPayload};
use tracing::{debug, instrument, warn};

use crate::error::StorageError;
use crate::record::StoredRecord;
use crate::{FragmentKey, Listing, MetadataStore, ObjectStore};

fn owner_path(owner_id: &str) -> Path {
    Path::from_iter([owner_id])
}

fn fragment_path(owner_id: &str, id: &str) -> Path {
    Path::from_iter([owner_id, id])
}

async fn read_object(store: &DynObjectStore, path: &Path) -> Result<Option<Bytes>, StorageError> {
    match store.get(path).await {
        Ok(result) => Ok(Some(result.bytes().await?)),
        Err(object_store::Error::NotFound { .. }) => Ok(None),
        Err(e) => {
            warn!(path = %path, error = %e, "Object read failed");
            Err(e.into())
        }
    }
}

/// [`MetadataStore`] over an `object_store` bucket
pub struct DurableMetadataStore {
    store: Arc<DynObjectStore>,
}

impl DurableMetadataStore {
    pub fn new(store: Arc<DynObjectStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl MetadataStore for DurableMetadataStore {
    #[instrument(skip(self, fragment), fields(owner = %fragment.owner_id(), id = %fragment.id()))]
    async fn put(&self, fragment: &Fragment) -> Result<(), StorageError> {
        let path = fragment_path(fragment.owner_id(), fragment.id());
        let bytes = StoredRecord::encode(fragment)?;
        self.store.put(&path, PutPayload::from(bytes)).await?;
        debug!("Stored fragment metadata");
        Ok(())
    }

    async fn get(&self, owner_id: &str, id: &str) -> Result<Option<Fragment>, StorageError> {
        let path = fragment_path(owner_id, id);
        let Some(bytes) = read_object(&self.store, &path).await? else {
            return Ok(None);
        };
        let fragment = StoredRecord::decode(&FragmentKey::new(owner_id, id).to_string(), &bytes)?;
        if fragment.owner_id() != owner_id || fragment.id() != id {
            return Err(StorageError::Corrupt {
                key: path.to_string(),
                reason: format!(
                    "record belongs to {}/{}",
                    fragment.owner_id(),
                    fragment.id()
                ),
            });
        }
        Ok(Some(fragment))
    }

    #[instrument(skip(self))]
    async fn query(&self, owner_id: &str, expand: bool) -> Result<Listing, StorageError> {
        let prefix = owner_path(owner_id);
        let objects: Vec<_> = self.store.list(Some(&prefix)).try_collect().await?;

        let ids: Vec<String> = objects
            .iter()
            .filter_map(|meta| meta.location.filename().map(str::to_string))
            .collect();
        debug!(count = ids.len(), "Listed fragment metadata");

        if !expand {
            return Ok(Listing::Ids(ids));
        }

        let fetched = try_join_all(ids.iter().map(|id| self.get(owner_id, id))).await?;
        // A record deleted between list and get is skipped
        Ok(Listing::Fragments(fetched.into_iter().flatten().collect()))
    }

    #[instrument(skip(self))]
    async fn delete(&self, owner_id: &str, id: &str) -> Result<(), StorageError> {
        match self.store.delete(&fragment_path(owner_id, id)).await {
            Ok(()) | Err(object_store::Error::NotFound { .. }) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// [`ObjectStore`] over an `object_store` bucket
pub struct DurableObjectStore {
    store: Arc<DynObjectStore>,
}

impl DurableObjectStore {
    pub fn new(store: Arc<DynObjectStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ObjectStore for DurableObjectStore {
    #[instrument(skip(self, data), fields(size = data.len()))]
    async fn put(&self, owner_id: &str, id: &str, data: Bytes) -> Result<(), StorageError> {
        self.store
            .put(&fragment_path(owner_id, id), PutPayload::from(data))
            .await?;
        debug!("Stored fragment content");
        Ok(())
    }

    async fn get(&self, owner_id: &str, id: &str) -> Result<Option<Bytes>, StorageError> {
        read_object(&self.store, &fragment_path(owner_id, id)).await
    }

    #[instrument(skip(self))]
    async fn delete(&self, owner_id: &str, id: &str) -> Result<(), StorageError> {
        match self.store.delete(&fragment_path(owner_id, id)).await {
            Ok(()) | Err(object_store::Error::NotFound { .. }) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
