//! # Fragments Storage
//!
//! Storage abstractions for fragments.
//!
//! A fragment is persisted as two independently-addressed records sharing
//! one `(owner_id, id)` key: a metadata record and the raw content bytes.
//!
//! ## Features
//!
//! - **MetadataStore trait**: put/get/query/delete of fragment records
//! - **ObjectStore trait**: put/get/delete of exact content bytes
//! - **EphemeralStorage**: process-local maps for tests and short runs
//! - **Durable stores**: network-backed stores over `object_store`
//!   (S3, local filesystem, or in-memory for tests)
//! - **StorageConfig**: backend selection, including from the environment
//!
//! ## Example
//!
//! ```rust,ignore
//! use bytes::Bytes;
//! use fragments_core::Fragment;
//! use fragments_storage::EphemeralStorage;
//!
//! #[tokio::main]
//! async fn main() {
//!     let storage = EphemeralStorage::new().storage();
//!     let fragment = Fragment::new("owner", "text/plain").unwrap();
//!
//!     storage.metadata().put(&fragment).await.unwrap();
//!     storage
//!         .objects()
//!         .put("owner", fragment.id(), Bytes::from_static(b"hi"))
//!         .await
//!         .unwrap();
//!
//!     let ids = storage.metadata().query("owner", false).await.unwrap();
//!     assert_eq!(ids.len(), 1);
//! }
//! ```

pub mod config;
pub mod durable;
pub mod error;
pub mod memory;
pub mod record;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use fragments_core::{Fragment, FragmentId};

pub use config::{ObjectStoreConfig, StorageConfig};
pub use durable::{DurableMetadataStore, DurableObjectStore};
pub use error::StorageError;
pub use memory::{EphemeralMetadataStore, EphemeralObjectStore, EphemeralStorage};
pub use record::{METADATA_SCHEMA_VERSION, StoredRecord};

/// Key shared by a fragment's metadata and content records
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FragmentKey {
    pub owner_id: String,
    pub id: FragmentId,
}

impl FragmentKey {
    pub fn new(owner_id: impl Into<String>, id: impl Into<FragmentId>) -> Self {
        Self {
            owner_id: owner_id.into(),
            id: id.into(),
        }
    }
}

impl fmt::Display for FragmentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner_id, self.id)
    }
}

/// Result of a metadata query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Listing {
    /// `expand = false`: ids only
    Ids(Vec<FragmentId>),
    /// `expand = true`: full records
    Fragments(Vec<Fragment>),
}

impl Listing {
    pub fn len(&self) -> usize {
        match self {
            Listing::Ids(ids) => ids.len(),
            Listing::Fragments(fragments) => fragments.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Ids in listing order, whichever form the listing has
    pub fn ids(&self) -> Vec<&str> {
        match self {
            Listing::Ids(ids) => ids.iter().map(String::as_str).collect(),
            Listing::Fragments(fragments) => fragments.iter().map(Fragment::id).collect(),
        }
    }
}

/// Store of fragment metadata records, queryable by owner
///
/// Implementations must store records as explicit structured values and
/// never return a record under an owner other than the one it was put with.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Insert or overwrite the record for `(fragment.owner_id(), fragment.id())`.
    /// Last write observed by the backend wins.
    async fn put(&self, fragment: &Fragment) -> Result<(), StorageError>;

    /// Fetch a record; `None` when absent
    async fn get(&self, owner_id: &str, id: &str) -> Result<Option<Fragment>, StorageError>;

    /// List an owner's fragments as ids (`expand = false`) or full records
    async fn query(&self, owner_id: &str, expand: bool) -> Result<Listing, StorageError>;

    /// Remove a record
    async fn delete(&self, owner_id: &str, id: &str) -> Result<(), StorageError>;
}

/// Store of raw fragment content bytes
///
/// Content is stored byte-for-byte; no transcoding happens at this boundary.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Insert or overwrite the content for `(owner_id, id)`
    async fn put(&self, owner_id: &str, id: &str, data: Bytes) -> Result<(), StorageError>;

    /// Fetch content; `None` when absent
    async fn get(&self, owner_id: &str, id: &str) -> Result<Option<Bytes>, StorageError>;

    /// Remove content
    async fn delete(&self, owner_id: &str, id: &str) -> Result<(), StorageError>;
}

/// Storage context owning one metadata store and one object store.
///
/// Constructed once and injected into the service layer.
#[derive(Clone)]
pub struct Storage {
    metadata: Arc<dyn MetadataStore>,
    objects: Arc<dyn ObjectStore>,
}

impl Storage {
    pub fn new(metadata: Arc<dyn MetadataStore>, objects: Arc<dyn ObjectStore>) -> Self {
        Self { metadata, objects }
    }

    pub fn metadata(&self) -> &Arc<dyn MetadataStore> {
        &self.metadata
    }

    pub fn objects(&self) -> &Arc<dyn ObjectStore> {
        &self.objects
    }
}

impl fmt::Debug for Storage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Storage").finish_non_exhaustive()
    }
}
