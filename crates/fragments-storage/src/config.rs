//! Configuration for storage backends

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use object_store::DynObjectStore;
use object_store::aws::AmazonS3Builder;
use object_store::local::LocalFileSystem;
use object_store::memory::InMemory;
use tracing::info;

use crate::durable::{DurableMetadataStore, DurableObjectStore};
use crate::error::StorageError;
use crate::memory::EphemeralStorage;
use crate::Storage;

/// Selects the backend mode
pub const ENV_BACKEND: &str = "FRAGMENTS_BACKEND";
/// Bucket holding metadata records
pub const ENV_METADATA_BUCKET: &str = "FRAGMENTS_METADATA_BUCKET";
/// Bucket holding content bytes
pub const ENV_CONTENT_BUCKET: &str = "FRAGMENTS_CONTENT_BUCKET";
/// Optional S3-compatible endpoint override (e.g. a local MinIO)
pub const ENV_S3_ENDPOINT: &str = "FRAGMENTS_S3_ENDPOINT";
/// AWS region; its presence defaults the backend to durable
pub const ENV_AWS_REGION: &str = "AWS_REGION";

/// Where one durable store keeps its objects
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectStoreConfig {
    /// Volatile in-process object store (tests)
    Memory,
    /// Directory on the local filesystem
    Local { root: PathBuf },
    /// S3 or an S3-compatible service
    S3 {
        bucket: String,
        region: String,
        endpoint: Option<String>,
    },
}

impl ObjectStoreConfig {
    /// Create an S3 configuration for `bucket` in `region`
    pub fn s3(bucket: impl Into<String>, region: impl Into<String>) -> Self {
        Self::S3 {
            bucket: bucket.into(),
            region: region.into(),
            endpoint: None,
        }
    }

    /// Set the endpoint of an S3 configuration; no-op for other kinds
    pub fn with_endpoint(mut self, url: impl Into<String>) -> Self {
        if let Self::S3 { endpoint, .. } = &mut self {
            *endpoint = Some(url.into());
        }
        self
    }

    /// Build the underlying object store.
    ///
    /// S3 credentials are read from the standard `AWS_*` environment variables.
    pub fn build(&self) -> Result<Arc<DynObjectStore>, StorageError> {
        match self {
            Self::Memory => Ok(Arc::new(InMemory::new())),
            Self::Local { root } => {
                std::fs::create_dir_all(root)?;
                Ok(Arc::new(LocalFileSystem::new_with_prefix(root)?))
            }
            Self::S3 {
                bucket,
                region,
                endpoint,
            } => {
                let mut builder = AmazonS3Builder::from_env()
                    .with_bucket_name(bucket)
                    .with_region(region);
                if let Some(url) = endpoint {
                    builder = builder
                        .with_endpoint(url)
                        .with_allow_http(url.starts_with("http://"));
                }
                Ok(Arc::new(builder.build()?))
            }
        }
    }
}

/// Storage backend selection
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StorageConfig {
    /// Process-local maps
    #[default]
    Ephemeral,
    /// Network-backed stores, one for metadata and one for content
    Durable {
        metadata: ObjectStoreConfig,
        content: ObjectStoreConfig,
    },
}

impl StorageConfig {
    /// Durable backend with both stores in memory (tests)
    pub fn durable_in_memory() -> Self {
        Self::Durable {
            metadata: ObjectStoreConfig::Memory,
            content: ObjectStoreConfig::Memory,
        }
    }

    /// Durable backend rooted in a local directory
    pub fn durable_local(base_dir: impl Into<PathBuf>) -> Self {
        let base_dir = base_dir.into();
        Self::Durable {
            metadata: ObjectStoreConfig::Local {
                root: base_dir.join("metadata"),
            },
            content: ObjectStoreConfig::Local {
                root: base_dir.join("content"),
            },
        }
    }

    /// Read configuration from the process environment.
    ///
    /// See [`StorageConfig::from_vars`] for the variables consulted.
    pub fn from_env() -> Result<Self, StorageError> {
        Self::from_vars(&std::env::vars().collect())
    }

    /// Read configuration from a variable map.
    ///
    /// - `FRAGMENTS_BACKEND`: `ephemeral` or `durable`. Defaults to
    ///   `durable` when `AWS_REGION` is set, else `ephemeral`.
    /// - `FRAGMENTS_METADATA_BUCKET`, `FRAGMENTS_CONTENT_BUCKET`, `AWS_REGION`:
    ///   required for `durable`.
    /// - `FRAGMENTS_S3_ENDPOINT`: optional endpoint override.
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, StorageError> {
        let var = |name: &str| {
            vars.get(name)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
        };

        let mode = match var(ENV_BACKEND) {
            Some(mode) => mode.to_ascii_lowercase(),
            None if var(ENV_AWS_REGION).is_some() => "durable".to_string(),
            None => "ephemeral".to_string(),
        };

        match mode.as_str() {
            "ephemeral" | "memory" => Ok(Self::Ephemeral),
            "durable" => {
                let require = |name: &str| {
                    var(name)
                        .map(str::to_string)
                        .ok_or_else(|| StorageError::config(format!("{name} must be set for the durable backend")))
                };
                let region = require(ENV_AWS_REGION)?;
                let endpoint = var(ENV_S3_ENDPOINT);

                let mut metadata = ObjectStoreConfig::s3(require(ENV_METADATA_BUCKET)?, region.clone());
                let mut content = ObjectStoreConfig::s3(require(ENV_CONTENT_BUCKET)?, region);
                if let Some(url) = endpoint {
                    metadata = metadata.with_endpoint(url);
                    content = content.with_endpoint(url);
                }
                Ok(Self::Durable { metadata, content })
            }
            other => Err(StorageError::config(format!(
                "unknown {ENV_BACKEND} `{other}`; expected ephemeral|durable"
            ))),
        }
    }

    /// Construct the storage context for this configuration
    pub fn build(&self) -> Result<Storage, StorageError> {
        match self {
            Self::Ephemeral => {
                info!(backend = "ephemeral", "Storage initialized");
                Ok(EphemeralStorage::new().storage())
            }
            Self::Durable { metadata, content } => {
                let storage = Storage::new(
                    Arc::new(DurableMetadataStore::new(metadata.build()?)),
                    Arc::new(DurableObjectStore::new(content.build()?)),
                );
                info!(backend = "durable", metadata = ?metadata, content = ?content, "Storage initialized");
                Ok(storage)
            }
        }
    }
}
