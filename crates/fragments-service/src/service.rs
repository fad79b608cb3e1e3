//! Fragment service
//!
//! Orchestrates entity validation, the two stores and the conversion engine.
//! Every operation is scoped by `owner_id`; a fragment owned by someone else
//! is reported exactly like a missing one.
//!
//! ## Write order
//!
//! ```text
//! create:  validate -> metadata.put -> objects.put
//! update:  type check -> objects.put -> metadata.put
//! delete:  existence check -> (metadata.delete || objects.delete)
//! ```
//!
//! A failure between the two writes of `create` or `update`, or on one side
//! of `delete`, leaves the fragment partially present. That state is reported
//! as a `StorageError` naming which side succeeded and is never repaired here.

use bytes::Bytes;
use fragments_convert::{ConvertError, Converted};
use fragments_core::{Fragment, FragmentError, Result};
use fragments_storage::{FragmentKey, Listing, Storage, StorageConfig, StorageError};
use tracing::{debug, info, instrument, warn};

/// Content bytes and the base type they are labelled with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Content {
    pub bytes: Bytes,
    pub mime_type: String,
}

impl From<Converted> for Content {
    fn from(converted: Converted) -> Self {
        Self {
            bytes: converted.bytes,
            mime_type: converted.mime_type,
        }
    }
}

/// Fragment operations over an injected storage context
#[derive(Debug, Clone)]
pub struct FragmentService {
    storage: Storage,
}

impl FragmentService {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    /// Build the storage context described by `config`
    pub fn from_config(config: &StorageConfig) -> Result<Self> {
        Ok(Self::new(config.build()?))
    }

    /// Build the storage context described by the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_config(&StorageConfig::from_env()?)
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// Validate and persist a new fragment.
    ///
    /// Validation failures happen before anything is written.
    #[instrument(skip(self, data), fields(owner = %owner_id, mime = tracing::field::Empty, size = data.len()))]
    pub async fn create(&self, owner_id: &str, content_type: &str, data: Bytes) -> Result<Fragment> {
        let mut fragment = Fragment::new(owner_id, content_type)?;
        fragment.record_write(data.len());
        tracing::Span::current().record("mime", fragment.mime_type());

        let owner_id = fragment.owner_id();
        self.storage.metadata().put(&fragment).await?;

        if let Err(cause) = self.storage.objects().put(owner_id, fragment.id(), data).await {
            let key = FragmentKey::new(owner_id, fragment.id());
            warn!(key = %key, error = %cause, "Content write failed after metadata write");
            return Err(StorageError::PartialWrite {
                key: key.to_string(),
                metadata_written: true,
                content_written: false,
                cause: Box::new(cause),
            }
            .into());
        }

        info!(id = %fragment.id(), "Fragment created");
        Ok(fragment)
    }

    /// Fetch a fragment's metadata
    pub async fn read(&self, owner_id: &str, id: &str) -> Result<Fragment> {
        match self.storage.metadata().get(owner_id, id).await? {
            Some(fragment) if fragment.owner_id() == owner_id => Ok(fragment),
            _ => Err(FragmentError::not_found(id)),
        }
    }

    /// Fetch a fragment's content, converted to the type `extension` names.
    ///
    /// Without an extension the stored bytes are returned under the
    /// fragment's own base type.
    #[instrument(skip(self), fields(owner = %owner_id))]
    pub async fn read_content(
        &self,
        owner_id: &str,
        id: &str,
        extension: Option<&str>,
    ) -> Result<Content> {
        let fragment = self.read(owner_id, id).await?;
        let from = fragment.mime_type().to_string();

        let target = match extension {
            Some(ext) => {
                let to = fragments_convert::resolve_extension(ext)?;
                if !fragments_convert::is_supported(&from, to) {
                    return Err(ConvertError::unsupported(from.as_str(), to).into());
                }
                to
            }
            None => from.as_str(),
        };
        let target = target.to_string();

        let bytes = self.load_content(&fragment).await?;
        if target == from {
            return Ok(Content {
                bytes,
                mime_type: from,
            });
        }

        debug!(from = %from, to = %target, "Converting content");
        let (from_label, to_label) = (from.clone(), target.clone());
        let converted = tokio::task::spawn_blocking(move || {
            fragments_convert::convert(bytes, &from, &target)
        })
        .await
        .map_err(|e| FragmentError::ConversionFailed {
            from: from_label,
            to: to_label,
            reason: e.to_string(),
        })??;

        Ok(converted.into())
    }

    /// Replace a fragment's content and raw type.
    ///
    /// The base mime type must not change; a mismatch leaves both records
    /// untouched.
    #[instrument(skip(self, data), fields(owner = %owner_id, size = data.len()))]
    pub async fn update(
        &self,
        owner_id: &str,
        id: &str,
        content_type: &str,
        data: Bytes,
    ) -> Result<Fragment> {
        let mut fragment = self.read(owner_id, id).await?;
        fragment.set_type(content_type)?;

        let len = data.len();
        self.storage.objects().put(owner_id, id, data).await?;
        fragment.record_write(len);

        if let Err(cause) = self.storage.metadata().put(&fragment).await {
            let key = FragmentKey::new(owner_id, id);
            warn!(key = %key, error = %cause, "Metadata write failed after content write");
            return Err(StorageError::PartialWrite {
                key: key.to_string(),
                metadata_written: false,
                content_written: true,
                cause: Box::new(cause),
            }
            .into());
        }

        debug!(mime = %fragment.mime_type(), "Fragment updated");
        Ok(fragment)
    }

    /// Remove a fragment's metadata and content.
    ///
    /// Both deletes are dispatched concurrently.
    #[instrument(skip(self), fields(owner = %owner_id))]
    pub async fn delete(&self, owner_id: &str, id: &str) -> Result<()> {
        self.read(owner_id, id).await?;

        let (metadata, content) = tokio::join!(
            self.storage.metadata().delete(owner_id, id),
            self.storage.objects().delete(owner_id, id),
        );

        let metadata_deleted = metadata.is_ok();
        let content_deleted = content.is_ok();
        let cause = match (metadata, content) {
            (Ok(()), Ok(())) => {
                info!("Fragment deleted");
                return Ok(());
            }
            (Err(e), _) | (_, Err(e)) => e,
        };

        let key = FragmentKey::new(owner_id, id).to_string();
        warn!(
            key = %key,
            metadata_deleted,
            content_deleted,
            error = %cause,
            "Fragment partially deleted"
        );
        Err(StorageError::PartialDelete {
            key,
            metadata_deleted,
            content_deleted,
            cause: Box::new(cause),
        }
        .into())
    }

    /// List an owner's fragments as ids or full records
    pub async fn list(&self, owner_id: &str, expand: bool) -> Result<Listing> {
        Ok(self.storage.metadata().query(owner_id, expand).await?)
    }

    /// Base types a fragment can be read as, its own type first
    pub async fn formats(&self, owner_id: &str, id: &str) -> Result<Vec<&'static str>> {
        let fragment = self.read(owner_id, id).await?;
        Ok(fragments_convert::formats(fragment.mime_type()))
    }

    async fn load_content(&self, fragment: &Fragment) -> Result<Bytes> {
        let owner_id = fragment.owner_id();
        match self.storage.objects().get(owner_id, fragment.id()).await? {
            Some(bytes) => Ok(bytes),
            None => {
                let key = FragmentKey::new(owner_id, fragment.id()).to_string();
                warn!(key = %key, "Metadata present without content");
                Err(StorageError::Inconsistent {
                    key,
                    reason: "metadata present without content".to_string(),
                }
                .into())
            }
        }
    }
}
