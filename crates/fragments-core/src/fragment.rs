//! Fragment entity
//!
//! A fragment is one stored content blob described by this record. The record
//! and the bytes live in separate stores under the same `(owner_id, id)` key.
//!
//! # Invariants
//! - `mime_type()` is fixed for the life of a fragment; [`Fragment::set_type`]
//!   may change parameters only.
//! - `updated >= created` at all times.
//! - `size` matches the byte length of the last successful content write.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::content_type::ContentType;
use crate::error::FragmentError;

/// Identifier of a fragment, unique within its owner
pub type FragmentId = String;

/// Generate a fresh globally-unique fragment id
pub fn generate_fragment_id() -> FragmentId {
    Uuid::new_v4().to_string()
}

/// Validated fragment metadata.
///
/// Serializes to the boundary shape
/// `{ id, ownerId, type, size, created, updated }` with RFC 3339 timestamps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "FragmentRecord", try_from = "FragmentRecord")]
pub struct Fragment {
    id: FragmentId,
    owner_id: String,
    raw_type: String,
    content_type: ContentType,
    size: u64,
    created: DateTime<Utc>,
    updated: DateTime<Utc>,
}

impl Fragment {
    /// Create an empty fragment (size 0) with a generated id and current timestamps.
    ///
    /// # Errors
    ///
    /// See [`FragmentBuilder::build`].
    pub fn new(owner_id: impl Into<String>, content_type: impl Into<String>) -> Result<Self, FragmentError> {
        Self::builder(owner_id, content_type).build()
    }

    /// Start building a fragment with optional id, size and timestamps
    pub fn builder(owner_id: impl Into<String>, content_type: impl Into<String>) -> FragmentBuilder {
        FragmentBuilder {
            owner_id: owner_id.into(),
            content_type: content_type.into(),
            id: None,
            size: 0,
            created: None,
            updated: None,
        }
    }

    /// Whether a raw content-type string names a supported type.
    ///
    /// Parameters are ignored: `text/plain; charset=utf-8` is supported.
    pub fn is_supported_type(raw: &str) -> bool {
        ContentType::parse(raw).is_ok_and(|ct| ct.is_supported())
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn owner_id(&self) -> &str {
        &self.owner_id
    }

    /// Raw content type as supplied, parameters included
    pub fn content_type(&self) -> &str {
        &self.raw_type
    }

    /// Parsed content type
    pub fn parsed_type(&self) -> &ContentType {
        &self.content_type
    }

    /// Base type with parameters stripped
    pub fn mime_type(&self) -> &str {
        self.content_type.essence()
    }

    /// True when the base type is `text/*`
    pub fn is_text(&self) -> bool {
        self.content_type.is_text()
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn created(&self) -> DateTime<Utc> {
        self.created
    }

    pub fn updated(&self) -> DateTime<Utc> {
        self.updated
    }

    /// Replace the raw type, keeping the base mime type.
    ///
    /// # Errors
    ///
    /// Returns `TypeMismatch` (and leaves `self` untouched) when the new base
    /// type differs from the current one.
    pub fn set_type(&mut self, raw: impl Into<String>) -> Result<(), FragmentError> {
        let raw = raw.into();
        let parsed = ContentType::parse(&raw)?;
        if parsed.essence() != self.mime_type() {
            return Err(FragmentError::TypeMismatch {
                expected: self.mime_type().to_string(),
                actual: parsed.essence().to_string(),
            });
        }
        self.raw_type = raw.trim().to_string();
        self.content_type = parsed;
        Ok(())
    }

    /// Record a content write of `len` bytes: refreshes `size` and `updated`.
    pub fn record_write(&mut self, len: usize) {
        self.size = len as u64;
        self.touch();
    }

    /// Bump `updated` to now, never earlier than `created`
    pub fn touch(&mut self) {
        self.updated = Utc::now().max(self.created).max(self.updated);
    }
}

/// Builder for [`Fragment`] used by constructors and storage decoders
#[derive(Debug, Clone)]
pub struct FragmentBuilder {
    owner_id: String,
    content_type: String,
    id: Option<FragmentId>,
    size: i64,
    created: Option<DateTime<Utc>>,
    updated: Option<DateTime<Utc>>,
}

impl FragmentBuilder {
    /// Use an existing id instead of generating one
    pub fn id(mut self, id: impl Into<FragmentId>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Set the recorded size. Negative values fail at [`build`](Self::build).
    pub fn size(mut self, size: i64) -> Self {
        self.size = size;
        self
    }

    pub fn created(mut self, created: DateTime<Utc>) -> Self {
        self.created = Some(created);
        self
    }

    pub fn updated(mut self, updated: DateTime<Utc>) -> Self {
        self.updated = Some(updated);
        self
    }

    /// Validate and construct the fragment.
    ///
    /// # Errors
    ///
    /// - `Validation` when the owner or type is empty, the size is negative,
    ///   the id is empty or contains `/`, or `updated` precedes `created`
    /// - `UnsupportedType` when the base type is malformed or not registered
    pub fn build(self) -> Result<Fragment, FragmentError> {
        if self.owner_id.trim().is_empty() {
            return Err(FragmentError::validation("ownerId must not be empty"));
        }

        let content_type = ContentType::parse(&self.content_type)?;
        if !content_type.is_supported() {
            return Err(FragmentError::UnsupportedType(content_type.essence().to_string()));
        }

        let size = u64::try_from(self.size)
            .map_err(|_| FragmentError::validation(format!("size must be >= 0, got {}", self.size)))?;

        let id = match self.id {
            Some(id) if id.is_empty() => {
                return Err(FragmentError::validation("id must not be empty"));
            }
            Some(id) if id.contains('/') => {
                return Err(FragmentError::validation(format!("id must not contain '/': {id}")));
            }
            Some(id) => id,
            None => generate_fragment_id(),
        };

        let now = Utc::now();
        let created = self.created.unwrap_or(now);
        let updated = self.updated.unwrap_or(created.max(now));
        if updated < created {
            return Err(FragmentError::validation("updated must not precede created"));
        }

        Ok(Fragment {
            id,
            owner_id: self.owner_id,
            raw_type: self.content_type.trim().to_string(),
            content_type,
            size,
            created,
            updated,
        })
    }
}

/// Serialized boundary shape of a fragment.
///
/// `size` is kept signed so a negative value read from an untrusted source
/// is reported as a validation failure rather than a decode failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FragmentRecord {
    pub id: FragmentId,
    pub owner_id: String,
    #[serde(rename = "type")]
    pub content_type: String,
    pub size: i64,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

impl From<Fragment> for FragmentRecord {
    fn from(fragment: Fragment) -> Self {
        Self {
            id: fragment.id,
            owner_id: fragment.owner_id,
            content_type: fragment.raw_type,
            size: i64::try_from(fragment.size).unwrap_or(i64::MAX),
            created: fragment.created,
            updated: fragment.updated,
        }
    }
}

impl TryFrom<FragmentRecord> for Fragment {
    type Error = FragmentError;

    fn try_from(record: FragmentRecord) -> Result<Self, Self::Error> {
        Fragment::builder(record.owner_id, record.content_type)
            .id(record.id)
            .size(record.size)
            .created(record.created)
            .updated(record.updated)
            .build()
    }
}
