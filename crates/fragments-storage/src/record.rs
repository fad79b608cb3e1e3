//! Versioned metadata record format
//!
//! Durable backends store metadata as JSON documents of this shape:
//!
//! ```json
//! { "schemaVersion": 1, "id": "...", "ownerId": "...", "type": "text/plain",
//!   "size": 13, "created": "2024-01-01T00:00:00Z", "updated": "..." }
//! ```
//!
//! Decoding re-validates the record through the entity builder, so a record
//! that would not construct a `Fragment` surfaces as `StorageError::Corrupt`.

use fragments_core::{Fragment, FragmentRecord};
use serde::{Deserialize, Serialize};

use crate::error::StorageError;

/// Current metadata schema version
pub const METADATA_SCHEMA_VERSION: u32 = 1;

/// On-disk/on-wire metadata document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredRecord {
    pub schema_version: u32,
    #[serde(flatten)]
    pub fragment: FragmentRecord,
}

impl StoredRecord {
    /// Wrap a fragment in the current schema version
    pub fn new(fragment: &Fragment) -> Self {
        Self {
            schema_version: METADATA_SCHEMA_VERSION,
            fragment: FragmentRecord::from(fragment.clone()),
        }
    }

    /// Encode to JSON bytes
    pub fn encode(fragment: &Fragment) -> Result<Vec<u8>, StorageError> {
        serde_json::to_vec(&Self::new(fragment))
            .map_err(|e| StorageError::serialization(e.to_string()))
    }

    /// Decode JSON bytes stored under `key` back into a validated fragment
    pub fn decode(key: &str, data: &[u8]) -> Result<Fragment, StorageError> {
        let record: StoredRecord = serde_json::from_slice(data)?;
        if record.schema_version != METADATA_SCHEMA_VERSION {
            return Err(StorageError::Corrupt {
                key: key.to_string(),
                reason: format!("unknown schema version {}", record.schema_version),
            });
        }
        Fragment::try_from(record.fragment).map_err(|e| StorageError::Corrupt {
            key: key.to_string(),
            reason: e.to_string(),
        })
    }
}
