//! # Fragments Service
//!
//! Owner-scoped create/read/update/delete/list of typed content fragments,
//! with conversion on read.
//!
//! The service owns no global state. A [`Storage`] context is built once
//! (usually from [`StorageConfig`]) and injected.
//!
//! ## Example
//!
//! ```rust,ignore
//! use bytes::Bytes;
//! use fragments_service::{FragmentService, StorageConfig};
//!
//! #[tokio::main]
//! async fn main() -> fragments_core::Result<()> {
//!     let service = FragmentService::from_config(&StorageConfig::Ephemeral)?;
//!
//!     let fragment = service
//!         .create("owner", "application/json", Bytes::from_static(br#"{"name":"John"}"#))
//!         .await?;
//!     let yaml = service.read_content("owner", fragment.id(), Some("yaml")).await?;
//!     assert_eq!(yaml.mime_type, "application/yaml");
//!     Ok(())
//! }
//! ```

pub mod service;

pub use fragments_core::{Fragment, FragmentError, Result};
pub use fragments_storage::{Listing, Storage, StorageConfig};
pub use service::{Content, FragmentService};
