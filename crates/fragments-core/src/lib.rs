//! # Fragments Core
//!
//! Domain model for typed content fragments stored on behalf of isolated
//! owners.
//!
//! This crate has no I/O. It provides:
//!
//! - **Fragment**: the validated metadata entity and its builder
//! - **ContentType**: explicit `(base type, parameters)` parser used for
//!   validation, update comparison and conversion resolution
//! - **Registry**: the closed set of supported base types
//! - **FragmentError**: the caller-facing error taxonomy
//!
//! ## Example
//!
//! ```rust
//! use fragments_core::Fragment;
//!
//! let fragment = Fragment::new("owner-hash", "text/plain; charset=utf-8").unwrap();
//! assert_eq!(fragment.mime_type(), "text/plain");
//! assert!(fragment.is_text());
//! assert!(!Fragment::is_supported_type("audio/mpeg"));
//! ```

pub mod content_type;
pub mod error;
pub mod fragment;

pub use content_type::{ContentType, SUPPORTED_TYPES, is_registered};
pub use error::{FragmentError, Result};
pub use fragment::{Fragment, FragmentBuilder, FragmentId, FragmentRecord, generate_fragment_id};
