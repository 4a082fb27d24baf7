//! Foundation types for hoard.
//!
//! Every other hoard crate depends on `hoard-types`.
//!
//! # Key Types
//!
//! - [`BlobId`] — Content-addressed identifier (BLAKE3 of the payload bytes)
//! - [`Timestamp`] — Nanosecond UTC instant with a string-sortable canonical form

pub mod blob_id;
pub mod error;
pub mod timestamp;

pub use blob_id::BlobId;
pub use error::TypeError;
pub use timestamp::Timestamp;
