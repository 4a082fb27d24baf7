//! Content-addressed blob storage for hoard.
//!
//! The [`BlobRepository`] owns the mapping from [`BlobId`](hoard_types::BlobId)
//! to stored bytes and makes writes idempotent: storing content that is
//! already present is a no-op reported as `is_new = false`.
//!
//! # Storage Backends
//!
//! Bytes live in an [`ObjectBackend`], an opaque key/value bucket:
//!
//! - [`InMemoryObjectBackend`] -- `HashMap`-based bucket for tests and embedding
//! - [`FsObjectBackend`] -- one file per object under a local directory
//!
//! # Design Rules
//!
//! 1. Blobs are immutable once written (content-addressing guarantees this).
//! 2. A [`Blob`] can only be built from bytes whose id was computed or verified.
//! 3. Concurrent writers of the same id write the same bytes, so a second
//!    backend write is harmless.
//! 4. The repository never retries; backend errors are propagated.

pub mod backend;
pub mod blob;
pub mod error;
pub mod fs;
pub mod memory;
pub mod repository;

// Re-export primary types at crate root for ergonomic imports.
pub use backend::ObjectBackend;
pub use blob::Blob;
pub use error::{StoreError, StoreResult};
pub use fs::FsObjectBackend;
pub use memory::InMemoryObjectBackend;
pub use repository::{BlobRepository, PutOutcome};
