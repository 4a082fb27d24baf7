//! Embedded hoard engine.
//!
//! [`Hoard`] ties the blob repository, the time index and the aggregate
//! counter together behind one handle. It is what the HTTP server wraps,
//! and it can be embedded directly by applications that want a local
//! content-addressed store without the network hop.

pub mod error;
pub mod repository;
pub mod upload;

pub use error::{SdkError, SdkResult};
pub use repository::Hoard;
pub use upload::{UploadPart, UploadReceipt};

// Re-export key types
pub use hoard_index::{AttributeStore, CasBudget, InMemoryAttributeStore, IndexPage};
pub use hoard_protocol::{EnumeratedBlob, Enumeration, StatsResponse};
pub use hoard_store::{Blob, FsObjectBackend, InMemoryObjectBackend, ObjectBackend};
pub use hoard_types::{BlobId, Timestamp};
