//! Wire protocol for hoard.
//!
//! Defines the HTTP endpoint layout, the JSON bodies exchanged between
//! clients and servers, and the [`Enumeration`] cursor that walks the time
//! index page by page while streaming blob contents to the consumer.

pub mod cursor;
pub mod endpoint;
pub mod error;
pub mod message;

pub use cursor::{BlobSource, EnumeratedBlob, Enumeration, DEFAULT_CHANNEL_CAPACITY};
pub use endpoint::{endpoints, HealthResponse};
pub use error::{ProtocolError, ProtocolResult};
pub use message::{
    BlobEntry, BlobsQuery, BlobsResponse, ErrorBody, ErrorDetail, StatsResponse, UploadResponse,
    UploadedBlob, MAX_UPLOAD_SIZE, PROTOCOL_VERSION,
};
