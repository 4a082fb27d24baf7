//! Content addressing for hoard.
//!
//! Derives the canonical [`BlobId`](hoard_types::BlobId) of a payload and
//! checks client-asserted identifiers against it. All hashing is plain
//! BLAKE3 over the payload bytes, so any BLAKE3 tool computes the same id.

pub mod addresser;

pub use addresser::{AddressError, ContentAddresser, IncrementalAddress};
