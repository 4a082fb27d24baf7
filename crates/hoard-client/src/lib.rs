//! Typed HTTP client for hoard servers.
//!
//! [`HoardClient`] wraps a `reqwest::Client` with the server's base URL and
//! exposes one method per endpoint. Transport failures are retried with
//! exponential backoff; HTTP error responses are decoded into
//! [`ClientError`] without retry.
//!
//! [`HoardClient::iter`] walks the server's time index page by page and
//! streams blob contents through a bounded channel.

pub mod client;
pub mod error;
mod retry;

pub use client::HoardClient;
pub use error::{ClientError, ClientResult};
