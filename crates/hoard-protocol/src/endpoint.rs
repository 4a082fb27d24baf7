/// HTTP endpoint paths for the hoard protocol.
///
/// The three blob routes are also served under [`API_PREFIX`](endpoints::API_PREFIX).
pub mod endpoints {
    pub const BLOB: &str = "/blob";
    pub const UPLOAD: &str = "/upload";
    pub const BLOBS: &str = "/blobs";
    pub const STATS: &str = "/_stats";
    pub const HEALTH: &str = "/_health";
    pub const API_PREFIX: &str = "/api";

    /// Path of a single blob, e.g. `/blob/ab12...`.
    pub fn blob_path(id: &hoard_types::BlobId) -> String {
        format!("{BLOB}/{id}")
    }
}

/// Health check response.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub protocol_version: u32,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".into(),
            version: env!("CARGO_PKG_VERSION").into(),
            protocol_version: super::message::PROTOCOL_VERSION,
        }
    }
}
