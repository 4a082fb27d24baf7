use std::sync::Arc;

use hoard_sdk::Hoard;

/// Shared state handed to every handler.
#[derive(Clone, Debug)]
pub struct AppState {
    pub hoard: Arc<Hoard>,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(hoard: Arc<Hoard>, max_upload_bytes: usize) -> Self {
        Self {
            hoard,
            max_upload_bytes,
        }
    }
}
