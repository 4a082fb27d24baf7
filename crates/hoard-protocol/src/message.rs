use hoard_types::{BlobId, Timestamp};
use serde::{Deserialize, Serialize};

use crate::error::{ProtocolError, ProtocolResult};

pub const PROTOCOL_VERSION: u32 = 1;
pub const MAX_UPLOAD_SIZE: usize = 64 * 1024 * 1024;

/// Query string of `GET /blobs`.
///
/// Bounds are canonical timestamps; an absent or empty bound means "not
/// given". `limit` is clamped by the server's page size.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobsQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

impl BlobsQuery {
    /// Build a query from typed bounds.
    pub fn new(start: Option<Timestamp>, end: Option<Timestamp>) -> Self {
        Self {
            start: start.map(|t| t.to_string()),
            end: end.map(|t| t.to_string()),
            limit: None,
        }
    }

    /// Parsed `start` bound.
    pub fn start(&self) -> ProtocolResult<Option<Timestamp>> {
        parse_param("start", self.start.as_deref())
    }

    /// Parsed `end` bound.
    pub fn end(&self) -> ProtocolResult<Option<Timestamp>> {
        parse_param("end", self.end.as_deref())
    }
}

fn parse_param(param: &'static str, raw: Option<&str>) -> ProtocolResult<Option<Timestamp>> {
    Timestamp::parse_bound(raw.unwrap_or_default()).map_err(|e| ProtocolError::InvalidQuery {
        param,
        reason: e.to_string(),
    })
}

/// One entry of the time index.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobEntry {
    pub hash: BlobId,
    pub time: Timestamp,
}

/// Body of `GET /blobs`: a page of entries plus the window searched.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobsResponse {
    pub blobs: Vec<BlobEntry>,
    pub start: Timestamp,
    pub end: Timestamp,
}

/// One stored part of an upload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedBlob {
    pub hash: BlobId,
    pub size: u64,
    /// `false` when identical content was already stored.
    pub new: bool,
}

/// Body of `POST /upload`, one element per part in request order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResponse {
    pub blobs: Vec<UploadedBlob>,
}

/// Body of `GET /_stats`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsResponse {
    pub blob_count: u64,
    pub blob_size: u64,
    pub version: String,
    pub started_at: Timestamp,
    pub bucket: String,
    pub index_domain: String,
}

/// JSON error envelope: `{"error": {"code": 404, "message": "..."}}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: u16,
    pub message: String,
}

impl ErrorBody {
    pub fn new(code: u16, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                code,
                message: message.into(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blobs_response_wire_shape() {
        let id = BlobId::from_bytes(b"wire");
        let resp = BlobsResponse {
            blobs: vec![BlobEntry {
                hash: id,
                time: Timestamp::from_nanos(1_500_000_000),
            }],
            start: Timestamp::MIN,
            end: Timestamp::from_nanos(2_000_000_000),
        };
        let json: serde_json::Value = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["blobs"][0]["hash"], id.to_hex());
        assert_eq!(json["blobs"][0]["time"], "1970-01-01T00:00:01.500000000Z");
        assert_eq!(json["start"], "1970-01-01T00:00:00.000000000Z");

        let back: BlobsResponse = serde_json::from_value(json).unwrap();
        assert_eq!(back, resp);
    }

    #[test]
    fn upload_response_uses_new_field() {
        let resp = UploadResponse {
            blobs: vec![UploadedBlob {
                hash: BlobId::from_bytes(b"u"),
                size: 1,
                new: true,
            }],
        };
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("\"new\":true"));
    }

    #[test]
    fn error_body_shape() {
        let json = serde_json::to_value(ErrorBody::new(404, "blob not found")).unwrap();
        assert_eq!(json["error"]["code"], 404);
        assert_eq!(json["error"]["message"], "blob not found");
    }

    #[test]
    fn query_bounds_parse() {
        let q = BlobsQuery {
            start: Some(String::new()),
            end: Some("1970-01-01T00:00:02Z".into()),
            limit: None,
        };
        assert_eq!(q.start().unwrap(), None);
        assert_eq!(q.end().unwrap(), Some(Timestamp::from_nanos(2_000_000_000)));

        let bad = BlobsQuery {
            start: Some("yesterday".into()),
            ..Default::default()
        };
        assert!(matches!(
            bad.start().unwrap_err(),
            ProtocolError::InvalidQuery { param: "start", .. }
        ));
    }

    #[test]
    fn typed_query_round_trips_bounds() {
        let t = Timestamp::from_nanos(42);
        let q = BlobsQuery::new(Some(t), None);
        assert_eq!(q.start().unwrap(), Some(t));
        assert_eq!(q.end().unwrap(), None);
    }
}
