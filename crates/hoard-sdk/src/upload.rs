use bytes::Bytes;
use hoard_protocol::UploadedBlob;
use hoard_types::BlobId;

/// One payload to upload, optionally with the id the client expects.
#[derive(Clone, Debug)]
pub struct UploadPart {
    pub claimed: Option<String>,
    pub data: Bytes,
}

impl UploadPart {
    /// A part whose id the engine computes.
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            claimed: None,
            data: data.into(),
        }
    }

    /// A part that must hash to `claimed`.
    pub fn claimed(claimed: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            claimed: Some(claimed.into()),
            data: data.into(),
        }
    }
}

/// Outcome of uploading a single part.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UploadReceipt {
    pub id: BlobId,
    pub size: u64,
    /// `true` when this upload created the index entry and was counted.
    pub is_new: bool,
}

impl From<UploadReceipt> for UploadedBlob {
    fn from(r: UploadReceipt) -> Self {
        Self {
            hash: r.id,
            size: r.size,
            new: r.is_new,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn part_constructors() {
        let p = UploadPart::new(&b"data"[..]);
        assert!(p.claimed.is_none());
        let p = UploadPart::claimed("abcd", &b"data"[..]);
        assert_eq!(p.claimed.as_deref(), Some("abcd"));
    }

    #[test]
    fn receipt_to_wire() {
        let id = BlobId::from_bytes(b"r");
        let wire: UploadedBlob = UploadReceipt {
            id,
            size: 1,
            is_new: false,
        }
        .into();
        assert_eq!(wire.hash, id);
        assert!(!wire.new);
    }
}
