use hoard_types::BlobId;

/// Derives content identifiers and verifies claimed ones.
///
/// Stateless; `identify` is a pure function of the payload bytes. Streaming
/// callers can feed chunks through [`ContentAddresser::incremental`].
pub struct ContentAddresser;

impl ContentAddresser {
    /// Identifier of a complete payload.
    pub fn identify(payload: &[u8]) -> BlobId {
        BlobId::from_hash(*blake3::hash(payload).as_bytes())
    }

    /// Start an incremental hash for a payload that arrives in pieces.
    pub fn incremental() -> IncrementalAddress {
        IncrementalAddress {
            hasher: blake3::Hasher::new(),
            len: 0,
        }
    }

    /// Check a client-supplied identifier against the payload.
    ///
    /// Returns the computed id when the claim is exactly its lowercase hex
    /// form. Anything else is rejected, including the same digest in a
    /// different case.
    pub fn verify_claim(payload: &[u8], claimed: &str) -> Result<BlobId, AddressError> {
        let computed = Self::identify(payload);
        if claimed == computed.to_hex() {
            Ok(computed)
        } else {
            Err(AddressError::HashMismatch {
                claimed: claimed.to_string(),
                computed,
            })
        }
    }

    /// Returns `true` if `payload` hashes to `expected`.
    pub fn verify(payload: &[u8], expected: &BlobId) -> bool {
        Self::identify(payload) == *expected
    }
}

/// Incremental hashing state, finished into a [`BlobId`].
pub struct IncrementalAddress {
    hasher: blake3::Hasher,
    len: u64,
}

impl IncrementalAddress {
    /// Feed the next chunk of the payload.
    pub fn update(&mut self, chunk: &[u8]) -> &mut Self {
        self.hasher.update(chunk);
        self.len += chunk.len() as u64;
        self
    }

    /// Bytes fed so far.
    pub fn len(&self) -> u64 {
        self.len
    }

    /// Returns `true` if nothing has been fed yet.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Final identifier.
    pub fn finish(&self) -> BlobId {
        BlobId::from_hash(*self.hasher.finalize().as_bytes())
    }
}

/// Errors from content addressing.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AddressError {
    /// Claimed identifier does not match the payload.
    #[error("hash mismatch: claimed {claimed}, computed {computed}")]
    HashMismatch { claimed: String, computed: BlobId },
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn identify_is_deterministic() {
        let data = b"hello world";
        assert_eq!(
            ContentAddresser::identify(data),
            ContentAddresser::identify(data)
        );
    }

    #[test]
    fn identify_agrees_with_blob_id() {
        assert_eq!(
            ContentAddresser::identify(b"same"),
            BlobId::from_bytes(b"same")
        );
    }

    #[test]
    fn empty_payload_has_an_id() {
        let id = ContentAddresser::identify(b"");
        assert_eq!(id.to_hex(), blake3::hash(b"").to_hex().as_str());
    }

    #[test]
    fn verify_claim_accepts_matching() {
        let id = ContentAddresser::identify(b"payload");
        let verified = ContentAddresser::verify_claim(b"payload", &id.to_hex()).unwrap();
        assert_eq!(verified, id);
    }

    #[test]
    fn verify_claim_rejects_other_content() {
        let id = ContentAddresser::identify(b"original");
        let err = ContentAddresser::verify_claim(b"tampered", &id.to_hex()).unwrap_err();
        assert_eq!(
            err,
            AddressError::HashMismatch {
                claimed: id.to_hex(),
                computed: ContentAddresser::identify(b"tampered"),
            }
        );
    }

    #[test]
    fn verify_claim_rejects_malformed_claim() {
        let err = ContentAddresser::verify_claim(b"x", "not-a-hash").unwrap_err();
        assert!(matches!(err, AddressError::HashMismatch { .. }));
    }

    #[test]
    fn verify_claim_rejects_non_canonical_case() {
        let id = ContentAddresser::identify(b"payload");
        let shouted = id.to_hex().to_uppercase();
        let err = ContentAddresser::verify_claim(b"payload", &shouted).unwrap_err();
        assert!(matches!(err, AddressError::HashMismatch { claimed, computed }
            if claimed == shouted && computed == id));
    }

    #[test]
    fn verify_flags_tampering() {
        let id = ContentAddresser::identify(b"original");
        assert!(ContentAddresser::verify(b"original", &id));
        assert!(!ContentAddresser::verify(b"tampered", &id));
    }

    #[test]
    fn incremental_tracks_length() {
        let mut inc = ContentAddresser::incremental();
        assert!(inc.is_empty());
        inc.update(b"abc").update(b"de");
        assert_eq!(inc.len(), 5);
    }

    proptest! {
        #[test]
        fn incremental_matches_one_shot(
            data in proptest::collection::vec(any::<u8>(), 0..4096),
            split in 0usize..4096,
        ) {
            let split = split.min(data.len());
            let mut inc = ContentAddresser::incremental();
            inc.update(&data[..split]).update(&data[split..]);
            prop_assert_eq!(inc.finish(), ContentAddresser::identify(&data));
        }

        #[test]
        fn claim_of_own_id_always_verifies(data in proptest::collection::vec(any::<u8>(), 0..1024)) {
            let id = ContentAddresser::identify(&data);
            prop_assert_eq!(ContentAddresser::verify_claim(&data, &id.to_hex()), Ok(id));
        }
    }
}
