use bytes::Bytes;
use hoard_crypto::{AddressError, ContentAddresser};
use hoard_types::BlobId;

/// A payload paired with its content identifier.
///
/// The id is always derived from the bytes: either computed by [`Blob::new`]
/// or checked against a client claim by [`Blob::from_claim`]. There is no
/// way to build a `Blob` whose id disagrees with its data.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Blob {
    id: BlobId,
    data: Bytes,
}

impl Blob {
    /// Wrap raw bytes, computing their id.
    pub fn new(data: impl Into<Bytes>) -> Self {
        let data = data.into();
        let id = ContentAddresser::identify(&data);
        Self { id, data }
    }

    /// Wrap raw bytes whose id was asserted by the client.
    ///
    /// Fails with [`AddressError::HashMismatch`] if the claim is wrong.
    pub fn from_claim(claimed: &str, data: impl Into<Bytes>) -> Result<Self, AddressError> {
        let data = data.into();
        let id = ContentAddresser::verify_claim(&data, claimed)?;
        Ok(Self { id, data })
    }

    /// The content identifier.
    pub fn id(&self) -> BlobId {
        self.id
    }

    /// The payload bytes.
    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// Payload length in bytes.
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    /// Consume the blob, returning its bytes.
    pub fn into_data(self) -> Bytes {
        self.data
    }
}
