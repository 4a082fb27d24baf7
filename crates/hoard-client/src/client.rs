use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use hoard_crypto::ContentAddresser;
use hoard_protocol::{
    endpoints, BlobSource, BlobsQuery, BlobsResponse, Enumeration, ErrorBody, HealthResponse,
    StatsResponse, UploadResponse, DEFAULT_CHANNEL_CAPACITY,
};
use hoard_types::{BlobId, Timestamp};
use reqwest::multipart::{Form, Part};
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{ClientError, ClientResult};
use crate::retry::retry_send;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client for a hoard server.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Clone, Debug)]
pub struct HoardClient {
    http: reqwest::Client,
    base_url: String,
}

impl HoardClient {
    /// Create a client for the server at `base_url` (e.g. `http://localhost:8010`).
    pub fn new(base_url: &str) -> ClientResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| ClientError::InvalidUrl {
                url: base_url.to_string(),
                reason: e.to_string(),
            })?;
        Self::with_http_client(base_url, http)
    }

    /// Create a client that sends through an existing `reqwest::Client`.
    pub fn with_http_client(base_url: &str, http: reqwest::Client) -> ClientResult<Self> {
        Url::parse(base_url).map_err(|e| ClientError::InvalidUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    // ---- Uploads ----

    /// Upload one payload, returning its id.
    pub async fn put(&self, data: impl Into<Bytes>) -> ClientResult<BlobId> {
        let data = data.into();
        let id = ContentAddresser::identify(&data);
        self.put_many(vec![data]).await?;
        Ok(id)
    }

    /// Upload several payloads in one multipart request, returning their ids
    /// in order.
    pub async fn put_many(&self, payloads: Vec<Bytes>) -> ClientResult<Vec<BlobId>> {
        let ids: Vec<BlobId> = payloads
            .iter()
            .map(|data| ContentAddresser::identify(data))
            .collect();
        let parts = ids
            .iter()
            .zip(payloads)
            .map(|(id, data)| (id.to_hex(), data))
            .collect();

        let response = self.upload(parts).await?;
        if response.blobs.len() != ids.len() {
            return Err(ClientError::ShortUpload {
                sent: ids.len(),
                acknowledged: response.blobs.len(),
            });
        }
        for (want, got) in ids.iter().zip(&response.blobs) {
            if *want != got.hash {
                return Err(ClientError::UnexpectedId {
                    expected: *want,
                    returned: got.hash,
                });
            }
        }
        Ok(ids)
    }

    /// Send `(claimed id, bytes)` parts as-is.
    ///
    /// The server verifies every claim; a wrong one fails the request with
    /// status 400.
    pub async fn upload(&self, parts: Vec<(String, Bytes)>) -> ClientResult<UploadResponse> {
        let url = self.url(endpoints::UPLOAD);
        let resp = retry_send(endpoints::UPLOAD, || {
            let form = parts.iter().fold(Form::new(), |form, (name, data)| {
                form.part(name.clone(), Part::bytes(data.to_vec()))
            });
            self.http.post(&url).multipart(form).send()
        })
        .await
        .map_err(|source| http_error(endpoints::UPLOAD, source))?;
        let body: UploadResponse = decode(endpoints::UPLOAD, resp).await?;
        debug!(parts = body.blobs.len(), "uploaded");
        Ok(body)
    }

    // ---- Reads ----

    /// Fetch a blob's bytes.
    pub async fn get(&self, id: &BlobId) -> ClientResult<Bytes> {
        let path = endpoints::blob_path(id);
        let url = self.url(&path);
        let resp = retry_send(&path, || self.http.get(&url).send())
            .await
            .map_err(|source| http_error(&path, source))?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Err(ClientError::NotFound(*id));
        }
        let resp = check_status(&path, resp).await?;
        resp.bytes().await.map_err(|source| http_error(&path, source))
    }

    /// One page of the time index in `start < time <= end`.
    pub async fn query(
        &self,
        start: Option<Timestamp>,
        end: Option<Timestamp>,
    ) -> ClientResult<BlobsResponse> {
        self.query_with(&BlobsQuery::new(start, end)).await
    }

    /// One page of the time index, with full control over the query string.
    pub async fn query_with(&self, query: &BlobsQuery) -> ClientResult<BlobsResponse> {
        let url = self.url(endpoints::BLOBS);
        let resp = retry_send(endpoints::BLOBS, || self.http.get(&url).query(query).send())
            .await
            .map_err(|source| http_error(endpoints::BLOBS, source))?;
        decode(endpoints::BLOBS, resp).await
    }

    /// Server statistics.
    pub async fn stats(&self) -> ClientResult<StatsResponse> {
        self.get_json(endpoints::STATS).await
    }

    /// Server liveness.
    pub async fn health(&self) -> ClientResult<HealthResponse> {
        self.get_json(endpoints::HEALTH).await
    }

    /// Walk every blob in `start < time <= end`, streaming contents.
    pub fn iter(&self, start: Option<Timestamp>, end: Option<Timestamp>) -> Enumeration<ClientError> {
        Enumeration::spawn(Arc::new(self.clone()), start, end, DEFAULT_CHANNEL_CAPACITY)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &'static str) -> ClientResult<T> {
        let url = self.url(path);
        let resp = retry_send(path, || self.http.get(&url).send())
            .await
            .map_err(|source| http_error(path, source))?;
        decode(path, resp).await
    }
}

#[async_trait]
impl BlobSource for HoardClient {
    type Error = ClientError;

    async fn query_page(
        &self,
        start: Option<Timestamp>,
        end: Option<Timestamp>,
    ) -> ClientResult<BlobsResponse> {
        self.query(start, end).await
    }

    async fn fetch(&self, id: &BlobId) -> ClientResult<Bytes> {
        self.get(id).await
    }
}

fn http_error(endpoint: &str, source: reqwest::Error) -> ClientError {
    ClientError::Http {
        endpoint: endpoint.to_string(),
        source,
    }
}

/// Turn a non-2xx response into [`ClientError::Api`], using the server's
/// JSON error message when there is one.
async fn check_status(endpoint: &str, resp: reqwest::Response) -> ClientResult<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let text = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&text)
        .map(|body| body.error.message)
        .unwrap_or(text);
    Err(ClientError::Api {
        endpoint: endpoint.to_string(),
        status: status.as_u16(),
        message,
    })
}

async fn decode<T: DeserializeOwned>(endpoint: &str, resp: reqwest::Response) -> ClientResult<T> {
    check_status(endpoint, resp)
        .await?
        .json()
        .await
        .map_err(|source| ClientError::Deserialization {
            endpoint: endpoint.to_string(),
            source,
        })
}
