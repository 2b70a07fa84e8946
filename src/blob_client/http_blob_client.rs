use std::time::Duration;

use bytes::Bytes;
use futures::StreamExt;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::debug;

use super::blob_client::{
    BlobClient, BlobError, BlobLocation, ByteStream, Fid, Result, UploadResult, volume_id,
    volume_url,
};

/// Settings for [`HttpBlobClient`].
#[derive(Debug, Clone)]
pub struct HttpBlobClientConfig {
    /// Base URL of the master server, e.g. `http://localhost:9333`.
    pub master_url: String,
    /// Replication placement requested for fresh uploads.
    pub replication: Option<String>,
    /// Collection requested for fresh uploads.
    pub collection: Option<String>,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl HttpBlobClientConfig {
    pub fn new(master_url: impl Into<String>) -> Self {
        Self {
            master_url: master_url.into(),
            replication: None,
            collection: None,
            timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AssignResponse {
    #[serde(default)]
    fid: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    public_url: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupLocation {
    url: String,
    public_url: String,
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    locations: Vec<LookupLocation>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    #[serde(default)]
    size: Option<u64>,
    #[serde(default)]
    error: Option<String>,
}

/// A `BlobClient` talking HTTP to a master/volume blob store.
///
/// Fresh fids come from the master's `/dir/assign`; volumes are resolved with
/// `/dir/lookup`; content is read and written directly on the volume server.
pub struct HttpBlobClient {
    client: Client,
    master_url: String,
    replication: Option<String>,
    collection: Option<String>,
}

impl HttpBlobClient {
    /// Create a new client from the given settings.
    pub fn new(config: HttpBlobClientConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self::with_client(client, config))
    }

    /// Create a new client with a custom reqwest client.
    pub fn with_client(client: Client, config: HttpBlobClientConfig) -> Self {
        Self {
            client,
            master_url: config.master_url.trim_end_matches('/').to_string(),
            replication: config.replication,
            collection: config.collection,
        }
    }

    fn assign_url(&self) -> String {
        format!("{}/dir/assign", self.master_url)
    }

    fn lookup_url(&self) -> String {
        format!("{}/dir/lookup", self.master_url)
    }

    async fn assign(&self) -> Result<BlobLocation> {
        let mut query: Vec<(&str, &str)> = Vec::new();
        if let Some(replication) = &self.replication {
            query.push(("replication", replication.as_str()));
        }
        if let Some(collection) = &self.collection {
            query.push(("collection", collection.as_str()));
        }

        let response = self.client.get(self.assign_url()).query(&query).send().await?;
        let status = response.status();
        let assigned: AssignResponse = response
            .json()
            .await
            .map_err(|e| BlobError::Protocol(format!("failed to parse assign response: {}", e)))?;

        if let Some(error) = assigned.error {
            return Err(BlobError::Protocol(format!("assign failed: {}", error)));
        }
        if !status.is_success() {
            return Err(BlobError::UnexpectedStatus {
                status: status.as_u16(),
                context: "assigning a fid".to_string(),
            });
        }

        match (assigned.fid, assigned.url) {
            (Some(fid), Some(url)) => {
                let public_url = assigned.public_url.unwrap_or_else(|| url.clone());
                debug!(fid = %fid, volume = %url, "assigned fid");
                Ok(BlobLocation {
                    fid,
                    url,
                    public_url,
                })
            }
            _ => Err(BlobError::Protocol(
                "assign response missing fid or url".to_string(),
            )),
        }
    }
}

impl BlobClient for HttpBlobClient {
    async fn lookup(&self, fid: &Fid) -> Result<BlobLocation> {
        let volume = volume_id(fid)?;
        let response = self
            .client
            .get(self.lookup_url())
            .query(&[("volumeId", volume)])
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(BlobError::NotFound(fid.clone()));
        }
        if !status.is_success() {
            return Err(BlobError::UnexpectedStatus {
                status: status.as_u16(),
                context: format!("looking up volume {}", volume),
            });
        }

        let lookup: LookupResponse = response
            .json()
            .await
            .map_err(|e| BlobError::Protocol(format!("failed to parse lookup response: {}", e)))?;
        if let Some(error) = lookup.error {
            debug!(fid = %fid, error = %error, "lookup reported an error");
            return Err(BlobError::NotFound(fid.clone()));
        }

        let location = lookup
            .locations
            .into_iter()
            .next()
            .ok_or_else(|| BlobError::NotFound(fid.clone()))?;
        Ok(BlobLocation {
            fid: fid.clone(),
            url: location.url,
            public_url: location.public_url,
        })
    }

    async fn upload(
        &self,
        contents: Bytes,
        filename: &str,
        target: Option<&BlobLocation>,
    ) -> Result<UploadResult> {
        let location = match target {
            Some(location) => location.clone(),
            None => self.assign().await?,
        };

        let length = contents.len() as u64;
        let part = Part::stream_with_length(contents, length).file_name(filename.to_string());
        let form = Form::new().part("file", part);
        let response = self
            .client
            .post(volume_url(&location.url, &location.fid))
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;
        if !status.is_success() {
            let detail = serde_json::from_slice::<UploadResponse>(&body)
                .ok()
                .and_then(|r| r.error);
            let context = match detail {
                Some(error) => format!("uploading {}: {}", location.fid, error),
                None => format!("uploading {}", location.fid),
            };
            return Err(BlobError::UnexpectedStatus {
                status: status.as_u16(),
                context,
            });
        }
        if body.is_empty() {
            return Err(BlobError::EmptyResponse);
        }
        let uploaded: UploadResponse = serde_json::from_slice(&body)
            .map_err(|e| BlobError::Protocol(format!("failed to parse upload response: {}", e)))?;

        if let Some(error) = uploaded.error {
            return Err(BlobError::Protocol(format!("upload failed: {}", error)));
        }
        let size = uploaded.size.ok_or(BlobError::EmptyResponse)?;

        Ok(UploadResult {
            fid: location.fid,
            size,
            url: location.url,
            public_url: location.public_url,
        })
    }

    async fn fetch(&self, fid: &Fid) -> Result<Bytes> {
        let location = self.lookup(fid).await?;
        let response = self
            .client
            .get(volume_url(&location.url, fid))
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => Ok(response.bytes().await?),
            StatusCode::NOT_FOUND => Err(BlobError::NotFound(fid.clone())),
            status => Err(BlobError::UnexpectedStatus {
                status: status.as_u16(),
                context: format!("fetching {}", fid),
            }),
        }
    }

    async fn fetch_stream(&self, fid: &Fid) -> Result<ByteStream> {
        let location = self.lookup(fid).await?;
        let response = self
            .client
            .get(volume_url(&location.url, fid))
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => Ok(Box::pin(
                response.bytes_stream().map(|chunk| chunk.map_err(BlobError::from)),
            )),
            StatusCode::NOT_FOUND => Err(BlobError::NotFound(fid.clone())),
            status => Err(BlobError::UnexpectedStatus {
                status: status.as_u16(),
                context: format!("fetching {}", fid),
            }),
        }
    }

    async fn has(&self, fid: &Fid) -> Result<bool> {
        let location = match self.lookup(fid).await {
            Ok(location) => location,
            Err(BlobError::NotFound(_)) => return Ok(false),
            Err(e) => return Err(e),
        };
        let response = self
            .client
            .head(volume_url(&location.url, fid))
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => Err(BlobError::UnexpectedStatus {
                status: status.as_u16(),
                context: format!("checking {}", fid),
            }),
        }
    }

    async fn delete(&self, fid: &Fid) -> Result<()> {
        let location = self.lookup(fid).await?;
        let response = self
            .client
            .delete(volume_url(&location.url, fid))
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::NOT_FOUND => Err(BlobError::NotFound(fid.clone())),
            status => Err(BlobError::UnexpectedStatus {
                status: status.as_u16(),
                context: format!("deleting {}", fid),
            }),
        }
    }

    fn public_url(&self, base_url: &str, fid: &Fid) -> String {
        volume_url(base_url, fid)
    }
}
