//! Upload client sending the persisted bundle to the receiving endpoint.
//!
//! The bundle file is posted as-is: the request body is exactly the bytes
//! on disk, declared as `application/json`.

#[cfg(feature = "upload")]
use crate::export::BundleStore;
use serde::{Deserialize, Serialize};

/// Host of the default receiving endpoint.
pub const DEFAULT_UPLOAD_HOST: &str = "192.168.1.7";

/// Port of the default receiving endpoint.
pub const DEFAULT_UPLOAD_PORT: u16 = 5001;

/// Upload endpoint configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Receiving host
    pub host: String,
    /// Receiving port
    pub port: u16,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self::new(DEFAULT_UPLOAD_HOST, DEFAULT_UPLOAD_PORT)
    }
}

impl UploadConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Get the base URL.
    pub fn url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    /// Get the upload endpoint URL.
    pub fn upload_url(&self) -> String {
        format!("{}/upload", self.url())
    }
}

/// Upload error types.
#[derive(Debug)]
pub enum UploadError {
    /// The persisted bundle could not be read
    Read(String),
    /// The endpoint URL is not valid
    InvalidUrl(String),
    /// Network/HTTP error
    Network(String),
}

impl std::fmt::Display for UploadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UploadError::Read(msg) => write!(f, "Could not read bundle: {msg}"),
            UploadError::InvalidUrl(url) => write!(f, "Invalid upload URL: {url}"),
            UploadError::Network(msg) => write!(f, "Upload network error: {msg}"),
        }
    }
}

impl std::error::Error for UploadError {}

/// What the endpoint answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadReceipt {
    /// HTTP status code
    pub status: u16,
    /// Number of bytes sent
    pub bytes_sent: usize,
}

impl UploadReceipt {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// HTTP client for bundle uploads.
#[cfg(feature = "upload")]
pub struct UploadClient {
    config: UploadConfig,
    client: reqwest::Client,
}

#[cfg(feature = "upload")]
impl UploadClient {
    /// Create a new upload client. Timeouts are left at the HTTP client's defaults.
    pub fn new(config: UploadConfig) -> Result<Self, UploadError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("investigation-agent/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| UploadError::Network(e.to_string()))?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &UploadConfig {
        &self.config
    }

    /// Post the persisted bundle file once. No retry.
    pub async fn upload_bundle(&self, store: &BundleStore) -> Result<UploadReceipt, UploadError> {
        let body = tokio::fs::read(store.path())
            .await
            .map_err(|e| UploadError::Read(format!("{:?}: {e}", store.path())))?;
        self.upload_bytes(body).await
    }

    /// Post raw JSON bytes to the upload endpoint.
    pub async fn upload_bytes(&self, body: Vec<u8>) -> Result<UploadReceipt, UploadError> {
        let url = self.config.upload_url();
        let url = reqwest::Url::parse(&url).map_err(|_| UploadError::InvalidUrl(url))?;
        let bytes_sent = body.len();

        let response = self
            .client
            .post(url)
            .header("Content-Type", "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| UploadError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        tracing::info!(status, bytes_sent, "Server response");

        Ok(UploadReceipt { status, bytes_sent })
    }
}
