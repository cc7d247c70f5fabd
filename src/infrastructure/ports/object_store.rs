use async_trait::async_trait;

/// Port for the secondary object-store copy of generated audio.
///
/// Mirroring is best-effort by design: callers log failures and continue
/// without a mirror URL instead of failing the request.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Upload bytes under `bucket`/`key`, returning the public URL
    async fn put(&self, bucket: &str, key: &str, bytes: Vec<u8>) -> Result<String, String>;
}

/// S3-compatible store spoken to over plain HTTP PUT
pub struct HttpObjectStore {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpObjectStore {
    pub fn new(endpoint: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl ObjectStore for HttpObjectStore {
    async fn put(&self, bucket: &str, key: &str, bytes: Vec<u8>) -> Result<String, String> {
        let url = format!("{}/{}/{}", self.endpoint, bucket, key);

        let response = self
            .client
            .put(&url)
            .body(bytes)
            .send()
            .await
            .map_err(|e| format!("object store unreachable: {}", e))?;

        if !response.status().is_success() {
            return Err(format!("object store returned {}", response.status()));
        }

        Ok(url)
    }
}

/// Used when no object store is configured; every upload "fails" quietly
/// and requests proceed without a mirror URL.
pub struct DisabledObjectStore;

#[async_trait]
impl ObjectStore for DisabledObjectStore {
    async fn put(&self, _bucket: &str, _key: &str, _bytes: Vec<u8>) -> Result<String, String> {
        Err("object store not configured".to_string())
    }
}
