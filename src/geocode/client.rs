use anyhow::Result;
use async_trait::async_trait;

/// HTTP access seam for the geocoder, so tests can stub responses.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn get(&self, url: &str) -> Result<Vec<u8>>;
}

pub struct BasicClient(reqwest::Client);

impl BasicClient {
    pub fn new() -> Self {
        Self(reqwest::Client::new())
    }
}

impl Default for BasicClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpClient for BasicClient {
    async fn get(&self, url: &str) -> Result<Vec<u8>> {
        let resp = self.0.get(url).send().await?;
        Ok(resp.bytes().await?.to_vec())
    }
}
