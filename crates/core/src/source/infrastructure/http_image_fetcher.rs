use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;

use crate::source::domain::image_fetcher::{FetchError, ImageFetcher};

const USER_AGENT: &str = concat!("face-detector/", env!("CARGO_PKG_VERSION"));

/// Fetches `http(s)://` URLs with reqwest and `file://` URLs from disk.
pub struct HttpImageFetcher {
    client: reqwest::Client,
}

impl HttpImageFetcher {
    pub fn new() -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| FetchError::Transport {
                url: String::new(),
                message: e.to_string(),
            })?;
        Ok(Self { client })
    }

    async fn fetch_http(&self, url: Url) -> Result<Vec<u8>, FetchError> {
        let transport = |e: reqwest::Error| FetchError::Transport {
            url: url.to_string(),
            message: e.to_string(),
        };
        let response = self.client.get(url.clone()).send().await.map_err(transport)?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        let bytes = response.bytes().await.map_err(transport)?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let parsed = Url::parse(url).map_err(|_| FetchError::InvalidUrl(url.to_string()))?;
        match parsed.scheme() {
            "http" | "https" => {
                log::debug!("GET {parsed}");
                self.fetch_http(parsed).await
            }
            "file" => {
                let path = parsed
                    .to_file_path()
                    .map_err(|_| FetchError::InvalidUrl(url.to_string()))?;
                tokio::fs::read(&path)
                    .await
                    .map_err(|source| FetchError::Io { path, source })
            }
            _ => Err(FetchError::InvalidUrl(url.to_string())),
        }
    }
}
