use anyhow::Result;
use reqwest::{Client, Response, StatusCode};
use url::Url;

// ─── Error types ────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: Url },
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

// ─── Client ─────────────────────────────────────────────────────────────────

/// Fetches published schedule files. Anonymous, text only.
#[derive(Debug, Clone)]
pub struct AssetClient {
    client: Client,
}

impl AssetClient {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("class-schedule/", env!("CARGO_PKG_VERSION")))
            .timeout(std::time::Duration::from_secs(15))
            .build()?;
        Ok(Self { client })
    }

    pub async fn fetch_text(&self, url: &Url) -> Result<String, FetchError> {
        let resp = self.client.get(url.clone()).send().await?;
        let resp = Self::check_status(resp)?;
        Ok(resp.text().await?)
    }

    fn check_status(resp: Response) -> Result<Response, FetchError> {
        match resp.status() {
            s if s.is_client_error() || s.is_server_error() || s == StatusCode::NO_CONTENT => {
                Err(FetchError::Status {
                    status: s.as_u16(),
                    url: resp.url().clone(),
                })
            }
            _ => Ok(resp),
        }
    }
}
