// src/ingest/fetch.rs
use async_trait::async_trait;
use metrics::counter;
use reqwest::Client;
use std::collections::HashMap;
use std::sync::Mutex;
use thiserror::Error;

/// Sites serve trimmed or blocked markup to obvious bots.
pub const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("GET {url} returned HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("GET {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

impl FetchError {
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Status { status, .. } => Some(*status),
            FetchError::Transport { source, .. } => source.status().map(|s| s.as_u16()),
        }
    }
}

#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Body text of a 2xx response; anything else is an error.
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// reqwest-backed fetcher. No retries and no timeout override.
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = Client::builder().user_agent(BROWSER_USER_AGENT).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let transport = |source| FetchError::Transport {
            url: url.to_string(),
            source,
        };

        let resp = self.client.get(url).send().await.map_err(|e| {
            counter!("patchnote_fetch_errors_total").increment(1);
            transport(e)
        })?;

        let status = resp.status();
        if !status.is_success() {
            counter!("patchnote_fetch_errors_total").increment(1);
            tracing::warn!(%url, status = status.as_u16(), "fetch returned non-2xx");
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = resp.text().await.map_err(transport)?;
        tracing::debug!(%url, bytes = body.len(), "fetched page");
        Ok(body)
    }
}

// --- Test helper ---

/// In-memory fetcher: canned bodies or status codes per URL, with a call log.
/// Unknown URLs answer 404.
pub struct StaticFetcher {
    pages: HashMap<String, Result<String, u16>>,
    pub calls: Mutex<Vec<String>>,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self {
            pages: HashMap::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_page(mut self, url: &str, body: impl Into<String>) -> Self {
        self.pages.insert(url.to_string(), Ok(body.into()));
        self
    }

    pub fn with_status(mut self, url: &str, status: u16) -> Self {
        self.pages.insert(url.to_string(), Err(status));
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().expect("call log poisoned").len()
    }
}

impl Default for StaticFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PageFetcher for StaticFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        self.calls.lock().expect("call log poisoned").push(url.to_string());
        match self.pages.get(url) {
            Some(Ok(body)) => Ok(body.clone()),
            Some(Err(status)) => Err(FetchError::Status {
                url: url.to_string(),
                status: *status,
            }),
            None => Err(FetchError::Status {
                url: url.to_string(),
                status: 404,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn static_fetcher_serves_pages_and_statuses() {
        let f = StaticFetcher::new()
            .with_page("https://a.test/", "<html></html>")
            .with_status("https://b.test/", 503);

        assert_eq!(f.fetch("https://a.test/").await.unwrap(), "<html></html>");
        let err = f.fetch("https://b.test/").await.unwrap_err();
        assert_eq!(err.status(), Some(503));
        let missing = f.fetch("https://c.test/").await.unwrap_err();
        assert_eq!(missing.status(), Some(404));
        assert_eq!(f.call_count(), 3);
    }
}
