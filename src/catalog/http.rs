//! HTTP catalog fetcher.

use crate::catalog::fetcher::{parse_catalog, CatalogFetcher};
use crate::domain::error::{DirectoryError, Result};
use crate::domain::RawEntry;
use async_trait::async_trait;
use std::time::Duration;
use tracing::Instrument;

/// Fetches the catalog with a single GET request.
///
/// Transport errors, non-success statuses, the request timeout and body
/// decoding errors all surface as [`DirectoryError::FetchFailed`].
#[derive(Debug, Clone)]
pub struct HttpCatalogFetcher {
    client: reqwest::Client,
    url: String,
}

impl HttpCatalogFetcher {
    /// Builds a fetcher for `url` with the given request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::Config`] if the HTTP client cannot be built.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DirectoryError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl CatalogFetcher for HttpCatalogFetcher {
    async fn fetch_all(&self) -> Result<Vec<RawEntry>> {
        let span = tracing::debug_span!("http_fetch_catalog", url = %self.url);
        async {
            let response = self
                .client
                .get(&self.url)
                .send()
                .await
                .and_then(reqwest::Response::error_for_status)
                .map_err(|e| DirectoryError::FetchFailed(e.to_string()))?;

            let body = response
                .bytes()
                .await
                .map_err(|e| DirectoryError::FetchFailed(format!("failed to read body: {e}")))?;

            tracing::debug!(bytes = body.len(), "catalog downloaded");
            parse_catalog(&body)
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorKind;

    #[tokio::test]
    async fn unreachable_host_is_a_fetch_failure() {
        // Nothing listens on port 1.
        let fetcher = HttpCatalogFetcher::new("http://127.0.0.1:1/cities.json", Duration::from_secs(2)).unwrap();
        assert_eq!(fetcher.url(), "http://127.0.0.1:1/cities.json");

        let err = fetcher.fetch_all().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FetchFailed);
    }
}
