//! Resource sources for the `fetch` command
//!
//! A source is either an `http(s)://` URL or a local file. A
//! [`SourceFetcher`] turns it into a producer for the bounded-retry loader.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use camino::Utf8PathBuf;
use infinder_core::loader::Producer;
use infinder_core::types::NetworkConfig;
use reqwest::Url;

/// Where a resource comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// Fetched with an HTTP GET
    Http(Url),
    /// Read from the local filesystem
    File(Utf8PathBuf),
}

impl FromStr for Source {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(anyhow!("Source must not be empty"));
        }

        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            let url = Url::parse(trimmed).with_context(|| format!("Invalid URL: {}", trimmed))?;
            return Ok(Source::Http(url));
        }

        let path = trimmed.strip_prefix("file://").unwrap_or(trimmed);
        Ok(Source::File(Utf8PathBuf::from(path)))
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Http(url) => write!(f, "{}", url),
            Source::File(path) => write!(f, "{}", path),
        }
    }
}

/// Fetches one source; cheap to share across attempts
pub struct SourceFetcher {
    source: Source,
    client: reqwest::Client,
}

impl SourceFetcher {
    /// Create a fetcher using the configured timeout and user agent
    pub fn new(source: Source, network: &NetworkConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(&network.user_agent)
            .timeout(Duration::from_secs(network.http_timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { source, client })
    }

    /// The source this fetcher reads
    pub fn source(&self) -> &Source {
        &self.source
    }

    /// Fetch the whole resource once
    pub async fn fetch(&self) -> Result<Vec<u8>> {
        match &self.source {
            Source::Http(url) => {
                tracing::debug!(url = %url, "GET");
                let response = self
                    .client
                    .get(url.clone())
                    .send()
                    .await
                    .with_context(|| format!("Request to {} failed", url))?
                    .error_for_status()
                    .with_context(|| format!("{} returned an error status", url))?;

                let body = response
                    .bytes()
                    .await
                    .with_context(|| format!("Failed to read body from {}", url))?;
                Ok(body.to_vec())
            }
            Source::File(path) => tokio::fs::read(path)
                .await
                .with_context(|| format!("Failed to read {}", path)),
        }
    }

    /// Wrap the fetcher as a loader producer
    pub fn into_producer(self) -> impl Producer<Vec<u8>> {
        let fetcher = Arc::new(self);
        move || {
            let fetcher = Arc::clone(&fetcher);
            async move { fetcher.fetch().await }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_http_source() {
        let source: Source = "https://api.infinder.io/campaigns".parse().unwrap();
        assert!(matches!(source, Source::Http(ref url) if url.path() == "/campaigns"));
    }

    #[test]
    fn test_parse_file_source() {
        let source: Source = "data/influencers.json".parse().unwrap();
        assert_eq!(source, Source::File(Utf8PathBuf::from("data/influencers.json")));

        let source: Source = "file:///tmp/brands.json".parse().unwrap();
        assert_eq!(source, Source::File(Utf8PathBuf::from("/tmp/brands.json")));
    }

    #[test]
    fn test_parse_rejects_empty_and_bad_urls() {
        assert!("   ".parse::<Source>().is_err());
        assert!("http://".parse::<Source>().is_err());
    }

    #[test]
    fn test_display_round_trips_path() {
        let source = Source::File(Utf8PathBuf::from("a/b.txt"));
        assert_eq!(source.to_string(), "a/b.txt");
    }
}
