use crate::options::Config;
use anyhow::{Context, Result};
use http::{HeaderMap, HeaderValue, header};
use std::time::Duration;

/// Creates the HTTP client according to the command-line config
pub(crate) fn create(cfg: &Config) -> Result<reqwest::Client> {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::USER_AGENT,
        HeaderValue::from_str(&cfg.user_agent).context("Invalid User-Agent header")?,
    );

    reqwest::Client::builder()
        .default_headers(headers)
        .timeout(parse_duration_secs(cfg.timeout))
        .gzip(true)
        .build()
        .context("Failed to create request client")
}

#[allow(clippy::cast_possible_truncation)]
const fn parse_duration_secs(secs: usize) -> Duration {
    Duration::from_secs(secs as u64)
}
