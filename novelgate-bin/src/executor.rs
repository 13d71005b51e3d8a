use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use novelgate_lib::fetch::RequestExecutor;
use novelgate_lib::ratelimit::{HostGate, HostKey, retry_after};
use novelgate_lib::{AdmissionCancelled, ErrorKind};
use http::StatusCode;
use thiserror::Error;
use url::Url;

/// Everything that can go wrong while fetching a single target
#[derive(Debug, Error)]
pub(crate) enum FetchFailure {
    /// Connection, TLS, timeout or body errors
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The server answered with a non-success status code
    #[error("{url} responded with {status}")]
    Status { url: Url, status: StatusCode },

    /// The target URL has no host to pace
    #[error(transparent)]
    MissingHost(#[from] ErrorKind),

    /// The host did not admit the request within `--max-wait`
    #[error(transparent)]
    Cancelled(#[from] AdmissionCancelled),

    /// A library was fetched but is not valid UTF-8 text
    #[error("Library source is not valid UTF-8: {0}")]
    NotText(#[from] std::string::FromUtf8Error),
}

impl FetchFailure {
    pub(crate) const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled(_))
    }
}

/// Performs plain `GET` requests.
///
/// `429 Too Many Requests` and `503 Service Unavailable` answers carrying a
/// `Retry-After` header pause the host in the shared gate.
#[derive(Debug)]
pub(crate) struct HttpExecutor {
    client: reqwest::Client,
    gate: Arc<HostGate>,
}

impl HttpExecutor {
    pub(crate) const fn new(client: reqwest::Client, gate: Arc<HostGate>) -> Self {
        Self { client, gate }
    }
}

#[async_trait]
impl RequestExecutor for HttpExecutor {
    type Request = Url;
    type Output = Bytes;
    type Error = FetchFailure;

    fn host(&self, url: &Url) -> Result<HostKey, FetchFailure> {
        Ok(HostKey::try_from(url)?)
    }

    async fn execute(&self, host: &HostKey, url: &Url) -> Result<Bytes, FetchFailure> {
        log::debug!("Fetching {url}");
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();

        if matches!(
            status,
            StatusCode::TOO_MANY_REQUESTS | StatusCode::SERVICE_UNAVAILABLE
        ) && let Some(delay) = retry_after(response.headers())
        {
            self.gate.cool_down(host, delay);
        }

        if !status.is_success() {
            return Err(FetchFailure::Status {
                url: url.clone(),
                status,
            });
        }

        Ok(response.bytes().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn executor(gate: &Arc<HostGate>) -> HttpExecutor {
        HttpExecutor::new(reqwest::Client::new(), gate.clone())
    }

    #[tokio::test]
    async fn test_successful_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/chapter/1"))
            .respond_with(ResponseTemplate::new(200).set_body_string("Once upon a time"))
            .mount(&server)
            .await;

        let gate = Arc::new(HostGate::default());
        let executor = executor(&gate);
        let url = Url::parse(&format!("{}/chapter/1", server.uri())).unwrap();
        let host = executor.host(&url).unwrap();

        let body = executor.execute(&host, &url).await.unwrap();
        assert_eq!(body, Bytes::from_static(b"Once upon a time"));
    }

    #[tokio::test]
    async fn test_rate_limited_host_cools_down() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "30"))
            .mount(&server)
            .await;

        let gate = Arc::new(HostGate::with_min_spacing(Duration::from_millis(10)));
        let executor = executor(&gate);
        let url = Url::parse(&server.uri()).unwrap();
        let host = executor.host(&url).unwrap();

        let error = executor.execute(&host, &url).await.unwrap_err();

        assert!(matches!(
            error,
            FetchFailure::Status {
                status: StatusCode::TOO_MANY_REQUESTS,
                ..
            }
        ));
        assert_eq!(gate.host_stats(&host).cooldowns, 1);
    }

    #[tokio::test]
    async fn test_not_found_does_not_cool_down() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).insert_header("Retry-After", "30"))
            .mount(&server)
            .await;

        let gate = Arc::new(HostGate::default());
        let executor = executor(&gate);
        let url = Url::parse(&server.uri()).unwrap();
        let host = executor.host(&url).unwrap();

        assert!(executor.execute(&host, &url).await.is_err());
        assert_eq!(gate.host_stats(&host).cooldowns, 0);
    }

    #[test]
    fn test_missing_host() {
        let gate = Arc::new(HostGate::default());
        let url = Url::parse("data:text/plain,hello").unwrap();

        assert!(matches!(
            executor(&gate).host(&url),
            Err(FetchFailure::MissingHost(ErrorKind::InvalidUrlHost))
        ));
    }
}
