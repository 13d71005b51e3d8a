use std::io;

use http::StatusCode;

use crate::executor::FetchFailure;

/// An extension trait to help determine if a failed fetch is worth another
/// attempt.
///
/// Retried requests wait for admission like any other request, so no extra
/// delay is added here.
pub(crate) trait RetryExt {
    fn should_retry(&self) -> bool;
}

impl RetryExt for StatusCode {
    fn should_retry(&self) -> bool {
        let status = *self;
        status.is_server_error()
            || status == StatusCode::REQUEST_TIMEOUT
            || status == StatusCode::TOO_MANY_REQUESTS
    }
}

impl RetryExt for reqwest::Error {
    #[allow(clippy::if_same_then_else)]
    fn should_retry(&self) -> bool {
        if self.is_timeout() {
            true
        } else if self.is_connect() {
            false
        } else if self.is_body() || self.is_decode() || self.is_builder() || self.is_redirect() {
            false
        } else if self.is_request() {
            get_source_error_type::<io::Error>(self).is_some_and(should_retry_io)
        } else if let Some(status) = self.status() {
            status.should_retry()
        } else {
            false
        }
    }
}

impl RetryExt for FetchFailure {
    #[allow(clippy::match_same_arms)]
    fn should_retry(&self) -> bool {
        match self {
            Self::Network(e) => e.should_retry(),
            Self::Status { status, .. } => status.should_retry(),
            Self::MissingHost(_) => false,
            // The wait bound is already used up
            Self::Cancelled(_) => false,
            Self::NotText(_) => false,
        }
    }
}

/// Classifies an `io::Error` into retryable or not.
fn should_retry_io(error: &io::Error) -> bool {
    matches!(
        error.kind(),
        io::ErrorKind::ConnectionReset | io::ErrorKind::ConnectionAborted | io::ErrorKind::TimedOut
    )
}

/// Downcasts the given err source into T.
fn get_source_error_type<T: std::error::Error + 'static>(
    err: &dyn std::error::Error,
) -> Option<&T> {
    let mut source = err.source();

    while let Some(err) = source {
        if let Some(found) = err.downcast_ref::<T>() {
            return Some(found);
        }
        source = err.source();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use novelgate_lib::AdmissionCancelled;
    use novelgate_lib::ratelimit::HostKey;
    use rstest::rstest;
    use url::Url;

    #[rstest]
    #[case(StatusCode::OK, false)]
    #[case(StatusCode::NOT_FOUND, false)]
    #[case(StatusCode::FORBIDDEN, false)]
    #[case(StatusCode::REQUEST_TIMEOUT, true)]
    #[case(StatusCode::TOO_MANY_REQUESTS, true)]
    #[case(StatusCode::INTERNAL_SERVER_ERROR, true)]
    #[case(StatusCode::SERVICE_UNAVAILABLE, true)]
    fn test_should_retry_status(#[case] status: StatusCode, #[case] expected: bool) {
        assert_eq!(status.should_retry(), expected);
        let failure = FetchFailure::Status {
            url: Url::parse("https://novels.test/1").unwrap(),
            status,
        };
        assert_eq!(failure.should_retry(), expected);
    }

    #[test]
    fn test_cancelled_is_final() {
        let failure = FetchFailure::from(AdmissionCancelled {
            host: HostKey::from("novels.test"),
        });
        assert!(!failure.should_retry());
        assert!(failure.is_cancelled());
    }

    #[test]
    fn test_io_errors() {
        assert!(should_retry_io(&io::Error::from(
            io::ErrorKind::ConnectionReset
        )));
        assert!(!should_retry_io(&io::Error::from(io::ErrorKind::NotFound)));
    }

    #[test]
    fn test_source_error_type() {
        #[derive(Debug, thiserror::Error)]
        #[error("wrapper")]
        struct Wrapper(#[source] io::Error);

        let error = Wrapper(io::Error::from(io::ErrorKind::TimedOut));
        let found = get_source_error_type::<io::Error>(&error).unwrap();
        assert_eq!(found.kind(), io::ErrorKind::TimedOut);
    }
}
