//! Handle the `Retry-After` header sent along with 429 and 503 responses.

use http::{HeaderMap, HeaderValue, header::RETRY_AFTER};
use std::time::{Duration, SystemTime};
use thiserror::Error;

/// Errors while reading a `Retry-After` header
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RetryAfterParseError {
    /// Neither delay-seconds nor an HTTP-date
    #[error("Unable to parse value '{0}'")]
    ValueError(String),

    /// Not visible ASCII
    #[error("Header value contains invalid chars")]
    HeaderValueError,
}

/// Parse the "Retry-After" header as specified per
/// [RFC 7231 section 7.1.3](https://www.rfc-editor.org/rfc/rfc7231#section-7.1.3)
///
/// # Errors
///
/// Fails if the value is neither a number of seconds nor an HTTP-date.
pub fn parse_retry_after(value: &HeaderValue) -> Result<Duration, RetryAfterParseError> {
    let value = value
        .to_str()
        .map_err(|_| RetryAfterParseError::HeaderValueError)?
        .trim();

    // RFC 7231: Retry-After = HTTP-date / delay-seconds
    value.parse::<u64>().map(Duration::from_secs).or_else(|_| {
        httpdate::parse_http_date(value)
            .map(|s| {
                s.duration_since(SystemTime::now())
                    // if date is in the past, we can use ZERO
                    .unwrap_or(Duration::ZERO)
            })
            .map_err(|_| RetryAfterParseError::ValueError(value.into()))
    })
}

/// Look up and parse `Retry-After` in a header map.
///
/// Missing or malformed headers yield `None`.
#[must_use]
pub fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    let value = headers.get(RETRY_AFTER)?;
    match parse_retry_after(value) {
        Ok(delay) => Some(delay),
        Err(e) => {
            log::debug!("Ignoring Retry-After header: {e}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use http::{HeaderMap, HeaderValue};

    use super::{RetryAfterParseError, parse_retry_after, retry_after};

    #[test]
    fn test_retry_after() {
        assert_eq!(parse_retry_after(&value("1")), Ok(Duration::from_secs(1)));
        assert_eq!(parse_retry_after(&value(" 3 ")), Ok(Duration::from_secs(3)));
        assert_eq!(
            parse_retry_after(&value("-1")),
            Err(RetryAfterParseError::ValueError("-1".into()))
        );

        assert_eq!(
            parse_retry_after(&value("Fri, 15 May 2015 15:34:21 GMT")),
            Ok(Duration::ZERO)
        );

        let result = parse_retry_after(&value("Fri, 15 May 4099 15:34:21 GMT"));
        let is_in_future = matches!(result, Ok(d) if d.as_secs() > 0);
        assert!(is_in_future);
    }

    #[test]
    fn test_retry_after_from_headers() {
        let mut headers = HeaderMap::new();
        assert_eq!(retry_after(&headers), None);

        headers.insert("retry-after", value("soon"));
        assert_eq!(retry_after(&headers), None);

        headers.insert("Retry-After", value("120"));
        assert_eq!(retry_after(&headers), Some(Duration::from_secs(120)));
    }

    fn value(v: &str) -> HeaderValue {
        HeaderValue::from_str(v).unwrap()
    }
}
