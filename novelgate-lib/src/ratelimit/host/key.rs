use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

use crate::ErrorKind;
use crate::types::Result;

/// A normalized hostname, the unit of pacing for the [`HostGate`].
///
/// Subdomains are distinct hosts: `api.example.com` and `www.example.com`
/// are paced independently.
///
/// # Examples
///
/// ```
/// use novelgate_lib::ratelimit::HostKey;
/// use url::Url;
///
/// let url = Url::parse("https://Novels.Example.com/chapter/12").unwrap();
/// let host = HostKey::try_from(&url).unwrap();
/// assert_eq!(host.as_str(), "novels.example.com");
/// ```
///
/// [`HostGate`]: crate::ratelimit::HostGate
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String")]
pub struct HostKey(String);

impl HostKey {
    /// Get the hostname as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Get the hostname as an owned String
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<&Url> for HostKey {
    type Error = ErrorKind;

    fn try_from(url: &Url) -> Result<Self> {
        let host = url.host_str().ok_or(ErrorKind::InvalidUrlHost)?;
        Ok(HostKey::from(host))
    }
}

impl TryFrom<Url> for HostKey {
    type Error = ErrorKind;

    fn try_from(url: Url) -> Result<Self> {
        HostKey::try_from(&url)
    }
}

impl fmt::Display for HostKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for HostKey {
    fn from(host: String) -> Self {
        HostKey(host.to_lowercase())
    }
}

impl From<&str> for HostKey {
    fn from(host: &str) -> Self {
        HostKey(host.to_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_key_from_url() {
        let url = Url::parse("https://www.royalroad.com/fiction/21220").unwrap();
        let host_key = HostKey::try_from(&url).unwrap();
        assert_eq!(host_key.as_str(), "www.royalroad.com");
    }

    #[test]
    fn test_host_key_normalization() {
        let url = Url::parse("https://NOVELFULL.COM/index.html").unwrap();
        let host_key = HostKey::try_from(&url).unwrap();
        assert_eq!(host_key.as_str(), "novelfull.com");
    }

    #[test]
    fn test_host_key_subdomain_separation() {
        let api = HostKey::try_from(Url::parse("https://api.example.com/").unwrap()).unwrap();
        let www = HostKey::try_from(Url::parse("https://www.example.com/").unwrap()).unwrap();
        assert_ne!(api, www);
    }

    #[test]
    fn test_host_key_no_host() {
        let url = Url::parse("file:///tmp/chapter.html").unwrap();
        assert_eq!(HostKey::try_from(&url), Err(ErrorKind::InvalidUrlHost));
    }

    #[test]
    fn test_host_key_hash_equality() {
        use std::collections::HashMap;

        let mut map = HashMap::new();
        map.insert(HostKey::from("example.com"), "value");
        assert_eq!(map.get(&HostKey::from("EXAMPLE.COM")), Some(&"value"));
    }

    #[test]
    fn test_host_key_deserialize_normalizes() {
        let key: HostKey = serde_json::from_str("\"Example.COM\"").unwrap();
        assert_eq!(key.as_str(), "example.com");
        assert_eq!(format!("{key}"), "example.com");
    }
}
