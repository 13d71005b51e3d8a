use std::fmt;

use anyhow::{Context, Result, anyhow, bail};
use novelgate_lib::{ArtifactKind, ChapterId, ExtensionId};
use url::Url;

/// Identifies an artifact in its cache
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ArtifactKey {
    Extension(ExtensionId),
    Library(String),
    Chapter(ChapterId),
}

impl fmt::Display for ArtifactKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Extension(id) => write!(f, "extension {id}"),
            Self::Library(name) => write!(f, "library {name}"),
            Self::Chapter(id) => write!(f, "chapter {id}"),
        }
    }
}

/// A single artifact to fetch, as given on the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Target {
    pub(crate) key: ArtifactKey,
    pub(crate) url: Url,
}

impl Target {
    /// Parse `KEY=URL` or a bare `URL`.
    ///
    /// `position` is the 1-based position of the target on the command
    /// line, used as id for bare URLs of numeric kinds. Bare library URLs are
    /// keyed by their last path segment alone, so `https://a.test/s.js` and
    /// `https://b.test/s.js` name the same library.
    pub(crate) fn parse(kind: ArtifactKind, position: usize, raw: &str) -> Result<Self> {
        let raw = raw.trim();
        let (key, url) = match raw.split_once('=') {
            // `=` inside a URL query is not a key separator
            Some((key, url)) if !key.contains(['/', ':']) => (Some(key.trim()), url.trim()),
            _ => (None, raw),
        };

        let url = Url::parse(url).with_context(|| format!("Invalid URL `{url}`"))?;
        let key = match (kind, key) {
            (ArtifactKind::Extension, Some(id)) => ArtifactKey::Extension(
                id.parse()
                    .with_context(|| format!("Invalid extension id `{id}`"))?,
            ),
            (ArtifactKind::Chapter, Some(id)) => ArtifactKey::Chapter(
                id.parse()
                    .with_context(|| format!("Invalid chapter id `{id}`"))?,
            ),
            (ArtifactKind::Library, Some("")) => bail!("Empty library name in `{raw}`"),
            (ArtifactKind::Library, Some(name)) => ArtifactKey::Library(name.to_string()),
            (ArtifactKind::Extension, None) => {
                ArtifactKey::Extension(ExtensionId(position_id(position)?))
            }
            (ArtifactKind::Chapter, None) => ArtifactKey::Chapter(ChapterId(position_id(position)?)),
            (ArtifactKind::Library, None) => ArtifactKey::Library(
                last_segment(&url).ok_or_else(|| anyhow!("Cannot derive a library name from `{url}`"))?,
            ),
        };

        Ok(Self { key, url })
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.key, self.url)
    }
}

fn position_id(position: usize) -> Result<i32> {
    i32::try_from(position).context("Too many targets")
}

fn last_segment(url: &Url) -> Option<String> {
    url.path_segments()?
        .rev()
        .find(|segment| !segment.is_empty())
        .map(ToString::to_string)
}
