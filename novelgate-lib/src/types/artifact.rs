use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier of an installed extension (sometimes called formatter).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExtensionId(pub i32);

/// Identifier of a single chapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChapterId(pub i32);

macro_rules! numeric_id {
    ($($name:ident),*) => {
        $(
            impl fmt::Display for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    write!(f, "{}", self.0)
                }
            }

            impl From<i32> for $name {
                fn from(id: i32) -> Self {
                    Self(id)
                }
            }

            impl FromStr for $name {
                type Err = std::num::ParseIntError;

                fn from_str(s: &str) -> Result<Self, Self::Err> {
                    s.trim().parse().map(Self)
                }
            }
        )*
    };
}

numeric_id!(ExtensionId, ChapterId);

/// The kinds of artifacts held in memory, one cache instance each.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    /// Extension module bytes
    Extension,
    /// Support library source shared between extensions
    Library,
    /// Chapter payload
    #[default]
    Chapter,
}

impl ArtifactKind {
    /// Name used in log messages and statistics
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Extension => "extension",
            Self::Library => "library",
            Self::Chapter => "chapter",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArtifactKind {
    type Err = String;

    fn from_str(kind: &str) -> Result<Self, Self::Err> {
        match kind.to_lowercase().as_str() {
            "extension" | "ext" => Ok(Self::Extension),
            "library" | "lib" => Ok(Self::Library),
            "chapter" => Ok(Self::Chapter),
            other => Err(format!("Unknown artifact kind `{other}`")),
        }
    }
}
