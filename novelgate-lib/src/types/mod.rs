mod artifact;
mod error;

pub use artifact::{ArtifactKind, ChapterId, ExtensionId};
pub use error::{AdmissionCancelled, ErrorKind};

/// The `Result` type used throughout `novelgate_lib`
pub type Result<T> = std::result::Result<T, crate::ErrorKind>;
