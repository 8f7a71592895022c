//! Domain-specific errors.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("{} is not valid UTF-8 text", .path.display())]
    NonUtf8File { path: PathBuf },
    #[error("path {path:?} contains a line break and cannot be stored in a start tag")]
    UnencodablePath { path: String },
    #[error("block path {path:?} does not name a file under the output directory")]
    EmptyBlockTarget { path: String },
}
