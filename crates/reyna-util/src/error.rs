//! Error types owned by `reyna-util` itself (as opposed to the per-phase
//! errors each downstream crate defines for its own failures).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceMapError {
    #[error("unknown source file: index {index}")]
    UnknownFile { index: usize },
}
