use std::path::PathBuf;

/// Errors the compiler itself can raise, distinct from the type checker's
/// diagnostics: these are I/O failures hit while inlining an `import`
/// (§4.4), not rule violations in the source program.
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error("cannot read imported file {path}: {source}")]
    ImportRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
