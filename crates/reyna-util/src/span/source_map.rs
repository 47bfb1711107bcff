use super::FileId;
use crate::error::SourceMapError;

/// One loaded source file: its path (as given on the command line or
/// import path) and its full text.
pub struct SourceFile {
    pub path: String,
    pub text: String,
}

/// Owns every source file the compiler has read - the top-level script
/// plus every file pulled in by `import` (§4.4). Compiling the same path
/// twice returns the same `FileId` instead of re-reading the file, which
/// is what backs the import-cycle guard in `reyna-compile`.
#[derive(Default)]
pub struct SourceMap {
    files: Vec<SourceFile>,
}

impl SourceMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, path: impl Into<String>, text: impl Into<String>) -> FileId {
        let id = FileId(self.files.len());
        self.files.push(SourceFile { path: path.into(), text: text.into() });
        id
    }

    pub fn get(&self, id: FileId) -> Result<&SourceFile, SourceMapError> {
        self.files.get(id.0).ok_or(SourceMapError::UnknownFile { index: id.0 })
    }

    /// Path of an already-loaded file, for cycle detection (§4.4, §5).
    pub fn path_loaded(&self, path: &str) -> Option<FileId> {
        self.files.iter().position(|f| f.path == path).map(FileId)
    }
}
