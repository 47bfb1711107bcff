//! Source location tracking: byte spans, 1-based line numbers, and a
//! source map for rendering snippets in diagnostics.

mod source_map;

pub use source_map::SourceMap;

/// Identifies a source file within a [`SourceMap`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileId(pub usize);

impl FileId {
    pub const DUMMY: FileId = FileId(usize::MAX);
}

/// A byte range in some source file, plus the 1-based line it starts on
/// (matching §3's "Token ... 1-based line number").
///
/// Reyna's lexer and parser track only the start line, not columns - the
/// language's error reporting (§7) never needed column precision, and
/// adding it would be unused surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Span {
    pub start: u32,
    pub end: u32,
    pub line: u32,
    pub file: Option<FileId>,
}

impl Span {
    pub const DUMMY: Span = Span { start: 0, end: 0, line: 0, file: None };

    pub const fn new(start: u32, end: u32, line: u32) -> Self {
        Self { start, end, line, file: None }
    }

    pub const fn with_file(start: u32, end: u32, line: u32, file: FileId) -> Self {
        Self { start, end, line, file: Some(file) }
    }

    /// The smallest span covering both `self` and `other`.
    pub fn to(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
            line: self.line,
            file: self.file.or(other.file),
        }
    }
}
