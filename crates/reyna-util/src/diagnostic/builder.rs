use super::{Diagnostic, Level};
use crate::span::Span;

/// Fluent construction of a [`Diagnostic`] before handing it to a
/// [`super::Handler`]. Mirrors the teacher's builder API, trimmed to the
/// fields Reyna's diagnostics actually use (no diagnostic-code catalog -
/// Reyna has four error kinds total, §7, not a stable per-error code
/// space worth cataloguing).
pub struct DiagnosticBuilder {
    level: Level,
    message: String,
    span: Span,
}

impl DiagnosticBuilder {
    pub fn error(message: impl Into<String>) -> Self {
        Self { level: Level::Error, message: message.into(), span: Span::DUMMY }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self { level: Level::Warning, message: message.into(), span: Span::DUMMY }
    }

    pub fn span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn build(self) -> Diagnostic {
        Diagnostic { level: self.level, message: self.message, span: self.span }
    }
}
