//! reyna-util - shared foundation types for the Reyna pipeline.
//!
//! Every later stage (lexer, parser, type checker, compiler, VM) reports
//! locations with [`Span`], names interned strings through [`Symbol`], and
//! reports recoverable errors through the [`diagnostic`] module's
//! [`Handler`]. Each stage additionally defines its own `thiserror` error
//! type for the errors that abort its phase outright (see [`error`]).

pub mod diagnostic;
pub mod error;
pub mod span;
pub mod symbol;

pub use diagnostic::{Diagnostic, DiagnosticBuilder, Handler, Level};
pub use span::{FileId, SourceMap, Span};
pub use symbol::{Interner, Symbol};
