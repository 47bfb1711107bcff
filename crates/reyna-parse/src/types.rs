use reyna_lex::TokenKind;

use crate::ast::TypeName;
use crate::Parser;

impl<'a> Parser<'a> {
    /// Parses a type annotation (after the `:` in a `let`/parameter, or
    /// the `->` on a function).
    pub(crate) fn parse_type(&mut self) -> Option<TypeName> {
        let ty = match &self.peek().kind {
            TokenKind::Int64 => TypeName::Int64,
            TokenKind::Float64 => TypeName::Float64,
            TokenKind::Bool => TypeName::Bool,
            TokenKind::StringTy => TypeName::String,
            TokenKind::Fn => TypeName::Fn,
            TokenKind::Ident(sym) => TypeName::Named(*sym),
            _ => {
                self.error_here("expected a type name");
                return None;
            }
        };
        self.advance();
        Some(ty)
    }
}
