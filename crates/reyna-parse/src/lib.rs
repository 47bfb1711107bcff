//! reyna-parse - recursive-descent parser (§4.2) producing the AST (§3).
//!
//! A single token of lookahead. On error the parser records a diagnostic
//! and *synchronizes*: it discards tokens up to the next `;` or a keyword
//! that starts a declaration, then keeps parsing so later errors in the
//! same file are still reported (§7).

pub mod ast;
mod expr;
mod items;
mod stmt;
mod types;

use reyna_lex::{Token, TokenKind};
use reyna_util::{Handler, Interner};

pub use ast::*;

pub struct Parser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    handler: &'a Handler,
    interner: &'a Interner,
}

/// Keywords that begin a declaration; a synchronizing parser stops
/// discarding tokens once it sees one of these (or a `;`), per §4.2.
const SYNC_KEYWORDS: &[fn(&TokenKind) -> bool] = &[
    |k| matches!(k, TokenKind::Fn),
    |k| matches!(k, TokenKind::Let),
    |k| matches!(k, TokenKind::For),
    |k| matches!(k, TokenKind::If),
    |k| matches!(k, TokenKind::While),
    |k| matches!(k, TokenKind::Return),
    |k| matches!(k, TokenKind::Struct),
];

impl<'a> Parser<'a> {
    pub fn new(tokens: Vec<Token>, handler: &'a Handler, interner: &'a Interner) -> Self {
        Self { tokens, pos: 0, handler, interner }
    }

    /// Parses every top-level declaration until `Eof`.
    pub fn parse_program(&mut self) -> Vec<Stmt> {
        let mut stmts = Vec::new();
        while !self.check(&TokenKind::Eof) {
            match self.declaration() {
                Some(stmt) => stmts.push(stmt),
                None => self.synchronize(),
            }
        }
        stmts
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.pos - 1]
    }

    fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(&self.peek().kind) == std::mem::discriminant(kind)
    }

    fn advance(&mut self) -> &Token {
        if !self.check(&TokenKind::Eof) {
            self.pos += 1;
        }
        self.previous()
    }

    fn match_tok(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn consume(&mut self, kind: &TokenKind, message: &str) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            let span = self.peek().span;
            self.handler.error(message.to_string(), span);
            false
        }
    }

    fn error_here(&self, message: impl Into<String>) {
        let span = self.peek().span;
        self.handler.error(message.into(), span);
    }

    fn synchronize(&mut self) {
        if self.check(&TokenKind::Eof) {
            return;
        }
        self.advance();
        while !self.check(&TokenKind::Eof) {
            if matches!(self.previous().kind, TokenKind::Semicolon) {
                return;
            }
            if SYNC_KEYWORDS.iter().any(|f| f(&self.peek().kind)) {
                return;
            }
            self.advance();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reyna_lex::Lexer;
    use reyna_util::Interner;

    fn parse(src: &str) -> (Vec<Stmt>, bool) {
        let handler = Handler::new();
        let mut interner = Interner::new();
        let tokens = Lexer::new(src, &handler, &mut interner).tokenize();
        let stmts = Parser::new(tokens, &handler, &interner).parse_program();
        (stmts, handler.has_errors())
    }

    #[test]
    fn parses_let_with_arithmetic() {
        let (stmts, errored) = parse("let x: int64 = 2 + 3;");
        assert!(!errored);
        assert_eq!(stmts.len(), 1);
        assert!(matches!(stmts[0], Stmt::Let { .. }));
    }

    #[test]
    fn for_loop_desugars_to_while() {
        let (stmts, errored) = parse("for (let i: int64 = 0; i < 3; i = i + 1) { print i; }");
        assert!(!errored);
        // desugared: { let i...; while (i < 3) { { print i; } i = i + 1; } }
        assert!(matches!(stmts[0], Stmt::Block(_)));
        if let Stmt::Block(inner) = &stmts[0] {
            assert!(matches!(inner[0], Stmt::Let { .. }));
            assert!(matches!(inner[1], Stmt::While { .. }));
        }
    }

    #[test]
    fn parse_error_synchronizes_and_keeps_going() {
        let (stmts, errored) = parse("let = ; let y: int64 = 1;");
        assert!(errored);
        // Second statement still gets parsed despite the first erroring.
        assert!(stmts.iter().any(|s| matches!(s, Stmt::Let { .. })));
    }

    #[test]
    fn assignment_to_field_rewrites_to_set() {
        let (stmts, errored) = parse("a.b = 1;");
        assert!(!errored);
        if let Stmt::Expr(Expr::Set { .. }) = &stmts[0] {
        } else {
            panic!("expected a Set expression, got {:?}", stmts[0]);
        }
    }

    #[test]
    fn call_chains_with_field_and_index() {
        let (stmts, errored) = parse("a.b()[0];");
        assert!(!errored);
        assert!(matches!(&stmts[0], Stmt::Expr(Expr::Index { .. })));
    }

    #[test]
    fn match_expression_parses_guard_and_expression_arm() {
        let (stmts, errored) = parse("let x: int64 = match y { 1 if z => 2, _ => 3 };");
        assert!(!errored);
        if let Stmt::Let { init: Some(Expr::Match { arms, .. }), .. } = &stmts[0] {
            assert_eq!(arms.len(), 2);
            assert!(arms[0].guard.is_some());
        } else {
            panic!("expected a match expression initializer");
        }
    }
}
