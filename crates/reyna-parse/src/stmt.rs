use reyna_lex::TokenKind;

use crate::ast::Stmt;
use crate::Parser;

impl<'a> Parser<'a> {
    pub(crate) fn statement(&mut self) -> Option<Stmt> {
        if self.match_tok(&TokenKind::LBrace) {
            return Some(Stmt::Block(self.block_contents()));
        }
        if self.match_tok(&TokenKind::If) {
            return self.if_stmt();
        }
        if self.match_tok(&TokenKind::While) {
            return self.while_stmt();
        }
        if self.match_tok(&TokenKind::For) {
            return self.for_stmt();
        }
        if self.match_tok(&TokenKind::Return) {
            return self.return_stmt();
        }
        if self.match_tok(&TokenKind::Print) {
            return self.print_stmt();
        }
        if self.match_tok(&TokenKind::Try) {
            return self.try_stmt();
        }
        if self.match_tok(&TokenKind::Throw) {
            return self.throw_stmt();
        }
        self.expr_stmt()
    }

    /// Consumes statements up to (and including) the matching `}`. The
    /// opening `{` must already have been consumed by the caller.
    pub(crate) fn block_contents(&mut self) -> Vec<Stmt> {
        let mut stmts = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.check(&TokenKind::Eof) {
            match self.declaration() {
                Some(stmt) => stmts.push(stmt),
                None => self.synchronize(),
            }
        }
        self.consume(&TokenKind::RBrace, "expected '}' to close block");
        stmts
    }

    /// Parses a condition, allowing but not requiring parentheses
    /// (`if cond { }` and `if (cond) { }` both work, per §4.2).
    fn condition(&mut self) -> Option<crate::Expr> {
        let parenthesized = self.match_tok(&TokenKind::LParen);
        let cond = self.expression()?;
        if parenthesized {
            self.consume(&TokenKind::RParen, "expected ')' after condition");
        }
        Some(cond)
    }

    fn if_stmt(&mut self) -> Option<Stmt> {
        let cond = self.condition()?;
        self.consume(&TokenKind::LBrace, "expected '{' after if condition");
        let then_branch = self.block_contents();
        let else_branch = if self.match_tok(&TokenKind::Else) {
            if self.match_tok(&TokenKind::If) {
                Some(vec![self.if_stmt()?])
            } else {
                self.consume(&TokenKind::LBrace, "expected '{' after else");
                Some(self.block_contents())
            }
        } else {
            None
        };
        Some(Stmt::If { cond, then_branch, else_branch })
    }

    fn while_stmt(&mut self) -> Option<Stmt> {
        let cond = self.condition()?;
        self.consume(&TokenKind::LBrace, "expected '{' after while condition");
        let body = self.block_contents();
        Some(Stmt::While { cond, body })
    }

    /// Desugars `for (init; cond; step) body` into
    /// `{ init; while (cond) { body; step; } }` at parse time (§4.2).
    fn for_stmt(&mut self) -> Option<Stmt> {
        self.consume(&TokenKind::LParen, "expected '(' after 'for'");

        let init = if self.match_tok(&TokenKind::Semicolon) {
            None
        } else if self.match_tok(&TokenKind::Let) {
            self.let_decl()
        } else {
            self.expr_stmt()
        };

        let cond = if self.check(&TokenKind::Semicolon) {
            crate::Expr::Literal(crate::ast::Literal::Bool(true))
        } else {
            self.expression()?
        };
        self.consume(&TokenKind::Semicolon, "expected ';' after loop condition");

        let step = if self.check(&TokenKind::RParen) { None } else { Some(self.expression()?) };
        self.consume(&TokenKind::RParen, "expected ')' after for clauses");

        self.consume(&TokenKind::LBrace, "expected '{' before for body");
        let mut body = self.block_contents();
        if let Some(step) = step {
            body.push(Stmt::Expr(step));
        }
        let while_loop = Stmt::While { cond, body };

        let mut outer = Vec::new();
        if let Some(init) = init {
            outer.push(init);
        }
        outer.push(while_loop);
        Some(Stmt::Block(outer))
    }

    fn return_stmt(&mut self) -> Option<Stmt> {
        let value = if self.check(&TokenKind::Semicolon) { None } else { Some(self.expression()?) };
        self.consume(&TokenKind::Semicolon, "expected ';' after return value");
        Some(Stmt::Return(value))
    }

    fn print_stmt(&mut self) -> Option<Stmt> {
        let value = self.expression()?;
        self.consume(&TokenKind::Semicolon, "expected ';' after value");
        Some(Stmt::Print(value))
    }

    fn throw_stmt(&mut self) -> Option<Stmt> {
        let value = self.expression()?;
        self.consume(&TokenKind::Semicolon, "expected ';' after throw value");
        Some(Stmt::Throw(value))
    }

    fn try_stmt(&mut self) -> Option<Stmt> {
        self.consume(&TokenKind::LBrace, "expected '{' after 'try'");
        let body = self.block_contents();
        self.consume(&TokenKind::Catch, "expected 'catch' after try block");
        self.consume(&TokenKind::LParen, "expected '(' after 'catch'");
        let catch_name = match self.peek().kind {
            TokenKind::Ident(sym) => {
                self.advance();
                sym
            }
            _ => {
                self.error_here("expected exception variable name");
                return None;
            }
        };
        self.consume(&TokenKind::RParen, "expected ')' after catch variable");
        self.consume(&TokenKind::LBrace, "expected '{' after catch clause");
        let catch_body = self.block_contents();
        let finally_body = if self.match_tok(&TokenKind::Finally) {
            self.consume(&TokenKind::LBrace, "expected '{' after 'finally'");
            Some(self.block_contents())
        } else {
            None
        };
        Some(Stmt::Try { body, catch_name, catch_body, finally_body })
    }

    fn expr_stmt(&mut self) -> Option<Stmt> {
        let expr = self.expression()?;
        self.consume(&TokenKind::Semicolon, "expected ';' after expression");
        Some(Stmt::Expr(expr))
    }
}
