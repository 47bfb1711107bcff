use reyna_lex::TokenKind;

use crate::ast::{BinOp, Expr, Literal, LogicalOp, MatchArm, UnOp};
use crate::Parser;

impl<'a> Parser<'a> {
    pub(crate) fn expression(&mut self) -> Option<Expr> {
        self.assignment()
    }

    /// Assignment is right-associative and only legal when the left-hand
    /// side is a variable, field-get, or index-get expression, which gets
    /// rewritten into the corresponding `*Set` node (§4.2).
    fn assignment(&mut self) -> Option<Expr> {
        let expr = self.or_expr()?;
        if self.match_tok(&TokenKind::Eq) {
            let value = self.assignment()?;
            return Some(match expr {
                Expr::Variable(_) => Expr::Assign { target: Box::new(expr), value: Box::new(value) },
                Expr::Get { object, name } => Expr::Set { object, name, value: Box::new(value) },
                Expr::Index { object, index } => Expr::IndexSet { object, index, value: Box::new(value) },
                _ => {
                    self.error_here("invalid assignment target");
                    expr
                }
            });
        }
        Some(expr)
    }

    fn or_expr(&mut self) -> Option<Expr> {
        let mut expr = self.and_expr()?;
        while self.match_tok(&TokenKind::Or) {
            let right = self.and_expr()?;
            expr = Expr::Logical { op: LogicalOp::Or, left: Box::new(expr), right: Box::new(right) };
        }
        Some(expr)
    }

    fn and_expr(&mut self) -> Option<Expr> {
        let mut expr = self.equality()?;
        while self.match_tok(&TokenKind::And) {
            let right = self.equality()?;
            expr = Expr::Logical { op: LogicalOp::And, left: Box::new(expr), right: Box::new(right) };
        }
        Some(expr)
    }

    fn equality(&mut self) -> Option<Expr> {
        let mut expr = self.comparison()?;
        loop {
            let op = if self.match_tok(&TokenKind::EqEq) {
                BinOp::Eq
            } else if self.match_tok(&TokenKind::BangEq) {
                BinOp::NotEq
            } else {
                break;
            };
            let right = self.comparison()?;
            expr = Expr::Binary { op, left: Box::new(expr), right: Box::new(right) };
        }
        Some(expr)
    }

    fn comparison(&mut self) -> Option<Expr> {
        let mut expr = self.term()?;
        loop {
            let op = if self.match_tok(&TokenKind::Less) {
                BinOp::Less
            } else if self.match_tok(&TokenKind::LessEq) {
                BinOp::LessEq
            } else if self.match_tok(&TokenKind::Greater) {
                BinOp::Greater
            } else if self.match_tok(&TokenKind::GreaterEq) {
                BinOp::GreaterEq
            } else {
                break;
            };
            let right = self.term()?;
            expr = Expr::Binary { op, left: Box::new(expr), right: Box::new(right) };
        }
        Some(expr)
    }

    fn term(&mut self) -> Option<Expr> {
        let mut expr = self.factor()?;
        loop {
            let op = if self.match_tok(&TokenKind::Plus) {
                BinOp::Add
            } else if self.match_tok(&TokenKind::Minus) {
                BinOp::Sub
            } else {
                break;
            };
            let right = self.factor()?;
            expr = Expr::Binary { op, left: Box::new(expr), right: Box::new(right) };
        }
        Some(expr)
    }

    fn factor(&mut self) -> Option<Expr> {
        let mut expr = self.unary()?;
        loop {
            let op = if self.match_tok(&TokenKind::Star) {
                BinOp::Mul
            } else if self.match_tok(&TokenKind::Slash) {
                BinOp::Div
            } else {
                break;
            };
            let right = self.unary()?;
            expr = Expr::Binary { op, left: Box::new(expr), right: Box::new(right) };
        }
        Some(expr)
    }

    fn unary(&mut self) -> Option<Expr> {
        if self.match_tok(&TokenKind::Bang) {
            let operand = self.unary()?;
            return Some(Expr::Unary { op: UnOp::Not, operand: Box::new(operand) });
        }
        if self.match_tok(&TokenKind::Minus) {
            let operand = self.unary()?;
            return Some(Expr::Unary { op: UnOp::Neg, operand: Box::new(operand) });
        }
        self.call_expr()
    }

    /// Chains `(...)` calls, `.name` field access, and `[expr]` indexing
    /// after any primary expression (§4.2).
    fn call_expr(&mut self) -> Option<Expr> {
        let mut expr = self.primary()?;
        loop {
            if self.match_tok(&TokenKind::LParen) {
                let mut args = Vec::new();
                if !self.check(&TokenKind::RParen) {
                    loop {
                        args.push(self.expression()?);
                        if !self.match_tok(&TokenKind::Comma) {
                            break;
                        }
                    }
                }
                self.consume(&TokenKind::RParen, "expected ')' after arguments");
                expr = Expr::Call { callee: Box::new(expr), args };
            } else if self.match_tok(&TokenKind::Dot) {
                let name = match self.peek().kind {
                    TokenKind::Ident(sym) => {
                        self.advance();
                        sym
                    }
                    _ => {
                        self.error_here("expected property name after '.'");
                        break;
                    }
                };
                expr = Expr::Get { object: Box::new(expr), name };
            } else if self.match_tok(&TokenKind::LBracket) {
                let index = self.expression()?;
                self.consume(&TokenKind::RBracket, "expected ']' after index");
                expr = Expr::Index { object: Box::new(expr), index: Box::new(index) };
            } else {
                break;
            }
        }
        Some(expr)
    }

    fn primary(&mut self) -> Option<Expr> {
        let kind = self.peek().kind.clone();
        match kind {
            TokenKind::False => {
                self.advance();
                Some(Expr::Literal(Literal::Bool(false)))
            }
            TokenKind::True => {
                self.advance();
                Some(Expr::Literal(Literal::Bool(true)))
            }
            TokenKind::Nil => {
                self.advance();
                Some(Expr::Literal(Literal::Nil))
            }
            TokenKind::Integer(n) => {
                self.advance();
                Some(Expr::Literal(Literal::Integer(n)))
            }
            TokenKind::Float(n) => {
                self.advance();
                Some(Expr::Literal(Literal::Float(n)))
            }
            TokenKind::Str(sym) => {
                self.advance();
                Some(Expr::Literal(Literal::Str(sym)))
            }
            TokenKind::This => {
                self.advance();
                Some(Expr::This)
            }
            TokenKind::Super => {
                self.advance();
                self.consume(&TokenKind::Dot, "expected '.' after 'super'");
                let method = match self.peek().kind {
                    TokenKind::Ident(sym) => {
                        self.advance();
                        sym
                    }
                    _ => {
                        self.error_here("expected superclass method name");
                        return None;
                    }
                };
                Some(Expr::SuperGet { method })
            }
            TokenKind::Ident(sym) => {
                self.advance();
                Some(Expr::Variable(sym))
            }
            TokenKind::LParen => {
                self.advance();
                let expr = self.expression()?;
                self.consume(&TokenKind::RParen, "expected ')' after expression");
                Some(Expr::Grouping(Box::new(expr)))
            }
            TokenKind::LBracket => {
                self.advance();
                let mut elements = Vec::new();
                if !self.check(&TokenKind::RBracket) {
                    loop {
                        elements.push(self.expression()?);
                        if !self.match_tok(&TokenKind::Comma) {
                            break;
                        }
                    }
                }
                self.consume(&TokenKind::RBracket, "expected ']' after array literal");
                Some(Expr::ArrayLiteral(elements))
            }
            TokenKind::Match => {
                self.advance();
                self.match_expr()
            }
            TokenKind::Await => {
                self.advance();
                let inner = self.unary()?;
                Some(Expr::Await(Box::new(inner)))
            }
            _ => {
                self.error_here("expected an expression");
                None
            }
        }
    }

    /// `match subject { pattern [if guard] => body , ... }`. A block arm
    /// keeps its statements as-is; an expression arm is a single
    /// `Stmt::Expr` whose value is the arm's result (§4.2).
    fn match_expr(&mut self) -> Option<Expr> {
        let subject = self.expression()?;
        self.consume(&TokenKind::LBrace, "expected '{' after match subject");
        let mut arms = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.check(&TokenKind::Eof) {
            let pattern = self.expression()?;
            let guard = if self.match_tok(&TokenKind::If) { Some(self.expression()?) } else { None };
            self.consume(&TokenKind::FatArrow, "expected '=>' after match pattern");
            let body = if self.match_tok(&TokenKind::LBrace) {
                self.block_contents()
            } else {
                let value = self.expression()?;
                vec![crate::ast::Stmt::Expr(value)]
            };
            arms.push(MatchArm { pattern, guard, body });
            if !self.match_tok(&TokenKind::Comma) {
                break;
            }
        }
        self.consume(&TokenKind::RBrace, "expected '}' after match arms");
        Some(Expr::Match { subject: Box::new(subject), arms })
    }
}
