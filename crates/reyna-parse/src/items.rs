use reyna_lex::TokenKind;
use reyna_util::Symbol;

use crate::ast::{ClassDecl, FunctionDecl, Param, Stmt, StructDecl};
use crate::Parser;

impl<'a> Parser<'a> {
    pub(crate) fn declaration(&mut self) -> Option<Stmt> {
        if self.match_tok(&TokenKind::Import) {
            return self.import_decl();
        }
        if self.check(&TokenKind::Async) || self.check(&TokenKind::Fn) {
            let is_async = self.match_tok(&TokenKind::Async);
            self.consume(&TokenKind::Fn, "expected 'fn'");
            return self.function_decl(is_async).map(Stmt::Function);
        }
        if self.match_tok(&TokenKind::Class) {
            return self.class_decl();
        }
        if self.match_tok(&TokenKind::Struct) {
            return self.struct_decl();
        }
        if self.match_tok(&TokenKind::Let) {
            return self.let_decl();
        }
        self.statement()
    }

    fn ident_name(&mut self, what: &str) -> Option<Symbol> {
        if let TokenKind::Ident(sym) = self.peek().kind {
            self.advance();
            Some(sym)
        } else {
            self.error_here(format!("expected {what}"));
            None
        }
    }

    pub(crate) fn function_decl(&mut self, is_async: bool) -> Option<FunctionDecl> {
        let name = self.ident_name("function name")?;
        self.consume(&TokenKind::LParen, "expected '(' after function name");
        let mut params = Vec::new();
        if !self.check(&TokenKind::RParen) {
            loop {
                let pname = self.ident_name("parameter name")?;
                self.consume(&TokenKind::Colon, "expected ':' after parameter name");
                let ty = self.parse_type()?;
                params.push(Param { name: pname, ty });
                if !self.match_tok(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.consume(&TokenKind::RParen, "expected ')' after parameters");
        let return_ty = if self.match_tok(&TokenKind::Arrow) { self.parse_type() } else { None };
        self.consume(&TokenKind::LBrace, "expected '{' before function body");
        let body = self.block_contents();
        Some(FunctionDecl { name, params, return_ty, body, is_async })
    }

    fn class_decl(&mut self) -> Option<Stmt> {
        let name = self.ident_name("class name")?;
        let superclass = if self.match_tok(&TokenKind::Less) { self.ident_name("superclass name") } else { None };
        self.consume(&TokenKind::LBrace, "expected '{' before class body");
        let mut methods = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.check(&TokenKind::Eof) {
            self.consume(&TokenKind::Fn, "expected method declaration");
            if let Some(method) = self.function_decl(false) {
                methods.push(method);
            }
        }
        self.consume(&TokenKind::RBrace, "expected '}' after class body");
        Some(Stmt::Class(ClassDecl { name, superclass, methods }))
    }

    fn struct_decl(&mut self) -> Option<Stmt> {
        let name = self.ident_name("struct name")?;
        self.consume(&TokenKind::LBrace, "expected '{' before struct body");
        let mut fields = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.check(&TokenKind::Eof) {
            let fname = self.ident_name("field name")?;
            self.consume(&TokenKind::Colon, "expected ':' after field name");
            let ty = self.parse_type()?;
            fields.push((fname, ty));
            if !self.match_tok(&TokenKind::Comma) {
                break;
            }
        }
        self.consume(&TokenKind::RBrace, "expected '}' after struct body");
        Some(Stmt::Struct(StructDecl { name, fields }))
    }

    pub(crate) fn let_decl(&mut self) -> Option<Stmt> {
        let name = self.ident_name("variable name")?;
        let ty = if self.match_tok(&TokenKind::Colon) { self.parse_type() } else { None };
        let init = if self.match_tok(&TokenKind::Eq) { Some(self.expression()?) } else { None };
        self.consume(&TokenKind::Semicolon, "expected ';' after let binding");
        Some(Stmt::Let { name, ty, init })
    }

    /// `import "path";` or `import "path" (name1, name2);` - §4.2 lists
    /// import as "path + optional name list" without a committed surface
    /// syntax; this picks one and documents it here rather than in the
    /// compiler.
    fn import_decl(&mut self) -> Option<Stmt> {
        let path = if let TokenKind::Str(sym) = self.peek().kind {
            self.advance();
            sym
        } else {
            self.error_here("expected a string path after 'import'");
            return None;
        };
        let names = if self.match_tok(&TokenKind::LParen) {
            let mut list = Vec::new();
            if !self.check(&TokenKind::RParen) {
                loop {
                    list.push(self.ident_name("imported name")?);
                    if !self.match_tok(&TokenKind::Comma) {
                        break;
                    }
                }
            }
            self.consume(&TokenKind::RParen, "expected ')' after import list");
            Some(list)
        } else {
            None
        };
        self.consume(&TokenKind::Semicolon, "expected ';' after import");
        Some(Stmt::Import { path: self.interner.resolve(path).to_string(), names })
    }
}
