use reyna_util::{Handler, Interner, Span};

use crate::token::{Token, TokenKind};

/// Scans a source string into tokens on demand. Whitespace is skipped
/// silently; `\n` advances the line counter (§4.1). Lexical errors are
/// reported to the [`Handler`] but do not stop scanning - the lexer keeps
/// producing tokens (typically `Invalid`-shaped recovery is unnecessary
/// here since an unterminated string is the only case that truncates a
/// token early, per §4.1).
pub struct Lexer<'a> {
    source: &'a [u8],
    pos: usize,
    line: u32,
    handler: &'a Handler,
    interner: &'a mut Interner,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str, handler: &'a Handler, interner: &'a mut Interner) -> Self {
        Self { source: source.as_bytes(), pos: 0, line: 1, handler, interner }
    }

    /// Scans the whole input to `Eof` inclusive.
    pub fn tokenize(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let tok = self.next_token();
            let is_eof = matches!(tok.kind, TokenKind::Eof);
            tokens.push(tok);
            if is_eof {
                break;
            }
        }
        tokens
    }

    fn peek(&self) -> u8 {
        self.source.get(self.pos).copied().unwrap_or(0)
    }

    fn peek_next(&self) -> u8 {
        self.source.get(self.pos + 1).copied().unwrap_or(0)
    }

    fn at_end(&self) -> bool {
        self.pos >= self.source.len()
    }

    fn advance(&mut self) -> u8 {
        let c = self.peek();
        self.pos += 1;
        if c == b'\n' {
            self.line += 1;
        }
        c
    }

    fn matches(&mut self, expected: u8) -> bool {
        if self.peek() == expected {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            match self.peek() {
                b' ' | b'\t' | b'\r' | b'\n' => {
                    self.advance();
                }
                b'/' if self.peek_next() == b'/' => {
                    while !self.at_end() && self.peek() != b'\n' {
                        self.pos += 1;
                    }
                }
                _ => return,
            }
        }
    }

    fn make(&self, kind: TokenKind, start: usize) -> Token {
        Token::new(kind, Span::new(start as u32, self.pos as u32, self.line))
    }

    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace_and_comments();
        let start = self.pos;
        if self.at_end() {
            return self.make(TokenKind::Eof, start);
        }

        let c = self.advance();
        match c {
            b'(' => self.make(TokenKind::LParen, start),
            b')' => self.make(TokenKind::RParen, start),
            b'{' => self.make(TokenKind::LBrace, start),
            b'}' => self.make(TokenKind::RBrace, start),
            b'[' => self.make(TokenKind::LBracket, start),
            b']' => self.make(TokenKind::RBracket, start),
            b',' => self.make(TokenKind::Comma, start),
            b';' => self.make(TokenKind::Semicolon, start),
            b'.' => self.make(TokenKind::Dot, start),
            b'+' => self.make(TokenKind::Plus, start),
            b'*' => self.make(TokenKind::Star, start),
            b'/' => self.make(TokenKind::Slash, start),
            b':' => {
                if self.matches(b':') {
                    self.make(TokenKind::ColonColon, start)
                } else {
                    self.make(TokenKind::Colon, start)
                }
            }
            b'-' => {
                if self.matches(b'>') {
                    self.make(TokenKind::Arrow, start)
                } else {
                    self.make(TokenKind::Minus, start)
                }
            }
            b'=' => {
                if self.matches(b'=') {
                    self.make(TokenKind::EqEq, start)
                } else if self.matches(b'>') {
                    self.make(TokenKind::FatArrow, start)
                } else {
                    self.make(TokenKind::Eq, start)
                }
            }
            b'!' => {
                if self.matches(b'=') {
                    self.make(TokenKind::BangEq, start)
                } else {
                    self.make(TokenKind::Bang, start)
                }
            }
            b'<' => {
                if self.matches(b'=') {
                    self.make(TokenKind::LessEq, start)
                } else {
                    self.make(TokenKind::Less, start)
                }
            }
            b'>' => {
                if self.matches(b'=') {
                    self.make(TokenKind::GreaterEq, start)
                } else {
                    self.make(TokenKind::Greater, start)
                }
            }
            b'"' => self.string(start),
            c if c.is_ascii_digit() => self.number(start),
            c if c.is_ascii_alphabetic() || c == b'_' => self.identifier(start),
            c => {
                let line = self.line;
                self.handler.error(format!("unexpected character '{}'", c as char), Span::new(start as u32, self.pos as u32, line));
                self.next_token()
            }
        }
    }

    fn string(&mut self, start: usize) -> Token {
        while !self.at_end() && self.peek() != b'"' {
            self.advance();
        }
        if self.at_end() {
            self.handler.error("unterminated string", Span::new(start as u32, self.pos as u32, self.line));
            return self.make(TokenKind::Eof, start);
        }
        // closing quote
        self.advance();
        let text = std::str::from_utf8(&self.source[start + 1..self.pos - 1]).unwrap_or("");
        let sym = self.interner.intern(text);
        self.make(TokenKind::Str(sym), start)
    }

    fn number(&mut self, start: usize) -> Token {
        while self.peek().is_ascii_digit() {
            self.advance();
        }
        if self.peek() == b'.' && self.peek_next().is_ascii_digit() {
            self.advance();
            while self.peek().is_ascii_digit() {
                self.advance();
            }
            let text = std::str::from_utf8(&self.source[start..self.pos]).unwrap_or("0");
            let value: f64 = text.parse().unwrap_or(0.0);
            return self.make(TokenKind::Float(value), start);
        }
        let text = std::str::from_utf8(&self.source[start..self.pos]).unwrap_or("0");
        let value: i64 = text.parse().unwrap_or(0);
        self.make(TokenKind::Integer(value), start)
    }

    fn identifier(&mut self, start: usize) -> Token {
        while {
            let c = self.peek();
            c.is_ascii_alphanumeric() || c == b'_'
        } {
            self.advance();
        }
        let text = std::str::from_utf8(&self.source[start..self.pos]).unwrap_or("");
        let sym = self.interner.intern(text);
        self.make(TokenKind::keyword_or_ident(sym, text), start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(src: &str) -> (Vec<Token>, bool) {
        let handler = Handler::new();
        let mut interner = Interner::new();
        let tokens = Lexer::new(src, &handler, &mut interner).tokenize();
        (tokens, handler.has_errors())
    }

    #[test]
    fn lexes_let_binding() {
        let (tokens, errored) = lex("let x: int64 = 2 + 3;");
        assert!(!errored);
        assert_eq!(tokens.first().unwrap().kind, TokenKind::Let);
        assert!(matches!(tokens.last().unwrap().kind, TokenKind::Eof));
    }

    #[test]
    fn multi_char_operators() {
        let (tokens, _) = lex("-> => == != <= >=");
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind.clone()).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Arrow,
                TokenKind::FatArrow,
                TokenKind::EqEq,
                TokenKind::BangEq,
                TokenKind::LessEq,
                TokenKind::GreaterEq,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn line_comment_is_skipped() {
        let (tokens, _) = lex("let x = 1; // trailing\nlet y = 2;");
        assert!(tokens.iter().any(|t| matches!(t.kind, TokenKind::Let)));
    }

    #[test]
    fn unterminated_string_reports_error() {
        let (_, errored) = lex("\"unterminated");
        assert!(errored);
    }

    #[test]
    fn newline_inside_string_bumps_line_counter() {
        let handler = Handler::new();
        let mut interner = Interner::new();
        let tokens = Lexer::new("\"a\nb\"; true", &handler, &mut interner).tokenize();
        let true_tok = tokens.iter().find(|t| matches!(t.kind, TokenKind::True)).unwrap();
        assert_eq!(true_tok.line(), 2);
    }

    #[test]
    fn float_requires_digit_after_dot() {
        let (tokens, _) = lex("3.14 5.");
        assert_eq!(tokens[0].kind, TokenKind::Float(3.14));
        // "5." - dot not followed by digit, so 5 then Dot
        assert_eq!(tokens[1].kind, TokenKind::Integer(5));
        assert_eq!(tokens[2].kind, TokenKind::Dot);
    }
}
