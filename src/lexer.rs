//! Lexer for PSL.
//!
//! Converts source text into a stream of [`Token`]s. The lexer is total:
//! unrecognized characters are dropped and scanning continues, so every
//! input produces a token stream ending in [`TokenKind::Eof`].

use crate::token::{Token, TokenKind};

/// Unit suffixes recognized on numeric literals. A number immediately
/// followed by one of these keeps the suffix in its literal; anything else
/// after the digits is left for the next token.
const UNITS: [&str; 15] = [
    "px", "vw", "vh", "%", "em", "rem", "vmin", "vmax", "cm", "mm", "in", "pt", "pc", "s", "ms",
];

pub struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    col: usize,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            col: 1,
        }
    }

    pub fn tokenize(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();

        loop {
            self.skip_whitespace_and_comments();

            if self.is_at_end() {
                tokens.push(Token {
                    kind: TokenKind::Eof,
                    line: self.line,
                    col: self.col,
                });
                break;
            }

            let ch = self.peek();
            let token = match ch {
                '{' => self.single_char(TokenKind::LBrace),
                '}' => self.single_char(TokenKind::RBrace),
                '(' => self.single_char(TokenKind::LParen),
                ')' => self.single_char(TokenKind::RParen),
                '[' => self.single_char(TokenKind::LBracket),
                ']' => self.single_char(TokenKind::RBracket),
                ':' => self.single_char(TokenKind::Colon),
                ';' => self.single_char(TokenKind::Semicolon),
                ',' => self.single_char(TokenKind::Comma),
                '.' => self.single_char(TokenKind::Dot),
                '#' => self.single_char(TokenKind::Hash),
                '@' => self.single_char(TokenKind::At),
                '?' => self.single_char(TokenKind::Question),
                '+' => self.single_char(TokenKind::Plus),
                '-' => self.single_char(TokenKind::Minus),
                '*' => self.single_char(TokenKind::Star),
                '/' => self.single_char(TokenKind::Slash),
                '%' => self.single_char(TokenKind::Percent),
                '=' if self.peek_next() == Some('=') => self.two_char(TokenKind::EqEq),
                '=' => self.single_char(TokenKind::Assign),
                '!' if self.peek_next() == Some('=') => self.two_char(TokenKind::NotEq),
                '!' => self.single_char(TokenKind::Bang),
                '<' if self.peek_next() == Some('=') => self.two_char(TokenKind::LtEq),
                '<' => self.single_char(TokenKind::Lt),
                '>' if self.peek_next() == Some('=') => self.two_char(TokenKind::GtEq),
                '>' => self.single_char(TokenKind::Gt),
                '"' | '\'' => self.lex_string(),
                '0'..='9' => self.lex_number(),
                'a'..='z' | 'A'..='Z' | '_' => self.lex_ident(),
                _ => {
                    // Unknown character: drop it and keep scanning.
                    self.advance();
                    continue;
                }
            };

            tokens.push(token);
        }

        tokens
    }

    fn peek(&self) -> char {
        self.chars[self.pos]
    }

    fn peek_next(&self) -> Option<char> {
        self.chars.get(self.pos + 1).copied()
    }

    fn advance(&mut self) -> char {
        let ch = self.chars[self.pos];
        self.pos += 1;
        if ch == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        ch
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            while !self.is_at_end() && self.peek().is_whitespace() {
                self.advance();
            }
            if self.is_at_end() || self.peek() != '/' {
                return;
            }
            match self.peek_next() {
                Some('/') => {
                    while !self.is_at_end() && self.peek() != '\n' {
                        self.advance();
                    }
                }
                Some('*') => {
                    self.advance();
                    self.advance();
                    // An unterminated block comment consumes to end of input.
                    while !self.is_at_end() {
                        if self.peek() == '*' && self.peek_next() == Some('/') {
                            self.advance();
                            self.advance();
                            break;
                        }
                        self.advance();
                    }
                }
                _ => return,
            }
        }
    }

    fn single_char(&mut self, kind: TokenKind) -> Token {
        let line = self.line;
        let col = self.col;
        self.advance();
        Token { kind, line, col }
    }

    fn two_char(&mut self, kind: TokenKind) -> Token {
        let line = self.line;
        let col = self.col;
        self.advance();
        self.advance();
        Token { kind, line, col }
    }

    fn lex_string(&mut self) -> Token {
        let line = self.line;
        let col = self.col;
        let quote = self.advance();
        let mut s = String::new();
        while !self.is_at_end() && self.peek() != quote {
            let ch = self.advance();
            if ch == '\\' && !self.is_at_end() {
                let escaped = self.advance();
                match escaped {
                    'n' => s.push('\n'),
                    't' => s.push('\t'),
                    other => s.push(other),
                }
            } else {
                s.push(ch);
            }
        }
        if !self.is_at_end() {
            self.advance(); // closing quote
        }
        Token {
            kind: TokenKind::Str(s),
            line,
            col,
        }
    }

    fn lex_number(&mut self) -> Token {
        let line = self.line;
        let col = self.col;
        let mut s = String::new();

        while !self.is_at_end() && (self.peek().is_ascii_digit() || self.peek() == '.') {
            s.push(self.advance());
        }

        // A recognized unit suffix joins the literal; anything else after the
        // digits is not consumed (it lexes as its own token).
        if let Some(unit) = self.match_unit() {
            for _ in 0..unit.len() {
                self.advance();
            }
            s.push_str(unit);
        }

        Token {
            kind: TokenKind::Number(s),
            line,
            col,
        }
    }

    /// Match a unit suffix at the cursor. The suffix must cover the entire
    /// run of identifier characters that follows, so `10px` is one number
    /// but `10pxx` is the number `10` followed by the identifier `pxx`.
    fn match_unit(&self) -> Option<&'static str> {
        if self.is_at_end() {
            return None;
        }
        if self.peek() == '%' {
            return Some("%");
        }
        let mut run = String::new();
        let mut i = self.pos;
        while i < self.chars.len() && (self.chars[i].is_ascii_alphanumeric() || self.chars[i] == '_')
        {
            run.push(self.chars[i]);
            i += 1;
        }
        UNITS.iter().find(|u| **u == run).copied()
    }

    fn lex_ident(&mut self) -> Token {
        let line = self.line;
        let col = self.col;
        let mut s = String::new();
        while !self.is_at_end() && (self.peek().is_ascii_alphanumeric() || self.peek() == '_') {
            s.push(self.advance());
        }
        Token {
            kind: TokenKind::Ident(s),
            line,
            col,
        }
    }
}
