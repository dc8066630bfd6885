use crate::error::LexError;
use crate::token::{lookup_keyword, Span, Token, TokenKind};

pub struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    column: usize,
    pub errors: Vec<LexError>,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Lexer {
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
            errors: Vec::new(),
        }
    }

    pub fn tokenize(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let tok = self.next_token();
            let is_eof = tok.kind == TokenKind::Eof;
            tokens.push(tok);
            if is_eof {
                break;
            }
        }
        tokens
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += 1;
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.advance();
                }
                Some('/') if self.peek_at(1) == Some('/') => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                _ => break,
            }
        }
    }

    fn make_span(&self, start_pos: usize, start_line: usize, start_col: usize) -> Span {
        Span::new(start_line, start_col, start_pos, self.pos)
    }

    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace_and_comments();

        let start_pos = self.pos;
        let start_line = self.line;
        let start_col = self.column;

        let Some(ch) = self.peek() else {
            return Token::new(TokenKind::Eof, self.make_span(start_pos, start_line, start_col), "");
        };

        if ch.is_ascii_digit() {
            return self.lex_number(start_pos, start_line, start_col);
        }
        if ch.is_alphabetic() || ch == '_' {
            return self.lex_identifier(start_pos, start_line, start_col);
        }
        if ch == '"' {
            return self.lex_string(start_pos, start_line, start_col);
        }

        self.advance();
        let (kind, lexeme): (TokenKind, &str) = match ch {
            '=' => {
                if self.peek() == Some('=') {
                    self.advance();
                    (TokenKind::Eq, "==")
                } else {
                    (TokenKind::Assign, "=")
                }
            }
            '!' => {
                if self.peek() == Some('=') {
                    self.advance();
                    (TokenKind::NotEq, "!=")
                } else {
                    (TokenKind::Bang, "!")
                }
            }
            '+' => (TokenKind::Plus, "+"),
            '-' => (TokenKind::Minus, "-"),
            '*' => (TokenKind::Asterisk, "*"),
            '/' => (TokenKind::Slash, "/"),
            '<' => (TokenKind::Lt, "<"),
            '>' => (TokenKind::Gt, ">"),
            ',' => (TokenKind::Comma, ","),
            ';' => (TokenKind::Semicolon, ";"),
            ':' => (TokenKind::Colon, ":"),
            '(' => (TokenKind::LParen, "("),
            ')' => (TokenKind::RParen, ")"),
            '{' => (TokenKind::LBrace, "{"),
            '}' => (TokenKind::RBrace, "}"),
            '[' => (TokenKind::LBracket, "["),
            ']' => (TokenKind::RBracket, "]"),
            other => {
                let mut buf = [0u8; 4];
                let byte = other.encode_utf8(&mut buf).as_bytes()[0];
                return Token::new(
                    TokenKind::Illegal(byte),
                    self.make_span(start_pos, start_line, start_col),
                    other.to_string(),
                );
            }
        };
        Token::new(kind, self.make_span(start_pos, start_line, start_col), lexeme)
    }

    fn lex_number(&mut self, start_pos: usize, start_line: usize, start_col: usize) -> Token {
        let mut raw = String::new();
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                raw.push(c);
                self.advance();
            } else {
                break;
            }
        }
        let span = self.make_span(start_pos, start_line, start_col);
        match raw.parse::<i64>() {
            Ok(n) => Token::new(TokenKind::IntLiteral(n), span, raw),
            Err(_) => {
                self.errors.push(LexError::InvalidNumber { raw: raw.clone(), span });
                Token::new(TokenKind::IntLiteral(0), span, raw)
            }
        }
    }

    fn lex_identifier(&mut self, start_pos: usize, start_line: usize, start_col: usize) -> Token {
        let mut raw = String::new();
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                raw.push(c);
                self.advance();
            } else {
                break;
            }
        }
        let span = self.make_span(start_pos, start_line, start_col);
        let kind = lookup_keyword(&raw).unwrap_or_else(|| TokenKind::Identifier(raw.clone()));
        Token::new(kind, span, raw)
    }

    fn lex_string(&mut self, start_pos: usize, start_line: usize, start_col: usize) -> Token {
        self.advance(); // opening quote
        let mut s = String::new();
        loop {
            match self.peek() {
                None => {
                    let span = self.make_span(start_pos, start_line, start_col);
                    self.errors.push(LexError::UnterminatedString { span });
                    return Token::new(TokenKind::StringLiteral(s), span, "");
                }
                Some('"') => {
                    self.advance();
                    break;
                }
                Some('\\') => {
                    self.advance();
                    match self.advance() {
                        Some('n') => s.push('\n'),
                        Some('t') => s.push('\t'),
                        Some('"') => s.push('"'),
                        Some('\\') => s.push('\\'),
                        Some(other) => s.push(other),
                        None => {
                            let span = self.make_span(start_pos, start_line, start_col);
                            self.errors.push(LexError::UnterminatedString { span });
                            break;
                        }
                    }
                }
                Some(c) => {
                    s.push(c);
                    self.advance();
                }
            }
        }
        let span = self.make_span(start_pos, start_line, start_col);
        Token::new(TokenKind::StringLiteral(s.clone()), span, s)
    }
}
