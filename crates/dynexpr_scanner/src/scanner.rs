//! The expression scanner.

use crate::char_codes::*;
use crate::token::{Token, TokenKind};
use dynexpr_core::text::TextPos;
use dynexpr_diagnostics::{messages, ParseError};

/// Converts expression text into tokens, one call to [`Scanner::scan`] at a
/// time.
pub struct Scanner {
    /// The source text being scanned.
    text: Vec<char>,
    /// Current position in the text.
    pos: usize,
    /// Start of the current token.
    token_start: usize,
}

impl Scanner {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.chars().collect(),
            pos: 0,
            token_start: 0,
        }
    }

    #[inline]
    fn is_eof(&self) -> bool {
        self.pos >= self.text.len()
    }

    #[inline]
    fn current(&self) -> Option<char> {
        self.text.get(self.pos).copied()
    }

    #[inline]
    fn current_is(&self, ch: char) -> bool {
        self.current() == Some(ch)
    }

    fn error(&self, template: &dynexpr_diagnostics::DiagnosticMessage, args: &[&str]) -> ParseError {
        ParseError::new(template, self.pos as TextPos, args)
    }

    fn token(&self, kind: TokenKind) -> Token {
        let text: String = self.text[self.token_start..self.pos].iter().collect();
        Token::new(kind, text, self.token_start as TextPos)
    }

    /// Scan the next token. At the end of the text this returns
    /// [`TokenKind::End`] on every call.
    pub fn scan(&mut self) -> Result<Token, ParseError> {
        while self.current().map_or(false, char::is_whitespace) {
            self.pos += 1;
        }
        self.token_start = self.pos;

        let ch = match self.current() {
            Some(ch) => ch,
            None => return Ok(self.token(TokenKind::End)),
        };

        let kind = match ch {
            '!' => self.scan_pair('=', TokenKind::Exclamation, TokenKind::ExclamationEqual),
            '%' => self.single(TokenKind::Percent),
            '&' => self.scan_pair('&', TokenKind::Ampersand, TokenKind::DoubleAmpersand),
            '(' => self.single(TokenKind::OpenParen),
            ')' => self.single(TokenKind::CloseParen),
            '*' => self.single(TokenKind::Asterisk),
            '+' => self.single(TokenKind::Plus),
            ',' => self.single(TokenKind::Comma),
            '-' => self.single(TokenKind::Minus),
            '.' => self.single(TokenKind::Dot),
            '/' => self.single(TokenKind::Slash),
            ':' => self.single(TokenKind::Colon),
            '<' => {
                self.pos += 1;
                match self.current() {
                    Some('=') => {
                        self.pos += 1;
                        TokenKind::LessThanEqual
                    }
                    Some('>') => {
                        self.pos += 1;
                        TokenKind::LessGreater
                    }
                    _ => TokenKind::LessThan,
                }
            }
            '=' => self.scan_pair('=', TokenKind::Equal, TokenKind::DoubleEqual),
            '>' => self.scan_pair('=', TokenKind::GreaterThan, TokenKind::GreaterThanEqual),
            '?' => self.single(TokenKind::Question),
            '[' => self.single(TokenKind::OpenBracket),
            ']' => self.single(TokenKind::CloseBracket),
            '|' => self.scan_pair('|', TokenKind::Bar, TokenKind::DoubleBar),
            c if is_quote(c) => self.scan_string(c)?,
            c if is_identifier_start(c) => self.scan_identifier(),
            c if is_digit(c) => self.scan_number()?,
            c => return Err(self.error(&messages::INVALID_CHARACTER, &[&c.to_string()])),
        };
        Ok(self.token(kind))
    }

    #[inline]
    fn single(&mut self, kind: TokenKind) -> TokenKind {
        self.pos += 1;
        kind
    }

    /// One-character operator that becomes a two-character operator when
    /// followed by `next`.
    fn scan_pair(&mut self, next: char, one: TokenKind, two: TokenKind) -> TokenKind {
        self.pos += 1;
        if self.current_is(next) {
            self.pos += 1;
            two
        } else {
            one
        }
    }

    /// A doubled quote inside the literal continues it.
    fn scan_string(&mut self, quote: char) -> Result<TokenKind, ParseError> {
        loop {
            self.pos += 1;
            while !self.is_eof() && !self.current_is(quote) {
                self.pos += 1;
            }
            if self.is_eof() {
                return Err(self.error(&messages::UNTERMINATED_STRING_LITERAL, &[]));
            }
            self.pos += 1;
            if !self.current_is(quote) {
                return Ok(TokenKind::StringLiteral);
            }
        }
    }

    fn scan_identifier(&mut self) -> TokenKind {
        self.pos += 1;
        while self.current().map_or(false, is_identifier_part) {
            self.pos += 1;
        }
        TokenKind::Identifier
    }

    fn scan_digits(&mut self) {
        while self.current().map_or(false, is_digit) {
            self.pos += 1;
        }
    }

    fn expect_digit(&self) -> Result<(), ParseError> {
        if self.current().map_or(false, is_digit) {
            Ok(())
        } else {
            Err(self.error(&messages::DIGIT_EXPECTED, &[]))
        }
    }

    fn scan_number(&mut self) -> Result<TokenKind, ParseError> {
        let mut kind = TokenKind::IntegerLiteral;
        self.scan_digits();
        if self.current_is('.') {
            kind = TokenKind::RealLiteral;
            self.pos += 1;
            self.expect_digit()?;
            self.scan_digits();
        }
        if matches!(self.current(), Some('e' | 'E')) {
            kind = TokenKind::RealLiteral;
            self.pos += 1;
            if matches!(self.current(), Some('+' | '-')) {
                self.pos += 1;
            }
            self.expect_digit()?;
            self.scan_digits();
        }
        // A float suffix makes any numeric literal a real literal.
        if matches!(self.current(), Some('f' | 'F')) {
            kind = TokenKind::RealLiteral;
            self.pos += 1;
        }
        Ok(kind)
    }
}
