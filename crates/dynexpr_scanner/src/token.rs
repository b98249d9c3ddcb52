//! Token types produced by the scanner.

use dynexpr_core::text::TextPos;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Unknown,
    End,
    Identifier,
    StringLiteral,
    IntegerLiteral,
    RealLiteral,
    Exclamation,
    Percent,
    Ampersand,
    OpenParen,
    CloseParen,
    Asterisk,
    Plus,
    Comma,
    Minus,
    Dot,
    Slash,
    Colon,
    LessThan,
    Equal,
    GreaterThan,
    Question,
    OpenBracket,
    CloseBracket,
    Bar,
    ExclamationEqual,
    DoubleAmpersand,
    LessThanEqual,
    LessGreater,
    DoubleEqual,
    GreaterThanEqual,
    DoubleBar,
}

/// A scanned token: its kind, raw source text, and starting offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub pos: TextPos,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, pos: TextPos) -> Self {
        Self {
            kind,
            text: text.into(),
            pos,
        }
    }

    /// Whether this is an identifier spelled `word`, ignoring case.
    #[inline]
    pub fn is_identifier(&self, word: &str) -> bool {
        self.kind == TokenKind::Identifier && self.text.eq_ignore_ascii_case(word)
    }
}
