//! Operator precedence for binary operators.

use dynexpr_scanner::{Token, TokenKind};

/// Binary precedence levels, lowest first. The conditional operator sits
/// below all of them and is parsed separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum OperatorPrecedence {
    Lowest = 0,
    LogicalOr = 1,
    LogicalAnd = 2,
    Comparison = 3,
    Additive = 4,
    Multiplicative = 5,
    Invalid = 255,
}

impl OperatorPrecedence {
    /// The level binding one step tighter; operands of a left-associative
    /// operator are parsed at this level.
    pub fn tighter(self) -> OperatorPrecedence {
        match self {
            OperatorPrecedence::Lowest => OperatorPrecedence::LogicalOr,
            OperatorPrecedence::LogicalOr => OperatorPrecedence::LogicalAnd,
            OperatorPrecedence::LogicalAnd => OperatorPrecedence::Comparison,
            OperatorPrecedence::Comparison => OperatorPrecedence::Additive,
            OperatorPrecedence::Additive => OperatorPrecedence::Multiplicative,
            OperatorPrecedence::Multiplicative | OperatorPrecedence::Invalid => OperatorPrecedence::Invalid,
        }
    }
}

/// Get the binary operator precedence for a token. The word operators
/// `or`, `and` and `mod` are identifiers.
pub fn binary_precedence(token: &Token) -> OperatorPrecedence {
    match token.kind {
        TokenKind::DoubleBar => OperatorPrecedence::LogicalOr,
        TokenKind::DoubleAmpersand => OperatorPrecedence::LogicalAnd,
        TokenKind::Equal
        | TokenKind::DoubleEqual
        | TokenKind::ExclamationEqual
        | TokenKind::LessGreater
        | TokenKind::LessThan
        | TokenKind::LessThanEqual
        | TokenKind::GreaterThan
        | TokenKind::GreaterThanEqual => OperatorPrecedence::Comparison,
        TokenKind::Plus | TokenKind::Minus | TokenKind::Ampersand => OperatorPrecedence::Additive,
        TokenKind::Asterisk | TokenKind::Slash | TokenKind::Percent => OperatorPrecedence::Multiplicative,
        TokenKind::Identifier if token.is_identifier("or") => OperatorPrecedence::LogicalOr,
        TokenKind::Identifier if token.is_identifier("and") => OperatorPrecedence::LogicalAnd,
        TokenKind::Identifier if token.is_identifier("mod") => OperatorPrecedence::Multiplicative,
        _ => OperatorPrecedence::Invalid,
    }
}
