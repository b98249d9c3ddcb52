//! dynexpr_scanner: Lexer for expression text.
//!
//! Produces one token at a time on demand, with one token of lookahead and
//! no backtracking. Recognizes:
//! - identifiers, with an optional leading `@`
//! - string and character literals delimited by `"` or `'`
//! - integer and real literals
//! - the operator and punctuation set

mod char_codes;
mod scanner;
mod token;

pub use scanner::Scanner;
pub use token::{Token, TokenKind};
