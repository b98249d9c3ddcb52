//! Character classification used by the scanner.

use unicode_xid::UnicodeXID;

pub const DOUBLE_QUOTE: char = '"';
pub const SINGLE_QUOTE: char = '\'';
pub const AT: char = '@';
pub const UNDERSCORE: char = '_';

#[inline]
pub fn is_digit(ch: char) -> bool {
    ch.is_ascii_digit()
}

#[inline]
pub fn is_identifier_start(ch: char) -> bool {
    ch == AT || ch == UNDERSCORE || ch.is_xid_start()
}

#[inline]
pub fn is_identifier_part(ch: char) -> bool {
    ch == UNDERSCORE || ch.is_xid_continue()
}

#[inline]
pub fn is_quote(ch: char) -> bool {
    ch == DOUBLE_QUOTE || ch == SINGLE_QUOTE
}
