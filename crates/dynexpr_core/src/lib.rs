//! dynexpr_core: Core utilities for the dynexpr expression engine.
//!
//! Provides source spans, string interning, and the case-insensitive
//! collections used by the type catalog, the parser's symbol table, and
//! the record type cache.

pub mod collections;
pub mod intern;
pub mod text;

// Re-export commonly used types
pub use collections::CaseInsensitiveMap;
pub use intern::{Name, NameTable};
pub use text::{TextPos, TextSpan};
