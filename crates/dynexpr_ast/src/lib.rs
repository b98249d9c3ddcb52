//! dynexpr_ast: The typed expression tree.
//!
//! Every node carries its static [`Type`](dynexpr_types::Type) and is
//! immutable once built. Nodes are shared through `Arc`, so a parsed tree
//! can be read from many threads at once.

pub mod node;
pub mod printer;

pub use node::*;
