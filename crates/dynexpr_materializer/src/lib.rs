//! dynexpr_materializer: Turns decoded JSON into typed record values.
//!
//! A JSON object becomes an instance of the record type synthesized for its
//! shape. Each key contributes one property, in the order the keys appear,
//! and each scalar leaf is inferred as `Double`, then `Guid`, then `String`
//! from its printed text. The inverse direction, [`to_json`], renders any
//! runtime value back to JSON.

mod coerce;
mod json;
mod materializer;

pub use coerce::{coerce_leaf, leaf_text, parse_double, parse_guid};
pub use json::to_json;
pub use materializer::Materializer;

use dynexpr_types::FactoryError;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MaterializeError {
    #[error("Expected a JSON object, found {0}")]
    NotAnObject(&'static str),
    #[error(transparent)]
    Record(#[from] FactoryError),
}
