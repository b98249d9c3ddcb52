//! dynexpr_options: Engine configuration.
//!
//! Options are read from a JSON file whose keys are the camelCase field
//! names. Missing keys take their defaults.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default bound on expression nesting depth.
pub const DEFAULT_MAX_NESTING_DEPTH: u32 = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct EngineOptions {
    /// Parser recursion bound.
    pub max_nesting_depth: u32,
    /// Upper bound on distinct synthesized record types. `None` is
    /// unbounded; the cache never evicts.
    pub max_record_types: Option<usize>,
    /// Whether scalar array elements go through leaf inference.
    pub coerce_array_elements: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            max_nesting_depth: DEFAULT_MAX_NESTING_DEPTH,
            max_record_types: None,
            coerce_array_elements: true,
        }
    }
}

/// Values given on the command line, applied over a loaded file.
#[derive(Debug, Clone, Default)]
pub struct OptionOverrides {
    pub max_nesting_depth: Option<u32>,
    pub max_record_types: Option<usize>,
    pub coerce_array_elements: Option<bool>,
}

impl EngineOptions {
    pub fn with_overrides(mut self, overrides: &OptionOverrides) -> Self {
        if let Some(depth) = overrides.max_nesting_depth {
            self.max_nesting_depth = depth;
        }
        if let Some(limit) = overrides.max_record_types {
            self.max_record_types = Some(limit);
        }
        if let Some(coerce) = overrides.coerce_array_elements {
            self.coerce_array_elements = coerce;
        }
        self
    }
}

#[derive(Debug, thiserror::Error)]
pub enum OptionsError {
    #[error("Cannot read options file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid options: {0}")]
    Json(#[from] serde_json::Error),
}

/// Parse options from JSON text.
pub fn parse_options(content: &str) -> Result<EngineOptions, OptionsError> {
    Ok(serde_json::from_str(content)?)
}

/// Parse options from a JSON file.
pub fn parse_options_file(path: impl AsRef<Path>) -> Result<EngineOptions, OptionsError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|source| OptionsError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_options(&content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = parse_options("{}").unwrap();
        assert_eq!(options, EngineOptions::default());
        assert_eq!(options.max_nesting_depth, 100);
        assert!(options.coerce_array_elements);
    }

    #[test]
    fn test_camel_case_keys() {
        let options = parse_options(r#"{"maxNestingDepth": 20, "maxRecordTypes": 8, "coerceArrayElements": false}"#)
            .unwrap();
        assert_eq!(options.max_nesting_depth, 20);
        assert_eq!(options.max_record_types, Some(8));
        assert!(!options.coerce_array_elements);
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        assert!(matches!(parse_options(r#"{"maxDepth": 3}"#), Err(OptionsError::Json(_))));
    }

    #[test]
    fn test_overrides_win() {
        let options = parse_options(r#"{"maxNestingDepth": 20}"#).unwrap().with_overrides(&OptionOverrides {
            max_nesting_depth: Some(5),
            ..Default::default()
        });
        assert_eq!(options.max_nesting_depth, 5);
        assert_eq!(options.max_record_types, None);
    }

    #[test]
    fn test_missing_file() {
        let err = parse_options_file("/nonexistent/dynexpr.json").unwrap_err();
        assert!(matches!(err, OptionsError::Io { .. }));
    }
}
