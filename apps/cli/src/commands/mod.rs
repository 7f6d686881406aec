//! # Commands
//!
//! One module per subcommand. Each exposes a `run`-style function returning
//! [`ApiResult`] plus the pure helpers it is built from, so the helpers can
//! be tested without a terminal.

pub mod clients;
pub mod draft;
pub mod extract;
pub mod import;
pub mod settings;
pub mod totals;
pub mod validate;

use std::path::Path;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::error::{ApiError, ApiResult};

/// Reads a JSON file without interpreting it.
pub fn read_value(path: &Path) -> ApiResult<Value> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| ApiError::invalid_input(format!("Could not read {}: {}", path.display(), e)))?;
    debug!(path = %path.display(), bytes = contents.len(), "Read input file");

    serde_json::from_str(&contents)
        .map_err(|e| ApiError::invalid_input(format!("{} is not valid JSON: {}", path.display(), e)))
}

/// Reads a JSON file into `T`.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> ApiResult<T> {
    let value = read_value(path)?;
    serde_json::from_value(value)
        .map_err(|e| ApiError::invalid_input(format!("{} has an unexpected shape: {}", path.display(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn test_missing_file_is_invalid_input() {
        let err = read_value(Path::new("/nonexistent/billwise/input.json")).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidInput);
        assert!(err.message.starts_with("Could not read"));
    }

    #[test]
    fn test_bad_json_is_invalid_input() {
        let path = std::env::temp_dir().join(format!("billwise-{}.json", uuid::Uuid::new_v4()));
        std::fs::write(&path, "{ not json").unwrap();

        let err = read_value(&path).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidInput);

        let _ = std::fs::remove_file(&path);
    }
}
