use std::path::Path;

use serde::de::DeserializeOwned;

use crate::error::{GenerateError, Result};

/// Deserialize with JSON-path context in error messages.
///
/// `origin` only labels the error.
pub fn from_str_with_path<T: DeserializeOwned>(src: &str, origin: &Path) -> Result<T> {
    let de = &mut serde_json::Deserializer::from_str(src);
    match serde_path_to_error::deserialize::<_, T>(de) {
        Ok(v) => Ok(v),
        Err(err) => {
            let path = err.path().to_string();
            Err(GenerateError::Json {
                path: origin.to_path_buf(),
                message: format!("at JSON path {path} → {}", err.into_inner()),
            })
        }
    }
}

/// Read a file and deserialize it with [`from_str_with_path`].
pub fn read_with_path<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let src = std::fs::read_to_string(path).map_err(|e| GenerateError::io(path, e))?;
    from_str_with_path(&src, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    #[allow(dead_code)]
    struct Entry {
        name: String,
    }

    #[test]
    fn errors_carry_the_json_path() {
        let src = r#"{"a": {"name": 3}}"#;
        let err = from_str_with_path::<indexmap::IndexMap<String, Entry>>(src, Path::new("x.json")).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("x.json"), "{msg}");
        assert!(msg.contains("a.name"), "{msg}");
    }
}
