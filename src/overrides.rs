//! Common definitions: names prescribed for known shapes.
//!
//! A schema `dir/pet.json` may sit next to `dir/pet.Common.json`, a JSON
//! object keyed by structural signature:
//!
//! ```json
//! {
//!   "(City(string), Zip(string))": { "name": "PostalAddress", "isValueType": true },
//!   "[lo, hi]": { "name": "Level", "values": ["Low", "High"] }
//! }
//! ```
//!
//! A matching class or enum takes the prescribed name instead of one derived
//! from its title. Every type matching the same signature resolves to a
//! single generated definition.
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::Result;
use crate::ir::TypeRef;
use crate::path_de;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommonDefinition {
    pub name: String,
    #[serde(default)]
    pub is_value_type: bool,
    /// Enum member identifiers, parallel to the raw values.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<String>>,
}

#[derive(Debug, Default)]
pub struct CommonDefinitions {
    entries: IndexMap<String, CommonDefinition>,
    bound: HashMap<String, TypeRef>,
}

impl CommonDefinitions {
    pub fn new(entries: IndexMap<String, CommonDefinition>) -> Self {
        Self {
            entries,
            bound: HashMap::new(),
        }
    }

    /// `dir/stem.json` → `dir/stem.Common.json`.
    pub fn path_for(schema: &Path) -> PathBuf {
        let stem = schema.file_stem().map(|s| s.to_string_lossy()).unwrap_or_default();
        schema.with_file_name(format!("{stem}.Common.json"))
    }

    pub fn parse(src: &str, origin: &Path) -> Result<Self> {
        path_de::from_str_with_path(src, origin).map(Self::new)
    }

    /// Load the common definitions that sit next to `schema`.
    ///
    /// A missing file means no overrides. An unreadable or malformed file is
    /// reported and then ignored.
    pub fn load_for(schema: &Path) -> Self {
        let path = Self::path_for(schema);
        if !path.is_file() {
            return Self::default();
        }
        match path_de::read_with_path(&path) {
            Ok(entries) => {
                let table = Self::new(entries);
                info!(path = %path.display(), count = table.len(), "loaded common definitions");
                table
            }
            Err(error) => {
                warn!(path = %path.display(), %error, "ignoring common definitions");
                Self::default()
            }
        }
    }

    pub fn get(&self, signature: &str) -> Option<&CommonDefinition> {
        self.entries.get(signature)
    }

    /// The definition already generated for `signature`, if any.
    pub fn bound(&self, signature: &str) -> Option<&TypeRef> {
        self.bound.get(signature)
    }

    pub(crate) fn bind(&mut self, signature: &str, ty: TypeRef) {
        self.bound.insert(signature.to_string(), ty);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::ClassId;

    #[test]
    fn common_path_sits_next_to_schema() {
        assert_eq!(
            CommonDefinitions::path_for(Path::new("/a/b/pet.json")),
            Path::new("/a/b/pet.Common.json")
        );
        assert_eq!(CommonDefinitions::path_for(Path::new("pet.json")), Path::new("pet.Common.json"));
    }

    #[test]
    fn parses_entries_with_defaults() {
        let src = r#"{
            "(City(string))": {"name": "Place", "isValueType": true},
            "[a, b]": {"name": "Letters", "values": ["A", "B"]}
        }"#;
        let table = CommonDefinitions::parse(src, Path::new("x.Common.json")).unwrap();
        assert_eq!(table.len(), 2);
        let place = table.get("(City(string))").unwrap();
        assert!(place.is_value_type);
        let letters = table.get("[a, b]").unwrap();
        assert!(!letters.is_value_type);
        assert_eq!(letters.values.as_deref(), Some(&["A".to_string(), "B".to_string()][..]));
    }

    #[test]
    fn malformed_file_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let schema = dir.path().join("pet.json");
        std::fs::write(dir.path().join("pet.Common.json"), r#"{"x": {"nom": 1}}"#).unwrap();
        assert!(CommonDefinitions::load_for(&schema).is_empty());
        assert!(CommonDefinitions::load_for(&dir.path().join("absent.json")).is_empty());
    }

    #[test]
    fn binding_is_remembered() {
        let mut table = CommonDefinitions::default();
        assert!(table.bound("()").is_none());
        table.bind("()", TypeRef::Class(ClassId(3)));
        assert_eq!(table.bound("()"), Some(&TypeRef::Class(ClassId(3))));
    }
}
