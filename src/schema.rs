//! Read-only views over JSON Schema documents.
//!
//! A [`SchemaNode`] is one JSON object inside a [`Document`]. It knows the
//! document it came from so `$ref`s can be resolved against the right
//! directory, and the property key it was reached through so errors can name
//! the offending property.
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::error::{GenerateError, Result};
use crate::path_de;

// ————————————————————————————————————————————————————————————————————————————
// DOCUMENTS
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug)]
pub struct Document {
    path: PathBuf,
    root: Value,
}

impl Document {
    pub fn new(path: impl Into<PathBuf>, root: Value) -> Self {
        Self { path: path.into(), root }
    }

    /// Read and parse a JSON document from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let root = path_de::read_with_path::<Value>(path)?;
        Ok(Self::new(path, root))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory that relative `$ref`s inside this document resolve against.
    pub fn dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new(""))
    }

    pub fn root(&self) -> &Value {
        &self.root
    }

    /// View the root as a schema node; fails when the root is not an object.
    pub fn root_node(&self) -> Option<SchemaNode<'_>> {
        SchemaNode::new(self, &self.root, "<root>")
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TYPE KEYWORD
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaType {
    Object,
    Array,
    Number,
    Integer,
    String,
}

impl SchemaType {
    pub fn parse(keyword: &str) -> Option<Self> {
        match keyword {
            "object" => Some(Self::Object),
            "array" => Some(Self::Array),
            "number" => Some(Self::Number),
            "integer" => Some(Self::Integer),
            "string" => Some(Self::String),
            _ => None,
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// NODES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, Copy)]
pub struct SchemaNode<'a> {
    doc: &'a Document,
    map: &'a Map<String, Value>,
    key: &'a str,
}

impl<'a> SchemaNode<'a> {
    /// `None` when `value` is not a JSON object.
    pub fn new(doc: &'a Document, value: &'a Value, key: &'a str) -> Option<Self> {
        value.as_object().map(|map| Self { doc, map, key })
    }

    pub fn document(&self) -> &'a Document {
        self.doc
    }

    /// The property key this node was reached through.
    pub fn key(&self) -> &'a str {
        self.key
    }

    pub fn facet(&self, name: &str) -> Option<&'a Value> {
        self.map.get(name)
    }

    pub fn has(&self, name: &str) -> bool {
        self.map.contains_key(name)
    }

    /// A string facet; an empty string counts as absent.
    pub fn str_facet(&self, name: &'static str) -> Result<Option<&'a str>> {
        match self.facet(name) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) if s.is_empty() => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.as_str())),
            Some(other) => Err(self.invalid(name, format!("expected a string, found {other}"))),
        }
    }

    pub fn title(&self) -> Result<Option<&'a str>> {
        self.str_facet("title")
    }

    pub fn format(&self) -> Result<Option<&'a str>> {
        self.str_facet("format")
    }

    pub fn reference(&self) -> Result<Option<&'a str>> {
        self.str_facet("$ref")
    }

    pub fn schema_uri(&self) -> Result<Option<&'a str>> {
        self.str_facet("$schema")
    }

    /// The `type` keyword, if present.
    pub fn ty(&self) -> Result<Option<SchemaType>> {
        match self.facet("type") {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) if s.is_empty() => Ok(None),
            Some(Value::String(s)) => SchemaType::parse(s).map(Some).ok_or_else(|| {
                GenerateError::UnsupportedType {
                    property: self.key.to_string(),
                    ty: format!("\"{s}\""),
                }
            }),
            Some(other) => Err(GenerateError::UnsupportedType {
                property: self.key.to_string(),
                ty: other.to_string(),
            }),
        }
    }

    /// Declared properties in document order.
    pub fn properties(&self) -> Result<Vec<SchemaNode<'a>>> {
        let Some(value) = self.facet("properties") else {
            return Ok(Vec::new());
        };
        let Some(map) = value.as_object() else {
            return Err(self.invalid("properties", "expected an object"));
        };
        map.iter()
            .map(|(key, value)| {
                SchemaNode::new(self.doc, value, key.as_str()).ok_or_else(|| {
                    GenerateError::InvalidFacet {
                        property: key.clone(),
                        facet: "properties",
                        message: "property schema must be an object".to_string(),
                    }
                })
            })
            .collect()
    }

    /// The `required` list, as raw property names.
    pub fn required(&self) -> Result<Vec<&'a str>> {
        match self.facet("required") {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::Array(xs)) => xs
                .iter()
                .map(|x| {
                    x.as_str()
                        .ok_or_else(|| self.invalid("required", format!("expected strings, found {x}")))
                })
                .collect(),
            Some(_) => Err(self.invalid("required", "expected an array")),
        }
    }

    /// The `items` node of an array schema.
    pub fn items(&self) -> Result<Option<SchemaNode<'a>>> {
        match self.facet("items") {
            None | Some(Value::Null) => Ok(None),
            Some(value) => SchemaNode::new(self.doc, value, self.key)
                .map(Some)
                .ok_or_else(|| self.invalid("items", "expected an object")),
        }
    }

    /// A number facet (`minimum`, `multipleOf`, …).
    pub fn number_facet(&self, name: &'static str) -> Result<Option<f64>> {
        match self.facet(name) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Number(n)) => n
                .as_f64()
                .map(Some)
                .ok_or_else(|| self.invalid(name, format!("{n} is not representable"))),
            Some(other) => Err(self.invalid(name, format!("expected a number, found {other}"))),
        }
    }

    /// A non-negative integer facet (`minLength`, `maxItems`, …).
    pub fn count_facet(&self, name: &'static str) -> Result<Option<u64>> {
        match self.facet(name) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Number(n)) => {
                if let Some(u) = n.as_u64() {
                    return Ok(Some(u));
                }
                match n.as_f64() {
                    Some(f) if f >= 0.0 && f.fract() == 0.0 && f <= u64::MAX as f64 => Ok(Some(f as u64)),
                    _ => Err(self.invalid(name, format!("expected a non-negative integer, found {n}"))),
                }
            }
            Some(other) => Err(self.invalid(name, format!("expected a non-negative integer, found {other}"))),
        }
    }

    pub fn invalid(&self, facet: &'static str, message: impl Into<String>) -> GenerateError {
        GenerateError::InvalidFacet {
            property: self.key.to_string(),
            facet,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        Document::new("/schemas/pet.json", value)
    }

    #[test]
    fn properties_keep_document_order() {
        let d = doc(json!({
            "properties": {
                "zeta": {"type": "string"},
                "alpha": {"type": "integer"},
                "mid": {"type": "number"}
            }
        }));
        let root = d.root_node().unwrap();
        let keys: Vec<_> = root.properties().unwrap().iter().map(|p| p.key()).collect();
        assert_eq!(keys, ["zeta", "alpha", "mid"]);
    }

    #[test]
    fn type_keyword() {
        let d = doc(json!({"type": "integer"}));
        assert_eq!(d.root_node().unwrap().ty().unwrap(), Some(SchemaType::Integer));

        let d = doc(json!({"type": ""}));
        assert_eq!(d.root_node().unwrap().ty().unwrap(), None);

        let d = doc(json!({"type": "boolean"}));
        let err = d.root_node().unwrap().ty().unwrap_err();
        assert!(matches!(err, GenerateError::UnsupportedType { .. }));

        let d = doc(json!({"type": ["string", "null"]}));
        assert!(d.root_node().unwrap().ty().is_err());
    }

    #[test]
    fn facets_reject_wrong_shapes() {
        let d = doc(json!({"title": 3, "required": "x", "maxLength": -1}));
        let root = d.root_node().unwrap();
        assert!(root.title().is_err());
        assert!(root.required().is_err());
        assert!(root.count_facet("maxLength").is_err());
    }

    #[test]
    fn document_dir_is_parent() {
        let d = doc(json!({}));
        assert_eq!(d.dir(), Path::new("/schemas"));
        assert!(Document::new("x", json!([])).root_node().is_none());
    }
}
