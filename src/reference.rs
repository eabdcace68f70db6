//! `$ref` resolution.
//!
//! A reference is a file path relative to the directory of the document that
//! contains it, optionally followed by `#` and a JSON pointer into that file.
//! A bare `#/…` fragment points into the containing document. Remote URIs are
//! not fetched.
//!
//! Loaded documents are cached by canonical path. The loader also tracks the
//! chain of references currently being expanded so a schema that refers back
//! into itself fails with an error instead of recursing forever.
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use tracing::debug;

use crate::error::{GenerateError, Result};
use crate::schema::{Document, SchemaNode};

/// A resolved reference: the document it lands in plus the pointer inside it.
#[derive(Debug, Clone)]
pub struct Target {
    reference: String,
    doc: Rc<Document>,
    pointer: String,
}

impl Target {
    /// The referenced schema node, reported under `key`.
    pub fn node<'a>(&'a self, key: &'a str) -> Result<SchemaNode<'a>> {
        let value = self
            .doc
            .root()
            .pointer(&self.pointer)
            .ok_or_else(|| GenerateError::reference(&self.reference, format!("pointer \"{}\" not found", self.pointer)))?;
        SchemaNode::new(&self.doc, value, key)
            .ok_or_else(|| GenerateError::reference(&self.reference, "target is not an object schema"))
    }

    fn identity(&self) -> (PathBuf, String) {
        (self.doc.path().to_path_buf(), self.pointer.clone())
    }
}

#[derive(Debug, Default)]
pub struct ReferenceLoader {
    cache: HashMap<PathBuf, Rc<Document>>,
    active: Vec<(PathBuf, String)>,
}

impl ReferenceLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make an already-parsed document available to same-document references.
    pub fn insert(&mut self, doc: Rc<Document>) {
        self.cache.insert(doc.path().to_path_buf(), doc);
    }

    pub fn loaded(&self) -> usize {
        self.cache.len()
    }

    /// Resolve `reference` as written inside `from`.
    pub fn resolve(&mut self, from: &Document, reference: &str) -> Result<Target> {
        if reference.contains("://") {
            return Err(GenerateError::reference(reference, "remote references are not supported"));
        }
        let (file, pointer) = match reference.split_once('#') {
            Some((file, pointer)) => (file, pointer),
            None => (reference, ""),
        };
        if !pointer.is_empty() && !pointer.starts_with('/') {
            return Err(GenerateError::reference(reference, "fragment must be a JSON pointer"));
        }
        let doc = if file.is_empty() {
            self.cached(from.path())
                .ok_or_else(|| GenerateError::reference(reference, "containing document is not loaded"))?
        } else {
            self.load(&from.dir().join(file))?
        };
        Ok(Target {
            reference: reference.to_string(),
            doc,
            pointer: pointer.to_string(),
        })
    }

    /// Mark `target` as being expanded. Fails if it already is.
    pub fn enter(&mut self, target: &Target) -> Result<()> {
        let identity = target.identity();
        if self.active.contains(&identity) {
            let chain: Vec<String> = self
                .active
                .iter()
                .skip_while(|entry| **entry != identity)
                .map(|(path, pointer)| format!("{}#{pointer}", path.display()))
                .collect();
            return Err(GenerateError::reference(
                &target.reference,
                format!("cyclic reference through {}", chain.join(" → ")),
            ));
        }
        self.active.push(identity);
        Ok(())
    }

    pub fn leave(&mut self, target: &Target) {
        let identity = target.identity();
        if let Some(pos) = self.active.iter().rposition(|entry| *entry == identity) {
            self.active.remove(pos);
        }
    }

    fn cached(&self, path: &Path) -> Option<Rc<Document>> {
        self.cache.get(path).cloned()
    }

    fn load(&mut self, path: &Path) -> Result<Rc<Document>> {
        let canonical = std::fs::canonicalize(path).map_err(|e| GenerateError::io(path, e))?;
        if let Some(doc) = self.cached(&canonical) {
            return Ok(doc);
        }
        debug!(path = %canonical.display(), "loading referenced schema");
        let doc = Rc::new(Document::load(&canonical)?);
        self.cache.insert(canonical, Rc::clone(&doc));
        Ok(doc)
    }
}
