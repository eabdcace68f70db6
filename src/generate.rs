//! One generation run: schema file in, C# source out.
use std::path::Path;
use std::rc::Rc;

use indexmap::IndexMap;
use tracing::{info, warn};

use crate::codegen::{Codegen, EmitOptions};
use crate::error::{GenerateError, Result};
use crate::ir::{ClassId, ObjectDef};
use crate::lower::Lowering;
use crate::naming::to_definition_name;
use crate::overrides::{CommonDefinition, CommonDefinitions};
use crate::reference::ReferenceLoader;
use crate::registry::{Counts, DuplicateGroup, NamespaceRegistry};
use crate::schema::Document;

const DEFAULT_NAMESPACE: &str = "Default";

/// The finished type graph of one schema.
#[derive(Debug)]
pub struct Model {
    registry: NamespaceRegistry,
    root: ClassId,
    source_name: String,
    default_namespace: String,
}

#[derive(Debug, Clone)]
pub struct Generated {
    pub source: String,
    pub duplicates: Vec<DuplicateGroup>,
    pub counts: Counts,
}

/// Build and render `schema_path` in one go.
pub fn generate(schema_path: &Path, namespace: Option<&str>, options: &EmitOptions) -> Result<Generated> {
    Ok(Model::build(schema_path)?.render(namespace, options))
}

impl Model {
    /// Load a schema, its common definitions and every referenced file.
    pub fn build(schema_path: &Path) -> Result<Self> {
        let path = std::fs::canonicalize(schema_path).map_err(|e| GenerateError::io(schema_path, e))?;
        let doc = Document::load(&path)?;
        let overrides = CommonDefinitions::load_for(&path);
        Self::from_document(doc, overrides)
    }

    /// Build from an already-parsed document.
    ///
    /// The root class falls back to the file stem for its name, and the
    /// namespace falls back to the parent directory name.
    pub fn from_document(doc: Document, overrides: CommonDefinitions) -> Result<Self> {
        let path = doc.path().to_path_buf();
        let source_name = path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let default_namespace = path
            .parent()
            .and_then(Path::file_name)
            .map(|s| to_definition_name(&s.to_string_lossy()))
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_NAMESPACE.to_string());

        let doc = Rc::new(doc);
        let root_node = doc.root_node().ok_or_else(|| GenerateError::UnsupportedType {
            property: source_name.clone(),
            ty: "non-object document".to_string(),
        })?;

        let mut registry = NamespaceRegistry::new(overrides);
        let mut loader = ReferenceLoader::new();
        loader.insert(Rc::clone(&doc));
        let root = Lowering::new(&mut registry, &mut loader).lower_root(root_node, &stem)?;
        info!(schema = %path.display(), documents = loader.loaded(), "schema lowered");
        registry.log_summary();

        Ok(Self {
            registry,
            root,
            source_name,
            default_namespace,
        })
    }

    pub fn registry(&self) -> &NamespaceRegistry {
        &self.registry
    }

    pub fn root(&self) -> &ObjectDef {
        self.registry.class(self.root)
    }

    pub fn default_namespace(&self) -> &str {
        &self.default_namespace
    }

    pub fn render(&self, namespace: Option<&str>, options: &EmitOptions) -> Generated {
        let namespace = namespace.unwrap_or(&self.default_namespace);
        let mut cg = Codegen::new(&self.registry, options);
        cg.emit(&self.source_name, namespace);
        let duplicates = self.registry.duplicate_classes();
        if !duplicates.is_empty() {
            warn!(groups = duplicates.len(), "duplicate class shapes generated");
        }
        Generated {
            source: cg.into_string(),
            duplicates,
            counts: self.registry.counts(),
        }
    }

    /// A common-definitions table naming every generated enum and class as
    /// it is named now. The root class is left out; it never matches one.
    pub fn common_skeleton(&self) -> IndexMap<String, CommonDefinition> {
        let mut out = IndexMap::new();
        for def in self.registry.enums() {
            out.entry(def.signature.clone()).or_insert_with(|| CommonDefinition {
                name: def.name.clone(),
                is_value_type: false,
                values: Some(def.members().into_iter().map(|(ident, _)| ident).collect()),
            });
        }
        let values = self.registry.values().map(|def| (def, true));
        let classes = self.registry.classes().map(|def| (def, false));
        let root = self.root();
        for (def, is_value_type) in values.chain(classes) {
            if std::ptr::eq(def, root) {
                continue;
            }
            out.entry(def.signature.clone()).or_insert_with(|| CommonDefinition {
                name: def.name.clone(),
                is_value_type,
                values: None,
            });
        }
        out
    }
}
