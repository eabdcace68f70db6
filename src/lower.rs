//! Lower schema nodes into registered definitions.
//!
//! Walks the schema from the root object down, following `$ref`s through the
//! [`ReferenceLoader`], and registers every nested object and enum with the
//! [`NamespaceRegistry`] as soon as its members are known. Members therefore
//! always point at the deduplicated definition.
use std::collections::HashMap;

use crate::error::{GenerateError, Result};
use crate::ir::{ArrayFacets, ClassId, EnumDef, MemberDef, ObjectDef, TypeRef};
use crate::naming::{singularize, to_definition_name};
use crate::reference::{ReferenceLoader, Target};
use crate::registry::NamespaceRegistry;
use crate::scalar::{self, Resolved, text::enum_values};
use crate::schema::{SchemaNode, SchemaType};

/// Maximum nesting of members, array items and references.
pub const MAX_DEPTH: usize = 64;

pub struct Lowering<'r> {
    registry: &'r mut NamespaceRegistry,
    loader: &'r mut ReferenceLoader,
    depth: usize,
}

/// What a member (or array element) turned out to be.
struct Slot {
    ty: TypeRef,
    is_array: bool,
    array: ArrayFacets,
}

impl Slot {
    fn single(ty: TypeRef) -> Self {
        Self {
            ty,
            is_array: false,
            array: ArrayFacets::default(),
        }
    }
}

/// Title for a nested definition: `preferred`, else the node's own title,
/// else `fallback`. Array elements singularize whichever title wins.
#[derive(Debug, Clone)]
struct TitleHint {
    preferred: Option<String>,
    fallback: String,
    singular: bool,
}

impl TitleHint {
    fn new(fallback: impl Into<String>) -> Self {
        Self {
            preferred: None,
            fallback: fallback.into(),
            singular: false,
        }
    }

    fn element(fallback: impl Into<String>) -> Self {
        Self {
            singular: true,
            ..Self::new(fallback)
        }
    }

    fn pick(&self, own: Option<&str>) -> String {
        let title = match (&self.preferred, own) {
            (Some(p), _) => p.as_str(),
            (None, Some(own)) => own,
            (None, None) => self.fallback.as_str(),
        };
        self.finish(title)
    }

    /// A `$ref` node's own title outranks the title of what it points at.
    /// The target's own title names a definition and is kept as written.
    fn through_ref(&self, own: Option<&str>) -> Self {
        Self {
            preferred: self.preferred.as_deref().or(own).map(|t| self.finish(t)),
            fallback: self.finish(&self.fallback),
            singular: false,
        }
    }

    fn finish(&self, title: &str) -> String {
        if self.singular { singularize(title) } else { title.to_string() }
    }
}

/// An object node, optionally merged with the object its `$ref` points at.
/// Local facets win.
#[derive(Clone, Copy)]
struct ObjectView<'a> {
    local: SchemaNode<'a>,
    referenced: Option<SchemaNode<'a>>,
}

impl<'a> ObjectView<'a> {
    fn title(&self) -> Result<Option<&'a str>> {
        match (self.local.title()?, self.referenced) {
            (Some(t), _) => Ok(Some(t)),
            (None, Some(r)) => r.title(),
            (None, None) => Ok(None),
        }
    }

    fn schema_uri(&self) -> Result<Option<&'a str>> {
        match (self.local.schema_uri()?, self.referenced) {
            (Some(s), _) => Ok(Some(s)),
            (None, Some(r)) => r.schema_uri(),
            (None, None) => Ok(None),
        }
    }

    fn properties(&self) -> Result<Vec<SchemaNode<'a>>> {
        match self.referenced {
            Some(r) if !self.local.has("properties") => r.properties(),
            _ => self.local.properties(),
        }
    }

    fn required(&self) -> Result<Vec<&'a str>> {
        match self.referenced {
            Some(r) if !self.local.has("required") => r.required(),
            _ => self.local.required(),
        }
    }
}

impl<'r> Lowering<'r> {
    pub fn new(registry: &'r mut NamespaceRegistry, loader: &'r mut ReferenceLoader) -> Self {
        Self {
            registry,
            loader,
            depth: 0,
        }
    }

    /// Build the root class and everything reachable from it.
    ///
    /// `fallback_title` names the root when the schema has no `title`.
    pub fn lower_root(&mut self, root: SchemaNode<'_>, fallback_title: &str) -> Result<ClassId> {
        if let Some(ty) = root.ty()? {
            if ty != SchemaType::Object {
                return Err(GenerateError::UnsupportedType {
                    property: root.key().to_string(),
                    ty: format!("{ty:?} at the root (expected an object)"),
                });
            }
        }
        let target = self.referenced(&root)?;
        let view = ObjectView {
            local: root,
            referenced: target.as_ref().map(|t| t.node(root.key())).transpose()?,
        };
        let title = view.title()?.unwrap_or(fallback_title).to_string();
        let schema = view.schema_uri()?.map(str::to_string);
        let id = self.registry.reserve_root(&title, schema)?;

        self.enter(target.as_ref())?;
        let members = self.lower_members(&view, &title);
        self.leave(target.as_ref());

        self.registry.complete_root(id, members?);
        Ok(id)
    }

    fn lower_members(&mut self, view: &ObjectView<'_>, owner: &str) -> Result<Vec<MemberDef>> {
        let required = view.required()?;
        let mut members = Vec::new();
        let mut identifiers = HashMap::new();
        for prop in view.properties()? {
            let name = prop.key();
            let identifier = to_definition_name(name);
            if identifier.is_empty() {
                return Err(GenerateError::Naming(format!(
                    "property \"{name}\" of \"{owner}\" has no usable name"
                )));
            }
            if let Some(other) = identifiers.insert(identifier.clone(), name) {
                return Err(GenerateError::Naming(format!(
                    "properties \"{other}\" and \"{name}\" of \"{owner}\" both map to \"{identifier}\""
                )));
            }
            let slot = self.lower_slot(prop, &TitleHint::new(name), true)?;
            members.push(MemberDef {
                name: name.to_string(),
                title: prop.title()?.map(str::to_string),
                is_array: slot.is_array,
                is_required: required.contains(&name),
                array: slot.array,
                ty: slot.ty,
            });
        }
        Ok(members)
    }

    fn lower_slot(&mut self, node: SchemaNode<'_>, hint: &TitleHint, allow_array: bool) -> Result<Slot> {
        if self.depth >= MAX_DEPTH {
            return Err(GenerateError::TooDeep {
                property: node.key().to_string(),
                limit: MAX_DEPTH,
            });
        }
        self.depth += 1;
        let slot = self.lower_slot_inner(node, hint, allow_array);
        self.depth -= 1;
        slot
    }

    fn lower_slot_inner(&mut self, node: SchemaNode<'_>, hint: &TitleHint, allow_array: bool) -> Result<Slot> {
        match node.ty()? {
            Some(SchemaType::Array) if allow_array => {
                let items = node
                    .items()?
                    .ok_or_else(|| GenerateError::missing_type(format!("{}[]", node.key())))?;
                let element_hint = TitleHint::element(hint.pick(node.title()?));
                let element = self.lower_slot(items, &element_hint, false)?;
                Ok(Slot {
                    ty: element.ty,
                    is_array: true,
                    array: ArrayFacets {
                        min_items: node.count_facet("minItems")?,
                        max_items: node.count_facet("maxItems")?,
                    },
                })
            }
            Some(SchemaType::Array) => Err(GenerateError::UnsupportedType {
                property: node.key().to_string(),
                ty: "array of arrays".to_string(),
            }),
            Some(SchemaType::Object) => self.lower_object(node, hint).map(Slot::single),
            Some(ty) => match scalar::resolve(&node, ty)? {
                Some(Resolved::Scalar(s)) => Ok(Slot::single(TypeRef::Scalar(s))),
                Some(Resolved::Enum(values)) => self.lower_enum(node, values, hint).map(Slot::single),
                None => Err(GenerateError::missing_type(node.key())),
            },
            None => {
                if let Some(values) = enum_values(&node)? {
                    return self.lower_enum(node, values, hint).map(Slot::single);
                }
                let Some(reference) = node.reference()? else {
                    return Err(GenerateError::missing_type(node.key()));
                };
                let target = self.loader.resolve(node.document(), reference)?;
                let target_node = target.node(node.key())?;
                let hint = hint.through_ref(node.title()?);

                self.loader.enter(&target)?;
                let slot = self.lower_slot(target_node, &hint, allow_array);
                self.loader.leave(&target);
                slot
            }
        }
    }

    fn lower_object(&mut self, node: SchemaNode<'_>, hint: &TitleHint) -> Result<TypeRef> {
        let target = self.referenced(&node)?;
        let view = ObjectView {
            local: node,
            referenced: target.as_ref().map(|t| t.node(node.key())).transpose()?,
        };
        let hint = match (view.local.title()?, view.referenced) {
            (None, Some(_)) => hint.through_ref(None),
            _ => hint.clone(),
        };
        let title = hint.pick(view.title()?);

        self.enter(target.as_ref())?;
        let members = self.lower_members(&view, &title);
        self.leave(target.as_ref());
        let members = members?;

        let signature = self.registry.object_signature(&members);
        let schema = view.schema_uri()?.map(str::to_string);
        self.registry.add_class(ObjectDef::new(title, schema, members, signature))
    }

    fn lower_enum(&mut self, node: SchemaNode<'_>, values: Vec<String>, hint: &TitleHint) -> Result<TypeRef> {
        let title = hint.pick(node.title()?);
        self.registry.add_enum(EnumDef::new(title, values))
    }

    fn referenced(&mut self, node: &SchemaNode<'_>) -> Result<Option<Target>> {
        match node.reference()? {
            Some(reference) => self.loader.resolve(node.document(), reference).map(Some),
            None => Ok(None),
        }
    }

    fn enter(&mut self, target: Option<&Target>) -> Result<()> {
        match target {
            Some(t) => self.loader.enter(t),
            None => Ok(()),
        }
    }

    fn leave(&mut self, target: Option<&Target>) {
        if let Some(t) = target {
            self.loader.leave(t);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::TypeDefinition;
    use crate::schema::Document;
    use serde_json::{Value, json};
    use std::rc::Rc;

    fn lower_doc(doc: Document) -> Result<(NamespaceRegistry, ClassId)> {
        let doc = Rc::new(doc);
        let mut registry = NamespaceRegistry::default();
        let mut loader = ReferenceLoader::new();
        loader.insert(Rc::clone(&doc));
        let root = doc.root_node().unwrap();
        let id = Lowering::new(&mut registry, &mut loader).lower_root(root, "fallback")?;
        Ok((registry, id))
    }

    fn lower(value: Value) -> Result<(NamespaceRegistry, ClassId)> {
        lower_doc(Document::new("/virtual/test.json", value))
    }

    fn class_names(reg: &NamespaceRegistry) -> Vec<String> {
        reg.classes().map(|c| c.name.clone()).collect()
    }

    #[test]
    fn pet_example() {
        let (reg, root) = lower(json!({
            "title": "Pet",
            "type": "object",
            "properties": {
                "name": {"type": "string"},
                "tags": {"type": "array", "items": {"type": "string", "title": "Tag"}}
            },
            "required": ["name"]
        }))
        .unwrap();
        let pet = reg.class(root);
        assert_eq!(pet.name, "Pet");
        assert_eq!(pet.signature, "(Name(string), Tags(List<string>))");
        let name = &pet.members[0];
        assert!(name.is_required && !name.is_array);
        let tags = &pet.members[1];
        assert!(tags.is_array && !tags.is_required);
        assert_eq!(class_names(&reg), ["Pet"]);
    }

    #[test]
    fn root_title_falls_back() {
        let (reg, root) = lower(json!({"properties": {}})).unwrap();
        assert_eq!(reg.class(root).name, "Fallback");
    }

    #[test]
    fn nested_titles_and_singular_elements() {
        let (reg, root) = lower(json!({
            "title": "Person",
            "properties": {
                "home address": {"type": "object", "properties": {"city": {"type": "string"}}},
                "categories": {"type": "array", "items": {"type": "object", "properties": {"id": {"type": "integer"}}}},
                "buses": {"type": "array", "title": "Buses", "items": {"enum": ["a", "b"]}},
                "pets": {"type": "array", "items": {"type": "object", "title": "Animals", "properties": {}}}
            }
        }))
        .unwrap();
        assert_eq!(class_names(&reg), ["Animal", "Category", "HomeAddress", "Person"]);
        let enums: Vec<_> = reg.enums().map(|e| e.name.as_str()).collect();
        assert_eq!(enums, ["Bus"]);
        assert_eq!(
            reg.class(root).signature,
            "(HomeAddress((City(string))), Categories(List<(Id(int))>), Buses(List<[a, b]>), Pets(List<()>))"
        );
    }

    #[test]
    fn element_titles_are_singular() {
        let (reg, _) = lower(json!({
            "title": "Zoo",
            "definitions": {"keeper": {"title": "Address", "type": "object", "properties": {}}},
            "properties": {
                "animals": {"type": "array", "items": {"type": "object", "title": "Animals", "properties": {"id": {"type": "integer"}}}},
                "statuses": {"type": "array", "items": {"title": "Statuses", "enum": ["x", "y"]}},
                "keepers": {"type": "array", "items": {"$ref": "#/definitions/keeper"}}
            }
        }))
        .unwrap();
        // a referenced definition keeps its own title
        assert_eq!(class_names(&reg), ["Address", "Animal", "Zoo"]);
        let enums: Vec<_> = reg.enums().map(|e| e.name.as_str()).collect();
        assert_eq!(enums, ["Status"]);
    }

    #[test]
    fn same_title_different_values_do_not_merge() {
        let (reg, root) = lower(json!({
            "title": "T",
            "properties": {
                "a": {"title": "E", "enum": ["x, y"]},
                "b": {"title": "E", "enum": ["x", "y"]}
            }
        }))
        .unwrap();
        let members = &reg.class(root).members;
        assert_ne!(members[0].ty, members[1].ty);
        let enums: Vec<_> = reg.enums().map(|e| (e.name.as_str(), e.values.len())).collect();
        assert_eq!(enums, [("E", 1), ("E1", 2)]);
    }

    #[test]
    fn same_title_same_shape_merges() {
        let (reg, root) = lower(json!({
            "title": "Order",
            "properties": {
                "billing": {"type": "object", "title": "Address", "properties": {"city": {"type": "string"}}},
                "shipping": {"type": "object", "title": "Address", "properties": {"city": {"type": "string"}}},
                "legacy": {"type": "object", "title": "Address", "properties": {"town": {"type": "string"}}}
            }
        }))
        .unwrap();
        let order = reg.class(root);
        assert_eq!(order.members[0].ty, order.members[1].ty);
        assert_ne!(order.members[0].ty, order.members[2].ty);
        assert_eq!(class_names(&reg), ["Address", "Address1", "Order"]);
        assert!(reg.duplicate_classes().is_empty());
    }

    #[test]
    fn differently_titled_same_shape_is_reported() {
        let (reg, _) = lower(json!({
            "title": "Contact",
            "properties": {
                "home": {"type": "object", "title": "Home", "properties": {"city": {"type": "string"}}},
                "work": {"type": "object", "title": "Work", "properties": {"city": {"type": "string"}}}
            }
        }))
        .unwrap();
        let dups = reg.duplicate_classes();
        assert_eq!(dups.len(), 1);
        assert_eq!(dups[0].names, ["Home", "Work"]);
    }

    #[test]
    fn untyped_enum_is_a_string_enum() {
        let (reg, root) = lower(json!({
            "title": "Task",
            "properties": {"state": {"enum": ["open", "in progress"]}},
            "required": ["state"]
        }))
        .unwrap();
        let member = &reg.class(root).members[0];
        let TypeDefinition::Enum(def) = reg.resolve(&member.ty) else {
            panic!("expected enum");
        };
        assert_eq!(def.name, "State");
        assert!(def.needs_member_names());
        assert!(member.is_required);
    }

    #[test]
    fn missing_types_fail() {
        let err = lower(json!({"properties": {"x": {"title": "X"}}})).unwrap_err();
        assert!(matches!(err, GenerateError::MissingType { property } if property == "x"));

        let err = lower(json!({"properties": {"xs": {"type": "array"}}})).unwrap_err();
        assert!(matches!(err, GenerateError::MissingType { .. }));

        let err = lower(json!({"properties": {"flag": {"type": "boolean"}}})).unwrap_err();
        assert!(matches!(err, GenerateError::UnsupportedType { .. }));

        let err = lower(json!({"properties": {"grid": {"type": "array", "items": {"type": "array", "items": {"type": "integer"}}}}}))
            .unwrap_err();
        assert!(matches!(err, GenerateError::UnsupportedType { .. }));
    }

    #[test]
    fn unusable_member_names_fail() {
        let err = lower(json!({"title": "T", "properties": {"$$": {"type": "string"}}})).unwrap_err();
        assert!(matches!(err, GenerateError::Naming(_)));
    }

    #[test]
    fn colliding_member_names_fail() {
        let err = lower(json!({
            "title": "Person",
            "properties": {"first name": {"type": "string"}, "firstName": {"type": "string"}}
        }))
        .unwrap_err();
        let GenerateError::Naming(message) = err else {
            panic!("expected a naming error");
        };
        assert!(message.contains("\"first name\" and \"firstName\" of \"Person\""), "{message}");
    }

    #[test]
    fn same_document_definitions() {
        let (reg, root) = lower(json!({
            "title": "Palette",
            "definitions": {"Color": {"title": "Color", "enum": ["red", "green"]}},
            "properties": {
                "fg": {"$ref": "#/definitions/Color"},
                "bg": {"$ref": "#/definitions/Color"},
                "accent": {"$ref": "#/definitions/Color", "title": "Accent"}
            }
        }))
        .unwrap();
        let members = &reg.class(root).members;
        assert_eq!(members[0].ty, members[1].ty);
        let names: Vec<_> = reg.enums().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["Accent", "Color"]);
    }

    #[test]
    fn self_reference_is_a_cycle() {
        let err = lower(json!({
            "title": "Node",
            "type": "object",
            "properties": {"next": {"$ref": "#"}}
        }))
        .unwrap_err();
        assert!(err.to_string().contains("cyclic"), "{err}");
    }

    #[test]
    fn nesting_is_capped() {
        let mut schema = json!({"type": "string"});
        for i in 0..(MAX_DEPTH + 1) {
            schema = json!({"type": "object", "title": format!("Level{i}"), "properties": {"inner": schema}});
        }
        let err = lower(schema).unwrap_err();
        assert!(matches!(err, GenerateError::TooDeep { .. }));
    }

    #[test]
    fn references_across_files() {
        let dir = tempfile::tempdir().unwrap();
        let write = |name: &str, value: Value| std::fs::write(dir.path().join(name), value.to_string()).unwrap();
        std::fs::create_dir(dir.path().join("common")).unwrap();
        write(
            "common/address.json",
            json!({
                "title": "Address",
                "type": "object",
                "properties": {"zip": {"$ref": "zip.json"}},
                "required": ["zip"]
            }),
        );
        write("common/zip.json", json!({"type": "string", "maxLength": 10}));
        write(
            "customer.json",
            json!({
                "title": "Customer",
                "properties": {
                    "address": {"$ref": "common/address.json"},
                    "billing": {"title": "Billing Address", "$ref": "common/address.json"},
                    "previous": {"type": "array", "items": {"$ref": "common/address.json"}}
                }
            }),
        );
        let path = std::fs::canonicalize(dir.path().join("customer.json")).unwrap();
        let (reg, root) = lower_doc(Document::load(&path).unwrap()).unwrap();
        let customer = reg.class(root);
        // zip resolves relative to common/, not to the root schema
        assert_eq!(customer.members[0].ty, customer.members[2].ty);
        assert!(customer.members[2].is_array);
        assert_eq!(class_names(&reg), ["Address", "BillingAddress", "Customer"]);
        let address = reg.classes().next().unwrap();
        assert!(address.members[0].is_required);
    }
}
