//! Namespace registry: owns every generated definition of one run.
//!
//! Registration deduplicates by structural signature and hands out
//! collision-free names. Classes, value types and enums live in separate
//! tables but share one identifier space, so a name claimed by one kind is
//! unusable, unsuffixed, by the others.
//!
//! Name tables are ordered maps, which makes emission order alphabetical.
use std::collections::{BTreeMap, HashSet};

use indexmap::IndexMap;
use tracing::{debug, info, warn};

use crate::error::{GenerateError, Result};
use crate::ir::{ClassId, EnumDef, EnumId, MemberDef, ObjectDef, TypeDefinition, TypeRef, ValueId, object_signature};
use crate::naming::to_definition_name;
use crate::overrides::CommonDefinitions;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Class,
    Enum,
}

/// What a new definition looks like, for comparison with registered ones.
#[derive(Clone, Copy)]
enum Shape<'a> {
    Object(&'a [MemberDef]),
    Enum(&'a [String]),
}

enum Claim {
    /// The name is free.
    Free(String),
    /// A same-kind definition of the same shape already owns a candidate.
    Existing(TypeRef),
}

/// Two or more class names generated for one signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateGroup {
    pub signature: String,
    pub names: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counts {
    pub enums: usize,
    pub values: usize,
    pub classes: usize,
}

#[derive(Debug, Default)]
pub struct NamespaceRegistry {
    classes: Vec<ObjectDef>,
    values: Vec<ObjectDef>,
    enums: Vec<EnumDef>,
    class_names: BTreeMap<String, ClassId>,
    value_names: BTreeMap<String, ValueId>,
    enum_names: BTreeMap<String, EnumId>,
    overrides: CommonDefinitions,
    /// Root class whose members are still being built.
    pending_root: Option<ClassId>,
}

// ————————————————————————————————————————————————————————————————————————————
// LOOKUP
// ————————————————————————————————————————————————————————————————————————————

impl NamespaceRegistry {
    pub fn new(overrides: CommonDefinitions) -> Self {
        Self {
            overrides,
            ..Self::default()
        }
    }

    pub fn class(&self, id: ClassId) -> &ObjectDef {
        &self.classes[id.0]
    }

    pub fn value(&self, id: ValueId) -> &ObjectDef {
        &self.values[id.0]
    }

    pub fn enum_def(&self, id: EnumId) -> &EnumDef {
        &self.enums[id.0]
    }

    pub fn resolve<'a>(&'a self, ty: &'a TypeRef) -> TypeDefinition<'a> {
        match ty {
            TypeRef::Scalar(s) => TypeDefinition::Scalar(s),
            TypeRef::Class(id) => TypeDefinition::Class(self.class(*id)),
            TypeRef::Value(id) => TypeDefinition::Value(self.value(*id)),
            TypeRef::Enum(id) => TypeDefinition::Enum(self.enum_def(*id)),
        }
    }

    pub fn object_signature(&self, members: &[MemberDef]) -> String {
        object_signature(members, |ty| self.resolve(ty).signature().to_string())
    }

    /// Classes in name order.
    pub fn classes(&self) -> impl Iterator<Item = &ObjectDef> {
        self.class_names.values().map(|id| self.class(*id))
    }

    /// Value types in name order.
    pub fn values(&self) -> impl Iterator<Item = &ObjectDef> {
        self.value_names.values().map(|id| self.value(*id))
    }

    /// Enums in name order.
    pub fn enums(&self) -> impl Iterator<Item = &EnumDef> {
        self.enum_names.values().map(|id| self.enum_def(*id))
    }

    pub fn counts(&self) -> Counts {
        Counts {
            enums: self.enums.len(),
            values: self.values.len(),
            classes: self.classes.len(),
        }
    }

    /// Groups of class names that share a signature.
    ///
    /// Same-titled shapes merge during registration, so these are differently
    /// titled classes a common definition could unify.
    pub fn duplicate_classes(&self) -> Vec<DuplicateGroup> {
        let mut groups = IndexMap::<&str, Vec<String>>::new();
        for class in self.classes() {
            groups.entry(class.signature.as_str()).or_default().push(class.name.clone());
        }
        groups
            .into_iter()
            .filter(|(_, names)| names.len() > 1)
            .map(|(signature, names)| {
                warn!(%signature, names = ?names, "classes share a signature");
                DuplicateGroup {
                    signature: signature.to_string(),
                    names,
                }
            })
            .collect()
    }

    fn lookup(&self, kind: Kind, name: &str) -> Option<TypeRef> {
        match kind {
            Kind::Class => self.class_names.get(name).copied().map(TypeRef::Class),
            Kind::Enum => self.enum_names.get(name).copied().map(TypeRef::Enum),
        }
    }

    fn is_taken(&self, name: &str) -> bool {
        self.class_names.contains_key(name) || self.value_names.contains_key(name) || self.enum_names.contains_key(name)
    }

    fn is_pending(&self, ty: &TypeRef) -> bool {
        matches!((ty, self.pending_root), (TypeRef::Class(id), Some(root)) if *id == root)
    }

    /// Structural equality. Signatures alone are ambiguous once enum values
    /// contain `", "`, so enums compare their values and objects recurse.
    fn has_shape(&self, ty: &TypeRef, shape: Shape<'_>) -> bool {
        match (self.resolve(ty), shape) {
            (TypeDefinition::Class(o) | TypeDefinition::Value(o), Shape::Object(members)) => {
                self.same_members(&o.members, members)
            }
            (TypeDefinition::Enum(e), Shape::Enum(values)) => e.values == values,
            _ => false,
        }
    }

    fn same_members(&self, a: &[MemberDef], b: &[MemberDef]) -> bool {
        a.len() == b.len()
            && a.iter().zip(b).all(|(x, y)| {
                x.identifier() == y.identifier() && x.is_array == y.is_array && self.same_type(&x.ty, &y.ty)
            })
    }

    fn same_type(&self, a: &TypeRef, b: &TypeRef) -> bool {
        match (self.resolve(a), self.resolve(b)) {
            (TypeDefinition::Scalar(x), TypeDefinition::Scalar(y)) => x.signature() == y.signature(),
            (TypeDefinition::Enum(x), TypeDefinition::Enum(y)) => x.values == y.values,
            (TypeDefinition::Class(x), TypeDefinition::Class(y)) | (TypeDefinition::Value(x), TypeDefinition::Value(y)) => {
                self.same_members(&x.members, &y.members)
            }
            _ => false,
        }
    }

    /// The definition already bound to an override entry, if its shape matches.
    fn bound_override(&self, signature: &str, shape: Shape<'_>) -> Result<Option<TypeRef>> {
        match self.overrides.bound(signature) {
            Some(bound) if self.has_shape(bound, shape) => Ok(Some(bound.clone())),
            Some(_) => Err(GenerateError::Override {
                signature: signature.to_string(),
                message: "signature matches definitions of different shapes".to_string(),
            }),
            None => Ok(None),
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// REGISTRATION
// ————————————————————————————————————————————————————————————————————————————

impl NamespaceRegistry {
    /// Walk `base`, `base1`, `base2`, … until a candidate is free or already
    /// holds a same-kind definition of the same shape.
    fn claim(&self, kind: Kind, base: &str, shape: Shape<'_>) -> Claim {
        let mut suffix = 0u64;
        loop {
            let candidate = candidate(base, suffix);
            match self.lookup(kind, &candidate) {
                Some(existing) => {
                    if !self.is_pending(&existing) && self.has_shape(&existing, shape) {
                        return Claim::Existing(existing);
                    }
                }
                None if self.is_taken(&candidate) => {}
                None => return Claim::Free(candidate),
            }
            suffix += 1;
        }
    }

    /// Same walk as [`Self::claim`] but never reuses.
    fn claim_fresh(&self, base: &str) -> String {
        let mut suffix = 0u64;
        loop {
            let candidate = candidate(base, suffix);
            if !self.is_taken(&candidate) {
                return candidate;
            }
            suffix += 1;
        }
    }

    fn push_class(&mut self, def: ObjectDef) -> ClassId {
        let id = ClassId(self.classes.len());
        self.class_names.insert(def.name.clone(), id);
        self.classes.push(def);
        id
    }

    fn push_value(&mut self, def: ObjectDef) -> ValueId {
        let id = ValueId(self.values.len());
        self.value_names.insert(def.name.clone(), id);
        self.values.push(def);
        id
    }

    fn push_enum(&mut self, def: EnumDef) -> EnumId {
        let id = EnumId(self.enums.len());
        self.enum_names.insert(def.name.clone(), id);
        self.enums.push(def);
        id
    }

    /// Claim the root class name before any member is built.
    ///
    /// The root never takes part in signature reuse or overrides.
    pub fn reserve_root(&mut self, title: &str, schema: Option<String>) -> Result<ClassId> {
        let base = to_definition_name(title);
        if base.is_empty() {
            return Err(GenerateError::Naming("cannot determine root class name".to_string()));
        }
        let mut def = ObjectDef::new(title, schema, Vec::new(), String::new());
        def.name = self.claim_fresh(&base);
        debug!(name = %def.name, "reserved root class");
        let id = self.push_class(def);
        self.pending_root = Some(id);
        Ok(id)
    }

    pub fn complete_root(&mut self, id: ClassId, members: Vec<MemberDef>) {
        let signature = self.object_signature(&members);
        let root = &mut self.classes[id.0];
        root.members = members;
        root.signature = signature;
        if self.pending_root == Some(id) {
            self.pending_root = None;
        }
    }

    /// Register a freshly built class, or return the definition it merges into.
    pub fn add_class(&mut self, mut def: ObjectDef) -> Result<TypeRef> {
        let signature = def.signature.clone();

        if let Some(common) = self.overrides.get(&signature) {
            if let Some(bound) = self.bound_override(&signature, Shape::Object(&def.members))? {
                debug!(%signature, "reusing common definition");
                return Ok(bound);
            }
            let (title, is_value_type) = (common.name.clone(), common.is_value_type);
            let base = to_definition_name(&title);
            if base.is_empty() {
                return Err(GenerateError::Override {
                    signature,
                    message: format!("name \"{title}\" is not a usable identifier"),
                });
            }
            def.title = title;
            let ty = if is_value_type {
                def.name = self.claim_fresh(&base);
                debug!(name = %def.name, "registered value type from common definition");
                TypeRef::Value(self.push_value(def))
            } else {
                def.name = self.claim_fresh(&base);
                debug!(name = %def.name, "registered class from common definition");
                TypeRef::Class(self.push_class(def))
            };
            self.overrides.bind(&signature, ty.clone());
            return Ok(ty);
        }

        let base = def.base_name();
        if base.is_empty() {
            return Err(GenerateError::Naming(format!("class \"{}\" has no usable name", def.title)));
        }
        match self.claim(Kind::Class, &base, Shape::Object(&def.members)) {
            Claim::Existing(ty) => {
                debug!(title = %def.title, name = %self.resolve(&ty).name(), "merged into existing class");
                Ok(ty)
            }
            Claim::Free(name) => {
                def.name = name;
                debug!(name = %def.name, %signature, "registered class");
                Ok(TypeRef::Class(self.push_class(def)))
            }
        }
    }

    /// Register a freshly built enum, or return the definition it merges into.
    pub fn add_enum(&mut self, mut def: EnumDef) -> Result<TypeRef> {
        let signature = def.signature.clone();

        if let Some(common) = self.overrides.get(&signature) {
            if let Some(bound) = self.bound_override(&signature, Shape::Enum(&def.values))? {
                debug!(%signature, "reusing common definition");
                return Ok(bound);
            }
            let (title, names) = (common.name.clone(), common.values.clone());
            if let Some(names) = &names {
                if names.len() != def.values.len() {
                    return Err(GenerateError::Override {
                        signature,
                        message: format!("expected {} value names, found {}", def.values.len(), names.len()),
                    });
                }
                if let Some(bad) = names.iter().find(|name| to_definition_name(name) != **name) {
                    return Err(GenerateError::Override {
                        signature,
                        message: format!("value name \"{bad}\" is not a valid identifier"),
                    });
                }
                if let Some(dup) = first_repeat(names.iter().map(String::as_str)) {
                    return Err(GenerateError::Override {
                        signature,
                        message: format!("value name \"{dup}\" is used twice"),
                    });
                }
            }
            let base = to_definition_name(&title);
            if base.is_empty() {
                return Err(GenerateError::Override {
                    signature,
                    message: format!("name \"{title}\" is not a usable identifier"),
                });
            }
            def.title = title;
            def.value_names = names;
            def.name = self.claim_fresh(&base);
            debug!(name = %def.name, "registered enum from common definition");
            let ty = TypeRef::Enum(self.push_enum(def));
            self.overrides.bind(&signature, ty.clone());
            return Ok(ty);
        }

        let base = def.base_name();
        if base.is_empty() {
            return Err(GenerateError::Naming(format!("enum \"{}\" has no usable name", def.title)));
        }
        let members = def.members();
        if let Some((_, raw)) = members.iter().find(|(ident, _)| ident.is_empty()) {
            return Err(GenerateError::Naming(format!(
                "value \"{raw}\" of enum \"{}\" has no usable name",
                def.title
            )));
        }
        if let Some(ident) = first_repeat(members.iter().map(|(ident, _)| ident.as_str())) {
            let raws: Vec<_> = members.iter().filter(|(i, _)| i == ident).map(|(_, raw)| format!("\"{raw}\"")).collect();
            return Err(GenerateError::Naming(format!(
                "values {} of enum \"{}\" all map to \"{ident}\"",
                raws.join(", "),
                def.title
            )));
        }
        match self.claim(Kind::Enum, &base, Shape::Enum(&def.values)) {
            Claim::Existing(ty) => {
                debug!(title = %def.title, name = %self.resolve(&ty).name(), "merged into existing enum");
                Ok(ty)
            }
            Claim::Free(name) => {
                def.name = name;
                debug!(name = %def.name, %signature, "registered enum");
                Ok(TypeRef::Enum(self.push_enum(def)))
            }
        }
    }

    pub fn log_summary(&self) {
        let counts = self.counts();
        info!(
            enums = counts.enums,
            values = counts.values,
            classes = counts.classes,
            "generated definitions"
        );
    }
}

fn candidate(base: &str, suffix: u64) -> String {
    if suffix == 0 { base.to_string() } else { format!("{base}{suffix}") }
}

fn first_repeat<'a>(items: impl IntoIterator<Item = &'a str>) -> Option<&'a str> {
    let mut seen = HashSet::new();
    items.into_iter().find(|item| !seen.insert(*item))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::ArrayFacets;
    use crate::overrides::CommonDefinition;
    use crate::scalar::{IntegerFacets, ScalarType, StringFacets};

    fn string() -> TypeRef {
        TypeRef::Scalar(ScalarType::String(StringFacets::default()))
    }

    fn int() -> TypeRef {
        TypeRef::Scalar(ScalarType::Integer(IntegerFacets::default()))
    }

    fn member(name: &str, ty: TypeRef) -> MemberDef {
        MemberDef {
            name: name.to_string(),
            title: None,
            is_array: false,
            is_required: false,
            array: ArrayFacets::default(),
            ty,
        }
    }

    fn class(reg: &NamespaceRegistry, title: &str, members: Vec<MemberDef>) -> ObjectDef {
        let sig = reg.object_signature(&members);
        ObjectDef::new(title, None, members, sig)
    }

    fn name_of(reg: &NamespaceRegistry, ty: &TypeRef) -> String {
        reg.resolve(ty).name().to_string()
    }

    #[test]
    fn identical_shapes_with_one_title_merge() {
        let mut reg = NamespaceRegistry::default();
        let a = reg.add_class(class(&reg, "Address", vec![member("city", string())])).unwrap();
        let b = reg.add_class(class(&reg, "address", vec![member("city", string())])).unwrap();
        assert_eq!(a, b);
        assert_eq!(reg.counts().classes, 1);
    }

    #[test]
    fn different_shapes_get_minimal_suffixes() {
        let mut reg = NamespaceRegistry::default();
        let a = reg.add_class(class(&reg, "Item", vec![member("a", string())])).unwrap();
        let b = reg.add_class(class(&reg, "Item", vec![member("b", string())])).unwrap();
        let c = reg.add_class(class(&reg, "Item", vec![member("c", string())])).unwrap();
        // rediscovering the second shape converges on Item1
        let b2 = reg.add_class(class(&reg, "Item", vec![member("b", string())])).unwrap();
        assert_eq!(name_of(&reg, &a), "Item");
        assert_eq!(name_of(&reg, &b), "Item1");
        assert_eq!(name_of(&reg, &c), "Item2");
        assert_eq!(b, b2);
        let names: Vec<_> = reg.classes().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["Item", "Item1", "Item2"]);
    }

    #[test]
    fn names_are_unique_across_kinds() {
        let mut reg = NamespaceRegistry::default();
        let e = reg.add_enum(EnumDef::new("Status", vec!["on".into(), "off".into()])).unwrap();
        let c = reg.add_class(class(&reg, "Status", vec![member("code", int())])).unwrap();
        assert_eq!(name_of(&reg, &e), "Status");
        assert_eq!(name_of(&reg, &c), "Status1");
    }

    #[test]
    fn root_is_never_reused() {
        let mut reg = NamespaceRegistry::default();
        let root = reg.reserve_root("Node", None).unwrap();
        // while pending, an empty nested shape must not merge into the root
        let nested = reg.add_class(class(&reg, "Node", vec![])).unwrap();
        assert_eq!(name_of(&reg, &nested), "Node1");
        reg.complete_root(root, vec![member("child", nested.clone())]);
        assert_eq!(reg.class(root).signature, "(Child())");
        assert!(reg.reserve_root("   ", None).is_err());
    }

    #[test]
    fn differently_titled_duplicates_are_reported() {
        let mut reg = NamespaceRegistry::default();
        reg.add_class(class(&reg, "Home", vec![member("city", string())])).unwrap();
        reg.add_class(class(&reg, "Work", vec![member("city", string())])).unwrap();
        let dups = reg.duplicate_classes();
        assert_eq!(
            dups,
            [DuplicateGroup {
                signature: "(City(string))".into(),
                names: vec!["Home".into(), "Work".into()],
            }]
        );
    }

    #[test]
    fn common_definitions_rename_and_reuse() {
        let mut entries = IndexMap::new();
        entries.insert(
            "(City(string))".to_string(),
            CommonDefinition {
                name: "Place".into(),
                is_value_type: true,
                values: None,
            },
        );
        let mut reg = NamespaceRegistry::new(CommonDefinitions::new(entries));
        let home = reg.add_class(class(&reg, "Home", vec![member("city", string())])).unwrap();
        let work = reg.add_class(class(&reg, "Work", vec![member("city", string())])).unwrap();
        assert!(matches!(home, TypeRef::Value(_)));
        assert_eq!(home, work);
        assert_eq!(name_of(&reg, &home), "Place");
        assert_eq!(reg.counts(), Counts { enums: 0, values: 1, classes: 0 });
        assert!(!reg.resolve(&home).is_reference_type());
    }

    #[test]
    fn common_enum_value_names() {
        let mut entries = IndexMap::new();
        entries.insert(
            "[lo, hi]".to_string(),
            CommonDefinition {
                name: "Level".into(),
                is_value_type: false,
                values: Some(vec!["Low".into(), "High".into()]),
            },
        );
        let mut reg = NamespaceRegistry::new(CommonDefinitions::new(entries));
        let ty = reg.add_enum(EnumDef::new("grade", vec!["lo".into(), "hi".into()])).unwrap();
        let TypeRef::Enum(id) = ty else { panic!("expected enum") };
        let def = reg.enum_def(id);
        assert_eq!(def.name, "Level");
        assert_eq!(def.members()[1], ("High".to_string(), "hi"));
    }

    #[test]
    fn common_enum_value_count_must_match() {
        let mut entries = IndexMap::new();
        entries.insert(
            "[a, b]".to_string(),
            CommonDefinition {
                name: "Ab".into(),
                is_value_type: false,
                values: Some(vec!["A".into()]),
            },
        );
        let mut reg = NamespaceRegistry::new(CommonDefinitions::new(entries));
        let err = reg.add_enum(EnumDef::new("x", vec!["a".into(), "b".into()])).unwrap_err();
        assert!(matches!(err, GenerateError::Override { .. }));
    }

    #[test]
    fn enums_compare_values_not_signatures() {
        let mut reg = NamespaceRegistry::default();
        let joined = reg.add_enum(EnumDef::new("E", vec!["x, y".into()])).unwrap();
        let split = reg.add_enum(EnumDef::new("E", vec!["x".into(), "y".into()])).unwrap();
        assert_ne!(joined, split);
        assert_eq!(name_of(&reg, &split), "E1");

        // the ambiguity one level up must not merge classes either
        let a = reg.add_class(class(&reg, "Holder", vec![member("e", joined)])).unwrap();
        let b = reg.add_class(class(&reg, "Holder", vec![member("e", split.clone())])).unwrap();
        assert_ne!(a, b);
        let again = reg.add_class(class(&reg, "Holder", vec![member("e", split)])).unwrap();
        assert_eq!(b, again);
    }

    #[test]
    fn colliding_enum_value_names_are_errors() {
        let mut reg = NamespaceRegistry::default();
        let err = reg
            .add_enum(EnumDef::new("Phase", vec!["in-progress".into(), "inprogress".into()]))
            .unwrap_err();
        let GenerateError::Naming(message) = err else {
            panic!("expected a naming error");
        };
        assert!(message.contains("\"Phase\""), "{message}");
        assert!(message.contains("\"Inprogress\""), "{message}");
    }

    #[test]
    fn common_enum_value_names_must_be_identifiers() {
        let overrides = |values: Vec<&str>| {
            let mut entries = IndexMap::new();
            entries.insert(
                "[in, out]".to_string(),
                CommonDefinition {
                    name: "Stock".into(),
                    is_value_type: false,
                    values: Some(values.into_iter().map(String::from).collect()),
                },
            );
            NamespaceRegistry::new(CommonDefinitions::new(entries))
        };
        let stock = || EnumDef::new("stock", vec!["in".into(), "out".into()]);

        let err = overrides(vec!["In Stock", "Gone"]).add_enum(stock()).unwrap_err();
        assert!(err.to_string().contains("In Stock"), "{err}");
        let err = overrides(vec!["Gone", "Gone"]).add_enum(stock()).unwrap_err();
        assert!(matches!(err, GenerateError::Override { .. }));
        assert!(overrides(vec!["InStock", "Gone"]).add_enum(stock()).is_ok());
    }

    #[test]
    fn unusable_names_are_errors() {
        let mut reg = NamespaceRegistry::default();
        assert!(matches!(
            reg.add_class(class(&reg, "!!!", vec![])),
            Err(GenerateError::Naming(_))
        ));
        assert!(matches!(
            reg.add_enum(EnumDef::new("Sym", vec!["+".into(), "-".into()])),
            Err(GenerateError::Naming(_))
        ));
    }
}
