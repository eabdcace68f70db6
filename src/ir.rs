// Strongly-typed definitions for codegen. No serde_json::Value here.
use crate::naming::to_definition_name;
use crate::scalar::ScalarType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(pub(crate) usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ValueId(pub(crate) usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EnumId(pub(crate) usize);

/// Handle to the type a member points at.
///
/// Named kinds are ids into the registry; once deduplicated, many members
/// share one id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeRef {
    Scalar(ScalarType),
    Class(ClassId),
    Value(ValueId),
    Enum(EnumId),
}

/// Borrowed view of any generated type, dispatched by shape.
#[derive(Debug, Clone, Copy)]
pub enum TypeDefinition<'a> {
    Scalar(&'a ScalarType),
    Enum(&'a EnumDef),
    Class(&'a ObjectDef),
    Value(&'a ObjectDef),
}

impl<'a> TypeDefinition<'a> {
    /// The identifier used in emitted code.
    pub fn name(&self) -> &'a str {
        match self {
            Self::Scalar(s) => s.type_name(),
            Self::Enum(e) => &e.name,
            Self::Class(o) | Self::Value(o) => &o.name,
        }
    }

    pub fn title(&self) -> Option<&'a str> {
        match self {
            Self::Scalar(_) => None,
            Self::Enum(e) => Some(&e.title),
            Self::Class(o) | Self::Value(o) => Some(&o.title),
        }
    }

    pub fn signature(&self) -> &'a str {
        match self {
            Self::Scalar(s) => s.signature(),
            Self::Enum(e) => &e.signature,
            Self::Class(o) | Self::Value(o) => &o.signature,
        }
    }

    /// Reference types get a nullable annotation when optional.
    pub fn is_reference_type(&self) -> bool {
        match self {
            Self::Scalar(s) => s.is_reference_type(),
            Self::Class(_) => true,
            Self::Enum(_) | Self::Value(_) => false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArrayFacets {
    pub min_items: Option<u64>,
    pub max_items: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct MemberDef {
    /// Raw property key; also the wire name.
    pub name: String,
    pub title: Option<String>,
    pub is_array: bool,
    pub is_required: bool,
    pub array: ArrayFacets,
    pub ty: TypeRef,
}

impl MemberDef {
    pub fn identifier(&self) -> String {
        to_definition_name(&self.name)
    }
}

/// Shape shared by classes and value types (structs).
#[derive(Debug, Clone)]
pub struct ObjectDef {
    pub title: String,
    /// Final identifier; empty until the registry assigns it.
    pub name: String,
    /// `$schema` of the node, emitted as the data contract namespace.
    pub schema: Option<String>,
    pub members: Vec<MemberDef>,
    pub signature: String,
}

impl ObjectDef {
    pub fn new(title: impl Into<String>, schema: Option<String>, members: Vec<MemberDef>, signature: String) -> Self {
        Self {
            title: title.into(),
            name: String::new(),
            schema,
            members,
            signature,
        }
    }

    pub fn base_name(&self) -> String {
        to_definition_name(&self.title)
    }
}

#[derive(Debug, Clone)]
pub struct EnumDef {
    pub title: String,
    pub name: String,
    /// Raw values in source order; ordinal codes follow this order.
    pub values: Vec<String>,
    /// Member names prescribed by a common definition, parallel to `values`.
    pub value_names: Option<Vec<String>>,
    pub signature: String,
}

impl EnumDef {
    pub fn new(title: impl Into<String>, values: Vec<String>) -> Self {
        let signature = enum_signature(&values);
        Self {
            title: title.into(),
            name: String::new(),
            values,
            value_names: None,
            signature,
        }
    }

    pub fn base_name(&self) -> String {
        to_definition_name(&self.title)
    }

    /// `(identifier, raw value)` pairs in declaration order.
    pub fn members(&self) -> Vec<(String, &str)> {
        self.values
            .iter()
            .enumerate()
            .map(|(i, raw)| {
                let ident = match &self.value_names {
                    Some(names) => names[i].clone(),
                    None => to_definition_name(raw),
                };
                (ident, raw.as_str())
            })
            .collect()
    }

    /// True when any member identifier differs from its wire value.
    pub fn needs_member_names(&self) -> bool {
        self.members().iter().any(|(ident, raw)| ident != raw)
    }
}

pub fn enum_signature(values: &[String]) -> String {
    format!("[{}]", values.join(", "))
}

/// Structural signature of an object from its members' signatures.
///
/// `type_signature` returns the signature of a member's type.
pub fn object_signature(members: &[MemberDef], type_signature: impl Fn(&TypeRef) -> String) -> String {
    let parts: Vec<String> = members
        .iter()
        .map(|m| {
            let ty = type_signature(&m.ty);
            if m.is_array {
                format!("{}(List<{ty}>)", m.identifier())
            } else {
                format!("{}({ty})", m.identifier())
            }
        })
        .collect();
    format!("({})", parts.join(", "))
}
