//! Scalar resolvers.
//!
//! Interpret a schema node's primitive facets (`type`, `format`, `minimum`,
//! `maximum`, `minLength`, `maxLength`, `multipleOf`, `enum`) as one of the
//! built-in C# types, or as the raw values of a string enum.
pub mod number;
pub mod text;

pub use number::{Bound, IntegerFacets, NumberFacets};
pub use text::{DateTimeFacets, StringFacets};

use crate::error::Result;
use crate::schema::{SchemaNode, SchemaType};

/// A type that maps onto a C# primitive and never needs a name of its own.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ScalarType {
    Integer(IntegerFacets),
    Number(NumberFacets),
    String(StringFacets),
    DateTime(DateTimeFacets),
}

impl ScalarType {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Integer(_) => "int",
            Self::Number(_) => "decimal",
            Self::String(_) => "string",
            Self::DateTime(_) => "DateTimeOffset",
        }
    }

    /// Facets never take part in structural identity; only the C# type does.
    pub fn signature(&self) -> &'static str {
        self.type_name()
    }

    pub fn is_reference_type(&self) -> bool {
        matches!(self, Self::String(_))
    }

    /// Validation attributes for a single-valued member of this type.
    pub fn attributes(&self) -> Vec<String> {
        match self {
            Self::Integer(f) => f.attributes(),
            Self::Number(f) => f.attributes(),
            Self::String(f) => f.attributes(),
            Self::DateTime(f) => f.attributes(),
        }
    }
}

/// Outcome of reading a primitive node.
#[derive(Clone, Debug, PartialEq)]
pub enum Resolved {
    Scalar(ScalarType),
    /// Raw enum values in source order.
    Enum(Vec<String>),
}

/// Resolve a node whose `type` is already known to be primitive.
///
/// Returns `None` for `object` and `array`, which are not scalars.
pub fn resolve(node: &SchemaNode<'_>, ty: SchemaType) -> Result<Option<Resolved>> {
    let resolved = match ty {
        SchemaType::Object | SchemaType::Array => return Ok(None),
        SchemaType::Integer => Resolved::Scalar(ScalarType::Integer(IntegerFacets::from_node(node)?)),
        SchemaType::Number => Resolved::Scalar(ScalarType::Number(NumberFacets::from_node(node)?)),
        SchemaType::String => {
            if let Some(values) = text::enum_values(node)? {
                Resolved::Enum(values)
            } else if node.format()? == Some("date-time") {
                Resolved::Scalar(ScalarType::DateTime(DateTimeFacets::from_node(node)?))
            } else {
                Resolved::Scalar(ScalarType::String(StringFacets::from_node(node)?))
            }
        }
    };
    Ok(Some(resolved))
}
