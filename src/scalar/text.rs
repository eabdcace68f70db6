use chrono::{DateTime, FixedOffset};
use serde_json::Value;

use crate::error::{GenerateError, Result};
use crate::schema::SchemaNode;

const DATE_TIME_MIN: &str = "0001-01-01T00:00:00+00:00";
const DATE_TIME_MAX: &str = "9999-12-31T23:59:59.9999999+00:00";

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct StringFacets {
    pub min_length: Option<u64>,
    pub max_length: Option<u64>,
}

/// `format: "date-time"` strings. Bounds are RFC 3339 instants.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct DateTimeFacets {
    pub minimum: Option<DateTime<FixedOffset>>,
    pub maximum: Option<DateTime<FixedOffset>>,
}

impl StringFacets {
    pub fn from_node(node: &SchemaNode<'_>) -> Result<Self> {
        Ok(Self {
            min_length: node.count_facet("minLength")?,
            max_length: node.count_facet("maxLength")?,
        })
    }

    pub fn attributes(&self) -> Vec<String> {
        match (self.min_length, self.max_length) {
            (Some(min), Some(max)) => vec![format!("[StringLength({max}, MinimumLength = {min})]")],
            (None, Some(max)) => vec![format!("[StringLength({max})]")],
            (Some(min), None) => vec![format!("[MinLength({min})]")],
            (None, None) => Vec::new(),
        }
    }
}

impl DateTimeFacets {
    pub fn from_node(node: &SchemaNode<'_>) -> Result<Self> {
        Ok(Self {
            minimum: date_time_facet(node, "minimum")?,
            maximum: date_time_facet(node, "maximum")?,
        })
    }

    pub fn attributes(&self) -> Vec<String> {
        if self.minimum.is_none() && self.maximum.is_none() {
            return Vec::new();
        }
        let text = |d: Option<DateTime<FixedOffset>>, fallback: &str| {
            d.map(|d| d.to_rfc3339()).unwrap_or_else(|| fallback.to_string())
        };
        vec![format!(
            "[Range(typeof(DateTimeOffset), \"{}\", \"{}\")]",
            text(self.minimum, DATE_TIME_MIN),
            text(self.maximum, DATE_TIME_MAX)
        )]
    }
}

fn date_time_facet(node: &SchemaNode<'_>, facet: &'static str) -> Result<Option<DateTime<FixedOffset>>> {
    match node.str_facet(facet)? {
        None => Ok(None),
        Some(s) => DateTime::parse_from_rfc3339(s)
            .map(Some)
            .map_err(|e| node.invalid(facet, format!("\"{s}\" is not an RFC 3339 date-time: {e}"))),
    }
}

/// Raw values of an inline `enum`, in source order.
///
/// `None` when the facet is absent or empty. Non-string values are an
/// unsupported type.
pub fn enum_values(node: &SchemaNode<'_>) -> Result<Option<Vec<String>>> {
    let Some(facet) = node.facet("enum") else {
        return Ok(None);
    };
    let Value::Array(xs) = facet else {
        return Err(node.invalid("enum", "expected an array"));
    };
    if xs.is_empty() {
        return Ok(None);
    }
    let mut values = Vec::<String>::with_capacity(xs.len());
    for x in xs {
        let Some(s) = x.as_str() else {
            return Err(GenerateError::UnsupportedType {
                property: node.key().to_string(),
                ty: format!("enum value {x}"),
            });
        };
        if values.iter().any(|v| v == s) {
            return Err(node.invalid("enum", format!("duplicate value \"{s}\"")));
        }
        values.push(s.to_string());
    }
    Ok(Some(values))
}
