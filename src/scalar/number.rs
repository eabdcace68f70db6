use ordered_float::OrderedFloat;
use serde_json::Value;

use crate::error::Result;
use crate::schema::SchemaNode;

const DECIMAL_MIN: &str = "-79228162514264337593543950335";
const DECIMAL_MAX: &str = "79228162514264337593543950335";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Bound<T> {
    pub value: T,
    pub exclusive: bool,
}

/// `integer` facets, already narrowed to an inclusive `int` range.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct IntegerFacets {
    pub minimum: Option<i32>,
    pub maximum: Option<i32>,
}

/// `number` facets, kept as written (C# `decimal` ranges support exclusivity).
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct NumberFacets {
    pub minimum: Option<Bound<OrderedFloat<f64>>>,
    pub maximum: Option<Bound<OrderedFloat<f64>>>,
    pub multiple_of: Option<OrderedFloat<f64>>,
}

impl IntegerFacets {
    pub fn from_node(node: &SchemaNode<'_>) -> Result<Self> {
        let minimum = read_bound(node, "minimum", "exclusiveMinimum", |limit, v| limit >= v)?
            .map(|b| if b.exclusive { b.value.floor() + 1.0 } else { b.value.ceil() })
            .map(|v| to_int(node, "minimum", v))
            .transpose()?;
        let maximum = read_bound(node, "maximum", "exclusiveMaximum", |limit, v| limit <= v)?
            .map(|b| if b.exclusive { b.value.ceil() - 1.0 } else { b.value.floor() })
            .map(|v| to_int(node, "maximum", v))
            .transpose()?;
        Ok(Self { minimum, maximum })
    }

    pub fn attributes(&self) -> Vec<String> {
        let fmt = |v: Option<i32>, fallback: &str| v.map(|v| v.to_string()).unwrap_or_else(|| fallback.to_string());
        match (self.minimum, self.maximum) {
            (None, None) => Vec::new(),
            (min, max) => vec![format!(
                "[Range({}, {})]",
                fmt(min, "int.MinValue"),
                fmt(max, "int.MaxValue")
            )],
        }
    }
}

impl NumberFacets {
    pub fn from_node(node: &SchemaNode<'_>) -> Result<Self> {
        let minimum = read_bound(node, "minimum", "exclusiveMinimum", |limit, v| limit >= v)?;
        let maximum = read_bound(node, "maximum", "exclusiveMaximum", |limit, v| limit <= v)?;
        let multiple_of = match node.number_facet("multipleOf")? {
            Some(m) if m <= 0.0 => return Err(node.invalid("multipleOf", "must be greater than 0")),
            other => other.map(OrderedFloat),
        };
        let ordered = |b: Bound<f64>| Bound { value: OrderedFloat(b.value), exclusive: b.exclusive };
        Ok(Self {
            minimum: minimum.map(ordered),
            maximum: maximum.map(ordered),
            multiple_of,
        })
    }

    pub fn attributes(&self) -> Vec<String> {
        if self.minimum.is_none() && self.maximum.is_none() {
            return Vec::new();
        }
        let text = |b: Option<Bound<OrderedFloat<f64>>>, fallback: &str| {
            b.map(|b| decimal_literal(b.value.0)).unwrap_or_else(|| fallback.to_string())
        };
        let mut out = format!(
            "[Range(typeof(decimal), \"{}\", \"{}\"",
            text(self.minimum, DECIMAL_MIN),
            text(self.maximum, DECIMAL_MAX)
        );
        if self.minimum.is_some_and(|b| b.exclusive) {
            out.push_str(", MinimumIsExclusive = true");
        }
        if self.maximum.is_some_and(|b| b.exclusive) {
            out.push_str(", MaximumIsExclusive = true");
        }
        out.push_str(")]");
        vec![out]
    }
}

/// Read an inclusive bound plus its exclusive sibling.
///
/// `exclusiveX` may be the draft-4 boolean flag or the draft-6 number. When
/// both a number and `X` are present the tighter one wins; `tighter(limit, v)`
/// says whether the exclusive `limit` is at least as tight as `v`.
fn read_bound(
    node: &SchemaNode<'_>,
    inclusive: &'static str,
    exclusive: &'static str,
    tighter: fn(f64, f64) -> bool,
) -> Result<Option<Bound<f64>>> {
    let value = node.number_facet(inclusive)?;
    match node.facet(exclusive) {
        None | Some(Value::Null) | Some(Value::Bool(false)) => Ok(value.map(|value| Bound { value, exclusive: false })),
        Some(Value::Bool(true)) => Ok(value.map(|value| Bound { value, exclusive: true })),
        Some(Value::Number(_)) => {
            let limit = node.number_facet(exclusive)?;
            Ok(match (limit, value) {
                (Some(limit), Some(v)) if !tighter(limit, v) => Some(Bound { value: v, exclusive: false }),
                (Some(limit), _) => Some(Bound { value: limit, exclusive: true }),
                (None, v) => v.map(|value| Bound { value, exclusive: false }),
            })
        }
        Some(other) => Err(node.invalid(exclusive, format!("expected a boolean or a number, found {other}"))),
    }
}

fn to_int(node: &SchemaNode<'_>, facet: &'static str, v: f64) -> Result<i32> {
    if v.is_finite() && v >= i32::MIN as f64 && v <= i32::MAX as f64 {
        Ok(v as i32)
    } else {
        Err(node.invalid(facet, format!("{v} is outside the range of int")))
    }
}

// Helper: prefer emitting integers when exact
pub fn decimal_literal(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n >= i64::MIN as f64 && n <= i64::MAX as f64 {
        (n as i64).to_string()
    } else {
        n.to_string()
    }
}
