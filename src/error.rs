//! Errors raised while turning a schema into C# definitions.
//!
//! Every variant is fatal to the current run. The CLI reports the message and
//! exits without leaving an output file behind.
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T, E = GenerateError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum GenerateError {
    /// A `$ref` target is missing, cyclic, or not an object.
    #[error("invalid reference \"{reference}\": {message}")]
    Reference { reference: String, message: String },

    /// A property or array items node has no determinable type.
    #[error("type of \"{property}\" is not specified")]
    MissingType { property: String },

    /// A generated class, enum or member has no usable identifier.
    #[error("{0}")]
    Naming(String),

    /// A `type` keyword outside object/number/integer/string/array.
    #[error("property \"{property}\" has unsupported type {ty}")]
    UnsupportedType { property: String, ty: String },

    /// A facet is present but has the wrong JSON shape.
    #[error("property \"{property}\" has an invalid \"{facet}\": {message}")]
    InvalidFacet {
        property: String,
        facet: &'static str,
        message: String,
    },

    /// A common definition does not fit the type it matched.
    #[error("common definition for signature \"{signature}\": {message}")]
    Override { signature: String, message: String },

    #[error("schema nesting exceeds {limit} levels at \"{property}\"")]
    TooDeep { property: String, limit: usize },

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {message}", path.display())]
    Json { path: PathBuf, message: String },
}

impl GenerateError {
    pub fn reference(reference: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Reference {
            reference: reference.into(),
            message: message.into(),
        }
    }

    pub fn missing_type(property: impl Into<String>) -> Self {
        Self::MissingType {
            property: property.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
