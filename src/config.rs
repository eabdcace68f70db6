//! Settings file support.
//!
//! `json-csgen.toml` in the working directory (or the file named by
//! `--config`) supplies output settings. Command-line flags override it.
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::codegen::EmitOptions;

/// Default configuration filename.
pub const CONFIG_FILENAME: &str = "json-csgen.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid TOML in {}: {message}", path.display())]
    InvalidToml { path: PathBuf, message: String },
}

#[derive(Debug, Default, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub output: OutputConfig,
}

#[derive(Debug, Default, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// Extra `using` directives.
    pub usings: Vec<String>,
    /// Converter for single enum properties; `{enum}` is the enum name.
    pub enum_converter: Option<String>,
    /// Converter for enum list properties; `{enum}` is the enum name.
    pub enum_array_converter: Option<String>,
}

/// Flag values that take precedence over the file.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub usings: Vec<String>,
    pub enum_converter: Option<String>,
    pub enum_array_converter: Option<String>,
}

impl Config {
    /// Load `explicit`, or the default file if it exists.
    ///
    /// A missing default file yields defaults; a missing explicit file is an error.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match explicit {
            Some(path) if !path.exists() => {
                return Err(ConfigError::NotFound {
                    path: path.to_path_buf(),
                });
            }
            Some(path) => path.to_path_buf(),
            None => {
                let path = PathBuf::from(CONFIG_FILENAME);
                if !path.exists() {
                    return Ok(Self::default());
                }
                path
            }
        };
        let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        Self::parse(&content, &path)
    }

    pub fn parse(content: &str, origin: &Path) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::InvalidToml {
            path: origin.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Apply command-line values. Repeated `--using` flags add to the file's list.
    pub fn merge(mut self, overrides: &Overrides) -> Self {
        for using in &overrides.usings {
            if !self.output.usings.contains(using) {
                self.output.usings.push(using.clone());
            }
        }
        if let Some(converter) = &overrides.enum_converter {
            self.output.enum_converter = Some(converter.clone());
        }
        if let Some(converter) = &overrides.enum_array_converter {
            self.output.enum_array_converter = Some(converter.clone());
        }
        self
    }

    pub fn emit_options(&self) -> EmitOptions {
        EmitOptions {
            usings: self.output.usings.clone(),
            enum_converter: self.output.enum_converter.clone(),
            enum_array_converter: self.output.enum_array_converter.clone(),
        }
    }
}
