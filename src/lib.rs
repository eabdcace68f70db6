//! JSON Schema → C# type definitions.
//!
//! ```no_run
//! use json_csgen::{EmitOptions, generate};
//!
//! let out = generate("schemas/pet.json".as_ref(), Some("Zoo"), &EmitOptions::default())?;
//! std::fs::write("Pet.cs", out.source)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
pub mod cli;
pub mod codegen;
pub mod config;
pub mod error;
pub mod generate;
pub mod ir;
pub mod lower;
pub mod naming;
pub mod overrides;
pub mod path_de;
pub mod reference;
pub mod registry;
pub mod scalar;
pub mod schema;
pub mod writer;

pub use codegen::EmitOptions;
pub use error::{GenerateError, Result};
pub use generate::{Generated, Model, generate};
pub use registry::{Counts, DuplicateGroup};
