//! CLI: schema → (C# source | common-definitions skeleton)
use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::{Config, Overrides};
use crate::generate::Model;
use crate::writer::write_atomic;

static NAMESPACE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)*$").expect("valid regex"));

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// generate C# classes, structs and enums from a JSON Schema
#[derive(Parser, Debug)]
#[command(name = "json-csgen", version)]
pub struct CommandLineInterface {
    /// more logging (-v info, -vv debug); RUST_LOG wins when set
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// generate a C# source file from a schema
    Generate(GenerateOut),
    /// print a common-definitions skeleton for a schema
    Signatures(SignaturesOut),
}

#[derive(Args, Debug, Clone)]
struct OutputSettings {
    /// settings file (defaults to ./json-csgen.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// extra using directive; repeatable
    #[arg(long = "using", value_name = "NAMESPACE")]
    usings: Vec<String>,

    /// converter type for enum properties ({enum} expands to the enum name)
    #[arg(long)]
    enum_converter: Option<String>,

    /// converter type for enum list properties ({enum} expands to the enum name)
    #[arg(long)]
    enum_array_converter: Option<String>,
}

#[derive(clap::Parser, Debug)]
struct GenerateOut {
    /// input JSON Schema file
    schema: PathBuf,

    /// output .cs file
    output: PathBuf,

    /// C# namespace (defaults to the schema's directory name)
    namespace: Option<String>,

    #[command(flatten)]
    output_settings: OutputSettings,

    /// print the source to stdout instead of writing it
    #[arg(long)]
    dry_run: bool,

    /// debugging
    #[arg(long)]
    no_op: bool,
}

#[derive(clap::Parser, Debug)]
struct SignaturesOut {
    /// input JSON Schema file
    schema: PathBuf,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl OutputSettings {
    fn load(&self) -> anyhow::Result<Config> {
        let config = Config::load(self.config.as_deref()).context("failed to load configuration")?;
        Ok(config.merge(&Overrides {
            usings: self.usings.clone(),
            enum_converter: self.enum_converter.clone(),
            enum_array_converter: self.enum_array_converter.clone(),
        }))
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn verbosity(&self) -> u8 {
        self.verbose
    }

    pub fn run(&self) -> anyhow::Result<()> {
        match &self.cmd {
            Command::Generate(target) => {
                // debug path
                if target.no_op {
                    eprintln!("{self:#?}");
                    return Ok(());
                }
                if let Some(namespace) = &target.namespace {
                    if !NAMESPACE_RE.is_match(namespace) {
                        bail!("invalid namespace \"{namespace}\"");
                    }
                }
                let config = target.output_settings.load()?;

                // 1) build the type graph
                let model = Model::build(&target.schema)
                    .with_context(|| format!("failed to generate from {}", target.schema.display()))?;

                // 2) render
                let generated = model.render(target.namespace.as_deref(), &config.emit_options());
                for group in &generated.duplicates {
                    eprintln!(
                        "{} classes {} share signature {}",
                        "warning:".yellow().bold(),
                        group.names.join(", "),
                        group.signature
                    );
                }

                // 3) write
                if target.dry_run {
                    print!("{}", generated.source);
                    return Ok(());
                }
                write_atomic(&target.output, &generated.source)
                    .with_context(|| format!("failed to write {}", target.output.display()))?;
                let counts = generated.counts;
                eprintln!(
                    "{} {} ({} enums, {} structs, {} classes)",
                    "wrote".green().bold(),
                    target.output.display(),
                    counts.enums,
                    counts.values,
                    counts.classes
                );
                Ok(())
            }
            Command::Signatures(target) => {
                let model = Model::build(&target.schema)
                    .with_context(|| format!("failed to read {}", target.schema.display()))?;
                let skeleton = serde_json::to_string_pretty(&model.common_skeleton())?;
                match &target.out {
                    Some(out) => write_atomic(out, &format!("{skeleton}\n"))
                        .with_context(|| format!("failed to write {}", out.display()))?,
                    None => println!("{skeleton}"),
                }
                Ok(())
            }
        }
    }
}
