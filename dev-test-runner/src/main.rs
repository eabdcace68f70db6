//! Regenerate every schema under a directory twice and compare.
//!
//! usage: dev-test-runner [DIR]   (defaults to ./fixtures)
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use colored::Colorize;
use json_csgen::{EmitOptions, generate};

fn schema_files(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    for entry in std::fs::read_dir(dir).with_context(|| format!("cannot list {}", dir.display()))? {
        let path = entry?.path();
        if path.is_dir() {
            out.extend(schema_files(&path)?);
            continue;
        }
        let name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
        if name.ends_with(".json") && !name.ends_with(".Common.json") {
            out.push(path);
        }
    }
    out.sort();
    Ok(out)
}

/// Ok(true) when both runs agree. Duplicate groups are reported, not failed.
fn check(path: &Path, options: &EmitOptions) -> anyhow::Result<bool> {
    let first = generate(path, None, options)?;
    let second = generate(path, None, options)?;
    if first.source != second.source {
        eprintln!("    {} output differs between runs", "✗".red());
        return Ok(false);
    }
    for group in &first.duplicates {
        eprintln!(
            "    {} {} share {}",
            "duplicate:".yellow(),
            group.names.join(", "),
            group.signature
        );
    }
    let c = first.counts;
    eprintln!(
        "    {} enums, {} structs, {} classes, {} bytes",
        c.enums,
        c.values,
        c.classes,
        first.source.len()
    );
    Ok(true)
}

fn main() -> ExitCode {
    let dir = std::env::args().nth(1).map(PathBuf::from).unwrap_or_else(|| PathBuf::from("fixtures"));
    let files = match schema_files(&dir) {
        Ok(files) => files,
        Err(error) => {
            eprintln!("{} {error:#}", "error:".red().bold());
            return ExitCode::FAILURE;
        }
    };
    let options = EmitOptions::default();
    let mut failed = 0usize;
    for path in &files {
        eprintln!("{} {}", "▶".cyan(), path.display());
        match check(path, &options) {
            Ok(true) => eprintln!("    {}", "✓ ok".green()),
            Ok(false) => failed += 1,
            Err(error) => {
                eprintln!("    {} {error:#}", "✗".red());
                failed += 1;
            }
        }
    }
    eprintln!("{} schemas, {} failed", files.len(), failed);
    if failed == 0 { ExitCode::SUCCESS } else { ExitCode::FAILURE }
}
