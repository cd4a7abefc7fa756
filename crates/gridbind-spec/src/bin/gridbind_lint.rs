use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use gridbind_spec::{OverrideDocument, generate_schema_json_pretty};

/// Validate gridbind override documents.
#[derive(Debug, Parser)]
#[command(name = "gridbind-lint", version, about)]
struct Args {
    /// Print the JSON schema of override documents and exit.
    #[arg(long)]
    schema: bool,

    /// Override documents to check (`.yaml`, `.yml` or `.json`).
    #[arg(required_unless_present = "schema")]
    files: Vec<PathBuf>,
}

fn load(path: &Path) -> Result<OverrideDocument> {
    let text =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let doc = if is_json {
        OverrideDocument::from_json_str(&text)
            .with_context(|| format!("parsing {}", path.display()))?
    } else {
        OverrideDocument::from_yaml_str(&text)
            .with_context(|| format!("parsing {}", path.display()))?
    };
    Ok(doc)
}

fn main() -> ExitCode {
    let args = Args::parse();
    if args.schema {
        println!("{}", generate_schema_json_pretty());
        return ExitCode::SUCCESS;
    }

    let mut failed = false;
    for path in &args.files {
        match load(path) {
            Ok(doc) => match doc.validate() {
                Ok(()) => println!("ok: {}", path.display()),
                Err(err) => {
                    failed = true;
                    for issue in err.issues() {
                        eprintln!("{}: {}", path.display(), issue);
                    }
                }
            },
            Err(err) => {
                failed = true;
                eprintln!("{}: {err:#}", path.display());
            }
        }
    }

    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
