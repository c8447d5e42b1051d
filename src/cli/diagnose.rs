use std::ffi::OsString;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;

use super::{OutputFormat, SourceArgs};
use crate::report::{Discrepancy, diagnose, parse_expected};

/// Compare the offer workbook against its layout and, optionally, the
/// values the HTML pipeline extracted.
#[derive(Debug, Parser)]
#[command(name = "offer_diagnose")]
struct Cli {
    #[command(flatten)]
    source: SourceArgs,

    /// JSON object of expected field values (`null` = must be absent)
    #[arg(long)]
    expected: Option<PathBuf>,

    /// Exit with an error when any discrepancy is found
    #[arg(long)]
    strict: bool,

    #[arg(long, value_enum, default_value_t)]
    format: OutputFormat,
}

pub fn run(args: impl IntoIterator<Item = OsString>) -> Result<()> {
    let cli = Cli::parse_from(args);
    let layout = cli.source.layout()?;
    let loaded = cli.source.load()?;

    let expected = match &cli.expected {
        Some(path) => {
            let json = fs::read_to_string(path)
                .with_context(|| format!("cannot read expected values: {}", path.display()))?;
            Some(
                parse_expected(&json)
                    .with_context(|| format!("invalid expected values JSON: {}", path.display()))?,
            )
        }
        None => None,
    };

    let found: Vec<Discrepancy> = diagnose(&loaded.grid, &layout, expected.as_ref());

    match cli.format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&found).context("cannot serialize report")?;
            println!("{json}");
        }
        OutputFormat::Lines => {
            println!(
                "# {} [{}] layout {}: {} discrepancies",
                loaded.path.display(),
                loaded.sheet,
                layout.version,
                found.len()
            );
            for d in &found {
                println!("{d}");
            }
        }
    }

    if cli.strict && !found.is_empty() {
        bail!("{} discrepancies against layout {}", found.len(), layout.version);
    }
    Ok(())
}
