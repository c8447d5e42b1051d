use std::ffi::OsString;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;

use super::{OutputFormat, SourceArgs};
use crate::cellref::to_a1;
use crate::grid::format_number;
use crate::mapper::{CellChange, CellMapper, ExtractedRecord};
use crate::workbook::XlsxCellWriter;

/// Rewrite fractional payment-plan percentages (0.1) as whole numbers (10)
/// in place.
#[derive(Debug, Parser)]
#[command(name = "offer_fixpct")]
struct Cli {
    #[command(flatten)]
    source: SourceArgs,

    /// Show the planned changes without saving the workbook
    #[arg(long)]
    dry_run: bool,

    #[arg(long, value_enum, default_value_t)]
    format: OutputFormat,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    changes: &'a [CellChange],
    #[serde(skip_serializing_if = "<[_]>::is_empty")]
    formula_cells: &'a [CellChange],
    persisted: bool,
    record: &'a ExtractedRecord,
}

pub fn describe_change(change: &CellChange) -> String {
    format!(
        "{} ({}): {} -> {}",
        to_a1(change.row, change.col),
        change.field,
        format_number(change.old),
        format_number(change.new)
    )
}

pub fn describe_formula_cell(change: &CellChange) -> String {
    format!(
        "{} ({}): holds a formula, left as is (value {})",
        to_a1(change.row, change.col),
        change.field,
        format_number(change.old)
    )
}

pub fn run(args: impl IntoIterator<Item = OsString>) -> Result<()> {
    let cli = Cli::parse_from(args);
    let layout = cli.source.layout()?;
    let loaded = cli.source.load()?;

    let mut writer = XlsxCellWriter::for_sheet(&loaded);
    let outcome = CellMapper::new(&layout).write_back(&loaded.grid, &mut writer, !cli.dry_run);

    match cli.format {
        OutputFormat::Json => {
            let report = JsonReport {
                changes: &outcome.changes,
                formula_cells: &outcome.formula_cells,
                persisted: outcome.persisted,
                record: &outcome.record,
            };
            let json = serde_json::to_string_pretty(&report).context("cannot serialize report")?;
            println!("{json}");
        }
        OutputFormat::Lines => {
            if outcome.changes.is_empty() {
                println!("No changes needed, percentages are already whole numbers");
            }
            for change in &outcome.changes {
                println!("{}", describe_change(change));
            }
            for change in &outcome.formula_cells {
                println!("{}", describe_formula_cell(change));
            }
            if outcome.persisted {
                println!("Saved {} change(s) to {}", outcome.changes.len(), writer.path().display());
            } else if cli.dry_run && !outcome.changes.is_empty() {
                println!("Dry run, {} not modified", writer.path().display());
            }
        }
    }

    match outcome.persist_error {
        Some(err) => Err(err).with_context(|| format!("cannot save {}", writer.path().display())),
        None => Ok(()),
    }
}
