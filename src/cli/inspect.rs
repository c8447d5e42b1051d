use std::ffi::OsString;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;

use super::OutputFormat;
use crate::inspect::{DEFAULT_KEYWORDS, KeywordHit, RowDump, dump_rows, find_keywords};
use crate::workbook::load_grid;

/// Dump the top-left block of a worksheet and find payment captions in it.
#[derive(Debug, Parser)]
#[command(name = "offer_inspect")]
struct Cli {
    /// Workbook to read (xlsx, xlsm, xls, ods)
    input: std::path::PathBuf,

    /// Worksheet name; defaults to the first sheet
    #[arg(long)]
    sheet: Option<String>,

    #[arg(long, default_value_t = 15)]
    rows: usize,

    #[arg(long, default_value_t = 15)]
    cols: usize,

    /// Caption to search for; repeatable. Defaults to the payment captions.
    #[arg(long = "keyword")]
    keywords: Vec<String>,

    #[arg(long, value_enum, default_value_t)]
    format: OutputFormat,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    rows: &'a [RowDump],
    hits: &'a [KeywordHit],
}

pub fn run(args: impl IntoIterator<Item = OsString>) -> Result<()> {
    let cli = Cli::parse_from(args);
    let loaded = load_grid(&cli.input, cli.sheet.as_deref())
        .with_context(|| format!("cannot read workbook: {}", cli.input.display()))?;

    let rows = dump_rows(&loaded.grid, cli.rows, cli.cols);
    let hits = if cli.keywords.is_empty() {
        find_keywords(&loaded.grid, DEFAULT_KEYWORDS, cli.rows.max(20), cli.cols)
    } else {
        find_keywords(&loaded.grid, &cli.keywords, cli.rows.max(20), cli.cols)
    };

    match cli.format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&JsonReport {
                rows: &rows,
                hits: &hits,
            })
            .context("cannot serialize dump")?;
            println!("{json}");
        }
        OutputFormat::Lines => {
            println!("# {} [{}]", loaded.path.display(), loaded.sheet);
            for row in &rows {
                println!("Row {}:", row.row);
                for cell in &row.cells {
                    println!("  [{}][{}] {} = {:?}", cell.row, cell.col, cell.cell, cell.value);
                }
            }
            println!("# captions");
            for hit in &hits {
                println!("{} [{}][{}] {:?} ({})", hit.cell, hit.row, hit.col, hit.text, hit.keyword);
            }
        }
    }
    Ok(())
}
