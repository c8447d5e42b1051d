use std::ffi::OsString;

use anyhow::{Context, Result};
use clap::Parser;

use super::{OutputFormat, SourceArgs};
use crate::layout::Layout;
use crate::mapper::{CellMapper, ExtractedRecord};

/// Print the fields a layout extracts from the offer workbook.
#[derive(Debug, Parser)]
#[command(name = "offer_extract")]
struct Cli {
    #[command(flatten)]
    source: SourceArgs,

    #[arg(long, value_enum, default_value_t)]
    format: OutputFormat,
}

pub fn render_lines(layout: &Layout, record: &ExtractedRecord) -> String {
    let mut out = String::new();
    for entry in &layout.fields {
        let value = record
            .get(&entry.field)
            .map_or_else(|| "-".to_string(), ToString::to_string);
        let flag = if record.is_unconvertible(&entry.field) {
            "  (unconvertible)"
        } else {
            ""
        };
        out.push_str(&format!("{} = {value}{flag}\n", entry.field));
    }
    out
}

pub fn run(args: impl IntoIterator<Item = OsString>) -> Result<()> {
    let cli = Cli::parse_from(args);
    let layout = cli.source.layout()?;
    let loaded = cli.source.load()?;

    let record = CellMapper::new(&layout).extract(&loaded.grid);

    match cli.format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&record).context("cannot serialize record")?;
            println!("{json}");
        }
        OutputFormat::Lines => {
            println!(
                "# {} [{}] layout {}",
                loaded.path.display(),
                loaded.sheet,
                layout.version
            );
            print!("{}", render_lines(&layout, &record));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{CellValue, Grid};
    use crate::layout::{FieldMapping, ValueKind};

    #[test]
    fn lines_follow_layout_order() {
        let layout = Layout::new(
            "t",
            vec![
                FieldMapping::new("b_pct", 0, 1, ValueKind::Percentage),
                FieldMapping::new("a_name", 0, 0, ValueKind::Text),
                FieldMapping::new("c_gone", 4, 0, ValueKind::Currency),
            ],
            Vec::new(),
        )
        .unwrap();
        let grid = Grid::from_rows(vec![vec![
            CellValue::Text(" Tower ".into()),
            CellValue::Text("n/a".into()),
        ]]);
        let record = CellMapper::new(&layout).extract(&grid);
        assert_eq!(
            render_lines(&layout, &record),
            "b_pct = n/a  (unconvertible)\na_name = Tower\nc_gone = -\n"
        );
    }

    #[test]
    fn parses_flags() {
        let cli = Cli::try_parse_from([
            "offer_extract",
            "Book1.xlsx",
            "--format",
            "json",
            "--layout-version",
            "sales-offer-v1",
        ])
        .unwrap();
        assert_eq!(cli.format, OutputFormat::Json);
        assert_eq!(cli.source.layout_version.as_deref(), Some("sales-offer-v1"));
        assert!(cli.source.sheet.is_none());
    }
}
