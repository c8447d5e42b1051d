use serde::Serialize;

use crate::cellref::to_a1;
use crate::grid::{CellValue, SheetGrid};

pub const DEFAULT_KEYWORDS: &[&str] = &[
    "Paid", "Seller", "Developer", "15%", "Refund", "Balance", "Premium", "Admin", "ADGM", "Agency",
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CellDump {
    pub row: usize,
    pub col: usize,
    pub cell: String,
    pub value: CellValue,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowDump {
    pub row: usize,
    pub cells: Vec<CellDump>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeywordHit {
    pub row: usize,
    pub col: usize,
    pub cell: String,
    pub keyword: String,
    pub text: String,
}

/// Non-blank cells of the first `max_rows` x `max_cols` block. Rows without
/// any such cell are skipped.
pub fn dump_rows<G: SheetGrid + ?Sized>(grid: &G, max_rows: usize, max_cols: usize) -> Vec<RowDump> {
    let mut out = Vec::new();
    for row in 0..grid.height().min(max_rows) {
        let cells: Vec<CellDump> = (0..max_cols)
            .filter_map(|col| {
                let value = grid.cell(row, col)?;
                (!value.is_blank()).then(|| CellDump {
                    row,
                    col,
                    cell: to_a1(row, col),
                    value: value.clone(),
                })
            })
            .collect();
        if !cells.is_empty() {
            out.push(RowDump { row, cells });
        }
    }
    out
}

// a cell matching several keywords is reported once, for the first
pub fn find_keywords<G: SheetGrid + ?Sized, S: AsRef<str>>(
    grid: &G,
    keywords: &[S],
    max_rows: usize,
    max_cols: usize,
) -> Vec<KeywordHit> {
    let lowered: Vec<(String, &str)> = keywords
        .iter()
        .map(|k| (k.as_ref().to_lowercase(), k.as_ref()))
        .filter(|(k, _)| !k.is_empty())
        .collect();
    let mut hits = Vec::new();
    for row in 0..grid.height().min(max_rows) {
        for col in 0..max_cols {
            let Some(value) = grid.cell(row, col) else {
                continue;
            };
            if value.is_blank() {
                continue;
            }
            let text = value.to_string();
            let haystack = text.to_lowercase();
            if let Some((_, keyword)) = lowered.iter().find(|(k, _)| haystack.contains(k.as_str())) {
                hits.push(KeywordHit {
                    row,
                    col,
                    cell: to_a1(row, col),
                    keyword: keyword.to_string(),
                    text,
                });
            }
        }
    }
    hits
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Grid;

    fn sheet() -> Grid {
        let mut g = Grid::new();
        g.set(0, 0, CellValue::Text("Project".into()));
        g.set(1, 4, CellValue::Text("Refund (30% of Original Price)".into()));
        g.set(1, 5, CellValue::Text("Paid to developer".into()));
        g.set(1, 6, CellValue::Number(0.3));
        g.set(3, 1, CellValue::Text("  ".into()));
        g.set(5, 4, CellValue::Text("ADGM (2% of Selling Price)".into()));
        g.set(30, 0, CellValue::Text("Agency".into()));
        g
    }

    #[test]
    fn dump_skips_blank_rows_and_cells() {
        let rows = dump_rows(&sheet(), 15, 15);
        let indices: Vec<_> = rows.iter().map(|r| r.row).collect();
        assert_eq!(indices, vec![0, 1, 5]);
        let second: Vec<_> = rows[1].cells.iter().map(|c| c.cell.as_str()).collect();
        assert_eq!(second, vec!["E2", "F2", "G2"]);
        assert_eq!(rows[1].cells[2].value, CellValue::Number(0.3));
    }

    #[test]
    fn dump_honours_column_limit() {
        let rows = dump_rows(&sheet(), 15, 5);
        assert_eq!(rows[1].cells.len(), 1);
    }

    #[test]
    fn keyword_hits() {
        let hits = find_keywords(&sheet(), DEFAULT_KEYWORDS, 20, 15);
        let found: Vec<_> = hits.iter().map(|h| (h.cell.as_str(), h.keyword.as_str())).collect();
        assert_eq!(found, vec![("E2", "Refund"), ("F2", "Paid"), ("E6", "ADGM")]);
    }

    #[test]
    fn keyword_search_is_case_insensitive() {
        let hits = find_keywords(&sheet(), &["agency", "project"], 40, 15);
        let found: Vec<_> = hits.iter().map(|h| (h.row, h.text.as_str())).collect();
        assert_eq!(found, vec![(0, "Project"), (30, "Agency")]);
    }
}
