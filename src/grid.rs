use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    #[default]
    Empty,
    Text(String),
    Number(f64),
}

impl CellValue {
    // whitespace-only text counts as blank
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            CellValue::Number(_) => false,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Text(s) => f.write_str(s),
            CellValue::Number(n) => write!(f, "{}", format_number(*n)),
        }
    }
}

pub fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 {
        format!("{n:.0}")
    } else {
        n.to_string()
    }
}

/// Row/column indexed read access, 0-based. `cell` is `None` outside the grid.
pub trait SheetGrid {
    fn height(&self) -> usize;
    fn width(&self) -> usize;
    fn cell(&self, row: usize, col: usize) -> Option<&CellValue>;
    /// True when the cell's value is the cached result of a formula.
    fn is_formula(&self, _row: usize, _col: usize) -> bool {
        false
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Grid {
    rows: Vec<Vec<CellValue>>,
    formulas: BTreeSet<(usize, usize)>,
}

impl Grid {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_rows(rows: Vec<Vec<CellValue>>) -> Self {
        Self {
            rows,
            formulas: BTreeSet::new(),
        }
    }

    pub fn mark_formula(&mut self, row: usize, col: usize) {
        self.formulas.insert((row, col));
    }

    pub fn set(&mut self, row: usize, col: usize, value: CellValue) {
        if self.rows.len() <= row {
            self.rows.resize_with(row + 1, Vec::new);
        }
        let cells = &mut self.rows[row];
        if cells.len() <= col {
            cells.resize(col + 1, CellValue::Empty);
        }
        cells[col] = value;
    }
}

impl SheetGrid for Grid {
    fn height(&self) -> usize {
        self.rows.len()
    }

    fn width(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    fn cell(&self, row: usize, col: usize) -> Option<&CellValue> {
        self.rows.get(row)?.get(col)
    }

    fn is_formula(&self, row: usize, col: usize) -> bool {
        self.formulas.contains(&(row, col))
    }
}
