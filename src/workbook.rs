use std::path::{Path, PathBuf};

use calamine::{Data, Reader, open_workbook_auto};
use chrono::{NaiveDate, NaiveDateTime, TimeDelta, Timelike};

use crate::cellref::to_a1;
use crate::error::{GridAccessError, PersistError};
use crate::grid::{CellValue, Grid};
use crate::mapper::{CellChange, GridWriter};

const MILLIS_PER_DAY: f64 = 86_400_000.0;

#[derive(Debug, Clone)]
pub struct LoadedSheet {
    pub path: PathBuf,
    pub sheet: String,
    pub grid: Grid,
}

// 1900 date system
fn excel_serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || serial < 0.0 {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let millis = (serial * MILLIS_PER_DAY).round() as i64;
    epoch.checked_add_signed(TimeDelta::try_milliseconds(millis)?)
}

fn format_serial_date(serial: f64) -> Option<String> {
    let dt = excel_serial_to_datetime(serial)?;
    if dt.num_seconds_from_midnight() == 0 {
        Some(dt.format("%Y-%m-%d").to_string())
    } else {
        Some(dt.format("%Y-%m-%d %H:%M:%S").to_string())
    }
}

fn data_to_cell(data: &Data) -> CellValue {
    match data {
        Data::Empty | Data::Error(_) => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Float(n) => CellValue::Number(*n),
        Data::Int(n) => CellValue::Number(*n as f64),
        Data::Bool(b) => CellValue::Text(b.to_string()),
        Data::DateTime(dt) => {
            let serial = dt.as_f64();
            match format_serial_date(serial) {
                Some(text) => CellValue::Text(text),
                None => CellValue::Number(serial),
            }
        }
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
    }
}

/// Cells keep their absolute positions: a used range starting at C3 has its
/// first value at row 2, column 2. Formula cells carry their cached values and
/// are marked in the grid.
pub fn load_grid(path: &Path, sheet: Option<&str>) -> Result<LoadedSheet, GridAccessError> {
    let mut workbook = open_workbook_auto(path).map_err(|source| GridAccessError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    let names = workbook.sheet_names();
    let sheet_name = match sheet {
        Some(wanted) => names
            .iter()
            .find(|n| n.as_str() == wanted)
            .cloned()
            .ok_or_else(|| GridAccessError::MissingSheet {
                path: path.to_path_buf(),
                sheet: wanted.to_string(),
            })?,
        None => names.first().cloned().ok_or_else(|| GridAccessError::NoSheets {
            path: path.to_path_buf(),
        })?,
    };

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|source| GridAccessError::Sheet {
            path: path.to_path_buf(),
            sheet: sheet_name.clone(),
            source,
        })?;

    let mut grid = Grid::new();
    if let Some((row0, col0)) = range.start() {
        for (row, col, data) in range.used_cells() {
            let value = data_to_cell(data);
            if value != CellValue::Empty {
                grid.set(row0 as usize + row, col0 as usize + col, value);
            }
        }
    }
    if let Ok(formulas) = workbook.worksheet_formula(&sheet_name) {
        if let Some((row0, col0)) = formulas.start() {
            for (row, col, formula) in formulas.used_cells() {
                if !formula.is_empty() {
                    grid.mark_formula(row0 as usize + row, col0 as usize + col);
                }
            }
        }
    }

    Ok(LoadedSheet {
        path: path.to_path_buf(),
        sheet: sheet_name,
        grid,
    })
}

/// Replaces only the value of each changed cell; styles, formulas and other
/// cells stay as they were.
#[derive(Debug, Clone)]
pub struct XlsxCellWriter {
    path: PathBuf,
    sheet: String,
}

impl XlsxCellWriter {
    pub fn new(path: impl Into<PathBuf>, sheet: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            sheet: sheet.into(),
        }
    }

    pub fn for_sheet(loaded: &LoadedSheet) -> Self {
        Self::new(&loaded.path, &loaded.sheet)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl GridWriter for XlsxCellWriter {
    fn write_cells(&mut self, changes: &[CellChange]) -> Result<(), PersistError> {
        let mut book = umya_spreadsheet::reader::xlsx::read(&self.path).map_err(|e| PersistError::Open {
            path: self.path.clone(),
            message: e.to_string(),
        })?;

        let sheet = book
            .get_sheet_by_name_mut(&self.sheet)
            .ok_or_else(|| PersistError::MissingSheet {
                path: self.path.clone(),
                sheet: self.sheet.clone(),
            })?;

        let mut targets = Vec::with_capacity(changes.len());
        for change in changes {
            if u32::try_from(change.row + 1).is_err() || u32::try_from(change.col + 1).is_err() {
                return Err(PersistError::OutOfRange {
                    row: change.row,
                    col: change.col,
                });
            }
            let addr = to_a1(change.row, change.col);
            // set_value_number would drop the formula
            if sheet.get_cell(addr.as_str()).is_some_and(|cell| cell.is_formula()) {
                return Err(PersistError::FormulaCell {
                    row: change.row,
                    col: change.col,
                });
            }
            targets.push((addr, change.new));
        }
        for (addr, value) in targets {
            sheet.get_cell_mut(addr.as_str()).set_value_number(value);
        }

        umya_spreadsheet::writer::xlsx::write(&book, &self.path).map_err(|e| PersistError::Save {
            path: self.path.clone(),
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serial_dates() {
        assert_eq!(format_serial_date(45_658.0).as_deref(), Some("2025-01-01"));
        assert_eq!(format_serial_date(45_658.5).as_deref(), Some("2025-01-01 12:00:00"));
        assert_eq!(format_serial_date(-1.0), None);
        assert_eq!(format_serial_date(f64::NAN), None);
    }

    #[test]
    fn data_conversion() {
        assert_eq!(data_to_cell(&Data::Int(7)), CellValue::Number(7.0));
        assert_eq!(data_to_cell(&Data::Float(0.1)), CellValue::Number(0.1));
        assert_eq!(data_to_cell(&Data::Bool(true)), CellValue::Text("true".into()));
        assert_eq!(data_to_cell(&Data::String(" x ".into())), CellValue::Text(" x ".into()));
        assert_eq!(data_to_cell(&Data::Empty), CellValue::Empty);
        assert_eq!(
            data_to_cell(&Data::DateTimeIso("2025-01-01T00:00:00".into())),
            CellValue::Text("2025-01-01T00:00:00".into())
        );
    }

    #[test]
    fn missing_file_is_grid_access_error() {
        let err = load_grid(Path::new("does/not/exist.xlsx"), None).unwrap_err();
        assert!(matches!(err, GridAccessError::Open { .. }));
        assert!(err.to_string().contains("exist.xlsx"));
    }
}
