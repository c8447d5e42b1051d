use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GridAccessError {
    #[error("cannot open workbook {}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: calamine::Error,
    },
    #[error("workbook {} has no worksheets", .path.display())]
    NoSheets { path: PathBuf },
    #[error("worksheet `{sheet}` not found in {}", .path.display())]
    MissingSheet { path: PathBuf, sheet: String },
    #[error("cannot read worksheet `{sheet}` in {}", .path.display())]
    Sheet {
        path: PathBuf,
        sheet: String,
        #[source]
        source: calamine::Error,
    },
}

/// A write-back could not be saved. The extracted record computed before the
/// write stays valid.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("cannot open {} for writing: {message}", .path.display())]
    Open { path: PathBuf, message: String },
    #[error("worksheet `{sheet}` not found in {}", .path.display())]
    MissingSheet { path: PathBuf, sheet: String },
    #[error("cell at row {row}, column {col} is outside the worksheet")]
    OutOfRange { row: usize, col: usize },
    #[error("cell at row {row}, column {col} holds a formula and is left as is")]
    FormulaCell { row: usize, col: usize },
    #[error("cannot save {}: {message}", .path.display())]
    Save { path: PathBuf, message: String },
}

#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("cannot read layout file {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid layout JSON in {origin}")]
    Parse {
        origin: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("layout version must not be empty")]
    EmptyVersion,
    #[error("layout `{0}` is defined more than once")]
    DuplicateVersion(String),
    #[error("layout `{version}` maps field `{field}` more than once")]
    DuplicateField { version: String, field: String },
    #[error("field `{field}` has invalid cell reference `{cell}`")]
    BadCell { field: String, cell: String },
    #[error("field `{field}` needs either `cell` or both `row` and `col`")]
    MissingPosition { field: String },
    #[error("label of field `{field}` needs `col` or `column`")]
    MissingLabelColumn { field: String },
    #[error("unknown layout version `{0}`")]
    UnknownVersion(String),
    #[error("layout `{version}` lists write-back field `{field}` which it does not map")]
    WriteBackUnknown { version: String, field: String },
    #[error("layout `{version}` lists write-back field `{field}` which is not a percentage")]
    WriteBackKind { version: String, field: String },
}
