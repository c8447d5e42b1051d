pub mod cellref;
pub mod cli;
pub mod error;
pub mod grid;
pub mod inspect;
pub mod layout;
pub mod mapper;
pub mod normalize;
pub mod report;
pub mod workbook;

pub use error::{GridAccessError, LayoutError, PersistError};
pub use grid::{CellValue, Grid, SheetGrid};
pub use layout::{FieldMapping, LabelAnchor, Layout, LayoutRegistry, ValueKind};
pub use mapper::{
    CellChange, CellMapper, ExtractedRecord, FieldValue, GridWriter, WriteBack, WriteBackPlan,
};
