use std::collections::BTreeSet;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::error::PersistError;
use crate::grid::{CellValue, Grid, SheetGrid, format_number};
use crate::layout::{FieldMapping, Layout, ValueKind};
use crate::normalize::{normalize_percentage, percentage_number};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
}

impl FieldValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            FieldValue::Text(_) => None,
        }
    }
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldValue::Number(n) => f.write_str(&format_number(*n)),
            FieldValue::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Mapped {
    Absent,
    Value(FieldValue),
    // percentage text that is not a number, passed through trimmed
    Unconvertible(String),
}

/// Every field of the layout in layout order, present or not.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExtractedRecord {
    #[serde(serialize_with = "serialize_in_order")]
    fields: Vec<(String, Option<FieldValue>)>,
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    unconvertible: BTreeSet<String>,
}

fn serialize_in_order<S: Serializer>(
    fields: &[(String, Option<FieldValue>)],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(fields.len()))?;
    for (name, value) in fields {
        map.serialize_entry(name, value)?;
    }
    map.end()
}

impl ExtractedRecord {
    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .and_then(|(_, value)| value.as_ref())
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.fields.iter().any(|(name, _)| name == field)
    }

    pub fn is_unconvertible(&self, field: &str) -> bool {
        self.unconvertible.contains(field)
    }

    pub fn unconvertible(&self) -> impl Iterator<Item = &str> {
        self.unconvertible.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CellChange {
    pub field: String,
    pub row: usize,
    pub col: usize,
    pub old: f64,
    pub new: f64,
}

impl CellChange {
    pub fn new(field: impl Into<String>, row: usize, col: usize, old: f64, new: f64) -> Self {
        Self {
            field: field.into(),
            row,
            col,
            old,
            new,
        }
    }
}

/// Persists cell changes into the source the grid was read from. Cells not
/// named by a change, and cells holding formulas, must be left as they are.
pub trait GridWriter {
    fn write_cells(&mut self, changes: &[CellChange]) -> Result<(), PersistError>;
}

impl GridWriter for Grid {
    fn write_cells(&mut self, changes: &[CellChange]) -> Result<(), PersistError> {
        if let Some(change) = changes.iter().find(|c| self.is_formula(c.row, c.col)) {
            return Err(PersistError::FormulaCell {
                row: change.row,
                col: change.col,
            });
        }
        for change in changes {
            self.set(change.row, change.col, CellValue::Number(change.new));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteBackPlan {
    pub changes: Vec<CellChange>,
    /// Formula cells whose cached value is a fraction. Reported, never written.
    pub formula_cells: Vec<CellChange>,
}

/// `record` and the plan stay valid even when `persist_error` is set.
#[derive(Debug)]
pub struct WriteBack {
    pub record: ExtractedRecord,
    pub changes: Vec<CellChange>,
    pub formula_cells: Vec<CellChange>,
    pub persisted: bool,
    pub persist_error: Option<PersistError>,
}

pub fn map_entry<G: SheetGrid + ?Sized>(grid: &G, entry: &FieldMapping) -> Mapped {
    let Some(cell) = grid.cell(entry.row, entry.col) else {
        return Mapped::Absent;
    };
    if cell.is_blank() {
        return Mapped::Absent;
    }
    match entry.kind {
        ValueKind::Percentage => match percentage_number(cell) {
            Some(n) => Mapped::Value(FieldValue::Number(normalize_percentage(n))),
            None => Mapped::Unconvertible(cell.to_string().trim().to_string()),
        },
        ValueKind::Text | ValueKind::Currency => match cell {
            CellValue::Number(n) => Mapped::Value(FieldValue::Number(*n)),
            CellValue::Text(s) => Mapped::Value(FieldValue::Text(s.trim().to_string())),
            CellValue::Empty => Mapped::Absent,
        },
    }
}

pub struct CellMapper<'a> {
    layout: &'a Layout,
}

impl<'a> CellMapper<'a> {
    pub fn new(layout: &'a Layout) -> Self {
        Self { layout }
    }

    pub fn extract<G: SheetGrid + ?Sized>(&self, grid: &G) -> ExtractedRecord {
        let mut record = ExtractedRecord::default();
        for entry in &self.layout.fields {
            // first entry wins on unvalidated layouts
            if record.has_field(&entry.field) {
                continue;
            }
            let value = match map_entry(grid, entry) {
                Mapped::Absent => None,
                Mapped::Value(v) => Some(v),
                Mapped::Unconvertible(text) => {
                    record.unconvertible.insert(entry.field.clone());
                    Some(FieldValue::Text(text))
                }
            };
            record.fields.push((entry.field.clone(), value));
        }
        record
    }

    pub fn plan_write_back<G: SheetGrid + ?Sized>(&self, grid: &G) -> WriteBackPlan {
        let mut plan = WriteBackPlan::default();
        for entry in self.layout.write_back_fields() {
            let Some(old) = grid.cell(entry.row, entry.col).and_then(percentage_number) else {
                continue;
            };
            let new = normalize_percentage(old);
            if new == old {
                continue;
            }
            let change = CellChange::new(entry.field.clone(), entry.row, entry.col, old, new);
            if grid.is_formula(entry.row, entry.col) {
                plan.formula_cells.push(change);
            } else {
                plan.changes.push(change);
            }
        }
        plan
    }

    pub fn write_back<G, W>(&self, grid: &G, writer: &mut W, persist: bool) -> WriteBack
    where
        G: SheetGrid + ?Sized,
        W: GridWriter + ?Sized,
    {
        let record = self.extract(grid);
        let plan = self.plan_write_back(grid);
        let mut outcome = WriteBack {
            record,
            changes: plan.changes,
            formula_cells: plan.formula_cells,
            persisted: false,
            persist_error: None,
        };
        if persist && !outcome.changes.is_empty() {
            match writer.write_cells(&outcome.changes) {
                Ok(()) => outcome.persisted = true,
                Err(err) => outcome.persist_error = Some(err),
            }
        }
        outcome
    }
}
