use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::cellref::to_a1;
use crate::grid::SheetGrid;
use crate::layout::{Layout, ValueKind};
use crate::mapper::{CellMapper, FieldValue};

pub type ExpectedValues = BTreeMap<String, Option<FieldValue>>;

const NUMBER_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Discrepancy {
    Missing {
        field: String,
        cell: String,
    },
    LabelMismatch {
        field: String,
        cell: String,
        expected: String,
        found: Option<String>,
    },
    KindMismatch {
        field: String,
        expected: ValueKind,
        found: String,
    },
    Unconvertible {
        field: String,
        raw: String,
    },
    PercentOutOfRange {
        field: String,
        value: f64,
    },
    ValueMismatch {
        field: String,
        expected: Option<FieldValue>,
        actual: Option<FieldValue>,
    },
    UnexpectedField {
        field: String,
    },
}

impl Discrepancy {
    pub fn field(&self) -> &str {
        match self {
            Discrepancy::Missing { field, .. }
            | Discrepancy::LabelMismatch { field, .. }
            | Discrepancy::KindMismatch { field, .. }
            | Discrepancy::Unconvertible { field, .. }
            | Discrepancy::PercentOutOfRange { field, .. }
            | Discrepancy::ValueMismatch { field, .. }
            | Discrepancy::UnexpectedField { field } => field,
        }
    }
}

fn show(value: Option<&FieldValue>) -> String {
    value.map_or_else(|| "(absent)".to_string(), ToString::to_string)
}

impl fmt::Display for Discrepancy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Discrepancy::Missing { field, cell } => write!(f, "{field}: no value at {cell}"),
            Discrepancy::LabelMismatch {
                field,
                cell,
                expected,
                found,
            } => match found {
                Some(found) => write!(f, "{field}: label {cell} is {found:?}, expected it to contain {expected:?}"),
                None => write!(f, "{field}: label {cell} is empty, expected it to contain {expected:?}"),
            },
            Discrepancy::KindMismatch { field, expected, found } => {
                write!(f, "{field}: expected a {} value, found {found:?}", expected.as_str())
            }
            Discrepancy::Unconvertible { field, raw } => {
                write!(f, "{field}: percentage {raw:?} is not a number")
            }
            Discrepancy::PercentOutOfRange { field, value } => {
                write!(f, "{field}: percentage {value} is above 100")
            }
            Discrepancy::ValueMismatch {
                field,
                expected,
                actual,
            } => write!(
                f,
                "{field}: expected {}, got {}",
                show(expected.as_ref()),
                show(actual.as_ref())
            ),
            Discrepancy::UnexpectedField { field } => {
                write!(f, "{field}: expected value given but the layout has no such field")
            }
        }
    }
}

fn values_match(expected: Option<&FieldValue>, actual: Option<&FieldValue>) -> bool {
    match (expected, actual) {
        (None, None) => true,
        (Some(FieldValue::Number(a)), Some(FieldValue::Number(b))) => (a - b).abs() <= NUMBER_TOLERANCE,
        (Some(FieldValue::Text(a)), Some(FieldValue::Text(b))) => a.trim() == b.trim(),
        _ => false,
    }
}

/// Every discrepancy between the grid and the layout, in layout field order,
/// followed by expected values for fields the layout does not map.
pub fn diagnose<G: SheetGrid + ?Sized>(
    grid: &G,
    layout: &Layout,
    expected: Option<&ExpectedValues>,
) -> Vec<Discrepancy> {
    let record = CellMapper::new(layout).extract(grid);
    let mut out = Vec::new();

    for entry in &layout.fields {
        let field = entry.field.as_str();

        if let Some(label) = &entry.label {
            let found = grid
                .cell(entry.row, label.col)
                .filter(|c| !c.is_blank())
                .map(|c| c.to_string().trim().to_string());
            let matches = found
                .as_deref()
                .is_some_and(|text| text.to_lowercase().contains(&label.contains.to_lowercase()));
            if !matches {
                out.push(Discrepancy::LabelMismatch {
                    field: field.to_string(),
                    cell: to_a1(entry.row, label.col),
                    expected: label.contains.clone(),
                    found,
                });
            }
        }

        let value = record.get(field);
        match value {
            None => out.push(Discrepancy::Missing {
                field: field.to_string(),
                cell: to_a1(entry.row, entry.col),
            }),
            Some(FieldValue::Text(text)) if record.is_unconvertible(field) => {
                out.push(Discrepancy::Unconvertible {
                    field: field.to_string(),
                    raw: text.clone(),
                });
            }
            Some(FieldValue::Text(text)) if entry.kind == ValueKind::Currency => {
                out.push(Discrepancy::KindMismatch {
                    field: field.to_string(),
                    expected: entry.kind,
                    found: text.clone(),
                });
            }
            Some(FieldValue::Number(n)) if entry.kind == ValueKind::Percentage && *n > 100.0 => {
                out.push(Discrepancy::PercentOutOfRange {
                    field: field.to_string(),
                    value: *n,
                });
            }
            Some(_) => {}
        }

        if let Some(want) = expected.and_then(|e| e.get(field)) {
            if !values_match(want.as_ref(), value) {
                out.push(Discrepancy::ValueMismatch {
                    field: field.to_string(),
                    expected: want.clone(),
                    actual: value.cloned(),
                });
            }
        }
    }

    if let Some(expected) = expected {
        for name in expected.keys() {
            if !record.has_field(name) {
                out.push(Discrepancy::UnexpectedField { field: name.clone() });
            }
        }
    }

    out
}

pub fn parse_expected(json: &str) -> serde_json::Result<ExpectedValues> {
    serde_json::from_str(json)
}
