use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::cellref::{parse_a1, parse_column};
use crate::error::LayoutError;

pub const DEFAULT_VERSION: &str = "sales-offer-v1";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Text,
    Currency,
    Percentage,
}

impl ValueKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ValueKind::Text => "text",
            ValueKind::Currency => "currency",
            ValueKind::Percentage => "percentage",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabelAnchor {
    pub col: usize,
    // case-insensitive substring
    pub contains: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldMapping {
    pub field: String,
    pub row: usize,
    pub col: usize,
    pub kind: ValueKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<LabelAnchor>,
}

impl FieldMapping {
    pub fn new(field: impl Into<String>, row: usize, col: usize, kind: ValueKind) -> Self {
        Self {
            field: field.into(),
            row,
            col,
            kind,
            label: None,
        }
    }

    pub fn with_label(mut self, col: usize, contains: impl Into<String>) -> Self {
        self.label = Some(LabelAnchor {
            col,
            contains: contains.into(),
        });
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    pub version: String,
    pub description: Option<String>,
    pub fields: Vec<FieldMapping>,
    /// Percentage fields the repair tool may rewrite in place.
    pub write_back: Vec<String>,
}

impl Layout {
    pub fn new(
        version: impl Into<String>,
        fields: Vec<FieldMapping>,
        write_back: Vec<String>,
    ) -> Result<Self, LayoutError> {
        let layout = Self {
            version: version.into(),
            description: None,
            fields,
            write_back,
        };
        layout.validate()?;
        Ok(layout)
    }

    pub fn validate(&self) -> Result<(), LayoutError> {
        if self.version.trim().is_empty() {
            return Err(LayoutError::EmptyVersion);
        }
        let mut seen = HashSet::new();
        for entry in &self.fields {
            if !seen.insert(entry.field.as_str()) {
                return Err(LayoutError::DuplicateField {
                    version: self.version.clone(),
                    field: entry.field.clone(),
                });
            }
        }
        for name in &self.write_back {
            match self.field(name) {
                None => {
                    return Err(LayoutError::WriteBackUnknown {
                        version: self.version.clone(),
                        field: name.clone(),
                    });
                }
                Some(entry) if entry.kind != ValueKind::Percentage => {
                    return Err(LayoutError::WriteBackKind {
                        version: self.version.clone(),
                        field: name.clone(),
                    });
                }
                Some(_) => {}
            }
        }
        Ok(())
    }

    pub fn field(&self, name: &str) -> Option<&FieldMapping> {
        self.fields.iter().find(|f| f.field == name)
    }

    pub fn write_back_fields(&self) -> impl Iterator<Item = &FieldMapping> {
        self.write_back.iter().filter_map(|name| self.field(name))
    }

    // Book1: details in C, initial payments in G with captions in E, plan in J..L
    pub fn sales_offer_v1() -> Self {
        use ValueKind::{Currency, Percentage, Text};

        let mut fields = vec![
            FieldMapping::new("project_name", 0, 2, Text),
            FieldMapping::new("unit_no", 1, 2, Text),
            FieldMapping::new("unit_type", 2, 2, Text),
            FieldMapping::new("unit_model", 3, 2, Text),
            FieldMapping::new("views", 4, 2, Text),
            FieldMapping::new("internal_area", 5, 2, Text),
            FieldMapping::new("balcony_area", 6, 2, Text),
            FieldMapping::new("total_area", 7, 2, Text),
            FieldMapping::new("original_price", 8, 2, Currency),
            FieldMapping::new("selling_price", 9, 2, Currency),
            FieldMapping::new("paid_to_developer", 1, 6, Percentage).with_label(4, "Refund"),
            FieldMapping::new("resale_top_up", 2, 6, Currency).with_label(4, "Balance"),
            FieldMapping::new("premium", 3, 6, Currency).with_label(4, "Premium"),
            FieldMapping::new("admin_fee", 4, 6, Percentage).with_label(4, "Admin"),
            FieldMapping::new("transfer_fee", 5, 6, Percentage).with_label(4, "ADGM"),
            FieldMapping::new("broker_fee", 6, 6, Percentage).with_label(4, "Agency"),
        ];
        let mut write_back = Vec::new();
        for (step, row) in (3..=6).enumerate() {
            let n = step + 1;
            fields.push(FieldMapping::new(format!("plan_{n}_milestone"), row, 9, Text));
            fields.push(FieldMapping::new(format!("plan_{n}_percent"), row, 10, Percentage));
            fields.push(FieldMapping::new(format!("plan_{n}_amount"), row, 11, Currency));
            write_back.push(format!("plan_{n}_percent"));
        }

        Self {
            version: DEFAULT_VERSION.to_string(),
            description: Some("Book1 sales offer, single sheet".to_string()),
            fields,
            write_back,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawLayoutFile {
    default: Option<String>,
    layouts: Vec<RawLayout>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawLayout {
    version: String,
    description: Option<String>,
    fields: Vec<RawField>,
    #[serde(default)]
    write_back: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawField {
    field: String,
    cell: Option<String>,
    row: Option<usize>,
    col: Option<usize>,
    kind: ValueKind,
    label: Option<RawLabel>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawLabel {
    col: Option<usize>,
    column: Option<String>,
    contains: String,
}

impl RawField {
    fn resolve(self) -> Result<FieldMapping, LayoutError> {
        let (row, col) = match (&self.cell, self.row, self.col) {
            (Some(cell), _, _) => parse_a1(cell).ok_or_else(|| LayoutError::BadCell {
                field: self.field.clone(),
                cell: cell.clone(),
            })?,
            (None, Some(row), Some(col)) => (row, col),
            _ => {
                return Err(LayoutError::MissingPosition { field: self.field });
            }
        };
        let label = match self.label {
            None => None,
            Some(raw) => {
                let col = match (raw.col, raw.column.as_deref()) {
                    (Some(col), _) => col,
                    (None, Some(letters)) => {
                        parse_column(letters).ok_or_else(|| LayoutError::BadCell {
                            field: self.field.clone(),
                            cell: letters.to_string(),
                        })?
                    }
                    (None, None) => {
                        return Err(LayoutError::MissingLabelColumn { field: self.field });
                    }
                };
                Some(LabelAnchor {
                    col,
                    contains: raw.contains,
                })
            }
        };
        Ok(FieldMapping {
            field: self.field,
            row,
            col,
            kind: self.kind,
            label,
        })
    }
}

impl RawLayout {
    fn resolve(self) -> Result<Layout, LayoutError> {
        let fields = self
            .fields
            .into_iter()
            .map(RawField::resolve)
            .collect::<Result<Vec<_>, _>>()?;
        let layout = Layout {
            version: self.version,
            description: self.description,
            fields,
            write_back: self.write_back,
        };
        layout.validate()?;
        Ok(layout)
    }
}

#[derive(Debug, Clone)]
pub struct LayoutRegistry {
    layouts: BTreeMap<String, Layout>,
    default: String,
}

impl Default for LayoutRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl LayoutRegistry {
    pub fn builtin() -> Self {
        let layout = Layout::sales_offer_v1();
        let mut layouts = BTreeMap::new();
        layouts.insert(layout.version.clone(), layout);
        Self {
            layouts,
            default: DEFAULT_VERSION.to_string(),
        }
    }

    pub fn insert(&mut self, layout: Layout) -> Result<(), LayoutError> {
        layout.validate()?;
        self.layouts.insert(layout.version.clone(), layout);
        Ok(())
    }

    pub fn from_json_str(json: &str, origin: &str) -> Result<Self, LayoutError> {
        let raw: RawLayoutFile = serde_json::from_str(json).map_err(|source| LayoutError::Parse {
            origin: origin.to_string(),
            source,
        })?;
        let mut registry = Self::builtin();
        let mut seen = HashSet::new();
        for raw_layout in raw.layouts {
            if !seen.insert(raw_layout.version.clone()) {
                return Err(LayoutError::DuplicateVersion(raw_layout.version));
            }
            registry.insert(raw_layout.resolve()?)?;
        }
        if let Some(default) = raw.default {
            if !registry.layouts.contains_key(&default) {
                return Err(LayoutError::UnknownVersion(default));
            }
            registry.default = default;
        }
        Ok(registry)
    }

    pub fn load(path: &Path) -> Result<Self, LayoutError> {
        let json = fs::read_to_string(path).map_err(|source| LayoutError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json, &path.display().to_string())
    }

    pub fn get(&self, version: &str) -> Result<&Layout, LayoutError> {
        self.layouts
            .get(version)
            .ok_or_else(|| LayoutError::UnknownVersion(version.to_string()))
    }

    /// `version` when given, otherwise the registry default.
    pub fn select(&self, version: Option<&str>) -> Result<&Layout, LayoutError> {
        self.get(version.unwrap_or(&self.default))
    }

    pub fn default_version(&self) -> &str {
        &self.default
    }

    pub fn versions(&self) -> impl Iterator<Item = &str> {
        self.layouts.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_layout_is_valid() {
        let layout = Layout::sales_offer_v1();
        layout.validate().unwrap();
        assert_eq!(layout.fields.len(), 16 + 12);

        let paid = layout.field("paid_to_developer").unwrap();
        assert_eq!((paid.row, paid.col, paid.kind), (1, 6, ValueKind::Percentage));
        assert_eq!(paid.label.as_ref().unwrap().col, 4);

        let admin = layout.field("admin_fee").unwrap();
        assert_eq!((admin.row, admin.col, admin.kind), (4, 6, ValueKind::Percentage));

        let written: Vec<_> = layout.write_back_fields().map(|f| (f.row, f.col)).collect();
        assert_eq!(written, vec![(3, 10), (4, 10), (5, 10), (6, 10)]);
    }

    #[test]
    fn duplicate_fields_are_rejected() {
        let err = Layout::new(
            "v",
            vec![
                FieldMapping::new("a", 0, 0, ValueKind::Text),
                FieldMapping::new("a", 1, 0, ValueKind::Text),
            ],
            Vec::new(),
        )
        .unwrap_err();
        assert!(matches!(err, LayoutError::DuplicateField { ref field, .. } if field == "a"));
    }

    #[test]
    fn write_back_must_name_percentage_fields() {
        let fields = vec![
            FieldMapping::new("price", 0, 0, ValueKind::Currency),
            FieldMapping::new("pct", 1, 0, ValueKind::Percentage),
        ];
        let err = Layout::new("v", fields.clone(), vec!["price".into()]).unwrap_err();
        assert!(matches!(err, LayoutError::WriteBackKind { .. }));
        let err = Layout::new("v", fields.clone(), vec!["nope".into()]).unwrap_err();
        assert!(matches!(err, LayoutError::WriteBackUnknown { .. }));
        Layout::new("v", fields, vec!["pct".into()]).unwrap();

        assert!(matches!(
            Layout::new(" ", Vec::new(), Vec::new()).unwrap_err(),
            LayoutError::EmptyVersion
        ));
    }

    #[test]
    fn json_layouts_extend_builtin() {
        let json = r#"{
            "default": "v2",
            "layouts": [{
                "version": "v2",
                "description": "moved payments down a row",
                "fields": [
                    { "field": "paid_to_developer", "cell": "G3", "kind": "percentage",
                      "label": { "column": "E", "contains": "Refund" } },
                    { "field": "project_name", "row": 0, "col": 2, "kind": "text" },
                    { "field": "broker_fee", "cell": "$G$8", "kind": "percentage",
                      "label": { "col": 4, "contains": "Agency" } }
                ],
                "write_back": ["paid_to_developer"]
            }]
        }"#;
        let registry = LayoutRegistry::from_json_str(json, "inline").unwrap();
        assert_eq!(registry.default_version(), "v2");
        assert_eq!(registry.versions().collect::<Vec<_>>(), vec![DEFAULT_VERSION, "v2"]);

        let layout = registry.select(None).unwrap();
        assert_eq!(layout.description.as_deref(), Some("moved payments down a row"));
        let paid = layout.field("paid_to_developer").unwrap();
        assert_eq!((paid.row, paid.col), (2, 6));
        assert_eq!(
            paid.label,
            Some(LabelAnchor {
                col: 4,
                contains: "Refund".into()
            })
        );
        assert_eq!(layout.field("broker_fee").unwrap().row, 7);
        assert_eq!(registry.select(Some(DEFAULT_VERSION)).unwrap().fields.len(), 28);
    }

    #[test]
    fn json_errors_name_the_problem() {
        let bad_cell = r#"{"layouts":[{"version":"x","fields":[{"field":"a","cell":"7G","kind":"text"}]}]}"#;
        assert!(matches!(
            LayoutRegistry::from_json_str(bad_cell, "t").unwrap_err(),
            LayoutError::BadCell { ref cell, .. } if cell == "7G"
        ));

        let no_pos = r#"{"layouts":[{"version":"x","fields":[{"field":"a","row":1,"kind":"text"}]}]}"#;
        assert!(matches!(
            LayoutRegistry::from_json_str(no_pos, "t").unwrap_err(),
            LayoutError::MissingPosition { .. }
        ));

        let bad_kind = r#"{"layouts":[{"version":"x","fields":[{"field":"a","cell":"A1","kind":"date"}]}]}"#;
        assert!(matches!(
            LayoutRegistry::from_json_str(bad_kind, "t").unwrap_err(),
            LayoutError::Parse { .. }
        ));

        let twice = r#"{"layouts":[{"version":"x","fields":[]},{"version":"x","fields":[]}]}"#;
        assert!(matches!(
            LayoutRegistry::from_json_str(twice, "t").unwrap_err(),
            LayoutError::DuplicateVersion(_)
        ));

        let missing_default = r#"{"default":"zz","layouts":[]}"#;
        assert!(matches!(
            LayoutRegistry::from_json_str(missing_default, "t").unwrap_err(),
            LayoutError::UnknownVersion(ref v) if v == "zz"
        ));

        assert!(matches!(
            LayoutRegistry::builtin().get("sales-offer-v0").unwrap_err(),
            LayoutError::UnknownVersion(_)
        ));
    }
}
