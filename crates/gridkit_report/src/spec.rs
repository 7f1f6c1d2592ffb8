//! Record, style and grouping specification models.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

////////////////////////////////////////////////////////////////////////////////
// #region RecordModel

/// One scalar (or nested) value held by a [`Record`] field.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(untagged)]
pub enum EnumRecordValue {
    /// Missing value.
    #[default]
    Null,
    /// Boolean value.
    Bool(bool),
    /// Numeric value.
    Number(f64),
    /// Text value.
    String(String),
    /// Date-time value.
    DateTime(NaiveDateTime),
    /// Nested object value.
    Object(BTreeMap<String, EnumRecordValue>),
}

/// One input data row keyed by column.
pub type Record = BTreeMap<String, EnumRecordValue>;

impl EnumRecordValue {
    /// Return the value kind used by [`SpecRecordSchema`].
    pub fn kind(&self) -> EnumValueKind {
        match self {
            Self::Null => EnumValueKind::Null,
            Self::Bool(_) => EnumValueKind::Bool,
            Self::Number(_) => EnumValueKind::Number,
            Self::String(_) => EnumValueKind::String,
            Self::DateTime(_) => EnumValueKind::DateTime,
            Self::Object(dict_fields) => {
                EnumValueKind::Object(SpecRecordSchema::infer_from_record(dict_fields))
            }
        }
    }

    /// Empty-string value used for blanked grouping cells.
    pub fn blank() -> Self {
        Self::String(String::new())
    }

    /// Whether value is `Null` or an empty string.
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Null => true,
            Self::String(s) => s.is_empty(),
            _ => false,
        }
    }
}

impl From<serde_json::Value> for EnumRecordValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(val) => Self::Bool(val),
            serde_json::Value::Number(val) => val.as_f64().map_or(Self::Null, Self::Number),
            serde_json::Value::String(val) => Self::String(val),
            serde_json::Value::Array(_) => Self::String(value.to_string()),
            serde_json::Value::Object(dict_fields) => Self::Object(
                dict_fields
                    .into_iter()
                    .map(|(key, val)| (key, Self::from(val)))
                    .collect(),
            ),
        }
    }
}

impl<'de> Deserialize<'de> for EnumRecordValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        serde_json::Value::deserialize(deserializer).map(Self::from)
    }
}

impl From<&str> for EnumRecordValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for EnumRecordValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<f64> for EnumRecordValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i64> for EnumRecordValue {
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

impl From<bool> for EnumRecordValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<NaiveDateTime> for EnumRecordValue {
    fn from(value: NaiveDateTime) -> Self {
        Self::DateTime(value)
    }
}

/// Convert a JSON array of objects into records.
///
/// Non-object array items are rejected.
pub fn derive_records_from_json(value: serde_json::Value) -> Result<Vec<Record>, String> {
    let serde_json::Value::Array(l_items) = value else {
        return Err("Expected a JSON array of objects.".to_string());
    };

    l_items
        .into_iter()
        .enumerate()
        .map(|(n_idx, item)| match EnumRecordValue::from(item) {
            EnumRecordValue::Object(record) => Ok(record),
            _ => Err(format!("Item at index {n_idx} is not a JSON object.")),
        })
        .collect()
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region RecordSchema

/// Value kind of one schema field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnumValueKind {
    /// Always-null field.
    Null,
    /// Boolean field.
    Bool,
    /// Numeric field.
    Number,
    /// Text field.
    String,
    /// Date-time field.
    DateTime,
    /// Nested object field.
    Object(SpecRecordSchema),
}

impl EnumValueKind {
    /// Zero value of this kind.
    ///
    /// Date-time fields have no meaningful zero and become `Null`.
    pub fn zero_value(&self) -> EnumRecordValue {
        match self {
            Self::Null | Self::DateTime => EnumRecordValue::Null,
            Self::Bool => EnumRecordValue::Bool(false),
            Self::Number => EnumRecordValue::Number(0.0),
            Self::String => EnumRecordValue::blank(),
            Self::Object(schema) => EnumRecordValue::Object(schema.derive_zero_record()),
        }
    }
}

/// One named schema field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecSchemaField {
    /// Column key.
    pub name: String,
    /// Declared value kind.
    pub kind: EnumValueKind,
}

/// Declared record shape, used to derive the subtotal zero-value template.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecRecordSchema {
    /// Ordered fields.
    pub fields: Vec<SpecSchemaField>,
}

impl SpecRecordSchema {
    /// Create schema from `(name, kind)` pairs.
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = (S, EnumValueKind)>,
        S: Into<String>,
    {
        Self {
            fields: fields
                .into_iter()
                .map(|(name, kind)| SpecSchemaField {
                    name: name.into(),
                    kind,
                })
                .collect(),
        }
    }

    /// Infer schema from one sample record.
    pub fn infer_from_record(record: &Record) -> Self {
        Self {
            fields: record
                .iter()
                .map(|(name, value)| SpecSchemaField {
                    name: name.clone(),
                    kind: value.kind(),
                })
                .collect(),
        }
    }

    /// Build a record holding the zero value of every field.
    pub fn derive_zero_record(&self) -> Record {
        self.fields
            .iter()
            .map(|field| (field.name.clone(), field.kind.zero_value()))
            .collect()
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region CellFormatSpecification

/// Cell visual-attribute bundle.
///
/// Every attribute is optional; unset attributes inherit from whatever the
/// bundle is merged onto.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SpecCellFormat {
    /// Font family name.
    pub font_name: Option<String>,
    /// Font size in points.
    pub font_size: Option<i64>,
    /// Bold style.
    pub bold: Option<bool>,
    /// Italic style.
    pub italic: Option<bool>,

    /// Horizontal alignment.
    pub align: Option<String>,
    /// Vertical alignment.
    pub valign: Option<String>,
    /// Border style for all sides.
    pub border: Option<i64>,
    /// Text wrap.
    pub text_wrap: Option<bool>,

    /// Top border override.
    pub top: Option<i64>,
    /// Bottom border override.
    pub bottom: Option<i64>,
    /// Left border override.
    pub left: Option<i64>,
    /// Right border override.
    pub right: Option<i64>,

    /// Number format code.
    pub num_format: Option<String>,
    /// Background fill color.
    pub bg_color: Option<String>,
    /// Font color.
    pub font_color: Option<String>,
}

impl SpecCellFormat {
    /// Return a new format by overlaying `patch` onto `self`.
    pub fn with_(&self, patch: SpecCellFormat) -> SpecCellFormat {
        self.merge(&patch)
    }

    /// Merge two formats with right-side non-`None` overwrite semantics.
    ///
    /// An all-sides `border` on the right side resets edge overrides on the
    /// left side, so that `top`/`bottom`/`left`/`right` never leak through a
    /// later full-border patch.
    pub fn merge(&self, other: &SpecCellFormat) -> SpecCellFormat {
        let if_reset_edges = other.border.is_some();
        let edge = |val_other: Option<i64>, val_self: Option<i64>| {
            if if_reset_edges {
                val_other
            } else {
                val_other.or(val_self)
            }
        };

        SpecCellFormat {
            font_name: other.font_name.clone().or_else(|| self.font_name.clone()),
            font_size: other.font_size.or(self.font_size),
            bold: other.bold.or(self.bold),
            italic: other.italic.or(self.italic),
            align: other.align.clone().or_else(|| self.align.clone()),
            valign: other.valign.clone().or_else(|| self.valign.clone()),
            border: other.border.or(self.border),
            text_wrap: other.text_wrap.or(self.text_wrap),
            top: edge(other.top, self.top),
            bottom: edge(other.bottom, self.bottom),
            left: edge(other.left, self.left),
            right: edge(other.right, self.right),
            num_format: other.num_format.clone().or_else(|| self.num_format.clone()),
            bg_color: other.bg_color.clone().or_else(|| self.bg_color.clone()),
            font_color: other.font_color.clone().or_else(|| self.font_color.clone()),
        }
    }
}

/// Border tuple for top/bottom/left/right.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecCellBorder {
    /// Top border style.
    pub top: i64,
    /// Bottom border style.
    pub bottom: i64,
    /// Left border style.
    pub left: i64,
    /// Right border style.
    pub right: i64,
}

impl SpecCellBorder {
    /// Convert to a format patch carrying only the four edges.
    pub fn to_format(&self) -> SpecCellFormat {
        SpecCellFormat {
            top: Some(self.top),
            bottom: Some(self.bottom),
            left: Some(self.left),
            right: Some(self.right),
            ..Default::default()
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region RowStyleSpecification

/// Style descriptor of one print row: a row-wide bundle plus per-column bundles.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecRowStyle {
    /// Bundle applied to every cell of the row.
    pub row: SpecCellFormat,
    /// Bundles applied to single columns, keyed by column key.
    pub by_col: BTreeMap<String, SpecCellFormat>,
}

impl SpecRowStyle {
    /// Row-wide style without column overrides.
    pub fn from_row(row: SpecCellFormat) -> Self {
        Self {
            row,
            by_col: BTreeMap::new(),
        }
    }

    /// Deep-merge `fmt` into the bundle of `column`.
    pub fn with_column(mut self, column: &str, fmt: &SpecCellFormat) -> Self {
        self.merge_column(column, fmt);
        self
    }

    /// In-place variant of [`Self::with_column`].
    pub fn merge_column(&mut self, column: &str, fmt: &SpecCellFormat) {
        let fmt_merged = match self.by_col.get(column) {
            Some(fmt_existing) => fmt_existing.merge(fmt),
            None => fmt.clone(),
        };
        self.by_col.insert(column.to_string(), fmt_merged);
    }

    /// Deep-merge two descriptors; `other` wins per attribute.
    pub fn merge(&self, other: &SpecRowStyle) -> SpecRowStyle {
        let mut style = SpecRowStyle {
            row: self.row.merge(&other.row),
            by_col: self.by_col.clone(),
        };
        for (column, fmt) in &other.by_col {
            style.merge_column(column, fmt);
        }
        style
    }

    /// Effective bundle of one cell: row bundle overlaid with column bundle.
    pub fn resolve_cell(&self, column: &str) -> SpecCellFormat {
        match self.by_col.get(column) {
            Some(fmt_col) => self.row.merge(fmt_col),
            None => self.row.clone(),
        }
    }
}

/// Style presets used by the grouped report builder and the sheet header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpecReportStyles {
    /// Fill of data rows with even stripe index.
    pub stripe_even: SpecCellFormat,
    /// Fill of data rows with odd stripe index.
    pub stripe_odd: SpecCellFormat,
    /// Row-wide bundle of subtotal rows.
    pub subtotal_row: SpecCellFormat,
    /// Grouping-column bundle of subtotal rows.
    pub subtotal_col: SpecCellFormat,
    /// Grouping-column emphasis applied at the outermost level.
    pub highlight_col: SpecCellFormat,
    /// Header cells.
    pub header: SpecCellFormat,
}

impl Default for SpecReportStyles {
    fn default() -> Self {
        crate::conf::derive_default_report_styles()
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region GroupSpecification

/// One grouping level declaration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SpecGroupSpec {
    /// Grouping column key.
    pub column: String,
    /// Subtotal row label; no subtotal row when absent or empty.
    #[serde(default)]
    pub title: Option<String>,
}

impl SpecGroupSpec {
    /// Grouping level with a subtotal row.
    pub fn titled(column: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            title: Some(title.into()),
        }
    }

    /// Grouping level without a subtotal row.
    pub fn untitled(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            title: None,
        }
    }

    /// Non-empty title, if any.
    pub fn derive_title(&self) -> Option<&str> {
        self.title.as_deref().filter(|title| !title.is_empty())
    }
}

/// Ordering of partitions at the innermost grouping level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnumGroupOrder {
    /// Each new partition block is prepended (last-seen partition first).
    #[default]
    Reversed,
    /// Partition blocks keep first-seen order.
    FirstSeen,
}

/// Builder options.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SpecBuildOptions {
    /// Partition ordering at the innermost level.
    pub rule_order: EnumGroupOrder,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region PrintRowSpecification

/// Origin of a print row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumPrintRowKind {
    /// Copy of one input record.
    Data,
    /// Synthesized subtotal row of a group at `level` (0 = outermost).
    Subtotal {
        /// Grouping level of the subtotal.
        level: usize,
    },
}

/// Record paired with its style descriptor, ready for sheet insertion.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecPrintRow {
    /// Row values.
    pub data: Record,
    /// Row style descriptor.
    pub style: SpecRowStyle,
    /// Row origin.
    pub kind: EnumPrintRowKind,
}

impl SpecPrintRow {
    /// Whether row was copied from an input record.
    pub fn is_data(&self) -> bool {
        self.kind == EnumPrintRowKind::Data
    }

    /// Value of `column`, `Null` when absent.
    pub fn value(&self, column: &str) -> &EnumRecordValue {
        const VALUE_NULL: &EnumRecordValue = &EnumRecordValue::Null;
        self.data.get(column).unwrap_or(VALUE_NULL)
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Errors

/// Grouping configuration errors, raised before any row is produced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReportError {
    /// A grouping column has no group spec with the same column.
    #[error("Group column {column:?} has no matching group spec.")]
    GroupSpecNotFound {
        /// Offending grouping column.
        column: String,
    },
    /// Group specs were given but no grouping columns.
    #[error("{n_specs} group spec(s) declared but no group columns given.")]
    MissingGroupColumns {
        /// Number of declared group specs.
        n_specs: usize,
    },
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
