//! Mapping directives.
//!
//! Each directive kind is a plain serde struct whose `Default` carries the
//! kind's declared attribute defaults. Overrides are synthesized by
//! serializing a base directive, overlaying the override attributes and
//! deserializing again, so every attribute always has a value.

use gridbind_common::Coord;
use gridbind_spec::DirectiveKind;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Sheet a class maps to (class level).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SheetDirective {
    pub name: String,
}

impl SheetDirective {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Single cell at a fixed position. `address` wins over `row`/`column`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CellDirective {
    pub row: Option<u32>,
    pub column: Option<u32>,
    pub address: Option<String>,
}

impl CellDirective {
    /// 0-based row and column.
    pub fn new(row: u32, column: u32) -> Self {
        Self {
            row: Some(row),
            column: Some(column),
            address: None,
        }
    }

    /// A1-style address.
    pub fn at(address: impl Into<String>) -> Self {
        Self {
            address: Some(address.into()),
            ..Self::default()
        }
    }

    pub fn coord(&self) -> Result<Coord, String> {
        if let Some(address) = &self.address {
            return Coord::parse_a1(address).map_err(|e| e.to_string());
        }
        match (self.row, self.column) {
            (Some(row), Some(col)) => Coord::try_new(row, col).map_err(|e| e.to_string()),
            _ => Err("cell needs `address` or both `row` and `column`".to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelDirection {
    #[default]
    Right,
    Left,
    Bottom,
}

/// Value cell found next to a label.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LabelledCellDirective {
    pub label: String,
    pub direction: LabelDirection,
    /// Cells skipped between the label and the value.
    pub skip: u32,
    pub optional: bool,
}

impl LabelledCellDirective {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }

    pub fn direction(mut self, direction: LabelDirection) -> Self {
        self.direction = direction;
        self
    }

    pub fn skip(mut self, skip: u32) -> Self {
        self.skip = skip;
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }
}

/// Where a record table's data rows end.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Terminal {
    /// First row whose key column is blank.
    #[default]
    Empty,
    /// First row whose key column has no border.
    Border,
}

/// Save policy when the collection has more elements than the table has rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverRecord {
    #[default]
    Break,
    Insert,
    Error,
}

/// Save policy when the table has more rows than the collection has elements.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemainedRecord {
    #[default]
    None,
    Clear,
    Delete,
}

/// Horizontal record table: a header row followed by one data row per element.
///
/// The header anchor comes from a `table_label` search offset by `bottom`
/// rows; without a label, from `header_address`, then `header_row` +
/// `header_column`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RecordsDirective {
    pub optional: bool,
    pub table_label: Option<String>,
    pub terminate_label: Option<String>,
    pub header_row: Option<u32>,
    pub header_column: Option<u32>,
    pub header_address: Option<String>,
    pub terminal: Terminal,
    /// Empty header columns looked past before the header is considered finished.
    pub range: u32,
    /// Row offset from a found table label to the header row.
    pub bottom: u32,
    /// Maximum number of header columns, 0 for unlimited.
    pub header_limit: u32,
    pub over_record: OverRecord,
    pub remained_record: RemainedRecord,
}

impl Default for RecordsDirective {
    fn default() -> Self {
        Self {
            optional: false,
            table_label: None,
            terminate_label: None,
            header_row: None,
            header_column: None,
            header_address: None,
            terminal: Terminal::Empty,
            range: 1,
            bottom: 1,
            header_limit: 0,
            over_record: OverRecord::Break,
            remained_record: RemainedRecord::None,
        }
    }
}

impl RecordsDirective {
    /// Table whose header row sits `bottom` rows under a label cell.
    pub fn labelled(label: impl Into<String>) -> Self {
        Self {
            table_label: Some(label.into()),
            ..Self::default()
        }
    }

    /// Table whose header starts at an A1 address.
    pub fn at(address: impl Into<String>) -> Self {
        Self {
            header_address: Some(address.into()),
            ..Self::default()
        }
    }

    pub fn terminal(mut self, terminal: Terminal) -> Self {
        self.terminal = terminal;
        self
    }

    pub fn terminate_label(mut self, label: impl Into<String>) -> Self {
        self.terminate_label = Some(label.into());
        self
    }

    pub fn range(mut self, range: u32) -> Self {
        self.range = range;
        self
    }

    pub fn bottom(mut self, bottom: u32) -> Self {
        self.bottom = bottom;
        self
    }

    pub fn header_limit(mut self, limit: u32) -> Self {
        self.header_limit = limit;
        self
    }

    pub fn over_record(mut self, policy: OverRecord) -> Self {
        self.over_record = policy;
        self
    }

    pub fn remained_record(mut self, policy: RemainedRecord) -> Self {
        self.remained_record = policy;
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Explicit header anchor, if any. Only consulted when there is no `table_label`.
    pub fn explicit_anchor(&self) -> Result<Option<Coord>, String> {
        if let Some(address) = &self.header_address {
            return Coord::parse_a1(address)
                .map(Some)
                .map_err(|e| e.to_string());
        }
        match (self.header_row, self.header_column) {
            (Some(row), Some(col)) => Coord::try_new(row, col)
                .map(Some)
                .map_err(|e| e.to_string()),
            (None, None) => Ok(None),
            _ => Err("`header_row` and `header_column` must be given together".to_string()),
        }
    }
}

/// Header column of a record table, placed on a record element field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColumnDirective {
    pub label: String,
    pub optional: bool,
}

impl ColumnDirective {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            optional: false,
        }
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }
}

/// Processing-order hint. Negative means unhinted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HintDirective {
    pub order: i32,
}

impl Default for HintDirective {
    fn default() -> Self {
        Self { order: -1 }
    }
}

impl HintDirective {
    pub fn order(order: i32) -> Self {
        Self { order }
    }
}

/// Per-field conversion options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConverterDirective {
    /// Name of a converter registered with `ConverterRegistry::register_named`.
    pub converter: Option<String>,
    /// Parsed in place of an empty cell.
    pub default_value: Option<String>,
    pub trim: bool,
    pub mandatory: bool,
    pub wrap_text: bool,
    pub shrink_to_fit: bool,
}

impl Default for ConverterDirective {
    fn default() -> Self {
        Self {
            converter: None,
            default_value: None,
            trim: true,
            mandatory: false,
            wrap_text: false,
            shrink_to_fit: false,
        }
    }
}

impl ConverterDirective {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            converter: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn default_value(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn mandatory(mut self) -> Self {
        self.mandatory = true;
        self
    }

    pub fn no_trim(mut self) -> Self {
        self.trim = false;
        self
    }

    pub fn wrap_text(mut self) -> Self {
        self.wrap_text = true;
        self
    }

    pub fn shrink_to_fit(mut self) -> Self {
        self.shrink_to_fit = true;
        self
    }
}

/// Split/join options for list, set and map fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ArrayDirective {
    pub separator: String,
    pub ignore_empty_item: bool,
}

impl Default for ArrayDirective {
    fn default() -> Self {
        Self {
            separator: ",".to_string(),
            ignore_empty_item: false,
        }
    }
}

impl ArrayDirective {
    pub fn separator(separator: impl Into<String>) -> Self {
        Self {
            separator: separator.into(),
            ..Self::default()
        }
    }

    pub fn ignore_empty_item(mut self) -> Self {
        self.ignore_empty_item = true;
        self
    }
}

/// One directive of any kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Directive {
    Sheet(SheetDirective),
    Cell(CellDirective),
    LabelledCell(LabelledCellDirective),
    Records(RecordsDirective),
    Column(ColumnDirective),
    Hint(HintDirective),
    Converter(ConverterDirective),
    Array(ArrayDirective),
}

impl Directive {
    pub fn kind(&self) -> DirectiveKind {
        match self {
            Directive::Sheet(_) => DirectiveKind::Sheet,
            Directive::Cell(_) => DirectiveKind::Cell,
            Directive::LabelledCell(_) => DirectiveKind::LabelledCell,
            Directive::Records(_) => DirectiveKind::HorizontalRecords,
            Directive::Column(_) => DirectiveKind::Column,
            Directive::Hint(_) => DirectiveKind::Hint,
            Directive::Converter(_) => DirectiveKind::Converter,
            Directive::Array(_) => DirectiveKind::ArrayConverter,
        }
    }

    /// The kind's declared defaults.
    pub fn defaults(kind: DirectiveKind) -> Self {
        match kind {
            DirectiveKind::Sheet => Directive::Sheet(SheetDirective::default()),
            DirectiveKind::Cell => Directive::Cell(CellDirective::default()),
            DirectiveKind::LabelledCell => Directive::LabelledCell(LabelledCellDirective::default()),
            DirectiveKind::HorizontalRecords => Directive::Records(RecordsDirective::default()),
            DirectiveKind::Column => Directive::Column(ColumnDirective::default()),
            DirectiveKind::Hint => Directive::Hint(HintDirective::default()),
            DirectiveKind::Converter => Directive::Converter(ConverterDirective::default()),
            DirectiveKind::ArrayConverter => Directive::Array(ArrayDirective::default()),
        }
    }

    /// Attributes as a JSON object.
    pub fn attributes(&self) -> Result<JsonValue, serde_json::Error> {
        match self {
            Directive::Sheet(d) => serde_json::to_value(d),
            Directive::Cell(d) => serde_json::to_value(d),
            Directive::LabelledCell(d) => serde_json::to_value(d),
            Directive::Records(d) => serde_json::to_value(d),
            Directive::Column(d) => serde_json::to_value(d),
            Directive::Hint(d) => serde_json::to_value(d),
            Directive::Converter(d) => serde_json::to_value(d),
            Directive::Array(d) => serde_json::to_value(d),
        }
    }

    /// Rebuild a directive of `kind` from a full attribute object.
    pub fn from_attributes(kind: DirectiveKind, attributes: JsonValue) -> Result<Self, serde_json::Error> {
        Ok(match kind {
            DirectiveKind::Sheet => Directive::Sheet(serde_json::from_value(attributes)?),
            DirectiveKind::Cell => Directive::Cell(serde_json::from_value(attributes)?),
            DirectiveKind::LabelledCell => Directive::LabelledCell(serde_json::from_value(attributes)?),
            DirectiveKind::HorizontalRecords => Directive::Records(serde_json::from_value(attributes)?),
            DirectiveKind::Column => Directive::Column(serde_json::from_value(attributes)?),
            DirectiveKind::Hint => Directive::Hint(serde_json::from_value(attributes)?),
            DirectiveKind::Converter => Directive::Converter(serde_json::from_value(attributes)?),
            DirectiveKind::ArrayConverter => Directive::Array(serde_json::from_value(attributes)?),
        })
    }
}

macro_rules! into_directive {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Directive {
                fn from(d: $ty) -> Self {
                    Directive::$variant(d)
                }
            }
        )*
    };
}

into_directive! {
    SheetDirective => Sheet,
    CellDirective => Cell,
    LabelledCellDirective => LabelledCell,
    RecordsDirective => Records,
    ColumnDirective => Column,
    HintDirective => Hint,
    ConverterDirective => Converter,
    ArrayDirective => Array,
}

/// Effective directives of one class or member, at most one per kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Directives {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sheet: Option<SheetDirective>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cell: Option<CellDirective>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labelled_cell: Option<LabelledCellDirective>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub horizontal_records: Option<RecordsDirective>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<ColumnDirective>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<HintDirective>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub converter: Option<ConverterDirective>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub array_converter: Option<ArrayDirective>,
}

impl Directives {
    /// Collect directives; a later directive of the same kind replaces an earlier one.
    pub fn from_list<'a, I: IntoIterator<Item = &'a Directive>>(list: I) -> Self {
        let mut out = Self::default();
        for d in list {
            out.insert(d.clone());
        }
        out
    }

    pub fn insert(&mut self, directive: Directive) {
        match directive {
            Directive::Sheet(d) => self.sheet = Some(d),
            Directive::Cell(d) => self.cell = Some(d),
            Directive::LabelledCell(d) => self.labelled_cell = Some(d),
            Directive::Records(d) => self.horizontal_records = Some(d),
            Directive::Column(d) => self.column = Some(d),
            Directive::Hint(d) => self.hint = Some(d),
            Directive::Converter(d) => self.converter = Some(d),
            Directive::Array(d) => self.array_converter = Some(d),
        }
    }

    pub fn get(&self, kind: DirectiveKind) -> Option<Directive> {
        match kind {
            DirectiveKind::Sheet => self.sheet.clone().map(Directive::Sheet),
            DirectiveKind::Cell => self.cell.clone().map(Directive::Cell),
            DirectiveKind::LabelledCell => self.labelled_cell.clone().map(Directive::LabelledCell),
            DirectiveKind::HorizontalRecords => {
                self.horizontal_records.clone().map(Directive::Records)
            }
            DirectiveKind::Column => self.column.clone().map(Directive::Column),
            DirectiveKind::Hint => self.hint.clone().map(Directive::Hint),
            DirectiveKind::Converter => self.converter.clone().map(Directive::Converter),
            DirectiveKind::ArrayConverter => self.array_converter.clone().map(Directive::Array),
        }
    }

    /// True when any kind that places a value on the grid is present.
    pub fn is_mapped(&self) -> bool {
        self.cell.is_some()
            || self.labelled_cell.is_some()
            || self.horizontal_records.is_some()
            || self.column.is_some()
    }

    /// Order hint, `-1` when unhinted.
    pub fn order(&self) -> i32 {
        self.hint.as_ref().map(|h| h.order).unwrap_or(-1)
    }

    /// JSON object of every present directive, keyed by kind tag.
    pub fn to_attributes(&self) -> JsonValue {
        serde_json::to_value(self).unwrap_or(JsonValue::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn records_defaults() {
        let d = RecordsDirective::default();
        assert_eq!(d.range, 1);
        assert_eq!(d.bottom, 1);
        assert_eq!(d.header_limit, 0);
        assert_eq!(d.terminal, Terminal::Empty);
        assert_eq!(d.over_record, OverRecord::Break);
        assert_eq!(d.remained_record, RemainedRecord::None);
    }

    #[test]
    fn cell_address_wins_over_row_and_column() {
        let d = CellDirective {
            row: Some(9),
            column: Some(9),
            address: Some("B3".into()),
        };
        assert_eq!(d.coord().unwrap(), Coord::new(2, 1));
        assert!(CellDirective::default().coord().is_err());
    }

    #[test]
    fn attributes_roundtrip_through_json() {
        let d = Directive::from(RecordsDirective::labelled("Users").terminal(Terminal::Border));
        let attrs = d.attributes().unwrap();
        assert_eq!(attrs["terminal"], json!("border"));
        assert_eq!(attrs["table_label"], json!("Users"));
        let back = Directive::from_attributes(d.kind(), attrs).unwrap();
        assert_eq!(back, d);
    }

    #[test]
    fn unknown_attribute_is_rejected() {
        let err = Directive::from_attributes(DirectiveKind::Hint, json!({"order": 1, "rank": 2}));
        assert!(err.is_err());
    }

    #[test]
    fn later_directive_of_same_kind_replaces() {
        let list = vec![
            Directive::from(HintDirective::order(3)),
            Directive::from(CellDirective::at("A1")),
            Directive::from(HintDirective::order(1)),
        ];
        let ds = Directives::from_list(&list);
        assert_eq!(ds.order(), 1);
        assert!(ds.is_mapped());
        let attrs = ds.to_attributes();
        assert_eq!(attrs["hint"]["order"], json!(1));
        assert!(attrs.get("converter").is_none());
    }
}
