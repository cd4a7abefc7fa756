use crate::error::GridError;
use gridbind_common::{CellValue, Coord};
use serde::{Deserialize, Serialize};

/// Visual attributes the mapping engine reads or writes.
///
/// Only the attributes that carry mapping semantics are modelled: border
/// edges drive the `Border` table terminal, and the text-fit flags are
/// written by converters on save.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellStyle {
    #[serde(default)]
    pub border_top: bool,
    #[serde(default)]
    pub border_bottom: bool,
    #[serde(default)]
    pub border_left: bool,
    #[serde(default)]
    pub border_right: bool,
    #[serde(default)]
    pub wrap_text: bool,
    #[serde(default)]
    pub shrink_to_fit: bool,
}

impl CellStyle {
    /// Style with all four border edges set.
    pub fn boxed() -> Self {
        Self {
            border_top: true,
            border_bottom: true,
            border_left: true,
            border_right: true,
            ..Self::default()
        }
    }

    pub fn has_border(&self) -> bool {
        self.border_top || self.border_bottom || self.border_left || self.border_right
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct CellData {
    pub value: CellValue,
    pub hyperlink: Option<String>,
    pub style: CellStyle,
}

impl CellData {
    pub fn from_value<V: Into<CellValue>>(value: V) -> Self {
        Self {
            value: value.into(),
            hyperlink: None,
            style: CellStyle::default(),
        }
    }

    /// True when the cell carries neither content nor style.
    pub fn is_vacant(&self) -> bool {
        matches!(self.value, CellValue::Empty)
            && self.hyperlink.is_none()
            && self.style == CellStyle::default()
    }
}

/// Single-sheet grid document the mapping engine reads from and writes to.
///
/// Coordinates are 0-based. Row shifts move whole rows; backends must keep
/// every cell above the shift point untouched.
pub trait GridDocument: Send {
    fn sheet_name(&self) -> &str;

    fn cell(&self, at: Coord) -> Option<CellData>;

    fn value(&self, at: Coord) -> CellValue {
        self.cell(at).map(|c| c.value).unwrap_or_default()
    }

    /// A cell is empty when absent, `Empty`, or blank text.
    fn is_empty(&self, at: Coord) -> bool {
        self.value(at).is_blank()
    }

    /// Display text of the cell value (empty string for empty cells).
    fn text(&self, at: Coord) -> String {
        self.value(at).to_string()
    }

    fn set_value(&mut self, at: Coord, value: CellValue) -> Result<(), GridError>;

    /// Remove value and hyperlink, keeping the style.
    fn clear(&mut self, at: Coord) -> Result<(), GridError>;

    fn hyperlink(&self, at: Coord) -> Option<String> {
        self.cell(at).and_then(|c| c.hyperlink)
    }

    fn set_hyperlink(&mut self, at: Coord, url: &str) -> Result<(), GridError>;

    fn style(&self, at: Coord) -> CellStyle {
        self.cell(at).map(|c| c.style).unwrap_or_default()
    }

    fn set_style(&mut self, at: Coord, style: CellStyle) -> Result<(), GridError>;

    fn is_bordered(&self, at: Coord) -> bool {
        self.style(at).has_border()
    }

    /// Insert `count` blank rows before row `at`, shifting later rows down.
    fn insert_rows(&mut self, at: u32, count: u32) -> Result<(), GridError>;

    /// Remove rows `at..at + count`, shifting later rows up.
    fn delete_rows(&mut self, at: u32, count: u32) -> Result<(), GridError>;

    /// Inclusive 0-based `(max_row, max_col)` of every stored cell, `None` when blank.
    fn used_range(&self) -> Option<(u32, u32)>;
}
