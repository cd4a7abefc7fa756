//! Cell content <-> typed value conversion.

mod collection;
mod registry;
mod scalar;

pub use collection::{ContainerConverter, ContainerKind};
pub use registry::ConverterRegistry;
pub use scalar::{
    BooleanConverter, DateConverter, DateTimeConverter, IntConverter, NumberConverter,
    TextConverter, UriConverter,
};

use crate::directive::{ArrayDirective, ConverterDirective, Directives};
use crate::error::ConversionError;
use crate::value::Value;
use gridbind_common::{CellValue, Coord};
use gridbind_io::GridDocument;

/// Raw content of one cell as converters see it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CellContent {
    pub value: CellValue,
    pub hyperlink: Option<String>,
}

impl CellContent {
    pub fn new(value: impl Into<CellValue>) -> Self {
        Self {
            value: value.into(),
            hyperlink: None,
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::new(CellValue::Text(text.into()))
    }

    pub fn with_hyperlink(mut self, url: impl Into<String>) -> Self {
        self.hyperlink = Some(url.into());
        self
    }

    pub fn from_grid(grid: &dyn GridDocument, at: Coord) -> Self {
        match grid.cell(at) {
            Some(cell) => Self {
                value: cell.value,
                hyperlink: cell.hyperlink,
            },
            None => Self::default(),
        }
    }

    /// Blank value and no hyperlink.
    pub fn is_empty(&self) -> bool {
        self.value.is_blank() && self.hyperlink.is_none()
    }

    /// Display text, trimmed when the context asks for it.
    pub fn text_for(&self, ctx: &ConvertContext) -> String {
        let text = self.value.to_string();
        if ctx.trim {
            text.trim().to_string()
        } else {
            text
        }
    }
}

/// Per-field options handed to converters.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvertContext {
    pub converter: ConverterDirective,
    pub array: ArrayDirective,
    pub trim: bool,
}

impl Default for ConvertContext {
    fn default() -> Self {
        Self {
            converter: ConverterDirective::default(),
            array: ArrayDirective::default(),
            trim: true,
        }
    }
}

impl ConvertContext {
    pub fn from_directives(directives: &Directives, trim_text: bool) -> Self {
        let converter = directives.converter.clone().unwrap_or_default();
        let trim = trim_text && converter.trim;
        Self {
            array: directives.array_converter.clone().unwrap_or_default(),
            converter,
            trim,
        }
    }
}

/// Reads a typed value from cell content and writes it back.
pub trait CellConverter: Send + Sync {
    /// Convert non-empty cell content.
    fn read(&self, cell: &CellContent, ctx: &ConvertContext) -> Result<Value, ConversionError>;

    /// Convert a non-empty value to cell content.
    fn write(&self, value: &Value, ctx: &ConvertContext) -> Result<CellContent, ConversionError>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReadError {
    Conversion(ConversionError),
    /// Mandatory field, empty cell, no default.
    Missing,
}

/// Read a cell, applying the default-value and mandatory policies.
pub fn read_field(
    converter: &dyn CellConverter,
    cell: &CellContent,
    ctx: &ConvertContext,
) -> Result<Value, ReadError> {
    if cell.is_empty() {
        if let Some(default) = &ctx.converter.default_value {
            return converter
                .read(&CellContent::text(default.as_str()), ctx)
                .map_err(ReadError::Conversion);
        }
        if ctx.converter.mandatory {
            return Err(ReadError::Missing);
        }
        return Ok(Value::Empty);
    }
    converter.read(cell, ctx).map_err(ReadError::Conversion)
}

/// Produce cell content for a value; an empty value writes the default when one is set.
pub fn write_field(
    converter: &dyn CellConverter,
    value: &Value,
    ctx: &ConvertContext,
) -> Result<CellContent, ConversionError> {
    if value.is_empty() {
        return match &ctx.converter.default_value {
            Some(default) => {
                let parsed = converter.read(&CellContent::text(default.as_str()), ctx)?;
                converter.write(&parsed, ctx)
            }
            None => Ok(CellContent::default()),
        };
    }
    converter.write(value, ctx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_cell_uses_default_value() {
        let ctx = ConvertContext {
            converter: ConverterDirective::default().default_value("7"),
            ..ConvertContext::default()
        };
        let v = read_field(&IntConverter, &CellContent::default(), &ctx).unwrap();
        assert_eq!(v, Value::Int(7));
        let written = write_field(&IntConverter, &Value::Empty, &ctx).unwrap();
        assert_eq!(written.value, CellValue::Int(7));
    }

    #[test]
    fn empty_mandatory_cell_is_missing() {
        let ctx = ConvertContext {
            converter: ConverterDirective::default().mandatory(),
            ..ConvertContext::default()
        };
        let err = read_field(&TextConverter, &CellContent::text("   "), &ctx).unwrap_err();
        assert_eq!(err, ReadError::Missing);
    }

    #[test]
    fn empty_optional_cell_is_empty_value() {
        let ctx = ConvertContext::default();
        let v = read_field(&DateConverter, &CellContent::default(), &ctx).unwrap();
        assert_eq!(v, Value::Empty);
    }

    #[test]
    fn trim_follows_both_switches() {
        let mut directives = Directives::default();
        assert!(ConvertContext::from_directives(&directives, true).trim);
        assert!(!ConvertContext::from_directives(&directives, false).trim);
        directives.converter = Some(ConverterDirective::default().no_trim());
        assert!(!ConvertContext::from_directives(&directives, true).trim);
    }
}
