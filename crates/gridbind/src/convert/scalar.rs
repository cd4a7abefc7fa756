use super::{CellContent, CellConverter, ConvertContext};
use crate::error::ConversionError;
use crate::value::{TypeDesc, Value};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use gridbind_common::{CellValue, serial_to_datetime};
use url::Url;

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

fn unexpected_value(value: &Value, target: TypeDesc) -> ConversionError {
    ConversionError::new(
        value.to_string(),
        target,
        format!("cannot write a {} value", value.type_name()),
    )
}

fn unexpected_cell(cell: &CellContent, target: TypeDesc) -> ConversionError {
    ConversionError::new(cell.value.to_string(), target, "unsupported cell value")
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TextConverter;

impl CellConverter for TextConverter {
    fn read(&self, cell: &CellContent, ctx: &ConvertContext) -> Result<Value, ConversionError> {
        Ok(Value::Text(cell.text_for(ctx)))
    }

    fn write(&self, value: &Value, _ctx: &ConvertContext) -> Result<CellContent, ConversionError> {
        match value {
            Value::Text(s) => Ok(CellContent::text(s.as_str())),
            Value::List(_) | Value::Set(_) | Value::Map(_) => {
                Err(unexpected_value(value, TypeDesc::Text))
            }
            other => Ok(CellContent::text(other.to_string())),
        }
    }
}

/// Whole numbers. Accepts integral numeric cells and numeric text.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntConverter;

fn integral(n: f64) -> Option<i64> {
    if n.is_finite() && n.fract() == 0.0 && n >= i64::MIN as f64 && n <= i64::MAX as f64 {
        Some(n as i64)
    } else {
        None
    }
}

impl CellConverter for IntConverter {
    fn read(&self, cell: &CellContent, ctx: &ConvertContext) -> Result<Value, ConversionError> {
        match &cell.value {
            CellValue::Int(i) => Ok(Value::Int(*i)),
            CellValue::Number(n) => integral(*n)
                .map(Value::Int)
                .ok_or_else(|| ConversionError::new(n.to_string(), TypeDesc::Int, "not a whole number")),
            CellValue::Text(_) => {
                let text = cell.text_for(ctx);
                if let Ok(i) = text.parse::<i64>() {
                    return Ok(Value::Int(i));
                }
                text.parse::<f64>()
                    .ok()
                    .and_then(integral)
                    .map(Value::Int)
                    .ok_or_else(|| ConversionError::new(text, TypeDesc::Int, "not a whole number"))
            }
            _ => Err(unexpected_cell(cell, TypeDesc::Int)),
        }
    }

    fn write(&self, value: &Value, _ctx: &ConvertContext) -> Result<CellContent, ConversionError> {
        match value {
            Value::Int(i) => Ok(CellContent::new(*i)),
            other => Err(unexpected_value(other, TypeDesc::Int)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NumberConverter;

impl CellConverter for NumberConverter {
    fn read(&self, cell: &CellContent, ctx: &ConvertContext) -> Result<Value, ConversionError> {
        match &cell.value {
            CellValue::Number(n) => Ok(Value::Number(*n)),
            CellValue::Int(i) => Ok(Value::Number(*i as f64)),
            CellValue::Text(_) => {
                let text = cell.text_for(ctx);
                text.parse::<f64>()
                    .map(Value::Number)
                    .map_err(|e| ConversionError::new(text, TypeDesc::Number, e.to_string()))
            }
            _ => Err(unexpected_cell(cell, TypeDesc::Number)),
        }
    }

    fn write(&self, value: &Value, _ctx: &ConvertContext) -> Result<CellContent, ConversionError> {
        match value {
            Value::Number(n) => Ok(CellContent::new(*n)),
            Value::Int(i) => Ok(CellContent::new(*i)),
            other => Err(unexpected_value(other, TypeDesc::Number)),
        }
    }
}

/// `true/false`, `1/0`, `yes/no`, `on/off`, case-insensitive.
#[derive(Debug, Clone, Copy, Default)]
pub struct BooleanConverter;

fn parse_bool(text: &str) -> Option<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl CellConverter for BooleanConverter {
    fn read(&self, cell: &CellContent, ctx: &ConvertContext) -> Result<Value, ConversionError> {
        match &cell.value {
            CellValue::Boolean(b) => Ok(Value::Boolean(*b)),
            CellValue::Int(1) => Ok(Value::Boolean(true)),
            CellValue::Int(0) => Ok(Value::Boolean(false)),
            CellValue::Number(n) if *n == 1.0 || *n == 0.0 => Ok(Value::Boolean(*n == 1.0)),
            CellValue::Text(_) => {
                let text = cell.text_for(ctx);
                parse_bool(&text)
                    .map(Value::Boolean)
                    .ok_or_else(|| ConversionError::new(text, TypeDesc::Boolean, "not a boolean"))
            }
            _ => Err(unexpected_cell(cell, TypeDesc::Boolean)),
        }
    }

    fn write(&self, value: &Value, _ctx: &ConvertContext) -> Result<CellContent, ConversionError> {
        match value {
            Value::Boolean(b) => Ok(CellContent::new(*b)),
            other => Err(unexpected_value(other, TypeDesc::Boolean)),
        }
    }
}

fn parse_datetime(text: &str) -> Option<NaiveDateTime> {
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(text, DATE_FORMAT)
                .ok()
                .map(|d| d.and_time(NaiveTime::default()))
        })
}

fn cell_datetime(cell: &CellContent, ctx: &ConvertContext, target: TypeDesc) -> Result<NaiveDateTime, ConversionError> {
    match &cell.value {
        CellValue::DateTime(dt) => Ok(*dt),
        CellValue::Date(d) => Ok(d.and_time(NaiveTime::default())),
        CellValue::Int(_) | CellValue::Number(_) => cell
            .value
            .as_serial_number()
            .and_then(serial_to_datetime)
            .ok_or_else(|| ConversionError::new(cell.value.to_string(), target, "serial date out of range")),
        CellValue::Text(_) => {
            let text = cell.text_for(ctx);
            parse_datetime(text.trim())
                .ok_or_else(|| ConversionError::new(text, target, "expected YYYY-MM-DD or YYYY-MM-DD HH:MM:SS"))
        }
        _ => Err(unexpected_cell(cell, target)),
    }
}

/// Calendar dates from native date cells, Excel serial numbers or ISO text.
#[derive(Debug, Clone, Copy, Default)]
pub struct DateConverter;

impl CellConverter for DateConverter {
    fn read(&self, cell: &CellContent, ctx: &ConvertContext) -> Result<Value, ConversionError> {
        cell_datetime(cell, ctx, TypeDesc::Date).map(|dt| Value::Date(dt.date()))
    }

    fn write(&self, value: &Value, _ctx: &ConvertContext) -> Result<CellContent, ConversionError> {
        match value {
            Value::Date(d) => Ok(CellContent::new(*d)),
            Value::DateTime(dt) => Ok(CellContent::new(dt.date())),
            other => Err(unexpected_value(other, TypeDesc::Date)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DateTimeConverter;

impl CellConverter for DateTimeConverter {
    fn read(&self, cell: &CellContent, ctx: &ConvertContext) -> Result<Value, ConversionError> {
        cell_datetime(cell, ctx, TypeDesc::DateTime).map(Value::DateTime)
    }

    fn write(&self, value: &Value, _ctx: &ConvertContext) -> Result<CellContent, ConversionError> {
        match value {
            Value::DateTime(dt) => Ok(CellContent::new(*dt)),
            Value::Date(d) => Ok(CellContent::new(d.and_time(NaiveTime::default()))),
            other => Err(unexpected_value(other, TypeDesc::DateTime)),
        }
    }
}

/// URIs. A cell hyperlink wins over the cell text; saving writes both.
#[derive(Debug, Clone, Copy, Default)]
pub struct UriConverter;

impl CellConverter for UriConverter {
    fn read(&self, cell: &CellContent, ctx: &ConvertContext) -> Result<Value, ConversionError> {
        let raw = match &cell.hyperlink {
            Some(link) if !link.trim().is_empty() => link.trim().to_string(),
            _ => cell.text_for(ctx),
        };
        Url::parse(raw.trim())
            .map(Value::Uri)
            .map_err(|e| ConversionError::new(raw, TypeDesc::Uri, e.to_string()))
    }

    fn write(&self, value: &Value, _ctx: &ConvertContext) -> Result<CellContent, ConversionError> {
        match value {
            Value::Uri(url) => Ok(CellContent::text(url.as_str()).with_hyperlink(url.as_str())),
            other => Err(unexpected_value(other, TypeDesc::Uri)),
        }
    }
}
