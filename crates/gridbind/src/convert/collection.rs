use super::{CellContent, CellConverter, ConvertContext};
use crate::error::ConversionError;
use crate::value::{TypeDesc, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    List,
    Set,
    /// Items are `key=value` pairs.
    Map,
}

/// Splits one cell's text into items and converts each with the item converter.
pub struct ContainerConverter {
    kind: ContainerKind,
    item_ty: TypeDesc,
    item: Arc<dyn CellConverter>,
}

impl ContainerConverter {
    pub fn new(kind: ContainerKind, item_ty: TypeDesc, item: Arc<dyn CellConverter>) -> Self {
        Self {
            kind,
            item_ty,
            item,
        }
    }

    fn target(&self) -> TypeDesc {
        let item = Box::new(self.item_ty.clone());
        match self.kind {
            ContainerKind::List => TypeDesc::List(item),
            ContainerKind::Set => TypeDesc::Set(item),
            ContainerKind::Map => TypeDesc::Map(item),
        }
    }

    fn read_item(&self, text: &str, ctx: &ConvertContext) -> Result<Value, ConversionError> {
        if text.is_empty() {
            return match self.item_ty {
                TypeDesc::Text => Ok(Value::Text(String::new())),
                _ => Err(ConversionError::new(text, self.target(), "empty item")),
            };
        }
        self.item.read(&CellContent::text(text), ctx)
    }

    fn write_item(&self, value: &Value, ctx: &ConvertContext) -> Result<String, ConversionError> {
        if value.is_empty() {
            return Ok(String::new());
        }
        Ok(self.item.write(value, ctx)?.value.to_string())
    }
}

impl CellConverter for ContainerConverter {
    fn read(&self, cell: &CellContent, ctx: &ConvertContext) -> Result<Value, ConversionError> {
        let separator = ctx.array.separator.as_str();
        let text = cell.value.to_string();
        if separator.is_empty() {
            return Err(ConversionError::new(text, self.target(), "empty separator"));
        }

        let pieces = text
            .split(separator)
            .map(str::trim)
            .filter(|piece| !(ctx.array.ignore_empty_item && piece.is_empty()));

        match self.kind {
            ContainerKind::List => pieces
                .map(|piece| self.read_item(piece, ctx))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::List),
            ContainerKind::Set => pieces
                .map(|piece| self.read_item(piece, ctx))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::set_from),
            ContainerKind::Map => {
                let mut map = BTreeMap::new();
                for piece in pieces {
                    let Some((key, value)) = piece.split_once('=') else {
                        return Err(ConversionError::new(
                            piece,
                            self.target(),
                            "map item must be `key=value`",
                        ));
                    };
                    map.insert(key.trim().to_string(), self.read_item(value.trim(), ctx)?);
                }
                Ok(Value::Map(map))
            }
        }
    }

    fn write(&self, value: &Value, ctx: &ConvertContext) -> Result<CellContent, ConversionError> {
        let parts: Vec<String> = match (self.kind, value) {
            (ContainerKind::List | ContainerKind::Set, Value::List(items) | Value::Set(items)) => {
                items
                    .iter()
                    .map(|item| self.write_item(item, ctx))
                    .collect::<Result<_, _>>()?
            }
            (ContainerKind::Map, Value::Map(map)) => map
                .iter()
                .map(|(k, v)| Ok(format!("{k}={}", self.write_item(v, ctx)?)))
                .collect::<Result<_, ConversionError>>()?,
            (_, other) => {
                return Err(ConversionError::new(
                    other.to_string(),
                    self.target(),
                    format!("cannot write a {} value", other.type_name()),
                ));
            }
        };

        let joined = parts
            .into_iter()
            .filter(|part| !(ctx.array.ignore_empty_item && part.is_empty()))
            .collect::<Vec<_>>()
            .join(&ctx.array.separator);
        if joined.is_empty() {
            Ok(CellContent::default())
        } else {
            Ok(CellContent::text(joined))
        }
    }
}
