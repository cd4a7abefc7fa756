use crate::error::ConversionError;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use indexmap::IndexSet;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::Hash;
use url::Url;

/// Dynamically typed field value exchanged between host objects and converters.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Empty,
    Text(String),
    Int(i64),
    Number(f64),
    Boolean(bool),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Uri(Url),
    List(Vec<Value>),
    /// Insertion ordered, no duplicates.
    Set(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

impl Value {
    pub fn is_empty(&self) -> bool {
        matches!(self, Value::Empty)
    }

    /// Build a set value, dropping later duplicates.
    pub fn set_from<I: IntoIterator<Item = Value>>(items: I) -> Self {
        let mut out: Vec<Value> = Vec::new();
        for item in items {
            if !out.contains(&item) {
                out.push(item);
            }
        }
        Value::Set(out)
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Empty => "empty",
            Value::Text(_) => "text",
            Value::Int(_) => "int",
            Value::Number(_) => "number",
            Value::Boolean(_) => "boolean",
            Value::Date(_) => "date",
            Value::DateTime(_) => "datetime",
            Value::Uri(_) => "uri",
            Value::List(_) => "list",
            Value::Set(_) => "set",
            Value::Map(_) => "map",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Empty => Ok(()),
            Value::Text(s) => f.write_str(s),
            Value::Int(i) => write!(f, "{i}"),
            Value::Number(n) => write!(f, "{n}"),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Value::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
            Value::Uri(u) => f.write_str(u.as_str()),
            Value::List(items) | Value::Set(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
            Value::Map(map) => {
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{k}={v}")?;
                }
                Ok(())
            }
        }
    }
}

/// Declared type of a mapped field, supplied when the class is described.
///
/// Converters are looked up by this descriptor; nothing is inferred at runtime.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeDesc {
    Text,
    Int,
    Number,
    Boolean,
    Date,
    DateTime,
    Uri,
    /// User type served by a converter registered under this name.
    Named(&'static str),
    List(Box<TypeDesc>),
    Set(Box<TypeDesc>),
    Map(Box<TypeDesc>),
    /// Collection of record elements of the named class.
    Records(&'static str),
}

impl TypeDesc {
    /// Item type of a list, set or map.
    pub fn item(&self) -> Option<&TypeDesc> {
        match self {
            TypeDesc::List(item) | TypeDesc::Set(item) | TypeDesc::Map(item) => Some(item),
            _ => None,
        }
    }

    pub fn is_container(&self) -> bool {
        self.item().is_some()
    }
}

impl fmt::Display for TypeDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDesc::Text => f.write_str("text"),
            TypeDesc::Int => f.write_str("int"),
            TypeDesc::Number => f.write_str("number"),
            TypeDesc::Boolean => f.write_str("boolean"),
            TypeDesc::Date => f.write_str("date"),
            TypeDesc::DateTime => f.write_str("datetime"),
            TypeDesc::Uri => f.write_str("uri"),
            TypeDesc::Named(name) => f.write_str(name),
            TypeDesc::List(item) => write!(f, "list<{item}>"),
            TypeDesc::Set(item) => write!(f, "set<{item}>"),
            TypeDesc::Map(item) => write!(f, "map<{item}>"),
            TypeDesc::Records(class) => write!(f, "records<{class}>"),
        }
    }
}

/// A Rust type that can sit in a mapped field.
pub trait FieldValue: Sized {
    fn type_desc() -> TypeDesc;

    fn to_value(&self) -> Value;

    fn from_value(value: Value) -> Result<Self, ConversionError>;

    /// What the field becomes when its cell is empty and no default applies.
    /// `None` leaves the field untouched.
    fn from_empty() -> Option<Self> {
        None
    }
}

fn mismatch(value: &Value, target: TypeDesc) -> ConversionError {
    ConversionError::new(
        value.to_string(),
        target,
        format!("unexpected {} value", value.type_name()),
    )
}

impl FieldValue for String {
    fn type_desc() -> TypeDesc {
        TypeDesc::Text
    }

    fn to_value(&self) -> Value {
        Value::Text(self.clone())
    }

    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Text(s) => Ok(s),
            Value::Empty => Ok(String::new()),
            other => Ok(other.to_string()),
        }
    }
}

impl FieldValue for i64 {
    fn type_desc() -> TypeDesc {
        TypeDesc::Int
    }

    fn to_value(&self) -> Value {
        Value::Int(*self)
    }

    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Int(i) => Ok(i),
            other => Err(mismatch(&other, TypeDesc::Int)),
        }
    }
}

macro_rules! narrow_int {
    ($($ty:ty),*) => {
        $(
            impl FieldValue for $ty {
                fn type_desc() -> TypeDesc {
                    TypeDesc::Int
                }

                fn to_value(&self) -> Value {
                    Value::Int(i64::from(*self))
                }

                fn from_value(value: Value) -> Result<Self, ConversionError> {
                    match value {
                        Value::Int(i) => <$ty>::try_from(i).map_err(|_| {
                            ConversionError::new(
                                i.to_string(),
                                stringify!($ty),
                                "out of range",
                            )
                        }),
                        other => Err(mismatch(&other, TypeDesc::Int)),
                    }
                }
            }
        )*
    };
}

narrow_int!(i32, u32);

impl FieldValue for f64 {
    fn type_desc() -> TypeDesc {
        TypeDesc::Number
    }

    fn to_value(&self) -> Value {
        Value::Number(*self)
    }

    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Number(n) => Ok(n),
            Value::Int(i) => Ok(i as f64),
            other => Err(mismatch(&other, TypeDesc::Number)),
        }
    }
}

impl FieldValue for bool {
    fn type_desc() -> TypeDesc {
        TypeDesc::Boolean
    }

    fn to_value(&self) -> Value {
        Value::Boolean(*self)
    }

    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Boolean(b) => Ok(b),
            other => Err(mismatch(&other, TypeDesc::Boolean)),
        }
    }
}

impl FieldValue for NaiveDate {
    fn type_desc() -> TypeDesc {
        TypeDesc::Date
    }

    fn to_value(&self) -> Value {
        Value::Date(*self)
    }

    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Date(d) => Ok(d),
            Value::DateTime(dt) => Ok(dt.date()),
            other => Err(mismatch(&other, TypeDesc::Date)),
        }
    }
}

impl FieldValue for NaiveDateTime {
    fn type_desc() -> TypeDesc {
        TypeDesc::DateTime
    }

    fn to_value(&self) -> Value {
        Value::DateTime(*self)
    }

    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::DateTime(dt) => Ok(dt),
            Value::Date(d) => Ok(d.and_time(NaiveTime::default())),
            other => Err(mismatch(&other, TypeDesc::DateTime)),
        }
    }
}

impl FieldValue for Url {
    fn type_desc() -> TypeDesc {
        TypeDesc::Uri
    }

    fn to_value(&self) -> Value {
        Value::Uri(self.clone())
    }

    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Uri(u) => Ok(u),
            Value::Text(s) => Url::parse(s.trim())
                .map_err(|e| ConversionError::new(s.clone(), TypeDesc::Uri, e.to_string())),
            other => Err(mismatch(&other, TypeDesc::Uri)),
        }
    }
}

impl<T: FieldValue> FieldValue for Option<T> {
    fn type_desc() -> TypeDesc {
        T::type_desc()
    }

    fn to_value(&self) -> Value {
        match self {
            Some(v) => v.to_value(),
            None => Value::Empty,
        }
    }

    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Empty => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }

    fn from_empty() -> Option<Self> {
        Some(None)
    }
}

fn items_of(value: Value, target: &TypeDesc) -> Result<Vec<Value>, ConversionError> {
    match value {
        Value::List(items) | Value::Set(items) => Ok(items),
        Value::Empty => Ok(Vec::new()),
        other => Err(mismatch(&other, target.clone())),
    }
}

impl<T: FieldValue> FieldValue for Vec<T> {
    fn type_desc() -> TypeDesc {
        TypeDesc::List(Box::new(T::type_desc()))
    }

    fn to_value(&self) -> Value {
        Value::List(self.iter().map(FieldValue::to_value).collect())
    }

    fn from_value(value: Value) -> Result<Self, ConversionError> {
        items_of(value, &Self::type_desc())?
            .into_iter()
            .map(T::from_value)
            .collect()
    }

    fn from_empty() -> Option<Self> {
        Some(Vec::new())
    }
}

impl<T: FieldValue + Hash + Eq> FieldValue for IndexSet<T> {
    fn type_desc() -> TypeDesc {
        TypeDesc::Set(Box::new(T::type_desc()))
    }

    fn to_value(&self) -> Value {
        Value::Set(self.iter().map(FieldValue::to_value).collect())
    }

    fn from_value(value: Value) -> Result<Self, ConversionError> {
        items_of(value, &Self::type_desc())?
            .into_iter()
            .map(T::from_value)
            .collect()
    }

    fn from_empty() -> Option<Self> {
        Some(IndexSet::new())
    }
}

impl<T: FieldValue> FieldValue for BTreeMap<String, T> {
    fn type_desc() -> TypeDesc {
        TypeDesc::Map(Box::new(T::type_desc()))
    }

    fn to_value(&self) -> Value {
        Value::Map(
            self.iter()
                .map(|(k, v)| (k.clone(), v.to_value()))
                .collect(),
        )
    }

    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Map(map) => map
                .into_iter()
                .map(|(k, v)| T::from_value(v).map(|v| (k, v)))
                .collect(),
            Value::Empty => Ok(BTreeMap::new()),
            other => Err(mismatch(&other, Self::type_desc())),
        }
    }

    fn from_empty() -> Option<Self> {
        Some(BTreeMap::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn narrow_ints_reject_overflow() {
        assert_eq!(i32::from_value(Value::Int(42)).unwrap(), 42);
        let err = u32::from_value(Value::Int(-1)).unwrap_err();
        assert_eq!(err.reason, "out of range");
    }

    #[test]
    fn option_maps_empty_to_none() {
        assert_eq!(Option::<i64>::from_value(Value::Empty).unwrap(), None);
        assert_eq!(Option::<i64>::from_empty(), Some(None));
        assert_eq!(<i64 as FieldValue>::from_empty(), None);
        assert_eq!(Option::<i64>::type_desc(), TypeDesc::Int);
    }

    #[test]
    fn set_dedupes_in_insertion_order() {
        let v = Value::set_from([
            Value::Text("b".into()),
            Value::Text("a".into()),
            Value::Text("b".into()),
        ]);
        let set = IndexSet::<String>::from_value(v).unwrap();
        assert_eq!(set.into_iter().collect::<Vec<_>>(), vec!["b", "a"]);
    }

    #[test]
    fn type_desc_display() {
        assert_eq!(Vec::<i64>::type_desc().to_string(), "list<int>");
        assert_eq!(
            BTreeMap::<String, NaiveDate>::type_desc().to_string(),
            "map<date>"
        );
        assert_eq!(TypeDesc::Records("demo::User").to_string(), "records<demo::User>");
    }
}
