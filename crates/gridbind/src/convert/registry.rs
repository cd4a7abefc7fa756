use super::collection::{ContainerConverter, ContainerKind};
use super::scalar::{
    BooleanConverter, DateConverter, DateTimeConverter, IntConverter, NumberConverter,
    TextConverter, UriConverter,
};
use super::CellConverter;
use crate::directive::ConverterDirective;
use crate::error::MappingError;
use crate::value::TypeDesc;
use rustc_hash::FxHashMap;
use std::fmt;
use std::sync::Arc;

/// Converters keyed by declared type, plus converters addressable by name.
///
/// Build it up front, then share it behind an `Arc`; it is never mutated
/// while a pass is running.
#[derive(Clone, Default)]
pub struct ConverterRegistry {
    by_type: FxHashMap<TypeDesc, Arc<dyn CellConverter>>,
    named: FxHashMap<String, Arc<dyn CellConverter>>,
}

impl ConverterRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with converters for every built-in scalar type.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry
            .register(TypeDesc::Text, TextConverter)
            .register(TypeDesc::Int, IntConverter)
            .register(TypeDesc::Number, NumberConverter)
            .register(TypeDesc::Boolean, BooleanConverter)
            .register(TypeDesc::Date, DateConverter)
            .register(TypeDesc::DateTime, DateTimeConverter)
            .register(TypeDesc::Uri, UriConverter);
        registry
    }

    /// Register (or replace) the converter for an exact type.
    pub fn register(&mut self, ty: TypeDesc, converter: impl CellConverter + 'static) -> &mut Self {
        self.by_type.insert(ty, Arc::new(converter));
        self
    }

    /// Register a converter that directives can reference by name.
    pub fn register_named(
        &mut self,
        name: impl Into<String>,
        converter: impl CellConverter + 'static,
    ) -> &mut Self {
        self.named.insert(name.into(), Arc::new(converter));
        self
    }

    pub fn named(&self, name: &str) -> Option<Arc<dyn CellConverter>> {
        self.named.get(name).cloned()
    }

    /// Converter for a declared type.
    ///
    /// Exact registrations win. Lists, sets and maps of a scalar item type
    /// are served by a container converter wrapping the item's converter.
    pub fn get(&self, ty: &TypeDesc) -> Option<Arc<dyn CellConverter>> {
        if let Some(converter) = self.by_type.get(ty) {
            return Some(converter.clone());
        }
        let kind = match ty {
            TypeDesc::List(_) => ContainerKind::List,
            TypeDesc::Set(_) => ContainerKind::Set,
            TypeDesc::Map(_) => ContainerKind::Map,
            TypeDesc::Named(name) => return self.named(name),
            _ => return None,
        };
        let item_ty = ty.item()?;
        if item_ty.is_container() || matches!(item_ty, TypeDesc::Records(_)) {
            return None;
        }
        let item = self.get(item_ty)?;
        Some(Arc::new(ContainerConverter::new(kind, item_ty.clone(), item)))
    }

    /// Converter for a field: an explicit converter name wins over type lookup.
    pub fn resolve(
        &self,
        field: &str,
        ty: &TypeDesc,
        directive: Option<&ConverterDirective>,
    ) -> Result<Arc<dyn CellConverter>, MappingError> {
        if let Some(name) = directive.and_then(|d| d.converter.as_deref()) {
            return self.named(name).ok_or_else(|| {
                MappingError::metadata(field, format!("unknown converter `{name}`"))
            });
        }
        self.get(ty).ok_or_else(|| MappingError::ConverterNotFound {
            field: field.to_string(),
            ty: ty.to_string(),
        })
    }
}

impl fmt::Debug for ConverterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut types: Vec<String> = self.by_type.keys().map(ToString::to_string).collect();
        types.sort();
        let mut named: Vec<&String> = self.named.keys().collect();
        named.sort();
        f.debug_struct("ConverterRegistry")
            .field("types", &types)
            .field("named", &named)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::{CellContent, ConvertContext};
    use crate::value::Value;

    #[test]
    fn containers_delegate_to_item_converter() {
        let registry = ConverterRegistry::with_defaults();
        let conv = registry
            .get(&TypeDesc::Set(Box::new(TypeDesc::Int)))
            .expect("set<int> converter");
        let v = conv
            .read(&CellContent::text("3,1,3"), &ConvertContext::default())
            .unwrap();
        assert_eq!(v, Value::Set(vec![Value::Int(3), Value::Int(1)]));
    }

    #[test]
    fn nested_containers_and_unknown_types_have_no_converter() {
        let registry = ConverterRegistry::with_defaults();
        let nested = TypeDesc::List(Box::new(TypeDesc::List(Box::new(TypeDesc::Int))));
        assert!(registry.get(&nested).is_none());
        assert!(registry.get(&TypeDesc::Named("money")).is_none());
        let err = registry
            .resolve("demo::Invoice.total", &TypeDesc::Named("money"), None)
            .err()
            .unwrap();
        assert!(matches!(err, MappingError::ConverterNotFound { .. }));
    }

    #[test]
    fn explicit_converter_overrides_type_lookup() {
        let mut registry = ConverterRegistry::with_defaults();
        registry.register_named("upper", TextConverter);
        let directive = ConverterDirective::named("upper");
        assert!(registry
            .resolve("f", &TypeDesc::Named("whatever"), Some(&directive))
            .is_ok());
        let missing = ConverterDirective::named("nope");
        let err = registry.resolve("f", &TypeDesc::Text, Some(&missing)).err().unwrap();
        assert!(matches!(err, MappingError::Metadata { .. }));
    }

    #[test]
    fn list_of_named_items_uses_named_converter() {
        let mut registry = ConverterRegistry::new();
        registry.register_named("code", TextConverter);
        assert!(registry.get(&TypeDesc::List(Box::new(TypeDesc::Named("code")))).is_some());
    }
}
