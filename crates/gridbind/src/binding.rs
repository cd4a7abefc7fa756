use crate::convert::{CellConverter, ConverterRegistry};
use crate::directive::{ColumnDirective, Directives, LabelledCellDirective, RecordsDirective};
use crate::error::MappingError;
use crate::metadata::MetadataResolver;
use crate::order::resolve_order;
use crate::schema::{Access, Field, Mapped};
use crate::value::TypeDesc;
use gridbind_common::Coord;
use std::fmt;
use std::sync::Arc;

/// Shared collaborators used while binding a class.
#[derive(Clone, Copy)]
pub struct BindContext<'a> {
    pub resolver: &'a MetadataResolver,
    pub registry: &'a ConverterRegistry,
}

/// Whether a class is bound as the root object or as a record element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Scope {
    Root,
    Element,
}

/// Where a bound field lives on the grid.
#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    Cell(Coord),
    Labelled(LabelledCellDirective),
    Column(ColumnDirective),
    Records {
        directive: RecordsDirective,
        element_class: &'static str,
        columns: Vec<FieldBinding>,
    },
}

/// A class member paired with its resolved directives, type and converter.
///
/// Created once per class per pass; directives are never re-resolved mid-pass.
#[derive(Clone)]
pub struct FieldBinding {
    pub(crate) index: usize,
    pub name: &'static str,
    pub ty: TypeDesc,
    pub directives: Directives,
    pub target: Target,
    pub(crate) converter: Option<Arc<dyn CellConverter>>,
}

impl FieldBinding {
    /// Order hint, negative when unhinted.
    pub fn order(&self) -> i32 {
        self.directives.order()
    }

    pub fn is_records(&self) -> bool {
        matches!(self.target, Target::Records { .. })
    }
}

impl fmt::Debug for FieldBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldBinding")
            .field("name", &self.name)
            .field("ty", &self.ty)
            .field("target", &self.target)
            .field("order", &self.order())
            .finish()
    }
}

impl PartialEq for FieldBinding {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
            && self.name == other.name
            && self.ty == other.ty
            && self.directives == other.directives
            && self.target == other.target
    }
}

/// Result of binding a class: resolved class directives and ordered field bindings.
pub struct BoundClass<T> {
    pub class_directives: Directives,
    pub bindings: Vec<FieldBinding>,
    pub(crate) fields: Vec<Field<T>>,
}

impl<T> BoundClass<T> {
    pub fn binding(&self, name: &str) -> Option<&FieldBinding> {
        self.bindings.iter().find(|b| b.name == name)
    }

    pub(crate) fn field(&self, binding: &FieldBinding) -> Option<&Field<T>> {
        self.fields.get(binding.index)
    }
}

impl<T> fmt::Debug for BoundClass<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundClass")
            .field("class_directives", &self.class_directives)
            .field("bindings", &self.bindings)
            .finish()
    }
}

/// Resolve every member's directives and converter, then order the result.
///
/// All configuration errors surface here, before any grid access.
pub(crate) fn bind_class<T: Mapped>(
    ctx: &BindContext<'_>,
    scope: Scope,
) -> Result<BoundClass<T>, MappingError> {
    let class_directives = ctx
        .resolver
        .resolve_class(T::CLASS, &T::class_directives())?;
    let fields = T::fields();
    let mut bindings = Vec::with_capacity(fields.len());

    for (index, field) in fields.iter().enumerate() {
        let directives = ctx
            .resolver
            .resolve(T::CLASS, Some(field.name), &field.directives)?;
        if !directives.is_mapped() {
            continue;
        }
        let member = format!("{}.{}", T::CLASS, field.name);

        let binding = match &field.access {
            Access::Records(records) => {
                if scope == Scope::Element {
                    return Err(MappingError::metadata(
                        member,
                        "record elements cannot contain record tables",
                    ));
                }
                let Some(directive) = directives.horizontal_records.clone() else {
                    return Err(MappingError::metadata(
                        member,
                        "record list needs a `horizontal_records` directive",
                    ));
                };
                directive
                    .explicit_anchor()
                    .map_err(|message| MappingError::metadata(&member, message))?;
                let columns = records.bind_columns(ctx)?;
                FieldBinding {
                    index,
                    name: field.name,
                    ty: field.ty.clone(),
                    target: Target::Records {
                        directive,
                        element_class: records.element_class(),
                        columns,
                    },
                    directives,
                    converter: None,
                }
            }
            Access::Value(_) => {
                if directives.horizontal_records.is_some() {
                    return Err(MappingError::metadata(
                        member,
                        "`horizontal_records` needs a record list field",
                    ));
                }
                let target = value_target(&directives, scope)
                    .map_err(|message| MappingError::metadata(&member, message))?;
                let converter = ctx.registry.resolve(
                    &member,
                    &field.ty,
                    directives.converter.as_ref(),
                )?;
                FieldBinding {
                    index,
                    name: field.name,
                    ty: field.ty.clone(),
                    target,
                    directives,
                    converter: Some(converter),
                }
            }
        };
        bindings.push(binding);
    }

    Ok(BoundClass {
        class_directives,
        bindings: resolve_order(bindings),
        fields,
    })
}

fn value_target(directives: &Directives, scope: Scope) -> Result<Target, String> {
    match scope {
        Scope::Element => match &directives.column {
            Some(column) => Ok(Target::Column(column.clone())),
            None => Err("record element fields map through `column` directives".to_string()),
        },
        Scope::Root => {
            if let Some(labelled) = &directives.labelled_cell {
                if labelled.label.trim().is_empty() {
                    return Err("`labelled_cell` needs a label".to_string());
                }
                return Ok(Target::Labelled(labelled.clone()));
            }
            match &directives.cell {
                Some(cell) => cell.coord().map(Target::Cell),
                None => Err("`column` is only valid on record element fields".to_string()),
            }
        }
    }
}
