use crate::binding::{BindContext, FieldBinding, Scope, bind_class};
use crate::directive::Directive;
use crate::error::{ConversionError, MappingError};
use crate::position::PositionIndex;
use crate::value::{FieldValue, TypeDesc, Value};
use std::fmt;

/// A host class the mapper can load from and save to a grid.
///
/// ```
/// use gridbind::{CellDirective, Field, Mapped};
///
/// #[derive(Default)]
/// struct Invoice {
///     number: String,
///     total: f64,
/// }
///
/// impl Mapped for Invoice {
///     const CLASS: &'static str = "billing::Invoice";
///
///     fn fields() -> Vec<Field<Self>> {
///         vec![
///             Field::value("number", |s: &Self| &s.number, |s: &mut Self| &mut s.number)
///                 .with(CellDirective::at("B1")),
///             Field::value("total", |s: &Self| &s.total, |s: &mut Self| &mut s.total)
///                 .with(CellDirective::at("B2")),
///         ]
///     }
/// }
/// ```
pub trait Mapped: Default + 'static {
    /// Fully-qualified class name, the key used by override documents.
    const CLASS: &'static str;

    /// Mapped members with their compiled-in directives.
    fn fields() -> Vec<Field<Self>>;

    /// Class-level compiled-in directives (e.g. the sheet name).
    fn class_directives() -> Vec<Directive> {
        Vec::new()
    }

    /// Opt into position tracking by returning the index to maintain.
    fn positions_mut(&mut self) -> Option<&mut PositionIndex> {
        None
    }
}

/// One member of a [`Mapped`] class.
pub struct Field<T> {
    pub(crate) name: &'static str,
    pub(crate) ty: TypeDesc,
    pub(crate) directives: Vec<Directive>,
    pub(crate) access: Access<T>,
}

impl<T> fmt::Debug for Field<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.name)
            .field("ty", &self.ty)
            .field("directives", &self.directives)
            .finish()
    }
}

impl<T: 'static> Field<T> {
    /// Scalar or container member converted through the registry.
    pub fn value<V: FieldValue + 'static>(
        name: &'static str,
        get: fn(&T) -> &V,
        get_mut: fn(&mut T) -> &mut V,
    ) -> Self {
        Self {
            name,
            ty: V::type_desc(),
            directives: Vec::new(),
            access: Access::Value(Box::new(Slot { get, get_mut })),
        }
    }

    /// Record list member mapped through a horizontal record table.
    pub fn records<R: Mapped>(
        name: &'static str,
        get: fn(&T) -> &Vec<R>,
        get_mut: fn(&mut T) -> &mut Vec<R>,
    ) -> Self {
        Self {
            name,
            ty: TypeDesc::Records(R::CLASS),
            directives: Vec::new(),
            access: Access::Records(Box::new(RecordSlot { get, get_mut })),
        }
    }

    /// Attach a compiled-in directive.
    pub fn with(mut self, directive: impl Into<Directive>) -> Self {
        self.directives.push(directive.into());
        self
    }

    /// Replace the declared type, e.g. to route a text field to a named converter.
    pub fn typed(mut self, ty: TypeDesc) -> Self {
        self.ty = ty;
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn ty(&self) -> &TypeDesc {
        &self.ty
    }

    pub fn directives(&self) -> &[Directive] {
        &self.directives
    }
}

pub(crate) enum Access<T> {
    Value(Box<dyn ValueAccess<T>>),
    Records(Box<dyn RecordsAccess<T>>),
}

pub(crate) trait ValueAccess<T> {
    fn get(&self, obj: &T) -> Value;

    /// Store a converted value. `Value::Empty` falls back to [`FieldValue::from_empty`].
    fn set(&self, obj: &mut T, value: Value) -> Result<(), ConversionError>;
}

struct Slot<T, V> {
    get: fn(&T) -> &V,
    get_mut: fn(&mut T) -> &mut V,
}

impl<T, V: FieldValue> ValueAccess<T> for Slot<T, V> {
    fn get(&self, obj: &T) -> Value {
        (self.get)(obj).to_value()
    }

    fn set(&self, obj: &mut T, value: Value) -> Result<(), ConversionError> {
        if value.is_empty() {
            if let Some(empty) = V::from_empty() {
                *(self.get_mut)(obj) = empty;
            }
            return Ok(());
        }
        *(self.get_mut)(obj) = V::from_value(value)?;
        Ok(())
    }
}

/// Cell values of one record, aligned with the bound columns.
pub(crate) type Row = Vec<Value>;

/// Failure while storing a row cell into a record element: `(row, column, error)`.
pub(crate) type RowFailure = (usize, usize, ConversionError);

pub(crate) trait RecordsAccess<T> {
    fn element_class(&self) -> &'static str;

    /// Bind the element class's `column` fields.
    fn bind_columns(&self, ctx: &BindContext<'_>) -> Result<Vec<FieldBinding>, MappingError>;

    fn len(&self, obj: &T) -> usize;

    /// Current elements as rows, for saving.
    fn export_rows(&self, obj: &T, columns: &[FieldBinding]) -> Vec<Row>;

    /// Replace the collection with elements built from loaded rows.
    fn import_rows(&self, obj: &mut T, columns: &[FieldBinding], rows: Vec<Row>) -> Vec<RowFailure>;
}

struct RecordSlot<T, R> {
    get: fn(&T) -> &Vec<R>,
    get_mut: fn(&mut T) -> &mut Vec<R>,
}

impl<T, R: Mapped> RecordsAccess<T> for RecordSlot<T, R> {
    fn element_class(&self) -> &'static str {
        R::CLASS
    }

    fn bind_columns(&self, ctx: &BindContext<'_>) -> Result<Vec<FieldBinding>, MappingError> {
        Ok(bind_class::<R>(ctx, Scope::Element)?.bindings)
    }

    fn len(&self, obj: &T) -> usize {
        (self.get)(obj).len()
    }

    fn export_rows(&self, obj: &T, columns: &[FieldBinding]) -> Vec<Row> {
        let fields = R::fields();
        (self.get)(obj)
            .iter()
            .map(|element| {
                columns
                    .iter()
                    .map(|column| match fields.get(column.index).map(|f| &f.access) {
                        Some(Access::Value(access)) => access.get(element),
                        _ => Value::Empty,
                    })
                    .collect()
            })
            .collect()
    }

    fn import_rows(&self, obj: &mut T, columns: &[FieldBinding], rows: Vec<Row>) -> Vec<RowFailure> {
        let fields = R::fields();
        let mut failures = Vec::new();
        let mut elements = Vec::with_capacity(rows.len());
        for (row_idx, row) in rows.into_iter().enumerate() {
            let mut element = R::default();
            for (col_idx, (column, value)) in columns.iter().zip(row).enumerate() {
                if let Some(Access::Value(access)) = fields.get(column.index).map(|f| &f.access) {
                    if let Err(err) = access.set(&mut element, value) {
                        failures.push((row_idx, col_idx, err));
                    }
                }
            }
            elements.push(element);
        }
        *(self.get_mut)(obj) = elements;
        failures
    }
}
