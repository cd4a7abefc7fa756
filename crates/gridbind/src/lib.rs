//! Declarative binding between typed Rust objects and grid documents.
//!
//! A host type implements [`Mapped`], listing its fields together with the
//! directives that place them on the grid: a fixed [`CellDirective`], a
//! [`LabelledCellDirective`] found next to a label, or a horizontal record
//! table ([`RecordsDirective`]) whose element type maps its own fields to
//! header columns. Directives can be replaced per deployment through a
//! `gridbind_spec::OverrideDocument` without recompiling the host type.
//!
//! [`Mapper::load`] builds a value from any [`GridDocument`];
//! [`Mapper::save`] writes it back, growing or shrinking record tables as
//! their policies allow.

mod binding;
mod config;
pub mod convert;
mod directive;
mod error;
pub mod locate;
mod mapper;
mod metadata;
mod order;
mod position;
pub mod records;
mod report;
mod schema;
mod value;

pub use binding::{BindContext, BoundClass, FieldBinding, Target};
pub use config::MapperConfig;
pub use convert::{CellContent, CellConverter, ConvertContext, ConverterRegistry};
pub use directive::{
    ArrayDirective, CellDirective, ColumnDirective, ConverterDirective, Directive, Directives,
    HintDirective, LabelDirection, LabelledCellDirective, OverRecord, RecordsDirective,
    RemainedRecord, SheetDirective, Terminal,
};
pub use error::{ConversionError, ErrorKind, MappingError};
pub use mapper::Mapper;
pub use metadata::MetadataResolver;
pub use order::resolve_order;
pub use position::PositionIndex;
pub use records::{RecordTableScanner, SaveOutcome, TableRegion};
pub use report::{FieldIssue, FieldStatus, IssueSink, Loaded, MappingReport, ReportEntry};
pub use schema::{Field, Mapped};
pub use value::{FieldValue, TypeDesc, Value};

pub use gridbind_common::{CellValue, Coord};
pub use gridbind_io::{CellData, CellStyle, GridDocument, GridError, MemoryGrid};
pub use gridbind_spec::{DirectiveEntry, DirectiveKind, OverrideDocument};
