use crate::binding::{BindContext, BoundClass, FieldBinding, Scope, Target, bind_class};
use crate::config::MapperConfig;
use crate::convert::{CellContent, ConvertContext, ConverterRegistry, ReadError, read_field, write_field};
use crate::directive::RecordsDirective;
use crate::error::MappingError;
use crate::locate::labelled_value;
use crate::metadata::MetadataResolver;
use crate::position::PositionIndex;
use crate::records::{RecordTableScanner, put_cell};
use crate::report::{FieldStatus, IssueCollector, IssueSink, Loaded, MappingReport};
use crate::schema::{Access, Mapped, RecordsAccess, ValueAccess};
use crate::value::Value;
use gridbind_common::Coord;
use gridbind_io::GridDocument;
use gridbind_spec::OverrideDocument;
use std::sync::Arc;

/// How a single field ended.
enum FieldOutcome {
    Done { at: Coord, detail: Option<String> },
    Skipped(String),
}

/// Entry point: loads objects from grids and saves them back.
///
/// A mapper is cheap to clone and safe to share; the resolver cache and
/// the converter registry are the only shared state. Callers must not run
/// two passes against the same grid at once.
#[derive(Clone)]
pub struct Mapper {
    resolver: Arc<MetadataResolver>,
    registry: Arc<ConverterRegistry>,
    config: MapperConfig,
    sink: Option<Arc<dyn IssueSink>>,
}

impl Default for Mapper {
    fn default() -> Self {
        Self::new()
    }
}

impl Mapper {
    /// Default converters, no overrides, default configuration.
    pub fn new() -> Self {
        Self {
            resolver: Arc::new(MetadataResolver::default()),
            registry: Arc::new(ConverterRegistry::with_defaults()),
            config: MapperConfig::default(),
            sink: None,
        }
    }

    pub fn with_registry(mut self, registry: Arc<ConverterRegistry>) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_resolver(mut self, resolver: Arc<MetadataResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    /// Validate `doc` and use it to override compiled-in directives.
    pub fn with_overrides(self, doc: OverrideDocument) -> Result<Self, MappingError> {
        let resolver = MetadataResolver::with_overrides(doc)?;
        Ok(self.with_resolver(Arc::new(resolver)))
    }

    pub fn with_config(mut self, config: MapperConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_issue_sink(mut self, sink: Arc<dyn IssueSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn config(&self) -> &MapperConfig {
        &self.config
    }

    pub fn resolver(&self) -> &MetadataResolver {
        &self.resolver
    }

    pub fn registry(&self) -> &ConverterRegistry {
        &self.registry
    }

    /// Resolve directives, converters and processing order for `T` without touching a grid.
    pub fn bind<T: Mapped>(&self) -> Result<BoundClass<T>, MappingError> {
        let ctx = BindContext {
            resolver: &self.resolver,
            registry: &self.registry,
        };
        bind_class::<T>(&ctx, Scope::Root)
    }

    /// Build a `T` from the grid.
    pub fn load<T: Mapped>(&self, grid: &dyn GridDocument) -> Result<Loaded<T>, MappingError> {
        #[cfg(feature = "tracing")]
        let _span = tracing::info_span!("gridbind_load", class = T::CLASS, sheet = grid.sheet_name()).entered();

        let bound = self.bind::<T>()?;
        check_sheet(&bound, grid)?;

        let mut value = T::default();
        let mut report = MappingReport::default();
        let mut positions = PositionIndex::new();
        for binding in &bound.bindings {
            let Some(field) = bound.field(binding) else {
                continue;
            };
            let mut issues = IssueCollector::new(self.config.strict, self.sink.as_deref());
            let result = match (&binding.target, &field.access) {
                (Target::Records { directive, columns, .. }, Access::Records(records)) => self
                    .load_records(grid, binding, directive, columns, records.as_ref(), &mut value, &mut issues),
                (_, Access::Value(access)) => {
                    self.load_value(grid, binding, access.as_ref(), &mut value, &mut issues)
                }
                _ => Err(target_mismatch::<T>(binding)),
            };
            if let Some(at) = self.settle(&mut report, binding, result, issues)? {
                positions.record(binding.name, at);
            }
        }

        if let Some(index) = value.positions_mut() {
            *index = positions;
        }
        Ok(Loaded { value, report })
    }

    /// Write `value` into the grid.
    ///
    /// Record tables may grow or shrink the grid; the host's position index,
    /// when tracked, is shifted right after each such change.
    pub fn save<T: Mapped>(
        &self,
        value: &mut T,
        grid: &mut dyn GridDocument,
    ) -> Result<MappingReport, MappingError> {
        #[cfg(feature = "tracing")]
        let _span = tracing::info_span!("gridbind_save", class = T::CLASS, sheet = grid.sheet_name()).entered();

        let bound = self.bind::<T>()?;
        check_sheet(&bound, grid)?;

        let mut report = MappingReport::default();
        for binding in &bound.bindings {
            let Some(field) = bound.field(binding) else {
                continue;
            };
            let mut issues = IssueCollector::new(self.config.strict, self.sink.as_deref());
            let result = match (&binding.target, &field.access) {
                (Target::Records { directive, columns, .. }, Access::Records(records)) => self
                    .save_records(grid, binding, directive, columns, records.as_ref(), value, &mut issues),
                (_, Access::Value(access)) => {
                    self.save_value(grid, binding, access.as_ref(), value, &mut issues)
                }
                _ => Err(target_mismatch::<T>(binding)),
            };
            if let Some(at) = self.settle(&mut report, binding, result, issues)? {
                if let Some(index) = value.positions_mut() {
                    index.record(binding.name, at);
                }
            }
        }
        Ok(report)
    }

    /// Fold a field result into the report; configuration errors (and data
    /// errors in strict mode) abort the pass.
    fn settle(
        &self,
        report: &mut MappingReport,
        binding: &FieldBinding,
        result: Result<FieldOutcome, MappingError>,
        issues: IssueCollector<'_>,
    ) -> Result<Option<Coord>, MappingError> {
        let issue_count = issues.len();
        report.issues.extend(issues.into_issues());
        match result {
            Ok(FieldOutcome::Done { at, detail }) => {
                if issue_count > 0 {
                    report.push(
                        binding.name,
                        FieldStatus::Error,
                        Some(format!("{issue_count} cell issue(s)")),
                    );
                } else {
                    report.push(binding.name, FieldStatus::Ok, detail);
                }
                Ok(Some(at))
            }
            Ok(FieldOutcome::Skipped(reason)) => {
                #[cfg(feature = "tracing")]
                tracing::debug!(field = binding.name, %reason, "skipped optional field");
                report.push(binding.name, FieldStatus::Skipped, Some(reason));
                Ok(None)
            }
            Err(err) => {
                if err.aborts_pass() || (self.config.strict && err.is_data_error()) {
                    return Err(err);
                }
                #[cfg(feature = "tracing")]
                tracing::warn!(field = binding.name, kind = %err.kind(), "{err}");
                report.push(binding.name, FieldStatus::Error, Some(err.to_string()));
                Ok(None)
            }
        }
    }

    /// Value cell of a single-cell field; `None` when an optional label is absent.
    fn cell_coord(
        &self,
        grid: &dyn GridDocument,
        binding: &FieldBinding,
    ) -> Result<Option<Coord>, MappingError> {
        match &binding.target {
            Target::Cell(at) => Ok(Some(*at)),
            Target::Labelled(directive) => match labelled_value(grid, directive, &self.config) {
                Some(at) => Ok(Some(at)),
                None if directive.optional => Ok(None),
                None => Err(MappingError::AnchorNotFound {
                    field: binding.name.to_string(),
                    what: format!("label `{}`", directive.label),
                }),
            },
            _ => Err(MappingError::metadata(binding.name, "field is not a single cell")),
        }
    }

    fn load_value<T>(
        &self,
        grid: &dyn GridDocument,
        binding: &FieldBinding,
        access: &dyn ValueAccess<T>,
        value: &mut T,
        issues: &mut IssueCollector<'_>,
    ) -> Result<FieldOutcome, MappingError> {
        let Some(at) = self.cell_coord(grid, binding)? else {
            return Ok(FieldOutcome::Skipped("label not found".to_string()));
        };
        let converter = binding
            .converter
            .as_deref()
            .ok_or_else(|| MappingError::metadata(binding.name, "field has no converter"))?;
        let ctx = ConvertContext::from_directives(&binding.directives, self.config.trim_text);
        let cell = CellContent::from_grid(grid, at);
        let field = binding.name.to_string();

        let converted = match read_field(converter, &cell, &ctx) {
            Ok(v) => v,
            Err(ReadError::Conversion(source)) => {
                let raw = cell.value.to_string();
                issues.push(
                    MappingError::Conversion { field, at, source },
                    raw,
                    &binding.directives,
                )?;
                Value::Empty
            }
            Err(ReadError::Missing) => {
                issues.push(
                    MappingError::MissingValue { field, at },
                    String::new(),
                    &binding.directives,
                )?;
                Value::Empty
            }
        };
        if let Err(source) = access.set(value, converted) {
            issues.push(
                MappingError::Conversion {
                    field: binding.name.to_string(),
                    at,
                    source,
                },
                cell.value.to_string(),
                &binding.directives,
            )?;
        }
        Ok(FieldOutcome::Done { at, detail: None })
    }

    fn save_value<T>(
        &self,
        grid: &mut dyn GridDocument,
        binding: &FieldBinding,
        access: &dyn ValueAccess<T>,
        value: &T,
        issues: &mut IssueCollector<'_>,
    ) -> Result<FieldOutcome, MappingError> {
        let Some(at) = self.cell_coord(grid, binding)? else {
            return Ok(FieldOutcome::Skipped("label not found".to_string()));
        };
        let converter = binding
            .converter
            .as_deref()
            .ok_or_else(|| MappingError::metadata(binding.name, "field has no converter"))?;
        let ctx = ConvertContext::from_directives(&binding.directives, self.config.trim_text);
        let current = access.get(value);

        match write_field(converter, &current, &ctx) {
            Ok(content) => put_cell(grid, at, content, &ctx)
                .map_err(|e| MappingError::from_grid(binding.name, e))?,
            Err(source) => issues.push(
                MappingError::Conversion {
                    field: binding.name.to_string(),
                    at,
                    source,
                },
                current.to_string(),
                &binding.directives,
            )?,
        }
        Ok(FieldOutcome::Done { at, detail: None })
    }

    #[allow(clippy::too_many_arguments)]
    fn load_records<T>(
        &self,
        grid: &dyn GridDocument,
        binding: &FieldBinding,
        directive: &RecordsDirective,
        columns: &[FieldBinding],
        records: &dyn RecordsAccess<T>,
        value: &mut T,
        issues: &mut IssueCollector<'_>,
    ) -> Result<FieldOutcome, MappingError> {
        #[cfg(feature = "tracing")]
        let _span = tracing::info_span!("record_table", field = binding.name, element = records.element_class()).entered();

        let scanner = RecordTableScanner::new(&self.config);
        let Some(region) = scanner.locate(grid, binding.name, directive, columns)? else {
            return missing_table(binding, directive);
        };
        let placements = scanner.placements(binding.name, &region, columns)?;
        let rows = scanner.read_rows(grid, binding.name, &region, columns, &placements, issues)?;
        let count = rows.len();

        for (row, col, source) in records.import_rows(value, columns, rows) {
            let at = Coord::new(
                region.first_data_row + row as u32,
                placements
                    .get(col)
                    .copied()
                    .flatten()
                    .unwrap_or(region.header.col()),
            );
            let name = columns.get(col).map(|c| c.name).unwrap_or_default();
            issues.push(
                MappingError::Conversion {
                    field: format!("{}[{row}].{name}", binding.name),
                    at,
                    source,
                },
                grid.text(at),
                columns.get(col).map(|c| &c.directives).unwrap_or(&binding.directives),
            )?;
        }

        Ok(FieldOutcome::Done {
            at: region.header,
            detail: Some(format!("{count} record(s)")),
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn save_records<T: Mapped>(
        &self,
        grid: &mut dyn GridDocument,
        binding: &FieldBinding,
        directive: &RecordsDirective,
        columns: &[FieldBinding],
        records: &dyn RecordsAccess<T>,
        value: &mut T,
        issues: &mut IssueCollector<'_>,
    ) -> Result<FieldOutcome, MappingError> {
        #[cfg(feature = "tracing")]
        let _span = tracing::info_span!("record_table", field = binding.name, element = records.element_class()).entered();

        let scanner = RecordTableScanner::new(&self.config);
        let Some(region) = scanner.locate(&*grid, binding.name, directive, columns)? else {
            return missing_table(binding, directive);
        };
        let placements = scanner.placements(binding.name, &region, columns)?;
        let rows = records.export_rows(value, columns);
        let outcome = scanner.write_rows(
            grid,
            binding.name,
            directive,
            &region,
            columns,
            &placements,
            &rows,
            issues,
        )?;

        if let Some(index) = value.positions_mut() {
            if let Some((at, count)) = outcome.inserted {
                index.rows_inserted(at, count);
            }
            if let Some((at, count)) = outcome.deleted {
                index.rows_deleted(at, count);
            }
        }

        let detail = if outcome.truncated > 0 {
            format!(
                "{} of {} record(s) written, {} truncated",
                outcome.written,
                records.len(value),
                outcome.truncated
            )
        } else {
            format!("{} record(s) written", outcome.written)
        };
        Ok(FieldOutcome::Done {
            at: region.header,
            detail: Some(detail),
        })
    }
}

fn missing_table(
    binding: &FieldBinding,
    directive: &RecordsDirective,
) -> Result<FieldOutcome, MappingError> {
    let what = match &directive.table_label {
        Some(label) => format!("table label `{label}`"),
        None => "table anchor".to_string(),
    };
    if directive.optional {
        Ok(FieldOutcome::Skipped(format!("{what} not found")))
    } else {
        Err(MappingError::AnchorNotFound {
            field: binding.name.to_string(),
            what,
        })
    }
}

fn check_sheet<T: Mapped>(
    bound: &BoundClass<T>,
    grid: &dyn GridDocument,
) -> Result<(), MappingError> {
    match &bound.class_directives.sheet {
        Some(sheet) if !sheet.name.is_empty() && sheet.name != grid.sheet_name() => {
            Err(MappingError::AnchorNotFound {
                field: T::CLASS.to_string(),
                what: format!("sheet `{}`", sheet.name),
            })
        }
        _ => Ok(()),
    }
}

fn target_mismatch<T: Mapped>(binding: &FieldBinding) -> MappingError {
    MappingError::metadata(
        format!("{}.{}", T::CLASS, binding.name),
        "binding target does not match the field accessor",
    )
}
