//! Horizontal record tables: anchor, header, body.

use crate::binding::FieldBinding;
use crate::config::MapperConfig;
use crate::convert::{CellContent, ConvertContext, ReadError, read_field, write_field};
use crate::directive::{OverRecord, RecordsDirective, RemainedRecord, Terminal};
use crate::error::MappingError;
use crate::locate::find_label;
use crate::report::IssueCollector;
use crate::schema::Row;
use crate::value::Value;
use gridbind_common::{CellValue, Coord, MAX_ROWS};
use gridbind_io::{GridDocument, GridError};

/// One header cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderColumn {
    pub label: String,
    pub coord: Coord,
}

/// A located table: header cells and the contiguous data rows below them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRegion {
    pub header: Coord,
    pub columns: Vec<HeaderColumn>,
    pub first_data_row: u32,
    /// Exclusive.
    pub terminal_row: u32,
}

impl TableRegion {
    pub fn data_rows(&self) -> u32 {
        self.terminal_row.saturating_sub(self.first_data_row)
    }

    pub fn column(&self, label: &str, config: &MapperConfig) -> Option<&HeaderColumn> {
        self.columns
            .iter()
            .find(|c| config.labels_match(&c.label, label))
    }

    /// Inclusive column span of the table.
    pub fn span(&self) -> (u32, u32) {
        let first = self.columns.first().map(|c| c.coord.col());
        let last = self.columns.last().map(|c| c.coord.col());
        match (first, last) {
            (Some(first), Some(last)) => (first, last),
            _ => (self.header.col(), self.header.col()),
        }
    }
}

/// What a save did to the grid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SaveOutcome {
    pub written: u32,
    /// Elements left unwritten under `OverRecord::Break`.
    pub truncated: u32,
    /// `(at, count)` of inserted rows.
    pub inserted: Option<(u32, u32)>,
    /// `(at, count)` of deleted rows.
    pub deleted: Option<(u32, u32)>,
    pub cleared: u32,
}

/// Scans and writes horizontal record tables.
#[derive(Debug, Clone, Copy)]
pub struct RecordTableScanner<'a> {
    config: &'a MapperConfig,
}

impl<'a> RecordTableScanner<'a> {
    pub fn new(config: &'a MapperConfig) -> Self {
        Self { config }
    }

    /// Header anchor from a label search, else from explicit coordinates.
    ///
    /// `Ok(None)` means the table label is not on the grid, or the directive
    /// names no anchor at all.
    pub fn anchor(
        &self,
        grid: &dyn GridDocument,
        field: &str,
        directive: &RecordsDirective,
    ) -> Result<Option<Coord>, MappingError> {
        let Some(label) = &directive.table_label else {
            return directive
                .explicit_anchor()
                .map_err(|message| MappingError::metadata(field, message));
        };
        let found = find_label(
            grid,
            label,
            directive.terminate_label.as_deref(),
            self.config,
        );
        match found {
            Some(at) => at
                .offset(i64::from(directive.bottom), 0)
                .map(Some)
                .map_err(|e| MappingError::Structural {
                    field: field.to_string(),
                    message: e.to_string(),
                }),
            None => Ok(None),
        }
    }

    /// Header cells starting at `anchor`, scanning rightwards.
    ///
    /// At an empty column, up to `range` further columns are checked for the
    /// next header; the header ends when none is found or `limit` (when
    /// non-zero) entries have been read.
    pub fn scan_header(
        &self,
        grid: &dyn GridDocument,
        anchor: Coord,
        range: u32,
        limit: u32,
    ) -> Vec<HeaderColumn> {
        let Some((_, max_col)) = grid.used_range() else {
            return Vec::new();
        };
        let row = anchor.row();
        let mut columns = Vec::new();
        let mut col = anchor.col();
        while col <= max_col {
            if limit > 0 && columns.len() >= limit as usize {
                break;
            }
            let at = Coord::new(row, col);
            if !grid.is_empty(at) {
                columns.push(HeaderColumn {
                    label: grid.text(at).trim().to_string(),
                    coord: at,
                });
                col += 1;
                continue;
            }
            let next = (1..=range)
                .map(|k| col.saturating_add(k))
                .take_while(|c| *c <= max_col)
                .find(|c| !grid.is_empty(Coord::new(row, *c)));
            match next {
                Some(c) => col = c,
                None => break,
            }
        }
        columns
    }

    /// First row at or after `first` that ends the table body (exclusive bound).
    pub fn terminal_row(
        &self,
        grid: &dyn GridDocument,
        first: u32,
        key_col: u32,
        directive: &RecordsDirective,
    ) -> u32 {
        let Some((max_row, max_col)) = grid.used_range() else {
            return first;
        };
        let limit = first.saturating_add(self.config.max_scan_rows).min(MAX_ROWS);
        let mut row = first;
        while row <= max_row && row < limit {
            if let Some(stop) = &directive.terminate_label {
                let hit = (0..=max_col).any(|col| {
                    let at = Coord::new(row, col);
                    !grid.is_empty(at) && self.config.labels_match(&grid.text(at), stop)
                });
                if hit {
                    break;
                }
            }
            let key = Coord::new(row, key_col);
            let ends = match directive.terminal {
                Terminal::Empty => grid.is_empty(key),
                Terminal::Border => !grid.is_bordered(key),
            };
            if ends {
                break;
            }
            row += 1;
        }
        row
    }

    /// Locate the table for a bound record field. `Ok(None)` when the anchor is missing.
    pub fn locate(
        &self,
        grid: &dyn GridDocument,
        field: &str,
        directive: &RecordsDirective,
        columns: &[FieldBinding],
    ) -> Result<Option<TableRegion>, MappingError> {
        let Some(header) = self.anchor(grid, field, directive)? else {
            return Ok(None);
        };
        let header_columns = self.scan_header(grid, header, directive.range, directive.header_limit);
        let mut region = TableRegion {
            header,
            columns: header_columns,
            first_data_row: header.row() + 1,
            terminal_row: header.row() + 1,
        };

        let key_col = self
            .placements(field, &region, columns)
            .ok()
            .and_then(|p| p.into_iter().flatten().min())
            .unwrap_or(header.col());
        region.terminal_row = self.terminal_row(grid, region.first_data_row, key_col, directive);

        #[cfg(feature = "tracing")]
        tracing::debug!(
            field,
            header = %region.header,
            columns = region.columns.len(),
            rows = region.data_rows(),
            "located record table"
        );
        Ok(Some(region))
    }

    /// Grid column of each bound column, `None` for optional columns missing from the header.
    pub fn placements(
        &self,
        field: &str,
        region: &TableRegion,
        columns: &[FieldBinding],
    ) -> Result<Vec<Option<u32>>, MappingError> {
        columns
            .iter()
            .map(|binding| {
                let Some(label) = column_label(binding) else {
                    return Ok(None);
                };
                match region.column(label, self.config) {
                    Some(header) => Ok(Some(header.coord.col())),
                    None if column_optional(binding) => Ok(None),
                    None => Err(MappingError::AnchorNotFound {
                        field: format!("{field}.{}", binding.name),
                        what: format!("header column `{label}`"),
                    }),
                }
            })
            .collect()
    }

    /// Convert every data row. Cell failures go through `issues`.
    pub(crate) fn read_rows(
        &self,
        grid: &dyn GridDocument,
        field: &str,
        region: &TableRegion,
        columns: &[FieldBinding],
        placements: &[Option<u32>],
        issues: &mut IssueCollector<'_>,
    ) -> Result<Vec<Row>, MappingError> {
        let contexts = contexts(columns, self.config);
        let mut rows = Vec::with_capacity(region.data_rows() as usize);
        for (idx, row) in (region.first_data_row..region.terminal_row).enumerate() {
            let mut values = Vec::with_capacity(columns.len());
            for ((binding, placement), ctx) in columns.iter().zip(placements).zip(&contexts) {
                let (Some(col), Some(converter)) = (placement, binding.converter.as_deref()) else {
                    values.push(Value::Empty);
                    continue;
                };
                let at = Coord::new(row, *col);
                let cell = CellContent::from_grid(grid, at);
                let path = format!("{field}[{idx}].{}", binding.name);
                let value = match read_field(converter, &cell, ctx) {
                    Ok(value) => value,
                    Err(ReadError::Conversion(source)) => {
                        let raw = cell.value.to_string();
                        issues.push(
                            MappingError::Conversion {
                                field: path,
                                at,
                                source,
                            },
                            raw,
                            &binding.directives,
                        )?;
                        Value::Empty
                    }
                    Err(ReadError::Missing) => {
                        issues.push(
                            MappingError::MissingValue { field: path, at },
                            String::new(),
                            &binding.directives,
                        )?;
                        Value::Empty
                    }
                };
                values.push(value);
            }
            rows.push(values);
        }
        Ok(rows)
    }

    /// Write `rows` into the table, growing or shrinking it per the directive's policies.
    ///
    /// Row shifts happen before any cell is written. A failed shift leaves
    /// the grid as the backend left it.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn write_rows(
        &self,
        grid: &mut dyn GridDocument,
        field: &str,
        directive: &RecordsDirective,
        region: &TableRegion,
        columns: &[FieldBinding],
        placements: &[Option<u32>],
        rows: &[Row],
        issues: &mut IssueCollector<'_>,
    ) -> Result<SaveOutcome, MappingError> {
        let grid_err = |e: GridError| MappingError::from_grid(field, e);
        let existing = region.data_rows();
        let wanted = u32::try_from(rows.len())
            .ok()
            .filter(|m| *m < MAX_ROWS)
            .ok_or_else(|| MappingError::Structural {
                field: field.to_string(),
                message: format!("{} records exceed the grid row limit", rows.len()),
            })?;
        let first = region.first_data_row;
        let (span_start, span_end) = region.span();
        let mut outcome = SaveOutcome::default();
        let mut writable = wanted;

        if wanted > existing {
            let extra = wanted - existing;
            match directive.over_record {
                OverRecord::Break => {
                    writable = existing;
                    outcome.truncated = extra;
                    #[cfg(feature = "tracing")]
                    tracing::warn!(field, extra, "table is full; remaining records not written");
                }
                OverRecord::Error => {
                    return Err(MappingError::Structural {
                        field: field.to_string(),
                        message: format!("{wanted} records do not fit the {existing} rows of the table"),
                    });
                }
                OverRecord::Insert => {
                    let at = region.terminal_row;
                    grid.insert_rows(at, extra).map_err(grid_err)?;
                    // The row above is the last data row, or the header for an empty table.
                    let template = at - 1;
                    for col in span_start..=span_end {
                        let style = grid.style(Coord::new(template, col));
                        if style == Default::default() {
                            continue;
                        }
                        for row in at..at + extra {
                            grid.set_style(Coord::new(row, col), style).map_err(grid_err)?;
                        }
                    }
                    outcome.inserted = Some((at, extra));
                    #[cfg(feature = "tracing")]
                    tracing::debug!(field, at, count = extra, "inserted rows");
                }
            }
        } else if wanted < existing {
            let surplus = existing - wanted;
            let at = first + wanted;
            match directive.remained_record {
                RemainedRecord::None => {}
                RemainedRecord::Clear => {
                    for row in at..region.terminal_row {
                        for col in span_start..=span_end {
                            grid.clear(Coord::new(row, col)).map_err(grid_err)?;
                        }
                    }
                    outcome.cleared = surplus;
                }
                RemainedRecord::Delete => {
                    // Whole rows go, including cells right of the table span;
                    // only `Clear` confines itself to the span.
                    grid.delete_rows(at, surplus).map_err(grid_err)?;
                    outcome.deleted = Some((at, surplus));
                    #[cfg(feature = "tracing")]
                    tracing::debug!(field, at, count = surplus, "deleted rows");
                }
            }
        }

        let contexts = contexts(columns, self.config);
        for (idx, values) in rows.iter().take(writable as usize).enumerate() {
            let row = first + idx as u32;
            for (((binding, placement), ctx), value) in columns
                .iter()
                .zip(placements)
                .zip(&contexts)
                .zip(values)
            {
                let (Some(col), Some(converter)) = (placement, binding.converter.as_deref()) else {
                    continue;
                };
                let at = Coord::new(row, *col);
                match write_field(converter, value, ctx) {
                    Ok(content) => put_cell(grid, at, content, ctx).map_err(grid_err)?,
                    Err(source) => issues.push(
                        MappingError::Conversion {
                            field: format!("{field}[{idx}].{}", binding.name),
                            at,
                            source,
                        },
                        value.to_string(),
                        &binding.directives,
                    )?,
                }
            }
            outcome.written += 1;
        }
        Ok(outcome)
    }
}

fn column_label(binding: &FieldBinding) -> Option<&str> {
    match &binding.target {
        crate::binding::Target::Column(column) => Some(column.label.as_str()),
        _ => None,
    }
}

fn column_optional(binding: &FieldBinding) -> bool {
    matches!(&binding.target, crate::binding::Target::Column(column) if column.optional)
}

fn contexts(columns: &[FieldBinding], config: &MapperConfig) -> Vec<ConvertContext> {
    columns
        .iter()
        .map(|b| ConvertContext::from_directives(&b.directives, config.trim_text))
        .collect()
}

/// Store converted content: value (or clear), hyperlink, and text-fit flags.
pub(crate) fn put_cell(
    grid: &mut dyn GridDocument,
    at: Coord,
    content: CellContent,
    ctx: &ConvertContext,
) -> Result<(), GridError> {
    if matches!(content.value, CellValue::Empty) {
        grid.clear(at)?;
    } else {
        grid.set_value(at, content.value)?;
    }
    if let Some(link) = &content.hyperlink {
        grid.set_hyperlink(at, link)?;
    }
    if ctx.converter.wrap_text || ctx.converter.shrink_to_fit {
        let mut style = grid.style(at);
        style.wrap_text |= ctx.converter.wrap_text;
        style.shrink_to_fit |= ctx.converter.shrink_to_fit;
        grid.set_style(at, style)?;
    }
    Ok(())
}
