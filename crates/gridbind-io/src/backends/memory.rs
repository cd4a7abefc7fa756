use crate::error::GridError;
use crate::traits::{CellData, CellStyle, GridDocument};
use gridbind_common::{CellValue, Coord, MAX_ROWS};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
#[cfg(feature = "json")]
use std::fs::File;
#[cfg(feature = "json")]
use std::io::{BufReader, Write};
#[cfg(feature = "json")]
use std::path::Path;

#[derive(Serialize, Deserialize, Debug, Default, Clone)]
struct JsonGrid {
    #[serde(default = "default_version")]
    version: u32,
    name: String,
    #[serde(default)]
    cells: Vec<JsonCell>,
}

fn default_version() -> u32 {
    1
}

#[derive(Serialize, Deserialize, Debug, Clone)]
struct JsonCell {
    row: u32,
    col: u32,
    #[serde(default)]
    value: CellValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    hyperlink: Option<String>,
    #[serde(default, skip_serializing_if = "is_default_style")]
    style: CellStyle,
}

fn is_default_style(style: &CellStyle) -> bool {
    *style == CellStyle::default()
}

/// In-memory single-sheet grid.
///
/// Cells live in a row-major `BTreeMap`, so row shifts are a rebuild of the
/// tail of the map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryGrid {
    name: String,
    cells: BTreeMap<Coord, CellData>,
}

impl MemoryGrid {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cells: BTreeMap::new(),
        }
    }

    /// Store a value, keeping any existing hyperlink and style.
    pub fn put(&mut self, at: Coord, value: impl Into<CellValue>) -> &mut Self {
        self.cells.entry(at).or_default().value = value.into();
        self
    }

    /// Store consecutive values along a row starting at `start`.
    pub fn put_row<V, I>(&mut self, start: Coord, values: I) -> &mut Self
    where
        V: Into<CellValue>,
        I: IntoIterator<Item = V>,
    {
        for (offset, value) in values.into_iter().enumerate() {
            let at = Coord::new(start.row(), start.col() + offset as u32);
            let value = value.into();
            if !matches!(value, CellValue::Empty) {
                self.put(at, value);
            }
        }
        self
    }

    /// Box every cell in the inclusive rectangle `from..=to`.
    pub fn border_rect(&mut self, from: Coord, to: Coord) -> &mut Self {
        for row in from.row()..=to.row() {
            for col in from.col()..=to.col() {
                self.cells.entry(Coord::new(row, col)).or_default().style = CellStyle::boxed();
            }
        }
        self
    }

    pub fn cells(&self) -> impl Iterator<Item = (&Coord, &CellData)> {
        self.cells.iter()
    }

    fn prune(&mut self, at: Coord) {
        if self.cells.get(&at).is_some_and(CellData::is_vacant) {
            self.cells.remove(&at);
        }
    }

    #[cfg(feature = "json")]
    fn to_json_grid(&self) -> JsonGrid {
        JsonGrid {
            version: default_version(),
            name: self.name.clone(),
            cells: self
                .cells
                .iter()
                .map(|(at, data)| JsonCell {
                    row: at.row(),
                    col: at.col(),
                    value: data.value.clone(),
                    hyperlink: data.hyperlink.clone(),
                    style: data.style,
                })
                .collect(),
        }
    }

    #[cfg(feature = "json")]
    fn from_json_grid(js: JsonGrid) -> Result<Self, GridError> {
        let mut cells = BTreeMap::new();
        for c in js.cells {
            cells.insert(
                Coord::try_new(c.row, c.col)?,
                CellData {
                    value: c.value,
                    hyperlink: c.hyperlink,
                    style: c.style,
                },
            );
        }
        Ok(Self {
            name: js.name,
            cells,
        })
    }

    #[cfg(feature = "json")]
    pub fn to_json_string(&self) -> Result<String, GridError> {
        Ok(serde_json::to_string_pretty(&self.to_json_grid())?)
    }

    #[cfg(feature = "json")]
    pub fn from_json_str(json: &str) -> Result<Self, GridError> {
        Self::from_json_grid(serde_json::from_str(json)?)
    }

    #[cfg(feature = "json")]
    pub fn open_path<P: AsRef<Path>>(path: P) -> Result<Self, GridError> {
        let file = File::open(path.as_ref())?;
        let reader = BufReader::new(file);
        Self::from_json_grid(serde_json::from_reader(reader)?)
    }

    #[cfg(feature = "json")]
    pub fn save_to_path<P: AsRef<Path>>(&self, path: P) -> Result<(), GridError> {
        let mut file = File::create(path.as_ref())?;
        let s = serde_json::to_string_pretty(&self.to_json_grid())?;
        file.write_all(s.as_bytes())?;
        Ok(())
    }
}

impl GridDocument for MemoryGrid {
    fn sheet_name(&self) -> &str {
        &self.name
    }

    fn cell(&self, at: Coord) -> Option<CellData> {
        self.cells.get(&at).cloned()
    }

    fn set_value(&mut self, at: Coord, value: CellValue) -> Result<(), GridError> {
        self.cells.entry(at).or_default().value = value;
        self.prune(at);
        Ok(())
    }

    fn clear(&mut self, at: Coord) -> Result<(), GridError> {
        if let Some(cell) = self.cells.get_mut(&at) {
            cell.value = CellValue::Empty;
            cell.hyperlink = None;
        }
        self.prune(at);
        Ok(())
    }

    fn set_hyperlink(&mut self, at: Coord, url: &str) -> Result<(), GridError> {
        self.cells.entry(at).or_default().hyperlink = Some(url.to_string());
        Ok(())
    }

    fn set_style(&mut self, at: Coord, style: CellStyle) -> Result<(), GridError> {
        self.cells.entry(at).or_default().style = style;
        self.prune(at);
        Ok(())
    }

    fn insert_rows(&mut self, at: u32, count: u32) -> Result<(), GridError> {
        if count == 0 {
            return Ok(());
        }
        let limit_err = GridError::RowLimit {
            at,
            count,
            limit: MAX_ROWS,
        };
        let last_row = self.cells.keys().next_back().map(|c| c.row()).unwrap_or(0);
        let highest = at.max(last_row) as u64 + count as u64;
        if highest >= MAX_ROWS as u64 {
            return Err(limit_err);
        }

        let tail = self.cells.split_off(&Coord::new(at, 0));
        for (coord, data) in tail {
            self.cells
                .insert(Coord::try_new(coord.row() + count, coord.col())?, data);
        }
        Ok(())
    }

    fn delete_rows(&mut self, at: u32, count: u32) -> Result<(), GridError> {
        if count == 0 {
            return Ok(());
        }
        let Ok(split) = Coord::try_new(at, 0) else {
            return Ok(());
        };
        let tail = self.cells.split_off(&split);
        let end = at as u64 + count as u64;
        for (coord, data) in tail {
            if (coord.row() as u64) < end {
                continue;
            }
            self.cells
                .insert(Coord::try_new(coord.row() - count, coord.col())?, data);
        }
        Ok(())
    }

    fn used_range(&self) -> Option<(u32, u32)> {
        let max_row = self.cells.keys().next_back()?.row();
        let max_col = self.cells.keys().map(|c| c.col()).max()?;
        Some((max_row, max_col))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> MemoryGrid {
        let mut g = MemoryGrid::new("Sheet1");
        g.put_row(Coord::new(0, 0), ["a", "b"])
            .put_row(Coord::new(1, 0), ["c", "d"])
            .put_row(Coord::new(2, 0), ["e", "f"]);
        g
    }

    #[test]
    fn insert_shifts_rows_at_and_below() {
        let mut g = grid();
        g.insert_rows(1, 2).unwrap();
        assert_eq!(g.text(Coord::new(0, 0)), "a");
        assert!(g.is_empty(Coord::new(1, 0)));
        assert!(g.is_empty(Coord::new(2, 1)));
        assert_eq!(g.text(Coord::new(3, 0)), "c");
        assert_eq!(g.text(Coord::new(4, 1)), "f");
        assert_eq!(g.used_range(), Some((4, 1)));
    }

    #[test]
    fn delete_drops_rows_and_pulls_tail_up() {
        let mut g = grid();
        g.delete_rows(0, 2).unwrap();
        assert_eq!(g.text(Coord::new(0, 0)), "e");
        assert_eq!(g.used_range(), Some((0, 1)));
    }

    #[test]
    fn insert_past_limit_is_rejected() {
        let mut g = grid();
        let err = g.insert_rows(MAX_ROWS - 2, 5).unwrap_err();
        assert!(matches!(err, GridError::RowLimit { .. }));
        assert_eq!(g, grid());
    }

    #[test]
    fn clear_keeps_style() {
        let mut g = grid();
        g.border_rect(Coord::new(0, 0), Coord::new(0, 0));
        g.clear(Coord::new(0, 0)).unwrap();
        assert!(g.is_empty(Coord::new(0, 0)));
        assert!(g.is_bordered(Coord::new(0, 0)));
    }
}
