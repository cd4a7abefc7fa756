use crate::config::MapperConfig;
use crate::directive::{LabelDirection, LabelledCellDirective};
use gridbind_common::Coord;
use gridbind_io::GridDocument;

/// Row-major search of the used range for a cell whose text equals `label`.
///
/// When `stop_at` is given, the search gives up at the first cell matching
/// it, so a table label is never found past its own terminator.
pub fn find_label(
    grid: &dyn GridDocument,
    label: &str,
    stop_at: Option<&str>,
    config: &MapperConfig,
) -> Option<Coord> {
    let (max_row, max_col) = grid.used_range()?;
    for row in 0..=max_row {
        for col in 0..=max_col {
            let at = Coord::new(row, col);
            if grid.is_empty(at) {
                continue;
            }
            let text = grid.text(at);
            if config.labels_match(&text, label) {
                return Some(at);
            }
            if stop_at.is_some_and(|stop| config.labels_match(&text, stop)) {
                return None;
            }
        }
    }
    None
}

/// Coordinate of the value cell for a labelled cell, if the label is present.
pub fn labelled_value(
    grid: &dyn GridDocument,
    directive: &LabelledCellDirective,
    config: &MapperConfig,
) -> Option<Coord> {
    let label_at = find_label(grid, &directive.label, None, config)?;
    let step = i64::from(directive.skip) + 1;
    let (drow, dcol) = match directive.direction {
        LabelDirection::Right => (0, step),
        LabelDirection::Left => (0, -step),
        LabelDirection::Bottom => (step, 0),
    };
    label_at.offset(drow, dcol).ok()
}
