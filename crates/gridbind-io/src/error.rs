use gridbind_common::CoordError;
use thiserror::Error;

/// Failures raised by a grid backend.
#[derive(Debug, Error)]
pub enum GridError {
    #[error("cannot shift {count} row(s) at row {at}: grid is limited to {limit} rows")]
    RowLimit { at: u32, count: u32, limit: u32 },

    #[error("invalid coordinate: {0}")]
    Coord(#[from] CoordError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "json")]
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
