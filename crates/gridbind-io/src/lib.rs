//! Grid-document collaborator used by the gridbind mapping engine.
//!
//! The engine never parses file bytes; it talks to a [`GridDocument`] that
//! exposes cell values, hyperlinks, styles and whole-row shifts. A
//! [`MemoryGrid`] backend is provided for tests and JSON-persisted fixtures.

pub mod backends;
pub mod error;
pub mod traits;

pub use backends::MemoryGrid;
pub use error::GridError;
pub use traits::{CellData, CellStyle, GridDocument};

// Re-export for convenience
pub use gridbind_common::{CellValue, Coord};
