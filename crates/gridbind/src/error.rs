use gridbind_common::Coord;
use gridbind_io::GridError;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Coarse classification of a [`MappingError`], carried in reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Metadata,
    ConverterNotFound,
    Conversion,
    MissingValue,
    AnchorNotFound,
    Structural,
    Grid,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::Metadata => "metadata",
            ErrorKind::ConverterNotFound => "converter_not_found",
            ErrorKind::Conversion => "conversion",
            ErrorKind::MissingValue => "missing_value",
            ErrorKind::AnchorNotFound => "anchor_not_found",
            ErrorKind::Structural => "structural",
            ErrorKind::Grid => "grid",
        };
        f.write_str(s)
    }
}

/// A cell's content could not be turned into (or produced from) the target type.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("cannot convert `{raw}` to {target}: {reason}")]
pub struct ConversionError {
    pub raw: String,
    pub target: String,
    pub reason: String,
}

impl ConversionError {
    pub fn new(raw: impl Into<String>, target: impl fmt::Display, reason: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            target: target.to_string(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum MappingError {
    /// Malformed or unresolvable directive, either compiled-in or from an override document.
    #[error("metadata error at {target}: {message}")]
    Metadata { target: String, message: String },

    #[error("no converter for type `{ty}` of field `{field}`")]
    ConverterNotFound { field: String, ty: String },

    #[error("field `{field}` at {at}: {source}")]
    Conversion {
        field: String,
        at: Coord,
        #[source]
        source: ConversionError,
    },

    #[error("field `{field}` is mandatory but cell {at} is empty")]
    MissingValue { field: String, at: Coord },

    #[error("field `{field}`: {what} not found")]
    AnchorNotFound { field: String, what: String },

    #[error("field `{field}`: {message}")]
    Structural { field: String, message: String },

    #[error("field `{field}`: {source}")]
    Grid {
        field: String,
        #[source]
        source: GridError,
    },
}

impl MappingError {
    pub fn metadata(target: impl Into<String>, message: impl Into<String>) -> Self {
        MappingError::Metadata {
            target: target.into(),
            message: message.into(),
        }
    }

    /// Wrap a collaborator failure; row-limit violations are structural.
    pub fn from_grid(field: impl Into<String>, err: GridError) -> Self {
        let field = field.into();
        match err {
            GridError::RowLimit { .. } => MappingError::Structural {
                field,
                message: err.to_string(),
            },
            other => MappingError::Grid {
                field,
                source: other,
            },
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            MappingError::Metadata { .. } => ErrorKind::Metadata,
            MappingError::ConverterNotFound { .. } => ErrorKind::ConverterNotFound,
            MappingError::Conversion { .. } => ErrorKind::Conversion,
            MappingError::MissingValue { .. } => ErrorKind::MissingValue,
            MappingError::AnchorNotFound { .. } => ErrorKind::AnchorNotFound,
            MappingError::Structural { .. } => ErrorKind::Structural,
            MappingError::Grid { .. } => ErrorKind::Grid,
        }
    }

    /// Configuration errors abort the whole pass; everything else is scoped to a field.
    pub fn aborts_pass(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Metadata | ErrorKind::ConverterNotFound
        )
    }

    /// Data errors whose handling depends on `MapperConfig::strict`.
    pub fn is_data_error(&self) -> bool {
        matches!(self.kind(), ErrorKind::Conversion | ErrorKind::MissingValue)
    }

    /// Field path (or class/target name for metadata errors) the error is about.
    pub fn field(&self) -> &str {
        match self {
            MappingError::Metadata { target, .. } => target,
            MappingError::ConverterNotFound { field, .. }
            | MappingError::Conversion { field, .. }
            | MappingError::MissingValue { field, .. }
            | MappingError::AnchorNotFound { field, .. }
            | MappingError::Structural { field, .. }
            | MappingError::Grid { field, .. } => field,
        }
    }
}
