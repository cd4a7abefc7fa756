use crate::directive::Directives;
use crate::error::{ErrorKind, MappingError};
use serde::Serialize;
use serde_json::Value as JsonValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldStatus {
    Ok,
    Skipped,
    Error,
}

/// Outcome of one top-level field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportEntry {
    pub field_path: String,
    pub status: FieldStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Structured record of a failed conversion, for validation collaborators.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldIssue {
    pub field_path: String,
    pub raw_content: String,
    pub error_kind: ErrorKind,
    /// Resolved directives of the field, keyed by kind tag.
    pub directive_attributes: JsonValue,
    pub message: String,
}

/// Receives every [`FieldIssue`] as it is produced.
pub trait IssueSink: Send + Sync {
    fn on_issue(&self, issue: &FieldIssue);
}

/// Ordered per-field outcomes of a load or save pass, plus accumulated issues.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MappingReport {
    pub entries: Vec<ReportEntry>,
    pub issues: Vec<FieldIssue>,
}

impl MappingReport {
    pub fn push(&mut self, field_path: impl Into<String>, status: FieldStatus, detail: Option<String>) {
        self.entries.push(ReportEntry {
            field_path: field_path.into(),
            status,
            detail,
        });
    }

    pub fn entry(&self, field_path: &str) -> Option<&ReportEntry> {
        self.entries.iter().find(|e| e.field_path == field_path)
    }

    pub fn status(&self, field_path: &str) -> Option<FieldStatus> {
        self.entry(field_path).map(|e| e.status)
    }

    pub fn has_errors(&self) -> bool {
        self.entries.iter().any(|e| e.status == FieldStatus::Error)
    }

    pub fn first_error(&self) -> Option<&ReportEntry> {
        self.entries.iter().find(|e| e.status == FieldStatus::Error)
    }

    /// Issues whose path is `field_path` or nested under it.
    pub fn issues_for<'a>(&'a self, field_path: &'a str) -> impl Iterator<Item = &'a FieldIssue> + 'a {
        self.issues.iter().filter(move |issue| {
            issue.field_path == field_path
                || issue
                    .field_path
                    .strip_prefix(field_path)
                    .is_some_and(|rest| rest.starts_with('[') || rest.starts_with('.'))
        })
    }
}

/// Collects data errors for one field.
///
/// In strict mode the first error is handed back to abort the pass;
/// otherwise it is recorded and the caller continues with an empty value.
pub(crate) struct IssueCollector<'a> {
    strict: bool,
    sink: Option<&'a dyn IssueSink>,
    issues: Vec<FieldIssue>,
}

impl<'a> IssueCollector<'a> {
    pub(crate) fn new(strict: bool, sink: Option<&'a dyn IssueSink>) -> Self {
        Self {
            strict,
            sink,
            issues: Vec::new(),
        }
    }

    pub(crate) fn push(
        &mut self,
        error: MappingError,
        raw_content: String,
        directives: &Directives,
    ) -> Result<(), MappingError> {
        if self.strict {
            return Err(error);
        }
        #[cfg(feature = "tracing")]
        tracing::warn!(field = error.field(), kind = %error.kind(), "{error}");
        let issue = FieldIssue {
            field_path: error.field().to_string(),
            raw_content,
            error_kind: error.kind(),
            directive_attributes: directives.to_attributes(),
            message: error.to_string(),
        };
        if let Some(sink) = self.sink {
            sink.on_issue(&issue);
        }
        self.issues.push(issue);
        Ok(())
    }

    pub(crate) fn len(&self) -> usize {
        self.issues.len()
    }

    pub(crate) fn into_issues(self) -> Vec<FieldIssue> {
        self.issues
    }
}

/// Loaded object together with the report of the pass that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Loaded<T> {
    pub value: T,
    pub report: MappingReport,
}

impl<T> Loaded<T> {
    pub fn into_inner(self) -> T {
        self.value
    }
}
