use std::fmt;

use serde::Serialize;

/// Single validation problem, addressed by a dotted path into the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OverrideIssue {
    pub path: String,
    pub message: String,
}

impl OverrideIssue {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for OverrideIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// All issues found while validating an override document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    issues: Vec<OverrideIssue>,
}

impl ValidationError {
    pub fn new(issues: Vec<OverrideIssue>) -> Self {
        Self { issues }
    }

    pub fn issues(&self) -> &[OverrideIssue] {
        &self.issues
    }

    pub fn into_issues(self) -> Vec<OverrideIssue> {
        self.issues
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "override document has {} issue(s)", self.issues.len())?;
        for issue in &self.issues {
            write!(f, "\n  - {issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}
