use gridbind_common::MAX_ROWS;
use serde::{Deserialize, Serialize};

/// Caller-selected behavior of a mapping pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MapperConfig {
    /// Abort on the first conversion or missing-value error instead of reporting it.
    pub strict: bool,
    /// Trim cell text before conversion (a field's `converter.trim` can still opt out).
    pub trim_text: bool,
    /// Collapse runs of whitespace when comparing labels.
    pub normalize_labels: bool,
    /// Upper bound on the number of body rows a table scan visits.
    pub max_scan_rows: u32,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            strict: false,
            trim_text: true,
            normalize_labels: false,
            max_scan_rows: MAX_ROWS,
        }
    }
}

impl MapperConfig {
    pub fn strict() -> Self {
        Self {
            strict: true,
            ..Self::default()
        }
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// Compare two labels under the configured normalization.
    pub fn labels_match(&self, cell_text: &str, label: &str) -> bool {
        if self.normalize_labels {
            let collapse = |s: &str| s.split_whitespace().collect::<Vec<_>>().join(" ");
            collapse(cell_text) == collapse(label)
        } else {
            cell_text.trim() == label.trim()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yaml_overrides_only_named_keys() {
        let cfg = MapperConfig::from_yaml_str("strict: true\nmax_scan_rows: 500\n").unwrap();
        assert!(cfg.strict);
        assert!(cfg.trim_text);
        assert_eq!(cfg.max_scan_rows, 500);
        assert!(MapperConfig::from_yaml_str("verbose: true\n").is_err());
    }

    #[test]
    fn label_matching() {
        let plain = MapperConfig::default();
        assert!(plain.labels_match("  User list ", "User list"));
        assert!(!plain.labels_match("User   list", "User list"));
        let normalized = MapperConfig {
            normalize_labels: true,
            ..MapperConfig::default()
        };
        assert!(normalized.labels_match("User \n list", "User list"));
    }
}
