use std::borrow::Cow;
use std::collections::{BTreeMap, HashSet};
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use schemars::{JsonSchema, Schema, SchemaGenerator, json_schema};
use semver::Version;
use serde::de::{self, Deserializer, Visitor};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::validation::{OverrideIssue, ValidationError};

/// Current supported override document version.
pub const CURRENT_SPEC_VERSION: &str = "1.0.0";
/// Constant identifier for override documents.
pub const SPEC_IDENT: &str = "gridbind";

static CLASS_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(::[A-Za-z_][A-Za-z0-9_]*)*$")
        .expect("class name regex must compile")
});
static MEMBER_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("member name regex must compile"));

/// External description of mapping directives that replaces the ones compiled
/// into mapped classes, without rebuilding them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[schemars(
    title = "gridbind directive overrides",
    description = "Runtime replacement of the mapping directives attached to classes, keyed by class then member."
)]
#[serde(deny_unknown_fields)]
pub struct OverrideDocument {
    /// Identifier for this document format (must be `gridbind`).
    pub spec: String,
    #[serde(rename = "spec_version")]
    pub spec_version: SpecVersion,
    /// Human-facing metadata.
    #[serde(default)]
    pub meta: Option<DocumentMeta>,
    /// Overrides keyed by fully-qualified class name.
    #[serde(default)]
    pub classes: BTreeMap<String, ClassOverride>,
}

impl OverrideDocument {
    /// Construct an empty document at the current version.
    pub fn new() -> Self {
        Self {
            spec: SPEC_IDENT.to_string(),
            spec_version: SpecVersion::current(),
            meta: None,
            classes: BTreeMap::new(),
        }
    }

    /// Construct a document by reading YAML from any reader.
    pub fn from_yaml_reader<R: std::io::Read>(reader: R) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_reader(reader)
    }

    /// Construct a document from a YAML string slice.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// Construct a document from a JSON string slice.
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize this document to YAML.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }

    /// Entries for a class member, or the class-level entries when `member` is `None`.
    ///
    /// `None` means the document says nothing about that target, so compiled-in
    /// directives apply.
    pub fn lookup(&self, class: &str, member: Option<&str>) -> Option<&[DirectiveEntry]> {
        let class = self.classes.get(class)?;
        match member {
            None if class.directives.is_empty() => None,
            None => Some(class.directives.as_slice()),
            Some(name) => class.members.get(name).map(Vec::as_slice),
        }
    }

    /// Insert or replace a member's entries (builder-style helper for callers and tests).
    pub fn with_member(
        mut self,
        class: impl Into<String>,
        member: impl Into<String>,
        entries: Vec<DirectiveEntry>,
    ) -> Self {
        self.classes
            .entry(class.into())
            .or_default()
            .members
            .insert(member.into(), entries);
        self
    }

    /// Insert or replace class-level entries.
    pub fn with_class_directives(
        mut self,
        class: impl Into<String>,
        entries: Vec<DirectiveEntry>,
    ) -> Self {
        self.classes.entry(class.into()).or_default().directives = entries;
        self
    }

    /// Normalize the document in-place for deterministic comparison.
    ///
    /// - Entries of each member and class are sorted by kind tag.
    /// - Empty members are dropped.
    pub fn normalize(&mut self) {
        for class in self.classes.values_mut() {
            class.directives.sort_by(|a, b| a.kind.cmp(&b.kind));
            class.members.retain(|_, entries| !entries.is_empty());
            for entries in class.members.values_mut() {
                entries.sort_by(|a, b| a.kind.cmp(&b.kind));
            }
        }
    }

    /// Return a normalized copy of the document.
    pub fn normalized(mut self) -> Self {
        self.normalize();
        self
    }

    /// Validate the document and return granular issues when invariants fail.
    ///
    /// Attribute names and value types are checked later, when an entry is
    /// synthesized into a concrete directive.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();

        if self.spec != SPEC_IDENT {
            issues.push(OverrideIssue::new(
                "spec",
                format!(
                    "expected spec identifier `{}`, found `{}`",
                    SPEC_IDENT, self.spec
                ),
            ));
        }

        let current = SpecVersion::current();
        if self.spec_version.0.major != current.0.major {
            issues.push(OverrideIssue::new(
                "spec_version",
                format!(
                    "incompatible major version `{}` (expected `{}`)",
                    self.spec_version.0, current.0.major
                ),
            ));
        }

        for (class_name, class) in &self.classes {
            let class_path = format!("classes.{class_name}");
            if !CLASS_NAME.is_match(class_name) {
                issues.push(OverrideIssue::new(
                    &class_path,
                    "class name must be a path of identifiers separated by '::'",
                ));
            }

            check_entries(
                &mut issues,
                &format!("{class_path}.directives"),
                &class.directives,
                true,
            );

            for (member, entries) in &class.members {
                let member_path = format!("{class_path}.members.{member}");
                if !MEMBER_NAME.is_match(member) {
                    issues.push(OverrideIssue::new(
                        &member_path,
                        "member name must be an identifier",
                    ));
                }
                check_entries(&mut issues, &member_path, entries, false);
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::new(issues))
        }
    }
}

impl Default for OverrideDocument {
    fn default() -> Self {
        Self::new()
    }
}

fn check_entries(
    issues: &mut Vec<OverrideIssue>,
    path: &str,
    entries: &[DirectiveEntry],
    class_level: bool,
) {
    let mut seen = HashSet::new();
    for (idx, entry) in entries.iter().enumerate() {
        let entry_path = format!("{path}[{idx}].kind");
        let Some(kind) = DirectiveKind::parse(&entry.kind) else {
            issues.push(OverrideIssue::new(
                entry_path,
                format!("unknown directive kind `{}`", entry.kind),
            ));
            continue;
        };
        if kind.is_class_level() != class_level {
            let scope = if class_level { "class" } else { "member" };
            issues.push(OverrideIssue::new(
                &entry_path,
                format!("directive kind `{}` is not allowed at {scope} level", entry.kind),
            ));
        }
        if !seen.insert(kind) {
            issues.push(OverrideIssue::new(
                &entry_path,
                format!("duplicate directive kind `{}`", entry.kind),
            ));
        }
    }
}

/// Human-facing metadata block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct DocumentMeta {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Overrides for one class.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ClassOverride {
    /// Class-level directives (e.g. `sheet`).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub directives: Vec<DirectiveEntry>,
    /// Member directives keyed by member name.
    #[serde(default)]
    pub members: BTreeMap<String, Vec<DirectiveEntry>>,
}

/// One directive as an attribute bag plus a kind tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DirectiveEntry {
    /// Directive kind tag (`cell`, `labelled_cell`, `horizontal_records`, ...).
    pub kind: String,
    /// Attribute values; omitted attributes keep their compiled-in or default values.
    #[serde(flatten)]
    pub attributes: BTreeMap<String, JsonValue>,
}

impl DirectiveEntry {
    pub fn new(kind: DirectiveKind) -> Self {
        Self {
            kind: kind.as_str().to_string(),
            attributes: BTreeMap::new(),
        }
    }

    /// Builder-style attribute setter.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }
}

/// Every directive kind an entry may name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum DirectiveKind {
    Sheet,
    Cell,
    LabelledCell,
    HorizontalRecords,
    Column,
    Hint,
    Converter,
    ArrayConverter,
}

impl DirectiveKind {
    pub const ALL: [DirectiveKind; 8] = [
        DirectiveKind::Sheet,
        DirectiveKind::Cell,
        DirectiveKind::LabelledCell,
        DirectiveKind::HorizontalRecords,
        DirectiveKind::Column,
        DirectiveKind::Hint,
        DirectiveKind::Converter,
        DirectiveKind::ArrayConverter,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DirectiveKind::Sheet => "sheet",
            DirectiveKind::Cell => "cell",
            DirectiveKind::LabelledCell => "labelled_cell",
            DirectiveKind::HorizontalRecords => "horizontal_records",
            DirectiveKind::Column => "column",
            DirectiveKind::Hint => "hint",
            DirectiveKind::Converter => "converter",
            DirectiveKind::ArrayConverter => "array_converter",
        }
    }

    pub fn parse(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == tag.trim())
    }

    /// Kinds that attach to a class rather than to a member.
    pub fn is_class_level(self) -> bool {
        matches!(self, DirectiveKind::Sheet)
    }
}

impl fmt::Display for DirectiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Wrapper around semver::Version for serde compatibility.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct SpecVersion(pub Version);

impl SpecVersion {
    pub fn new(version: Version) -> Self {
        Self(version)
    }

    pub fn current() -> Self {
        Self(Version::parse(CURRENT_SPEC_VERSION).expect("CURRENT_SPEC_VERSION must be valid semver"))
    }
}

impl Default for SpecVersion {
    fn default() -> Self {
        Self::current()
    }
}

impl Serialize for SpecVersion {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for SpecVersion {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct VersionVisitor;

        impl<'de> Visitor<'de> for VersionVisitor {
            type Value = SpecVersion;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("semantic version string (e.g. 1.0.0)")
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Version::parse(v)
                    .map(SpecVersion)
                    .map_err(|err| de::Error::custom(format!("invalid spec_version: {err}")))
            }
        }

        deserializer.deserialize_str(VersionVisitor)
    }
}

impl JsonSchema for SpecVersion {
    fn schema_name() -> Cow<'static, str> {
        "SpecVersion".into()
    }

    fn json_schema(_generator: &mut SchemaGenerator) -> Schema {
        json_schema!({
            "type": "string",
            "pattern": r"^[0-9]+\.[0-9]+\.[0-9]+(?:-[0-9A-Za-z-.]+)?(?:\+[0-9A-Za-z-.]+)?$"
        })
    }
}

impl std::str::FromStr for OverrideDocument {
    type Err = serde_yaml::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OverrideDocument::from_yaml_str(s)
    }
}
