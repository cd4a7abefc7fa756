use crate::directive::{Directive, Directives};
use crate::error::MappingError;
use gridbind_spec::{DirectiveEntry, DirectiveKind, OverrideDocument};
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use serde_json::Value as JsonValue;

type CacheKey = (String, Option<String>);

/// Merges compiled-in directives with an optional override document.
///
/// For every directive kind, an override entry for `(class, member, kind)`
/// wins over the compiled-in directive of that kind. Members the document
/// does not mention keep their compiled-in directives. Results are cached per
/// `(class, member)` and never change afterwards, so one resolver can back
/// concurrent passes.
#[derive(Debug, Default)]
pub struct MetadataResolver {
    overrides: Option<OverrideDocument>,
    cache: RwLock<FxHashMap<CacheKey, Directives>>,
}

impl MetadataResolver {
    pub fn new(overrides: Option<OverrideDocument>) -> Self {
        Self {
            overrides,
            cache: RwLock::new(FxHashMap::default()),
        }
    }

    /// Validate the document first; any issue is a metadata error.
    pub fn with_overrides(doc: OverrideDocument) -> Result<Self, MappingError> {
        doc.validate().map_err(|err| {
            let detail = err
                .issues()
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; ");
            MappingError::metadata("override document", detail)
        })?;
        Ok(Self::new(Some(doc)))
    }

    pub fn overrides(&self) -> Option<&OverrideDocument> {
        self.overrides.as_ref()
    }

    /// Effective directives of a member, or of the class itself when `member` is `None`.
    ///
    /// An empty result means the target is unmapped.
    pub fn resolve(
        &self,
        class: &str,
        member: Option<&str>,
        compiled: &[Directive],
    ) -> Result<Directives, MappingError> {
        let key = (class.to_string(), member.map(str::to_string));
        if let Some(hit) = self.cache.read().get(&key) {
            return Ok(hit.clone());
        }

        let resolved = self.resolve_uncached(class, member, compiled)?;
        self.cache.write().insert(key, resolved.clone());
        Ok(resolved)
    }

    pub fn resolve_class(&self, class: &str, compiled: &[Directive]) -> Result<Directives, MappingError> {
        self.resolve(class, None, compiled)
    }

    /// Drop every cached resolution.
    pub fn clear_cache(&self) {
        self.cache.write().clear();
    }

    fn resolve_uncached(
        &self,
        class: &str,
        member: Option<&str>,
        compiled: &[Directive],
    ) -> Result<Directives, MappingError> {
        let mut resolved = Directives::from_list(compiled);
        let Some(entries) = self
            .overrides
            .as_ref()
            .and_then(|doc| doc.lookup(class, member))
        else {
            return Ok(resolved);
        };

        let target = match member {
            Some(m) => format!("{class}.{m}"),
            None => class.to_string(),
        };
        for entry in entries {
            let kind = DirectiveKind::parse(&entry.kind).ok_or_else(|| {
                MappingError::metadata(&target, format!("unknown directive kind `{}`", entry.kind))
            })?;
            if kind.is_class_level() != member.is_none() {
                return Err(MappingError::metadata(
                    &target,
                    format!("directive kind `{kind}` cannot be used here"),
                ));
            }
            let base = resolved.get(kind);
            let directive = synthesize(kind, entry, base.as_ref())
                .map_err(|message| MappingError::metadata(&target, message))?;
            resolved.insert(directive);
        }
        Ok(resolved)
    }
}

/// Build a concrete directive of `kind` from an override entry.
///
/// Starts from `base` (the compiled-in directive of the same kind) or the
/// kind's defaults, then applies exactly the attributes the entry names.
pub fn synthesize(
    kind: DirectiveKind,
    entry: &DirectiveEntry,
    base: Option<&Directive>,
) -> Result<Directive, String> {
    let base = base.cloned().unwrap_or_else(|| Directive::defaults(kind));
    let mut attributes = base.attributes().map_err(|e| e.to_string())?;
    let JsonValue::Object(object) = &mut attributes else {
        return Err(format!("directive `{kind}` does not serialize to an object"));
    };
    for (name, value) in &entry.attributes {
        if !object.contains_key(name) {
            return Err(format!("directive `{kind}` has no attribute `{name}`"));
        }
        object.insert(name.clone(), value.clone());
    }
    Directive::from_attributes(kind, attributes)
        .map_err(|e| format!("invalid `{kind}` attributes: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directive::{CellDirective, HintDirective, OverRecord, RecordsDirective, Terminal};
    use serde_json::json;

    fn doc() -> OverrideDocument {
        OverrideDocument::new()
            .with_member(
                "demo::Sheet",
                "records",
                vec![
                    DirectiveEntry::new(DirectiveKind::HorizontalRecords)
                        .with("over_record", "insert"),
                ],
            )
            .with_member(
                "demo::Sheet",
                "title",
                vec![DirectiveEntry::new(DirectiveKind::Hint).with("order", 4)],
            )
    }

    #[test]
    fn partial_override_keeps_compiled_attributes() {
        let resolver = MetadataResolver::new(Some(doc()));
        let compiled = vec![Directive::from(
            RecordsDirective::labelled("Users")
                .terminal(Terminal::Border)
                .range(3),
        )];
        let resolved = resolver
            .resolve("demo::Sheet", Some("records"), &compiled)
            .unwrap();
        let records = resolved.horizontal_records.unwrap();
        let mut expected = RecordsDirective::labelled("Users")
            .terminal(Terminal::Border)
            .range(3);
        expected.over_record = OverRecord::Insert;
        assert_eq!(records, expected);
    }

    #[test]
    fn override_kind_missing_from_compiled_uses_defaults() {
        let resolver = MetadataResolver::new(Some(doc()));
        let compiled = vec![Directive::from(CellDirective::at("A1"))];
        let resolved = resolver.resolve("demo::Sheet", Some("title"), &compiled).unwrap();
        assert_eq!(resolved.hint, Some(HintDirective::order(4)));
        assert_eq!(resolved.cell, Some(CellDirective::at("A1")));
    }

    #[test]
    fn unmentioned_member_keeps_compiled() {
        let resolver = MetadataResolver::new(Some(doc()));
        let compiled = vec![Directive::from(CellDirective::at("C3"))];
        let resolved = resolver.resolve("demo::Sheet", Some("other"), &compiled).unwrap();
        assert_eq!(resolved, Directives::from_list(&compiled));
        let none = resolver.resolve("demo::Sheet", Some("nothing"), &[]).unwrap();
        assert!(!none.is_mapped());
    }

    #[test]
    fn bad_attributes_are_metadata_errors() {
        let doc = OverrideDocument::new()
            .with_member(
                "demo::Sheet",
                "a",
                vec![DirectiveEntry::new(DirectiveKind::Hint).with("rank", 1)],
            )
            .with_member(
                "demo::Sheet",
                "b",
                vec![DirectiveEntry::new(DirectiveKind::Hint).with("order", "first")],
            )
            .with_member(
                "demo::Sheet",
                "c",
                vec![DirectiveEntry {
                    kind: "vertical_records".into(),
                    attributes: Default::default(),
                }],
            );
        let resolver = MetadataResolver::new(Some(doc));
        for member in ["a", "b", "c"] {
            let err = resolver.resolve("demo::Sheet", Some(member), &[]).unwrap_err();
            assert!(matches!(err, MappingError::Metadata { .. }), "{member}: {err}");
        }
    }

    #[test]
    fn resolutions_are_cached() {
        let resolver = MetadataResolver::new(None);
        let first = resolver
            .resolve("demo::Sheet", Some("x"), &[Directive::from(CellDirective::at("A1"))])
            .unwrap();
        // Compiled directives are fixed per member, so a second call hits the cache.
        let second = resolver.resolve("demo::Sheet", Some("x"), &[]).unwrap();
        assert_eq!(first, second);
        resolver.clear_cache();
        assert!(!resolver.resolve("demo::Sheet", Some("x"), &[]).unwrap().is_mapped());
    }

    #[test]
    fn synthesize_from_defaults() {
        let entry = DirectiveEntry::new(DirectiveKind::ArrayConverter).with("separator", json!(";"));
        let d = synthesize(DirectiveKind::ArrayConverter, &entry, None).unwrap();
        match d {
            Directive::Array(a) => {
                assert_eq!(a.separator, ";");
                assert!(!a.ignore_empty_item);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn invalid_document_is_rejected_up_front() {
        let doc = OverrideDocument::new().with_member(
            "demo::Sheet",
            "x",
            vec![DirectiveEntry::new(DirectiveKind::Sheet)],
        );
        assert!(matches!(
            MetadataResolver::with_overrides(doc),
            Err(MappingError::Metadata { .. })
        ));
    }
}
