use std::path::PathBuf;

use gridbind_spec::{DirectiveEntry, DirectiveKind, OverrideDocument};
use serde_json::json;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn load(name: &str) -> OverrideDocument {
    let file = std::fs::File::open(fixture(name)).expect("open fixture");
    OverrideDocument::from_yaml_reader(file).expect("parse fixture")
}

#[test]
fn user_sheet_fixture_is_valid() {
    let doc = load("user_sheet.yaml");
    doc.validate().expect("fixture should validate");

    let records = doc
        .lookup("demo::UserSheet", Some("records"))
        .expect("records override");
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].kind, "horizontal_records");
    assert_eq!(records[0].attributes["table_label"], json!("User list"));
    assert_eq!(records[1].attributes["order"], json!(1));

    let sheet = doc.lookup("demo::UserSheet", None).expect("class directives");
    assert_eq!(sheet[0].attributes["name"], json!("Users"));

    assert!(doc.lookup("demo::UserSheet", Some("missing")).is_none());
    assert!(doc.lookup("demo::Other", None).is_none());
}

#[test]
fn broken_fixture_reports_every_issue() {
    let doc = load("broken.yaml");
    let err = doc.validate().expect_err("fixture should fail");
    let issues = err.into_issues();
    insta::assert_yaml_snapshot!("broken_fixture_issues", issues);
}

#[test]
fn duplicate_kinds_are_rejected() {
    let doc = OverrideDocument::new().with_member(
        "demo::Form",
        "name",
        vec![
            DirectiveEntry::new(DirectiveKind::Cell).with("row", 1),
            DirectiveEntry::new(DirectiveKind::Cell).with("row", 2),
        ],
    );
    let err = doc.validate().unwrap_err();
    assert_eq!(err.issues().len(), 1);
    assert_eq!(err.issues()[0].path, "classes.demo::Form.members.name[1].kind");
    assert!(err.issues()[0].message.contains("duplicate"));
}

#[test]
fn bad_member_name_is_reported() {
    let doc = OverrideDocument::new().with_member(
        "demo::Form",
        "not a name",
        vec![DirectiveEntry::new(DirectiveKind::Hint).with("order", 3)],
    );
    let err = doc.validate().unwrap_err();
    assert_eq!(err.issues()[0].path, "classes.demo::Form.members.not a name");
}

#[test]
fn unknown_top_level_field_fails_to_parse() {
    let yaml = "spec: gridbind\nspec_version: \"1.0.0\"\nextra: 1\n";
    assert!(OverrideDocument::from_yaml_str(yaml).is_err());
}

#[test]
fn yaml_roundtrip_preserves_entries() {
    let doc = load("user_sheet.yaml");
    let yaml = doc.to_yaml().unwrap();
    let back = OverrideDocument::from_yaml_str(&yaml).unwrap();
    assert_eq!(doc, back);
}

#[test]
fn schema_names_every_top_level_field() {
    let schema = gridbind_spec::generate_schema_value();
    let props = schema["properties"].as_object().expect("properties");
    for key in ["spec", "spec_version", "meta", "classes"] {
        assert!(props.contains_key(key), "schema missing `{key}`");
    }
}
