mod common;

use common::*;
use gridbind::{
    Coord, Directive, DirectiveEntry, DirectiveKind, Directives, ErrorKind, Mapped, Mapper,
    MappingError, MemoryGrid, MetadataResolver, OverrideDocument, RecordsDirective, Terminal,
};
use std::io::Write;

fn compiled_users() -> Vec<Directive> {
    UserSheet::fields()
        .into_iter()
        .find(|f| f.name() == "users")
        .map(|f| f.directives().to_vec())
        .unwrap()
}

fn resolve_users(doc: OverrideDocument) -> Directives {
    MetadataResolver::with_overrides(doc)
        .unwrap()
        .resolve(UserSheet::CLASS, Some("users"), &compiled_users())
        .unwrap()
}

#[test]
fn restating_compiled_attributes_changes_nothing() {
    let baseline = MetadataResolver::default()
        .resolve(UserSheet::CLASS, Some("users"), &compiled_users())
        .unwrap();
    let doc = OverrideDocument::new().with_member(
        UserSheet::CLASS,
        "users",
        vec![DirectiveEntry::new(DirectiveKind::HorizontalRecords).with("table_label", "User list")],
    );
    assert_eq!(resolve_users(doc), baseline);
}

#[test]
fn partial_override_touches_only_named_attributes() {
    let doc = OverrideDocument::new().with_member(
        UserSheet::CLASS,
        "users",
        vec![
            DirectiveEntry::new(DirectiveKind::HorizontalRecords)
                .with("terminal", "border")
                .with("range", 2),
        ],
    );
    let resolved = resolve_users(doc);
    let expected = RecordsDirective::labelled("User list")
        .terminal(Terminal::Border)
        .range(2);
    assert_eq!(resolved.horizontal_records, Some(expected));
}

#[test]
fn binding_order_is_deterministic() {
    let mapper = Mapper::new();
    let names = |m: &Mapper| -> Vec<&'static str> {
        m.bind::<UserSheet>()
            .unwrap()
            .bindings
            .iter()
            .map(|b| b.name)
            .collect()
    };
    assert_eq!(names(&mapper), ["owner", "title", "total", "users"]);
    assert_eq!(names(&mapper), names(&Mapper::new()));

    let doc = OverrideDocument::new()
        .with_member(
            UserSheet::CLASS,
            "users",
            vec![DirectiveEntry::new(DirectiveKind::Hint).with("order", 0)],
        )
        .with_member(
            UserSheet::CLASS,
            "total",
            vec![DirectiveEntry::new(DirectiveKind::Hint).with("order", 0)],
        );
    let hinted = Mapper::new().with_overrides(doc).unwrap();
    // Equal hints fall back to the member name.
    assert_eq!(names(&hinted), ["total", "users", "owner", "title"]);
}

#[test]
fn element_columns_follow_hints() {
    let doc = OverrideDocument::new().with_member(
        User::CLASS,
        "active",
        vec![DirectiveEntry::new(DirectiveKind::Hint).with("order", 1)],
    );
    let bound = Mapper::new()
        .with_overrides(doc)
        .unwrap()
        .bind::<UserSheet>()
        .unwrap();
    let users = bound.binding("users").unwrap();
    let gridbind::Target::Records { columns, element_class, .. } = &users.target else {
        panic!("users should bind to a record table");
    };
    assert_eq!(*element_class, User::CLASS);
    assert_eq!(columns[0].name, "active");
    assert_eq!(columns[1].name, "age");
}

#[test]
fn yaml_override_moves_the_table() {
    let yaml = r#"
spec: gridbind
spec_version: "1.0.0"
classes:
  demo::UserSheet:
    members:
      users:
        - kind: horizontal_records
          table_label: Staff
      title:
        - kind: cell
          address: B1
"#;
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(yaml.as_bytes()).unwrap();
    let doc = OverrideDocument::from_yaml_reader(std::fs::File::open(file.path()).unwrap()).unwrap();

    let mut grid = roster();
    grid.put(Coord::new(3, 0), "Staff").put(Coord::new(0, 1), "Moved title");

    let sheet = Mapper::new()
        .with_overrides(doc)
        .unwrap()
        .load::<UserSheet>(&grid)
        .unwrap()
        .into_inner();
    assert_eq!(sheet.title, "Moved title");
    assert_eq!(sheet.users, vec![alice(), bob()]);
}

#[test]
fn labelled_cell_wins_over_fixed_cell() {
    let doc = OverrideDocument::new().with_member(
        UserSheet::CLASS,
        "title",
        vec![DirectiveEntry::new(DirectiveKind::LabelledCell).with("label", "Owner")],
    );
    let sheet = Mapper::new()
        .with_overrides(doc)
        .unwrap()
        .load::<UserSheet>(&roster())
        .unwrap()
        .into_inner();
    assert_eq!(sheet.title, "Ada");
}

#[test]
fn unknown_attribute_aborts_the_pass() {
    let doc = OverrideDocument::new().with_member(
        UserSheet::CLASS,
        "users",
        vec![DirectiveEntry::new(DirectiveKind::HorizontalRecords).with("colour", "red")],
    );
    let mapper = Mapper::new().with_overrides(doc).unwrap();
    let err = mapper.load::<UserSheet>(&roster()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Metadata);
    assert!(err.to_string().contains("colour"), "{err}");
}

#[test]
fn invalid_document_is_rejected_up_front() {
    let yaml = r#"
spec: gridbind
spec_version: "1.0.0"
classes:
  demo::UserSheet:
    members:
      users:
        - kind: vertical_records
"#;
    let doc = OverrideDocument::from_yaml_str(yaml).unwrap();
    let err = Mapper::new().with_overrides(doc).err().unwrap();
    assert!(matches!(err, MappingError::Metadata { .. }), "{err:?}");
}

#[test]
fn class_level_sheet_override_is_checked() {
    let doc = OverrideDocument::new().with_class_directives(
        UserSheet::CLASS,
        vec![DirectiveEntry::new(DirectiveKind::Sheet).with("name", "Staff")],
    );
    let mapper = Mapper::new().with_overrides(doc).unwrap();
    let err = mapper.load::<UserSheet>(&roster()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AnchorNotFound);

    let mut staff = MemoryGrid::new("Staff");
    staff.put(Coord::new(0, 0), "Staff roster");
    let sheet = mapper.load::<UserSheet>(&staff).unwrap();
    assert_eq!(sheet.value.title, "Staff roster");
}

#[test]
fn mapper_is_shareable_across_threads() {
    let mapper = std::sync::Arc::new(Mapper::new());
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let mapper = mapper.clone();
            std::thread::spawn(move || {
                mapper
                    .load::<UserSheet>(&roster())
                    .unwrap()
                    .into_inner()
                    .users
                    .len()
            })
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), 2);
    }
}
