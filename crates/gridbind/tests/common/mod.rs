#![allow(dead_code)]

use chrono::NaiveDate;
use gridbind::{
    ArrayDirective, CellDirective, CellValue, ColumnDirective, Coord, Directive, Field,
    GridDocument, LabelledCellDirective, Mapped, MemoryGrid, PositionIndex, RecordsDirective,
    SheetDirective,
};
use indexmap::IndexSet;
use std::collections::BTreeMap;
use url::Url;

#[derive(Debug, Default, Clone, PartialEq)]
pub struct User {
    pub name: String,
    pub age: Option<i64>,
    pub tags: Vec<String>,
    pub roles: IndexSet<String>,
    pub limits: BTreeMap<String, i64>,
    pub joined: Option<NaiveDate>,
    pub homepage: Option<Url>,
    pub active: bool,
}

impl Mapped for User {
    const CLASS: &'static str = "demo::User";

    fn fields() -> Vec<Field<Self>> {
        vec![
            Field::value("name", |u: &Self| &u.name, |u: &mut Self| &mut u.name)
                .with(ColumnDirective::new("Name")),
            Field::value("age", |u: &Self| &u.age, |u: &mut Self| &mut u.age)
                .with(ColumnDirective::new("Age")),
            Field::value("tags", |u: &Self| &u.tags, |u: &mut Self| &mut u.tags)
                .with(ColumnDirective::new("Tags"))
                .with(ArrayDirective::separator(";")),
            Field::value("roles", |u: &Self| &u.roles, |u: &mut Self| &mut u.roles)
                .with(ColumnDirective::new("Roles").optional()),
            Field::value("limits", |u: &Self| &u.limits, |u: &mut Self| &mut u.limits)
                .with(ColumnDirective::new("Limits")),
            Field::value("joined", |u: &Self| &u.joined, |u: &mut Self| &mut u.joined)
                .with(ColumnDirective::new("Joined")),
            Field::value("homepage", |u: &Self| &u.homepage, |u: &mut Self| &mut u.homepage)
                .with(ColumnDirective::new("Homepage").optional()),
            Field::value("active", |u: &Self| &u.active, |u: &mut Self| &mut u.active)
                .with(ColumnDirective::new("Active")),
        ]
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct UserSheet {
    pub title: String,
    pub owner: Option<String>,
    pub users: Vec<User>,
    pub total: Option<i64>,
    pub positions: PositionIndex,
}

impl Mapped for UserSheet {
    const CLASS: &'static str = "demo::UserSheet";

    fn class_directives() -> Vec<Directive> {
        vec![SheetDirective::new("Users").into()]
    }

    fn fields() -> Vec<Field<Self>> {
        vec![
            Field::value("title", |s: &Self| &s.title, |s: &mut Self| &mut s.title)
                .with(CellDirective::at("A1")),
            Field::value("owner", |s: &Self| &s.owner, |s: &mut Self| &mut s.owner)
                .with(LabelledCellDirective::new("Owner")),
            Field::records("users", |s: &Self| &s.users, |s: &mut Self| &mut s.users)
                .with(RecordsDirective::labelled("User list")),
            Field::value("total", |s: &Self| &s.total, |s: &mut Self| &mut s.total)
                .with(LabelledCellDirective::new("Total").optional()),
        ]
    }

    fn positions_mut(&mut self) -> Option<&mut PositionIndex> {
        Some(&mut self.positions)
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Contact {
    pub name: String,
    pub age: Option<i64>,
}

impl Mapped for Contact {
    const CLASS: &'static str = "demo::Contact";

    fn fields() -> Vec<Field<Self>> {
        vec![
            Field::value("name", |c: &Self| &c.name, |c: &mut Self| &mut c.name)
                .with(ColumnDirective::new("Name")),
            Field::value("age", |c: &Self| &c.age, |c: &mut Self| &mut c.age)
                .with(ColumnDirective::new("Age")),
        ]
    }
}

/// A bare table anchored at `A1`.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Contacts {
    pub people: Vec<Contact>,
}

impl Mapped for Contacts {
    const CLASS: &'static str = "demo::Contacts";

    fn fields() -> Vec<Field<Self>> {
        vec![
            Field::records("people", |c: &Self| &c.people, |c: &mut Self| &mut c.people)
                .with(RecordsDirective::at("A1")),
        ]
    }
}

pub fn contact(name: &str, age: Option<i64>) -> Contact {
    Contact {
        name: name.into(),
        age,
    }
}

pub const HEADER: [&str; 8] = [
    "Name", "Age", "Tags", "Roles", "Limits", "Joined", "Homepage", "Active",
];

pub fn alice() -> User {
    User {
        name: "Alice".into(),
        age: Some(34),
        tags: vec!["a".into(), "b".into()],
        roles: ["admin".to_string(), "ops".to_string()].into_iter().collect(),
        limits: [("cpu".to_string(), 2), ("mem".to_string(), 4)].into_iter().collect(),
        joined: NaiveDate::from_ymd_opt(2024, 3, 15),
        homepage: Some(Url::parse("https://alice.example/").unwrap()),
        active: true,
    }
}

pub fn bob() -> User {
    User {
        name: "Bob".into(),
        age: Some(28),
        ..User::default()
    }
}

pub fn carol() -> User {
    User {
        name: "Carol".into(),
        age: Some(41),
        tags: vec!["c".into()],
        active: true,
        ..User::default()
    }
}

/// Row of the user table laid out under [`HEADER`].
pub fn put_user_row(grid: &mut MemoryGrid, row: u32, cells: Vec<CellValue>) {
    for (col, value) in cells.into_iter().enumerate() {
        grid.put(Coord::new(row, col as u32), value);
    }
}

/// ```text
/// row 0  Team roster
/// row 1  Owner | Ada
/// row 3  User list
/// row 4  <HEADER>
/// row 5  Alice ...
/// row 6  Bob ...
/// row 8  Total | 2
/// ```
pub fn roster() -> MemoryGrid {
    let mut grid = MemoryGrid::new("Users");
    grid.put(Coord::new(0, 0), "Team roster")
        .put_row(Coord::new(1, 0), ["Owner", "Ada"])
        .put(Coord::new(3, 0), "User list")
        .put_row(Coord::new(4, 0), HEADER);
    put_user_row(
        &mut grid,
        5,
        vec![
            "Alice".into(),
            34.into(),
            "a;b".into(),
            "admin, ops".into(),
            "cpu=2,mem=4".into(),
            NaiveDate::from_ymd_opt(2024, 3, 15).unwrap().into(),
            "alice".into(),
            true.into(),
        ],
    );
    grid.set_hyperlink(Coord::new(5, 6), "https://alice.example/")
        .unwrap();
    put_user_row(
        &mut grid,
        6,
        vec![
            "Bob".into(),
            "28".into(),
            CellValue::Empty,
            CellValue::Empty,
            CellValue::Empty,
            CellValue::Empty,
            CellValue::Empty,
            "no".into(),
        ],
    );
    grid.put_row(Coord::new(8, 0), [CellValue::from("Total"), CellValue::Int(2)]);
    grid
}

/// Same layout as [`roster`] with an empty, bordered table body of `rows` rows.
pub fn bordered_roster(rows: u32) -> MemoryGrid {
    let mut grid = MemoryGrid::new("Users");
    grid.put(Coord::new(0, 0), "Team roster")
        .put_row(Coord::new(1, 0), ["Owner", "Ada"])
        .put(Coord::new(3, 0), "User list")
        .put_row(Coord::new(4, 0), HEADER)
        .border_rect(Coord::new(4, 0), Coord::new(4 + rows, 7));
    grid
}

/// Display text of a row across the user table columns.
pub fn row_text(grid: &dyn GridDocument, row: u32) -> Vec<String> {
    (0..HEADER.len() as u32)
        .map(|col| grid.text(Coord::new(row, col)))
        .collect()
}
