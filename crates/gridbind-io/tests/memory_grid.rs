use chrono::NaiveDate;
use gridbind_io::{CellStyle, CellValue, Coord, GridDocument, MemoryGrid};

fn sample() -> MemoryGrid {
    let mut grid = MemoryGrid::new("Users");
    grid.put_row(Coord::new(0, 0), ["Name", "Joined"]);
    grid.put(Coord::new(1, 0), "Alice");
    grid.put(
        Coord::new(1, 1),
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
    );
    grid.border_rect(Coord::new(0, 0), Coord::new(1, 1));
    grid
}

#[cfg(feature = "json")]
#[test]
fn json_roundtrip_through_file() {
    let mut grid = sample();
    grid.set_hyperlink(Coord::new(1, 0), "https://example.com/alice")
        .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("users.json");
    grid.save_to_path(&path).unwrap();

    let reloaded = MemoryGrid::open_path(&path).unwrap();
    assert_eq!(reloaded, grid);
    assert_eq!(reloaded.sheet_name(), "Users");
    assert_eq!(
        reloaded.hyperlink(Coord::new(1, 0)).as_deref(),
        Some("https://example.com/alice")
    );
}

#[cfg(feature = "json")]
#[test]
fn json_shape_uses_tagged_values() {
    let s = sample().to_json_string().unwrap();
    let v: serde_json::Value = serde_json::from_str(&s).unwrap();

    assert_eq!(v["name"], "Users");
    assert!(v["cells"].is_array());
    assert_eq!(v["cells"][0]["row"], 0);
    assert_eq!(v["cells"][0]["col"], 0);
    assert_eq!(v["cells"][0]["value"]["type"], "Text");
    assert_eq!(v["cells"][0]["value"]["value"], "Name");
    assert_eq!(v["cells"][0]["style"]["border_left"], true);
}

#[test]
fn vacant_cells_are_pruned() {
    let mut grid = MemoryGrid::new("Sheet1");
    grid.put(Coord::new(4, 4), "x");
    grid.set_value(Coord::new(4, 4), CellValue::Empty).unwrap();
    assert_eq!(grid.used_range(), None);

    grid.set_style(Coord::new(2, 3), CellStyle::boxed()).unwrap();
    assert_eq!(grid.used_range(), Some((2, 3)));
}

#[test]
fn styles_travel_with_shifted_rows() {
    let mut grid = sample();
    grid.insert_rows(1, 1).unwrap();
    assert!(grid.is_bordered(Coord::new(0, 1)));
    assert!(!grid.is_bordered(Coord::new(1, 1)));
    assert!(grid.is_bordered(Coord::new(2, 1)));
    assert_eq!(grid.text(Coord::new(2, 1)), "2024-03-15");
}
