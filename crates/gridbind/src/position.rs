use gridbind_common::Coord;
use std::collections::BTreeMap;

/// Member name -> coordinate it was last read from or written to.
///
/// The mapper refreshes entries right after every row insert or delete, so a
/// field written later in the pass sees coordinates that already account for
/// the shift.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PositionIndex {
    entries: BTreeMap<String, Coord>,
}

impl PositionIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, member: impl Into<String>, at: Coord) {
        self.entries.insert(member.into(), at);
    }

    pub fn get(&self, member: &str) -> Option<Coord> {
        self.entries.get(member).copied()
    }

    pub fn remove(&mut self, member: &str) -> Option<Coord> {
        self.entries.remove(member)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Coord)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// `count` rows were inserted before row `at`.
    pub fn rows_inserted(&mut self, at: u32, count: u32) {
        if count == 0 {
            return;
        }
        self.entries.retain(|_, coord| {
            if coord.row() < at {
                return true;
            }
            match coord.offset(i64::from(count), 0) {
                Ok(moved) => {
                    *coord = moved;
                    true
                }
                Err(_) => false,
            }
        });
    }

    /// Rows `at..at + count` were deleted; entries inside them are dropped.
    pub fn rows_deleted(&mut self, at: u32, count: u32) {
        if count == 0 {
            return;
        }
        let end = u64::from(at) + u64::from(count);
        self.entries.retain(|_, coord| {
            let row = u64::from(coord.row());
            if row < u64::from(at) {
                return true;
            }
            if row < end {
                return false;
            }
            match coord.offset(-i64::from(count), 0) {
                Ok(moved) => {
                    *coord = moved;
                    true
                }
                Err(_) => false,
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index() -> PositionIndex {
        let mut idx = PositionIndex::new();
        idx.record("title", Coord::new(0, 0));
        idx.record("records", Coord::new(2, 0));
        idx.record("footer", Coord::new(10, 1));
        idx
    }

    #[test]
    fn insert_shifts_entries_at_or_below() {
        let mut idx = index();
        idx.rows_inserted(2, 3);
        assert_eq!(idx.get("title"), Some(Coord::new(0, 0)));
        assert_eq!(idx.get("records"), Some(Coord::new(5, 0)));
        assert_eq!(idx.get("footer"), Some(Coord::new(13, 1)));
    }

    #[test]
    fn delete_drops_entries_inside_and_pulls_tail_up() {
        let mut idx = index();
        idx.rows_deleted(1, 2);
        assert_eq!(idx.get("records"), None);
        assert_eq!(idx.get("footer"), Some(Coord::new(8, 1)));
        assert_eq!(idx.len(), 2);
    }
}
