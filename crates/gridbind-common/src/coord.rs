//! Compact grid coordinates shared by the mapping engine and grid backends.
//!
//! `Coord` encodes a 0-based cell position (row, column) in a single `u64` using the
//! same limits as Excel: 1,048,576 rows × 16,384 columns. The row occupies the high
//! bits, so the derived ordering is row-major, which is the traversal order used by
//! label searches.

use core::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::de::{self, Deserializer, Visitor};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize, Serializer};

const ROW_BITS: u32 = 20;
const COL_BITS: u32 = 14;
const ROW_MAX: u32 = (1 << ROW_BITS) - 1;
const COL_MAX: u32 = (1 << COL_BITS) - 1;

const ROW_SHIFT: u32 = COL_BITS;
const COL_MASK: u64 = COL_MAX as u64;

/// Number of addressable rows in a grid document.
pub const MAX_ROWS: u32 = ROW_MAX + 1;
/// Number of addressable columns in a grid document.
pub const MAX_COLS: u32 = COL_MAX + 1;

/// Errors returned when constructing coordinates from unchecked inputs.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CoordError {
    RowOverflow(i64),
    ColOverflow(i64),
    NegativeRow(i64),
    NegativeCol(i64),
}

impl fmt::Display for CoordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoordError::RowOverflow(row) => write!(f, "row {row} exceeds {MAX}", MAX = ROW_MAX),
            CoordError::ColOverflow(col) => write!(f, "col {col} exceeds {MAX}", MAX = COL_MAX),
            CoordError::NegativeRow(row) => write!(f, "row {row} is negative"),
            CoordError::NegativeCol(col) => write!(f, "col {col} is negative"),
        }
    }
}

impl std::error::Error for CoordError {}

/// Errors raised while parsing `A1`-style addresses.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum A1ParseError {
    Empty,
    MissingColumn(String),
    MissingRow(String),
    InvalidRow(String),
    OutOfBounds(CoordError),
}

impl fmt::Display for A1ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            A1ParseError::Empty => write!(f, "address is empty"),
            A1ParseError::MissingColumn(s) => write!(f, "address `{s}` has no column letters"),
            A1ParseError::MissingRow(s) => write!(f, "address `{s}` has no row number"),
            A1ParseError::InvalidRow(s) => write!(f, "address `{s}` has an invalid row number"),
            A1ParseError::OutOfBounds(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for A1ParseError {}

impl From<CoordError> for A1ParseError {
    fn from(value: CoordError) -> Self {
        A1ParseError::OutOfBounds(value)
    }
}

/// Absolute 0-based grid coordinate (row, column) with Excel-compatible bounds.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct Coord(u64);

impl Coord {
    /// Construct a coordinate, panicking if values exceed the supported limits.
    pub fn new(row: u32, col: u32) -> Self {
        assert!(row <= ROW_MAX, "Row {row} exceeds 20 bits");
        assert!(col <= COL_MAX, "Col {col} exceeds 14 bits");
        Self(((row as u64) << ROW_SHIFT) | col as u64)
    }

    /// Fallible constructor that reports overflow rather than panicking.
    pub fn try_new(row: u32, col: u32) -> Result<Self, CoordError> {
        if row > ROW_MAX {
            return Err(CoordError::RowOverflow(row as i64));
        }
        if col > COL_MAX {
            return Err(CoordError::ColOverflow(col as i64));
        }
        Ok(Self::new(row, col))
    }

    #[inline(always)]
    pub fn row(self) -> u32 {
        (self.0 >> ROW_SHIFT) as u32
    }

    #[inline(always)]
    pub fn col(self) -> u32 {
        (self.0 & COL_MASK) as u32
    }

    /// Offset by signed deltas, reporting rather than wrapping on overflow.
    pub fn offset(self, drow: i64, dcol: i64) -> Result<Self, CoordError> {
        let row = self.row() as i64 + drow;
        let col = self.col() as i64 + dcol;
        Self::try_from((row, col))
    }

    /// Parse an `A1`-style address; `$` anchors are accepted and ignored.
    pub fn parse_a1(input: &str) -> Result<Self, A1ParseError> {
        let cleaned: String = input
            .trim()
            .chars()
            .filter(|c| *c != '$')
            .map(|c| c.to_ascii_uppercase())
            .collect();
        if cleaned.is_empty() {
            return Err(A1ParseError::Empty);
        }
        let split = cleaned
            .find(|c: char| c.is_ascii_digit())
            .ok_or_else(|| A1ParseError::MissingRow(input.to_string()))?;
        let (letters, digits) = cleaned.split_at(split);
        if letters.is_empty() {
            return Err(A1ParseError::MissingColumn(input.to_string()));
        }
        let col = letters_to_column_index(letters)
            .ok_or_else(|| A1ParseError::MissingColumn(input.to_string()))?;
        let row: u32 = digits
            .parse()
            .map_err(|_| A1ParseError::InvalidRow(input.to_string()))?;
        if row == 0 {
            return Err(A1ParseError::InvalidRow(input.to_string()));
        }
        Ok(Self::try_new(row - 1, col)?)
    }

    pub fn col_to_letters(col: u32) -> String {
        column_to_letters(col)
    }

    pub fn letters_to_col(s: &str) -> Option<u32> {
        letters_to_column_index(s)
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", column_to_letters(self.col()), self.row() + 1)
    }
}

impl FromStr for Coord {
    type Err = A1ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Coord::parse_a1(s)
    }
}

impl From<Coord> for (u32, u32) {
    fn from(coord: Coord) -> Self {
        (coord.row(), coord.col())
    }
}

impl TryFrom<(u32, u32)> for Coord {
    type Error = CoordError;

    fn try_from(value: (u32, u32)) -> Result<Self, Self::Error> {
        Self::try_new(value.0, value.1)
    }
}

impl TryFrom<(i64, i64)> for Coord {
    type Error = CoordError;

    fn try_from(value: (i64, i64)) -> Result<Self, Self::Error> {
        let (row, col) = value;
        if row < 0 {
            return Err(CoordError::NegativeRow(row));
        }
        if col < 0 {
            return Err(CoordError::NegativeCol(col));
        }
        if row > ROW_MAX as i64 {
            return Err(CoordError::RowOverflow(row));
        }
        if col > COL_MAX as i64 {
            return Err(CoordError::ColOverflow(col));
        }
        Ok(Self::new(row as u32, col as u32))
    }
}

#[cfg(feature = "serde")]
impl Serialize for Coord {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

#[cfg(feature = "serde")]
impl<'de> Deserialize<'de> for Coord {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct CoordVisitor;

        impl<'de> Visitor<'de> for CoordVisitor {
            type Value = Coord;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("A1-style cell address (e.g. B3)")
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Coord::parse_a1(v).map_err(|err| de::Error::custom(format!("invalid address: {err}")))
            }
        }

        deserializer.deserialize_str(CoordVisitor)
    }
}

fn column_to_letters(mut col: u32) -> String {
    let mut buf = Vec::new();
    loop {
        let rem = (col % 26) as u8;
        buf.push(b'A' + rem);
        col /= 26;
        if col == 0 {
            break;
        }
        col -= 1;
    }
    buf.reverse();
    buf.into_iter().map(char::from).collect()
}

fn letters_to_column_index(s: &str) -> Option<u32> {
    if s.is_empty() {
        return None;
    }
    let mut col: u32 = 0;
    for (idx, ch) in s.bytes().enumerate() {
        if !ch.is_ascii_uppercase() {
            return None;
        }
        let val = (ch - b'A') as u32;
        col = col.checked_mul(26)?;
        col = col.checked_add(val)?;
        if idx != s.len() - 1 {
            col = col.checked_add(1)?;
        }
    }
    Some(col)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packed_roundtrip_at_limits() {
        let coord = Coord::new(1_048_575, 16_383);
        assert_eq!(coord.row(), 1_048_575);
        assert_eq!(coord.col(), 16_383);
    }

    #[test]
    fn try_new_reports_overflow() {
        assert!(Coord::try_new(ROW_MAX, COL_MAX).is_ok());
        assert_eq!(
            Coord::try_new(ROW_MAX + 1, 0),
            Err(CoordError::RowOverflow((ROW_MAX + 1) as i64))
        );
        assert_eq!(
            Coord::try_new(0, COL_MAX + 1),
            Err(CoordError::ColOverflow((COL_MAX + 1) as i64))
        );
    }

    #[test]
    fn ordering_is_row_major() {
        let mut coords = vec![Coord::new(1, 0), Coord::new(0, 5), Coord::new(0, 1)];
        coords.sort();
        assert_eq!(
            coords,
            vec![Coord::new(0, 1), Coord::new(0, 5), Coord::new(1, 0)]
        );
    }

    #[test]
    fn offset_rejects_negative() {
        let coord = Coord::new(2, 2);
        assert_eq!(coord.offset(1, -1), Ok(Coord::new(3, 1)));
        assert_eq!(coord.offset(-3, 0), Err(CoordError::NegativeRow(-1)));
    }

    #[test]
    fn a1_display_and_parse() {
        let coord = Coord::new(5, 27);
        assert_eq!(coord.to_string(), "AB6");
        assert_eq!(Coord::parse_a1("AB6"), Ok(coord));
        assert_eq!(Coord::parse_a1("$ab$6"), Ok(coord));
        assert_eq!(Coord::parse_a1("A0"), Err(A1ParseError::InvalidRow("A0".into())));
        assert_eq!(Coord::parse_a1("12"), Err(A1ParseError::MissingColumn("12".into())));
        assert_eq!(Coord::parse_a1("AB"), Err(A1ParseError::MissingRow("AB".into())));
    }

    #[test]
    fn column_letter_roundtrip() {
        let letters = Coord::col_to_letters(27);
        assert_eq!(letters, "AB");
        assert_eq!(Coord::letters_to_col(&letters), Some(27));
        assert!(Coord::letters_to_col("a1").is_none());
    }
}
