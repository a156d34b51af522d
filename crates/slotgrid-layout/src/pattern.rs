#![forbid(unsafe_code)]

//! Layout pattern parsing and row-major slot numbering.
//!
//! A pattern is a `-`-separated list of positive column counts, one per row:
//! `1-2-3` is a row of one slot, a row of two, then a row of three. Slot ids
//! are handed out row by row, left to right, starting at 0:
//!
//! ```text
//! "1-2-3"   row 0: [0]
//!           row 1: [1, 2]
//!           row 2: [3, 4, 5]
//! ```
//!
//! Every other component relies on this numbering to agree on what "slot 3"
//! means.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::Range;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::slot::SlotId;

/// Upper bound on the slots a single pattern may describe.
pub const MAX_SLOTS: usize = 1024;

/// A parsed, validated layout pattern.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LayoutPattern {
    rows: Vec<usize>,
}

impl LayoutPattern {
    /// Parse a pattern string such as `"1-2-3"`.
    ///
    /// Patterns describing more than [`MAX_SLOTS`] slots are rejected with
    /// [`PatternError::TooLarge`].
    pub fn parse(pattern: &str) -> Result<Self, PatternError> {
        if pattern.is_empty() {
            return Err(PatternError::Empty);
        }

        let mut rows = Vec::new();
        let mut total = 0usize;
        let mut current: Option<usize> = None;
        let mut segment_start = 0usize;

        for (index, ch) in pattern.char_indices() {
            match ch {
                '0'..='9' => {
                    let digit = ch as usize - '0' as usize;
                    let value = current.unwrap_or(0) * 10 + digit;
                    if total + value > MAX_SLOTS {
                        return Err(PatternError::TooLarge { row: rows.len() });
                    }
                    current = Some(value);
                }
                '-' => {
                    let Some(count) = current.take() else {
                        return Err(PatternError::EmptySegment {
                            index: segment_start,
                        });
                    };
                    rows.push(Self::check_count(count, rows.len())?);
                    total += count;
                    segment_start = index + 1;
                }
                found => return Err(PatternError::InvalidCharacter { index, found }),
            }
        }

        let Some(count) = current else {
            return Err(PatternError::EmptySegment {
                index: segment_start,
            });
        };
        rows.push(Self::check_count(count, rows.len())?);

        Ok(Self { rows })
    }

    fn check_count(count: usize, row: usize) -> Result<usize, PatternError> {
        if count == 0 {
            return Err(PatternError::ZeroColumns { row });
        }
        Ok(count)
    }

    /// A single row holding one slot (`"1"`).
    #[must_use]
    pub fn single() -> Self {
        Self { rows: vec![1] }
    }

    /// Column count of every row, top to bottom.
    #[must_use]
    pub fn row_counts(&self) -> &[usize] {
        &self.rows
    }

    /// Number of rows.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Sum of all column counts.
    #[must_use]
    pub fn total_slots(&self) -> usize {
        self.rows.iter().sum()
    }

    /// Slot index range covered by each row.
    #[must_use]
    pub fn rows(&self) -> Vec<Range<usize>> {
        let mut start = 0;
        self.rows
            .iter()
            .map(|count| {
                let range = start..start + count;
                start += count;
                range
            })
            .collect()
    }

    /// Slot ids of each row, keyed by row index.
    #[must_use]
    pub fn flatten(&self) -> BTreeMap<usize, Vec<SlotId>> {
        self.rows()
            .into_iter()
            .enumerate()
            .map(|(row, range)| (row, range.map(SlotId::new).collect()))
            .collect()
    }

    /// Row that holds `id`, or `None` if the pattern does not reach it.
    #[must_use]
    pub fn row_of(&self, id: SlotId) -> Option<usize> {
        let mut start = 0;
        for (row, count) in self.rows.iter().enumerate() {
            if id.get() < start + count {
                return Some(row);
            }
            start += count;
        }
        None
    }

    /// Whether both ids are arranged in the same row.
    #[must_use]
    pub fn same_row(&self, a: SlotId, b: SlotId) -> bool {
        match (self.row_of(a), self.row_of(b)) {
            (Some(row_a), Some(row_b)) => row_a == row_b,
            _ => false,
        }
    }
}

impl Default for LayoutPattern {
    fn default() -> Self {
        Self::single()
    }
}

impl fmt::Display for LayoutPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, count) in self.rows.iter().enumerate() {
            if index > 0 {
                f.write_str("-")?;
            }
            write!(f, "{count}")?;
        }
        Ok(())
    }
}

impl FromStr for LayoutPattern {
    type Err = PatternError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for LayoutPattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for LayoutPattern {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Reasons a pattern string is rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternError {
    Empty,
    InvalidCharacter { index: usize, found: char },
    EmptySegment { index: usize },
    ZeroColumns { row: usize },
    TooLarge { row: usize },
}

impl fmt::Display for PatternError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "layout pattern is empty"),
            Self::InvalidCharacter { index, found } => write!(
                f,
                "unexpected character {found:?} at byte {index} (expected digits separated by '-')"
            ),
            Self::EmptySegment { index } => {
                write!(f, "missing column count at byte {index}")
            }
            Self::ZeroColumns { row } => write!(f, "row {row} must have at least one column"),
            Self::TooLarge { row } => {
                write!(f, "pattern exceeds {MAX_SLOTS} slots at row {row}")
            }
        }
    }
}

impl std::error::Error for PatternError {}
