#![forbid(unsafe_code)]

//! Engine error taxonomy.
//!
//! Every engine operation either succeeds or leaves all state untouched and
//! reports why through [`LayoutError`]. None of these are fatal: a host that
//! does not care simply drops the `Err`, which reproduces the "silent no-op"
//! contract of the editor widget.

use std::fmt;

use crate::pattern::PatternError;
use crate::slot::SlotId;

/// The two pointer gestures that hold an exclusive session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GestureKind {
    /// A slot is being dragged for reordering.
    Drag,
    /// A separator is being slid for resizing.
    Slide,
}

impl fmt::Display for GestureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Drag => f.write_str("drag"),
            Self::Slide => f.write_str("slide"),
        }
    }
}

/// Why an engine operation was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    /// The layout pattern did not parse; the previous layout stays in effect.
    InvalidPattern(PatternError),
    /// A slot id at or beyond the addressable count.
    OutOfRange { id: SlotId, count: usize },
    /// `left` and `left + 1` are not neighbours in one arranged row.
    NotAdjacent { left: SlotId },
    /// Another exclusive gesture is already running.
    ConcurrentGesture { active: GestureKind },
    /// An end/update call arrived with no matching session.
    NoActiveGesture { expected: GestureKind },
    /// The separator is disabled while a sibling slides.
    SliderDisabled { separator: SlotId },
    /// A form signal arrived while no slot is being edited.
    NoOpenForm,
}

impl fmt::Display for LayoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidPattern(error) => write!(f, "invalid layout pattern: {error}"),
            Self::OutOfRange { id, count } => {
                write!(f, "slot {id} is out of range (count {count})")
            }
            Self::NotAdjacent { left } => write!(
                f,
                "slots {left} and {} are not adjacent in one row",
                left.next()
            ),
            Self::ConcurrentGesture { active } => {
                write!(f, "a {active} gesture is already in progress")
            }
            Self::NoActiveGesture { expected } => write!(f, "no {expected} gesture is active"),
            Self::SliderDisabled { separator } => {
                write!(f, "separator after slot {separator} is disabled")
            }
            Self::NoOpenForm => write!(f, "no slot form is open"),
        }
    }
}

impl std::error::Error for LayoutError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        if let Self::InvalidPattern(error) = self {
            return Some(error);
        }
        None
    }
}

impl From<PatternError> for LayoutError {
    fn from(error: PatternError) -> Self {
        Self::InvalidPattern(error)
    }
}
