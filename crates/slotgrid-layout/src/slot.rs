#![forbid(unsafe_code)]

//! Slot identifiers, persisted slot records, and live slot state.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Row-major position of a placeholder in the grid.
///
/// Ids are assigned by flattening the layout pattern: row 0's columns first,
/// then row 1's, and so on. The same id always names the same grid position;
/// the record shown there changes only through reordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlotId(usize);

impl SlotId {
    /// Create a slot id from its row-major index.
    #[must_use]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Row-major index.
    #[must_use]
    pub const fn get(self) -> usize {
        self.0
    }

    /// The preceding position, if any.
    #[must_use]
    pub const fn prev(self) -> Option<Self> {
        match self.0.checked_sub(1) {
            Some(index) => Some(Self(index)),
            None => None,
        }
    }

    /// The following position.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl From<usize> for SlotId {
    fn from(index: usize) -> Self {
        Self(index)
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One entry of the host's persisted slot array.
///
/// `C` is the host's opaque content handle. The engine never looks inside it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotRecord<C> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<C>,
    #[serde(default)]
    pub is_hidden: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
}

impl<C> SlotRecord<C> {
    /// A record with no content, visible, and no stored width.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            content: None,
            is_hidden: false,
            width: None,
        }
    }

    /// Attach content.
    #[must_use]
    pub fn with_content(mut self, content: C) -> Self {
        self.content = Some(content);
        self
    }

    /// Set the stored width.
    #[must_use]
    pub fn with_width(mut self, width: f64) -> Self {
        self.width = Some(width);
        self
    }

    /// Set the hidden flag.
    #[must_use]
    pub fn hidden(mut self, is_hidden: bool) -> Self {
        self.is_hidden = is_hidden;
        self
    }
}

impl<C> Default for SlotRecord<C> {
    fn default() -> Self {
        Self::empty()
    }
}

/// Widest a single slot may be, in percent of its row.
pub const MAX_WIDTH: f64 = 100.0;

/// Whether `width` is usable as a slot proportion: finite and in `(0, MAX_WIDTH]`.
#[must_use]
pub fn is_valid_width(width: f64) -> bool {
    width.is_finite() && width > 0.0 && width <= MAX_WIDTH
}

/// Live state of one grid position.
///
/// `F` is the editor host's form handle, created lazily on first activation.
/// Everything in a `Slot` moves together when two positions are swapped.
#[derive(Debug, Clone, PartialEq)]
pub struct Slot<C, F> {
    pub(crate) content: Option<C>,
    pub(crate) width: f64,
    pub(crate) is_hidden: bool,
    pub(crate) form: Option<F>,
    pub(crate) natural_height: Option<f64>,
    pub(crate) rendered_height: Option<f64>,
}

impl<C, F> Slot<C, F> {
    /// A fresh padding slot with the given width.
    pub(crate) const fn padding(width: f64) -> Self {
        Self {
            content: None,
            width,
            is_hidden: false,
            form: None,
            natural_height: None,
            rendered_height: None,
        }
    }

    pub(crate) fn from_record(record: SlotRecord<C>, default_width: f64) -> Self {
        let width = record
            .width
            .filter(|width| is_valid_width(*width))
            .unwrap_or(default_width);
        Self {
            content: record.content,
            width,
            is_hidden: record.is_hidden,
            form: None,
            natural_height: None,
            rendered_height: None,
        }
    }

    /// Content handle, if any.
    #[must_use]
    pub const fn content(&self) -> Option<&C> {
        self.content.as_ref()
    }

    /// Width as a percentage of the row track.
    #[must_use]
    pub const fn width(&self) -> f64 {
        self.width
    }

    /// Whether the user hid this slot's content.
    #[must_use]
    pub const fn is_hidden(&self) -> bool {
        self.is_hidden
    }

    /// Edit-form handle, once the slot has been activated.
    #[must_use]
    pub const fn form(&self) -> Option<&F> {
        self.form.as_ref()
    }

    /// Last height the host measured for the content.
    #[must_use]
    pub const fn natural_height(&self) -> Option<f64> {
        self.natural_height
    }

    /// Height from the last row pass; `None` means "no explicit height".
    #[must_use]
    pub const fn rendered_height(&self) -> Option<f64> {
        self.rendered_height
    }

    /// Reset content to empty, keeping the width.
    pub(crate) fn clear(&mut self) {
        self.content = None;
        self.is_hidden = false;
        self.form = None;
        self.natural_height = None;
    }
}

impl<C: Clone, F> Slot<C, F> {
    /// Persistable view of this slot.
    #[must_use]
    pub fn to_record(&self) -> SlotRecord<C> {
        SlotRecord {
            content: self.content.clone(),
            is_hidden: self.is_hidden,
            width: Some(self.width),
        }
    }
}
