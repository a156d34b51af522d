#![forbid(unsafe_code)]

//! Reorder gesture state: pointer drag sessions, keyboard moves and the
//! keyboard selection they depend on.
//!
//! The controller never touches slot data. It answers with the swaps the
//! engine must perform, so every surface mutates order through the engine's
//! one swap path.
//!
//! During a drag the live arrangement is always the original order with
//! `start_index` and `pending_index` exchanged. Entering a new slot reverts
//! the previous exchange and applies the new one:
//!
//! ```text
//! start=0  enter 2  ->  [2 1 0 3]   live swap (0,2)
//!          enter 3  ->  revert (0,2), apply (0,3)  ->  [3 1 2 0]
//!          enter 0  ->  revert (0,3)               ->  [0 1 2 3]
//! ```
//!
//! Ending the drag reports one logical move, `start -> pending`.

use serde::{Deserialize, Serialize};

use crate::error::{GestureKind, LayoutError};
use crate::slot::SlotId;

/// An active pointer drag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DragSession {
    /// Slot the gesture started on.
    pub dragged: SlotId,
    /// Slot the pointer is currently over, cleared on leave.
    pub drop_target: Option<SlotId>,
    /// Position of the dragged content when the gesture began.
    pub start_index: SlotId,
    /// Position the dragged content occupies in the live arrangement.
    pub pending_index: SlotId,
}

impl DragSession {
    fn new(slot: SlotId) -> Self {
        Self {
            dragged: slot,
            drop_target: None,
            start_index: slot,
            pending_index: slot,
        }
    }

    /// Whether the live arrangement differs from the original one.
    #[must_use]
    pub fn has_moved(&self) -> bool {
        self.pending_index != self.start_index
    }
}

/// Swaps the engine applies, in order, for one drag-enter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LiveSwap {
    /// Undo the previous live exchange.
    pub revert: Option<(SlotId, SlotId)>,
    /// Exchange start with the entered slot.
    pub apply: Option<(SlotId, SlotId)>,
}

impl LiveSwap {
    /// No change to the live arrangement.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            revert: None,
            apply: None,
        }
    }

    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.revert.is_none() && self.apply.is_none()
    }

    /// Swaps in application order.
    pub fn swaps(&self) -> impl Iterator<Item = (SlotId, SlotId)> {
        self.revert.into_iter().chain(self.apply)
    }
}

/// Drag session and keyboard selection for one engine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReorderController {
    session: Option<DragSession>,
    selected: Option<SlotId>,
}

impl ReorderController {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Active drag, if any.
    #[must_use]
    pub const fn session(&self) -> Option<&DragSession> {
        self.session.as_ref()
    }

    #[must_use]
    pub const fn is_dragging(&self) -> bool {
        self.session.is_some()
    }

    /// Slot currently selected for keyboard moves.
    #[must_use]
    pub const fn selected(&self) -> Option<SlotId> {
        self.selected
    }

    #[must_use]
    pub fn is_selected(&self, slot: SlotId) -> bool {
        self.selected == Some(slot)
    }

    /// Toggle selection of `slot`, returning whether it is now selected.
    pub fn toggle_selected(&mut self, slot: SlotId) -> bool {
        if self.is_selected(slot) {
            self.selected = None;
            false
        } else {
            self.selected = Some(slot);
            true
        }
    }

    pub fn select(&mut self, slot: Option<SlotId>) {
        self.selected = slot;
    }

    /// Drop the selection if it points at `slot`.
    pub fn deselect(&mut self, slot: SlotId) {
        if self.is_selected(slot) {
            self.selected = None;
        }
    }

    /// Start a drag on `slot`. A running session is kept and the call is
    /// rejected.
    pub fn begin_drag(&mut self, slot: SlotId) -> Result<(), LayoutError> {
        if self.session.is_some() {
            return Err(LayoutError::ConcurrentGesture {
                active: GestureKind::Drag,
            });
        }
        self.session = Some(DragSession::new(slot));
        tracing::trace!(target: "slotgrid.reorder", slot = slot.get(), "drag started");
        Ok(())
    }

    /// Pointer entered `slot` while dragging.
    pub fn drag_enter(&mut self, slot: SlotId) -> Result<LiveSwap, LayoutError> {
        let session = self.session.as_mut().ok_or(LayoutError::NoActiveGesture {
            expected: GestureKind::Drag,
        })?;
        if session.drop_target == Some(slot) {
            return Ok(LiveSwap::none());
        }
        session.drop_target = Some(slot);
        if session.pending_index == slot {
            return Ok(LiveSwap::none());
        }

        let start = session.start_index;
        let swap = LiveSwap {
            revert: session.has_moved().then_some((start, session.pending_index)),
            apply: (slot != start).then_some((start, slot)),
        };
        session.pending_index = slot;
        tracing::trace!(
            target: "slotgrid.reorder",
            start = start.get(),
            pending = slot.get(),
            "drag target changed"
        );
        Ok(swap)
    }

    /// Pointer left the current drop target.
    pub fn drag_leave(&mut self) -> Result<(), LayoutError> {
        let session = self.session.as_mut().ok_or(LayoutError::NoActiveGesture {
            expected: GestureKind::Drag,
        })?;
        session.drop_target = None;
        Ok(())
    }

    /// Close the drag, returning the finished session.
    pub fn end_drag(&mut self) -> Result<DragSession, LayoutError> {
        let session = self.session.take().ok_or(LayoutError::NoActiveGesture {
            expected: GestureKind::Drag,
        })?;
        tracing::trace!(
            target: "slotgrid.reorder",
            start = session.start_index.get(),
            pending = session.pending_index.get(),
            "drag ended"
        );
        Ok(session)
    }

    /// Swap for moving `slot` one position earlier, or `None` at the first
    /// slot.
    pub fn move_up(&self, slot: SlotId, arranged: usize) -> Result<Option<(SlotId, SlotId)>, LayoutError> {
        self.check_move(slot, arranged)?;
        Ok(slot.prev().map(|prev| (slot, prev)))
    }

    /// Swap for moving `slot` one position later, or `None` at the last
    /// arranged slot.
    pub fn move_down(&self, slot: SlotId, arranged: usize) -> Result<Option<(SlotId, SlotId)>, LayoutError> {
        self.check_move(slot, arranged)?;
        let next = slot.next();
        Ok((next.get() < arranged).then_some((slot, next)))
    }

    fn check_move(&self, slot: SlotId, arranged: usize) -> Result<(), LayoutError> {
        if self.session.is_some() {
            return Err(LayoutError::ConcurrentGesture {
                active: GestureKind::Drag,
            });
        }
        if slot.get() >= arranged {
            return Err(LayoutError::OutOfRange {
                id: slot,
                count: arranged,
            });
        }
        Ok(())
    }
}
