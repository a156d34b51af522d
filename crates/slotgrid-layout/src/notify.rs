#![forbid(unsafe_code)]

//! Change notifications delivered to the host.
//!
//! The engine reports every change the host has to persist or react to as a
//! [`LayoutNotification`], delivered synchronously through the single
//! [`LayoutObserver`] given at construction.

use std::cell::RefCell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::slot::SlotId;

/// One change the host must react to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LayoutNotification {
    /// Swap the backing records at `id1` and `id2`.
    Reordered { id1: SlotId, id2: SlotId },
    /// Persist the full width vector, indexed by slot id.
    WidthsChanged { widths: Vec<f64> },
    /// The user asked to edit this slot.
    SlotActivated { id: SlotId },
    /// These records were reset to empty.
    ContentCleared { ids: Vec<SlotId> },
    /// The hidden flag of one record changed.
    HiddenChanged { id: SlotId, hidden: bool },
}

/// Receiver for engine notifications.
pub trait LayoutObserver {
    fn notify(&mut self, notification: &LayoutNotification);
}

impl<F> LayoutObserver for F
where
    F: FnMut(&LayoutNotification),
{
    fn notify(&mut self, notification: &LayoutNotification) {
        self(notification);
    }
}

/// Observer that appends every notification to a shared log.
///
/// Clones share the log, so a host can hand one clone to the engine and read
/// from another.
#[derive(Debug, Clone, Default)]
pub struct RecordingObserver {
    log: Rc<RefCell<Vec<LayoutNotification>>>,
}

impl RecordingObserver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything recorded so far.
    #[must_use]
    pub fn entries(&self) -> Vec<LayoutNotification> {
        self.log.borrow().clone()
    }

    /// Drain the log.
    pub fn take(&self) -> Vec<LayoutNotification> {
        std::mem::take(&mut *self.log.borrow_mut())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.log.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.log.borrow().is_empty()
    }

    /// Number of `Reordered` notifications recorded.
    #[must_use]
    pub fn reorder_count(&self) -> usize {
        self.log
            .borrow()
            .iter()
            .filter(|n| matches!(n, LayoutNotification::Reordered { .. }))
            .count()
    }
}

impl LayoutObserver for RecordingObserver {
    fn notify(&mut self, notification: &LayoutNotification) {
        self.log.borrow_mut().push(notification.clone());
    }
}
