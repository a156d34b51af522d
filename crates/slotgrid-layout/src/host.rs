#![forbid(unsafe_code)]

//! Seam to the host's form system.
//!
//! The engine does not know how edit forms are built or shown. It asks the
//! [`EditorHost`] it was constructed with to build a form the first time a
//! slot is activated, keeps the returned handle on the slot, and hands it
//! back whenever that slot is opened again.

use crate::slot::SlotId;

/// Builds and displays per-slot edit forms.
pub trait EditorHost<C> {
    /// Opaque form handle owned by the slot once built.
    type Form;

    /// Build the edit form for `id`. Called at most once per slot content.
    fn build_form(&mut self, id: SlotId, content: Option<&C>) -> Self::Form;

    /// Show `form` in the modal editor.
    fn open_form(&mut self, id: SlotId, form: &Self::Form, content: Option<&C>);

    /// Dismiss the modal editor for `id` after its content was removed.
    fn close_form(&mut self, id: SlotId) {
        let _ = id;
    }
}

/// Host with no form system; activation only produces the notification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NullEditorHost;

impl<C> EditorHost<C> for NullEditorHost {
    type Form = ();

    fn build_form(&mut self, _id: SlotId, _content: Option<&C>) -> Self::Form {}

    fn open_form(&mut self, _id: SlotId, _form: &Self::Form, _content: Option<&C>) {}
}
