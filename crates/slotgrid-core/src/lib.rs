#![forbid(unsafe_code)]

//! Core: host-agnostic input primitives for the slotgrid layout engine.
//!
//! # Role in slotgrid
//! `slotgrid-core` is the input layer. It owns the normalized key events and
//! pointer geometry that hosts translate their native events into, plus the
//! [`debounce::Debouncer`] used to defer work that must wait for content to
//! settle.
//!
//! # How it fits in the system
//! `slotgrid-layout` consumes these types and never sees host events
//! directly, which keeps the engine deterministic under test.

pub mod debounce;
pub mod event;
pub mod geometry;
#[cfg(feature = "fmt")]
pub mod logging;

pub use debounce::Debouncer;
pub use event::{KeyCode, KeyEvent, KeyEventKind, Modifiers};
pub use geometry::PairGeometry;
