#![forbid(unsafe_code)]

//! Placeholder grid layout engine.
//!
//! A layout pattern such as `1-2-3` describes rows of placeholder slots. The
//! [`LayoutEngine`] arranges an ordered list of slot records into that grid,
//! keeps per-slot width proportions, and drives the two interactive gestures
//! an editor offers:
//!
//! - **Reordering** by pointer drag ([`ReorderController`]) or keyboard moves.
//! - **Resizing** adjacent columns with a [`SizeSlider`] between them.
//!
//! Every change the host must persist is reported through one
//! [`LayoutObserver`] as a [`LayoutNotification`].
//!
//! # Example
//!
//! ```
//! use slotgrid_layout::{LayoutEngine, LayoutNotification, NullEditorHost, RecordingObserver};
//!
//! let log = RecordingObserver::new();
//! let mut engine: LayoutEngine<String, NullEditorHost> =
//!     LayoutEngine::new(NullEditorHost, Box::new(log.clone()));
//!
//! engine.set_layout("1-2", None).unwrap();
//! assert_eq!(engine.slot_count(), 3);
//!
//! engine.resize_adjacent_pair(1.into(), 0.25).unwrap();
//! assert_eq!(engine.widths(), vec![100.0, 25.0, 75.0]);
//! assert!(matches!(
//!     log.take().as_slice(),
//!     [LayoutNotification::WidthsChanged { .. }]
//! ));
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod host;
pub mod notify;
pub mod pattern;
pub mod reorder;
pub mod slider;
pub mod slot;

pub use config::EngineConfig;
pub use engine::{LayoutEngine, LayoutSnapshot, SlotAria};
pub use error::{GestureKind, LayoutError};
pub use host::{EditorHost, NullEditorHost};
pub use notify::{LayoutNotification, LayoutObserver, RecordingObserver};
pub use pattern::{LayoutPattern, MAX_SLOTS, PatternError};
pub use reorder::{DragSession, LiveSwap, ReorderController};
pub use slider::{SizeSlider, SlideInput, SliderAria};
pub use slot::{Slot, SlotId, SlotRecord};

pub use slotgrid_core::{KeyCode, KeyEvent, PairGeometry};
