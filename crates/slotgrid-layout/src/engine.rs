#![forbid(unsafe_code)]

//! The layout engine: owns the slots and routes every gesture.
//!
//! # Invariants
//!
//! 1. `slots.len() >= pattern.total_slots()` after any layout; slots are never
//!    truncated by a smaller pattern.
//! 2. One [`SizeSlider`] exists per adjacent pair inside one row, keyed by the
//!    left slot id.
//! 3. Slot order only changes through the private swap path, which moves
//!    content, width, hidden flag, form handle and measured height together.
//! 4. Widths only change through `apply_layout` and the private pair-split
//!    path; a pair split keeps `left + right` equal to the budget captured at
//!    slide start.
//! 5. At most one drag or slide session is open. A rejected call leaves
//!    every field untouched.
//!
//! # Deferred work
//!
//! Content changes schedule a row-height pass on a [`Debouncer`]. The host
//! calls [`LayoutEngine::tick`] from its event loop; the pass runs once the
//! quiet window has elapsed and the engine is visible.

use std::fmt;
use std::ops::Range;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use slotgrid_core::{Debouncer, KeyCode, KeyEvent, PairGeometry};
use web_time::Instant;

use crate::config::EngineConfig;
use crate::error::{GestureKind, LayoutError};
use crate::host::EditorHost;
use crate::notify::{LayoutNotification, LayoutObserver};
use crate::pattern::LayoutPattern;
use crate::reorder::{DragSession, ReorderController};
use crate::slider::{SizeSlider, SlideInput, SliderAria};
use crate::slot::{Slot, SlotId, SlotRecord, is_valid_width};

/// Accessible state of one slot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SlotAria {
    /// Reachable by tab; only the selected slot is.
    pub focusable: bool,
    pub selected: bool,
    /// The slot currently holds the content being dragged.
    pub grabbed: bool,
    pub hidden: bool,
}

/// Serializable layout state: the pattern plus every slot record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutSnapshot<C> {
    pub pattern: String,
    pub slots: Vec<SlotRecord<C>>,
}

/// Grid of placeholder slots with drag reordering and column sliders.
///
/// `C` is the host's content handle, `H` the editor host that builds and
/// shows edit forms.
pub struct LayoutEngine<C, H: EditorHost<C>> {
    config: EngineConfig,
    pattern: LayoutPattern,
    slots: Vec<Slot<C, H::Form>>,
    sliders: FxHashMap<SlotId, SizeSlider>,
    reorder: ReorderController,
    active_slide: Option<SlotId>,
    heights: Debouncer,
    visible: bool,
    focused: Option<SlotId>,
    open_form: Option<SlotId>,
    host: H,
    observer: Box<dyn LayoutObserver>,
}

impl<C, H: EditorHost<C>> fmt::Debug for LayoutEngine<C, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayoutEngine")
            .field("pattern", &self.pattern.to_string())
            .field("slots", &self.slots.len())
            .field("widths", &self.widths())
            .field("drag", &self.reorder.session())
            .field("active_slide", &self.active_slide)
            .field("selected", &self.reorder.selected())
            .field("focused", &self.focused)
            .field("open_form", &self.open_form)
            .field("visible", &self.visible)
            .finish_non_exhaustive()
    }
}

impl<C, H: EditorHost<C>> LayoutEngine<C, H> {
    /// Engine with default config and a single padding slot.
    pub fn new(host: H, observer: Box<dyn LayoutObserver>) -> Self {
        Self::with_config(host, observer, EngineConfig::default())
    }

    /// Engine with `config` (validated) and a single padding slot.
    pub fn with_config(host: H, observer: Box<dyn LayoutObserver>, config: EngineConfig) -> Self {
        let config = config.validated();
        let mut engine = Self {
            pattern: LayoutPattern::single(),
            slots: Vec::new(),
            sliders: FxHashMap::default(),
            reorder: ReorderController::new(),
            active_slide: None,
            heights: Debouncer::new(config.height_debounce()),
            visible: config.start_visible,
            focused: None,
            open_form: None,
            host,
            observer,
            config,
        };
        engine.apply_layout(LayoutPattern::single(), None);
        engine
    }

    /// Engine arranged by `pattern` over the host's persisted records.
    ///
    /// Stored widths are applied per slot; records without a usable width
    /// fall back to the even split of their row.
    pub fn with_records(
        host: H,
        observer: Box<dyn LayoutObserver>,
        config: EngineConfig,
        pattern: &str,
        records: Vec<SlotRecord<C>>,
    ) -> Result<Self, LayoutError> {
        let pattern = LayoutPattern::parse(pattern)
            .map_err(LayoutError::from)
            .inspect_err(|error| rejected("with_records", error))?;
        let widths: Vec<f64> = records
            .iter()
            .map(|record| record.width.unwrap_or(f64::NAN))
            .collect();

        let mut engine = Self::with_config(host, observer, config);
        let default_width = engine.config.default_width;
        engine.slots = records
            .into_iter()
            .map(|record| Slot::from_record(record, default_width))
            .collect();
        engine.apply_layout(pattern, Some(widths.as_slice()));
        Ok(engine)
    }

    /// Rebuild an engine from a [`snapshot`](Self::snapshot).
    pub fn from_snapshot(
        host: H,
        observer: Box<dyn LayoutObserver>,
        config: EngineConfig,
        snapshot: LayoutSnapshot<C>,
    ) -> Result<Self, LayoutError> {
        Self::with_records(host, observer, config, &snapshot.pattern, snapshot.slots)
    }

    // ---------------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------------

    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub const fn pattern(&self) -> &LayoutPattern {
        &self.pattern
    }

    /// Every slot, arranged or not.
    #[must_use]
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Slots placed in the grid: `min(slot_count, total_slots)`.
    #[must_use]
    pub fn arranged_count(&self) -> usize {
        self.slots.len().min(self.pattern.total_slots())
    }

    #[must_use]
    pub fn slot(&self, id: SlotId) -> Option<&Slot<C, H::Form>> {
        self.slots.get(id.get())
    }

    #[must_use]
    pub fn slots(&self) -> &[Slot<C, H::Form>] {
        &self.slots
    }

    /// Slot id ranges of each arranged row.
    #[must_use]
    pub fn rows(&self) -> Vec<Range<usize>> {
        let arranged = self.arranged_count();
        self.pattern
            .rows()
            .into_iter()
            .map(|row| row.start.min(arranged)..row.end.min(arranged))
            .collect()
    }

    /// Width of every slot, indexed by slot id.
    #[must_use]
    pub fn widths(&self) -> Vec<f64> {
        self.slots.iter().map(Slot::width).collect()
    }

    #[must_use]
    pub fn slider(&self, separator: SlotId) -> Option<&SizeSlider> {
        self.sliders.get(&separator)
    }

    /// Separator ids in ascending order.
    #[must_use]
    pub fn separators(&self) -> Vec<SlotId> {
        let mut ids: Vec<SlotId> = self.sliders.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    #[must_use]
    pub const fn drag_session(&self) -> Option<&DragSession> {
        self.reorder.session()
    }

    /// Separator currently being slid.
    #[must_use]
    pub const fn active_slide(&self) -> Option<SlotId> {
        self.active_slide
    }

    #[must_use]
    pub const fn selected(&self) -> Option<SlotId> {
        self.reorder.selected()
    }

    #[must_use]
    pub const fn focused(&self) -> Option<SlotId> {
        self.focused
    }

    /// Slot whose edit form is open.
    #[must_use]
    pub const fn open_form(&self) -> Option<SlotId> {
        self.open_form
    }

    #[must_use]
    pub const fn is_visible(&self) -> bool {
        self.visible
    }

    /// Whether a debounced height pass is waiting for [`tick`](Self::tick).
    #[must_use]
    pub const fn height_pass_pending(&self) -> bool {
        self.heights.is_pending()
    }

    #[must_use]
    pub const fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    #[must_use]
    pub fn slot_aria(&self, id: SlotId) -> Option<SlotAria> {
        let slot = self.slots.get(id.get())?;
        let selected = self.reorder.is_selected(id);
        Some(SlotAria {
            focusable: selected,
            selected,
            grabbed: self
                .reorder
                .session()
                .is_some_and(|session| session.pending_index == id),
            hidden: slot.is_hidden,
        })
    }

    #[must_use]
    pub fn slider_aria(&self, separator: SlotId) -> Option<SliderAria> {
        self.sliders.get(&separator).map(SizeSlider::aria)
    }

    // ---------------------------------------------------------------------
    // Layout and content
    // ---------------------------------------------------------------------

    /// Arrange the slots by `pattern`.
    ///
    /// Pads the collection up to the pattern's total, rebuilds rows and
    /// sliders, applies `widths[i]` to slot `i` where valid (even row split
    /// otherwise) and runs a height pass.
    pub fn set_layout(&mut self, pattern: &str, widths: Option<&[f64]>) -> Result<(), LayoutError> {
        self.check_idle()
            .and_then(|()| LayoutPattern::parse(pattern).map_err(LayoutError::from))
            .map(|pattern| self.apply_layout(pattern, widths))
            .inspect_err(|error| rejected("set_layout", error))
    }

    /// Replace a slot's content. Drops the form built for the old content
    /// and schedules a height pass.
    pub fn set_slot_content(&mut self, id: SlotId, content: Option<C>, now: Instant) -> Result<(), LayoutError> {
        let slot = self
            .slot_mut(id)
            .inspect_err(|error| rejected("set_slot_content", error))?;
        slot.content = content;
        slot.form = None;
        slot.natural_height = None;
        self.heights.schedule(now);
        Ok(())
    }

    /// Record the height the host measured for a slot's content.
    ///
    /// Negative or non-finite heights count as unknown.
    pub fn report_natural_height(&mut self, id: SlotId, height: Option<f64>, now: Instant) -> Result<(), LayoutError> {
        let slot = self
            .slot_mut(id)
            .inspect_err(|error| rejected("report_natural_height", error))?;
        slot.natural_height = height.filter(|h| h.is_finite() && *h >= 0.0);
        self.heights.schedule(now);
        Ok(())
    }

    pub fn set_slot_hidden(&mut self, id: SlotId, hidden: bool) -> Result<(), LayoutError> {
        let slot = self
            .slot_mut(id)
            .inspect_err(|error| rejected("set_slot_hidden", error))?;
        if slot.is_hidden != hidden {
            slot.is_hidden = hidden;
            self.emit(LayoutNotification::HiddenChanged { id, hidden });
        }
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Reorder
    // ---------------------------------------------------------------------

    /// Swap two arranged slots and notify the host.
    pub fn reorder(&mut self, id1: SlotId, id2: SlotId) -> Result<(), LayoutError> {
        self.try_reorder(id1, id2)
            .inspect_err(|error| rejected("reorder", error))
    }

    fn try_reorder(&mut self, id1: SlotId, id2: SlotId) -> Result<(), LayoutError> {
        self.check_idle()?;
        self.check_arranged(id1)?;
        self.check_arranged(id2)?;
        if id1 != id2 {
            self.swap_slots(id1, id2);
            self.emit(LayoutNotification::Reordered { id1, id2 });
        }
        Ok(())
    }

    pub fn begin_drag(&mut self, id: SlotId) -> Result<(), LayoutError> {
        self.try_begin_drag(id)
            .inspect_err(|error| rejected("begin_drag", error))
    }

    fn try_begin_drag(&mut self, id: SlotId) -> Result<(), LayoutError> {
        if self.active_slide.is_some() {
            return Err(LayoutError::ConcurrentGesture {
                active: GestureKind::Slide,
            });
        }
        self.check_arranged(id)?;
        self.reorder.begin_drag(id)
    }

    /// Pointer entered `id`; the live arrangement follows immediately.
    pub fn drag_enter(&mut self, id: SlotId) -> Result<(), LayoutError> {
        self.try_drag_enter(id)
            .inspect_err(|error| rejected("drag_enter", error))
    }

    fn try_drag_enter(&mut self, id: SlotId) -> Result<(), LayoutError> {
        if !self.reorder.is_dragging() {
            return Err(LayoutError::NoActiveGesture {
                expected: GestureKind::Drag,
            });
        }
        self.check_arranged(id)?;
        let swap = self.reorder.drag_enter(id)?;
        for (a, b) in swap.swaps() {
            self.swap_slots(a, b);
        }
        Ok(())
    }

    pub fn drag_leave(&mut self) -> Result<(), LayoutError> {
        self.reorder
            .drag_leave()
            .inspect_err(|error| rejected("drag_leave", error))
    }

    /// Finish the drag. Emits one `Reordered(start, pending)` if the
    /// dragged content moved; focus follows it.
    pub fn end_drag(&mut self) -> Result<(), LayoutError> {
        let session = self
            .reorder
            .end_drag()
            .inspect_err(|error| rejected("end_drag", error))?;
        self.focused = Some(session.pending_index);
        if session.has_moved() {
            self.emit(LayoutNotification::Reordered {
                id1: session.start_index,
                id2: session.pending_index,
            });
        }
        Ok(())
    }

    /// Move `id` one position earlier. No-op at the first slot.
    pub fn move_up(&mut self, id: SlotId) -> Result<(), LayoutError> {
        self.try_move(id, true)
            .inspect_err(|error| rejected("move_up", error))
    }

    /// Move `id` one position later. No-op at the last arranged slot.
    pub fn move_down(&mut self, id: SlotId) -> Result<(), LayoutError> {
        self.try_move(id, false)
            .inspect_err(|error| rejected("move_down", error))
    }

    fn try_move(&mut self, id: SlotId, up: bool) -> Result<(), LayoutError> {
        if self.active_slide.is_some() {
            return Err(LayoutError::ConcurrentGesture {
                active: GestureKind::Slide,
            });
        }
        let arranged = self.arranged_count();
        let swap = if up {
            self.reorder.move_up(id, arranged)?
        } else {
            self.reorder.move_down(id, arranged)?
        };
        if let Some((from, to)) = swap {
            self.swap_slots(from, to);
            self.emit(LayoutNotification::Reordered { id1: from, id2: to });
            self.focused = Some(to);
            self.reorder.select(Some(to));
        }
        Ok(())
    }

    /// Keyboard input on a slot.
    ///
    /// Space toggles selection, Enter activates, and the arrows move the
    /// slot while it is selected. Returns whether the key was consumed.
    pub fn slot_key(&mut self, id: SlotId, key: impl Into<KeyEvent>) -> Result<bool, LayoutError> {
        self.try_slot_key(id, key.into())
            .inspect_err(|error| rejected("slot_key", error))
    }

    fn try_slot_key(&mut self, id: SlotId, key: KeyEvent) -> Result<bool, LayoutError> {
        if !key.is_actuation() || key.has_shortcut_modifier() {
            return Ok(false);
        }
        self.check_arranged(id)?;
        match key.code {
            KeyCode::Char(' ') => {
                let selected = self.reorder.toggle_selected(id);
                self.focused = Some(id);
                tracing::trace!(target: "slotgrid.reorder", slot = id.get(), selected, "selection toggled");
                Ok(true)
            }
            KeyCode::Enter => self.try_activate(id).map(|()| true),
            KeyCode::Up | KeyCode::Left if self.reorder.is_selected(id) => {
                self.try_move(id, true).map(|()| true)
            }
            KeyCode::Down | KeyCode::Right if self.reorder.is_selected(id) => {
                self.try_move(id, false).map(|()| true)
            }
            _ => Ok(false),
        }
    }

    // ---------------------------------------------------------------------
    // Resize
    // ---------------------------------------------------------------------

    /// Give `left` the share `percentage` of its pair budget with `left + 1`.
    ///
    /// The share is clamped to `[min_share, 1 - min_share]`. Runs as one
    /// complete slide and emits `WidthsChanged`.
    pub fn resize_adjacent_pair(&mut self, left: SlotId, percentage: f64) -> Result<(), LayoutError> {
        self.try_resize(left, percentage)
            .inspect_err(|error| rejected("resize_adjacent_pair", error))
    }

    fn try_resize(&mut self, left: SlotId, percentage: f64) -> Result<(), LayoutError> {
        self.check_idle()?;
        self.check_separator(left)?;
        let share = self.config.clamp_share(percentage);
        self.atomic_slide(left, share)
    }

    /// Open a pointer slide on `separator` with the geometry measured now.
    ///
    /// Other separators in the row are disabled until the slide ends.
    pub fn begin_slide(&mut self, separator: SlotId, geometry: PairGeometry) -> Result<(), LayoutError> {
        self.try_begin_slide(separator, geometry)
            .inspect_err(|error| rejected("begin_slide", error))
    }

    fn try_begin_slide(&mut self, separator: SlotId, geometry: PairGeometry) -> Result<(), LayoutError> {
        self.check_idle()?;
        self.check_separator(separator)?;
        let (left, right) = self.pair_widths(separator);
        self.slider_mut(separator)?.start(left, right, Some(geometry))?;
        self.active_slide = Some(separator);
        self.set_row_sliders_enabled(separator, false);
        Ok(())
    }

    /// Move the active slide. Unresolvable pointer input is ignored.
    pub fn slide_to(&mut self, input: SlideInput) -> Result<(), LayoutError> {
        self.try_slide_to(input)
            .inspect_err(|error| rejected("slide_to", error))
    }

    fn try_slide_to(&mut self, input: SlideInput) -> Result<(), LayoutError> {
        let separator = self.active_slide.ok_or(LayoutError::NoActiveGesture {
            expected: GestureKind::Slide,
        })?;
        let slider = self
            .sliders
            .get_mut(&separator)
            .ok_or(LayoutError::NoActiveGesture {
                expected: GestureKind::Slide,
            })?;
        let Some(share) = slider.resolve(input, &self.config) else {
            tracing::trace!(target: "slotgrid.slider", ?input, "slide input ignored");
            return Ok(());
        };
        if let Some((left, right)) = slider.split(share) {
            self.write_pair(separator, left, right);
            tracing::trace!(target: "slotgrid.slider", separator = separator.get(), share, "slid");
        }
        Ok(())
    }

    /// Close the active slide, re-enable the row and emit the widths.
    pub fn end_slide(&mut self) -> Result<(), LayoutError> {
        self.try_end_slide()
            .inspect_err(|error| rejected("end_slide", error))
    }

    fn try_end_slide(&mut self) -> Result<(), LayoutError> {
        let separator = self.active_slide.ok_or(LayoutError::NoActiveGesture {
            expected: GestureKind::Slide,
        })?;
        if let Some(slider) = self.sliders.get_mut(&separator) {
            slider.end()?;
        }
        self.active_slide = None;
        self.set_row_sliders_enabled(separator, true);
        self.emit_widths();
        Ok(())
    }

    /// Keyboard input on a separator. Each bound key runs one complete
    /// slide. Returns whether the key was consumed.
    pub fn slider_key(&mut self, separator: SlotId, key: impl Into<KeyEvent>) -> Result<bool, LayoutError> {
        self.try_slider_key(separator, key.into())
            .inspect_err(|error| rejected("slider_key", error))
    }

    fn try_slider_key(&mut self, separator: SlotId, key: KeyEvent) -> Result<bool, LayoutError> {
        if !key.is_actuation()
            || key.has_shortcut_modifier()
            || !matches!(key.code, KeyCode::Left | KeyCode::Right | KeyCode::Enter)
        {
            return Ok(false);
        }
        self.check_idle()?;
        self.check_separator(separator)?;
        let slider = self
            .sliders
            .get_mut(&separator)
            .ok_or(LayoutError::NotAdjacent { left: separator })?;
        let Some(share) = slider.key_target(key.code, &self.config) else {
            return Ok(false);
        };
        self.atomic_slide(separator, share)?;
        Ok(true)
    }

    // ---------------------------------------------------------------------
    // Editing flow
    // ---------------------------------------------------------------------

    /// Open the edit form of `id`, building it on first use.
    pub fn activate_slot(&mut self, id: SlotId) -> Result<(), LayoutError> {
        self.try_activate(id)
            .inspect_err(|error| rejected("activate_slot", error))
    }

    fn try_activate(&mut self, id: SlotId) -> Result<(), LayoutError> {
        if self.reorder.is_dragging() {
            return Err(LayoutError::ConcurrentGesture {
                active: GestureKind::Drag,
            });
        }
        self.check_arranged(id)?;
        if let Some(previous) = self.open_form
            && previous != id
        {
            self.host.close_form(previous);
        }
        self.reorder.deselect(id);

        let slot = self.slots.get_mut(id.get()).ok_or(LayoutError::OutOfRange {
            id,
            count: self.pattern.total_slots(),
        })?;
        if slot.form.is_none() {
            slot.form = Some(self.host.build_form(id, slot.content.as_ref()));
        }
        if let Some(form) = slot.form.as_ref() {
            self.host.open_form(id, form, slot.content.as_ref());
        }

        self.open_form = Some(id);
        self.focused = Some(id);
        tracing::debug!(target: "slotgrid.layout", slot = id.get(), "slot activated");
        self.emit(LayoutNotification::SlotActivated { id });
        Ok(())
    }

    /// The open slot's content was deleted from its form.
    pub fn form_removed(&mut self) -> Result<(), LayoutError> {
        let id = self
            .open_form
            .ok_or(LayoutError::NoOpenForm)
            .inspect_err(|error| rejected("form_removed", error))?;
        if let Some(slot) = self.slots.get_mut(id.get()) {
            slot.clear();
        }
        self.host.close_form(id);
        self.emit(LayoutNotification::ContentCleared { ids: vec![id] });
        Ok(())
    }

    /// The form closed; focus returns to its slot and heights are
    /// re-measured.
    pub fn form_closed(&mut self, now: Instant) -> Result<(), LayoutError> {
        let id = self
            .open_form
            .take()
            .ok_or(LayoutError::NoOpenForm)
            .inspect_err(|error| rejected("form_closed", error))?;
        self.focused = Some(id);
        self.heights.schedule(now);
        Ok(())
    }

    /// Reset every hidden slot to empty and return the affected ids.
    pub fn delete_hidden(&mut self) -> Result<Vec<SlotId>, LayoutError> {
        self.check_idle()
            .inspect_err(|error| rejected("delete_hidden", error))?;
        let ids: Vec<SlotId> = self
            .slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_hidden)
            .map(|(index, _)| SlotId::new(index))
            .collect();
        if ids.is_empty() {
            return Ok(ids);
        }

        for &id in &ids {
            if let Some(slot) = self.slots.get_mut(id.get()) {
                slot.clear();
            }
            if self.open_form == Some(id) {
                self.host.close_form(id);
            }
        }
        tracing::info!(target: "slotgrid.layout", count = ids.len(), "hidden slots cleared");
        self.emit(LayoutNotification::ContentCleared { ids: ids.clone() });
        self.run_height_pass();
        Ok(ids)
    }

    /// Height passes only run while visible; becoming visible schedules one.
    pub fn set_visible(&mut self, visible: bool, now: Instant) {
        if visible && !self.visible {
            self.heights.schedule(now);
        }
        self.visible = visible;
    }

    /// Single pointer click: focuses the slot.
    pub fn click(&mut self, id: SlotId) -> Result<(), LayoutError> {
        self.check_arranged(id)
            .inspect_err(|error| rejected("click", error))?;
        self.focused = Some(id);
        Ok(())
    }

    /// Double click activates the slot.
    pub fn double_click(&mut self, id: SlotId) -> Result<(), LayoutError> {
        self.try_activate(id)
            .inspect_err(|error| rejected("double_click", error))
    }

    /// Run deferred work that is due. Returns whether a height pass ran.
    pub fn tick(&mut self, now: Instant) -> bool {
        if !self.visible || !self.heights.poll(now) {
            return false;
        }
        self.run_height_pass();
        true
    }

    // ---------------------------------------------------------------------
    // Internals
    // ---------------------------------------------------------------------

    fn apply_layout(&mut self, pattern: LayoutPattern, widths: Option<&[f64]>) {
        let total = pattern.total_slots();
        if self.slots.len() < total {
            let width = self.config.default_width;
            self.slots.resize_with(total, || Slot::padding(width));
        }

        for row in pattern.rows() {
            let even = 100.0 / row.len() as f64;
            for index in row {
                let width = widths
                    .and_then(|widths| widths.get(index).copied())
                    .filter(|width| is_valid_width(*width))
                    .unwrap_or(even);
                if let Some(slot) = self.slots.get_mut(index) {
                    slot.width = width;
                }
            }
        }

        self.pattern = pattern;
        self.rebuild_sliders();

        let arranged = self.arranged_count();
        if self.reorder.selected().is_some_and(|id| id.get() >= arranged) {
            self.reorder.select(None);
        }
        if self.focused.is_some_and(|id| id.get() >= arranged) {
            self.focused = None;
        }

        tracing::info!(
            target: "slotgrid.layout",
            pattern = %self.pattern,
            slots = self.slots.len(),
            arranged,
            "layout applied"
        );
        self.run_height_pass();
    }

    fn rebuild_sliders(&mut self) {
        self.sliders.clear();
        for row in self.pattern.rows() {
            for left in row.start..row.end.saturating_sub(1) {
                let separator = SlotId::new(left);
                let (left_width, right_width) = self.pair_widths(separator);
                self.sliders.insert(
                    separator,
                    SizeSlider::new(separator, left_width, right_width, &self.config),
                );
            }
        }
    }

    /// The one place slot order changes.
    fn swap_slots(&mut self, a: SlotId, b: SlotId) {
        if a == b || a.get() >= self.slots.len() || b.get() >= self.slots.len() {
            return;
        }
        self.slots.swap(a.get(), b.get());
        self.open_form = self.open_form.map(|open| match open {
            open if open == a => b,
            open if open == b => a,
            open => open,
        });
        for slider in self.sliders.values_mut() {
            let left = slider.separator().get();
            if let (Some(l), Some(r)) = (self.slots.get(left), self.slots.get(left + 1)) {
                slider.sync(l.width, r.width);
            }
        }
        tracing::trace!(target: "slotgrid.reorder", a = a.get(), b = b.get(), "slots swapped");
    }

    /// The one place a pair split lands in the slots. The sliders sharing a
    /// slot with this pair are re-derived.
    fn write_pair(&mut self, separator: SlotId, left_width: f64, right_width: f64) {
        let left = separator.get();
        if let Some(slot) = self.slots.get_mut(left) {
            slot.width = left_width;
        }
        if let Some(slot) = self.slots.get_mut(left + 1) {
            slot.width = right_width;
        }
        let neighbours = [separator.prev(), Some(separator.next())];
        for neighbour in neighbours.into_iter().flatten() {
            let (l, r) = self.pair_widths(neighbour);
            if let Some(slider) = self.sliders.get_mut(&neighbour) {
                slider.sync(l, r);
            }
        }
    }

    /// Start, split and end in one step, then emit the widths.
    fn atomic_slide(&mut self, separator: SlotId, share: f64) -> Result<(), LayoutError> {
        let (left, right) = self.pair_widths(separator);
        let slider = self.slider_mut(separator)?;
        slider.start(left, right, None)?;
        let split = slider.split(share);
        slider.end()?;
        if let Some((left, right)) = split {
            self.write_pair(separator, left, right);
        }
        tracing::debug!(target: "slotgrid.slider", separator = separator.get(), share, "pair resized");
        self.emit_widths();
        Ok(())
    }

    fn set_row_sliders_enabled(&mut self, separator: SlotId, enabled: bool) {
        let row = self.pattern.row_of(separator);
        for slider in self.sliders.values_mut() {
            if slider.separator() != separator && self.pattern.row_of(slider.separator()) == row {
                slider.set_enabled(enabled);
            }
        }
    }

    fn run_height_pass(&mut self) {
        let _span = tracing::debug_span!(
            target: "slotgrid.layout",
            "height_pass",
            rows = self.pattern.row_count()
        )
        .entered();
        let arranged = self.arranged_count();
        for row in self.rows() {
            let Some(cells) = self.slots.get_mut(row) else {
                continue;
            };
            let tallest = cells
                .iter()
                .filter_map(|slot| slot.natural_height)
                .fold(0.0_f64, f64::max);
            let rendered = (tallest > 0.0).then_some(tallest);
            for slot in cells.iter_mut() {
                slot.rendered_height = rendered;
            }
        }
        for slot in self.slots.iter_mut().skip(arranged) {
            slot.rendered_height = None;
        }
        self.heights.cancel();
    }

    fn pair_widths(&self, separator: SlotId) -> (f64, f64) {
        let width = |index: usize| {
            self.slots
                .get(index)
                .map_or(self.config.default_width, Slot::width)
        };
        (width(separator.get()), width(separator.get() + 1))
    }

    fn slot_mut(&mut self, id: SlotId) -> Result<&mut Slot<C, H::Form>, LayoutError> {
        let count = self.slots.len();
        self.slots
            .get_mut(id.get())
            .ok_or(LayoutError::OutOfRange { id, count })
    }

    fn slider_mut(&mut self, separator: SlotId) -> Result<&mut SizeSlider, LayoutError> {
        self.sliders
            .get_mut(&separator)
            .ok_or(LayoutError::NotAdjacent { left: separator })
    }

    fn check_idle(&self) -> Result<(), LayoutError> {
        if self.reorder.is_dragging() {
            return Err(LayoutError::ConcurrentGesture {
                active: GestureKind::Drag,
            });
        }
        if self.active_slide.is_some() {
            return Err(LayoutError::ConcurrentGesture {
                active: GestureKind::Slide,
            });
        }
        Ok(())
    }

    fn check_arranged(&self, id: SlotId) -> Result<(), LayoutError> {
        let count = self.arranged_count();
        if id.get() >= count {
            return Err(LayoutError::OutOfRange { id, count });
        }
        Ok(())
    }

    fn check_separator(&self, left: SlotId) -> Result<(), LayoutError> {
        self.check_arranged(left)?;
        if !self.sliders.contains_key(&left) {
            return Err(LayoutError::NotAdjacent { left });
        }
        Ok(())
    }

    fn emit_widths(&mut self) {
        let widths = self.widths();
        self.emit(LayoutNotification::WidthsChanged { widths });
    }

    fn emit(&mut self, notification: LayoutNotification) {
        tracing::trace!(target: "slotgrid.layout", ?notification, "notify");
        self.observer.notify(&notification);
    }
}

impl<C: Clone, H: EditorHost<C>> LayoutEngine<C, H> {
    /// Export the pattern and every slot record.
    #[must_use]
    pub fn snapshot(&self) -> LayoutSnapshot<C> {
        LayoutSnapshot {
            pattern: self.pattern.to_string(),
            slots: self.slots.iter().map(Slot::to_record).collect(),
        }
    }
}

fn rejected(op: &'static str, error: &LayoutError) {
    tracing::debug!(target: "slotgrid.layout", op, %error, "operation rejected");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::RecordingObserver;
    use crate::host::NullEditorHost;
    use crate::pattern::PatternError;
    use slotgrid_core::{KeyEventKind, Modifiers};
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::registry::LookupSpan;
    use web_time::Duration;

    const EPS: f64 = 1e-9;

    type Engine = LayoutEngine<&'static str, NullEditorHost>;

    fn engine(pattern: &str) -> (Engine, RecordingObserver) {
        let log = RecordingObserver::new();
        let mut engine = Engine::new(NullEditorHost, Box::new(log.clone()));
        engine.set_layout(pattern, None).unwrap();
        (engine, log)
    }

    fn id(n: usize) -> SlotId {
        SlotId::new(n)
    }

    fn assert_widths(engine: &Engine, expected: &[f64]) {
        let widths = engine.widths();
        assert_eq!(widths.len(), expected.len(), "{widths:?}");
        for (actual, expected) in widths.iter().zip(expected) {
            assert!((actual - expected).abs() < EPS, "{widths:?} != {expected:?}");
        }
    }

    /// Host that records calls and numbers the forms it builds.
    #[derive(Debug, Default)]
    struct CountingHost {
        built: usize,
        opened: Vec<(SlotId, usize)>,
        closed: Vec<SlotId>,
    }

    impl EditorHost<&'static str> for CountingHost {
        type Form = usize;

        fn build_form(&mut self, _id: SlotId, _content: Option<&&'static str>) -> usize {
            self.built += 1;
            self.built
        }

        fn open_form(&mut self, id: SlotId, form: &usize, _content: Option<&&'static str>) {
            self.opened.push((id, *form));
        }

        fn close_form(&mut self, id: SlotId) {
            self.closed.push(id);
        }
    }

    #[test]
    fn new_engine_has_one_slot() {
        let log = RecordingObserver::new();
        let engine = Engine::new(NullEditorHost, Box::new(log.clone()));
        assert_eq!(engine.slot_count(), 1);
        assert_eq!(engine.arranged_count(), 1);
        assert_eq!(engine.pattern().to_string(), "1");
        assert!(engine.separators().is_empty());
        assert!(log.is_empty());
    }

    #[test]
    fn layout_builds_rows_sliders_and_even_widths() {
        let (engine, log) = engine("1-2-3");
        assert_eq!(engine.slot_count(), 6);
        assert_eq!(engine.rows(), vec![0..1, 1..3, 3..6]);
        assert_eq!(engine.separators(), vec![id(1), id(3), id(4)]);
        assert_widths(&engine, &[100.0, 50.0, 50.0, 100.0 / 3.0, 100.0 / 3.0, 100.0 / 3.0]);
        assert!(log.is_empty());
    }

    #[test]
    fn layout_applies_valid_widths_only() {
        let (mut engine, _) = engine("3");
        engine
            .set_layout("3", Some([20.0, f64::NAN, 150.0].as_slice()))
            .unwrap();
        assert_widths(&engine, &[20.0, 100.0 / 3.0, 100.0 / 3.0]);
        let slider = engine.slider(id(0)).unwrap();
        assert!((slider.position() - 20.0 / (20.0 + 100.0 / 3.0)).abs() < EPS);
    }

    #[test]
    fn invalid_layout_keeps_previous() {
        let (mut engine, log) = engine("1-2");
        for bad in ["", "2-a", "0-1", "1--2"] {
            assert!(matches!(
                engine.set_layout(bad, None),
                Err(LayoutError::InvalidPattern(_))
            ));
        }
        assert_eq!(engine.slot_count(), 3);
        assert_eq!(engine.pattern().to_string(), "1-2");
        assert!(log.is_empty());
    }

    #[test]
    fn oversized_layout_is_rejected_without_allocating() {
        let (mut engine, log) = engine("1-2");
        let cases = [
            (usize::MAX.to_string(), 0),
            ("100000000".to_owned(), 0),
            ("1024-1".to_owned(), 1),
        ];
        for (huge, row) in cases {
            assert_eq!(
                engine.set_layout(&huge, None),
                Err(LayoutError::InvalidPattern(PatternError::TooLarge { row })),
                "{huge:?}"
            );
        }
        assert_eq!(engine.slot_count(), 3);
        assert!(log.is_empty());
    }

    #[test]
    fn smaller_layout_keeps_extra_slots() {
        let (mut engine, _) = engine("2-3");
        engine.set_layout("1-1", None).unwrap();
        assert_eq!(engine.slot_count(), 5);
        assert_eq!(engine.arranged_count(), 2);
        assert_eq!(engine.rows(), vec![0..1, 1..2]);
        assert!(engine.separators().is_empty());
    }

    #[test]
    fn reorder_moves_everything_together() {
        let (mut engine, log) = engine("1-2");
        let now = Instant::now();
        engine.set_slot_content(id(1), Some("b"), now).unwrap();
        engine.set_slot_hidden(id(1), true).unwrap();
        engine.resize_adjacent_pair(id(1), 0.3).unwrap();
        log.take();

        engine.reorder(id(1), id(2)).unwrap();
        assert_eq!(engine.slot(id(2)).unwrap().content(), Some(&"b"));
        assert!(engine.slot(id(2)).unwrap().is_hidden());
        assert_widths(&engine, &[100.0, 70.0, 30.0]);
        assert!((engine.slider(id(1)).unwrap().position() - 0.7).abs() < EPS);
        assert_eq!(
            log.take(),
            vec![LayoutNotification::Reordered {
                id1: id(1),
                id2: id(2)
            }]
        );
    }

    #[test]
    fn reorder_out_of_range_rejected() {
        let (mut engine, log) = engine("2");
        assert_eq!(
            engine.reorder(id(0), id(2)),
            Err(LayoutError::OutOfRange { id: id(2), count: 2 })
        );
        assert!(log.is_empty());
    }

    #[test]
    fn resize_clamps_and_conserves_budget() {
        let (mut engine, log) = engine("2");
        engine.resize_adjacent_pair(id(0), -1.0).unwrap();
        assert_widths(&engine, &[5.0, 95.0]);
        engine.resize_adjacent_pair(id(0), 2.0).unwrap();
        assert_widths(&engine, &[95.0, 5.0]);
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn resize_requires_a_pair() {
        let (mut engine, _) = engine("1-2");
        assert_eq!(
            engine.resize_adjacent_pair(id(0), 0.5),
            Err(LayoutError::NotAdjacent { left: id(0) })
        );
        assert_eq!(
            engine.resize_adjacent_pair(id(2), 0.5),
            Err(LayoutError::NotAdjacent { left: id(2) })
        );
        assert_eq!(
            engine.resize_adjacent_pair(id(7), 0.5),
            Err(LayoutError::OutOfRange { id: id(7), count: 3 })
        );
    }

    #[test]
    fn resize_resyncs_neighbouring_slider() {
        let (mut engine, _) = engine("3");
        engine.resize_adjacent_pair(id(1), 0.25).unwrap();
        let third = 100.0 / 3.0;
        let middle = 0.25 * 2.0 * third;
        let first = engine.slider(id(0)).unwrap();
        assert!((first.position() - third / (third + middle)).abs() < EPS);
    }

    #[test]
    fn pointer_slide_disables_row_and_emits_on_end() {
        let (mut engine, log) = engine("3");
        let geometry = PairGeometry::new(0.0, 100.0, 10.0, 100.0);
        engine.begin_slide(id(0), geometry).unwrap();
        assert_eq!(engine.active_slide(), Some(id(0)));
        assert!(!engine.slider(id(1)).unwrap().is_enabled());

        engine.slide_to(SlideInput::PointerX(52.5)).unwrap();
        let combined = 200.0 / 3.0;
        assert_widths(&engine, &[0.25 * combined, 0.75 * combined, 100.0 / 3.0]);
        assert!(log.is_empty());

        engine.end_slide().unwrap();
        assert!(engine.slider(id(1)).unwrap().is_enabled());
        assert!(matches!(
            log.take().as_slice(),
            [LayoutNotification::WidthsChanged { .. }]
        ));
    }

    #[test]
    fn second_slide_rejected() {
        let (mut engine, _) = engine("3");
        let geometry = PairGeometry::new(0.0, 100.0, 10.0, 100.0);
        engine.begin_slide(id(0), geometry).unwrap();
        assert_eq!(
            engine.begin_slide(id(1), geometry),
            Err(LayoutError::ConcurrentGesture {
                active: GestureKind::Slide
            })
        );
        assert_eq!(
            engine.resize_adjacent_pair(id(1), 0.5),
            Err(LayoutError::ConcurrentGesture {
                active: GestureKind::Slide
            })
        );
        assert_eq!(engine.active_slide(), Some(id(0)));
    }

    #[test]
    fn degenerate_geometry_is_ignored() {
        let (mut engine, log) = engine("2");
        engine
            .begin_slide(id(0), PairGeometry::new(0.0, 0.0, 0.0, 0.0))
            .unwrap();
        engine.slide_to(SlideInput::PointerX(10.0)).unwrap();
        assert_widths(&engine, &[50.0, 50.0]);
        engine.end_slide().unwrap();
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn slide_calls_without_session_rejected() {
        let (mut engine, _) = engine("2");
        let expected = Err(LayoutError::NoActiveGesture {
            expected: GestureKind::Slide,
        });
        assert_eq!(engine.slide_to(SlideInput::Percentage(0.5)), expected);
        assert_eq!(engine.end_slide(), expected);
    }

    #[test]
    fn slider_keys_step_and_toggle() {
        let (mut engine, log) = engine("2");
        assert_eq!(engine.slider_key(id(0), KeyCode::Left), Ok(true));
        assert_widths(&engine, &[45.0, 55.0]);

        assert_eq!(engine.slider_key(id(0), KeyCode::Enter), Ok(true));
        assert_widths(&engine, &[5.0, 95.0]);
        assert_eq!(engine.slider_aria(id(0)).unwrap().now, 5);

        assert_eq!(engine.slider_key(id(0), KeyCode::Enter), Ok(true));
        assert_widths(&engine, &[45.0, 55.0]);
        assert_eq!(log.len(), 3);

        assert_eq!(engine.slider_key(id(0), KeyCode::Up), Ok(false));
        let release = KeyEvent::new(KeyCode::Right).with_kind(KeyEventKind::Release);
        assert_eq!(engine.slider_key(id(0), release), Ok(false));
        let ctrl = KeyEvent::new(KeyCode::Right).with_modifiers(Modifiers::CTRL);
        assert_eq!(engine.slider_key(id(0), ctrl), Ok(false));
        assert_eq!(log.len(), 3);
    }

    #[test]
    fn drag_emits_single_reorder_at_end() {
        let (mut engine, log) = engine("4");
        let now = Instant::now();
        for (i, name) in ["a", "b", "c", "d"].into_iter().enumerate() {
            engine.set_slot_content(id(i), Some(name), now).unwrap();
        }

        engine.begin_drag(id(0)).unwrap();
        engine.drag_enter(id(2)).unwrap();
        engine.drag_enter(id(3)).unwrap();
        assert!(engine.slot_aria(id(3)).unwrap().grabbed);
        assert!(log.is_empty());
        engine.end_drag().unwrap();

        let contents: Vec<_> = engine.slots().iter().map(|s| *s.content().unwrap()).collect();
        assert_eq!(contents, vec!["d", "b", "c", "a"]);
        assert_eq!(
            log.take(),
            vec![LayoutNotification::Reordered {
                id1: id(0),
                id2: id(3)
            }]
        );
        assert_eq!(engine.focused(), Some(id(3)));
        assert!(engine.drag_session().is_none());
    }

    #[test]
    fn drag_returning_to_start_is_silent() {
        let (mut engine, log) = engine("3");
        engine.resize_adjacent_pair(id(0), 0.3).unwrap();
        log.take();
        let before = engine.widths();

        engine.begin_drag(id(0)).unwrap();
        engine.drag_enter(id(1)).unwrap();
        engine.drag_enter(id(0)).unwrap();
        engine.end_drag().unwrap();

        assert_eq!(engine.widths(), before);
        assert!(log.is_empty());
    }

    #[test]
    fn gestures_exclude_each_other() {
        let (mut engine, _) = engine("3");
        engine.begin_drag(id(0)).unwrap();
        let drag = LayoutError::ConcurrentGesture {
            active: GestureKind::Drag,
        };
        assert_eq!(
            engine.begin_slide(id(0), PairGeometry::new(0.0, 1.0, 1.0, 1.0)),
            Err(drag.clone())
        );
        assert_eq!(engine.move_up(id(1)), Err(drag.clone()));
        assert_eq!(engine.set_layout("2", None), Err(drag.clone()));
        assert_eq!(engine.slider_key(id(0), KeyCode::Left), Err(drag));
        engine.end_drag().unwrap();

        engine
            .begin_slide(id(0), PairGeometry::new(0.0, 1.0, 1.0, 1.0))
            .unwrap();
        let slide = Err(LayoutError::ConcurrentGesture {
            active: GestureKind::Slide,
        });
        assert_eq!(engine.begin_drag(id(0)), slide);
        assert_eq!(engine.move_down(id(0)), slide);
    }

    #[test]
    fn slot_keys_select_and_move() {
        let (mut engine, log) = engine("3");
        assert_eq!(engine.slot_key(id(1), KeyCode::Down), Ok(false));
        assert_eq!(engine.slot_key(id(1), KeyCode::Char(' ')), Ok(true));
        assert_eq!(
            engine.slot_aria(id(1)),
            Some(SlotAria {
                focusable: true,
                selected: true,
                grabbed: false,
                hidden: false
            })
        );

        assert_eq!(engine.slot_key(id(1), KeyCode::Right), Ok(true));
        assert_eq!(engine.selected(), Some(id(2)));
        assert_eq!(engine.focused(), Some(id(2)));
        assert_eq!(
            log.take(),
            vec![LayoutNotification::Reordered {
                id1: id(1),
                id2: id(2)
            }]
        );

        assert_eq!(engine.slot_key(id(2), KeyCode::Down), Ok(true));
        assert!(log.is_empty());
        assert_eq!(engine.slot_key(id(2), KeyCode::Char(' ')), Ok(true));
        assert_eq!(engine.selected(), None);
    }

    #[test]
    fn activation_builds_form_once() {
        let log = RecordingObserver::new();
        let mut engine: LayoutEngine<&'static str, CountingHost> =
            LayoutEngine::new(CountingHost::default(), Box::new(log.clone()));
        engine.set_layout("2", None).unwrap();
        let now = Instant::now();

        engine.activate_slot(id(1)).unwrap();
        engine.form_closed(now).unwrap();
        engine.double_click(id(1)).unwrap();

        assert_eq!(engine.host().built, 1);
        assert_eq!(engine.host().opened, vec![(id(1), 1), (id(1), 1)]);
        assert_eq!(engine.slot(id(1)).unwrap().form(), Some(&1));
        assert_eq!(engine.open_form(), Some(id(1)));
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn activation_clears_selection_and_switches_forms() {
        let log = RecordingObserver::new();
        let mut engine: LayoutEngine<&'static str, CountingHost> =
            LayoutEngine::new(CountingHost::default(), Box::new(log.clone()));
        engine.set_layout("2", None).unwrap();
        engine.slot_key(id(0), KeyCode::Char(' ')).unwrap();
        engine.slot_key(id(0), KeyCode::Enter).unwrap();
        assert_eq!(engine.selected(), None);

        engine.activate_slot(id(1)).unwrap();
        assert_eq!(engine.host().closed, vec![id(0)]);
        assert_eq!(engine.open_form(), Some(id(1)));
    }

    #[test]
    fn form_removed_resets_slot() {
        let log = RecordingObserver::new();
        let mut engine: LayoutEngine<&'static str, CountingHost> =
            LayoutEngine::new(CountingHost::default(), Box::new(log.clone()));
        engine.set_layout("2", None).unwrap();
        let now = Instant::now();
        engine.set_slot_content(id(0), Some("video"), now).unwrap();
        engine.resize_adjacent_pair(id(0), 0.3).unwrap();
        engine.activate_slot(id(0)).unwrap();
        log.take();

        engine.form_removed().unwrap();
        let slot = engine.slot(id(0)).unwrap();
        assert_eq!(slot.content(), None);
        assert_eq!(slot.form(), None);
        assert!((slot.width() - 30.0).abs() < EPS);
        assert_eq!(
            log.take(),
            vec![LayoutNotification::ContentCleared { ids: vec![id(0)] }]
        );

        engine.form_closed(now).unwrap();
        assert_eq!(engine.focused(), Some(id(0)));
        assert_eq!(engine.form_closed(now), Err(LayoutError::NoOpenForm));
        assert_eq!(engine.form_removed(), Err(LayoutError::NoOpenForm));
    }

    #[test]
    fn delete_hidden_clears_all_hidden() {
        let (mut engine, log) = engine("3");
        let now = Instant::now();
        engine.set_slot_content(id(0), Some("a"), now).unwrap();
        engine.set_slot_content(id(2), Some("c"), now).unwrap();
        engine.set_slot_hidden(id(0), true).unwrap();
        engine.set_slot_hidden(id(2), true).unwrap();
        engine.set_slot_hidden(id(2), true).unwrap();
        assert_eq!(log.len(), 2);
        log.take();

        assert_eq!(engine.delete_hidden(), Ok(vec![id(0), id(2)]));
        assert!(engine.slots().iter().all(|s| !s.is_hidden() && s.content().is_none()));
        assert_eq!(
            log.take(),
            vec![LayoutNotification::ContentCleared {
                ids: vec![id(0), id(2)]
            }]
        );
        assert_eq!(engine.delete_hidden(), Ok(vec![]));
        assert!(log.is_empty());
    }

    #[test]
    fn height_pass_is_debounced_and_rowwise() {
        let (mut engine, _) = engine("1-2");
        let t0 = Instant::now();
        engine.report_natural_height(id(1), Some(120.0), t0).unwrap();
        engine
            .report_natural_height(id(2), Some(80.0), t0 + Duration::from_millis(50))
            .unwrap();
        assert!(engine.height_pass_pending());

        assert!(!engine.tick(t0 + Duration::from_millis(100)));
        assert!(engine.tick(t0 + Duration::from_millis(150)));
        assert!(!engine.tick(t0 + Duration::from_millis(400)));

        assert_eq!(engine.slot(id(0)).unwrap().rendered_height(), None);
        assert_eq!(engine.slot(id(1)).unwrap().rendered_height(), Some(120.0));
        assert_eq!(engine.slot(id(2)).unwrap().rendered_height(), Some(120.0));
    }

    #[test]
    fn invisible_engine_defers_height_pass() {
        let (mut engine, _) = engine("2");
        let t0 = Instant::now();
        engine.set_visible(false, t0);
        engine.report_natural_height(id(0), Some(40.0), t0).unwrap();
        assert!(!engine.tick(t0 + Duration::from_secs(1)));
        assert!(engine.height_pass_pending());

        let t1 = t0 + Duration::from_secs(2);
        engine.set_visible(true, t1);
        assert!(engine.tick(t1 + Duration::from_millis(100)));
        assert_eq!(engine.slot(id(1)).unwrap().rendered_height(), Some(40.0));
    }

    #[test]
    fn snapshot_restores_layout() {
        let (mut engine, _) = engine("1-2");
        let now = Instant::now();
        engine.set_slot_content(id(2), Some("text"), now).unwrap();
        engine.set_slot_hidden(id(0), true).unwrap();
        engine.resize_adjacent_pair(id(1), 0.4).unwrap();
        let snapshot = engine.snapshot();
        assert_eq!(snapshot.pattern, "1-2");

        let restored = Engine::from_snapshot(
            NullEditorHost,
            Box::new(RecordingObserver::new()),
            EngineConfig::default(),
            snapshot.clone(),
        )
        .unwrap();
        assert_eq!(restored.snapshot(), snapshot);
        assert_widths(&restored, &[100.0, 40.0, 60.0]);
    }

    #[test]
    fn overfull_pair_resize_survives_snapshot() {
        let (mut engine, _) = engine("2");
        engine
            .set_layout("2", Some([100.0, 100.0].as_slice()))
            .unwrap();
        engine.resize_adjacent_pair(id(0), 0.9).unwrap();
        assert_widths(&engine, &[100.0, 100.0]);

        engine
            .set_layout("2", Some([100.0, 60.0].as_slice()))
            .unwrap();
        engine.resize_adjacent_pair(id(0), 0.9).unwrap();
        assert_widths(&engine, &[100.0, 60.0]);
        engine.resize_adjacent_pair(id(0), 0.1).unwrap();
        assert_widths(&engine, &[60.0, 100.0]);

        let snapshot = engine.snapshot();
        let restored = Engine::from_snapshot(
            NullEditorHost,
            Box::new(RecordingObserver::new()),
            EngineConfig::default(),
            snapshot.clone(),
        )
        .unwrap();
        assert_eq!(restored.snapshot(), snapshot);
        assert_widths(&restored, &[60.0, 100.0]);
    }

    #[test]
    fn records_without_widths_split_evenly() {
        let records = vec![
            SlotRecord::empty().with_content("a"),
            SlotRecord::empty().with_width(70.0),
            SlotRecord::empty().with_width(-3.0),
        ];
        let engine = Engine::with_records(
            NullEditorHost,
            Box::new(RecordingObserver::new()),
            EngineConfig::default(),
            "3",
            records,
        )
        .unwrap();
        assert_widths(&engine, &[100.0 / 3.0, 70.0, 100.0 / 3.0]);
    }

    #[test]
    fn out_of_range_content_rejected() {
        let (mut engine, _) = engine("2");
        assert_eq!(
            engine.set_slot_content(id(5), Some("x"), Instant::now()),
            Err(LayoutError::OutOfRange { id: id(5), count: 2 })
        );
        assert_eq!(engine.click(id(5)), Err(LayoutError::OutOfRange { id: id(5), count: 2 }));
    }

    // Tracing capture infrastructure

    #[derive(Debug, Clone)]
    struct CapturedEvent {
        level: tracing::Level,
        target: String,
        fields: HashMap<String, String>,
    }

    #[derive(Clone, Default)]
    struct EventCapture {
        spans: Arc<Mutex<Vec<String>>>,
        events: Arc<Mutex<Vec<CapturedEvent>>>,
    }

    struct FieldVisitor(Vec<(String, String)>);

    impl tracing::field::Visit for FieldVisitor {
        fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
            self.0.push((field.name().to_string(), format!("{value:?}")));
        }
        fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
            self.0.push((field.name().to_string(), value.to_string()));
        }
    }

    impl<S> tracing_subscriber::Layer<S> for EventCapture
    where
        S: tracing::Subscriber + for<'a> LookupSpan<'a>,
    {
        fn on_new_span(
            &self,
            attrs: &tracing::span::Attributes<'_>,
            _id: &tracing::span::Id,
            _ctx: tracing_subscriber::layer::Context<'_, S>,
        ) {
            self.spans
                .lock()
                .unwrap()
                .push(attrs.metadata().name().to_string());
        }

        fn on_event(&self, event: &tracing::Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
            let mut visitor = FieldVisitor(Vec::new());
            event.record(&mut visitor);
            self.events.lock().unwrap().push(CapturedEvent {
                level: *event.metadata().level(),
                target: event.metadata().target().to_string(),
                fields: visitor.0.into_iter().collect(),
            });
        }
    }

    fn with_captured_tracing<F: FnOnce()>(f: F) -> EventCapture {
        let capture = EventCapture::default();
        let subscriber = tracing_subscriber::registry().with(capture.clone());
        tracing::subscriber::with_default(subscriber, f);
        capture
    }

    #[test]
    fn rejections_are_logged_at_debug() {
        let capture = with_captured_tracing(|| {
            let (mut engine, _) = engine("2");
            let _ = engine.set_layout("x", None);
        });
        let events = capture.events.lock().unwrap();
        let rejection = events
            .iter()
            .find(|e| e.fields.get("op").map(String::as_str) == Some("set_layout"))
            .expect("rejection event");
        assert_eq!(rejection.level, tracing::Level::DEBUG);
        assert_eq!(rejection.target, "slotgrid.layout");
        assert!(rejection.fields.contains_key("error"));
    }

    #[test]
    fn height_pass_runs_in_span() {
        let capture = with_captured_tracing(|| {
            let _ = engine("1-2");
        });
        assert!(capture.spans.lock().unwrap().iter().any(|name| name == "height_pass"));
    }
}
