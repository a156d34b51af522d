#![forbid(unsafe_code)]

//! Proportional resize separator between two adjacent slots.
//!
//! A [`SizeSlider`] sits between slot `separator` and `separator + 1` of one
//! row. While sliding, the sum of both widths (the *combined* budget) is held
//! fixed and redistributed by a share `p`:
//!
//! ```text
//! left  = p       * combined
//! right = (1 - p) * combined        p clamped to [min_share, 1 - min_share]
//! ```
//!
//! A budget above 100 narrows `p` further so that neither side exceeds a
//! full row.
//!
//! The slider is only the state machine and coordinate math; the engine owns
//! the widths and applies the split.
//!
//! ```text
//! Idle --start--> Sliding --end--> Idle
//!   \--(disabled: start rejected)
//! ```

use slotgrid_core::{KeyCode, PairGeometry};

use crate::config::EngineConfig;
use crate::error::{GestureKind, LayoutError};
use crate::slot::{MAX_WIDTH, SlotId};

/// A requested slider position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SlideInput {
    /// Absolute pointer X, converted using the geometry captured at start.
    PointerX(f64),
    /// Share of the combined budget given to the left slot.
    Percentage(f64),
}

/// Accessible range attributes of a separator, in whole percent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SliderAria {
    pub min: u8,
    pub max: u8,
    pub now: u8,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum SliderState {
    Idle,
    Sliding {
        combined: f64,
        geometry: Option<PairGeometry>,
    },
}

/// Separator state between two horizontally adjacent slots.
#[derive(Debug, Clone, PartialEq)]
pub struct SizeSlider {
    separator: SlotId,
    enabled: bool,
    state: SliderState,
    position: f64,
    toggle_memory: Option<f64>,
    aria: SliderAria,
}

impl SizeSlider {
    /// Create an idle slider for the pair starting at `separator`.
    #[must_use]
    pub fn new(separator: SlotId, left_width: f64, right_width: f64, config: &EngineConfig) -> Self {
        let mut slider = Self {
            separator,
            enabled: true,
            state: SliderState::Idle,
            position: 0.5,
            toggle_memory: None,
            aria: SliderAria {
                min: percent(config.min_share),
                max: percent(config.max_share()),
                now: 50,
            },
        };
        slider.sync(left_width, right_width);
        slider
    }

    /// Left slot of the pair; also names the separator.
    #[must_use]
    pub const fn separator(&self) -> SlotId {
        self.separator
    }

    /// Whether the slider accepts a new slide.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Whether a slide session is open.
    #[must_use]
    pub const fn is_sliding(&self) -> bool {
        matches!(self.state, SliderState::Sliding { .. })
    }

    /// Left slot's share of the pair budget.
    #[must_use]
    pub const fn position(&self) -> f64 {
        self.position
    }

    /// Budget captured at slide start, while sliding.
    #[must_use]
    pub const fn combined(&self) -> Option<f64> {
        match self.state {
            SliderState::Sliding { combined, .. } => Some(combined),
            SliderState::Idle => None,
        }
    }

    #[must_use]
    pub const fn aria(&self) -> SliderAria {
        self.aria
    }

    /// Position remembered by the last Enter toggle, if any.
    #[must_use]
    pub const fn toggle_memory(&self) -> Option<f64> {
        self.toggle_memory
    }

    pub(crate) fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Re-derive the position from widths changed elsewhere.
    pub(crate) fn sync(&mut self, left_width: f64, right_width: f64) {
        let combined = left_width + right_width;
        if combined > 0.0 && combined.is_finite() {
            self.set_position(left_width / combined);
        }
        self.toggle_memory = None;
    }

    /// Open a slide session, capturing the combined budget.
    pub(crate) fn start(
        &mut self,
        left_width: f64,
        right_width: f64,
        geometry: Option<PairGeometry>,
    ) -> Result<f64, LayoutError> {
        if !self.enabled {
            return Err(LayoutError::SliderDisabled {
                separator: self.separator,
            });
        }
        if self.is_sliding() {
            return Err(LayoutError::ConcurrentGesture {
                active: GestureKind::Slide,
            });
        }
        let combined = left_width + right_width;
        self.state = SliderState::Sliding { combined, geometry };
        self.set_position(left_width / combined);
        tracing::trace!(
            target: "slotgrid.slider",
            separator = self.separator.get(),
            combined,
            "slide started"
        );
        Ok(combined)
    }

    /// Clamped share for `input`, or `None` when the input cannot be
    /// resolved (no geometry for a pointer, degenerate geometry).
    pub(crate) fn resolve(&self, input: SlideInput, config: &EngineConfig) -> Option<f64> {
        let share = match input {
            SlideInput::Percentage(share) => share,
            SlideInput::PointerX(x) => {
                let SliderState::Sliding {
                    geometry: Some(geometry),
                    ..
                } = self.state
                else {
                    return None;
                };
                geometry.share_at(x)?
            }
        };
        Some(config.clamp_share(share))
    }

    /// Split the captured budget at `share`, returning `(left, right)`.
    pub(crate) fn split(&mut self, share: f64) -> Option<(f64, f64)> {
        let combined = self.combined()?;
        let share = if combined > MAX_WIDTH {
            share
                .max(1.0 - MAX_WIDTH / combined)
                .min(MAX_WIDTH / combined)
        } else {
            share
        };
        self.set_position(share);
        let left = (share * combined).min(MAX_WIDTH);
        Some((left, (combined - left).min(MAX_WIDTH)))
    }

    /// Close the slide session.
    pub(crate) fn end(&mut self) -> Result<(), LayoutError> {
        if !self.is_sliding() {
            return Err(LayoutError::NoActiveGesture {
                expected: GestureKind::Slide,
            });
        }
        self.state = SliderState::Idle;
        tracing::trace!(
            target: "slotgrid.slider",
            separator = self.separator.get(),
            position = self.position,
            "slide ended"
        );
        Ok(())
    }

    /// Target share for a key press, or `None` if the key is unbound.
    ///
    /// Arrows step by `keyboard_step` and forget any toggle memory. Enter
    /// pins the nearer extreme and remembers the current position; the next
    /// Enter restores it.
    pub(crate) fn key_target(&mut self, code: KeyCode, config: &EngineConfig) -> Option<f64> {
        let target = match code {
            KeyCode::Left => {
                self.toggle_memory = None;
                self.position - config.keyboard_step
            }
            KeyCode::Right => {
                self.toggle_memory = None;
                self.position + config.keyboard_step
            }
            KeyCode::Enter => match self.toggle_memory.take() {
                Some(remembered) => remembered,
                None => {
                    self.toggle_memory = Some(self.position);
                    if self.position < 0.5 {
                        config.min_share
                    } else {
                        config.max_share()
                    }
                }
            },
            _ => return None,
        };
        Some(config.clamp_share(target))
    }

    fn set_position(&mut self, position: f64) {
        self.position = position;
        self.aria.now = percent(position);
    }
}

fn percent(share: f64) -> u8 {
    (share * 100.0).round().clamp(0.0, 100.0) as u8
}
