#![forbid(unsafe_code)]

//! Engine tuning.
//!
//! # Defaults
//!
//! | Setting | Default | Range | Description |
//! |---------|---------|-------|-------------|
//! | `min_share` | 0.05 | 0.01-0.45 | Smallest share of a pair budget either side keeps |
//! | `keyboard_step` | 0.05 | 0.01-0.5 | Arrow-key step as a share of the pair budget |
//! | `height_debounce_ms` | 100 | 0-1000 | Quiet window before the row-height pass |
//! | `default_width` | 100 | (0, 100] | Width given to padding slots |
//! | `start_visible` | true | - | Whether height passes run before the host reports visibility |
//!
//! # Environment Variables
//!
//! | Variable | Type | Description |
//! |----------|------|-------------|
//! | `SLOTGRID_MIN_SHARE` | f64 | `min_share` |
//! | `SLOTGRID_KEYBOARD_STEP` | f64 | `keyboard_step` |
//! | `SLOTGRID_HEIGHT_DEBOUNCE_MS` | u64 | `height_debounce_ms` |
//! | `SLOTGRID_DEFAULT_WIDTH` | f64 | `default_width` |
//! | `SLOTGRID_START_VISIBLE` | bool | `start_visible` ("1"/"true") |

use serde::{Deserialize, Serialize};
use web_time::Duration;

use crate::slot::is_valid_width;

/// Default smallest share of a pair budget.
pub const DEFAULT_MIN_SHARE: f64 = 0.05;

/// Lowest accepted `min_share`.
pub const MIN_MIN_SHARE: f64 = 0.01;

/// Highest accepted `min_share`. Above 0.5 the bounds would cross.
pub const MAX_MIN_SHARE: f64 = 0.45;

/// Default arrow-key step.
pub const DEFAULT_KEYBOARD_STEP: f64 = 0.05;

/// Lowest accepted keyboard step.
pub const MIN_KEYBOARD_STEP: f64 = 0.01;

/// Highest accepted keyboard step.
pub const MAX_KEYBOARD_STEP: f64 = 0.5;

/// Default height-pass debounce window.
pub const DEFAULT_HEIGHT_DEBOUNCE_MS: u64 = 100;

/// Highest accepted height-pass debounce window.
pub const MAX_HEIGHT_DEBOUNCE_MS: u64 = 1000;

/// Default width of padding slots.
pub const DEFAULT_SLOT_WIDTH: f64 = 100.0;

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub min_share: f64,
    pub keyboard_step: f64,
    pub height_debounce_ms: u64,
    pub default_width: f64,
    pub start_visible: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_share: DEFAULT_MIN_SHARE,
            keyboard_step: DEFAULT_KEYBOARD_STEP,
            height_debounce_ms: DEFAULT_HEIGHT_DEBOUNCE_MS,
            default_width: DEFAULT_SLOT_WIDTH,
            start_visible: true,
        }
    }
}

impl EngineConfig {
    #[must_use]
    pub fn with_min_share(mut self, min_share: f64) -> Self {
        self.min_share = min_share;
        self
    }

    #[must_use]
    pub fn with_keyboard_step(mut self, step: f64) -> Self {
        self.keyboard_step = step;
        self
    }

    #[must_use]
    pub fn with_height_debounce(mut self, window: Duration) -> Self {
        self.height_debounce_ms = u64::try_from(window.as_millis()).unwrap_or(u64::MAX);
        self
    }

    #[must_use]
    pub fn with_default_width(mut self, width: f64) -> Self {
        self.default_width = width;
        self
    }

    #[must_use]
    pub fn with_start_visible(mut self, visible: bool) -> Self {
        self.start_visible = visible;
        self
    }

    /// Largest share either side of a pair may take.
    #[must_use]
    pub fn max_share(&self) -> f64 {
        1.0 - self.min_share
    }

    /// Clamp a requested share into `[min_share, max_share]`.
    ///
    /// Non-finite requests collapse to the lower bound.
    #[must_use]
    pub fn clamp_share(&self, share: f64) -> f64 {
        if share.is_nan() {
            return self.min_share;
        }
        share.clamp(self.min_share, self.max_share())
    }

    /// Height-pass debounce window.
    #[must_use]
    pub fn height_debounce(&self) -> Duration {
        Duration::from_millis(self.height_debounce_ms)
    }

    /// Load config from environment variables.
    ///
    /// Unparsable values are ignored; the result is [`validated`](Self::validated).
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("SLOTGRID_MIN_SHARE")
            && let Ok(share) = val.parse::<f64>()
        {
            config.min_share = share;
        }

        if let Ok(val) = std::env::var("SLOTGRID_KEYBOARD_STEP")
            && let Ok(step) = val.parse::<f64>()
        {
            config.keyboard_step = step;
        }

        if let Ok(val) = std::env::var("SLOTGRID_HEIGHT_DEBOUNCE_MS")
            && let Ok(ms) = val.parse::<u64>()
        {
            config.height_debounce_ms = ms;
        }

        if let Ok(val) = std::env::var("SLOTGRID_DEFAULT_WIDTH")
            && let Ok(width) = val.parse::<f64>()
        {
            config.default_width = width;
        }

        if let Ok(val) = std::env::var("SLOTGRID_START_VISIBLE") {
            config.start_visible = val == "1" || val.eq_ignore_ascii_case("true");
        }

        config.validated()
    }

    /// Parse a TOML document; missing keys keep their defaults.
    #[cfg(feature = "toml")]
    pub fn from_toml_str(source: &str) -> Result<Self, toml::de::Error> {
        toml::from_str::<Self>(source).map(Self::validated)
    }

    /// Validate and clamp values to safe ranges.
    ///
    /// ```
    /// use slotgrid_layout::EngineConfig;
    ///
    /// let config = EngineConfig::default().with_min_share(0.9).validated();
    /// assert_eq!(config.min_share, 0.45);
    /// ```
    #[must_use]
    pub fn validated(mut self) -> Self {
        self.min_share = if self.min_share.is_finite() {
            self.min_share.clamp(MIN_MIN_SHARE, MAX_MIN_SHARE)
        } else {
            DEFAULT_MIN_SHARE
        };

        self.keyboard_step = if self.keyboard_step.is_finite() {
            self.keyboard_step.clamp(MIN_KEYBOARD_STEP, MAX_KEYBOARD_STEP)
        } else {
            DEFAULT_KEYBOARD_STEP
        };

        self.height_debounce_ms = self.height_debounce_ms.min(MAX_HEIGHT_DEBOUNCE_MS);

        if !is_valid_width(self.default_width) {
            self.default_width = DEFAULT_SLOT_WIDTH;
        }

        self
    }

    /// Check if values are within valid ranges.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        (MIN_MIN_SHARE..=MAX_MIN_SHARE).contains(&self.min_share)
            && (MIN_KEYBOARD_STEP..=MAX_KEYBOARD_STEP).contains(&self.keyboard_step)
            && self.height_debounce_ms <= MAX_HEIGHT_DEBOUNCE_MS
            && is_valid_width(self.default_width)
    }
}
