//! Step scripts and the session that replays them.
//!
//! A script is one step per line (or `;`-separated). Blank lines and lines
//! starting with `#` are skipped.
//!
//! ```text
//! content 1 hero image
//! resize 1 0.3
//! drag 0 2 1
//! key 2 space
//! key 2 down
//! wait 150
//! ```

use std::str::FromStr;

use serde::Serialize;
use slotgrid_layout::{
    EditorHost, EngineConfig, KeyCode, LayoutEngine, LayoutError, LayoutNotification,
    LayoutSnapshot, PairGeometry, RecordingObserver, SlideInput, SlotId, SlotRecord,
};
use web_time::{Duration, Instant};

use crate::error::{DemoError, Result};

/// One scripted interaction.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Layout(String),
    Content(SlotId, Option<String>),
    Height(SlotId, f64),
    Hide(SlotId, bool),
    Reorder(SlotId, SlotId),
    Resize(SlotId, f64),
    /// Drag from the first slot across the listed targets, then drop.
    Drag(SlotId, Vec<SlotId>),
    /// Slide a separator through pointer positions given in percent of the
    /// pair extent.
    Slide(SlotId, Vec<f64>),
    SlotKey(SlotId, KeyCode),
    SliderKey(SlotId, KeyCode),
    MoveUp(SlotId),
    MoveDown(SlotId),
    Activate(SlotId),
    RemoveForm,
    CloseForm,
    DeleteHidden,
    Wait(u64),
}

impl FromStr for Step {
    type Err = String;

    fn from_str(line: &str) -> std::result::Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let command = words.next().ok_or("empty step")?;
        let args: Vec<&str> = words.collect();

        let step = match (command, args.as_slice()) {
            ("layout", [pattern]) => Self::Layout((*pattern).to_string()),
            ("content", [id]) => Self::Content(slot(id)?, None),
            ("content", [id, text @ ..]) => Self::Content(slot(id)?, Some(text.join(" "))),
            ("height", [id, px]) => Self::Height(slot(id)?, number(px)?),
            ("hide", [id]) => Self::Hide(slot(id)?, true),
            ("show", [id]) => Self::Hide(slot(id)?, false),
            ("reorder", [a, b]) => Self::Reorder(slot(a)?, slot(b)?),
            ("resize", [id, share]) => Self::Resize(slot(id)?, number(share)?),
            ("drag", [start, targets @ ..]) => Self::Drag(
                slot(start)?,
                targets.iter().map(|t| slot(t)).collect::<std::result::Result<_, _>>()?,
            ),
            ("slide", [separator, positions @ ..]) if !positions.is_empty() => Self::Slide(
                slot(separator)?,
                positions.iter().map(|p| number(p)).collect::<std::result::Result<_, _>>()?,
            ),
            ("key", [id, key]) => Self::SlotKey(slot(id)?, key_code(key)?),
            ("slider-key", [separator, key]) => Self::SliderKey(slot(separator)?, key_code(key)?),
            ("up", [id]) => Self::MoveUp(slot(id)?),
            ("down", [id]) => Self::MoveDown(slot(id)?),
            ("activate", [id]) => Self::Activate(slot(id)?),
            ("remove-form", []) => Self::RemoveForm,
            ("close-form", []) => Self::CloseForm,
            ("delete-hidden", []) => Self::DeleteHidden,
            ("wait", [ms]) => Self::Wait(ms.parse().map_err(|_| format!("invalid duration `{ms}`"))?),
            _ => return Err(format!("unknown or malformed step `{line}`")),
        };
        Ok(step)
    }
}

fn slot(word: &str) -> std::result::Result<SlotId, String> {
    word.parse::<usize>()
        .map(SlotId::new)
        .map_err(|_| format!("invalid slot id `{word}`"))
}

fn number(word: &str) -> std::result::Result<f64, String> {
    word.parse::<f64>()
        .map_err(|_| format!("invalid number `{word}`"))
}

fn key_code(word: &str) -> std::result::Result<KeyCode, String> {
    match word.to_ascii_lowercase().as_str() {
        "space" => Ok(KeyCode::Char(' ')),
        "enter" => Ok(KeyCode::Enter),
        "escape" | "esc" => Ok(KeyCode::Escape),
        "tab" => Ok(KeyCode::Tab),
        "up" => Ok(KeyCode::Up),
        "down" => Ok(KeyCode::Down),
        "left" => Ok(KeyCode::Left),
        "right" => Ok(KeyCode::Right),
        _ => Err(format!("unknown key `{word}`")),
    }
}

/// Parse a script into `(line, step)` pairs, numbering lines from 1.
///
/// `#` comments run to the end of the line; `;` separates steps on one line.
pub fn parse_script(text: &str) -> Result<Vec<(usize, Step)>> {
    text.lines()
        .map(|line| line.split_once('#').map_or(line, |(code, _)| code))
        .enumerate()
        .flat_map(|(index, line)| line.split(';').map(move |part| (index + 1, part.trim())))
        .filter(|(_, part)| !part.is_empty())
        .map(|(line, part)| {
            part.parse::<Step>()
                .map(|step| (line, step))
                .map_err(|message| DemoError::invalid_step(line, message))
        })
        .collect()
}

/// Editor host that keeps a transcript of form traffic.
#[derive(Debug, Default)]
pub struct TranscriptHost {
    pub transcript: Vec<String>,
}

impl EditorHost<String> for TranscriptHost {
    type Form = String;

    fn build_form(&mut self, id: SlotId, content: Option<&String>) -> String {
        let form = format!("form:{id}:{}", content.map_or("empty", String::as_str));
        self.transcript.push(format!("build {form}"));
        form
    }

    fn open_form(&mut self, id: SlotId, form: &String, _content: Option<&String>) {
        self.transcript.push(format!("open {form} on slot {id}"));
    }

    fn close_form(&mut self, id: SlotId) {
        self.transcript.push(format!("close slot {id}"));
    }
}

/// A step the engine refused.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rejection {
    pub line: usize,
    pub step: String,
    pub error: String,
}

/// Final state of a session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionReport {
    pub snapshot: LayoutSnapshot<String>,
    pub rows: Vec<Vec<usize>>,
    pub rendered_heights: Vec<Option<f64>>,
    pub notifications: Vec<LayoutNotification>,
    pub rejections: Vec<Rejection>,
    pub forms: Vec<String>,
}

/// Engine plus a virtual clock.
pub struct Session {
    engine: LayoutEngine<String, TranscriptHost>,
    log: RecordingObserver,
    origin: Instant,
    elapsed: Duration,
    rejections: Vec<Rejection>,
}

impl Session {
    /// New session arranged by `pattern` with optional initial widths.
    pub fn new(config: EngineConfig, pattern: &str, widths: &[f64]) -> Result<Self> {
        let records = widths
            .iter()
            .map(|width| SlotRecord::empty().with_width(*width))
            .collect();
        let log = RecordingObserver::new();
        let engine = LayoutEngine::with_records(
            TranscriptHost::default(),
            Box::new(log.clone()),
            config,
            pattern,
            records,
        )?;
        Ok(Self::from_engine(engine, log))
    }

    /// Session resumed from a snapshot.
    pub fn from_snapshot(config: EngineConfig, snapshot: LayoutSnapshot<String>) -> Result<Self> {
        let log = RecordingObserver::new();
        let engine = LayoutEngine::from_snapshot(
            TranscriptHost::default(),
            Box::new(log.clone()),
            config,
            snapshot,
        )?;
        Ok(Self::from_engine(engine, log))
    }

    fn from_engine(engine: LayoutEngine<String, TranscriptHost>, log: RecordingObserver) -> Self {
        Self {
            engine,
            log,
            origin: Instant::now(),
            elapsed: Duration::ZERO,
            rejections: Vec::new(),
        }
    }

    #[must_use]
    pub fn engine(&self) -> &LayoutEngine<String, TranscriptHost> {
        &self.engine
    }

    fn now(&self) -> Instant {
        self.origin + self.elapsed
    }

    /// Replay `steps`. Rejections are recorded, or returned when `strict`.
    pub fn run(&mut self, steps: &[(usize, Step)], strict: bool) -> Result<()> {
        for (line, step) in steps {
            if let Err(source) = self.apply(step) {
                tracing::warn!(line, ?step, %source, "step rejected");
                if strict {
                    return Err(DemoError::Rejected {
                        line: *line,
                        source,
                    });
                }
                self.rejections.push(Rejection {
                    line: *line,
                    step: format!("{step:?}"),
                    error: source.to_string(),
                });
            }
            self.engine.tick(self.now());
        }
        Ok(())
    }

    fn apply(&mut self, step: &Step) -> std::result::Result<(), LayoutError> {
        let now = self.now();
        let engine = &mut self.engine;
        match step {
            Step::Layout(pattern) => engine.set_layout(pattern, None),
            Step::Content(id, text) => engine.set_slot_content(*id, text.clone(), now),
            Step::Height(id, px) => engine.report_natural_height(*id, Some(*px), now),
            Step::Hide(id, hidden) => engine.set_slot_hidden(*id, *hidden),
            Step::Reorder(a, b) => engine.reorder(*a, *b),
            Step::Resize(id, share) => engine.resize_adjacent_pair(*id, *share),
            Step::Drag(start, targets) => {
                engine.begin_drag(*start)?;
                for target in targets {
                    if let Err(error) = engine.drag_enter(*target) {
                        engine.end_drag()?;
                        return Err(error);
                    }
                }
                engine.end_drag()
            }
            Step::Slide(separator, positions) => {
                let widths = engine.widths();
                let left = widths.get(separator.get()).copied().unwrap_or_default();
                let right = widths.get(separator.get() + 1).copied().unwrap_or_default();
                let total = left + right;
                let geometry = PairGeometry::new(0.0, left / total * 100.0, 0.0, right / total * 100.0);
                engine.begin_slide(*separator, geometry)?;
                for x in positions {
                    engine.slide_to(SlideInput::PointerX(*x))?;
                }
                engine.end_slide()
            }
            Step::SlotKey(id, key) => engine.slot_key(*id, *key).map(|_| ()),
            Step::SliderKey(separator, key) => engine.slider_key(*separator, *key).map(|_| ()),
            Step::MoveUp(id) => engine.move_up(*id),
            Step::MoveDown(id) => engine.move_down(*id),
            Step::Activate(id) => engine.activate_slot(*id),
            Step::RemoveForm => engine.form_removed(),
            Step::CloseForm => engine.form_closed(now),
            Step::DeleteHidden => engine.delete_hidden().map(|_| ()),
            Step::Wait(ms) => {
                self.elapsed += Duration::from_millis(*ms);
                Ok(())
            }
        }
    }

    /// Let pending height work settle and collect the report.
    pub fn finish(mut self) -> SessionReport {
        self.elapsed += self.engine.config().height_debounce();
        self.engine.tick(self.now());
        SessionReport {
            snapshot: self.engine.snapshot(),
            rows: self
                .engine
                .rows()
                .into_iter()
                .map(|row| row.collect())
                .collect(),
            rendered_heights: self
                .engine
                .slots()
                .iter()
                .map(|slot| slot.rendered_height())
                .collect(),
            notifications: self.log.take(),
            rejections: self.rejections,
            forms: std::mem::take(&mut self.engine.host_mut().transcript),
        }
    }
}
