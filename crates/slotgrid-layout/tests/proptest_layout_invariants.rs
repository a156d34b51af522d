//! Property-based invariants for the layout engine.
//!
//! 1. Pattern numbering is row-major, unique and deterministic
//! 2. Invalid patterns leave the engine untouched
//! 3. Pair resizes conserve the combined budget and stay within a row
//! 4. Out-of-range shares clamp to the configured bounds
//! 5. A drag that ends on its start slot changes nothing
//! 6. A finished drag reports exactly the displacement it applied

use proptest::prelude::*;
use slotgrid_layout::{
    LayoutEngine, LayoutNotification, LayoutPattern, NullEditorHost, RecordingObserver, SlotId,
};
use web_time::Instant;

type Engine = LayoutEngine<usize, NullEditorHost>;

const EPS: f64 = 1e-9;

// ── Strategies ──────────────────────────────────────────────────────────

fn rows_strategy() -> impl Strategy<Value = Vec<usize>> {
    prop::collection::vec(1usize..6, 1..6)
}

fn pattern_string(rows: &[usize]) -> String {
    rows.iter()
        .map(usize::to_string)
        .collect::<Vec<_>>()
        .join("-")
}

/// Single-row engine of `columns` slots whose content is the slot index.
fn labelled_row(columns: usize) -> (Engine, RecordingObserver) {
    let log = RecordingObserver::new();
    let mut engine = Engine::new(NullEditorHost, Box::new(log.clone()));
    engine.set_layout(&columns.to_string(), None).unwrap();
    let now = Instant::now();
    for index in 0..columns {
        engine
            .set_slot_content(SlotId::new(index), Some(index), now)
            .unwrap();
    }
    (engine, log)
}

fn contents(engine: &Engine) -> Vec<Option<usize>> {
    engine.slots().iter().map(|slot| slot.content().copied()).collect()
}

// ── Pattern numbering ───────────────────────────────────────────────────

proptest! {
    #[test]
    fn flatten_is_row_major_and_deterministic(rows in rows_strategy()) {
        let text = pattern_string(&rows);
        let pattern = LayoutPattern::parse(&text).unwrap();
        let flat = pattern.flatten();

        let ids: Vec<usize> = flat.values().flatten().map(|id| id.get()).collect();
        let total: usize = rows.iter().sum();
        prop_assert_eq!(pattern.total_slots(), total);
        prop_assert_eq!(ids, (0..total).collect::<Vec<_>>());
        prop_assert_eq!(flat.len(), rows.len());
        for (row, ids) in &flat {
            prop_assert_eq!(ids.len(), rows[*row]);
        }

        let again = LayoutPattern::parse(&text).unwrap();
        prop_assert_eq!(again.flatten(), flat);
        prop_assert_eq!(pattern.to_string(), text);
    }

    #[test]
    fn invalid_patterns_leave_engine_untouched(text in "[0-9a-z, -]{0,8}") {
        prop_assume!(LayoutPattern::parse(&text).is_err());
        let log = RecordingObserver::new();
        let mut engine = Engine::new(NullEditorHost, Box::new(log.clone()));
        engine.set_layout("2-1", None).unwrap();
        let before = engine.snapshot();

        prop_assert!(engine.set_layout(&text, None).is_err());
        prop_assert_eq!(engine.snapshot(), before);
        prop_assert!(log.is_empty());
    }

    #[test]
    fn layouts_never_truncate(first in rows_strategy(), second in rows_strategy()) {
        let log = RecordingObserver::new();
        let mut engine = Engine::new(NullEditorHost, Box::new(log));
        engine.set_layout(&pattern_string(&first), None).unwrap();
        let count = engine.slot_count();
        engine.set_layout(&pattern_string(&second), None).unwrap();

        let second_total: usize = second.iter().sum();
        prop_assert_eq!(engine.slot_count(), count.max(second_total));
        prop_assert_eq!(engine.arranged_count(), second_total);
    }
}

// ── Resizing ────────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn resize_conserves_pair_budget(
        widths in prop::collection::vec(1.0f64..=100.0, 2..6),
        pick in any::<prop::sample::Index>(),
        share in 0.05f64..=0.95,
    ) {
        let log = RecordingObserver::new();
        let mut engine = Engine::new(NullEditorHost, Box::new(log.clone()));
        engine.set_layout(&widths.len().to_string(), Some(widths.as_slice())).unwrap();

        let left = pick.index(widths.len() - 1);
        let combined = widths[left] + widths[left + 1];
        engine.resize_adjacent_pair(SlotId::new(left), share).unwrap();

        // An overfull pair narrows the share so neither side passes 100.
        let effective = if combined > 100.0 {
            share.max(1.0 - 100.0 / combined).min(100.0 / combined)
        } else {
            share
        };
        let after = engine.widths();
        prop_assert!((after[left] + after[left + 1] - combined).abs() < EPS);
        prop_assert!((after[left] - effective * combined).abs() < EPS);
        prop_assert!(after[left] <= 100.0 && after[left + 1] <= 100.0);
        for (index, width) in after.iter().enumerate() {
            if index != left && index != left + 1 {
                prop_assert_eq!(*width, widths[index]);
            }
        }
        let entries = log.take();
        prop_assert_eq!(entries.len(), 1);
        prop_assert_eq!(
            &entries[0],
            &LayoutNotification::WidthsChanged { widths: after }
        );
    }

    #[test]
    fn out_of_range_shares_clamp(share in -10.0f64..10.0) {
        let clamped = share.clamp(0.05, 0.95);
        let log = RecordingObserver::new();
        let mut direct = Engine::new(NullEditorHost, Box::new(log.clone()));
        let mut expected = Engine::new(NullEditorHost, Box::new(log));
        direct.set_layout("2", None).unwrap();
        expected.set_layout("2", None).unwrap();

        direct.resize_adjacent_pair(SlotId::new(0), share).unwrap();
        expected.resize_adjacent_pair(SlotId::new(0), clamped).unwrap();
        prop_assert_eq!(direct.widths(), expected.widths());

        let aria = direct.slider_aria(SlotId::new(0)).unwrap();
        prop_assert!(aria.now >= aria.min && aria.now <= aria.max);
    }
}

// ── Dragging ────────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn drag_back_to_start_is_identity(
        columns in 2usize..7,
        start in any::<prop::sample::Index>(),
        path in prop::collection::vec(any::<prop::sample::Index>(), 0..8),
    ) {
        let (mut engine, log) = labelled_row(columns);
        engine.resize_adjacent_pair(SlotId::new(0), 0.3).unwrap();
        log.take();
        let before = engine.snapshot();
        let start = SlotId::new(start.index(columns));

        engine.begin_drag(start).unwrap();
        for step in &path {
            engine.drag_enter(SlotId::new(step.index(columns))).unwrap();
        }
        engine.drag_enter(start).unwrap();
        engine.end_drag().unwrap();

        prop_assert_eq!(engine.snapshot(), before);
        prop_assert_eq!(log.reorder_count(), 0);
    }

    #[test]
    fn finished_drag_reports_its_swap(
        columns in 2usize..7,
        start in any::<prop::sample::Index>(),
        path in prop::collection::vec(any::<prop::sample::Index>(), 1..8),
    ) {
        let (mut engine, log) = labelled_row(columns);
        log.take();
        let start = SlotId::new(start.index(columns));

        engine.begin_drag(start).unwrap();
        for step in &path {
            engine.drag_enter(SlotId::new(step.index(columns))).unwrap();
            if step.index(columns) % 2 == 0 {
                engine.drag_leave().unwrap();
            }
        }
        engine.end_drag().unwrap();

        let mut expected: Vec<Option<usize>> = (0..columns).map(Some).collect();
        match log.take().as_slice() {
            [] => {}
            [LayoutNotification::Reordered { id1, id2 }] => {
                prop_assert_eq!(*id1, start);
                expected.swap(id1.get(), id2.get());
            }
            other => prop_assert!(false, "unexpected notifications: {:?}", other),
        }
        prop_assert_eq!(contents(&engine), expected);
    }
}
