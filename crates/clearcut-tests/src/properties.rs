//! Property tests over random edit sequences.

use clearcut_core::TIME_EPSILON;
use clearcut_timeline::{EditingContext, Segment};
use proptest::prelude::*;

const SOURCE: &str = "talk.mp4";
const SOURCE_DURATION: f64 = 120.0;

#[derive(Debug, Clone)]
enum Op {
    Cut(f64, f64),
    Copy(f64, f64),
    Paste(f64),
    Delete(f64, f64),
    Insert(f64, f64),
    Undo,
    Redo,
}

/// Times on a quarter-second grid, as fractions of the current duration.
fn fraction() -> impl Strategy<Value = f64> {
    (0u32..=400).prop_map(|q| q as f64 / 400.0)
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (fraction(), fraction()).prop_map(|(a, b)| Op::Cut(a, b)),
        (fraction(), fraction()).prop_map(|(a, b)| Op::Copy(a, b)),
        fraction().prop_map(Op::Paste),
        (fraction(), fraction()).prop_map(|(a, b)| Op::Delete(a, b)),
        (fraction(), 1u32..40).prop_map(|(a, q)| Op::Insert(a, q as f64 / 4.0)),
        Just(Op::Undo),
        Just(Op::Redo),
    ]
}

fn quarter(x: f64) -> f64 {
    (x * 4.0).round() / 4.0
}

/// Apply `op` with fractions scaled to the current duration. Errors are
/// part of the game: a rejected op must leave nothing behind.
fn apply(ctx: &mut EditingContext, op: &Op, insert_count: &mut usize) -> bool {
    let total = ctx.timeline().total_duration();
    let at = |f: f64| quarter(f * total);
    let range = |a: f64, b: f64| (at(a.min(b)), at(a.max(b)));
    match *op {
        Op::Cut(a, b) => {
            let (start, end) = range(a, b);
            ctx.cut(start, end).is_ok()
        }
        Op::Copy(a, b) => {
            let (start, end) = range(a, b);
            ctx.copy(start, end).is_ok()
        }
        Op::Paste(a) => ctx.paste(at(a)).is_ok(),
        Op::Delete(a, b) => {
            let (start, end) = range(a, b);
            ctx.delete_range(start, end).is_ok()
        }
        Op::Insert(a, len) => {
            *insert_count += 1;
            let file = format!("insert-{}.mp4", insert_count);
            let segment = Segment::with_source(0.0, len, file).unwrap();
            ctx.insert_segment_at_position(at(a), segment).is_ok()
        }
        Op::Undo => ctx.undo().is_ok(),
        Op::Redo => ctx.redo().is_ok(),
    }
}

fn loaded() -> EditingContext {
    let mut ctx = EditingContext::new("prop");
    ctx.load_media(SOURCE, SOURCE_DURATION).unwrap();
    ctx
}

proptest! {
    #[test]
    fn segments_stay_contiguous_and_valid(ops in prop::collection::vec(op(), 1..40)) {
        let mut ctx = loaded();
        let mut inserts = 0;
        for op in &ops {
            apply(&mut ctx, op, &mut inserts);

            let timeline = ctx.timeline();
            let mut cursor = 0.0;
            for (segment, span) in timeline.segment_spans() {
                prop_assert!(segment.validate().is_ok());
                prop_assert!(segment.duration() >= TIME_EPSILON);
                prop_assert_eq!(span.start, cursor);
                cursor = span.end;
            }
            prop_assert!((cursor - timeline.total_duration()).abs() < 1e-9);
        }
    }

    #[test]
    fn undo_and_redo_are_inverses(
        setup in prop::collection::vec(op(), 0..15),
        edit in op(),
    ) {
        let mut ctx = loaded();
        let mut inserts = 0;
        for op in &setup {
            apply(&mut ctx, op, &mut inserts);
        }
        if matches!(edit, Op::Undo | Op::Redo | Op::Copy(..)) {
            return Ok(());
        }

        let before = ctx.timeline().segments().to_vec();
        if !apply(&mut ctx, &edit, &mut inserts) {
            prop_assert_eq!(ctx.timeline().segments(), before.as_slice());
            return Ok(());
        }
        let after = ctx.timeline().segments().to_vec();

        ctx.undo().unwrap();
        prop_assert_eq!(ctx.timeline().segments(), before.as_slice());
        ctx.redo().unwrap();
        prop_assert_eq!(ctx.timeline().segments(), after.as_slice());
    }

    #[test]
    fn cut_then_paste_conserves_duration(
        start in 0u32..440,
        len in 1u32..40,
    ) {
        let mut ctx = loaded();
        let start = start as f64 / 4.0;
        let end = start + len as f64 / 4.0;
        let total = ctx.timeline().total_duration();

        ctx.cut(start, end).unwrap();
        prop_assert!((ctx.timeline().total_duration() - (total - (end - start))).abs() < 1e-9);
        ctx.paste(start).unwrap();
        prop_assert!((ctx.timeline().total_duration() - total).abs() < 1e-9);

        let mapper = ctx.timeline().mapper();
        let probe = (start + end) / 2.0;
        prop_assert_eq!(mapper.source_to_timeline(probe), Some(probe));
    }

    #[test]
    fn timeline_to_source_round_trips(
        deletes in prop::collection::vec((fraction(), fraction()), 0..8),
        inserts in prop::collection::vec((fraction(), 1u32..40), 0..4),
        probes in prop::collection::vec(0u32..1000, 1..20),
    ) {
        // Deletes and unique inserts only, so every source moment appears at
        // most once on the timeline.
        let mut ctx = loaded();
        let mut count = 0;
        for &(a, b) in &deletes {
            apply(&mut ctx, &Op::Delete(a, b), &mut count);
        }
        for &(a, q) in &inserts {
            apply(&mut ctx, &Op::Insert(a, q as f64 / 4.0), &mut count);
        }

        prop_assume!(!ctx.timeline().is_empty());

        let total = ctx.timeline().total_duration();
        let mapper = ctx.timeline().mapper();
        for p in probes {
            let t = total * p as f64 / 1000.0;
            let pos = mapper.timeline_to_source(t).unwrap();
            let file = pos.source_file.as_deref().unwrap();
            let back = mapper.source_to_timeline_in(file, pos.time).unwrap();
            prop_assert!((back - t).abs() <= TIME_EPSILON, "t={} back={}", t, back);
        }
    }

    #[test]
    fn deleted_source_is_unreachable(
        start in 0u32..400,
        len in 1u32..80,
        offset in 0u32..=100,
    ) {
        let mut ctx = loaded();
        let start = start as f64 / 4.0;
        let end = (start + len as f64 / 4.0).min(SOURCE_DURATION);
        ctx.delete_range(start, end).unwrap();

        // Stay clear of the edges, which snap onto the seam.
        let margin = 2.0 * TIME_EPSILON;
        prop_assume!(end - start > 2.0 * margin);
        let probe = start + margin + (end - start - 2.0 * margin) * offset as f64 / 100.0;

        prop_assert_eq!(ctx.timeline().mapper().source_to_timeline(probe), None);
    }
}
