//! Integration tests for the editing core.
//!
//! Exercises cross-crate interactions between clearcut-core and
//! clearcut-timeline: editing scenarios, multi-context clipboards and
//! project persistence.

use clearcut_core::{ClearCutError, TimeRange};
use clearcut_timeline::{
    ContextRegistry, EditError, EditState, EditingContext, Marker, ProjectFile, Segment,
    Selection,
};
use uuid::Uuid;

// ── Helpers ────────────────────────────────────────────────────

fn loaded(path: &str, duration: f64) -> EditingContext {
    let mut ctx = EditingContext::new(path);
    ctx.load_media(path, duration).unwrap();
    ctx
}

/// `(start, end, explicit source)` of every segment.
fn layout(ctx: &EditingContext) -> Vec<(f64, f64, Option<String>)> {
    ctx.timeline()
        .segments()
        .iter()
        .map(|s| (s.start, s.end, s.source_file.clone()))
        .collect()
}

fn spans(ctx: &EditingContext) -> Vec<(f64, f64)> {
    ctx.timeline()
        .segment_spans()
        .map(|(_, span)| (span.start, span.end))
        .collect()
}

// ── Editing scenarios ──────────────────────────────────────────

#[test]
fn cut_then_paste_back_restores_duration() {
    let mut ctx = loaded("talk.mp4", 100.0);

    ctx.cut(10.0, 20.0).unwrap();
    assert_eq!(
        layout(&ctx),
        vec![(0.0, 10.0, None), (20.0, 100.0, None)]
    );
    assert_eq!(spans(&ctx), vec![(0.0, 10.0), (10.0, 90.0)]);
    assert_eq!(ctx.timeline().total_duration(), 90.0);

    ctx.paste(10.0).unwrap();
    assert_eq!(ctx.timeline().total_duration(), 100.0);
    assert_eq!(
        layout(&ctx),
        vec![(0.0, 10.0, None), (10.0, 20.0, None), (20.0, 100.0, None)]
    );
}

#[test]
fn empty_delete_changes_nothing() {
    let mut ctx = loaded("talk.mp4", 100.0);
    let before = layout(&ctx);
    let dirty_before = ctx.timeline().has_changes();

    assert!(ctx.delete_range(0.0, 0.0).is_err());
    assert_eq!(layout(&ctx), before);
    assert_eq!(ctx.timeline().has_changes(), dirty_before);
    assert!(!ctx.history().can_undo());
}

#[test]
fn mapping_needs_the_right_source() {
    let mut ctx = loaded("a.mp4", 5.0);
    ctx.append_segment(Segment::with_source(0.0, 5.0, "b.mp4").unwrap())
        .unwrap();

    let mapper = ctx.timeline().mapper();
    assert_eq!(mapper.source_to_timeline(3.0), Some(3.0));
    assert_eq!(mapper.source_to_timeline_in("a.mp4", 3.0), Some(3.0));
    assert_eq!(mapper.source_to_timeline_in("b.mp4", 3.0), Some(8.0));
    assert_eq!(mapper.source_to_timeline_in("c.mp4", 3.0), None);
}

#[test]
fn cut_region_disappears_from_mapping() {
    let mut ctx = loaded("talk.mp4", 100.0);
    ctx.cut(10.0, 20.0).unwrap();

    let mapper = ctx.timeline().mapper();
    assert_eq!(mapper.source_to_timeline(5.0), Some(5.0));
    assert_eq!(mapper.source_to_timeline(15.0), None);
    assert_eq!(mapper.source_to_timeline(25.0), Some(15.0));
    // The far edge of the cut lands on the seam.
    assert_eq!(mapper.source_to_timeline(20.0), Some(10.0));
}

#[test]
fn state_machine_follows_edits_and_saves() {
    let mut ctx = EditingContext::new("tab");
    assert_eq!(ctx.state(), EditState::Empty);

    ctx.load_media("talk.mp4", 60.0).unwrap();
    assert_eq!(ctx.state(), EditState::Loaded);

    ctx.delete_range(0.0, 5.0).unwrap();
    assert_eq!(ctx.state(), EditState::Edited);

    ctx.undo().unwrap();
    assert_eq!(ctx.state(), EditState::Loaded);

    ctx.redo().unwrap();
    ctx.mark_saved();
    assert_eq!(ctx.state(), EditState::Loaded);

    ctx.reset();
    assert_eq!(ctx.state(), EditState::Empty);
    assert!(!ctx.history().can_undo());
}

#[test]
fn silence_removal_is_one_undo_step() {
    let mut ctx = loaded("talk.mp4", 100.0);
    ctx.cut(40.0, 50.0).unwrap();

    // Source ranges: one before the cut, one inside it, one after it.
    let silences = [
        TimeRange::new(5.0, 8.0),
        TimeRange::new(42.0, 48.0),
        TimeRange::new(60.0, 62.0),
    ];
    let removed = ctx.delete_source_ranges(&silences).unwrap();
    assert_eq!(removed, 2);
    assert_eq!(ctx.timeline().total_duration(), 85.0);

    let mapper = ctx.timeline().mapper();
    assert_eq!(mapper.source_to_timeline(6.0), None);
    assert_eq!(mapper.source_to_timeline(61.0), None);
    assert_eq!(mapper.source_to_timeline(70.0), Some(55.0));

    ctx.undo().unwrap();
    assert_eq!(ctx.timeline().total_duration(), 90.0);
}

#[test]
fn silence_removal_spares_inserted_clips() {
    let mut ctx = loaded("talk.mp4", 100.0);
    ctx.insert_segment_at_position(25.0, Segment::with_source(0.0, 30.0, "b-roll.mp4").unwrap())
        .unwrap();

    // The silence straddles the spot where the clip went in.
    let removed = ctx
        .delete_source_ranges(&[TimeRange::new(20.0, 30.0)])
        .unwrap();
    assert_eq!(removed, 2);
    assert_eq!(ctx.timeline().total_duration(), 120.0);
    assert_eq!(
        layout(&ctx),
        vec![
            (0.0, 20.0, None),
            (0.0, 30.0, Some("b-roll.mp4".to_string())),
            (30.0, 100.0, None),
        ]
    );

    ctx.undo().unwrap();
    assert_eq!(ctx.timeline().total_duration(), 130.0);
}

#[test]
fn short_clips_survive_unrelated_deletes() {
    let mut ctx = loaded("talk.mp4", 100.0);
    ctx.insert_segment_at_position(50.0, Segment::with_source(0.0, 0.005, "click.wav").unwrap())
        .unwrap();

    ctx.delete_range(0.0, 10.0).unwrap();
    ctx.delete_range(0.0, 5.0).unwrap();

    assert_eq!(
        layout(&ctx),
        vec![
            (15.0, 50.0, None),
            (0.0, 0.005, Some("click.wav".to_string())),
            (50.0, 100.0, None),
        ]
    );
}

#[test]
fn segments_past_the_source_end_are_rejected() {
    let mut ctx = loaded("talk.mp4", 100.0);
    ctx.cut(10.0, 20.0).unwrap();
    let before = layout(&ctx);

    assert!(matches!(
        ctx.restore_state(
            vec![Segment::new(50.0, 250.0).unwrap()],
            Some("talk.mp4".into()),
            100.0
        ),
        Err(EditError::InvalidSegment { .. })
    ));
    assert!(ctx
        .insert_segment_at_position(0.0, Segment::new(95.0, 105.0).unwrap())
        .is_err());
    assert_eq!(layout(&ctx), before);
    assert_eq!(ctx.state(), EditState::Edited);
}

#[test]
fn markers_follow_their_content() {
    let mut ctx = loaded("talk.mp4", 100.0);
    let anchors: Vec<_> = {
        let mapper = ctx.timeline().mapper();
        [Marker { time: 5.0 }, Marker { time: 15.0 }, Marker { time: 50.0 }]
            .into_iter()
            .filter_map(|m| mapper.anchor_marker(m))
            .collect()
    };
    let selection = ctx
        .timeline()
        .mapper()
        .anchor_selection(Selection {
            start: 30.0,
            end: 40.0,
        })
        .unwrap();

    ctx.delete_range(10.0, 20.0).unwrap();

    let mapper = ctx.timeline().mapper();
    assert_eq!(
        mapper.reproject_markers(&anchors),
        vec![Marker { time: 5.0 }, Marker { time: 40.0 }]
    );
    assert_eq!(
        mapper.reproject_selection(&selection),
        Some(Selection {
            start: 20.0,
            end: 30.0
        })
    );
}

// ── Multiple contexts ──────────────────────────────────────────

#[test]
fn paste_between_contexts_keeps_provenance() {
    let mut registry = ContextRegistry::new();
    let a = registry.open("A");
    let b = registry.open("B");
    registry.get_mut(a).unwrap().load_media("a.mp4", 30.0).unwrap();
    registry.get_mut(b).unwrap().load_media("b.mp4", 20.0).unwrap();

    registry.copy(a, 10.0, 15.0).unwrap();
    registry.paste(b, 5.0).unwrap();

    let ctx_b = registry.get(b).unwrap();
    assert_eq!(ctx_b.timeline().total_duration(), 25.0);
    assert_eq!(
        layout(ctx_b),
        vec![
            (0.0, 5.0, None),
            (10.0, 15.0, Some("a.mp4".to_string())),
            (5.0, 20.0, None),
        ]
    );

    // Each context undoes on its own.
    registry.get_mut(b).unwrap().undo().unwrap();
    assert_eq!(registry.get(b).unwrap().timeline().total_duration(), 20.0);
    assert_eq!(registry.get(a).unwrap().timeline().total_duration(), 30.0);
}

#[test]
fn pasting_back_into_own_source_drops_redundant_provenance() {
    let mut registry = ContextRegistry::new();
    let a = registry.open("A");
    let b = registry.open("B");
    registry.get_mut(a).unwrap().load_media("a.mp4", 30.0).unwrap();
    registry.get_mut(b).unwrap().load_media("a.mp4", 30.0).unwrap();

    registry.cut(a, 0.0, 10.0).unwrap();
    registry.paste(b, 30.0).unwrap();

    let ctx_b = registry.get(b).unwrap();
    assert!(ctx_b
        .timeline()
        .segments()
        .iter()
        .all(|s| s.source_file.is_none()));
}

#[test]
fn closed_context_ids_are_not_reused() {
    let mut registry = ContextRegistry::new();
    let a = registry.open("A");
    registry.close(a).unwrap();
    let b = registry.open("B");

    assert_ne!(a, b);
    assert_eq!(
        registry.get(a).map(|_| ()),
        Err(EditError::UnknownContext(a))
    );
    assert_eq!(registry.len(), 1);
}

// ── Persistence ────────────────────────────────────────────────

#[test]
fn project_file_roundtrip_preserves_edits() {
    let mut ctx = loaded("talk.mp4", 100.0);
    ctx.cut(10.0, 20.0).unwrap();
    ctx.insert_segment_at_position(0.0, Segment::with_source(0.0, 4.0, "intro.mp4").unwrap())
        .unwrap();

    let path = std::env::temp_dir().join(format!("clearcut-it-{}.json", Uuid::new_v4()));
    ProjectFile::from_context(&ctx).save_to_file(&path).unwrap();
    let reloaded = ProjectFile::load_from_file(&path)
        .unwrap()
        .into_context("reloaded")
        .unwrap();
    let _ = std::fs::remove_file(&path);

    assert_eq!(reloaded.id, ctx.id);
    assert_eq!(layout(&reloaded), layout(&ctx));
    assert_eq!(reloaded.state(), EditState::Loaded);
    assert!(!reloaded.history().can_undo());

    let mapper = reloaded.timeline().mapper();
    assert_eq!(mapper.source_to_timeline(25.0), Some(19.0));
}

#[test]
fn missing_project_file_is_io_error() {
    let path = std::env::temp_dir().join(format!("clearcut-missing-{}.json", Uuid::new_v4()));
    let err = ProjectFile::load_from_file(&path).unwrap_err();
    assert!(matches!(err, ClearCutError::Io(_)));
}
