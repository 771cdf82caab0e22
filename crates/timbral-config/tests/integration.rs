//! Integration tests for timbral-config.
//!
//! Patches and scores are driven all the way through the synth engine.

use tempfile::TempDir;
use timbral_config::{
    ConfigError, Patch, Score, ScoreEvent, ScoreEventKind, ValidationError, factory_patches,
    get_factory_patch, list_patches_in_dir, patch_name_from_path,
};
use timbral_synth::{GlobalParam, OfflineRenderer, SynthEngine, StealPolicy};

fn render_score(patch: &Patch, score: &Score) -> (Vec<f32>, SynthEngine, usize) {
    let config = patch
        .engine_config(score.sample_rate as f32)
        .expect("patch should validate");
    let (mut engine, handle) = SynthEngine::new(config).unwrap();
    patch.apply(handle.globals());
    engine.snap_globals();

    let events = score.timed_events(score.sample_rate).unwrap();
    let mut renderer = OfflineRenderer::new(usize::from(score.channels), 256);
    let mut out = Vec::new();
    let applied = renderer.render(
        &mut engine,
        events,
        score.total_frames(score.sample_rate),
        |block| out.extend_from_slice(block),
    );
    (out, engine, applied)
}

fn chord_score() -> Score {
    let mut score = Score::new("chord");
    score.duration = Some(1.0);
    score.channels = 1;
    for (id, note) in [(1, 60.0), (2, 64.0), (3, 67.0)] {
        score = score
            .with_event(ScoreEvent::new(0.0, ScoreEventKind::NoteOn, id).with_note(note))
            .with_event(ScoreEvent::new(0.5, ScoreEventKind::NoteOff, id));
    }
    score
}

// ---------------------------------------------------------------------------
// Factory patches
// ---------------------------------------------------------------------------

#[test]
fn every_factory_patch_renders_sound() {
    let score = chord_score();
    for patch in factory_patches() {
        let (out, engine, applied) = render_score(&patch, &score);
        assert_eq!(applied, 6, "patch '{}'", patch.name);
        assert_eq!(out.len(), 48000);
        assert!(out.iter().all(|s| s.is_finite()), "patch '{}'", patch.name);
        assert!(
            out[..4800].iter().any(|&s| s != 0.0),
            "patch '{}' should sound",
            patch.name
        );
        assert!(engine.stats().notes_assigned >= 1);
    }
}

#[test]
fn mono_patch_steals_for_every_new_note() {
    let patch = get_factory_patch("mono_bass").unwrap();
    assert_eq!(patch.engine.polyphony, 1);
    assert_eq!(patch.engine.steal_policy().unwrap(), StealPolicy::Oldest);

    let (_, engine, _) = render_score(&patch, &chord_score());
    let stats = engine.stats();
    assert_eq!(stats.notes_assigned, 1);
    assert_eq!(stats.voices_stolen, 2);
    assert_eq!(stats.notes_dropped, 0);
    assert_eq!(engine.active_voices(), 0);
}

#[test]
fn patch_globals_reach_the_engine() {
    let patch = get_factory_patch("soft_pad").unwrap();
    let config = patch.engine_config(48000.0).unwrap();
    let (engine, handle) = SynthEngine::new(config).unwrap();
    patch.apply(handle.globals());

    assert_eq!(engine.globals().get(GlobalParam::Attack), 1.2);
    assert_eq!(engine.globals().get(GlobalParam::Release), 2.5);
    assert_eq!(engine.config().polyphony, 15);
}

// ---------------------------------------------------------------------------
// Files
// ---------------------------------------------------------------------------

#[test]
fn patches_save_load_and_list() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("patches");

    let mut patch = get_factory_patch("glass_keys").unwrap();
    patch.name = "My Keys".to_string();
    patch.globals.release = 3.0;
    let path = dir.join("my_keys.toml");
    patch.save(&path).unwrap();
    Patch::new("Other").save(dir.join("other.toml")).unwrap();

    assert_eq!(Patch::load(&path).unwrap(), patch);

    let listed = list_patches_in_dir(&dir);
    let names: Vec<_> = listed
        .iter()
        .filter_map(|p| patch_name_from_path(p))
        .collect();
    assert_eq!(names, vec!["my_keys".to_string(), "other".to_string()]);
}

#[test]
fn score_file_renders_like_built_score() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("chord.toml");
    let score = chord_score();
    score.save(&path).unwrap();

    let loaded = Score::load(&path).unwrap();
    assert_eq!(loaded, score);

    let patch = Patch::new("init");
    let (a, _, _) = render_score(&patch, &score);
    let (b, _, _) = render_score(&patch, &loaded);
    assert_eq!(a, b);
}

#[test]
fn missing_file_reports_path() {
    let err = Patch::load("/nonexistent/dir/patch.toml").unwrap_err();
    assert!(matches!(err, ConfigError::ReadFile { .. }));
    assert!(err.to_string().contains("/nonexistent/dir/patch.toml"));
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

#[test]
fn invalid_patch_lists_every_problem() {
    let toml = r#"
        name = "Broken"
        [engine]
        table_length = 3000
        steal_policy = "newest"
        [globals]
        sustain = 2.0
    "#;
    let patch = Patch::from_toml(toml).unwrap();
    match patch.engine_config(48000.0) {
        Err(ConfigError::Validation(ValidationError::Multiple(errors))) => {
            assert_eq!(errors.len(), 3, "{errors:?}");
        }
        other => panic!("expected validation errors, got {other:?}"),
    }
}

#[test]
fn score_with_bad_event_is_rejected() {
    let toml = r#"
        [[events]]
        at = 0.0
        type = "pressure"
        id = 4
    "#;
    let score = Score::from_toml(toml).unwrap();
    assert_eq!(
        score.timed_events(48000),
        Err(ValidationError::MissingField {
            index: 0,
            kind: "pressure".to_string(),
            field: "pressure",
        })
    );
}

#[test]
fn score_values_outside_engine_range_are_rejected() {
    let toml = r#"
        sample_rate = 48000

        [[events]]
        at = 0.0
        type = "note_on"
        id = 1
        note = 160

        [[events]]
        at = 0.0
        type = "note_on"
        id = 2
        note = 60
        pressure = 8.0

        [[events]]
        at = 0.1
        type = "pitch"
        id = 2
        frequency = -20.0

        [[events]]
        at = 0.2
        type = "timbre"
        id = 2
        timbre = 1.5
    "#;
    let score = Score::from_toml(toml).unwrap();
    match score.timed_events(score.sample_rate) {
        Err(ValidationError::Multiple(errors)) => {
            assert_eq!(errors.len(), 4, "got {errors:?}");
            assert!(
                errors
                    .iter()
                    .all(|e| matches!(e, ValidationError::InvalidScore(_)))
            );
        }
        other => panic!("expected four errors, got {other:?}"),
    }
}

#[test]
fn top_of_range_score_renders_bounded() {
    // Highest pitch the score accepts at 16 kHz, full pressure.
    let mut score = Score::new("edge");
    score.sample_rate = 16000;
    score.channels = 1;
    score.duration = Some(0.25);
    let mut high = ScoreEvent::new(0.0, ScoreEventKind::NoteOn, 1).with_pressure(1.0);
    high.frequency = Some(7999.0);
    score = score.with_event(high);

    let patch = get_factory_patch("init").unwrap();
    let (out, _, applied) = render_score(&patch, &score);
    assert_eq!(applied, 1);
    assert!(out.iter().all(|s| s.is_finite() && s.abs() <= 1.0));
}
