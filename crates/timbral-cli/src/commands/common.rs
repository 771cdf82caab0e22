//! Shared CLI helpers used across multiple commands.

use anyhow::Context;
use timbral_config::{Patch, Score, ScoreEvent, ScoreEventKind, resolve_patch, validate_global};
use timbral_core::GlobalParam;

/// Patch used when none is named.
pub const DEFAULT_PATCH: &str = "init";

/// Parse a `name=value` global override for clap's `value_parser`.
pub fn parse_global(s: &str) -> Result<(String, f32), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("invalid parameter format: '{s}' (expected name=value)"))?;
    let value: f32 = value
        .trim()
        .parse()
        .map_err(|_| format!("invalid value for '{name}': '{value}'"))?;
    Ok((name.trim().to_string(), value))
}

/// Load a patch by factory name, user patch name or path.
pub fn load_patch(name: Option<&str>) -> anyhow::Result<Patch> {
    let name = name.unwrap_or(DEFAULT_PATCH);
    let (patch, source) = resolve_patch(name).with_context(|| {
        format!("patch '{name}' not found. Use 'timbral patches list' to see available patches.")
    })?;
    tracing::info!(patch = %patch.name, %source, "loaded patch");
    Ok(patch)
}

/// Apply `--set name=value` overrides, rejecting unknown names and
/// out-of-range values.
pub fn apply_overrides(patch: &mut Patch, overrides: &[(String, f32)]) -> anyhow::Result<()> {
    for (name, value) in overrides {
        validate_global(name, *value)?;
        if let Some(param) = GlobalParam::from_name(name) {
            patch.globals.set(param, *value);
            tracing::debug!(%param, value, "global override");
        }
    }
    Ok(())
}

/// Built-in demo: a minor-seventh arpeggio in which every note swells in
/// pressure, opens in timbre and bends a semitone towards the end.
pub fn demo_score() -> Score {
    const ROOTS: [f32; 4] = [57.0, 53.0, 48.0, 55.0];
    const CHORD: [f32; 4] = [0.0, 3.0, 7.0, 10.0];
    const STEP: f64 = 0.25;
    const GATE: f64 = 0.9;

    let mut score = Score::new("Demo");
    score.tail = 1.5;

    let mut id = 1;
    for (bar, root) in ROOTS.iter().enumerate() {
        let bar_start = bar as f64 * STEP * 8.0;
        for step in 0..8 {
            let at = bar_start + step as f64 * STEP;
            let note = root + CHORD[step % 4] + if step >= 4 { 12.0 } else { 0.0 };
            let timbre = step as f32 / 7.0;

            score.events.push(
                ScoreEvent::new(at, ScoreEventKind::NoteOn, id)
                    .with_note(note)
                    .with_pressure(0.5)
                    .with_timbre(timbre * 0.5),
            );
            score.events.push(
                ScoreEvent::new(at + STEP * 0.4, ScoreEventKind::Pressure, id).with_pressure(1.0),
            );
            score.events.push(
                ScoreEvent::new(at + STEP * 0.5, ScoreEventKind::Timbre, id).with_timbre(timbre),
            );
            if step == 7 {
                score.events.push(
                    ScoreEvent::new(at + STEP * 0.6, ScoreEventKind::Pitch, id).with_note(note - 1.0),
                );
            }
            score
                .events
                .push(ScoreEvent::new(at + STEP * GATE, ScoreEventKind::NoteOff, id));
            id += 1;
        }
    }
    score
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_global() {
        assert_eq!(parse_global("cutoff=1200"), Ok(("cutoff".to_string(), 1200.0)));
        assert_eq!(parse_global(" attack = 0.5"), Ok(("attack".to_string(), 0.5)));
        assert!(parse_global("cutoff").is_err());
        assert!(parse_global("cutoff=loud").is_err());
    }

    #[test]
    fn test_overrides() {
        let mut patch = Patch::new("x");
        apply_overrides(
            &mut patch,
            &[("wave-mix".to_string(), 0.5), ("release".to_string(), 2.0)],
        )
        .unwrap();
        assert_eq!(patch.globals.wave_mix, 0.5);
        assert_eq!(patch.globals.release, 2.0);

        assert!(apply_overrides(&mut patch, &[("resonance".to_string(), 0.1)]).is_err());
        assert!(apply_overrides(&mut patch, &[("sustain".to_string(), 4.0)]).is_err());
    }

    #[test]
    fn test_demo_score_is_valid() {
        let score = demo_score();
        let events = score.timed_events(48000).unwrap();
        assert_eq!(events.len(), score.events.len());
        assert!(score.duration_secs() > 8.0);
        assert!(events.iter().all(|e| e.frame < score.total_frames(48000)));
    }
}
