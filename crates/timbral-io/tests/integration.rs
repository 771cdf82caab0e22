//! Integration tests for timbral-io WAV output and playback.

use timbral_io::{
    AudioBackend, BackendStreamConfig, ManualBackend, SynthPlayer, WavFormat, WavSink, WavSpec,
    read_wav, read_wav_info, write_wav,
};
use timbral_synth::{
    EngineConfig, NoteEvent, OfflineRenderer, SynthEngine, TimedEvent, VOICE_AMP_SCALE,
};
use tempfile::NamedTempFile;

fn engine() -> SynthEngine {
    SynthEngine::new(EngineConfig::default()).unwrap().0
}

// ---------------------------------------------------------------------------
// Offline render to WAV
// ---------------------------------------------------------------------------

#[test]
fn offline_render_streams_into_wav() {
    let mut engine = engine();
    let mut renderer = OfflineRenderer::new(2, 512);
    let spec = WavSpec::default();
    let file = NamedTempFile::new().unwrap();
    let mut sink = WavSink::create(file.path(), spec).unwrap();

    let events = vec![
        TimedEvent::new(0, NoteEvent::note_on(1, 220.0, 1.0, 0.0)),
        TimedEvent::new(24000, NoteEvent::note_off(1)),
    ];
    let mut write_error = None;
    renderer.render(&mut engine, events, 48000, |block| {
        if let Err(e) = sink.write(block) {
            write_error.get_or_insert(e);
        }
    });
    assert!(write_error.is_none());
    sink.finalize().unwrap();

    let info = read_wav_info(file.path()).unwrap();
    assert_eq!(info.channels, 2);
    assert_eq!(info.sample_rate, 48000);
    assert_eq!(info.num_frames, 48000);
    assert_eq!(info.format, WavFormat::IeeeFloat);
    assert!((info.duration_secs - 1.0).abs() < 1e-9);

    let (samples, _) = read_wav(file.path()).unwrap();
    let first_half = &samples[..48000];
    let tail = &samples[2 * 40000..];
    assert!(first_half.iter().any(|&s| s != 0.0));
    assert!(first_half.iter().all(|s| s.abs() <= VOICE_AMP_SCALE));
    // Default release is 0.1 s; the last 8000 frames are past it.
    assert!(tail.iter().all(|&s| s == 0.0));
}

#[test]
fn sixteen_bit_render_matches_float_render() {
    let mut engine = engine();
    let mut renderer = OfflineRenderer::new(1, 256);
    let mut samples = Vec::new();
    renderer.render(
        &mut engine,
        vec![TimedEvent::new(0, NoteEvent::note_on(1, 440.0, 0.8, 0.3))],
        4800,
        |b| samples.extend_from_slice(b),
    );

    let spec = WavSpec {
        channels: 1,
        sample_rate: 48000,
        bits_per_sample: 16,
    };
    let file = NamedTempFile::new().unwrap();
    write_wav(file.path(), &samples, spec).unwrap();
    let (loaded, loaded_spec) = read_wav(file.path()).unwrap();

    assert_eq!(loaded_spec, spec);
    for (a, b) in samples.iter().zip(&loaded) {
        assert!((a - b).abs() < 1e-3, "sample mismatch: {a} vs {b}");
    }
}

// ---------------------------------------------------------------------------
// Playback through a pulled backend
// ---------------------------------------------------------------------------

#[test]
fn player_applies_events_and_globals() {
    let backend = ManualBackend::new();
    let config = BackendStreamConfig {
        channels: 1,
        buffer_size: 128,
        ..BackendStreamConfig::default()
    };
    let player = SynthPlayer::start(&backend, engine(), &config).unwrap();
    assert_eq!(player.sample_rate(), backend.actual_sample_rate(&config));

    player.handle().set_global("release", 0.0).unwrap();
    player.handle().push_event(NoteEvent::note_on(5, 330.0, 1.0, 1.0));
    for _ in 0..4 {
        assert!(backend.pull(128).unwrap().iter().any(|&s| s != 0.0));
    }
    assert_eq!(player.meter().active_voices(), 1);

    player.handle().push_event(NoteEvent::note_off(5));
    backend.pull(128).unwrap();
    assert!(backend.pull(128).unwrap().iter().all(|&s| s == 0.0));
    assert_eq!(player.meter().active_voices(), 0);
    assert_eq!(player.meter().frames(), 6 * 128);
    assert_eq!(player.meter().errors(), 0);
}

#[test]
fn player_rejects_unknown_global() {
    let backend = ManualBackend::new();
    let player = SynthPlayer::start(&backend, engine(), &BackendStreamConfig::default()).unwrap();
    assert!(player.handle().set_global("resonance", 0.5).is_err());
}

#[test]
fn player_prepares_engine_for_stream_rate() {
    let backend = ManualBackend::new();
    let config = BackendStreamConfig {
        sample_rate: 0,
        ..BackendStreamConfig::default()
    };
    let result = SynthPlayer::start(&backend, engine(), &config);
    assert!(matches!(result, Err(timbral_io::Error::Prepare(_))));
    assert!(!backend.is_attached());
}
