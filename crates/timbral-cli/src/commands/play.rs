//! Real-time playback command.

use super::common::{apply_overrides, demo_score, load_patch, parse_global};
use anyhow::Context;
use clap::Args;
use midir::{Ignore, MidiInput, MidiInputConnection};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};
use timbral_io::{BackendStreamConfig, CpalBackend, SynthPlayer};
use timbral_synth::{
    DEFAULT_PITCH_BEND_RANGE, EngineHandle, MpeTranslator, NoteEvent, SynthEngine,
};

const CLIENT_NAME: &str = "timbral";

#[derive(Args)]
pub struct PlayArgs {
    /// Patch name or path
    #[arg(short, long)]
    patch: Option<String>,

    /// Global parameter override, e.g. "cutoff=1200"
    #[arg(long = "set", value_parser = parse_global, number_of_values = 1)]
    set: Vec<(String, f32)>,

    /// Output device (index, exact name, or partial name)
    #[arg(short, long)]
    device: Option<String>,

    /// Sample rate
    #[arg(long, default_value = "48000")]
    sample_rate: u32,

    /// Buffer size
    #[arg(long, default_value = "512")]
    buffer_size: u32,

    /// Output channels
    #[arg(long, default_value = "2")]
    channels: u16,

    /// MIDI input port (index or partial name). Plays the demo when omitted
    #[arg(long)]
    midi_in: Option<String>,

    /// List MIDI input ports and exit
    #[arg(long)]
    list_midi: bool,

    /// Pitch-bend range of MIDI input in semitones
    #[arg(long, default_value_t = DEFAULT_PITCH_BEND_RANGE)]
    bend_range: f32,

    /// Repeat the demo until stopped
    #[arg(short, long, alias = "loop")]
    repeat: bool,
}

pub fn run(args: PlayArgs) -> anyhow::Result<()> {
    if args.list_midi {
        return list_midi_ports();
    }

    let mut patch = load_patch(args.patch.as_deref())?;
    apply_overrides(&mut patch, &args.set)?;
    let (engine, handle) = SynthEngine::new(patch.engine_config(args.sample_rate as f32)?)?;
    patch.apply(handle.globals());

    let config = BackendStreamConfig {
        sample_rate: args.sample_rate,
        buffer_size: args.buffer_size,
        channels: args.channels,
        device_name: args.device.clone(),
    };
    let backend = CpalBackend::new();
    let player = SynthPlayer::start(&backend, engine, &config)?;

    let running = Arc::new(AtomicBool::new(true));
    let r = Arc::clone(&running);
    ctrlc::set_handler(move || {
        println!("\nStopping...");
        r.store(false, Ordering::SeqCst);
    })?;

    println!("Playing patch '{}'", patch.name);
    println!(
        "  Output: {}",
        args.device.as_deref().unwrap_or("default device")
    );
    println!("  Sample rate: {} Hz", player.sample_rate());
    println!("  Buffer size: {} frames", args.buffer_size);

    match &args.midi_in {
        Some(query) => {
            let (connection, port) = connect_midi(query, player.handle().clone(), args.bend_range)?;
            println!("  MIDI input: {port}");
            println!("\nPress Ctrl+C to stop...\n");
            while running.load(Ordering::SeqCst) {
                thread::sleep(Duration::from_millis(250));
                tracing::debug!(
                    voices = player.meter().active_voices(),
                    peak = player.meter().peak(),
                    "playing"
                );
            }
            drop(connection);
        }
        None => {
            println!("  Source: demo{}", if args.repeat { " (repeating)" } else { "" });
            println!("\nPress Ctrl+C to stop...\n");
            run_demo(player.handle(), &running, args.repeat)?;
        }
    }

    player.handle().push_event(NoteEvent::AllNotesOff);
    thread::sleep(Duration::from_millis(100));

    let meter = player.meter();
    println!(
        "Done! {:.1}s played, {} stream error(s)",
        meter.frames() as f64 / f64::from(player.sample_rate()),
        meter.errors()
    );
    Ok(())
}

fn list_midi_ports() -> anyhow::Result<()> {
    let input = MidiInput::new(CLIENT_NAME)?;
    let ports = input.ports();

    if ports.is_empty() {
        println!("No MIDI input ports found.");
        return Ok(());
    }

    println!("MIDI Input Ports:");
    for (i, port) in ports.iter().enumerate() {
        let name = input
            .port_name(port)
            .unwrap_or_else(|_| "(unknown)".to_string());
        println!("  [{i}] {name}");
    }
    Ok(())
}

/// Index or case-insensitive partial name.
fn select_port(names: &[String], query: &str) -> anyhow::Result<usize> {
    if let Ok(index) = query.parse::<usize>() {
        anyhow::ensure!(
            index < names.len(),
            "MIDI port index {index} out of range ({} ports)",
            names.len()
        );
        return Ok(index);
    }
    let lower = query.to_lowercase();
    names
        .iter()
        .position(|n| n.to_lowercase().contains(&lower))
        .with_context(|| format!("no MIDI input port matching '{query}'"))
}

fn connect_midi(
    query: &str,
    handle: EngineHandle,
    bend_range: f32,
) -> anyhow::Result<(MidiInputConnection<()>, String)> {
    let mut input = MidiInput::new(CLIENT_NAME)?;
    input.ignore(Ignore::All);

    let ports = input.ports();
    let names: Vec<String> = ports
        .iter()
        .map(|p| input.port_name(p).unwrap_or_default())
        .collect();
    let index = select_port(&names, query)?;
    let port = ports.get(index).context("MIDI port disappeared")?;
    let name = names[index].clone();

    let mut translator = MpeTranslator::with_pitch_bend_range(bend_range);
    let connection = input
        .connect(
            port,
            "timbral-in",
            move |_stamp, bytes, _| {
                if let Err(e) = translator.translate(bytes, |event| {
                    handle.push_event(event);
                }) {
                    tracing::debug!(error = %e, ?bytes, "unparsed MIDI message");
                }
            },
            (),
        )
        .map_err(|e| anyhow::anyhow!("failed to connect to MIDI port '{name}': {e}"))?;

    tracing::info!(port = %name, bend_range, "MIDI input connected");
    Ok((connection, name))
}

/// Play the demo score in real time. Returns early when `running` clears.
fn run_demo(handle: &EngineHandle, running: &AtomicBool, repeat: bool) -> anyhow::Result<()> {
    let score = demo_score();
    let mut events = score
        .events
        .iter()
        .enumerate()
        .map(|(i, e)| Ok((e.at, e.to_note_event(i)?)))
        .collect::<anyhow::Result<Vec<(f64, NoteEvent)>>>()?;
    events.sort_by(|a, b| a.0.total_cmp(&b.0));

    loop {
        let start = Instant::now();
        for (at, event) in &events {
            if !wait_until(start + Duration::from_secs_f64(*at), running) {
                return Ok(());
            }
            handle.push_event(*event);
        }
        let end = start + Duration::from_secs_f64(score.duration_secs());
        if !wait_until(end, running) || !repeat {
            return Ok(());
        }
    }
}

fn wait_until(deadline: Instant, running: &AtomicBool) -> bool {
    while running.load(Ordering::SeqCst) {
        let now = Instant::now();
        if now >= deadline {
            return true;
        }
        thread::sleep((deadline - now).min(Duration::from_millis(20)));
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_port() {
        let names = vec!["Midi Through".to_string(), "Linnstrument MIDI 1".to_string()];
        assert_eq!(select_port(&names, "1").unwrap(), 1);
        assert_eq!(select_port(&names, "linn").unwrap(), 1);
        assert_eq!(select_port(&names, "through").unwrap(), 0);
        assert!(select_port(&names, "2").is_err());
        assert!(select_port(&names, "seaboard").is_err());
    }

    #[test]
    fn test_wait_until_stops_when_cleared() {
        let running = AtomicBool::new(false);
        assert!(!wait_until(Instant::now() + Duration::from_secs(10), &running));
        running.store(true, Ordering::SeqCst);
        assert!(wait_until(Instant::now(), &running));
    }
}
