//! MIDI to note-event translation in MPE legacy mode.
//!
//! Every MIDI channel is treated as a note channel. Channel-wide controls
//! (pitch bend, channel pressure, CC 74) therefore address every note held
//! on that channel. A note's id is `channel << 7 | key`.
//!
//! | MIDI                       | Event                          |
//! |----------------------------|--------------------------------|
//! | Note on (velocity > 0)     | `NoteOn`, pressure = vel / 127 |
//! | Note off, note on vel 0    | `NoteOff` (deferred by pedal)  |
//! | Pitch bend                 | `PitchChanged` per held note   |
//! | Channel / poly pressure    | `PressureChanged`              |
//! | CC 74                      | `TimbreChanged` per held note  |
//! | CC 64                      | sustain pedal                  |
//! | CC 120, CC 123             | `AllNotesOff`                  |

use midly::MidiMessage;
use midly::live::LiveEvent;
use timbral_core::midi_to_freq;

use crate::event::{KeyState, NoteEvent, NoteId};

/// Pitch-bend range used when none is configured, in semitones.
pub const DEFAULT_PITCH_BEND_RANGE: f32 = 24.0;

/// Timbre assumed before a channel has sent CC 74.
pub const DEFAULT_TIMBRE: f32 = 0.5;

const CC_SUSTAIN: u8 = 64;
const CC_TIMBRE: u8 = 74;
const CC_ALL_SOUND_OFF: u8 = 120;
const CC_ALL_NOTES_OFF: u8 = 123;

const CHANNELS: usize = 16;
const KEYS: usize = 128;

#[derive(Debug, Clone, Copy)]
struct ChannelState {
    bend: f32,
    timbre: f32,
    sustain: bool,
    keys: [KeyState; KEYS],
}

impl Default for ChannelState {
    fn default() -> Self {
        Self {
            bend: 0.0,
            timbre: DEFAULT_TIMBRE,
            sustain: false,
            keys: [KeyState::Off; KEYS],
        }
    }
}

/// The id given to `key` on `channel`.
pub fn note_id(channel: u8, key: u8) -> NoteId {
    NoteId((u32::from(channel & 0x0F) << 7) | u32::from(key & 0x7F))
}

/// Stateful MIDI to [`NoteEvent`] translator.
///
/// # Example
///
/// ```rust
/// use timbral_synth::{MpeTranslator, NoteEvent};
///
/// let mut mpe = MpeTranslator::new();
/// let mut events = Vec::new();
/// mpe.translate(&[0x91, 69, 127], |e| events.push(e)).unwrap();
///
/// assert!(matches!(events[0], NoteEvent::NoteOn { .. }));
/// ```
#[derive(Debug, Clone)]
pub struct MpeTranslator {
    bend_range: f32,
    channels: [ChannelState; CHANNELS],
}

impl Default for MpeTranslator {
    fn default() -> Self {
        Self::new()
    }
}

impl MpeTranslator {
    /// Translator with a 24 semitone bend range.
    pub fn new() -> Self {
        Self::with_pitch_bend_range(DEFAULT_PITCH_BEND_RANGE)
    }

    /// Translator with a custom bend range in semitones.
    pub fn with_pitch_bend_range(semitones: f32) -> Self {
        Self {
            bend_range: semitones.abs(),
            channels: [ChannelState::default(); CHANNELS],
        }
    }

    /// Bend range in semitones.
    pub fn pitch_bend_range(&self) -> f32 {
        self.bend_range
    }

    /// Parse one raw MIDI message and emit the resulting events.
    ///
    /// System messages are accepted and ignored.
    pub fn translate<F>(&mut self, bytes: &[u8], emit: F) -> Result<(), midly::Error>
    where
        F: FnMut(NoteEvent),
    {
        if let LiveEvent::Midi { channel, message } = LiveEvent::parse(bytes)? {
            self.handle(channel.as_int(), message, emit);
        }
        Ok(())
    }

    /// Emit the events for an already parsed channel message.
    pub fn handle<F>(&mut self, channel: u8, message: MidiMessage, mut emit: F)
    where
        F: FnMut(NoteEvent),
    {
        let ch = usize::from(channel & 0x0F);
        match message {
            MidiMessage::NoteOn { key, vel } if vel.as_int() > 0 => {
                let key = key.as_int();
                let state = &mut self.channels[ch];
                state.keys[usize::from(key)] = KeyState::Down;
                emit(NoteEvent::NoteOn {
                    id: note_id(channel, key),
                    frequency: midi_to_freq(f32::from(key) + state.bend),
                    pressure: f32::from(vel.as_int()) / 127.0,
                    timbre: state.timbre,
                });
            }
            MidiMessage::NoteOn { key, .. } | MidiMessage::NoteOff { key, .. } => {
                let key = key.as_int();
                let state = &mut self.channels[ch];
                let sustain = state.sustain;
                let slot = &mut state.keys[usize::from(key)];
                match *slot {
                    KeyState::Down if sustain => *slot = KeyState::Sustained,
                    KeyState::Down => {
                        *slot = KeyState::Off;
                        emit(NoteEvent::NoteOff {
                            id: note_id(channel, key),
                        });
                    }
                    KeyState::Sustained | KeyState::Off => {}
                }
            }
            MidiMessage::Aftertouch { key, vel } => {
                let key = key.as_int();
                if self.channels[ch].keys[usize::from(key)] != KeyState::Off {
                    emit(NoteEvent::PressureChanged {
                        id: note_id(channel, key),
                        pressure: f32::from(vel.as_int()) / 127.0,
                    });
                }
            }
            MidiMessage::ChannelAftertouch { vel } => {
                let pressure = f32::from(vel.as_int()) / 127.0;
                self.for_each_held(channel, |id, _| {
                    emit(NoteEvent::PressureChanged { id, pressure });
                });
            }
            MidiMessage::PitchBend { bend } => {
                let semitones = bend.as_f32() * self.bend_range;
                self.channels[ch].bend = semitones;
                self.for_each_held(channel, |id, key| {
                    emit(NoteEvent::PitchChanged {
                        id,
                        frequency: midi_to_freq(f32::from(key) + semitones),
                    });
                });
            }
            MidiMessage::Controller { controller, value } => {
                self.controller(channel, controller.as_int(), value.as_int(), emit);
            }
            MidiMessage::ProgramChange { .. } => {}
        }
    }

    fn controller<F>(&mut self, channel: u8, controller: u8, value: u8, mut emit: F)
    where
        F: FnMut(NoteEvent),
    {
        let ch = usize::from(channel & 0x0F);
        match controller {
            CC_TIMBRE => {
                let timbre = f32::from(value) / 127.0;
                self.channels[ch].timbre = timbre;
                self.for_each_held(channel, |id, _| {
                    emit(NoteEvent::TimbreChanged { id, timbre });
                });
            }
            CC_SUSTAIN => {
                let down = value >= 64;
                let state = &mut self.channels[ch];
                state.sustain = down;
                if !down {
                    for (key, slot) in state.keys.iter_mut().enumerate() {
                        if *slot == KeyState::Sustained {
                            *slot = KeyState::Off;
                            emit(NoteEvent::NoteOff {
                                id: note_id(channel, key as u8),
                            });
                        }
                    }
                }
            }
            CC_ALL_SOUND_OFF | CC_ALL_NOTES_OFF => {
                for state in &mut self.channels {
                    state.keys = [KeyState::Off; KEYS];
                }
                emit(NoteEvent::AllNotesOff);
            }
            _ => {}
        }
    }

    fn for_each_held(&self, channel: u8, mut f: impl FnMut(NoteId, u8)) {
        let state = &self.channels[usize::from(channel & 0x0F)];
        for (key, slot) in state.keys.iter().enumerate() {
            if *slot != KeyState::Off {
                f(note_id(channel, key as u8), key as u8);
            }
        }
    }

    /// State of `key` on `channel`.
    pub fn key_state(&self, channel: u8, key: u8) -> KeyState {
        self.channels[usize::from(channel & 0x0F)].keys[usize::from(key & 0x7F)]
    }

    /// Number of keys held down or by the pedal.
    pub fn held_notes(&self) -> usize {
        self.channels
            .iter()
            .flat_map(|c| c.keys.iter())
            .filter(|k| **k != KeyState::Off)
            .count()
    }

    /// Forget all channel and key state.
    pub fn reset(&mut self) {
        self.channels = [ChannelState::default(); CHANNELS];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(mpe: &mut MpeTranslator, bytes: &[u8]) -> Vec<NoteEvent> {
        let mut out = Vec::new();
        mpe.translate(bytes, |e| out.push(e)).unwrap();
        out
    }

    #[test]
    fn test_note_on_maps_velocity_and_id() {
        let mut mpe = MpeTranslator::new();
        let events = run(&mut mpe, &[0x92, 69, 127]);
        match events[..] {
            [
                NoteEvent::NoteOn {
                    id,
                    frequency,
                    pressure,
                    timbre,
                },
            ] => {
                assert_eq!(id, NoteId((2 << 7) | 69));
                assert!((frequency - 440.0).abs() < 0.01);
                assert!((pressure - 1.0).abs() < 1e-6);
                assert_eq!(timbre, DEFAULT_TIMBRE);
            }
            _ => panic!("unexpected events {events:?}"),
        }
        assert_eq!(mpe.key_state(2, 69), KeyState::Down);
    }

    #[test]
    fn test_zero_velocity_is_note_off() {
        let mut mpe = MpeTranslator::new();
        run(&mut mpe, &[0x90, 60, 100]);
        let events = run(&mut mpe, &[0x90, 60, 0]);
        assert_eq!(events, vec![NoteEvent::note_off(60)]);
        assert_eq!(mpe.key_state(0, 60), KeyState::Off);
    }

    #[test]
    fn test_note_off_for_unheld_key_is_silent() {
        let mut mpe = MpeTranslator::new();
        assert!(run(&mut mpe, &[0x80, 60, 0]).is_empty());
    }

    #[test]
    fn test_pitch_bend_uses_range() {
        let mut mpe = MpeTranslator::new();
        run(&mut mpe, &[0x90, 57, 100]);
        // Full upward bend: 14-bit 0x3FFF.
        let events = run(&mut mpe, &[0xE0, 0x7F, 0x7F]);
        match events[..] {
            [NoteEvent::PitchChanged { id, frequency }] => {
                assert_eq!(id, NoteId(57));
                // A3 + 24 semitones = A5.
                assert!((frequency - 880.0).abs() < 1.0, "got {frequency}");
            }
            _ => panic!("unexpected events {events:?}"),
        }
    }

    #[test]
    fn test_bend_applies_to_later_notes() {
        let mut mpe = MpeTranslator::with_pitch_bend_range(2.0);
        run(&mut mpe, &[0xE3, 0x00, 0x00]);
        let events = run(&mut mpe, &[0x93, 69, 64]);
        match events[..] {
            [NoteEvent::NoteOn { frequency, .. }] => {
                // Full downward bend of two semitones.
                assert!((frequency - midi_to_freq(67.0)).abs() < 0.5);
            }
            _ => panic!("unexpected events {events:?}"),
        }
    }

    #[test]
    fn test_channel_controls_stay_on_channel() {
        let mut mpe = MpeTranslator::new();
        run(&mut mpe, &[0x90, 60, 100]);
        run(&mut mpe, &[0x91, 64, 100]);
        let events = run(&mut mpe, &[0xD1, 127]);
        assert_eq!(
            events,
            vec![NoteEvent::PressureChanged {
                id: note_id(1, 64),
                pressure: 1.0
            }]
        );
        let events = run(&mut mpe, &[0xB0, CC_TIMBRE, 0]);
        assert_eq!(
            events,
            vec![NoteEvent::TimbreChanged {
                id: note_id(0, 60),
                timbre: 0.0
            }]
        );
    }

    #[test]
    fn test_poly_aftertouch() {
        let mut mpe = MpeTranslator::new();
        run(&mut mpe, &[0x90, 60, 100]);
        assert!(run(&mut mpe, &[0xA0, 61, 50]).is_empty());
        assert_eq!(run(&mut mpe, &[0xA0, 60, 0]).len(), 1);
    }

    #[test]
    fn test_timbre_remembered_for_new_notes() {
        let mut mpe = MpeTranslator::new();
        run(&mut mpe, &[0xB4, CC_TIMBRE, 127]);
        match run(&mut mpe, &[0x94, 60, 100])[..] {
            [NoteEvent::NoteOn { timbre, .. }] => assert!((timbre - 1.0).abs() < 1e-6),
            ref other => panic!("unexpected events {other:?}"),
        }
    }

    #[test]
    fn test_sustain_pedal_defers_note_off() {
        let mut mpe = MpeTranslator::new();
        run(&mut mpe, &[0x90, 60, 100]);
        run(&mut mpe, &[0xB0, CC_SUSTAIN, 127]);
        assert!(run(&mut mpe, &[0x80, 60, 0]).is_empty());
        assert_eq!(mpe.key_state(0, 60), KeyState::Sustained);

        let events = run(&mut mpe, &[0xB0, CC_SUSTAIN, 0]);
        assert_eq!(events, vec![NoteEvent::note_off(60)]);
        assert_eq!(mpe.key_state(0, 60), KeyState::Off);
    }

    #[test]
    fn test_all_notes_off() {
        let mut mpe = MpeTranslator::new();
        run(&mut mpe, &[0x90, 60, 100]);
        run(&mut mpe, &[0x95, 62, 100]);
        assert_eq!(mpe.held_notes(), 2);
        assert_eq!(
            run(&mut mpe, &[0xB0, CC_ALL_NOTES_OFF, 0]),
            vec![NoteEvent::AllNotesOff]
        );
        assert_eq!(mpe.held_notes(), 0);
    }

    #[test]
    fn test_malformed_input_is_an_error() {
        let mut mpe = MpeTranslator::new();
        assert!(mpe.translate(&[0x90, 60], |_| {}).is_err());
        assert!(mpe.translate(&[], |_| {}).is_err());
    }

    #[test]
    fn test_system_messages_ignored() {
        let mut mpe = MpeTranslator::new();
        // Timing clock.
        assert!(run(&mut mpe, &[0xF8]).is_empty());
    }

    #[test]
    fn test_reset() {
        let mut mpe = MpeTranslator::new();
        run(&mut mpe, &[0x90, 60, 100]);
        mpe.reset();
        assert_eq!(mpe.held_notes(), 0);
    }
}
