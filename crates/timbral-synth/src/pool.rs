//! Fixed-size voice pool and note-to-voice allocation.
//!
//! The pool owns every [`Voice`] for the lifetime of a prepared engine and
//! maps note ids onto them. All routing goes through [`VoicePool::dispatch`],
//! one `match` over [`NoteEvent`].
//!
//! ## Allocation
//!
//! 1. A note-on for an id that a voice already holds detaches that voice
//!    (it keeps its tail, anonymously) so at most one voice owns an id.
//! 2. The first free voice in pool order takes the note.
//! 3. With every voice busy, the [`StealPolicy`] picks a victim, or the
//!    note is dropped when stealing is disabled.
//!
//! Lookups are linear scans. Pools are small (tens of voices) and the scan
//! is bounded by the polyphony set at prepare time.

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

use timbral_core::RampCurve;

use crate::event::{NoteEvent, NoteId};
use crate::voice::{BlockParams, Voice, VoiceState};
use crate::wavetable::WavetableBank;

/// Which busy voice gives way when a note arrives at a full pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StealPolicy {
    /// Drop the new note.
    #[default]
    Never,
    /// Steal the voice assigned longest ago.
    Oldest,
    /// Steal the voice with the lowest envelope level (oldest on ties).
    Quietest,
    /// Steal the oldest releasing voice, falling back to the oldest overall.
    ReleasingFirst,
}

impl StealPolicy {
    /// Every policy.
    pub const ALL: [StealPolicy; 4] = [
        StealPolicy::Never,
        StealPolicy::Oldest,
        StealPolicy::Quietest,
        StealPolicy::ReleasingFirst,
    ];

    /// Lowercase name, as used in patch files.
    pub const fn name(self) -> &'static str {
        match self {
            StealPolicy::Never => "never",
            StealPolicy::Oldest => "oldest",
            StealPolicy::Quietest => "quietest",
            StealPolicy::ReleasingFirst => "releasing-first",
        }
    }
}

/// What [`VoicePool::dispatch`] did with an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Note-on took a free voice.
    Assigned {
        /// Pool index.
        voice: usize,
    },
    /// Note-on took a busy voice.
    Stolen {
        /// Pool index.
        voice: usize,
        /// Id the voice held before, if it was still attached.
        previous: Option<NoteId>,
    },
    /// Note-on found no voice and stealing is disabled.
    Dropped,
    /// A per-note event reached the voice holding its id.
    Forwarded {
        /// Pool index.
        voice: usize,
    },
    /// Every busy voice was released.
    ReleasedAll,
    /// No voice holds the event's id.
    Ignored,
}

/// Bounded set of voices with note-id routing.
#[derive(Debug, Clone)]
pub struct VoicePool {
    voices: Vec<Voice>,
    policy: StealPolicy,
    age_counter: u64,
}

impl VoicePool {
    /// Allocate `polyphony` free voices.
    ///
    /// Allocates; call from setup code only.
    pub fn new(
        polyphony: usize,
        sample_rate: f32,
        curve: RampCurve,
        smoothing_time: f32,
        policy: StealPolicy,
    ) -> Self {
        let mut voices = Vec::with_capacity(polyphony);
        voices.resize_with(polyphony, || Voice::new(sample_rate, curve, smoothing_time));
        Self {
            voices,
            policy,
            age_counter: 0,
        }
    }

    /// Route one event.
    pub fn dispatch(&mut self, event: NoteEvent) -> DispatchOutcome {
        match event {
            NoteEvent::NoteOn {
                id,
                frequency,
                pressure,
                timbre,
            } => self.note_on(id, frequency, pressure, timbre),
            NoteEvent::NoteOff { id } => self.forward(id, Voice::release),
            NoteEvent::PressureChanged { id, pressure } => {
                self.forward(id, |v| v.update_pressure(pressure))
            }
            NoteEvent::PitchChanged { id, frequency } => {
                self.forward(id, |v| v.update_pitch(frequency))
            }
            NoteEvent::TimbreChanged { id, timbre } => {
                self.forward(id, |v| v.update_timbre(timbre))
            }
            NoteEvent::AllNotesOff => {
                self.release_all();
                DispatchOutcome::ReleasedAll
            }
        }
    }

    fn note_on(&mut self, id: NoteId, frequency: f32, pressure: f32, timbre: f32) -> DispatchOutcome {
        if let Some(held) = self.find(id) {
            let voice = &mut self.voices[held];
            voice.detach_note();
            voice.release();
        }

        self.age_counter += 1;
        let age = self.age_counter;

        if let Some(index) = self.voices.iter().position(Voice::is_free) {
            self.voices[index].assign(id, frequency, pressure, timbre, age);
            return DispatchOutcome::Assigned { voice: index };
        }

        match self.steal_candidate() {
            Some(index) => {
                let voice = &mut self.voices[index];
                let previous = voice.note();
                voice.steal(id, frequency, pressure, timbre, age);
                DispatchOutcome::Stolen {
                    voice: index,
                    previous,
                }
            }
            None => DispatchOutcome::Dropped,
        }
    }

    fn forward(&mut self, id: NoteId, apply: impl FnOnce(&mut Voice)) -> DispatchOutcome {
        match self.find(id) {
            Some(index) => {
                apply(&mut self.voices[index]);
                DispatchOutcome::Forwarded { voice: index }
            }
            None => DispatchOutcome::Ignored,
        }
    }

    /// Index of the busy voice holding `id`.
    pub fn find(&self, id: NoteId) -> Option<usize> {
        self.voices
            .iter()
            .position(|v| v.note() == Some(id) && !v.is_free())
    }

    fn steal_candidate(&self) -> Option<usize> {
        let all = || self.voices.iter().enumerate();
        match self.policy {
            StealPolicy::Never => None,
            StealPolicy::Oldest => oldest(all()),
            StealPolicy::Quietest => all()
                .min_by(|(_, a), (_, b)| {
                    a.level()
                        .total_cmp(&b.level())
                        .then(a.age().cmp(&b.age()))
                })
                .map(|(i, _)| i),
            StealPolicy::ReleasingFirst => {
                oldest(all().filter(|(_, v)| v.state() == VoiceState::Releasing))
                    .or_else(|| oldest(all()))
            }
        }
    }

    /// Release every busy voice.
    pub fn release_all(&mut self) {
        for voice in &mut self.voices {
            voice.release();
        }
    }

    /// Add every voice's output into `out`, in pool order.
    pub fn render(
        &mut self,
        out: &mut [f32],
        channels: usize,
        start_frame: usize,
        num_frames: usize,
        block: &BlockParams,
        bank: &WavetableBank,
    ) {
        for voice in &mut self.voices {
            voice.render_block(out, channels, start_frame, num_frames, block, bank);
        }
    }

    /// Rebind every voice to a new sample rate.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        for voice in &mut self.voices {
            voice.set_sample_rate(sample_rate);
        }
    }

    /// Current stealing policy.
    pub fn policy(&self) -> StealPolicy {
        self.policy
    }

    /// Number of voices.
    pub fn polyphony(&self) -> usize {
        self.voices.len()
    }

    /// Number of voices whose envelope is running.
    pub fn active_count(&self) -> usize {
        self.voices.iter().filter(|v| !v.is_free()).count()
    }

    /// Read access to every voice.
    pub fn voices(&self) -> &[Voice] {
        &self.voices
    }
}

fn oldest<'a>(voices: impl Iterator<Item = (usize, &'a Voice)>) -> Option<usize> {
    voices.min_by_key(|(_, v)| v.age()).map(|(i, _)| i)
}
