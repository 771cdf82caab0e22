//! Score files: timed note events for offline rendering.
//!
//! ```toml
//! name = "Two Notes"
//! patch = "soft_pad"
//! sample_rate = 48000
//! duration = 3.0
//!
//! [[events]]
//! at = 0.0
//! type = "note_on"
//! id = 1
//! note = 57
//!
//! [[events]]
//! at = 0.5
//! type = "pitch"
//! id = 1
//! note = 57.5
//!
//! [[events]]
//! at = 1.5
//! type = "note_off"
//! id = 1
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use timbral_core::midi_to_freq;
use timbral_synth::{NoteEvent, NoteId, TimedEvent};

use crate::error::ConfigError;
use crate::validation::{ValidationError, ValidationResult};

/// Pressure of a `note_on` event that names none.
pub const DEFAULT_NOTE_PRESSURE: f32 = 1.0;

/// Timbre of a `note_on` event that names none.
pub const DEFAULT_NOTE_TIMBRE: f32 = 0.5;

/// Seconds rendered after the last event when no duration is given.
pub const DEFAULT_TAIL: f64 = 1.0;

/// A list of timed events plus render settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Score {
    /// Name of the score.
    #[serde(default = "default_name")]
    pub name: String,

    /// Patch to render with, by factory name, user name or path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patch: Option<String>,

    /// Sample rate hint for the render.
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    /// Output channel count.
    #[serde(default = "default_channels")]
    pub channels: u16,

    /// Total length in seconds. When absent, the last event plus `tail`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,

    /// Seconds rendered past the last event when `duration` is absent.
    #[serde(default = "default_tail")]
    pub tail: f64,

    /// The events, in any order.
    #[serde(default)]
    pub events: Vec<ScoreEvent>,
}

fn default_name() -> String {
    "Untitled".to_string()
}

fn default_sample_rate() -> u32 {
    48000
}

fn default_channels() -> u16 {
    2
}

fn default_tail() -> f64 {
    DEFAULT_TAIL
}

/// Kind of a [`ScoreEvent`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ScoreEventKind {
    /// Start a note. Needs `note` or `frequency`.
    NoteOn,
    /// Release a note.
    NoteOff,
    /// Change pressure. Needs `pressure`.
    Pressure,
    /// Change pitch. Needs `note` or `frequency`.
    Pitch,
    /// Change timbre. Needs `timbre`.
    Timbre,
    /// Release everything.
    AllNotesOff,
}

impl ScoreEventKind {
    /// Name as written in score files.
    pub const fn name(self) -> &'static str {
        match self {
            ScoreEventKind::NoteOn => "note_on",
            ScoreEventKind::NoteOff => "note_off",
            ScoreEventKind::Pressure => "pressure",
            ScoreEventKind::Pitch => "pitch",
            ScoreEventKind::Timbre => "timbre",
            ScoreEventKind::AllNotesOff => "all_notes_off",
        }
    }
}

/// One `[[events]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoreEvent {
    /// Time in seconds from the start.
    pub at: f64,

    /// What happens.
    #[serde(rename = "type")]
    pub kind: ScoreEventKind,

    /// Note identifier linking on, off and modulation events.
    #[serde(default)]
    pub id: u32,

    /// Pitch as a MIDI note number; fractions are allowed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<f32>,

    /// Pitch in Hz. Takes precedence over `note`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency: Option<f32>,

    /// Pressure, 0 to 1.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pressure: Option<f32>,

    /// Timbre, 0 to 1.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timbre: Option<f32>,
}

impl ScoreEvent {
    /// An event with no optional fields set.
    pub fn new(at: f64, kind: ScoreEventKind, id: u32) -> Self {
        Self {
            at,
            kind,
            id,
            note: None,
            frequency: None,
            pressure: None,
            timbre: None,
        }
    }

    /// Set the MIDI note.
    pub fn with_note(mut self, note: f32) -> Self {
        self.note = Some(note);
        self
    }

    /// Set the pressure.
    pub fn with_pressure(mut self, pressure: f32) -> Self {
        self.pressure = Some(pressure);
        self
    }

    /// Set the timbre.
    pub fn with_timbre(mut self, timbre: f32) -> Self {
        self.timbre = Some(timbre);
        self
    }

    fn pitch(&self) -> Option<f32> {
        self.frequency.or_else(|| self.note.map(midi_to_freq))
    }

    /// Convert to an engine event. `index` only labels errors.
    ///
    /// Pitches must be finite and positive; pressure and timbre must lie in
    /// `[0, 1]`. The Nyquist limit depends on the render rate and is checked
    /// by [`Score::timed_events`].
    pub fn to_note_event(&self, index: usize) -> ValidationResult<NoteEvent> {
        let kind = self.kind.name();
        let missing = |field| ValidationError::MissingField {
            index,
            kind: kind.to_string(),
            field,
        };
        let unit = |field: &str, value: f32| {
            if (0.0..=1.0).contains(&value) {
                Ok(value)
            } else {
                Err(ValidationError::InvalidScore(format!(
                    "event {index} ({kind}) has {field} {value}, expected 0 to 1"
                )))
            }
        };
        let pitch = || -> ValidationResult<f32> {
            let hz = self.pitch().ok_or_else(|| missing("note"))?;
            if hz.is_finite() && hz > 0.0 {
                Ok(hz)
            } else {
                Err(ValidationError::InvalidScore(format!(
                    "event {index} ({kind}) has pitch {hz} Hz"
                )))
            }
        };

        let id = NoteId(self.id);
        Ok(match self.kind {
            ScoreEventKind::NoteOn => NoteEvent::NoteOn {
                id,
                frequency: pitch()?,
                pressure: unit("pressure", self.pressure.unwrap_or(DEFAULT_NOTE_PRESSURE))?,
                timbre: unit("timbre", self.timbre.unwrap_or(DEFAULT_NOTE_TIMBRE))?,
            },
            ScoreEventKind::NoteOff => NoteEvent::NoteOff { id },
            ScoreEventKind::Pressure => NoteEvent::PressureChanged {
                id,
                pressure: unit("pressure", self.pressure.ok_or_else(|| missing("pressure"))?)?,
            },
            ScoreEventKind::Pitch => NoteEvent::PitchChanged {
                id,
                frequency: pitch()?,
            },
            ScoreEventKind::Timbre => NoteEvent::TimbreChanged {
                id,
                timbre: unit("timbre", self.timbre.ok_or_else(|| missing("timbre"))?)?,
            },
            ScoreEventKind::AllNotesOff => NoteEvent::AllNotesOff,
        })
    }
}

impl Score {
    /// An empty score.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            patch: None,
            sample_rate: default_sample_rate(),
            channels: default_channels(),
            duration: None,
            tail: DEFAULT_TAIL,
            events: Vec::new(),
        }
    }

    /// Add an event.
    pub fn with_event(mut self, event: ScoreEvent) -> Self {
        self.events.push(event);
        self
    }

    /// Load a score from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        Self::from_toml(&content)
    }

    /// Load a score from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Save the score to a TOML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))
    }

    /// Serialize the score to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Length in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.duration.unwrap_or_else(|| {
            let last = self.events.iter().map(|e| e.at).fold(0.0, f64::max);
            last + self.tail.max(0.0)
        })
    }

    /// Length in frames at `sample_rate`.
    pub fn total_frames(&self, sample_rate: u32) -> u64 {
        seconds_to_frames(self.duration_secs(), sample_rate)
    }

    /// Convert every event to a frame-stamped engine event, reporting every
    /// bad entry.
    ///
    /// Besides the checks of [`ScoreEvent::to_note_event`], pitches must stay
    /// below half of `sample_rate`.
    pub fn timed_events(&self, sample_rate: u32) -> ValidationResult<Vec<TimedEvent>> {
        let nyquist = f64::from(sample_rate) / 2.0;
        let mut errors = Vec::new();
        let mut timed = Vec::with_capacity(self.events.len());

        if let Some(d) = self.duration
            && !(d.is_finite() && d >= 0.0)
        {
            errors.push(ValidationError::InvalidScore(format!(
                "duration {d} is not a non-negative number"
            )));
        }

        for (index, event) in self.events.iter().enumerate() {
            if !(event.at.is_finite() && event.at >= 0.0) {
                errors.push(ValidationError::InvalidScore(format!(
                    "event {index} has time {}",
                    event.at
                )));
                continue;
            }
            match event.to_note_event(index) {
                Ok(
                    NoteEvent::NoteOn { frequency, .. } | NoteEvent::PitchChanged { frequency, .. },
                ) if f64::from(frequency) >= nyquist => {
                    errors.push(ValidationError::InvalidScore(format!(
                        "event {index} has pitch {frequency} Hz, at or above {nyquist} Hz"
                    )));
                }
                Ok(e) => timed.push(TimedEvent::new(seconds_to_frames(event.at, sample_rate), e)),
                Err(e) => errors.push(e),
            }
        }

        match errors.len() {
            0 => Ok(timed),
            1 => Err(errors.remove(0)),
            _ => Err(ValidationError::Multiple(errors)),
        }
    }
}

fn seconds_to_frames(seconds: f64, sample_rate: u32) -> u64 {
    (seconds.max(0.0) * f64::from(sample_rate)).round() as u64
}
