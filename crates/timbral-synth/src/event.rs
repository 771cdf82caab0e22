//! Note gesture events delivered to the engine.
//!
//! Every expressive note is identified by a [`NoteId`] chosen by the event
//! source. An id stays valid from its `NoteOn` until its `NoteOff`; events
//! for ids that no voice holds are ignored.

use core::fmt;

/// Identifier of one sounding gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NoteId(pub u32);

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Physical state of the key behind a gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyState {
    /// Finger on the key.
    Down,
    /// Finger lifted but held by the sustain pedal.
    Sustained,
    /// Released.
    #[default]
    Off,
}

/// The closed set of events the voice pool understands.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NoteEvent {
    /// Start a gesture.
    NoteOn {
        /// Gesture identifier.
        id: NoteId,
        /// Initial pitch in Hz.
        frequency: f32,
        /// Initial pressure, 0 to 1.
        pressure: f32,
        /// Initial timbre, 0 to 1.
        timbre: f32,
    },
    /// End a gesture; the voice enters its release.
    NoteOff {
        /// Gesture identifier.
        id: NoteId,
    },
    /// New pressure for a sounding gesture.
    PressureChanged {
        /// Gesture identifier.
        id: NoteId,
        /// Pressure, 0 to 1.
        pressure: f32,
    },
    /// New pitch for a sounding gesture.
    PitchChanged {
        /// Gesture identifier.
        id: NoteId,
        /// Pitch in Hz.
        frequency: f32,
    },
    /// New timbre for a sounding gesture.
    TimbreChanged {
        /// Gesture identifier.
        id: NoteId,
        /// Timbre, 0 to 1.
        timbre: f32,
    },
    /// Release every voice.
    AllNotesOff,
}

impl NoteEvent {
    /// Shorthand for [`NoteEvent::NoteOn`].
    pub fn note_on(id: u32, frequency: f32, pressure: f32, timbre: f32) -> Self {
        NoteEvent::NoteOn {
            id: NoteId(id),
            frequency,
            pressure,
            timbre,
        }
    }

    /// Shorthand for [`NoteEvent::NoteOff`].
    pub fn note_off(id: u32) -> Self {
        NoteEvent::NoteOff { id: NoteId(id) }
    }

    /// The gesture this event addresses, if any.
    pub fn id(&self) -> Option<NoteId> {
        match *self {
            NoteEvent::NoteOn { id, .. }
            | NoteEvent::NoteOff { id }
            | NoteEvent::PressureChanged { id, .. }
            | NoteEvent::PitchChanged { id, .. }
            | NoteEvent::TimbreChanged { id, .. } => Some(id),
            NoteEvent::AllNotesOff => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_accessor() {
        assert_eq!(NoteEvent::note_on(3, 440.0, 1.0, 0.0).id(), Some(NoteId(3)));
        assert_eq!(
            NoteEvent::TimbreChanged {
                id: NoteId(9),
                timbre: 0.2
            }
            .id(),
            Some(NoteId(9))
        );
        assert_eq!(NoteEvent::AllNotesOff.id(), None);
    }

    #[test]
    fn test_note_id_display() {
        assert_eq!(format!("{}", NoteId(42)), "#42");
    }
}
