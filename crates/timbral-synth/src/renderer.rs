//! Sample-accurate offline rendering.
//!
//! The live path applies queued events at block boundaries. For offline
//! work [`OfflineRenderer`] instead splits blocks at each event's frame and
//! dispatches the event directly, so every event lands on its exact sample.

use crate::engine::SynthEngine;
use crate::event::NoteEvent;

/// An event scheduled at an absolute frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimedEvent {
    /// Frame index from the start of the render.
    pub frame: u64,
    /// Event to apply.
    pub event: NoteEvent,
}

impl TimedEvent {
    /// Schedule `event` at `frame`.
    pub fn new(frame: u64, event: NoteEvent) -> Self {
        Self { frame, event }
    }
}

/// Drives a [`SynthEngine`] through a timeline of events.
#[derive(Debug)]
pub struct OfflineRenderer {
    channels: usize,
    block_size: usize,
    buffer: Vec<f32>,
}

impl OfflineRenderer {
    /// A renderer emitting blocks of at most `block_size` frames.
    ///
    /// Zero values are raised to 1.
    pub fn new(channels: usize, block_size: usize) -> Self {
        let channels = channels.max(1);
        let block_size = block_size.max(1);
        Self {
            channels,
            block_size,
            buffer: vec![0.0; channels * block_size],
        }
    }

    /// Output channel count.
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Render `total_frames` frames, handing each interleaved chunk to
    /// `on_block`.
    ///
    /// Events are applied in frame order; ties keep their given order.
    /// Events at or beyond `total_frames` are dropped. Returns the number of
    /// events applied.
    pub fn render<F>(
        &mut self,
        engine: &mut SynthEngine,
        mut events: Vec<TimedEvent>,
        total_frames: u64,
        mut on_block: F,
    ) -> usize
    where
        F: FnMut(&[f32]),
    {
        events.sort_by_key(|e| e.frame);
        let mut pending = events.into_iter().peekable();
        let mut applied = 0;
        let mut frame = 0u64;

        while frame < total_frames {
            while let Some(timed) = pending.next_if(|e| e.frame <= frame) {
                engine.dispatch(timed.event);
                applied += 1;
            }

            let until_event = pending.peek().map_or(u64::MAX, |e| e.frame - frame);
            let n = (self.block_size as u64)
                .min(total_frames - frame)
                .min(until_event) as usize;

            let chunk = &mut self.buffer[..n * self.channels];
            engine.render_block(chunk, self.channels, n);
            on_block(chunk);
            frame += n as u64;
        }
        applied
    }
}
