#![doc = r#"
The host callback surface.

The engine never talks to the outside world directly: everything it has to
say while reading a file goes through an [`EventSink`] supplied by the
host. This mirrors the classic three-outlet layout of sequencer objects
(decoded events, the running tick counter, and a status channel) as one
trait with default no-op methods, so a host implements only what it cares
about.
"#]

use crate::{error::SoftError, event::Event, file::HeaderChunk};

/// Receives everything the engine reports while a file is open for reading.
///
/// All methods default to doing nothing. The engine calls them
/// synchronously from whatever thread is driving it; implementations that
/// need to cross threads should forward into their own channel.
pub trait EventSink {
    /// Header fields, reported once per successful open.
    fn header(&mut self, header: &HeaderChunk) {
        let _ = header;
    }

    /// A decoded event from a selected track, due at `tick`.
    fn event(&mut self, track: usize, tick: u64, event: &Event<'_>) {
        let _ = (track, tick, event);
    }

    /// The clock after each advance or seek.
    fn time(&mut self, tick: u64) {
        let _ = tick;
    }

    /// Every track is exhausted. Fires once per end condition; rewinding
    /// arms it again.
    fn ended(&mut self) {}

    /// A recoverable problem the engine skipped past, with the track it
    /// occurred on when known.
    fn soft_error(&mut self, track: Option<usize>, error: &SoftError) {
        let _ = (track, error);
    }
}

/// Discards every callback. Handy when only the cursor state matters.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {}
