#![doc = r#"
The file state machine and its parts.

A [`MidiFile`] is always in one of three states:

```text
          open_read              open_write
  Reset ------------> Reading      Writing <------------ Reset
    ^                    |            |                    ^
    |       close        |            |    flush / close   |
    +--------------------+            +--------------------+
```

Reading loads the header and every track chunk eagerly, then the host
drives playback one tick at a time. Writing accumulates composed events per
track until a flush assembles the complete file image. Calling an operation
in the wrong state is a [`StateError`](crate::error::StateError), never a
crash, and leaves the file untouched.
"#]

mod header;
pub use header::*;

pub(crate) mod chunk;

mod track;
pub use track::*;

mod scheduler;
pub(crate) use scheduler::Scheduler;

use crate::{
    error::{OverflowError, SmfError, SmfResult, SoftError, StateError},
    host::EventSink,
    writer::Writer,
};
use core::fmt;
use std::io::{Read, Write};

/// The most tracks a single file may carry. Excess tracks in a header are
/// clamped, not fatal.
pub const MAX_TRACKS: usize = 128;

/// Which mode a [`MidiFile`] is currently in.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FileState {
    /// No file open.
    #[default]
    Reset,
    /// A file is loaded and the scheduler is active.
    Reading,
    /// Composed events are being accumulated for assembly.
    Writing,
}

impl fmt::Display for FileState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Reset => "Reset",
            Self::Reading => "Reading",
            Self::Writing => "Writing",
        })
    }
}

/// Governs which tracks report their events during playback.
///
/// Unselected tracks still advance their cursors identically; only the
/// reporting side effect differs.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TrackSelector {
    /// Every track reports.
    #[default]
    All,
    /// Only this track index reports.
    Solo(usize),
}

impl TrackSelector {
    pub(crate) const fn selects(&self, index: usize) -> bool {
        match self {
            Self::All => true,
            Self::Solo(i) => *i == index,
        }
    }
}

#[derive(Debug)]
enum State {
    Reset,
    Reading {
        header: HeaderChunk,
        scheduler: Scheduler,
    },
    Writing(Writer),
}

/// A Standard MIDI File, open for reading or writing.
///
/// Exactly one file is open per instance at a time; opening another one
/// discards everything about the previous file.
#[derive(Debug, Default)]
pub struct MidiFile {
    state: State,
}

impl Default for State {
    fn default() -> Self {
        Self::Reset
    }
}

impl MidiFile {
    /// A file in the Reset state.
    pub fn new() -> Self {
        Self::default()
    }

    /// The current state of the file state machine.
    pub const fn state(&self) -> FileState {
        match self.state {
            State::Reset => FileState::Reset,
            State::Reading { .. } => FileState::Reading,
            State::Writing(_) => FileState::Writing,
        }
    }

    /// Loads a complete file from `r` and transitions to Reading.
    ///
    /// The header and every track buffer are read eagerly; there is no
    /// streaming. On success the header is reported through the sink. On
    /// any failure the file is left in Reset with no partial state.
    pub fn open_read<R: Read, S: EventSink>(&mut self, mut r: R, sink: &mut S) -> SmfResult<()> {
        self.state = State::Reset;

        let header = chunk::read_header(&mut r)?;
        if header.declared_ntrks() > header.ntrks() {
            sink.soft_error(
                None,
                &SoftError::Overflow(OverflowError {
                    declared: header.declared_ntrks(),
                    kept: header.ntrks(),
                }),
            );
        }
        let tracks = chunk::read_all_tracks(&mut r, header.ntrks())?;
        let header = header.with_loaded_tracks(tracks.len() as u16);

        sink.header(&header);
        self.state = State::Reading {
            header,
            scheduler: Scheduler::new(tracks),
        };
        Ok(())
    }

    /// Discards any open file and transitions to Writing.
    ///
    /// Track buffers are allocated lazily on the first write to each index.
    pub fn open_write(&mut self, division: Division) {
        self.state = State::Writing(Writer::new(division));
    }

    /// Discards everything and returns to Reset.
    pub fn close(&mut self) {
        self.state = State::Reset;
    }

    /// The header of the file being read.
    pub const fn header(&self) -> Option<&HeaderChunk> {
        match &self.state {
            State::Reading { header, .. } => Some(header),
            _ => None,
        }
    }

    /// The global clock, in ticks. Zero unless a file is being read.
    pub const fn clock(&self) -> u64 {
        match &self.state {
            State::Reading { scheduler, .. } => scheduler.clock(),
            _ => 0,
        }
    }

    /// The track cursors of the file being read. Empty otherwise.
    pub fn tracks(&self) -> &[TrackChunk] {
        match &self.state {
            State::Reading { scheduler, .. } => scheduler.tracks(),
            _ => &[],
        }
    }

    /// The current track selection.
    pub const fn selector(&self) -> TrackSelector {
        match &self.state {
            State::Reading { scheduler, .. } => scheduler.selector(),
            _ => TrackSelector::All,
        }
    }

    /// Fires every event due at the current tick, then advances the clock
    /// by one. Requires Reading.
    pub fn tick<S: EventSink>(&mut self, sink: &mut S) -> SmfResult<()> {
        self.reading()?.tick(sink);
        Ok(())
    }

    /// Jumps to absolute `tick` without reporting any event on the way.
    /// Requires Reading.
    pub fn seek<S: EventSink>(&mut self, tick: u64, sink: &mut S) -> SmfResult<()> {
        self.reading()?.seek(tick, sink);
        Ok(())
    }

    /// Rewinds every track and the clock to zero. Requires Reading.
    pub fn rewind<S: EventSink>(&mut self, sink: &mut S) -> SmfResult<()> {
        self.reading()?.rewind(sink);
        Ok(())
    }

    /// Chooses which tracks report during playback. Requires Reading.
    pub fn select_track(&mut self, selector: TrackSelector) -> SmfResult<()> {
        self.reading()?.select(selector);
        Ok(())
    }

    /// Appends a composed event to `track` at absolute `tick`.
    /// Requires Writing.
    ///
    /// Returns the number of bytes buffered for the event, delta-time
    /// included.
    pub fn write_event(&mut self, track: usize, tick: u64, raw: &[u8]) -> SmfResult<usize> {
        self.writing()?.write_event(track, tick, raw)
    }

    /// Ends `track` at `end_tick` and closes it to further writes.
    /// Requires Writing.
    pub fn finalize_track(&mut self, track: usize, end_tick: u64) -> SmfResult<usize> {
        self.writing()?.finalize(track, end_tick)
    }

    /// Finalizes every open track at `end_tick`, assembles the complete
    /// file image into `out`, and returns to Reset. Requires Writing.
    ///
    /// Returns the number of bytes written. The file resets even when the
    /// output stream fails.
    pub fn flush<W: Write, S: EventSink>(
        &mut self,
        out: &mut W,
        end_tick: u64,
        sink: &mut S,
    ) -> SmfResult<u64> {
        let writer = self.writing()?;
        writer.finalize_open_tracks(end_tick)?;
        let result = writer.assemble(out);
        self.state = State::Reset;
        let written = result?;
        sink.time(end_tick);
        log::debug!("flushed {written} bytes");
        Ok(written)
    }

    /// Logs a human-readable listing of one track, or all tracks, without
    /// touching playback state. Requires Reading.
    pub fn dump(&self, track: Option<usize>) -> SmfResult<()> {
        let State::Reading { scheduler, .. } = &self.state else {
            return Err(self.wrong_state(FileState::Reading));
        };
        let tracks = scheduler.tracks();
        let indices: Vec<usize> = match track {
            Some(i) if i < tracks.len() => vec![i],
            _ => (0..tracks.len()).collect(),
        };
        for i in indices {
            log::info!("parsing track[{i}]");
            let mut cursor = tracks[i].clone();
            cursor.rewind();
            loop {
                match cursor.decode_next() {
                    Ok(Some(event)) => {
                        let desc = event.to_string();
                        log::info!(
                            "track {i} tick {} delta {}: {desc}",
                            cursor.total_time(),
                            cursor.delta_time()
                        );
                    }
                    Ok(None) => break,
                    Err(e) => log::warn!("track {i}: {e}"),
                }
            }
        }
        Ok(())
    }

    fn reading(&mut self) -> Result<&mut Scheduler, SmfError> {
        let actual = self.state();
        match &mut self.state {
            State::Reading { scheduler, .. } => Ok(scheduler),
            _ => Err(StateError::WrongState {
                required: FileState::Reading,
                actual,
            }
            .into()),
        }
    }

    fn writing(&mut self) -> Result<&mut Writer, SmfError> {
        let actual = self.state();
        match &mut self.state {
            State::Writing(writer) => Ok(writer),
            _ => Err(StateError::WrongState {
                required: FileState::Writing,
                actual,
            }
            .into()),
        }
    }

    fn wrong_state(&self, required: FileState) -> SmfError {
        StateError::WrongState {
            required,
            actual: self.state(),
        }
        .into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::NullSink;

    #[test]
    fn operations_require_their_state() {
        let mut file = MidiFile::new();
        assert_eq!(file.state(), FileState::Reset);

        let err = file.tick(&mut NullSink).unwrap_err();
        assert!(matches!(
            err,
            SmfError::State(StateError::WrongState {
                required: FileState::Reading,
                actual: FileState::Reset,
            })
        ));

        file.open_write(Division::TicksPerQuarterNote(96));
        assert_eq!(file.state(), FileState::Writing);
        let err = file.seek(10, &mut NullSink).unwrap_err();
        assert!(matches!(
            err,
            SmfError::State(StateError::WrongState {
                required: FileState::Reading,
                actual: FileState::Writing,
            })
        ));

        file.close();
        assert_eq!(file.state(), FileState::Reset);
        let err = file.write_event(0, 0, &[0x90, 60, 64]).unwrap_err();
        assert!(matches!(err, SmfError::State(_)));
    }

    #[test]
    fn failed_open_leaves_reset() {
        let mut file = MidiFile::new();
        let bytes = *b"MThd\x00\x00\x00\x06";
        assert!(file.open_read(bytes.as_slice(), &mut NullSink).is_err());
        assert_eq!(file.state(), FileState::Reset);
        assert!(file.header().is_none());
        assert!(file.tracks().is_empty());
    }
}
