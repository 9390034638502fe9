#![doc = r#"
Error taxonomy for the engine.

Hard failures surface as [`SmfError`] from the fallible operations on
[`MidiFile`](crate::file::MidiFile). Recoverable problems found mid-stream
never abort anything: they are wrapped in [`SoftError`] and handed to the
host through [`EventSink::soft_error`](crate::host::EventSink::soft_error)
while the engine resynchronizes and keeps going.
"#]

use crate::file::{FileState, MAX_TRACKS};
use thiserror::Error;

/// A structural problem with the file image itself.
///
/// Any of these found while loading aborts the whole load; no partial file
/// is left open.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FormatError {
    /// A chunk started with the wrong 4-byte magic.
    #[error("bad chunk magic: expected {expected:?}, found {found:02X?}")]
    BadMagic {
        /// The magic that should have been present.
        expected: &'static str,
        /// The four bytes actually read.
        found: [u8; 4],
    },
    /// The header chunk declared a length other than 6.
    #[error("header chunk length is {0}, expected 6")]
    BadHeaderLength(u32),
    /// The header `format` field was not 0, 1 or 2.
    #[error("unsupported file format {0} (expected 0, 1 or 2)")]
    UnsupportedFormat(u16),
    /// An SMPTE division carried a frame rate other than -24, -25, -29 or -30.
    #[error("SMPTE division has invalid frame rate {0}")]
    InvalidSmpteRate(i8),
    /// The stream ended in the middle of a chunk.
    #[error("truncated chunk: wanted {wanted} bytes, got {got}")]
    Truncated {
        /// Bytes the chunk still owed.
        wanted: usize,
        /// Bytes actually available.
        got: usize,
    },
}

/// A malformed construct inside otherwise well-formed track data.
///
/// These are reported to the host and then skipped; decoding continues at
/// the next parseable byte. The one exception is [`UnterminatedSysex`] on
/// the write path, which rejects the offending message outright.
///
/// [`UnterminatedSysex`]: ProtocolError::UnterminatedSysex
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolError {
    /// A system-exclusive message with no `0xF7` terminator.
    #[error("sysex message has no 0xF7 terminator")]
    UnterminatedSysex,
    /// A data byte arrived with no running status to interpret it under.
    #[error("data byte 0x{0:02X} with no running status")]
    OrphanData(u8),
    /// One of the undefined system statuses (`0xF4`, `0xF5`, `0xFD`).
    #[error("undefined system status 0x{0:02X}")]
    UndefinedStatus(u8),
    /// A meta event of a type this engine does not know.
    ///
    /// Always safely skippable thanks to the length prefix.
    #[error("unknown meta event type 0x{0:02X}")]
    UnknownMeta(u8),
    /// The track data ended in the middle of an event.
    #[error("event truncated by end of track data")]
    TruncatedEvent,
    /// An SMPTE offset field outside its legal range.
    #[error("SMPTE offset {field} is {value}, out of range")]
    SmpteField {
        /// Which field was out of range.
        field: &'static str,
        /// The offending value.
        value: u8,
    },
    /// A write was stamped earlier than the track's current position.
    #[error("event at tick {tick} is earlier than the track position {track_time}")]
    NonMonotonicTime {
        /// The timestamp the caller supplied.
        tick: u64,
        /// Where the track already is.
        track_time: u64,
    },
}

/// An operation was attempted while the file was in the wrong state.
///
/// Always recoverable: the file is left exactly as it was.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum StateError {
    /// The file state machine was not where the operation needs it.
    #[error("operation requires the {required} state, but the file is {actual}")]
    WrongState {
        /// State the operation runs in.
        required: FileState,
        /// State the file was actually in.
        actual: FileState,
    },
    /// A track index at or beyond the supported maximum.
    #[error("track {0} is out of range ({max} tracks supported)", max = MAX_TRACKS)]
    TrackOutOfRange(usize),
    /// The track already received its end-of-track event.
    #[error("track {0} is already finalized")]
    TrackClosed(usize),
}

/// A file declared more tracks than the engine supports.
///
/// Recovered by clamping: the first [`MAX_TRACKS`] tracks load, the rest are
/// dropped, and this is reported to the host.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("file declares {declared} tracks, keeping the first {kept}")]
pub struct OverflowError {
    /// Track count from the header.
    pub declared: u16,
    /// Track count actually kept.
    pub kept: u16,
}

/// A recoverable problem surfaced to the host mid-operation.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SoftError {
    /// More tracks than supported; excess dropped.
    #[error(transparent)]
    Overflow(#[from] OverflowError),
    /// A malformed construct that was skipped.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

/// Any hard failure an engine operation can return.
#[derive(Debug, Error)]
pub enum SmfError {
    /// The file image is structurally broken.
    #[error("malformed file: {0}")]
    Format(#[from] FormatError),
    /// A protocol violation severe enough to fail the operation.
    #[error("protocol violation: {0}")]
    Protocol(#[from] ProtocolError),
    /// Wrong file state for the operation.
    #[error(transparent)]
    State(#[from] StateError),
    /// The underlying stream failed; the file transitions back to Reset.
    #[error("stream error: {0}")]
    Io(#[from] std::io::Error),
}

/// The result type used by every fallible engine operation.
pub type SmfResult<T> = Result<T, SmfError>;
