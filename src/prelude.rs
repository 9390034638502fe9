//! Re-exports everything a host typically needs.

pub use crate::{
    error::{
        FormatError, OverflowError, ProtocolError, SmfError, SmfResult, SoftError, StateError,
    },
    event::{
        ChannelVoiceEvent, Event, KeySignature, MetaEvent, SmpteOffset, SystemEvent, Tempo,
        TimeSignature, VoiceMessage,
    },
    file::{
        Division, FileState, Format, HeaderChunk, MAX_TRACKS, MidiFile, SmpteFps, TrackChunk,
        TrackSelector,
    },
    host::{EventSink, NullSink},
    vlq,
};
