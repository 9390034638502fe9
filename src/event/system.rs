use core::fmt;

/// System common and system real-time messages as they appear in a track.
///
/// Payload-carrying variants borrow from the track buffer they were decoded
/// from; nothing here is copied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemEvent<'a> {
    /// `0xF0`/`0xF7`: a system-exclusive packet.
    ///
    /// The payload is exactly the length-prefixed bytes from the file,
    /// without the leading status. Complete messages end with `0xF7`.
    SysEx(&'a [u8]),
    /// `0xF1`: MIDI time code quarter frame.
    QuarterFrame(u8),
    /// `0xF2`: song position pointer in MIDI beats.
    SongPosition(u16),
    /// `0xF3`: song selection.
    SongSelect(u8),
    /// `0xF6`: analog oscillator tune request.
    TuneRequest,
    /// `0xF8`: timing clock, 24 per quarter note.
    TimingClock,
    /// `0xF9`: tick, every 10 milliseconds.
    MidiTick,
    /// `0xFA`: start the sequence.
    Start,
    /// `0xFB`: continue the sequence.
    Continue,
    /// `0xFC`: stop the sequence.
    Stop,
    /// `0xFE`: active sensing keep-alive.
    ActiveSensing,
}

impl fmt::Display for SystemEvent<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SysEx(payload) => write!(f, "SysEx length {}", payload.len()),
            Self::QuarterFrame(v) => write!(f, "QuarterFrame {v}"),
            Self::SongPosition(v) => write!(f, "SongPosition {v}"),
            Self::SongSelect(v) => write!(f, "SongSelect {v}"),
            Self::TuneRequest => f.write_str("TuneRequest"),
            Self::TimingClock => f.write_str("TimingClock"),
            Self::MidiTick => f.write_str("MidiTick"),
            Self::Start => f.write_str("Start"),
            Self::Continue => f.write_str("Continue"),
            Self::Stop => f.write_str("Stop"),
            Self::ActiveSensing => f.write_str("ActiveSensing"),
        }
    }
}
