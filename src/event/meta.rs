//! Meta events: non-wire events embedded in a track, type-tagged and
//! length-prefixed.

use crate::{error::ProtocolError, file::SmpteFps};
use core::fmt;

/// A decoded meta event (status `0xFF`).
///
/// Text-family variants borrow the raw bytes from the track buffer; call
/// [`MetaEvent::text`] for a lossy UTF-8 view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetaEvent<'a> {
    /// `0x00`: the sequence number of this track or pattern.
    SequenceNumber(u16),
    /// `0x01`: free text.
    Text(&'a [u8]),
    /// `0x02`: copyright notice.
    Copyright(&'a [u8]),
    /// `0x03`: sequence or track name.
    TrackName(&'a [u8]),
    /// `0x04`: instrument name.
    InstrumentName(&'a [u8]),
    /// `0x05`: lyric syllable.
    Lyric(&'a [u8]),
    /// `0x06`: rehearsal or section marker.
    Marker(&'a [u8]),
    /// `0x07`: cue point.
    CuePoint(&'a [u8]),
    /// `0x20`: channel prefix for the following events.
    ChannelPrefix(u8),
    /// `0x21`: port or cable number (unofficial but common).
    Port(u8),
    /// `0x2F`: end of track. Exhausts the track that carries it.
    EndOfTrack,
    /// `0x51`: tempo change.
    Tempo(Tempo),
    /// `0x54`: SMPTE start time of the track.
    SmpteOffset(SmpteOffset),
    /// `0x58`: time signature.
    TimeSignature(TimeSignature),
    /// `0x59`: key signature.
    KeySignature(KeySignature),
}

impl<'a> MetaEvent<'a> {
    /// Decodes the payload of meta type `ty`.
    ///
    /// The caller has already consumed the length prefix, so an unknown type
    /// or a payload shorter than its type requires is recoverable: the error
    /// is reported and the cursor has skipped the construct either way.
    pub(crate) fn parse(ty: u8, data: &'a [u8]) -> Result<Self, ProtocolError> {
        let event = match ty {
            0x00 => Self::SequenceNumber(u16::from_be_bytes(take::<2>(data)?)),
            0x01 => Self::Text(data),
            0x02 => Self::Copyright(data),
            0x03 => Self::TrackName(data),
            0x04 => Self::InstrumentName(data),
            0x05 => Self::Lyric(data),
            0x06 => Self::Marker(data),
            0x07 => Self::CuePoint(data),
            0x20 => Self::ChannelPrefix(take::<1>(data)?[0]),
            0x21 => Self::Port(take::<1>(data)?[0]),
            0x2F => Self::EndOfTrack,
            0x51 => {
                let [a, b, c] = take::<3>(data)?;
                Self::Tempo(Tempo::new(u32::from_be_bytes([0, a, b, c])))
            }
            0x54 => Self::SmpteOffset(SmpteOffset::parse(data)?),
            0x58 => {
                let [nn, dd, cc, bb] = take::<4>(data)?;
                Self::TimeSignature(TimeSignature {
                    numerator: nn,
                    denominator_exponent: dd,
                    clocks_per_click: cc,
                    thirty_seconds_per_quarter: bb,
                })
            }
            0x59 => {
                let [sf, mi] = take::<2>(data)?;
                Self::KeySignature(KeySignature {
                    accidentals: sf as i8,
                    minor: mi != 0,
                })
            }
            other => return Err(ProtocolError::UnknownMeta(other)),
        };
        Ok(event)
    }

    /// The raw bytes of a text-family event, if this is one.
    pub const fn text_bytes(&self) -> Option<&'a [u8]> {
        match self {
            Self::Text(b)
            | Self::Copyright(b)
            | Self::TrackName(b)
            | Self::InstrumentName(b)
            | Self::Lyric(b)
            | Self::Marker(b)
            | Self::CuePoint(b) => Some(b),
            _ => None,
        }
    }

    /// A lossy UTF-8 view of a text-family event.
    pub fn text(&self) -> Option<std::borrow::Cow<'a, str>> {
        self.text_bytes().map(String::from_utf8_lossy)
    }
}

/// Reads the first `N` bytes of a meta payload.
fn take<const N: usize>(data: &[u8]) -> Result<[u8; N], ProtocolError> {
    data.get(..N)
        .and_then(|b| b.try_into().ok())
        .ok_or(ProtocolError::TruncatedEvent)
}

/// A tempo in microseconds per quarter note, as stored in the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tempo(u32);

impl Tempo {
    /// 120 beats per minute, the default when a file sets no tempo.
    pub const DEFAULT: Self = Self(500_000);

    /// Creates a tempo from microseconds per quarter note.
    pub const fn new(micros_per_quarter_note: u32) -> Self {
        Self(micros_per_quarter_note)
    }

    /// Microseconds per quarter note.
    pub const fn micros_per_quarter_note(&self) -> u32 {
        self.0
    }

    /// Beats per minute.
    pub fn bpm(&self) -> f64 {
        60_000_000.0 / self.0 as f64
    }
}

/// A time signature meta event.
///
/// The denominator is stored as a power of two, so 6/8 has `numerator` 6 and
/// `denominator_exponent` 3.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimeSignature {
    /// Beats per bar.
    pub numerator: u8,
    /// Log2 of the note value that gets one beat.
    pub denominator_exponent: u8,
    /// MIDI clocks per metronome click.
    pub clocks_per_click: u8,
    /// Notated 32nd notes per MIDI quarter note (usually 8).
    pub thirty_seconds_per_quarter: u8,
}

impl TimeSignature {
    /// The denominator as a plain number (8 for 6/8).
    pub const fn denominator(&self) -> u32 {
        1u32 << (self.denominator_exponent & 0x1F)
    }
}

/// A key signature meta event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct KeySignature {
    /// Sharps when positive, flats when negative, -7 to 7.
    pub accidentals: i8,
    /// Minor when set, major otherwise.
    pub minor: bool,
}

impl KeySignature {
    /// The conventional name of this key, or `None` when `accidentals` is
    /// outside -7 to 7.
    pub const fn name(&self) -> Option<&'static str> {
        const MAJOR: [&str; 15] = [
            "BMajor", "GbMajor", "DbMajor", "AbMajor", "EbMajor", "BbMajor", "FMajor", "CMajor",
            "GMajor", "DMajor", "AMajor", "EMajor", "BMajor", "F#Major", "DbMajor",
        ];
        const MINOR: [&str; 15] = [
            "G#Minor", "EbMinor", "BbMinor", "FMinor", "CMinor", "GMinor", "DMinor", "AMinor",
            "EMinor", "BMinor", "F#Minor", "C#Minor", "G#Minor", "D#Minor", "BbMinor",
        ];
        if self.accidentals < -7 || self.accidentals > 7 {
            return None;
        }
        let i = (self.accidentals + 7) as usize;
        Some(if self.minor { MINOR[i] } else { MAJOR[i] })
    }
}

/// The SMPTE time at which a track starts, from the `0x54` meta event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SmpteOffset {
    /// Frame rate encoded in the hour byte.
    pub fps: SmpteFps,
    /// Hour, 0 to 23.
    pub hour: u8,
    /// Minute, 0 to 59.
    pub minute: u8,
    /// Second, 0 to 59.
    pub second: u8,
    /// Frame within the second; range depends on the rate.
    pub frame: u8,
    /// Hundredths of a frame, 0 to 99.
    pub subframe: u8,
}

impl SmpteOffset {
    /// Parses the five payload bytes of an SMPTE offset meta event.
    ///
    /// The first byte is `0rrhhhhh`: two frame-rate bits over a five-bit
    /// hour. Field ranges are validated.
    pub(crate) const fn parse(data: &[u8]) -> Result<Self, ProtocolError> {
        if data.len() < 5 {
            return Err(ProtocolError::TruncatedEvent);
        }
        let fps = match data[0] >> 5 {
            0 => SmpteFps::TwentyFour,
            1 => SmpteFps::TwentyFive,
            2 => SmpteFps::TwentyNine,
            3 => SmpteFps::Thirty,
            bits => {
                return Err(ProtocolError::SmpteField {
                    field: "frame rate",
                    value: bits,
                });
            }
        };
        let hour = data[0] & 0x1F;
        if hour > 23 {
            return Err(ProtocolError::SmpteField {
                field: "hour",
                value: hour,
            });
        }
        let minute = data[1];
        if minute > 59 {
            return Err(ProtocolError::SmpteField {
                field: "minute",
                value: minute,
            });
        }
        let second = data[2];
        if second > 59 {
            return Err(ProtocolError::SmpteField {
                field: "second",
                value: second,
            });
        }
        let frame = data[3];
        let subframe = data[4];
        if subframe > 99 {
            return Err(ProtocolError::SmpteField {
                field: "subframe",
                value: subframe,
            });
        }
        Ok(Self {
            fps,
            hour,
            minute,
            second,
            frame,
            subframe,
        })
    }
}

impl fmt::Display for MetaEvent<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SequenceNumber(n) => write!(f, "SequenceNumber {n}"),
            Self::Text(_) => write!(f, "Text {:?}", self.text().unwrap_or_default()),
            Self::Copyright(_) => write!(f, "Copyright {:?}", self.text().unwrap_or_default()),
            Self::TrackName(_) => write!(f, "TrackName {:?}", self.text().unwrap_or_default()),
            Self::InstrumentName(_) => {
                write!(f, "InstrumentName {:?}", self.text().unwrap_or_default())
            }
            Self::Lyric(_) => write!(f, "Lyric {:?}", self.text().unwrap_or_default()),
            Self::Marker(_) => write!(f, "Marker {:?}", self.text().unwrap_or_default()),
            Self::CuePoint(_) => write!(f, "CuePoint {:?}", self.text().unwrap_or_default()),
            Self::ChannelPrefix(ch) => write!(f, "ChannelPrefix {ch}"),
            Self::Port(p) => write!(f, "Port {p}"),
            Self::EndOfTrack => f.write_str("EndOfTrack"),
            Self::Tempo(t) => write!(f, "Tempo {} us/qn", t.micros_per_quarter_note()),
            Self::SmpteOffset(o) => write!(
                f,
                "SmpteOffset {:02}:{:02}:{:02}:{:02}.{:02} at {} fps",
                o.hour,
                o.minute,
                o.second,
                o.frame,
                o.subframe,
                o.fps.frames_per_second()
            ),
            Self::TimeSignature(ts) => write!(
                f,
                "TimeSignature {}/{} ({} clocks/click, {} 32nds/qn)",
                ts.numerator,
                ts.denominator(),
                ts.clocks_per_click,
                ts.thirty_seconds_per_quarter
            ),
            Self::KeySignature(ks) => match ks.name() {
                Some(name) => write!(f, "KeySignature {name}"),
                None => write!(f, "KeySignature {} accidentals", ks.accidentals),
            },
        }
    }
}
