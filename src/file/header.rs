use crate::error::FormatError;
use core::fmt;
use num_enum::{IntoPrimitive, TryFromPrimitive};

/// How the tracks of a file relate to each other, from the header `format`
/// field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u16)]
pub enum Format {
    /// Format 0: a single track carrying every channel.
    SingleMultiChannel = 0,
    /// Format 1: simultaneous tracks played together.
    Simultaneous = 1,
    /// Format 2: independent single-track patterns.
    SequentiallyIndependent = 2,
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::SingleMultiChannel => "single multichannel track",
            Self::Simultaneous => "one or more simultaneous tracks",
            Self::SequentiallyIndependent => "one or more sequentially independent single tracks",
        };
        f.write_str(s)
    }
}

/// The SMPTE frame rates a division (or offset) can carry.
///
/// In the header division the rate is stored as a negative byte, which is
/// what the discriminants encode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(i8)]
pub enum SmpteFps {
    /// 24 frames per second, the film standard.
    TwentyFour = -24,
    /// 25 frames per second, PAL/SECAM video.
    TwentyFive = -25,
    /// 29.97 frames per second, NTSC drop-frame.
    TwentyNine = -29,
    /// 30 frames per second.
    Thirty = -30,
}

impl SmpteFps {
    /// The nominal frame count per second.
    pub const fn frames_per_second(&self) -> u8 {
        match self {
            Self::TwentyFour => 24,
            Self::TwentyFive => 25,
            Self::TwentyNine => 29,
            Self::Thirty => 30,
        }
    }

    /// The exact rate; 29.97 for the drop-frame variant.
    pub const fn as_f64(&self) -> f64 {
        match self {
            Self::TwentyFour => 24.0,
            Self::TwentyFive => 25.0,
            Self::TwentyNine => 29.97,
            Self::Thirty => 30.0,
        }
    }
}

/// How delta-time ticks are to be interpreted, from the header `division`
/// field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Division {
    /// Musical timing: ticks per quarter note, a 15-bit value.
    TicksPerQuarterNote(u16),
    /// Absolute timing: SMPTE frames per second and ticks per frame.
    Smpte {
        /// The frame rate.
        fps: SmpteFps,
        /// Subdivisions of a frame.
        ticks_per_frame: u8,
    },
}

impl Division {
    /// Decodes the raw big-endian header field.
    ///
    /// The top bit selects the SMPTE form, where the high byte is the
    /// negative frame rate and the low byte the ticks per frame.
    pub fn from_raw(raw: u16) -> Result<Self, FormatError> {
        if raw & 0x8000 == 0 {
            return Ok(Self::TicksPerQuarterNote(raw));
        }
        let rate = (raw >> 8) as u8 as i8;
        let fps = SmpteFps::try_from(rate).map_err(|_| FormatError::InvalidSmpteRate(rate))?;
        Ok(Self::Smpte {
            fps,
            ticks_per_frame: raw as u8,
        })
    }

    /// Encodes the raw header field.
    pub fn to_raw(&self) -> u16 {
        match *self {
            Self::TicksPerQuarterNote(tpqn) => tpqn & 0x7FFF,
            Self::Smpte {
                fps,
                ticks_per_frame,
            } => u16::from_be_bytes([i8::from(fps) as u8, ticks_per_frame]),
        }
    }

    /// The ticks-per-quarter-note rate, if this is musical timing.
    pub const fn ticks_per_quarter_note(&self) -> Option<u16> {
        match self {
            Self::TicksPerQuarterNote(tpqn) => Some(*tpqn),
            Self::Smpte { .. } => None,
        }
    }
}

impl fmt::Display for Division {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TicksPerQuarterNote(tpqn) => write!(f, "{tpqn} ticks per quarter note"),
            Self::Smpte {
                fps,
                ticks_per_frame,
            } => write!(
                f,
                "{} frames per second, {ticks_per_frame} ticks per frame",
                fps.frames_per_second()
            ),
        }
    }
}

/// The parsed `MThd` chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HeaderChunk {
    format: Format,
    ntrks: u16,
    declared_ntrks: u16,
    division: Division,
}

impl HeaderChunk {
    pub(crate) const fn new(
        format: Format,
        ntrks: u16,
        declared_ntrks: u16,
        division: Division,
    ) -> Self {
        Self {
            format,
            ntrks,
            declared_ntrks,
            division,
        }
    }

    pub(crate) const fn with_loaded_tracks(mut self, ntrks: u16) -> Self {
        self.ntrks = ntrks;
        self
    }

    /// The file format.
    pub const fn format(&self) -> Format {
        self.format
    }

    /// Number of tracks actually loaded.
    pub const fn ntrks(&self) -> u16 {
        self.ntrks
    }

    /// Track count as declared by the file, before any clamping.
    pub const fn declared_ntrks(&self) -> u16 {
        self.declared_ntrks
    }

    /// The tick interpretation for the whole file.
    pub const fn division(&self) -> Division {
        self.division
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn division_round_trip() {
        let tpqn = Division::from_raw(0x0060).unwrap();
        assert_eq!(tpqn, Division::TicksPerQuarterNote(96));
        assert_eq!(tpqn.to_raw(), 0x0060);

        // -25 fps, 40 ticks per frame.
        let smpte = Division::from_raw(0xE728).unwrap();
        assert_eq!(
            smpte,
            Division::Smpte {
                fps: SmpteFps::TwentyFive,
                ticks_per_frame: 40
            }
        );
        assert_eq!(smpte.to_raw(), 0xE728);
    }

    #[test]
    fn division_rejects_unknown_rates() {
        assert_eq!(
            Division::from_raw(0x8101),
            Err(FormatError::InvalidSmpteRate(-127))
        );
    }

    #[test]
    fn format_from_raw() {
        assert_eq!(Format::try_from(1u16), Ok(Format::Simultaneous));
        assert!(Format::try_from(3u16).is_err());
    }
}
