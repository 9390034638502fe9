#![doc = r#"
The write path: per-track byte sinks and the final file assembler.

Writing mirrors reading. Each track accumulates delta-stamped raw events in
its own buffer; [`assemble`](Writer::assemble) then emits the header chunk
followed by every active track chunk, in index order, with lengths taken
from the bookkeeping rather than re-derived.
"#]

use crate::{
    error::{ProtocolError, SmfResult, StateError},
    file::{Division, MAX_TRACKS},
    vlq,
};
use std::io::Write;

/// One track's growing output buffer.
#[derive(Debug, Default)]
struct TrackSink {
    buf: Vec<u8>,
    total_time: u64,
    running_status: u8,
    closed: bool,
}

/// Accumulates composed events and assembles the final file image.
#[derive(Debug)]
pub(crate) struct Writer {
    division: Division,
    tracks: Vec<Option<TrackSink>>,
}

impl Writer {
    pub(crate) fn new(division: Division) -> Self {
        Self {
            division,
            tracks: Vec::new(),
        }
    }

    /// Tracks that have received at least one write, in index order.
    fn active(&self) -> impl Iterator<Item = (usize, &TrackSink)> {
        self.tracks
            .iter()
            .enumerate()
            .filter_map(|(i, t)| Some((i, t.as_ref()?)))
    }

    /// Appends one event to `track` at absolute `tick`.
    ///
    /// The delta-time against the track's current position is encoded
    /// first, then `raw` verbatim. System-exclusive messages (leading
    /// `0xF0`) are validated for their `0xF7` terminator and committed as
    /// one atomic unit, or not at all. The status byte is always written
    /// out; running status is tracked but never compressed on this side.
    ///
    /// Returns the number of bytes appended.
    pub(crate) fn write_event(&mut self, track: usize, tick: u64, raw: &[u8]) -> SmfResult<usize> {
        if raw.is_empty() {
            return Ok(0);
        }
        if track >= MAX_TRACKS {
            return Err(StateError::TrackOutOfRange(track).into());
        }
        if let Some(Some(sink)) = self.tracks.get(track) {
            if sink.closed {
                return Err(StateError::TrackClosed(track).into());
            }
        }

        let track_time = match self.tracks.get(track) {
            Some(Some(sink)) => sink.total_time,
            _ => 0,
        };
        let delta = tick
            .checked_sub(track_time)
            .ok_or(ProtocolError::NonMonotonicTime { tick, track_time })?;

        // Validate before touching the buffer so a bad message commits
        // nothing.
        let body = if raw[0] == 0xF0 {
            Body::sysex(raw)?
        } else {
            Body::plain(raw)
        };

        let sink = self.sink_mut(track);
        let mark = sink.buf.len();
        sink.buf.extend_from_slice(&vlq::encode(clamp_delta(delta)));
        match body {
            Body::Plain(bytes) => {
                sink.buf.extend_from_slice(bytes);
                match bytes[0] {
                    0x80..=0xEF => sink.running_status = bytes[0],
                    0xF0..=0xF7 => sink.running_status = 0,
                    _ => {}
                }
            }
            Body::SysEx(payload) => {
                sink.buf.push(0xF0);
                sink.buf
                    .extend_from_slice(&vlq::encode(payload.len() as u32 + 1));
                sink.buf.extend_from_slice(payload);
                sink.buf.push(0xF7);
                sink.running_status = 0;
            }
        }
        sink.total_time = tick;
        Ok(sink.buf.len() - mark)
    }

    /// Writes the end-of-track meta event at `end_tick` and closes the
    /// track to further writes.
    ///
    /// Returns the number of bytes appended.
    pub(crate) fn finalize(&mut self, track: usize, end_tick: u64) -> SmfResult<usize> {
        if track >= MAX_TRACKS {
            return Err(StateError::TrackOutOfRange(track).into());
        }
        let track_time = match self.tracks.get(track) {
            Some(Some(sink)) => {
                if sink.closed {
                    return Err(StateError::TrackClosed(track).into());
                }
                sink.total_time
            }
            _ => 0,
        };
        let delta = end_tick
            .checked_sub(track_time)
            .ok_or(ProtocolError::NonMonotonicTime {
                tick: end_tick,
                track_time,
            })?;

        let sink = self.sink_mut(track);
        let mark = sink.buf.len();
        sink.buf.extend_from_slice(&vlq::encode(clamp_delta(delta)));
        sink.buf.extend_from_slice(&[0xFF, 0x2F, 0x00]);
        sink.total_time = end_tick;
        sink.closed = true;
        Ok(sink.buf.len() - mark)
    }

    /// Finalizes every active track that has not been finalized yet.
    pub(crate) fn finalize_open_tracks(&mut self, end_tick: u64) -> SmfResult<()> {
        let open: Vec<usize> = self
            .active()
            .filter(|(_, t)| !t.closed)
            .map(|(i, _)| i)
            .collect();
        for i in open {
            self.finalize(i, end_tick)?;
        }
        Ok(())
    }

    /// Serializes the header chunk and every active track chunk to `out`.
    ///
    /// The format field is 0 for a single active track and 1 otherwise.
    /// Returns the total number of bytes written.
    pub(crate) fn assemble<W: Write>(&self, out: &mut W) -> std::io::Result<u64> {
        let ntrks = self.active().count();
        let format: u16 = if ntrks == 1 { 0 } else { 1 };

        out.write_all(b"MThd")?;
        out.write_all(&6u32.to_be_bytes())?;
        out.write_all(&format.to_be_bytes())?;
        out.write_all(&(ntrks as u16).to_be_bytes())?;
        out.write_all(&self.division.to_raw().to_be_bytes())?;
        let mut written = 14u64;

        for (i, sink) in self.active() {
            log::debug!("track {i}: {} bytes", sink.buf.len());
            out.write_all(b"MTrk")?;
            out.write_all(&(sink.buf.len() as u32).to_be_bytes())?;
            out.write_all(&sink.buf)?;
            written += 8 + sink.buf.len() as u64;
        }
        Ok(written)
    }

    fn sink_mut(&mut self, track: usize) -> &mut TrackSink {
        if self.tracks.len() <= track {
            self.tracks.resize_with(track + 1, || None);
        }
        self.tracks[track].get_or_insert_with(TrackSink::default)
    }
}

/// A validated event body, ready to append.
enum Body<'a> {
    Plain(&'a [u8]),
    SysEx(&'a [u8]),
}

impl<'a> Body<'a> {
    fn plain(raw: &'a [u8]) -> Self {
        Self::Plain(raw)
    }

    /// Splits a sysex message into its payload, requiring the terminator.
    ///
    /// The payload runs from just past the status byte to the first byte
    /// with the top bit set, which must be `0xF7`.
    fn sysex(raw: &'a [u8]) -> Result<Self, ProtocolError> {
        let body = &raw[1..];
        let end = body
            .iter()
            .position(|b| b & 0x80 != 0)
            .ok_or(ProtocolError::UnterminatedSysex)?;
        if body[end] != 0xF7 {
            return Err(ProtocolError::UnterminatedSysex);
        }
        Ok(Self::SysEx(&body[..end]))
    }
}

/// Delta-times wider than a VLQ can carry collapse to the maximum.
fn clamp_delta(delta: u64) -> u32 {
    u32::try_from(delta).unwrap_or_else(|_| {
        log::warn!("delta time {delta} exceeds the encodable range, clamping");
        u32::MAX
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn stamps_deltas_against_track_time() {
        let mut writer = Writer::new(Division::TicksPerQuarterNote(96));
        writer.write_event(0, 0, &[0x90, 0x3C, 0x40]).unwrap();
        writer.write_event(0, 200, &[0x80, 0x3C, 0x00]).unwrap();
        let sink = writer.tracks[0].as_ref().unwrap();
        assert_eq!(
            sink.buf,
            vec![0x00, 0x90, 0x3C, 0x40, 0x81, 0x48, 0x80, 0x3C, 0x00]
        );
        assert_eq!(sink.total_time, 200);
        assert_eq!(sink.running_status, 0x80);
    }

    #[test]
    fn rejects_time_regression() {
        let mut writer = Writer::new(Division::TicksPerQuarterNote(96));
        writer.write_event(0, 50, &[0x90, 0x3C, 0x40]).unwrap();
        let err = writer.write_event(0, 10, &[0x80, 0x3C, 0x00]).unwrap_err();
        assert!(matches!(
            err,
            crate::error::SmfError::Protocol(ProtocolError::NonMonotonicTime {
                tick: 10,
                track_time: 50
            })
        ));
    }

    #[test]
    fn sysex_is_committed_atomically() {
        let mut writer = Writer::new(Division::TicksPerQuarterNote(96));
        writer
            .write_event(0, 0, &[0xF0, 0x43, 0x12, 0x00, 0xF7])
            .unwrap();
        let sink = writer.tracks[0].as_ref().unwrap();
        assert_eq!(sink.buf, vec![0x00, 0xF0, 0x04, 0x43, 0x12, 0x00, 0xF7]);
    }

    #[test]
    fn unterminated_sysex_commits_nothing() {
        let mut writer = Writer::new(Division::TicksPerQuarterNote(96));
        writer.write_event(0, 0, &[0x90, 0x3C, 0x40]).unwrap();
        let before = writer.tracks[0].as_ref().unwrap().buf.clone();
        let err = writer.write_event(0, 10, &[0xF0, 0x43, 0x12]).unwrap_err();
        assert!(matches!(
            err,
            crate::error::SmfError::Protocol(ProtocolError::UnterminatedSysex)
        ));
        let sink = writer.tracks[0].as_ref().unwrap();
        assert_eq!(sink.buf, before);
        assert_eq!(sink.total_time, 0);
    }

    #[test]
    fn finalize_closes_the_track() {
        let mut writer = Writer::new(Division::TicksPerQuarterNote(96));
        writer.write_event(0, 0, &[0x90, 0x3C, 0x40]).unwrap();
        let written = writer.finalize(0, 20).unwrap();
        assert_eq!(written, 4); // delta 20 plus FF 2F 00
        let err = writer.write_event(0, 30, &[0x90, 0x3C, 0x40]).unwrap_err();
        assert!(matches!(
            err,
            crate::error::SmfError::State(StateError::TrackClosed(0))
        ));
    }

    #[test]
    fn assembles_header_then_tracks_in_index_order() {
        let mut writer = Writer::new(Division::TicksPerQuarterNote(96));
        writer.write_event(2, 0, &[0x90, 0x3C, 0x40]).unwrap();
        writer.write_event(0, 0, &[0x90, 0x40, 0x40]).unwrap();
        writer.finalize_open_tracks(10).unwrap();

        let mut image = Vec::new();
        let written = writer.assemble(&mut image).unwrap();
        assert_eq!(written, image.len() as u64);

        // Two active tracks, so format 1.
        assert_eq!(&image[..4], b"MThd");
        assert_eq!(&image[4..8], &6u32.to_be_bytes());
        assert_eq!(&image[8..10], &1u16.to_be_bytes());
        assert_eq!(&image[10..12], &2u16.to_be_bytes());
        assert_eq!(&image[12..14], &96u16.to_be_bytes());
        // Track 0 comes before track 2.
        assert_eq!(&image[14..18], b"MTrk");
        let len0 = u32::from_be_bytes(image[18..22].try_into().unwrap()) as usize;
        assert_eq!(&image[22..26], [0x00, 0x90, 0x40, 0x40]);
        assert_eq!(&image[22 + len0..26 + len0], b"MTrk");
    }

    #[test]
    fn single_track_assembles_as_format_zero() {
        let mut writer = Writer::new(Division::TicksPerQuarterNote(96));
        writer.write_event(0, 0, &[0x90, 0x3C, 0x40]).unwrap();
        writer.finalize_open_tracks(4).unwrap();
        let mut image = Vec::new();
        writer.assemble(&mut image).unwrap();
        assert_eq!(&image[8..10], &0u16.to_be_bytes());
        assert_eq!(&image[10..12], &1u16.to_be_bytes());
    }
}
