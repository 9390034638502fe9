//! Stream-level chunk parsing: the `MThd` header and raw `MTrk` buffers.

use crate::{
    error::{FormatError, SmfError, SmfResult},
    file::{Division, Format, HeaderChunk, MAX_TRACKS, TrackChunk},
};
use std::io::{ErrorKind, Read};

const HEADER_MAGIC: &[u8; 4] = b"MThd";
const TRACK_MAGIC: &[u8; 4] = b"MTrk";

/// Reads as much of `buf` as the stream can fill, returning the byte count.
///
/// A short count means the stream ended; I/O failures other than
/// interruption are returned as-is.
fn read_full<R: Read>(r: &mut R, buf: &mut [u8]) -> SmfResult<usize> {
    let mut got = 0;
    while got < buf.len() {
        match r.read(&mut buf[got..]) {
            Ok(0) => break,
            Ok(n) => got += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(SmfError::Io(e)),
        }
    }
    Ok(got)
}

fn read_exactly<R: Read>(r: &mut R, buf: &mut [u8]) -> SmfResult<()> {
    let got = read_full(r, buf)?;
    if got < buf.len() {
        return Err(FormatError::Truncated {
            wanted: buf.len(),
            got,
        }
        .into());
    }
    Ok(())
}

fn read_u16<R: Read>(r: &mut R) -> SmfResult<u16> {
    let mut buf = [0u8; 2];
    read_exactly(r, &mut buf)?;
    Ok(u16::from_be_bytes(buf))
}

fn read_u32<R: Read>(r: &mut R) -> SmfResult<u32> {
    let mut buf = [0u8; 4];
    read_exactly(r, &mut buf)?;
    Ok(u32::from_be_bytes(buf))
}

/// Parses the header chunk from the front of the stream.
///
/// Verifies the `MThd` magic and the fixed length of 6, then reads the
/// format, track count and division. A track count above [`MAX_TRACKS`]
/// clamps rather than fails.
pub(crate) fn read_header<R: Read>(r: &mut R) -> SmfResult<HeaderChunk> {
    let mut magic = [0u8; 4];
    read_exactly(r, &mut magic)?;
    if &magic != HEADER_MAGIC {
        return Err(FormatError::BadMagic {
            expected: "MThd",
            found: magic,
        }
        .into());
    }

    let length = read_u32(r)?;
    if length != 6 {
        return Err(FormatError::BadHeaderLength(length).into());
    }

    let raw_format = read_u16(r)?;
    let format = Format::try_from(raw_format)
        .map_err(|_| FormatError::UnsupportedFormat(raw_format))?;

    let declared_ntrks = read_u16(r)?;
    let ntrks = if declared_ntrks as usize > MAX_TRACKS {
        log::warn!(
            "header declares {declared_ntrks} tracks, keeping the first {MAX_TRACKS}"
        );
        MAX_TRACKS as u16
    } else {
        declared_ntrks
    };

    let division = Division::from_raw(read_u16(r)?)?;
    log::debug!("header: format {}, {ntrks} tracks, {division}", u16::from(format));

    Ok(HeaderChunk::new(format, ntrks, declared_ntrks, division))
}

/// Reads the next track chunk, or `None` on a clean end of stream.
///
/// Anything other than an `MTrk` magic in the track slot is a hard error;
/// there is no chunk-skipping fallback.
pub(crate) fn read_track<R: Read>(r: &mut R) -> SmfResult<Option<TrackChunk>> {
    let mut magic = [0u8; 4];
    let got = read_full(r, &mut magic)?;
    if got == 0 {
        return Ok(None);
    }
    if got < magic.len() {
        return Err(FormatError::Truncated {
            wanted: magic.len(),
            got,
        }
        .into());
    }
    if &magic != TRACK_MAGIC {
        return Err(FormatError::BadMagic {
            expected: "MTrk",
            found: magic,
        }
        .into());
    }

    let length = read_u32(r)? as usize;
    let mut data = vec![0u8; length];
    read_exactly(r, &mut data)?;
    Ok(Some(TrackChunk::new(data)))
}

/// Reads up to `ntrks` track chunks immediately following the header.
///
/// Stops early if the stream runs out of chunks, reporting how many were
/// actually available.
pub(crate) fn read_all_tracks<R: Read>(r: &mut R, ntrks: u16) -> SmfResult<Vec<TrackChunk>> {
    let mut tracks = Vec::with_capacity(ntrks as usize);
    for i in 0..ntrks {
        match read_track(r)? {
            Some(track) => {
                log::debug!("track chunk {i}: length {}", track.len());
                tracks.push(track);
            }
            None => {
                log::warn!("header declares {ntrks} tracks but only {i} are present");
                break;
            }
        }
    }
    Ok(tracks)
}
