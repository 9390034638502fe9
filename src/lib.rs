#![doc = r#"
A Standard MIDI File engine.

`smfio` reads a `.mid` byte stream into per-track event buffers, exposes a
tick-synchronized multi-track cursor for driving real-time playback, and
writes newly composed tracks back out as a byte-exact file image. It is the
file-format half of a sequencer: the tick clock, the event transport and
path handling all belong to the host.

# Reading and playing

The host supplies an [`EventSink`](host::EventSink) and calls
[`tick`](file::MidiFile::tick) from its own clock. Every event due at the
current tick is decoded and reported, in ascending track order, before the
clock advances.

# Writing

The host stamps raw event bytes with absolute ticks;
[`flush`](file::MidiFile::flush) appends each track's end-of-track marker
and assembles the `MThd` + `MTrk` image in one pass.

```rust
use smfio::prelude::*;

// Compose a one-track file entirely in memory...
let mut file = MidiFile::new();
file.open_write(Division::TicksPerQuarterNote(96));
file.write_event(0, 0, &[0x90, 60, 100])?;
file.write_event(0, 96, &[0x80, 60, 0])?;
let mut image = Vec::new();
file.flush(&mut image, 192, &mut NullSink)?;

// ...then play it back.
struct Counter(usize);
impl EventSink for Counter {
    fn event(&mut self, _track: usize, _tick: u64, _event: &Event<'_>) {
        self.0 += 1;
    }
}

let mut sink = Counter(0);
file.open_read(image.as_slice(), &mut sink)?;
for _ in 0..=192 {
    file.tick(&mut sink)?;
}
assert_eq!(sink.0, 3); // two notes and the end-of-track marker
# Ok::<(), smfio::error::SmfError>(())
```
"#]

pub mod error;
pub mod event;
pub mod file;
pub mod host;
pub mod vlq;

pub(crate) mod writer;

pub mod prelude;
