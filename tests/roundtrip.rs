//! Write-side assembly and read-back of freshly composed files.

use pretty_assertions::assert_eq;
use smfio::prelude::*;

#[derive(Default)]
struct Recorder {
    header: Option<HeaderChunk>,
    events: Vec<(usize, u64, String)>,
    ended: usize,
}

impl EventSink for Recorder {
    fn header(&mut self, header: &HeaderChunk) {
        self.header = Some(*header);
    }
    fn event(&mut self, track: usize, tick: u64, event: &Event<'_>) {
        self.events.push((track, tick, event.to_string()));
    }
    fn ended(&mut self) {
        self.ended += 1;
    }
}

fn play_to_end(file: &mut MidiFile, sink: &mut Recorder, ticks: u64) {
    for _ in 0..=ticks {
        file.tick(sink).unwrap();
    }
}

#[test]
fn two_notes_round_trip_exactly() {
    let mut file = MidiFile::new();
    file.open_write(Division::TicksPerQuarterNote(96));
    file.write_event(0, 0, &[0x90, 0x3C, 0x40]).unwrap();
    file.write_event(0, 10, &[0x90, 0x3E, 0x40]).unwrap();

    let mut image = Vec::new();
    let written = file.flush(&mut image, 20, &mut NullSink).unwrap();
    assert_eq!(written, image.len() as u64);
    assert_eq!(file.state(), FileState::Reset);

    // The exact byte layout: header, then one track chunk.
    let mut expected = Vec::new();
    expected.extend_from_slice(b"MThd");
    expected.extend_from_slice(&6u32.to_be_bytes());
    expected.extend_from_slice(&0u16.to_be_bytes()); // format 0, single track
    expected.extend_from_slice(&1u16.to_be_bytes());
    expected.extend_from_slice(&96u16.to_be_bytes());
    expected.extend_from_slice(b"MTrk");
    expected.extend_from_slice(&12u32.to_be_bytes());
    expected.extend_from_slice(&[0x00, 0x90, 0x3C, 0x40]);
    expected.extend_from_slice(&[0x0A, 0x90, 0x3E, 0x40]);
    expected.extend_from_slice(&[0x0A, 0xFF, 0x2F, 0x00]);
    assert_eq!(image, expected);

    // Reading the image back reproduces the composed events.
    let mut sink = Recorder::default();
    file.open_read(image.as_slice(), &mut sink).unwrap();
    play_to_end(&mut file, &mut sink, 20);

    assert_eq!(
        sink.events,
        vec![
            (0, 0, "ch.1 NoteOn key 60 vel 64".to_string()),
            (0, 10, "ch.1 NoteOn key 62 vel 64".to_string()),
            (0, 20, "EndOfTrack".to_string()),
        ]
    );
    assert_eq!(sink.ended, 1);

    let header = sink.header.unwrap();
    assert_eq!(header.format(), Format::SingleMultiChannel);
    assert_eq!(header.ntrks(), 1);
    assert_eq!(header.division(), Division::TicksPerQuarterNote(96));
}

#[test]
fn multi_track_files_round_trip_in_index_order() {
    let mut file = MidiFile::new();
    file.open_write(Division::TicksPerQuarterNote(48));
    // Written out of order on purpose; assembly is by index.
    file.write_event(1, 5, &[0x91, 0x30, 0x50]).unwrap();
    file.write_event(0, 0, &[0x90, 0x3C, 0x40]).unwrap();

    let mut image = Vec::new();
    file.flush(&mut image, 10, &mut NullSink).unwrap();

    let mut sink = Recorder::default();
    file.open_read(image.as_slice(), &mut sink).unwrap();
    let header = sink.header.unwrap();
    assert_eq!(header.format(), Format::Simultaneous);
    assert_eq!(header.ntrks(), 2);

    play_to_end(&mut file, &mut sink, 10);
    assert_eq!(
        sink.events,
        vec![
            (0, 0, "ch.1 NoteOn key 60 vel 64".to_string()),
            (1, 5, "ch.2 NoteOn key 48 vel 80".to_string()),
            (0, 10, "EndOfTrack".to_string()),
            (1, 10, "EndOfTrack".to_string()),
        ]
    );
    assert_eq!(sink.ended, 1);
}

#[test]
fn meta_and_sysex_events_survive_the_round_trip() {
    let mut file = MidiFile::new();
    file.open_write(Division::TicksPerQuarterNote(96));
    file.write_event(0, 0, &[0xFF, 0x51, 0x03, 0x07, 0xA1, 0x20])
        .unwrap();
    file.write_event(0, 0, &[0xF0, 0x43, 0x12, 0x00, 0xF7])
        .unwrap();
    file.write_event(0, 4, &[0x90, 0x3C, 0x40]).unwrap();

    let mut image = Vec::new();
    file.flush(&mut image, 8, &mut NullSink).unwrap();

    let mut sink = Recorder::default();
    file.open_read(image.as_slice(), &mut sink).unwrap();
    play_to_end(&mut file, &mut sink, 8);

    let kinds: Vec<&str> = sink.events.iter().map(|(_, _, e)| e.as_str()).collect();
    assert_eq!(
        kinds,
        vec![
            "Tempo 500000 us/qn",
            "SysEx length 4",
            "ch.1 NoteOn key 60 vel 64",
            "EndOfTrack",
        ]
    );
}

#[test]
fn status_bytes_are_never_compressed_on_write() {
    let mut file = MidiFile::new();
    file.open_write(Division::TicksPerQuarterNote(96));
    file.write_event(0, 0, &[0x90, 0x3C, 0x40]).unwrap();
    file.write_event(0, 1, &[0x90, 0x3E, 0x40]).unwrap();

    let mut image = Vec::new();
    file.flush(&mut image, 2, &mut NullSink).unwrap();

    // Both events carry their own 0x90, even though running status would
    // have allowed the second to omit it.
    let track = &image[22..];
    assert_eq!(&track[..8], &[0x00, 0x90, 0x3C, 0x40, 0x01, 0x90, 0x3E, 0x40]);
}

#[test]
fn flushing_twice_is_a_state_error() {
    let mut file = MidiFile::new();
    file.open_write(Division::TicksPerQuarterNote(96));
    file.write_event(0, 0, &[0x90, 0x3C, 0x40]).unwrap();
    let mut image = Vec::new();
    file.flush(&mut image, 4, &mut NullSink).unwrap();

    let err = file.flush(&mut image, 4, &mut NullSink).unwrap_err();
    assert!(matches!(
        err,
        SmfError::State(StateError::WrongState {
            required: FileState::Writing,
            actual: FileState::Reset,
        })
    ));
}

#[test]
fn explicit_finalize_then_flush_keeps_the_end_tick() {
    let mut file = MidiFile::new();
    file.open_write(Division::TicksPerQuarterNote(96));
    file.write_event(0, 0, &[0x90, 0x3C, 0x40]).unwrap();
    file.finalize_track(0, 7).unwrap();

    let mut image = Vec::new();
    // The later flush tick must not touch the already-closed track.
    file.flush(&mut image, 99, &mut NullSink).unwrap();

    let mut sink = Recorder::default();
    file.open_read(image.as_slice(), &mut sink).unwrap();
    play_to_end(&mut file, &mut sink, 7);
    assert_eq!(sink.events.last().unwrap(), &(0, 7, "EndOfTrack".to_string()));
}
