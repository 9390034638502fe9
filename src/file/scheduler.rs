//! The multi-track clock: advances every track cursor in lockstep against a
//! single absolute tick counter.

use crate::{
    error::SoftError,
    file::{TrackChunk, TrackSelector},
    host::EventSink,
};

/// Drives a set of [`TrackChunk`] cursors against one global clock.
///
/// Tracks are always serviced in ascending index order, and events inside a
/// track fire strictly in file order.
#[derive(Debug)]
pub(crate) struct Scheduler {
    clock: u64,
    tracks: Vec<TrackChunk>,
    selector: TrackSelector,
    ended: bool,
}

impl Scheduler {
    pub(crate) fn new(tracks: Vec<TrackChunk>) -> Self {
        Self {
            clock: 0,
            tracks,
            selector: TrackSelector::All,
            ended: false,
        }
    }

    pub(crate) const fn clock(&self) -> u64 {
        self.clock
    }

    pub(crate) fn tracks(&self) -> &[TrackChunk] {
        &self.tracks
    }

    pub(crate) const fn selector(&self) -> TrackSelector {
        self.selector
    }

    /// Chooses which tracks report their events. Decode progress is not
    /// affected; unselected tracks advance silently.
    pub(crate) fn select(&mut self, selector: TrackSelector) {
        self.selector = match selector {
            TrackSelector::Solo(i) if i >= self.tracks.len() => {
                log::warn!(
                    "track {i} out of range ({} tracks), playing all tracks",
                    self.tracks.len()
                );
                TrackSelector::All
            }
            s => s,
        };
    }

    /// Services every track due at the current tick, then advances the
    /// clock by one and reports the new time.
    ///
    /// Multiple events on the same tick (delta-0 chains) all fire within
    /// the same call. Once every track is exhausted the `ended` callback
    /// fires, exactly once until the next rewind.
    pub(crate) fn tick<S: EventSink>(&mut self, sink: &mut S) {
        let clock = self.clock;
        for (i, track) in self.tracks.iter_mut().enumerate() {
            let selected = self.selector.selects(i);
            track.settle();
            while !track.is_finished() {
                match track.peek_next_delta() {
                    Some(delta) if track.total_time() + u64::from(delta) == clock => {
                        if selected {
                            match track.decode_next() {
                                Ok(Some(event)) => sink.event(i, clock, &event),
                                Ok(None) => break,
                                Err(e) => sink.soft_error(Some(i), &SoftError::Protocol(e)),
                            }
                        } else if let Err(e) = track.skip_next() {
                            sink.soft_error(Some(i), &SoftError::Protocol(e));
                        }
                    }
                    _ => break,
                }
            }
        }

        self.update_ended(sink);
        self.clock += 1;
        sink.time(self.clock);
    }

    /// Jumps to an arbitrary absolute tick.
    ///
    /// Every track rewinds and re-scans forward from zero, skipping
    /// silently, so cursor state afterwards is exactly what playing up to
    /// `target` would have produced. Events strictly before `target` are
    /// never reported; events *at* `target` fire on the next [`tick`] call.
    ///
    /// [`tick`]: Scheduler::tick
    pub(crate) fn seek<S: EventSink>(&mut self, target: u64, sink: &mut S) {
        for track in &mut self.tracks {
            track.rewind();
        }

        for (i, track) in self.tracks.iter_mut().enumerate() {
            loop {
                track.settle();
                if track.is_finished() {
                    break;
                }
                match track.peek_next_delta() {
                    Some(delta) if track.total_time() + u64::from(delta) < target => {
                        if let Err(e) = track.skip_next() {
                            sink.soft_error(Some(i), &SoftError::Protocol(e));
                        }
                    }
                    _ => break,
                }
            }
        }

        self.clock = target;
        sink.time(target);
        self.update_ended(sink);
    }

    /// Rewinds every track and the clock to zero.
    pub(crate) fn rewind<S: EventSink>(&mut self, sink: &mut S) {
        for track in &mut self.tracks {
            track.rewind();
        }
        self.clock = 0;
        self.ended = false;
        sink.time(0);
    }

    /// Fires the `ended` callback on the transition into "every track
    /// exhausted", and re-arms it as soon as any track is live again.
    fn update_ended<S: EventSink>(&mut self, sink: &mut S) {
        if self.tracks.iter().all(TrackChunk::is_finished) {
            if !self.ended {
                log::debug!("all {} tracks ended", self.tracks.len());
                sink.ended();
                self.ended = true;
            }
        } else {
            self.ended = false;
        }
    }
}
