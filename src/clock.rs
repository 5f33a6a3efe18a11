//! Song clock.
//!
//! Converts wall clock [`TimeStamp`]s into song time in milliseconds, which is what
//! [`crate::playfield::Playfield::update`] takes. The playfield never reads a clock by itself;
//! audio code may own its own time source and skip this entirely.

use gametime::{TimeSpan, TimeStamp};
use strict_num_extended::PositiveF64;

use crate::error::{PlayfieldError, Result};

const NANOS_PER_MILLISECOND: f64 = 1_000_000.0;

/// Song time derived from wall clock time and a playback rate.
#[derive(Debug, Clone)]
pub struct SongClock {
    started_at: Option<TimeStamp>,
    /// Song time at `started_at`.
    origin_ms: f64,
    rate: PositiveF64,
}

impl Default for SongClock {
    fn default() -> Self {
        Self {
            started_at: None,
            origin_ms: 0.0,
            rate: PositiveF64::new_const(1.0),
        }
    }
}

impl SongClock {
    /// Create a stopped clock at song time zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts the song from its beginning at `now`.
    pub const fn start_play(&mut self, now: TimeStamp) {
        self.started_at = Some(now);
        self.origin_ms = 0.0;
    }

    /// Wall clock time the current anchor was taken at.
    #[must_use]
    pub const fn started_at(&self) -> Option<TimeStamp> {
        self.started_at
    }

    /// Playback rate.
    #[must_use]
    pub const fn rate(&self) -> PositiveF64 {
        self.rate
    }

    /// Song time at `now`. A stopped clock stays at its last song time.
    #[must_use]
    pub fn song_time_ms(&self, now: TimeStamp) -> f64 {
        let Some(started) = self.started_at else {
            return self.origin_ms;
        };
        let elapsed = now
            .checked_elapsed_since(started)
            .unwrap_or(TimeSpan::ZERO);
        self.origin_ms + elapsed.as_nanos().max(0) as f64 / NANOS_PER_MILLISECOND * self.rate.as_f64()
    }

    /// Jumps to `song_time_ms` at `now`.
    pub fn seek(&mut self, now: TimeStamp, song_time_ms: f64) {
        log::debug!("song clock seeks to {song_time_ms}ms");
        self.started_at = Some(now);
        self.origin_ms = song_time_ms;
    }

    /// Changes the playback rate at `now`, keeping song time continuous.
    ///
    /// # Errors
    ///
    /// Returns [`PlayfieldError::InvalidPlaybackRate`] unless `rate` is finite and positive.
    pub fn set_rate(&mut self, now: TimeStamp, rate: f64) -> Result<()> {
        let new_rate = PositiveF64::new(rate)
            .ok()
            .filter(|rate| rate.as_f64().is_finite())
            .ok_or(PlayfieldError::InvalidPlaybackRate(rate))?;
        if self.started_at.is_some() {
            self.origin_ms = self.song_time_ms(now);
            self.started_at = Some(now);
        }
        self.rate = new_rate;
        Ok(())
    }

    /// Stops the clock at its song time at `now`.
    pub fn pause(&mut self, now: TimeStamp) {
        self.origin_ms = self.song_time_ms(now);
        self.started_at = None;
    }
}
