//! Playfield configuration.
//!
//! The configuration is an immutable snapshot taken by [`crate::manager::HitObjectManager`] at
//! construction. Scroll speed and rate changes are delivered afterwards as [`ControlEvent`]s; no
//! global state is read implicitly.

use bitflags::bitflags;
use strict_num_extended::PositiveF64;

use crate::velocity::TRACK_ROUNDING;

/// Default spatial hash cell size, in track units (one second at velocity 1.0).
pub const DEFAULT_CELL_SIZE: i64 = 1000 * TRACK_ROUNDING;

/// Long notes longer than this many cells go to the overflow set.
pub const DEFAULT_OVERFLOW_CELL_FACTOR: i64 = 10;

/// Scroll speed unit which maps to one pixel per millisecond at rate 1.0.
const SPEED_UNITS_PER_PIXEL_PER_MS: f64 = 20.0;

bitflags! {
    /// Gameplay modifiers which change how positions are computed.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct Modifiers: u8 {
        /// Ignore every scroll velocity: position becomes `time * TRACK_ROUNDING`.
        const NO_SLIDER_VELOCITY = 1 << 0;
        /// Flip the lanes horizontally.
        const MIRROR = 1 << 1;
    }
}

/// Direction the notes travel on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ScrollDirection {
    /// Notes fall from the top to a receptor at the bottom.
    #[default]
    Down,
    /// Notes rise from the bottom to a receptor at the top.
    Up,
    /// Left half of the lanes scrolls down, right half scrolls up.
    Split,
    /// Left half of the lanes scrolls up, right half scrolls down.
    UpSplit,
}

/// Direction of a single lane, resolved from [`ScrollDirection`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LaneDirection {
    /// Notes move towards the bottom.
    Down,
    /// Notes move towards the top.
    Up,
}

impl ScrollDirection {
    /// Resolves the direction of the 1-indexed `lane` on a playfield of `lane_count` lanes.
    #[must_use]
    pub const fn for_lane(self, lane: usize, lane_count: usize) -> LaneDirection {
        let left_half = lane <= lane_count / 2;
        match self {
            Self::Down => LaneDirection::Down,
            Self::Up => LaneDirection::Up,
            Self::Split if left_half => LaneDirection::Down,
            Self::Split => LaneDirection::Up,
            Self::UpSplit if left_half => LaneDirection::Up,
            Self::UpSplit => LaneDirection::Down,
        }
    }
}

/// Scroll speed settings of the player.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScrollSettings {
    /// Scroll speed in integer setting units. `20` is one pixel per millisecond.
    pub speed: u32,
    /// Whether the visual speed grows with the playback rate.
    pub scale_with_rate: bool,
    /// Playback rate of the audio.
    pub playback_rate: PositiveF64,
}

impl Default for ScrollSettings {
    fn default() -> Self {
        Self {
            speed: 20,
            scale_with_rate: true,
            playback_rate: PositiveF64::new_const(1.0),
        }
    }
}

impl ScrollSettings {
    /// Pixels per millisecond of song time at scroll velocity 1.0.
    ///
    /// Track positions advance with song time, so at rate `r` the notes already move `r` times
    /// faster on screen. When the speed must not scale with the rate, that is compensated here.
    #[must_use]
    pub fn effective_speed(&self) -> f64 {
        let base = f64::from(self.speed) / SPEED_UNITS_PER_PIXEL_PER_MS;
        if self.scale_with_rate {
            base
        } else {
            base / self.playback_rate.as_f64()
        }
    }
}

/// Hit windows which decide when an untouched note is given up as missed.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HitWindows {
    /// Milliseconds after `start_time` until an unpressed note is missed.
    pub press_miss_ms: f64,
    /// Milliseconds after `end_time` until an unreleased long note is missed.
    pub release_miss_ms: f64,
}

impl Default for HitWindows {
    fn default() -> Self {
        Self {
            press_miss_ms: 164.0,
            release_miss_ms: 190.5,
        }
    }
}

/// The whole configuration of a playfield.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PlayfieldConfig {
    /// Scroll speed settings.
    pub scroll: ScrollSettings,
    /// Height of the visible playfield in pixels.
    pub viewport_height: f64,
    /// Pixel coordinate of the receptors.
    pub hit_position: f64,
    /// Direction the notes scroll.
    pub scroll_direction: ScrollDirection,
    /// Hit windows for miss detection.
    pub hit_windows: HitWindows,
    /// Pooled objects created per lane before the first frame.
    pub initial_pool_size_per_lane: usize,
    /// Spatial hash cell size in track units.
    pub cell_size: i64,
    /// Long notes spanning more than `cell_size * overflow_cell_factor` are always in range.
    pub overflow_cell_factor: i64,
    /// Lookahead of note activation, as a multiple of the render threshold.
    pub create_margin_factor: f64,
    /// Distance of dead note recycling, as a multiple of the render threshold.
    pub recycle_margin_factor: f64,
    /// Active gameplay modifiers.
    pub modifiers: Modifiers,
}

impl Default for PlayfieldConfig {
    fn default() -> Self {
        Self {
            scroll: ScrollSettings::default(),
            viewport_height: 1080.0,
            hit_position: 1080.0,
            scroll_direction: ScrollDirection::default(),
            hit_windows: HitWindows::default(),
            initial_pool_size_per_lane: 2,
            cell_size: DEFAULT_CELL_SIZE,
            overflow_cell_factor: DEFAULT_OVERFLOW_CELL_FACTOR,
            create_margin_factor: 1.0,
            recycle_margin_factor: 1.0,
            modifiers: Modifiers::empty(),
        }
    }
}

/// Control events posted to the playfield while playing.
///
/// Every variant changes the pixel mapping, so posting any of them recomputes the render thresholds
/// and long note sizes of all timing groups.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlEvent {
    /// Sets the scroll speed in integer setting units.
    SetScrollSpeed {
        /// The new speed, must not be zero.
        speed: u32,
    },
    /// Sets the playback rate.
    SetPlaybackRate {
        /// The new rate.
        rate: PositiveF64,
    },
    /// Sets whether the visual speed scales with the playback rate.
    SetScaleWithRate {
        /// The new flag.
        scale_with_rate: bool,
    },
    /// Sets the viewport height in pixels.
    SetViewportHeight {
        /// The new height.
        height: f64,
    },
}
