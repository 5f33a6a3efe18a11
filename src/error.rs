//! Error definitions of the playfield.
//!
//! Malformed timing data never surfaces here: it is repaired where it is read and reported through
//! the `log` facade. The variants below are misuses of the playfield by its collaborators.

use thiserror::Error;

use crate::note::NoteId;

/// An error caused by a collaborator calling into the playfield incorrectly.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlayfieldError {
    /// The note controller has no pooled visual object linked to it.
    #[error("note {note:?} has no pooled object linked")]
    NoPooledObject {
        /// The note which was queried.
        note: NoteId,
    },
    /// There is no active note on the lane to be hit.
    #[error("no active note on lane {lane}")]
    NoActiveNote {
        /// The 1-indexed lane.
        lane: usize,
    },
    /// There is no held long note on the lane to be released.
    #[error("no held long note on lane {lane}")]
    NoHeldNote {
        /// The 1-indexed lane.
        lane: usize,
    },
    /// The lane is not in `1..=lane_count`.
    #[error("lane {lane} is out of range 1..={lane_count}")]
    LaneOutOfRange {
        /// The requested lane.
        lane: usize,
        /// The number of lanes of the map.
        lane_count: usize,
    },
    /// The scroll speed must be positive.
    #[error("scroll speed must be positive, got {0}")]
    InvalidScrollSpeed(u32),
    /// The playback rate must be a positive finite number.
    #[error("playback rate must be positive and finite, got {0}")]
    InvalidPlaybackRate(f64),
    /// The viewport height must be a positive finite number of pixels.
    #[error("viewport height must be positive and finite, got {0}")]
    InvalidViewportHeight(f64),
}

/// Result type of the playfield.
pub type Result<T> = std::result::Result<T, PlayfieldError>;
