//! Playfield module
//!
//! The interface between the playfield and its collaborators: the frame driver, the renderer and
//! the judgement code.

use crate::config::{ControlEvent, LaneDirection};
use crate::note::{NoteId, NoteState};
use crate::pool::PoolHandle;

/// A playfield driven frame by frame.
pub trait Playfield {
    /// Advances to song time `time` in milliseconds and returns the transitions of this frame.
    ///
    /// A note is never missed at the time it was activated at, so calling it again with the same
    /// time returns nothing and changes nothing. Time must not go backwards except through
    /// [`Self::handle_skip`].
    fn update(&mut self, time: f64) -> impl Iterator<Item = NoteTransition>;

    /// Restarts from song time `time`, discarding every note ending before it.
    fn handle_skip(&mut self, time: f64);

    /// Post control events to the playfield.
    ///
    /// Any of them recomputes the render thresholds and long note sizes.
    fn post_events(&mut self, events: impl Iterator<Item = ControlEvent>);

    /// Notes to draw this frame, ordered by [`NoteId`].
    fn visible_notes(&self) -> impl Iterator<Item = RenderedNote>;

    /// Whether nothing is left to play.
    fn is_complete(&self) -> bool;

    /// Song time of the last update.
    fn current_time(&self) -> f64;
}

/// How the judgement code rated the release of a held long note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ReleaseOutcome {
    /// Released in time, the note is finished.
    Correct,
    /// Released too early, the rest of the note dies.
    Early,
    /// Released too late, the note dies.
    Late,
}

/// What happened to a note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TransitionKind {
    /// A pooled object was linked to the note, it can be hit now.
    Activated,
    /// The head of a long note was hit.
    Held,
    /// A held long note was released.
    Released(ReleaseOutcome),
    /// The head was not hit in time.
    HeadMissed,
    /// The tail was not released in time, or the whole long note was missed.
    TailMissed,
    /// The note was finished and its pooled object detached.
    Removed,
    /// A dead note scrolled away and its pooled object was detached.
    Recycled,
}

/// A state transition of one note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NoteTransition {
    /// The note.
    pub note: NoteId,
    /// Lane of the note.
    pub lane: usize,
    /// What happened.
    pub kind: TransitionKind,
}

impl NoteTransition {
    /// Create a new transition.
    #[must_use]
    pub const fn new(note: NoteId, lane: usize, kind: TransitionKind) -> Self {
        Self { note, lane, kind }
    }
}

/// Everything the renderer needs to draw a note.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedNote {
    /// The note.
    pub note: NoteId,
    /// Lane of the note.
    pub lane: usize,
    /// Index of its timing group.
    pub group: usize,
    /// Pooled visual object to draw with.
    pub pooled: PoolHandle,
    /// State of the note, dead notes are usually grayed out.
    pub state: NoteState,
    /// Pixel coordinate of the head.
    pub head: f64,
    /// Pixel coordinate of the tail, `None` for taps.
    pub tail: Option<f64>,
    /// Length of the long note body in pixels.
    pub body_length: f64,
    /// Whether the tail sprite is drawn upside down.
    pub flip_tail: bool,
    /// Direction the lane scrolls.
    pub direction: LaneDirection,
}
