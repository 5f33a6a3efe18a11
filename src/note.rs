//! Per-note position state.
//!
//! A [`NoteController`] is the logical identity of one hit object. It caches the object's static
//! track position bounds at construction and maintains the dynamic bounds of a long note while
//! it is being played. Pooled visual objects are linked to and unlinked from it, but the controller
//! itself lives as long as the map.

use crate::config::LaneDirection;
use crate::error::{PlayfieldError, Result};
use crate::map::HitObjectInfo;
use crate::pool::PoolHandle;
use crate::velocity::{DirectionChanges, TRACK_ROUNDING, VelocityPositionIndex};

/// Identifier of a note, unique over the whole map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NoteId(pub usize);

impl NoteId {
    /// Create a new `NoteId`
    #[must_use]
    pub const fn new(id: usize) -> Self {
        Self(id)
    }

    /// Get the internal usize value
    #[must_use]
    pub const fn value(self) -> usize {
        self.0
    }
}

impl From<usize> for NoteId {
    fn from(value: usize) -> Self {
        Self(value)
    }
}

/// Lifecycle state of a note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NoteState {
    /// Waiting to be hit.
    #[default]
    Alive,
    /// A long note whose head was hit and is being held.
    Held,
    /// Missed or released badly. Still drawn until it scrolls away.
    Dead,
    /// Finished. Not drawn anymore.
    Removed,
}

/// Shape specific data of a note.
#[derive(Debug, Clone, PartialEq)]
pub enum NoteShape {
    /// A single point.
    Tap,
    /// An interval which needs to be held.
    Long {
        /// Track position of the tail.
        end_track_position: i64,
        /// Direction changes between the head and the tail.
        direction_changes: DirectionChanges,
        /// Whether the scroll runs backwards when the tail is reached.
        flip_end: bool,
    },
}

/// Position state of a single hit object.
#[derive(Debug, Clone)]
pub struct NoteController {
    id: NoteId,
    start_time: f64,
    end_time: f64,
    lane: usize,
    group: usize,
    initial_track_position: i64,
    earliest_track_position: i64,
    latest_track_position: i64,
    earliest_held_position: i64,
    latest_held_position: i64,
    /// Position the head is drawn at.
    head_track_position: i64,
    shape: NoteShape,
    state: NoteState,
    pooled: Option<PoolHandle>,
}

impl NoteController {
    /// Computes the static bounds of `info` on the timeline of `index`.
    ///
    /// `lane` overrides the lane of `info` (lane modifiers are resolved by the caller) and `group`
    /// is the index of the timing group owning `index`. A long note ending before it starts is
    /// shortened to zero length.
    #[must_use]
    pub fn new(
        id: NoteId,
        info: &HitObjectInfo,
        lane: usize,
        group: usize,
        index: &VelocityPositionIndex,
    ) -> Self {
        let start_time = info.start_time;
        let initial_track_position = index.position_at(start_time);

        let (end_time, shape, earliest, latest) = match info.end_time {
            None => (
                start_time,
                NoteShape::Tap,
                initial_track_position,
                initial_track_position,
            ),
            Some(end_time) => {
                let end_time = if end_time < start_time {
                    log::warn!(
                        "long note at {start_time}ms ends before it starts ({end_time}ms), shortening it"
                    );
                    start_time
                } else {
                    end_time
                };
                let end_track_position = index.position_at(end_time);
                let direction_changes = index.direction_changes_between(start_time, end_time);
                let (earliest, latest) = fold_extent(
                    initial_track_position,
                    end_track_position,
                    direction_changes.iter().map(|change| change.position),
                );
                let shape = NoteShape::Long {
                    end_track_position,
                    direction_changes,
                    flip_end: index.velocity_at(end_time) < 0.0,
                };
                (end_time, shape, earliest, latest)
            }
        };

        Self {
            id,
            start_time,
            end_time,
            lane,
            group,
            initial_track_position,
            earliest_track_position: earliest,
            latest_track_position: latest,
            earliest_held_position: earliest,
            latest_held_position: latest,
            head_track_position: initial_track_position,
            shape,
            state: NoteState::Alive,
            pooled: None,
        }
    }

    /// Identifier of the note.
    #[must_use]
    pub const fn id(&self) -> NoteId {
        self.id
    }

    /// Time to hit, in milliseconds.
    #[must_use]
    pub const fn start_time(&self) -> f64 {
        self.start_time
    }

    /// Time to release, equal to [`Self::start_time`] for taps.
    #[must_use]
    pub const fn end_time(&self) -> f64 {
        self.end_time
    }

    /// 1-indexed lane.
    #[must_use]
    pub const fn lane(&self) -> usize {
        self.lane
    }

    /// Index of the owning timing group.
    #[must_use]
    pub const fn group(&self) -> usize {
        self.group
    }

    /// Whether the note needs to be held.
    #[must_use]
    pub const fn is_long_note(&self) -> bool {
        matches!(self.shape, NoteShape::Long { .. })
    }

    /// Shape specific data.
    #[must_use]
    pub const fn shape(&self) -> &NoteShape {
        &self.shape
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> NoteState {
        self.state
    }

    pub(crate) const fn set_state(&mut self, state: NoteState) {
        self.state = state;
    }

    /// Track position of the head.
    #[must_use]
    pub const fn initial_track_position(&self) -> i64 {
        self.initial_track_position
    }

    /// Track position of the tail, `None` for taps.
    #[must_use]
    pub const fn end_track_position(&self) -> Option<i64> {
        match self.shape {
            NoteShape::Tap => None,
            NoteShape::Long {
                end_track_position, ..
            } => Some(end_track_position),
        }
    }

    /// Lowest track position the note ever covers.
    #[must_use]
    pub const fn earliest_track_position(&self) -> i64 {
        self.earliest_track_position
    }

    /// Highest track position the note ever covers.
    #[must_use]
    pub const fn latest_track_position(&self) -> i64 {
        self.latest_track_position
    }

    /// Lowest track position the note covers now.
    #[must_use]
    pub const fn earliest_held_position(&self) -> i64 {
        self.earliest_held_position
    }

    /// Highest track position the note covers now.
    #[must_use]
    pub const fn latest_held_position(&self) -> i64 {
        self.latest_held_position
    }

    /// Track position the head is drawn at.
    #[must_use]
    pub const fn head_track_position(&self) -> i64 {
        self.head_track_position
    }

    /// Whether the tail must be drawn upside down because the scroll runs backwards at the end.
    #[must_use]
    pub const fn should_flip_long_note_end(&self) -> bool {
        matches!(self.shape, NoteShape::Long { flip_end: true, .. })
    }

    /// Whether the note overlaps `[current - threshold, current + threshold]`.
    ///
    /// The current extent is used, which equals the static extent until a long note starts.
    #[must_use]
    pub fn in_range(&self, current_track_position: i64, threshold: i64) -> bool {
        extent_in_range(
            self.earliest_held_position,
            self.latest_held_position,
            current_track_position,
            threshold,
        )
    }

    /// Recomputes the current extent of a long note.
    ///
    /// Before `start_time` it is the static extent. Afterwards the head edge follows the live track
    /// position, the tail stays at the end position, and direction changes which are still ahead
    /// widen it.
    pub fn update_long_note_size(&mut self, current_time: f64, current_track_position: i64) {
        let NoteShape::Long {
            end_track_position,
            ref direction_changes,
            ..
        } = self.shape
        else {
            return;
        };

        if current_time < self.start_time {
            self.reset_extent();
            return;
        }

        let (earliest, latest) = fold_extent(
            current_track_position,
            end_track_position,
            direction_changes
                .iter()
                .filter(|change| change.time > current_time)
                .map(|change| change.position),
        );
        self.earliest_held_position = earliest;
        self.latest_held_position = latest;
        self.head_track_position = current_track_position;
    }

    /// Restores the static extent, used when a long note is missed without being held.
    pub(crate) const fn reset_extent(&mut self) {
        self.earliest_held_position = self.earliest_track_position;
        self.latest_held_position = self.latest_track_position;
        self.head_track_position = self.initial_track_position;
    }

    /// Resets the note for a new playthrough from a skip.
    pub(crate) const fn reset(&mut self) {
        self.reset_extent();
        self.state = NoteState::Alive;
        self.pooled = None;
    }

    /// Pixel coordinate of `position` relative to the receptor at `hit_position`.
    #[must_use]
    pub fn sprite_position(
        hit_position: f64,
        position: i64,
        current_track_position: i64,
        scroll_speed: f64,
        direction: LaneDirection,
    ) -> f64 {
        let speed = match direction {
            LaneDirection::Down => -scroll_speed,
            LaneDirection::Up => scroll_speed,
        };
        hit_position
            + position.saturating_sub(current_track_position) as f64 * speed / TRACK_ROUNDING as f64
    }

    /// Length of the current extent in pixels, zero for taps.
    #[must_use]
    pub fn body_length(&self, scroll_speed: f64) -> f64 {
        if !self.is_long_note() {
            return 0.0;
        }
        self.latest_held_position
            .saturating_sub(self.earliest_held_position) as f64
            * scroll_speed
            / TRACK_ROUNDING as f64
    }

    /// Links a pooled visual object, returning the one it replaced.
    pub fn link(&mut self, handle: PoolHandle) -> Option<PoolHandle> {
        self.pooled.replace(handle)
    }

    /// Unlinks the pooled visual object.
    pub fn unlink(&mut self) -> Option<PoolHandle> {
        self.pooled.take()
    }

    /// The linked pooled visual object.
    ///
    /// # Errors
    ///
    /// Returns [`PlayfieldError::NoPooledObject`] if nothing is linked.
    pub fn pooled_object(&self) -> Result<PoolHandle> {
        self.pooled
            .ok_or(PlayfieldError::NoPooledObject { note: self.id })
    }

    /// Whether a pooled visual object is linked.
    #[must_use]
    pub const fn has_pooled_object(&self) -> bool {
        self.pooled.is_some()
    }
}

/// Smallest interval containing both endpoints and every extra position.
fn fold_extent(head: i64, tail: i64, extra: impl Iterator<Item = i64>) -> (i64, i64) {
    let (earliest, latest) = extra.fold((head.min(tail), head.max(tail)), |(lo, hi), position| {
        (lo.min(position), hi.max(position))
    });
    if earliest > latest {
        log::warn!("inverted long note extent {earliest}..{latest}, clamping to its endpoints");
        return (head.min(tail), head.max(tail));
    }
    (earliest, latest)
}

/// Whether `[earliest, latest]` overlaps the window around `current`.
pub(crate) fn extent_in_range(earliest: i64, latest: i64, current: i64, threshold: i64) -> bool {
    let threshold = threshold.max(0).unsigned_abs();
    let window_start = current.saturating_sub(threshold as i64);
    let window_end = current.saturating_add(threshold as i64);
    earliest.abs_diff(current) <= threshold
        || latest.abs_diff(current) <= threshold
        || (earliest..=latest).contains(&window_start)
        || (earliest..=latest).contains(&window_end)
}
