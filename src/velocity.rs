//! Velocity position index.
//!
//! Converts song time into track position under a piecewise constant scroll velocity. Positions
//! are fixed-point integers scaled by [`TRACK_ROUNDING`], so that integrating many segments over a
//! long map never accumulates floating point drift.
//!
//! Every conversion from `f64` into a position truncates toward zero. The same rule is applied to
//! each segment while building the markers and to every lookup.

use smallvec::SmallVec;

/// Fixed-point scale of track positions. One millisecond at velocity 1.0 is this many units.
pub const TRACK_ROUNDING: i64 = 100;

/// A point where the scroll velocity changes.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VelocityChangePoint {
    /// Time the multiplier starts to apply, in milliseconds.
    pub start_time: f64,
    /// Velocity multiplier. Zero freezes the scroll, negative values scroll backwards.
    pub multiplier: f64,
}

impl VelocityChangePoint {
    /// Create a new change point.
    #[must_use]
    pub const fn new(start_time: f64, multiplier: f64) -> Self {
        Self {
            start_time,
            multiplier,
        }
    }
}

/// A point where the sign of the velocity flips.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionChange {
    /// Time of the flip, in milliseconds.
    pub time: f64,
    /// Track position at the flip.
    pub position: i64,
}

/// List of direction changes. Most long notes see none or very few.
pub type DirectionChanges = SmallVec<[DirectionChange; 4]>;

/// Converts a product of time and velocity into fixed-point track units.
#[inline]
pub(crate) fn to_track(value: f64) -> i64 {
    (value * TRACK_ROUNDING as f64) as i64
}

/// Sign of a multiplier, `None` for a frozen scroll.
#[inline]
fn direction_of(multiplier: f64) -> Option<bool> {
    if multiplier > 0.0 {
        Some(true)
    } else if multiplier < 0.0 {
        Some(false)
    } else {
        None
    }
}

/// Precomputed track positions at each velocity change point.
///
/// Built once per timing group and immutable afterwards.
#[derive(Debug, Clone)]
pub struct VelocityPositionIndex {
    initial_velocity: f64,
    points: Vec<VelocityChangePoint>,
    /// `markers[i]` is the track position at `points[i].start_time`.
    markers: Vec<i64>,
    ignore_velocities: bool,
}

impl VelocityPositionIndex {
    /// Build the index from an initial velocity and change points.
    ///
    /// Malformed input is repaired instead of rejected: points with a non-finite time are dropped,
    /// non-finite multipliers become zero, and an unsorted list is stably sorted by time.
    #[must_use]
    pub fn new(initial_velocity: f64, points: Vec<VelocityChangePoint>) -> Self {
        let initial_velocity = if initial_velocity.is_finite() {
            initial_velocity
        } else {
            log::warn!("non-finite initial scroll velocity {initial_velocity}, using 1.0");
            1.0
        };

        let mut points: Vec<_> = points
            .into_iter()
            .filter(|point| {
                let finite = point.start_time.is_finite();
                if !finite {
                    log::warn!("dropping velocity change at non-finite time {}", point.start_time);
                }
                finite
            })
            .map(|point| {
                if point.multiplier.is_finite() {
                    point
                } else {
                    log::warn!(
                        "non-finite velocity multiplier at {}ms, freezing instead",
                        point.start_time
                    );
                    VelocityChangePoint::new(point.start_time, 0.0)
                }
            })
            .collect();

        if points
            .windows(2)
            .any(|pair| pair[1].start_time < pair[0].start_time)
        {
            log::warn!("velocity change points are not sorted, sorting them by time");
            points.sort_by(|a, b| a.start_time.total_cmp(&b.start_time));
        }

        let mut markers = Vec::with_capacity(points.len());
        if let Some(first) = points.first() {
            let mut position = to_track(first.start_time * initial_velocity);
            markers.push(position);
            for pair in points.windows(2) {
                let span = pair[1].start_time - pair[0].start_time;
                position = position.saturating_add(to_track(span * pair[0].multiplier));
                markers.push(position);
            }
        }

        Self {
            initial_velocity,
            points,
            markers,
            ignore_velocities: false,
        }
    }

    /// Makes every lookup ignore the velocities, scrolling linearly with time.
    #[must_use]
    pub const fn ignoring_velocities(mut self, ignore: bool) -> Self {
        self.ignore_velocities = ignore;
        self
    }

    /// Whether the velocities are ignored.
    #[must_use]
    pub const fn ignores_velocities(&self) -> bool {
        self.ignore_velocities
    }

    /// The velocity before the first change point.
    #[must_use]
    pub const fn initial_velocity(&self) -> f64 {
        self.initial_velocity
    }

    /// The change points, sorted by time.
    #[must_use]
    pub fn points(&self) -> &[VelocityChangePoint] {
        &self.points
    }

    /// Track positions at each change point.
    #[must_use]
    pub fn markers(&self) -> &[i64] {
        &self.markers
    }

    /// Number of change points whose `start_time` is at or before `time`.
    ///
    /// This is the segment index accepted by [`Self::position_at_index`].
    #[must_use]
    pub fn segment_index(&self, time: f64) -> usize {
        self.points.partition_point(|point| point.start_time <= time)
    }

    /// Moves a cached segment index forward until it matches `time`.
    ///
    /// The index never moves backwards; a cache which is ahead of `time` must be reset first.
    #[must_use]
    pub fn advance_segment_index(&self, mut index: usize, time: f64) -> usize {
        while index < self.points.len() && self.points[index].start_time <= time {
            index += 1;
        }
        index
    }

    /// Track position at `time`.
    #[must_use]
    pub fn position_at(&self, time: f64) -> i64 {
        if self.ignore_velocities {
            return to_track(time);
        }
        self.position_at_index(time, self.segment_index(time))
    }

    /// Track position at `time` with a known segment index.
    #[must_use]
    pub fn position_at_index(&self, time: f64, index: usize) -> i64 {
        if self.ignore_velocities {
            return to_track(time);
        }
        match index.checked_sub(1) {
            None => to_track(time * self.initial_velocity),
            Some(last) => {
                let point = &self.points[last];
                self.markers[last]
                    .saturating_add(to_track((time - point.start_time) * point.multiplier))
            }
        }
    }

    /// Velocity multiplier in effect at `time`.
    #[must_use]
    pub fn velocity_at(&self, time: f64) -> f64 {
        if self.ignore_velocities {
            return 1.0;
        }
        self.velocity_at_index(self.segment_index(time))
    }

    fn velocity_at_index(&self, index: usize) -> f64 {
        index
            .checked_sub(1)
            .map_or(self.initial_velocity, |last| self.points[last].multiplier)
    }

    /// Points in `(start, end]` where the scroll direction flips.
    ///
    /// The direction is seeded from the multiplier in effect at `start`. A zero multiplier freezes
    /// the position and keeps the previous direction, so `+, 0, -` reports one flip where the
    /// negative segment starts. Change points sharing a time only count with their last entry.
    #[must_use]
    pub fn direction_changes_between(&self, start: f64, end: f64) -> DirectionChanges {
        let mut changes = DirectionChanges::new();
        if self.ignore_velocities || end <= start {
            return changes;
        }

        let first = self.segment_index(start);
        let mut forward = direction_of(self.velocity_at_index(first));
        for (index, point) in self.points.iter().enumerate().skip(first) {
            if point.start_time > end {
                break;
            }
            if self
                .points
                .get(index + 1)
                .is_some_and(|next| next.start_time <= point.start_time)
            {
                continue;
            }
            let Some(direction) = direction_of(point.multiplier) else {
                continue;
            };
            if forward.is_some_and(|previous| previous != direction) {
                changes.push(DirectionChange {
                    time: point.start_time,
                    position: self.markers[index],
                });
            }
            forward = Some(direction);
        }
        changes
    }
}
