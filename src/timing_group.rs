//! Timing group controller.
//!
//! Each timing group scrolls on its own velocity timeline. Local groups see the velocities of the
//! default group merged into theirs, so a map only needs to list the changes a group adds.

use itertools::Itertools;
use rustc_hash::FxHashSet;

use crate::config::{Modifiers, PlayfieldConfig};
use crate::map::{TimingGroupId, TimingGroupInfo};
use crate::note::{NoteController, NoteId, NoteShape};
use crate::spatial::SpatialHashMap1D;
use crate::velocity::{TRACK_ROUNDING, VelocityChangePoint, VelocityPositionIndex};

/// Whether a group is the default group or merges with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimingGroupKind {
    /// The always-present default group.
    Global,
    /// A group merged with the default group.
    Local,
}

/// Velocity timeline, current position and spatial hash of one timing group.
#[derive(Debug, Clone)]
pub struct TimingGroupController {
    id: TimingGroupId,
    kind: TimingGroupKind,
    index: VelocityPositionIndex,
    /// Segment index of `current_time`, only moves forward between skips.
    segment_index: usize,
    current_time: f64,
    current_track_position: i64,
    render_threshold: i64,
    spatial: SpatialHashMap1D<NoteId>,
}

impl TimingGroupController {
    /// Builds the controller of the group `id`.
    ///
    /// `global` is the default group's timeline. It is ignored when `id` is the default group.
    #[must_use]
    pub fn new(
        id: TimingGroupId,
        info: &TimingGroupInfo,
        global: &TimingGroupInfo,
        config: &PlayfieldConfig,
    ) -> Self {
        let kind = if id.is_default() {
            TimingGroupKind::Global
        } else {
            TimingGroupKind::Local
        };
        let points = match kind {
            TimingGroupKind::Global => info.scroll_velocities.clone(),
            TimingGroupKind::Local => merge_velocities(global, info),
        };
        let index = VelocityPositionIndex::new(info.initial_scroll_velocity, points)
            .ignoring_velocities(config.modifiers.contains(Modifiers::NO_SLIDER_VELOCITY));
        log::debug!(
            "timing group {} ({kind:?}) with {} velocity points",
            id.as_str(),
            index.points().len()
        );

        let mut controller = Self {
            id,
            kind,
            index,
            segment_index: 0,
            current_time: f64::NEG_INFINITY,
            current_track_position: 0,
            render_threshold: 0,
            spatial: SpatialHashMap1D::new(config.cell_size)
                .with_overflow_factor(config.overflow_cell_factor),
        };
        controller
            .recompute_render_threshold(config.viewport_height, config.scroll.effective_speed());
        controller
    }

    /// Id of the group.
    #[must_use]
    pub const fn id(&self) -> &TimingGroupId {
        &self.id
    }

    /// Kind of the group.
    #[must_use]
    pub const fn kind(&self) -> TimingGroupKind {
        self.kind
    }

    /// Velocity timeline of the group.
    #[must_use]
    pub const fn index(&self) -> &VelocityPositionIndex {
        &self.index
    }

    /// Track position at `time` on this group's timeline.
    #[must_use]
    pub fn position_at(&self, time: f64) -> i64 {
        self.index.position_at(time)
    }

    /// Track position at the last update.
    #[must_use]
    pub const fn current_track_position(&self) -> i64 {
        self.current_track_position
    }

    /// Half width of the visible window, in track units.
    #[must_use]
    pub const fn render_threshold(&self) -> i64 {
        self.render_threshold
    }

    /// Spatial hash of the group's notes.
    #[must_use]
    pub const fn spatial(&self) -> &SpatialHashMap1D<NoteId> {
        &self.spatial
    }

    /// Recomputes the render threshold for a viewport height in pixels and a scroll speed in
    /// pixels per millisecond.
    pub fn recompute_render_threshold(&mut self, viewport_height: f64, scroll_speed: f64) {
        let threshold = viewport_height * TRACK_ROUNDING as f64 / scroll_speed;
        self.render_threshold = if threshold.is_finite() && threshold >= 0.0 {
            threshold as i64
        } else {
            log::warn!(
                "render threshold of group {} is not finite, every note is visible",
                self.id.as_str()
            );
            i64::MAX / 2
        };
    }

    /// Advances the current track position to `time`.
    ///
    /// The cached segment index moves forward only. Going back in time without a skip is tolerated
    /// by searching the index again.
    pub fn update_current_track_position(&mut self, time: f64) {
        if time < self.current_time {
            log::debug!(
                "group {} went back from {}ms to {time}ms without a skip",
                self.id.as_str(),
                self.current_time
            );
            self.segment_index = self.index.segment_index(time);
        } else {
            self.segment_index = self.index.advance_segment_index(self.segment_index, time);
        }
        self.current_time = time;
        self.current_track_position = self.index.position_at_index(time, self.segment_index);
    }

    /// Forgets the cached segment index, the next update searches from the first segment.
    pub fn handle_skip(&mut self) {
        self.segment_index = 0;
        self.current_time = f64::NEG_INFINITY;
    }

    /// Buckets every note of this group.
    ///
    /// A long note covers its whole static extent. One scrolling backwards, whose tail lies before
    /// its head, goes to the overflow set like an overly long one.
    pub fn generate_spatial_hash_map<'a>(
        &mut self,
        notes: impl IntoIterator<Item = &'a NoteController>,
    ) {
        self.spatial.clear();
        let mut overflowed = 0usize;
        for note in notes {
            match note.shape() {
                NoteShape::Tap => self.spatial.add(note.initial_track_position(), note.id()),
                NoteShape::Long {
                    end_track_position, ..
                } => {
                    let bucketed = if *end_track_position < note.initial_track_position() {
                        self.spatial.add_range(
                            note.initial_track_position(),
                            *end_track_position,
                            note.id(),
                        )
                    } else {
                        self.spatial.add_range(
                            note.earliest_track_position(),
                            note.latest_track_position(),
                            note.id(),
                        )
                    };
                    if !bucketed {
                        overflowed += 1;
                    }
                }
            }
        }
        log::debug!(
            "group {}: {} cells, {overflowed} overflowed notes",
            self.id.as_str(),
            self.spatial.cell_count()
        );
    }

    /// Adds the notes which may be visible now to `out`.
    ///
    /// Cell granularity lets false positives through, so callers still check
    /// [`NoteController::in_range`].
    pub fn union_in_range_candidates(&self, out: &mut FxHashSet<NoteId>) {
        self.spatial
            .union_range_into(self.current_track_position, self.render_threshold, out);
    }
}

/// Merges the default group's points into a local group's points.
///
/// Points sharing a time keep the local one last, so it wins.
fn merge_velocities(global: &TimingGroupInfo, local: &TimingGroupInfo) -> Vec<VelocityChangePoint> {
    global
        .scroll_velocities
        .iter()
        .merge_by(local.scroll_velocities.iter(), |global, local| {
            global.start_time <= local.start_time
        })
        .copied()
        .collect()
}
