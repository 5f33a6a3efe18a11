//! Input model handed over by the map loader.
//!
//! Parsing map files is not done here: the loader builds a [`MapInfo`] and passes it to
//! [`crate::manager::HitObjectManager::new`].

use std::collections::BTreeMap;

use crate::velocity::VelocityChangePoint;

/// Id of the always-present default timing group.
pub const DEFAULT_TIMING_GROUP: &str = "$Default";

/// Identifier of a timing group.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimingGroupId(pub String);

impl TimingGroupId {
    /// Create a new `TimingGroupId`.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id of the default group.
    #[must_use]
    pub fn default_group() -> Self {
        Self(DEFAULT_TIMING_GROUP.to_owned())
    }

    /// Whether this is the id of the default group.
    #[must_use]
    pub fn is_default(&self) -> bool {
        self.0 == DEFAULT_TIMING_GROUP
    }

    /// Get the internal string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TimingGroupId {
    fn default() -> Self {
        Self::default_group()
    }
}

impl From<&str> for TimingGroupId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// A hit object of the map.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HitObjectInfo {
    /// Time to hit, in milliseconds.
    pub start_time: f64,
    /// Time to release, in milliseconds. `None` for taps.
    pub end_time: Option<f64>,
    /// 1-indexed lane.
    pub lane: usize,
    /// Timing group the object scrolls with.
    pub timing_group: TimingGroupId,
}

impl HitObjectInfo {
    /// Create a tap note in the default timing group.
    #[must_use]
    pub fn tap(start_time: f64, lane: usize) -> Self {
        Self {
            start_time,
            end_time: None,
            lane,
            timing_group: TimingGroupId::default_group(),
        }
    }

    /// Create a long note in the default timing group.
    #[must_use]
    pub fn long(start_time: f64, end_time: f64, lane: usize) -> Self {
        Self {
            start_time,
            end_time: Some(end_time),
            lane,
            timing_group: TimingGroupId::default_group(),
        }
    }

    /// Moves the object into another timing group.
    #[must_use]
    pub fn in_group(mut self, group: impl Into<String>) -> Self {
        self.timing_group = TimingGroupId::new(group);
        self
    }

    /// Whether the object needs to be held.
    #[must_use]
    pub const fn is_long_note(&self) -> bool {
        self.end_time.is_some()
    }
}

/// Scroll velocities of a timing group.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimingGroupInfo {
    /// Velocity used before the first change point.
    pub initial_scroll_velocity: f64,
    /// Change points, expected in ascending `start_time` order.
    pub scroll_velocities: Vec<VelocityChangePoint>,
}

impl Default for TimingGroupInfo {
    fn default() -> Self {
        Self {
            initial_scroll_velocity: 1.0,
            scroll_velocities: Vec::new(),
        }
    }
}

impl TimingGroupInfo {
    /// Create a group from its initial velocity and change points.
    #[must_use]
    pub const fn new(
        initial_scroll_velocity: f64,
        scroll_velocities: Vec<VelocityChangePoint>,
    ) -> Self {
        Self {
            initial_scroll_velocity,
            scroll_velocities,
        }
    }
}

/// Everything the playfield needs from a map.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MapInfo {
    /// Number of lanes.
    pub lane_count: usize,
    /// Hit objects, in any order.
    pub hit_objects: Vec<HitObjectInfo>,
    /// Timing groups by id. The default group is implied when missing.
    pub timing_groups: BTreeMap<TimingGroupId, TimingGroupInfo>,
}

impl MapInfo {
    /// Create an empty map with `lane_count` lanes and only the default timing group.
    #[must_use]
    pub fn new(lane_count: usize) -> Self {
        let mut timing_groups = BTreeMap::new();
        timing_groups.insert(TimingGroupId::default_group(), TimingGroupInfo::default());
        Self {
            lane_count,
            hit_objects: Vec::new(),
            timing_groups,
        }
    }

    /// Replaces the velocities of the default group.
    #[must_use]
    pub fn with_default_group(mut self, group: TimingGroupInfo) -> Self {
        self.timing_groups
            .insert(TimingGroupId::default_group(), group);
        self
    }

    /// Adds or replaces a timing group.
    #[must_use]
    pub fn with_group(mut self, id: impl Into<String>, group: TimingGroupInfo) -> Self {
        self.timing_groups.insert(TimingGroupId::new(id), group);
        self
    }

    /// Adds hit objects.
    #[must_use]
    pub fn with_objects(mut self, objects: impl IntoIterator<Item = HitObjectInfo>) -> Self {
        self.hit_objects.extend(objects);
        self
    }
}
