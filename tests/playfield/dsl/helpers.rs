//! DSL helper functions

use playfield_rs::prelude::*;

use super::TestPlayfieldDriver;

/// Creates a driver for `map` with `config`
#[must_use]
pub fn driver_for(map: &MapInfo, config: PlayfieldConfig) -> TestPlayfieldDriver {
    TestPlayfieldDriver::new(HitObjectManager::new(map, config))
}

/// A one lane map of taps at the given times under constant velocity
#[must_use]
pub fn single_lane_taps(times: &[f64]) -> MapInfo {
    MapInfo::new(1).with_objects(times.iter().map(|&time| HitObjectInfo::tap(time, 1)))
}

/// Note ids and kinds of transitions, for compact assertions
#[must_use]
pub fn kinds_of(transitions: &[NoteTransition]) -> Vec<(usize, TransitionKind)> {
    transitions
        .iter()
        .map(|transition| (transition.note.value(), transition.kind))
        .collect()
}
