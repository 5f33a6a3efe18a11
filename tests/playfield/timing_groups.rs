use playfield_rs::prelude::*;
use playfield_rs::velocity::DirectionChange;
use pretty_assertions::assert_eq;
use rustc_hash::FxHashSet;

use super::config_with_pool;

fn velocities(points: &[(f64, f64)]) -> TimingGroupInfo {
    TimingGroupInfo::new(
        1.0,
        points
            .iter()
            .map(|&(time, multiplier)| VelocityChangePoint::new(time, multiplier))
            .collect(),
    )
}

#[test]
fn test_local_group_scrolls_on_its_own_timeline() {
    let map = MapInfo::new(2)
        .with_default_group(velocities(&[(0.0, 1.0), (1000.0, 2.0)]))
        .with_group("lead", velocities(&[(500.0, 0.5)]))
        .with_objects([
            HitObjectInfo::tap(800.0, 1),
            HitObjectInfo::tap(800.0, 2).in_group("lead"),
        ]);
    let mut manager = HitObjectManager::new(&map, config_with_pool(1));

    let lead = &manager.groups()[1];
    assert_eq!(lead.id().as_str(), "lead");
    assert_eq!(lead.kind(), TimingGroupKind::Local);

    let _ = manager.update(200.0).count();
    let heads: Vec<_> = manager
        .visible_notes()
        .map(|rendered| (rendered.lane, rendered.group, rendered.head))
        .collect();
    assert_eq!(heads, vec![(1, 0, 1080.0 - 600.0), (2, 1, 1080.0 - 450.0)]);

    let _ = manager.update(1500.0).count();
    assert_eq!(manager.groups()[0].current_track_position(), 200_000);
    // 500ms at 1.0, 500ms at 0.5, then the default group's 2.0.
    assert_eq!(manager.groups()[1].current_track_position(), 175_000);
}

#[test]
fn test_unknown_group_falls_back_to_default() {
    let map = MapInfo::new(1).with_objects([HitObjectInfo::tap(1000.0, 1).in_group("ghost")]);
    let manager = HitObjectManager::new(&map, config_with_pool(1));
    assert_eq!(manager.groups().len(), 1);
    assert_eq!(manager.notes()[0].group(), 0);
}

#[test]
fn test_map_without_default_group_scrolls_at_one() {
    let mut map = MapInfo::new(1).with_objects([HitObjectInfo::tap(1000.0, 1)]);
    map.timing_groups.clear();
    let mut manager = HitObjectManager::new(&map, config_with_pool(1));
    let _ = manager.update(400.0).count();
    assert_eq!(manager.groups()[0].current_track_position(), 40_000);
    assert_eq!(manager.groups()[0].kind(), TimingGroupKind::Global);
}

#[test]
fn test_direction_changes_of_a_reversal() {
    let index = VelocityPositionIndex::new(
        1.0,
        vec![
            VelocityChangePoint::new(0.0, 1.0),
            VelocityChangePoint::new(1000.0, -1.0),
            VelocityChangePoint::new(2000.0, 1.0),
        ],
    );
    let changes: Vec<_> = index.direction_changes_between(0.0, 2500.0).into_iter().collect();
    assert_eq!(
        changes,
        vec![
            DirectionChange {
                time: 1000.0,
                position: 100_000,
            },
            DirectionChange {
                time: 2000.0,
                position: 0,
            },
        ]
    );
    assert!(index.direction_changes_between(1000.0, 1999.0).is_empty());
}

#[test]
fn test_positions_never_decrease_with_positive_velocities() {
    let index = VelocityPositionIndex::new(
        0.7,
        vec![
            VelocityChangePoint::new(-200.0, 1.3),
            VelocityChangePoint::new(0.0, 0.25),
            VelocityChangePoint::new(333.3, 4.0),
            VelocityChangePoint::new(333.3, 2.0),
            VelocityChangePoint::new(1250.0, 0.01),
            VelocityChangePoint::new(5000.0, 1.0),
        ],
    );
    let mut previous = i64::MIN;
    for step in -500..8000 {
        let time = f64::from(step) * 0.75;
        let position = index.position_at(time);
        assert!(position >= previous, "position went back at {time}ms");
        previous = position;
    }
}

#[test]
fn test_very_long_note_is_always_a_candidate() {
    // Twenty seconds at velocity 1.0 spans more than ten cells.
    let map = MapInfo::new(1).with_objects([
        HitObjectInfo::long(0.0, 20_000.0, 1),
        HitObjectInfo::tap(30_000.0, 1),
    ]);
    let manager = HitObjectManager::new(&map, config_with_pool(1));
    let spatial = manager.groups()[0].spatial();
    assert!(spatial.is_overflow(&NoteId(0)));
    assert!(!spatial.is_overflow(&NoteId(1)));
    assert_eq!(spatial.overflow().count(), 1);

    for center in [-5_000_000, 0, 1_000_000, 9_000_000] {
        let mut out = FxHashSet::default();
        spatial.union_range_into(center, 1000, &mut out);
        assert!(out.contains(&NoteId(0)), "missing around {center}");
    }
}

#[test]
fn test_long_note_straddling_the_window_is_in_range() {
    let index = VelocityPositionIndex::new(1.0, Vec::new());
    let note = NoteController::new(NoteId(0), &HitObjectInfo::long(-5.0, 15.0, 1), 1, 0, &index);
    assert_eq!(
        (note.earliest_track_position(), note.latest_track_position()),
        (-500, 1500)
    );
    assert!(note.in_range(0, 400));
    assert!(!note.in_range(3000, 400));
}
