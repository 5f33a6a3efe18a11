use playfield_rs::prelude::*;
use pretty_assertions::assert_eq;

#[test]
fn test_config_and_map_survive_json() {
    let config = PlayfieldConfig {
        scroll_direction: ScrollDirection::UpSplit,
        modifiers: Modifiers::MIRROR | Modifiers::NO_SLIDER_VELOCITY,
        initial_pool_size_per_lane: 8,
        ..PlayfieldConfig::default()
    };
    let json = serde_json::to_string(&config).unwrap();
    let parsed_config: PlayfieldConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed_config, config);

    let map = MapInfo::new(4)
        .with_group(
            "lead",
            TimingGroupInfo::new(0.5, vec![VelocityChangePoint::new(250.0, -1.0)]),
        )
        .with_objects([
            HitObjectInfo::tap(100.0, 1),
            HitObjectInfo::long(200.0, 900.0, 3).in_group("lead"),
        ]);
    let json = serde_json::to_string(&map).unwrap();
    let parsed: MapInfo = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, map);

    // Both build the same playfield.
    let first = HitObjectManager::new(&map, config);
    let second = HitObjectManager::new(&parsed, parsed_config);
    assert_eq!(
        first.notes().iter().map(NoteController::lane).collect::<Vec<_>>(),
        second.notes().iter().map(NoteController::lane).collect::<Vec<_>>()
    );
}

#[test]
fn test_transitions_serialize_with_variant_names() {
    let transition = NoteTransition::new(
        NoteId(3),
        2,
        TransitionKind::Released(ReleaseOutcome::Early),
    );
    let value = serde_json::to_value(transition).unwrap();
    assert_eq!(value["kind"]["Released"], "Early");
    assert_eq!(value["lane"], 2);
}
