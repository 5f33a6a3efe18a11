use playfield_rs::prelude::*;
use pretty_assertions::assert_eq;

use super::config_with_pool;
use super::dsl::{driver_for, kinds_of};

fn mixed_map() -> MapInfo {
    MapInfo::new(2).with_objects([
        HitObjectInfo::tap(1000.0, 1),
        HitObjectInfo::tap(2000.0, 1),
        HitObjectInfo::tap(3000.0, 1),
        HitObjectInfo::tap(4000.0, 1),
        HitObjectInfo::long(2500.0, 3500.0, 2),
    ])
}

#[derive(Debug, PartialEq)]
struct Snapshot {
    queues: Vec<[usize; 4]>,
    states: Vec<NoteState>,
    linked: Vec<bool>,
    in_use: usize,
}

fn snapshot(m: &HitObjectManager) -> Snapshot {
    Snapshot {
        queues: (1..=m.lane_count())
            .map(|lane| {
                [
                    m.pending_len(lane),
                    m.queue_len(lane, QueueTag::Active),
                    m.queue_len(lane, QueueTag::Held),
                    m.queue_len(lane, QueueTag::Dead),
                ]
            })
            .collect(),
        states: m.notes().iter().map(NoteController::state).collect(),
        linked: m
            .notes()
            .iter()
            .map(NoteController::has_pooled_object)
            .collect(),
        in_use: m.pool().in_use(),
    }
}

#[test]
fn test_skipping_twice_is_the_same_as_once() {
    let mut manager = HitObjectManager::new(&mixed_map(), config_with_pool(2));
    let _ = manager.update(1200.0).count();
    manager.handle_skip(2200.0);
    let once = snapshot(&manager);
    manager.handle_skip(2200.0);
    assert_eq!(snapshot(&manager), once);

    assert_eq!(once.queues, vec![[0, 2, 0, 0], [0, 1, 0, 0]]);
    assert_eq!(
        once.states,
        vec![
            NoteState::Removed,
            NoteState::Removed,
            NoteState::Alive,
            NoteState::Alive,
            NoteState::Alive,
        ]
    );
    assert_eq!(manager.current_time(), 2200.0);
}

#[test]
fn test_skip_past_a_held_note_drops_it() {
    let mut manager = HitObjectManager::new(&mixed_map(), config_with_pool(2));
    let _ = manager.update(2500.0).count();
    let held = manager.hit(2).unwrap();
    assert_eq!(kinds_of(&held), vec![(2, TransitionKind::Held)]);

    manager.handle_skip(3600.0);
    assert_eq!(manager.queue_len(2, QueueTag::Held), 0);
    assert_eq!(manager.pending_len(2), 0);
    let long_note = manager.note(NoteId(2)).unwrap();
    assert_eq!(long_note.state(), NoteState::Removed);
    assert!(!long_note.has_pooled_object());
    assert_eq!(long_note.earliest_held_position(), 250_000);
}

#[test]
fn test_skip_keeps_straddling_long_note() {
    let mut manager = HitObjectManager::new(&mixed_map(), config_with_pool(2));
    manager.handle_skip(3000.0);
    let long_note = manager.note(NoteId(2)).unwrap();
    assert_eq!(long_note.state(), NoteState::Alive);
    assert!(long_note.has_pooled_object());
    assert_eq!(manager.queue_len(2, QueueTag::Active), 1);
    assert_eq!(manager.pending_len(1), 0);
    assert_eq!(manager.queue_len(1, QueueTag::Active), 2);
    assert!(!manager.is_complete());

    assert!(manager.update(3000.0).next().is_none());
    // The head is long gone, so the note is missed as soon as time moves on.
    let missed: Vec<_> = manager.update(3016.0).collect();
    assert_eq!(
        kinds_of(&missed),
        vec![(2, TransitionKind::HeadMissed), (2, TransitionKind::TailMissed)]
    );
    assert!(!manager.is_complete());
}

#[test]
fn test_skip_while_holding_a_straddling_note_restarts_it() {
    let mut manager = HitObjectManager::new(&mixed_map(), config_with_pool(2));
    let _ = manager.update(2500.0).count();
    let _ = manager.hit(2).unwrap();

    manager.handle_skip(3000.0);
    assert_eq!(manager.queue_len(2, QueueTag::Held), 0);
    assert_eq!(manager.queue_len(2, QueueTag::Active), 1);
    assert_eq!(manager.closest_tap(2).map(NoteController::id), Some(NoteId(2)));
    assert_eq!(manager.notes()[2].state(), NoteState::Alive);
}

#[test]
fn test_skip_backwards_restarts_positions() {
    let mut manager = HitObjectManager::new(&mixed_map(), config_with_pool(2));
    let _ = manager.update(3000.0).count();
    let _ = manager.update(3400.0).count();

    manager.handle_skip(500.0);
    let transitions: Vec<_> = manager.update(500.0).collect();
    assert!(transitions.is_empty());
    assert_eq!(manager.groups()[0].current_track_position(), 50_000);
    assert!(
        manager
            .notes()
            .iter()
            .all(|note| note.state() == NoteState::Alive)
    );
    assert_eq!(snapshot(&manager).queues, vec![[2, 2, 0, 0], [0, 1, 0, 0]]);
}

#[test]
fn test_seek_while_playing() {
    driver_for(&mixed_map(), config_with_pool(2))
        .past_ms(1000)
        .hit(1)
        .past_ms(16)
        .skip_to(3600.0)
        .transitions(|t| assert!(t.is_empty()))
        .view(|m| {
            assert_eq!(m.current_time(), 3600.0);
            assert_eq!(m.closest_tap(1).map(NoteController::start_time), Some(4000.0));
            assert!(m.closest_tap(2).is_none());
        })
        .past_ms(500)
        .hit(1)
        .view(|m| assert!(m.is_complete()))
        .run();
}
