use playfield_rs::prelude::*;
use pretty_assertions::assert_eq;

use super::config_with_pool;
use super::dsl::{driver_for, kinds_of, single_lane_taps};

fn queue_lens(m: &HitObjectManager, lane: usize) -> [usize; 4] {
    [
        m.pending_len(lane),
        m.queue_len(lane, QueueTag::Active),
        m.queue_len(lane, QueueTag::Held),
        m.queue_len(lane, QueueTag::Dead),
    ]
}

#[test]
fn test_objects_return_to_the_pool() {
    driver_for(&single_lane_taps(&[1000.0]), config_with_pool(0))
        .check(|m| {
            assert_eq!(queue_lens(m, 1), [0, 1, 0, 0]);
            assert_eq!(m.pool().in_use(), 1);
        })
        .past_ms(2165)
        .transitions(|t| {
            assert_eq!(
                kinds_of(t),
                vec![(0, TransitionKind::HeadMissed), (0, TransitionKind::Recycled)]
            );
        })
        .view(|m| {
            assert_eq!(queue_lens(m, 1), [0, 0, 0, 0]);
            assert_eq!(m.pool().in_use(), 0);
            assert_eq!(m.pool().capacity(), 1);
            assert!(!m.notes()[0].has_pooled_object());
        })
        .run();
}

#[test]
fn test_recycled_object_is_handed_to_the_next_note() {
    driver_for(&single_lane_taps(&[1000.0, 5000.0]), config_with_pool(1))
        .past_ms(0)
        .transitions(|t| assert!(t.is_empty()))
        .view(|m| assert_eq!(queue_lens(m, 1), [1, 1, 0, 0]))
        .past_ms(2165)
        .transitions(|t| {
            assert_eq!(
                kinds_of(t),
                vec![
                    (0, TransitionKind::HeadMissed),
                    (0, TransitionKind::Recycled),
                    (1, TransitionKind::Activated),
                ]
            );
        })
        .view(|m| {
            assert_eq!(queue_lens(m, 1), [0, 1, 0, 0]);
            assert_eq!(m.pool().capacity(), 1);
            let handle = m.notes()[1].pooled_object().unwrap();
            assert_eq!(m.pool().note(handle), Some(NoteId(1)));
            assert_eq!(m.pool().queue_of(handle), Some(QueueTag::Active));
            assert_eq!(
                m.notes()[0].pooled_object(),
                Err(PlayfieldError::NoPooledObject { note: NoteId(0) })
            );
        })
        .past_ms(100)
        .transitions(|t| assert!(t.is_empty()))
        .run();
}

#[test]
fn test_lanes_have_their_own_queues() {
    let map = MapInfo::new(2).with_objects([
        HitObjectInfo::tap(1000.0, 1),
        HitObjectInfo::tap(2000.0, 1),
        HitObjectInfo::tap(3000.0, 1),
        HitObjectInfo::tap(1500.0, 2),
    ]);
    driver_for(&map, config_with_pool(2))
        .check(|m| {
            assert_eq!(queue_lens(m, 1), [1, 2, 0, 0]);
            assert_eq!(queue_lens(m, 2), [0, 1, 0, 0]);
            assert_eq!(m.pool().capacity(), 3);
        })
        .past_ms(1000)
        .hit(1)
        .transitions(|t| {
            assert_eq!(
                kinds_of(t),
                vec![(0, TransitionKind::Removed), (3, TransitionKind::Activated)]
            );
        })
        .view(|m| {
            assert_eq!(queue_lens(m, 1), [0, 2, 0, 0]);
            assert_eq!(queue_lens(m, 2), [0, 1, 0, 0]);
            assert_eq!(m.closest_tap(1).map(NoteController::start_time), Some(2000.0));
        })
        .run();
}
