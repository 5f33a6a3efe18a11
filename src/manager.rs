//! Hit object manager.
//!
//! Owns the notes, the timing groups and the pool of visual objects, and moves notes through their
//! lifecycle once per frame:
//!
//! 1. pending notes crossing the activation threshold get a pooled object and become active,
//! 2. active notes whose press window elapsed die,
//! 3. held long notes whose release window elapsed die,
//! 4. dead notes far enough away are recycled, handing their pooled object to the next pending
//!    note of the lane,
//! 5. long note sizes follow the new track positions.
//!
//! The track positions of the timing groups are advanced before step 1, since every step compares
//! against them. A note is never missed at the song time it was activated at, so repeating an
//! update with the same time changes nothing.

use std::collections::VecDeque;

use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

use crate::config::{ControlEvent, Modifiers, PlayfieldConfig};
use crate::error::{PlayfieldError, Result};
use crate::map::{HitObjectInfo, MapInfo, TimingGroupId};
use crate::note::{NoteController, NoteId, NoteState};
use crate::playfield::{
    NoteTransition, Playfield, ReleaseOutcome, RenderedNote, TransitionKind,
};
use crate::pool::{NotePool, PoolHandle, QueueTag};
use crate::timing_group::TimingGroupController;

type Handles = SmallVec<[PoolHandle; 4]>;

/// Scales a track distance by a configured factor.
fn scale(distance: i64, factor: f64) -> i64 {
    (distance as f64 * factor) as i64
}

/// The orchestrator of notes, timing groups and pooled objects.
#[derive(Debug, Clone)]
pub struct HitObjectManager {
    config: PlayfieldConfig,
    lane_count: usize,
    map_end_time: f64,
    groups: Vec<TimingGroupController>,
    /// Indexed by [`NoteId`].
    notes: Vec<NoteController>,
    /// Every note of each lane in start time order.
    lane_notes: Vec<Vec<NoteId>>,
    /// Notes without a pooled object yet, per lane.
    pending: Vec<VecDeque<NoteId>>,
    /// Song time each note was last activated at, indexed by [`NoteId`].
    activated_at: Vec<f64>,
    pool: NotePool,
    current_time: f64,
    /// Pixels per millisecond at velocity 1.0.
    scroll_speed: f64,
}

impl HitObjectManager {
    /// Builds the playfield of `map`.
    ///
    /// Objects on lanes outside `1..=lane_count` or at non-finite times are dropped, objects of
    /// unknown timing groups scroll with the default group. The timing groups of the default
    /// group are used when the map does not list it.
    #[must_use]
    pub fn new(map: &MapInfo, config: PlayfieldConfig) -> Self {
        let lane_count = map.lane_count;
        if config.scroll.speed == 0 {
            log::warn!("scroll speed is zero, notes will not move on screen");
        }

        let default_id = TimingGroupId::default_group();
        let default_info = map
            .timing_groups
            .get(&default_id)
            .cloned()
            .unwrap_or_default();
        let mut groups = vec![TimingGroupController::new(
            default_id.clone(),
            &default_info,
            &default_info,
            &config,
        )];
        let mut group_indices = FxHashMap::default();
        group_indices.insert(default_id, 0usize);
        for (id, info) in map.timing_groups.iter().filter(|(id, _)| !id.is_default()) {
            group_indices.insert(id.clone(), groups.len());
            groups.push(TimingGroupController::new(
                id.clone(),
                info,
                &default_info,
                &config,
            ));
        }

        let mut objects: Vec<&HitObjectInfo> = map
            .hit_objects
            .iter()
            .filter(|object| is_playable(object, lane_count))
            .collect();
        objects.sort_by(|a, b| {
            a.start_time
                .total_cmp(&b.start_time)
                .then(a.lane.cmp(&b.lane))
        });

        let mirror = config.modifiers.contains(Modifiers::MIRROR);
        let mut lane_notes = vec![Vec::new(); lane_count];
        let notes: Vec<NoteController> = objects
            .iter()
            .enumerate()
            .map(|(index, object)| {
                let id = NoteId(index);
                let lane = if mirror {
                    lane_count + 1 - object.lane
                } else {
                    object.lane
                };
                let group = group_indices
                    .get(&object.timing_group)
                    .copied()
                    .unwrap_or_else(|| {
                        log::warn!(
                            "unknown timing group {:?}, using the default group",
                            object.timing_group.as_str()
                        );
                        0
                    });
                lane_notes[lane - 1].push(id);
                NoteController::new(id, object, lane, group, groups[group].index())
            })
            .collect();

        for (group_index, group) in groups.iter_mut().enumerate() {
            group.generate_spatial_hash_map(
                notes.iter().filter(|note| note.group() == group_index),
            );
        }

        let map_end_time = notes
            .iter()
            .map(NoteController::end_time)
            .fold(0.0, f64::max);
        log::info!(
            "playfield ready: {} notes on {lane_count} lanes in {} timing groups, ends at {map_end_time}ms",
            notes.len(),
            groups.len()
        );

        let scroll_speed = config.scroll.effective_speed();
        let note_count = notes.len();
        let mut manager = Self {
            config,
            lane_count,
            map_end_time,
            groups,
            notes,
            lane_notes,
            pending: vec![VecDeque::new(); lane_count],
            activated_at: vec![f64::NEG_INFINITY; note_count],
            pool: NotePool::new(lane_count),
            current_time: f64::NEG_INFINITY,
            scroll_speed,
        };
        manager.reset_queues(f64::NEG_INFINITY);
        manager
    }

    /// The configuration, including every posted control event.
    #[must_use]
    pub const fn config(&self) -> &PlayfieldConfig {
        &self.config
    }

    /// Number of lanes.
    #[must_use]
    pub const fn lane_count(&self) -> usize {
        self.lane_count
    }

    /// Latest end time of any note.
    #[must_use]
    pub const fn map_end_time(&self) -> f64 {
        self.map_end_time
    }

    /// Scroll speed in pixels per millisecond at velocity 1.0.
    #[must_use]
    pub const fn scroll_speed(&self) -> f64 {
        self.scroll_speed
    }

    /// Timing groups, the default group first.
    #[must_use]
    pub fn groups(&self) -> &[TimingGroupController] {
        &self.groups
    }

    /// Every note, indexed by [`NoteId`].
    #[must_use]
    pub fn notes(&self) -> &[NoteController] {
        &self.notes
    }

    /// A note by id.
    #[must_use]
    pub fn note(&self, id: NoteId) -> Option<&NoteController> {
        self.notes.get(id.0)
    }

    /// The pool of visual objects.
    #[must_use]
    pub const fn pool(&self) -> &NotePool {
        &self.pool
    }

    /// Number of notes of `lane` without a pooled object yet.
    #[must_use]
    pub fn pending_len(&self, lane: usize) -> usize {
        lane.checked_sub(1)
            .and_then(|index| self.pending.get(index))
            .map_or(0, VecDeque::len)
    }

    /// Number of pooled objects of `lane` in a queue.
    #[must_use]
    pub fn queue_len(&self, lane: usize, tag: QueueTag) -> usize {
        self.pool.len(lane, tag)
    }

    fn check_lane(&self, lane: usize) -> Result<()> {
        if (1..=self.lane_count).contains(&lane) {
            Ok(())
        } else {
            Err(PlayfieldError::LaneOutOfRange {
                lane,
                lane_count: self.lane_count,
            })
        }
    }

    fn note_of(&self, handle: PoolHandle) -> Option<&NoteController> {
        self.pool.note(handle).and_then(|id| self.notes.get(id.0))
    }

    /// The active note of `lane` to be hit next.
    #[must_use]
    pub fn closest_tap(&self, lane: usize) -> Option<&NoteController> {
        self.note_of(self.pool.front(lane, QueueTag::Active)?)
    }

    /// The held long note of `lane` to be released next.
    #[must_use]
    pub fn closest_release(&self, lane: usize) -> Option<&NoteController> {
        self.note_of(self.pool.front(lane, QueueTag::Held)?)
    }

    /// The earliest starting note among the active and pending notes of every lane.
    #[must_use]
    pub fn next_hit_object(&self) -> Option<&NoteController> {
        (1..=self.lane_count)
            .flat_map(|lane| {
                [
                    self.pool
                        .front(lane, QueueTag::Active)
                        .and_then(|handle| self.pool.note(handle)),
                    self.pending[lane - 1].front().copied(),
                ]
            })
            .flatten()
            .filter_map(|id| self.notes.get(id.0))
            .min_by(|a, b| a.start_time().total_cmp(&b.start_time()))
    }

    /// Hits the closest active note of `lane`.
    ///
    /// A tap is finished and its pooled object handed to the next pending note. A long note
    /// starts being held.
    ///
    /// # Errors
    ///
    /// Returns an error if the lane is out of range or has no active note.
    pub fn hit(&mut self, lane: usize) -> Result<Vec<NoteTransition>> {
        self.check_lane(lane)?;
        let handle = self
            .pool
            .front(lane, QueueTag::Active)
            .ok_or(PlayfieldError::NoActiveNote { lane })?;
        let id = self
            .pool
            .note(handle)
            .ok_or(PlayfieldError::NoActiveNote { lane })?;

        let mut out = Vec::new();
        let note = &mut self.notes[id.0];
        if note.is_long_note() {
            note.set_state(NoteState::Held);
            let position = self.groups[note.group()].current_track_position();
            note.update_long_note_size(self.current_time, position);
            self.pool.push_back(handle, QueueTag::Held);
            out.push(NoteTransition::new(id, lane, TransitionKind::Held));
        } else {
            note.set_state(NoteState::Removed);
            out.push(NoteTransition::new(id, lane, TransitionKind::Removed));
            self.recycle_object(handle, lane, &mut out);
        }
        log::debug!("hit {id:?} on lane {lane}");
        Ok(out)
    }

    /// Releases the closest held long note of `lane`.
    ///
    /// A correct release finishes the note. An early or late one kills it where it is.
    ///
    /// # Errors
    ///
    /// Returns an error if the lane is out of range or has no held note.
    pub fn release(&mut self, lane: usize, outcome: ReleaseOutcome) -> Result<Vec<NoteTransition>> {
        self.check_lane(lane)?;
        let handle = self
            .pool
            .front(lane, QueueTag::Held)
            .ok_or(PlayfieldError::NoHeldNote { lane })?;
        let id = self
            .pool
            .note(handle)
            .ok_or(PlayfieldError::NoHeldNote { lane })?;

        let mut out = vec![NoteTransition::new(
            id,
            lane,
            TransitionKind::Released(outcome),
        )];
        let note = &mut self.notes[id.0];
        match outcome {
            ReleaseOutcome::Correct => {
                note.set_state(NoteState::Removed);
                out.push(NoteTransition::new(id, lane, TransitionKind::Removed));
                self.recycle_object(handle, lane, &mut out);
            }
            ReleaseOutcome::Early | ReleaseOutcome::Late => {
                let position = self.groups[note.group()].current_track_position();
                note.update_long_note_size(self.current_time, position);
                note.set_state(NoteState::Dead);
                self.pool.push_back(handle, QueueTag::Dead);
            }
        }
        log::debug!("released {id:?} on lane {lane}: {outcome:?}");
        Ok(out)
    }

    /// Kills the closest active note of `lane`, for a press judged as a miss.
    ///
    /// # Errors
    ///
    /// Returns an error if the lane is out of range or has no active note.
    pub fn kill_active(&mut self, lane: usize) -> Result<Vec<NoteTransition>> {
        self.check_lane(lane)?;
        let handle = self
            .pool
            .front(lane, QueueTag::Active)
            .ok_or(PlayfieldError::NoActiveNote { lane })?;
        let mut out = Vec::new();
        self.kill(handle, lane, &mut out);
        Ok(out)
    }

    /// Recomputes everything which depends on the pixel mapping.
    ///
    /// Called after every posted [`ControlEvent`]. Surrounding code changing the scroll settings
    /// by other means calls it as well.
    pub fn force_recompute_after_speed_change(&mut self) {
        self.scroll_speed = self.config.scroll.effective_speed();
        for group in &mut self.groups {
            group.recompute_render_threshold(self.config.viewport_height, self.scroll_speed);
        }
        self.update_long_note_sizes();
        log::debug!(
            "scroll speed is now {} px/ms, viewport {}px",
            self.scroll_speed,
            self.config.viewport_height
        );
    }

    fn apply_event(&mut self, event: ControlEvent) -> Result<()> {
        match event {
            ControlEvent::SetScrollSpeed { speed } => {
                if speed == 0 {
                    return Err(PlayfieldError::InvalidScrollSpeed(speed));
                }
                self.config.scroll.speed = speed;
            }
            ControlEvent::SetPlaybackRate { rate } => {
                self.config.scroll.playback_rate = rate;
            }
            ControlEvent::SetScaleWithRate { scale_with_rate } => {
                self.config.scroll.scale_with_rate = scale_with_rate;
            }
            ControlEvent::SetViewportHeight { height } => {
                if !(height.is_finite() && height > 0.0) {
                    return Err(PlayfieldError::InvalidViewportHeight(height));
                }
                self.config.viewport_height = height;
            }
        }
        Ok(())
    }

    /// Rebuilds the queues as if the song started at `time`.
    ///
    /// Notes ending before `time` are finished. A long note still running at `time` is kept.
    fn reset_queues(&mut self, time: f64) {
        self.pool.clear();
        for note in &mut self.notes {
            note.reset();
            if note.end_time() < time {
                note.set_state(NoteState::Removed);
            }
        }
        self.activated_at.fill(f64::NEG_INFINITY);
        for (pending, lane_notes) in self.pending.iter_mut().zip(&self.lane_notes) {
            pending.clear();
            pending.extend(
                lane_notes
                    .iter()
                    .copied()
                    .filter(|id| self.notes[id.0].end_time() >= time),
            );
        }
        for group in &mut self.groups {
            group.handle_skip();
        }
        self.current_time = time;

        for lane in 1..=self.lane_count {
            for _ in 0..self.config.initial_pool_size_per_lane {
                let Some(id) = self.pending[lane - 1].pop_front() else {
                    break;
                };
                self.attach(lane, id);
            }
        }
    }

    /// Links a new pooled object to `id` and makes it active.
    fn attach(&mut self, lane: usize, id: NoteId) {
        let handle = self.pool.acquire(lane, id);
        self.pool.push_back(handle, QueueTag::Active);
        self.notes[id.0].link(handle);
        self.activated_at[id.0] = self.current_time;
    }

    /// Detaches `handle` from its note and hands it to the next pending note of `lane`, or frees
    /// it if there is none.
    fn recycle_object(&mut self, handle: PoolHandle, lane: usize, out: &mut Vec<NoteTransition>) {
        if let Some(id) = self.pool.note(handle) {
            self.notes[id.0].unlink();
        }
        match self.pending[lane - 1].pop_front() {
            Some(next) => {
                self.pool.relink(handle, next);
                self.pool.push_back(handle, QueueTag::Active);
                self.notes[next.0].link(handle);
                self.activated_at[next.0] = self.current_time;
                out.push(NoteTransition::new(next, lane, TransitionKind::Activated));
            }
            None => self.pool.release(handle),
        }
    }

    /// Kills an active note. A long note counts as missing both its head and its tail.
    fn kill(&mut self, handle: PoolHandle, lane: usize, out: &mut Vec<NoteTransition>) {
        let Some(id) = self.pool.note(handle) else {
            return;
        };
        let note = &mut self.notes[id.0];
        note.set_state(NoteState::Dead);
        out.push(NoteTransition::new(id, lane, TransitionKind::HeadMissed));
        if note.is_long_note() {
            note.reset_extent();
            out.push(NoteTransition::new(id, lane, TransitionKind::TailMissed));
        }
        self.pool.push_back(handle, QueueTag::Dead);
        log::debug!("{id:?} on lane {lane} missed");
    }

    fn activate_pending(&mut self, out: &mut Vec<NoteTransition>) {
        let press_miss = self.config.hit_windows.press_miss_ms;
        for lane in 1..=self.lane_count {
            while let Some(&id) = self.pending[lane - 1].front() {
                let note = &self.notes[id.0];
                let group = &self.groups[note.group()];
                let margin = scale(group.render_threshold(), self.config.create_margin_factor);
                let by_position = group
                    .current_track_position()
                    .saturating_sub(note.initial_track_position())
                    > margin.saturating_neg();
                let by_time = note.start_time() - self.current_time <= press_miss;
                if !(by_position || by_time) {
                    break;
                }
                self.pending[lane - 1].pop_front();
                self.attach(lane, id);
                out.push(NoteTransition::new(id, lane, TransitionKind::Activated));
            }
        }
    }

    /// Whether the note was activated before the current time, so it may be missed now.
    fn activated_earlier(&self, id: NoteId) -> bool {
        self.activated_at
            .get(id.0)
            .is_some_and(|&activated| activated < self.current_time)
    }

    fn miss_active(&mut self, out: &mut Vec<NoteTransition>) {
        let press_miss = self.config.hit_windows.press_miss_ms;
        for lane in 1..=self.lane_count {
            let missed: Handles = self
                .pool
                .iter(lane, QueueTag::Active)
                .filter(|&handle| {
                    self.note_of(handle).is_some_and(|note| {
                        self.activated_earlier(note.id())
                            && self.current_time > note.start_time() + press_miss
                    })
                })
                .collect();
            for handle in missed {
                self.kill(handle, lane, out);
            }
        }
    }

    fn miss_held(&mut self, out: &mut Vec<NoteTransition>) {
        let release_miss = self.config.hit_windows.release_miss_ms;
        for lane in 1..=self.lane_count {
            let missed: Handles = self
                .pool
                .iter(lane, QueueTag::Held)
                .filter(|&handle| {
                    self.note_of(handle).is_some_and(|note| {
                        self.activated_earlier(note.id())
                            && self.current_time > note.end_time() + release_miss
                    })
                })
                .collect();
            for handle in missed {
                let Some(id) = self.pool.note(handle) else {
                    continue;
                };
                let note = &mut self.notes[id.0];
                let position = self.groups[note.group()].current_track_position();
                note.update_long_note_size(self.current_time, position);
                note.set_state(NoteState::Dead);
                self.pool.push_back(handle, QueueTag::Dead);
                out.push(NoteTransition::new(id, lane, TransitionKind::TailMissed));
                log::debug!("{id:?} on lane {lane} was never released");
            }
        }
    }

    fn recycle_dead(&mut self, out: &mut Vec<NoteTransition>) {
        for lane in 1..=self.lane_count {
            let gone: Handles = self
                .pool
                .iter(lane, QueueTag::Dead)
                .filter(|&handle| {
                    self.note_of(handle).is_some_and(|note| {
                        let group = &self.groups[note.group()];
                        let margin =
                            scale(group.render_threshold(), self.config.recycle_margin_factor);
                        !note.in_range(group.current_track_position(), margin)
                    })
                })
                .collect();
            for handle in gone {
                let Some(id) = self.pool.note(handle) else {
                    continue;
                };
                self.notes[id.0].set_state(NoteState::Removed);
                out.push(NoteTransition::new(id, lane, TransitionKind::Recycled));
                self.recycle_object(handle, lane, out);
            }
        }
    }

    fn update_long_note_sizes(&mut self) {
        for lane in 1..=self.lane_count {
            for tag in [QueueTag::Active, QueueTag::Held] {
                for handle in self.pool.iter(lane, tag) {
                    let Some(id) = self.pool.note(handle) else {
                        continue;
                    };
                    let note = &mut self.notes[id.0];
                    let position = self.groups[note.group()].current_track_position();
                    note.update_long_note_size(self.current_time, position);
                }
            }
        }
    }

    fn render(&self, id: NoteId) -> Option<RenderedNote> {
        let note = self.notes.get(id.0)?;
        let pooled = note.pooled_object().ok()?;
        let group = &self.groups[note.group()];
        let current = group.current_track_position();
        if note.state() != NoteState::Held && !note.in_range(current, group.render_threshold()) {
            return None;
        }

        let direction = self
            .config
            .scroll_direction
            .for_lane(note.lane(), self.lane_count);
        let to_pixel = |position| {
            NoteController::sprite_position(
                self.config.hit_position,
                position,
                current,
                self.scroll_speed,
                direction,
            )
        };
        Some(RenderedNote {
            note: id,
            lane: note.lane(),
            group: note.group(),
            pooled,
            state: note.state(),
            head: to_pixel(note.head_track_position()),
            tail: note.end_track_position().map(to_pixel),
            body_length: note.body_length(self.scroll_speed),
            flip_tail: note.should_flip_long_note_end(),
            direction,
        })
    }
}

impl Playfield for HitObjectManager {
    fn update(&mut self, time: f64) -> impl Iterator<Item = NoteTransition> {
        let mut out = Vec::new();
        self.current_time = time;
        for group in &mut self.groups {
            group.update_current_track_position(time);
        }

        self.activate_pending(&mut out);
        self.miss_active(&mut out);
        self.miss_held(&mut out);
        self.recycle_dead(&mut out);
        self.update_long_note_sizes();
        out.into_iter()
    }

    fn handle_skip(&mut self, time: f64) {
        self.reset_queues(time);
        log::info!(
            "skipped to {time}ms, {} notes left",
            self.pending.iter().map(VecDeque::len).sum::<usize>() + self.pool.in_use()
        );
    }

    fn post_events(&mut self, events: impl Iterator<Item = ControlEvent>) {
        let mut changed = false;
        for event in events {
            match self.apply_event(event) {
                Ok(()) => changed = true,
                Err(err) => log::warn!("ignoring control event: {err}"),
            }
        }
        if changed {
            self.force_recompute_after_speed_change();
        }
    }

    fn visible_notes(&self) -> impl Iterator<Item = RenderedNote> {
        let mut candidates = FxHashSet::default();
        for group in &self.groups {
            group.union_in_range_candidates(&mut candidates);
        }
        for lane in 1..=self.lane_count {
            candidates.extend(
                self.pool
                    .iter(lane, QueueTag::Held)
                    .filter_map(|handle| self.pool.note(handle)),
            );
        }
        let mut visible: Vec<_> = candidates
            .into_iter()
            .filter_map(|id| self.render(id))
            .collect();
        visible.sort_unstable_by_key(|rendered| rendered.note);
        visible.into_iter()
    }

    fn is_complete(&self) -> bool {
        let pending_empty = self.pending.iter().all(VecDeque::is_empty);
        let playing =
            self.pool.total_len(QueueTag::Active) + self.pool.total_len(QueueTag::Held) > 0;
        let dead_settled = self.pool.total_len(QueueTag::Dead) == 0
            || self.current_time > self.map_end_time + self.config.hit_windows.release_miss_ms;
        pending_empty && !playing && dead_settled
    }

    fn current_time(&self) -> f64 {
        self.current_time
    }
}

/// Whether the object can be placed on the playfield.
fn is_playable(object: &HitObjectInfo, lane_count: usize) -> bool {
    if !(1..=lane_count).contains(&object.lane) {
        log::warn!(
            "dropping object at {}ms on lane {} of {lane_count}",
            object.start_time,
            object.lane
        );
        return false;
    }
    if !object.start_time.is_finite() || !object.end_time.is_none_or(f64::is_finite) {
        log::warn!("dropping object on lane {} at a non-finite time", object.lane);
        return false;
    }
    true
}
