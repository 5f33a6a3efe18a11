//! Arena of pooled visual objects.
//!
//! Every slot is either free or linked to a note. A linked slot sits in at most one per-lane
//! queue. The queues are intrusive doubly linked lists threaded through the slots, so moving an
//! object between queues never reallocates.

use crate::note::NoteId;

/// Handle to a pooled visual object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PoolHandle(pub usize);

impl PoolHandle {
    /// Get the internal usize value
    #[must_use]
    pub const fn value(self) -> usize {
        self.0
    }
}

/// Per-lane queue a pooled object can be in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum QueueTag {
    /// On screen, waiting for a hit or a miss.
    Active,
    /// A long note being held.
    Held,
    /// Missed or released, waiting to scroll away.
    Dead,
}

impl QueueTag {
    const COUNT: usize = 3;

    const fn index(self) -> usize {
        match self {
            Self::Active => 0,
            Self::Held => 1,
            Self::Dead => 2,
        }
    }
}

#[derive(Debug, Clone)]
struct Slot {
    note: Option<NoteId>,
    lane: usize,
    queue: Option<QueueTag>,
    prev: Option<usize>,
    next: Option<usize>,
}

#[derive(Debug, Clone, Copy, Default)]
struct List {
    head: Option<usize>,
    tail: Option<usize>,
    len: usize,
}

/// Pooled visual objects with per-lane active, held and dead queues.
///
/// Lanes are 1-indexed. Passing a lane outside `1..=lane_count` to a mutating method panics;
/// read-only queries treat it as an empty lane.
#[derive(Debug, Clone)]
pub struct NotePool {
    slots: Vec<Slot>,
    free: Vec<usize>,
    lists: Vec<[List; QueueTag::COUNT]>,
}

impl NotePool {
    /// Create an empty pool for `lane_count` lanes.
    #[must_use]
    pub fn new(lane_count: usize) -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            lists: vec![[List::default(); QueueTag::COUNT]; lane_count],
        }
    }

    /// Number of lanes.
    #[must_use]
    pub fn lane_count(&self) -> usize {
        self.lists.len()
    }

    /// Takes a free slot, or grows the arena, and links it to `note`. The object is in no queue.
    pub fn acquire(&mut self, lane: usize, note: NoteId) -> PoolHandle {
        let slot = Slot {
            note: Some(note),
            lane,
            queue: None,
            prev: None,
            next: None,
        };
        if let Some(index) = self.free.pop() {
            self.slots[index] = slot;
            return PoolHandle(index);
        }
        self.slots.push(slot);
        log::debug!("note pool grew to {} objects", self.slots.len());
        PoolHandle(self.slots.len() - 1)
    }

    /// Unlinks the object from its queue and returns it to the free list.
    ///
    /// Releasing a free handle does nothing.
    pub fn release(&mut self, handle: PoolHandle) {
        if self.note(handle).is_none() {
            return;
        }
        self.unlink(handle);
        self.slots[handle.0].note = None;
        self.free.push(handle.0);
    }

    /// Links the object to another note of the same lane, keeping its queue.
    pub fn relink(&mut self, handle: PoolHandle, note: NoteId) {
        if let Some(slot) = self.slots.get_mut(handle.0) {
            slot.note = Some(note);
        }
    }

    /// Appends the object to a queue of its lane, moving it out of its current queue first.
    pub fn push_back(&mut self, handle: PoolHandle, tag: QueueTag) {
        self.unlink(handle);
        let lane = self.slots[handle.0].lane;
        let list = &mut self.lists[lane - 1][tag.index()];
        let old_tail = list.tail.replace(handle.0);
        if list.head.is_none() {
            list.head = Some(handle.0);
        }
        list.len += 1;

        if let Some(old_tail) = old_tail {
            self.slots[old_tail].next = Some(handle.0);
        }
        let slot = &mut self.slots[handle.0];
        slot.queue = Some(tag);
        slot.prev = old_tail;
        slot.next = None;
    }

    /// Removes the object from its queue, if any.
    pub fn unlink(&mut self, handle: PoolHandle) {
        let Some(slot) = self.slots.get_mut(handle.0) else {
            return;
        };
        let Some(tag) = slot.queue.take() else {
            return;
        };
        let (lane, prev, next) = (slot.lane, slot.prev.take(), slot.next.take());

        match prev {
            Some(prev) => self.slots[prev].next = next,
            None => self.lists[lane - 1][tag.index()].head = next,
        }
        match next {
            Some(next) => self.slots[next].prev = prev,
            None => self.lists[lane - 1][tag.index()].tail = prev,
        }
        self.lists[lane - 1][tag.index()].len -= 1;
    }

    fn list(&self, lane: usize, tag: QueueTag) -> Option<&List> {
        lane.checked_sub(1)
            .and_then(|index| self.lists.get(index))
            .map(|lists| &lists[tag.index()])
    }

    /// First object of a queue.
    #[must_use]
    pub fn front(&self, lane: usize, tag: QueueTag) -> Option<PoolHandle> {
        self.list(lane, tag)?.head.map(PoolHandle)
    }

    /// Length of a queue.
    #[must_use]
    pub fn len(&self, lane: usize, tag: QueueTag) -> usize {
        self.list(lane, tag).map_or(0, |list| list.len)
    }

    /// Whether a queue is empty.
    #[must_use]
    pub fn is_empty(&self, lane: usize, tag: QueueTag) -> bool {
        self.len(lane, tag) == 0
    }

    /// Length of a queue summed over all lanes.
    #[must_use]
    pub fn total_len(&self, tag: QueueTag) -> usize {
        self.lists.iter().map(|lists| lists[tag.index()].len).sum()
    }

    /// Objects of a queue, front to back.
    pub fn iter(&self, lane: usize, tag: QueueTag) -> impl Iterator<Item = PoolHandle> + '_ {
        let mut cursor = self.list(lane, tag).and_then(|list| list.head);
        std::iter::from_fn(move || {
            let current = cursor?;
            cursor = self.slots[current].next;
            Some(PoolHandle(current))
        })
    }

    /// Note the object is linked to, `None` for a free slot.
    #[must_use]
    pub fn note(&self, handle: PoolHandle) -> Option<NoteId> {
        self.slots.get(handle.0).and_then(|slot| slot.note)
    }

    /// Queue the object is in.
    #[must_use]
    pub fn queue_of(&self, handle: PoolHandle) -> Option<QueueTag> {
        self.slots.get(handle.0).and_then(|slot| slot.queue)
    }

    /// Number of objects linked to a note.
    #[must_use]
    pub fn in_use(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    /// Number of objects ever created since the last [`Self::clear`].
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Destroys every object.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        for lists in &mut self.lists {
            *lists = [List::default(); QueueTag::COUNT];
        }
    }
}
