//! Prelude module for the playfield.
//!
//! Re-exports the types and traits needed to build a playfield, drive it and draw it.

pub use crate::clock::SongClock;
pub use crate::config::{
    ControlEvent, HitWindows, LaneDirection, Modifiers, PlayfieldConfig, ScrollDirection,
    ScrollSettings,
};
pub use crate::error::{PlayfieldError, Result};
pub use crate::manager::HitObjectManager;
pub use crate::map::{HitObjectInfo, MapInfo, TimingGroupId, TimingGroupInfo};
pub use crate::note::{NoteController, NoteId, NoteShape, NoteState};
pub use crate::playfield::{
    NoteTransition, Playfield, ReleaseOutcome, RenderedNote, TransitionKind,
};
pub use crate::pool::{PoolHandle, QueueTag};
pub use crate::timing_group::{TimingGroupController, TimingGroupKind};
pub use crate::velocity::{TRACK_ROUNDING, VelocityChangePoint, VelocityPositionIndex};
