//! Scroll position timing engine and note object pool for vertically scrolling rhythm game
//! playfields.
//!
//! Song time is converted into a fixed-point track position per timing group, under a piecewise
//! constant scroll velocity which may be zero or negative. [`manager::HitObjectManager`] keeps the
//! notes near that position alive as pooled visual objects and moves them through their lifecycle
//! frame by frame, reporting every change as a [`playfield::NoteTransition`].
//!
//! Parsing map files, judging hits, scoring and drawing are left to the surrounding application:
//! it builds a [`map::MapInfo`], calls [`playfield::Playfield::update`] with the current song time,
//! forwards judged input through [`manager::HitObjectManager::hit`] and its siblings, and draws
//! [`playfield::Playfield::visible_notes`].
//!
//! ```
//! use playfield_rs::prelude::*;
//!
//! let map = MapInfo::new(4).with_objects([
//!     HitObjectInfo::tap(1000.0, 1),
//!     HitObjectInfo::long(1500.0, 2000.0, 3),
//! ]);
//! let mut manager = HitObjectManager::new(&map, PlayfieldConfig::default());
//! let transitions: Vec<_> = manager.update(0.0).collect();
//! assert!(transitions.is_empty());
//! // The long note is still more than a screen away.
//! assert_eq!(manager.visible_notes().count(), 1);
//! ```
//!
//! # Features
//!
//! - `serde`: derives `Serialize` and `Deserialize` for the map and configuration types.

pub mod clock;
pub mod config;
pub mod error;
pub mod manager;
pub mod map;
pub mod note;
pub mod playfield;
pub mod pool;
pub mod prelude;
pub mod spatial;
pub mod timing_group;
pub mod velocity;

pub use error::{PlayfieldError, Result};
