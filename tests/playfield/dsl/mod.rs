//! Test DSL module
//!
//! A builder driving a [`HitObjectManager`](playfield_rs::manager::HitObjectManager) through a
//! sequence of frames, with assertions attached to each frame.
//!
//! ```ignore
//! TestPlayfieldDriver::new(manager)
//!     .past_ms(1000)
//!         .transitions(|t| assert_eq!(t.len(), 1))
//!         .hit(1)
//!     .past_ms(16)
//!         .view(|m| assert!(m.is_complete()))
//!     .run();
//! ```

mod driver;
mod helpers;

pub use driver::TestPlayfieldDriver;
pub use helpers::{driver_for, kinds_of, single_lane_taps};
