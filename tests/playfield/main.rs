//! Tests for `playfield_rs`.
//!
//! Every scenario uses the default configuration unless stated otherwise: one pixel per
//! millisecond, a 1080 pixel viewport, so the render threshold is 108000 track units (1080ms at
//! velocity 1.0), and a press miss window of 164ms.

mod dsl;
mod pooling;
#[cfg(feature = "serde")]
mod serde_config;
mod skip;
mod timing_groups;

use playfield_rs::prelude::*;

/// The default configuration with `pool_size` objects prepared per lane.
fn config_with_pool(pool_size: usize) -> PlayfieldConfig {
    PlayfieldConfig {
        initial_pool_size_per_lane: pool_size,
        ..PlayfieldConfig::default()
    }
}
