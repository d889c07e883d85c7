//! Engine options for a signature pad.

use crate::style::StyleSnapshot;
use serde::{Deserialize, Serialize};

/// Default minimum distance between accepted samples, in CSS pixels.
pub const DEFAULT_MIN_DISTANCE: f64 = 5.0;

/// Default move throttle interval in milliseconds.
pub const DEFAULT_THROTTLE_MS: u64 = 16;

/// Drawing behaviour shared by every stroke of a pad.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PadOptions {
    /// Style captured by each new stroke.
    #[serde(flatten)]
    pub style: StyleSnapshot,
    /// Samples closer than this to the previous one are dropped.
    pub min_distance: f64,
    /// Move samples are processed at most once per interval; zero disables.
    pub throttle_ms: u64,
}

impl Default for PadOptions {
    fn default() -> Self {
        Self {
            style: StyleSnapshot::default(),
            min_distance: DEFAULT_MIN_DISTANCE,
            throttle_ms: DEFAULT_THROTTLE_MS,
        }
    }
}
