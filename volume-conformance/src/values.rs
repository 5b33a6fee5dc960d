//! Candidate values every instance is driven with.

use effect_backend::{MAX_LEVEL_DB, MIN_LEVEL_DB};

/// A level strictly inside the global range
pub const INTERIOR_LEVEL: i32 = -100;

/// Level candidates, in case order: one below the floor, the floor, an
/// interior value, the ceiling, one above the ceiling
pub fn level_values() -> [i32; 5] {
    [
        MIN_LEVEL_DB - 1,
        MIN_LEVEL_DB,
        INTERIOR_LEVEL,
        MAX_LEVEL_DB,
        MAX_LEVEL_DB + 1,
    ]
}

/// Mute candidates
pub fn mute_values() -> [bool; 2] {
    [false, true]
}
