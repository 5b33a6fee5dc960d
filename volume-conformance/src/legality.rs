//! Predicts whether an implementation must accept a parameter value.
//!
//! Levels are judged against both the global range and the ceiling the
//! instance itself advertises, so the same value can be legal for one
//! instance and illegal for another.

use effect_backend::{Status, VolumeCapability, VolumeParam, MAX_LEVEL_DB, MIN_LEVEL_DB};
use serde::Serialize;
use std::fmt;

/// Which rule decided an expectation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Reason {
    WithinRange,
    BelowGlobalFloor,
    AboveGlobalCeiling,
    AboveInstanceCeiling,
    AlwaysLegal,
    /// No rule exists for this parameter kind yet
    UnknownParameterKind,
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Reason::WithinRange => "within range",
            Reason::BelowGlobalFloor => "below global floor",
            Reason::AboveGlobalCeiling => "above global ceiling",
            Reason::AboveInstanceCeiling => "above instance ceiling",
            Reason::AlwaysLegal => "always legal",
            Reason::UnknownParameterKind => "unknown parameter kind",
        };
        write!(f, "{}", text)
    }
}

/// Expected outcome of setting one value on one instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Expectation {
    pub legal: bool,
    pub reason: Reason,
}

impl Expectation {
    fn legal(reason: Reason) -> Self {
        Self { legal: true, reason }
    }

    fn illegal(reason: Reason) -> Self {
        Self {
            legal: false,
            reason,
        }
    }

    /// Status the implementation must answer a set with
    pub fn status(&self) -> Status {
        if self.legal {
            Status::Ok
        } else {
            Status::IllegalArgument
        }
    }
}

/// Expectation for setting `param` on an instance advertising `capability`
pub fn expect(param: &VolumeParam, capability: &VolumeCapability) -> Expectation {
    match *param {
        VolumeParam::LevelDb(level) => {
            if level < MIN_LEVEL_DB {
                Expectation::illegal(Reason::BelowGlobalFloor)
            } else if level > MAX_LEVEL_DB {
                Expectation::illegal(Reason::AboveGlobalCeiling)
            } else if level > capability.max_level {
                Expectation::illegal(Reason::AboveInstanceCeiling)
            } else {
                Expectation::legal(Reason::WithinRange)
            }
        }
        VolumeParam::Mute(_) => Expectation::legal(Reason::AlwaysLegal),
        _ => Expectation::illegal(Reason::UnknownParameterKind),
    }
}

/// Whether `param` is legal for an instance advertising `capability`
pub fn is_legal(param: &VolumeParam, capability: &VolumeCapability) -> bool {
    expect(param, capability).legal
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const CEILING_1000: VolumeCapability = VolumeCapability { max_level: -1000 };
    const FULL: VolumeCapability = VolumeCapability {
        max_level: MAX_LEVEL_DB,
    };

    #[test]
    fn test_instance_ceiling_example() {
        assert!(!is_legal(&VolumeParam::LevelDb(-500), &CEILING_1000));
        assert_eq!(
            expect(&VolumeParam::LevelDb(-500), &CEILING_1000).reason,
            Reason::AboveInstanceCeiling
        );
        assert!(is_legal(&VolumeParam::LevelDb(-9600), &CEILING_1000));
        assert!(!is_legal(&VolumeParam::LevelDb(-9601), &CEILING_1000));
    }

    #[test]
    fn test_ceiling_is_inclusive() {
        assert!(is_legal(&VolumeParam::LevelDb(-1000), &CEILING_1000));
        assert!(!is_legal(&VolumeParam::LevelDb(-999), &CEILING_1000));
        assert!(is_legal(&VolumeParam::LevelDb(MAX_LEVEL_DB), &FULL));
    }

    #[test]
    fn test_global_violations_win_over_instance_ceiling() {
        let below = expect(&VolumeParam::LevelDb(MIN_LEVEL_DB - 1), &FULL);
        assert_eq!(below.reason, Reason::BelowGlobalFloor);

        // Instance claiming more headroom than the contract allows
        let generous = VolumeCapability { max_level: 500 };
        let above = expect(&VolumeParam::LevelDb(MAX_LEVEL_DB + 1), &generous);
        assert_eq!(above.reason, Reason::AboveGlobalCeiling);
        assert_eq!(above.status(), Status::IllegalArgument);
    }

    #[test]
    fn test_mute_always_legal() {
        let floor = VolumeCapability {
            max_level: MIN_LEVEL_DB,
        };
        for cap in [FULL, CEILING_1000, floor] {
            for mute in [false, true] {
                let exp = expect(&VolumeParam::Mute(mute), &cap);
                assert_eq!(exp, Expectation::legal(Reason::AlwaysLegal));
                assert_eq!(exp.status(), Status::Ok);
            }
        }
    }

    proptest! {
        #[test]
        fn prop_outside_global_range_always_illegal(
            below in i32::MIN..MIN_LEVEL_DB,
            above in (MAX_LEVEL_DB + 1)..i32::MAX,
            max_level in MIN_LEVEL_DB..=MAX_LEVEL_DB,
        ) {
            let cap = VolumeCapability { max_level };
            prop_assert!(!is_legal(&VolumeParam::LevelDb(below), &cap));
            prop_assert!(!is_legal(&VolumeParam::LevelDb(above), &cap));
        }

        #[test]
        fn prop_level_legal_iff_in_range_and_under_ceiling(
            level in (MIN_LEVEL_DB - 10)..=(MAX_LEVEL_DB + 10),
            max_level in MIN_LEVEL_DB..=MAX_LEVEL_DB,
        ) {
            let cap = VolumeCapability { max_level };
            let legal = (MIN_LEVEL_DB..=MAX_LEVEL_DB).contains(&level) && level <= max_level;
            prop_assert_eq!(is_legal(&VolumeParam::LevelDb(level), &cap), legal);
        }
    }
}
