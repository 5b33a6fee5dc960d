//! Volume effect parameter conformance.
//!
//! Checks that every discovered volume implementation accepts exactly the
//! levels its own descriptor allows, always accepts mute, and reads back
//! whatever it accepted.
//!
//! Flow: [`discovery`] finds instances, [`matrix`] expands them into named
//! cases, and [`verifier`] runs each case against a fresh session, using
//! [`capability`] and [`legality`] to predict the outcome. [`runner`] ties
//! it together and produces a [`report::SuiteReport`].

pub mod capability;
pub mod config;
pub mod discovery;
pub mod error;
pub mod legality;
pub mod matrix;
pub mod report;
pub mod runner;
pub mod values;
pub mod verifier;

pub use capability::fetch_capability;
pub use config::{ConfigError, RunnerConfig};
pub use discovery::discover_instances;
pub use error::{CaseError, FailureKind, Step};
pub use legality::{expect, is_legal, Expectation, Reason};
pub use matrix::{case_name, instantiate, sanitize, CaseKind, Instance, TestCase};
pub use report::{CaseReport, SuiteReport, Verdict};
pub use runner::{CaseFilter, Suite};
pub use values::{level_values, mute_values};
pub use verifier::{Phase, SessionGuard, Verification, Verifier, VerifyOptions};
