//! Set-then-get protocol against a live instance.
//!
//! Each case walks `Init -> Validated -> Applied -> Confirmed | Mismatched ->
//! Done`. The session is owned by a `SessionGuard` for exactly one case and is
//! closed and destroyed on every exit path.

use crate::capability::fetch_capability;
use crate::error::{CaseError, Step};
use crate::legality::{self, Expectation, Reason};
use crate::matrix::TestCase;
use effect_backend::{
    CommonParams, Descriptor, EffectFactory, EffectSession, Reply, Status, TransportError,
    VolumeCapability, VolumeParam, MIN_LEVEL_DB,
};
use log::{debug, warn};
use serde::Serialize;

pub const SESSION_ID: i32 = 0;
pub const IO_HANDLE: i32 = 1;
pub const SAMPLE_RATE: u32 = 44100;
pub const INPUT_FRAME_COUNT: i64 = 0x100;
pub const OUTPUT_FRAME_COUNT: i64 = 0x100;

/// Common parameters every case opens its session with
pub fn default_common() -> CommonParams {
    CommonParams::new(
        SESSION_ID,
        IO_HANDLE,
        SAMPLE_RATE,
        SAMPLE_RATE,
        INPUT_FRAME_COUNT,
        OUTPUT_FRAME_COUNT,
    )
}

/// Initial volume every case opens its session with
pub fn default_specific() -> VolumeParam {
    VolumeParam::LevelDb(MIN_LEVEL_DB)
}

/// Progress of one case through the protocol
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum Phase {
    Init { capability: VolumeCapability },
    Validated { expected: Status, reason: Reason },
    Applied { observed: Status },
    Confirmed,
    Mismatched,
    Done,
}

/// Verifier switches
#[derive(Debug, Clone, Copy, Default)]
pub struct VerifyOptions {
    /// After an expected rejection, read the parameter back and require it unchanged.
    /// Costs one extra get before and after the set.
    pub check_unchanged_after_reject: bool,
}

/// Everything one case produced
#[derive(Debug)]
pub struct Verification {
    pub phases: Vec<Phase>,
    pub outcome: Result<(), CaseError>,
    pub teardown_warnings: Vec<String>,
}

impl Verification {
    pub fn passed(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Owns a created and opened session for the duration of one case
///
/// Dropping the guard closes (if opened) and destroys the session.
pub struct SessionGuard<'a> {
    factory: &'a dyn EffectFactory,
    session: Option<Box<dyn EffectSession>>,
    opened: bool,
    warnings: Vec<String>,
}

impl<'a> SessionGuard<'a> {
    /// Create and open an instance of `descriptor`
    pub fn acquire(
        factory: &'a dyn EffectFactory,
        descriptor: &Descriptor,
        common: &CommonParams,
        specific: Option<VolumeParam>,
    ) -> Result<Self, CaseError> {
        let session = match factory
            .create_effect(descriptor.common.id.uuid)
            .map_err(CaseError::unreachable(Step::Create))?
        {
            Reply::Accepted(session) => session,
            Reply::Rejected(rejection) => {
                return Err(CaseError::Refused {
                    step: Step::Create,
                    rejection,
                })
            }
        };

        let mut guard = SessionGuard {
            factory,
            session: Some(session),
            opened: false,
            warnings: Vec::new(),
        };

        match guard
            .session()
            .and_then(|session| session.open(common, specific))
            .map_err(CaseError::unreachable(Step::Open))?
        {
            Reply::Accepted(()) => guard.opened = true,
            Reply::Rejected(rejection) => {
                return Err(CaseError::Refused {
                    step: Step::Open,
                    rejection,
                })
            }
        }
        Ok(guard)
    }

    pub fn session(&mut self) -> Result<&mut dyn EffectSession, TransportError> {
        match self.session.as_deref_mut() {
            Some(session) => Ok(session),
            None => Err(TransportError::Disconnected),
        }
    }

    /// Close and destroy now, returning teardown problems
    pub fn release(mut self) -> Vec<String> {
        self.teardown();
        std::mem::take(&mut self.warnings)
    }

    fn teardown(&mut self) {
        let Some(mut session) = self.session.take() else {
            return;
        };

        if self.opened {
            self.opened = false;
            match session.close() {
                Ok(Reply::Accepted(())) => {}
                Ok(Reply::Rejected(rejection)) => self.note(Step::Close, rejection.to_string()),
                Err(e) => self.note(Step::Close, e.to_string()),
            }
        }

        match self.factory.destroy_effect(session) {
            Ok(Reply::Accepted(())) => {}
            Ok(Reply::Rejected(rejection)) => self.note(Step::Destroy, rejection.to_string()),
            Err(e) => self.note(Step::Destroy, e.to_string()),
        }
    }

    fn note(&mut self, step: Step, problem: String) {
        warn!("Teardown: {} failed: {}", step, problem);
        self.warnings.push(format!("{}: {}", step, problem));
    }
}

impl Drop for SessionGuard<'_> {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// Drives the set/get protocol for individual cases
#[derive(Debug, Clone, Default)]
pub struct Verifier {
    options: VerifyOptions,
}

impl Verifier {
    pub fn new(options: VerifyOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> VerifyOptions {
        self.options
    }

    /// Run one case from session acquisition to teardown
    pub fn verify(&self, case: &TestCase) -> Verification {
        let instance = case.instance();
        let mut phases = Vec::new();

        let mut guard = match SessionGuard::acquire(
            instance.factory.as_ref(),
            &instance.descriptor,
            &default_common(),
            Some(default_specific()),
        ) {
            Ok(guard) => guard,
            Err(e) => {
                phases.push(Phase::Mismatched);
                phases.push(Phase::Done);
                return Verification {
                    phases,
                    outcome: Err(e),
                    teardown_warnings: Vec::new(),
                };
            }
        };

        let outcome = guard
            .session()
            .map_err(CaseError::unreachable(Step::Descriptor))
            .and_then(|session| self.round_trip(session, case.param(), &mut phases));

        phases.push(if outcome.is_ok() {
            Phase::Confirmed
        } else {
            Phase::Mismatched
        });
        phases.push(Phase::Done);
        debug!("{}: {:?}", case.id(), phases);

        Verification {
            phases,
            outcome,
            teardown_warnings: guard.release(),
        }
    }

    /// Fetch capability, predict, set, and read back when accepted
    pub fn round_trip(
        &self,
        session: &mut dyn EffectSession,
        param: VolumeParam,
        phases: &mut Vec<Phase>,
    ) -> Result<(), CaseError> {
        let capability = fetch_capability(session)?;
        phases.push(Phase::Init { capability });

        let expectation = legality::expect(&param, &capability);
        phases.push(Phase::Validated {
            expected: expectation.status(),
            reason: expectation.reason,
        });

        let check = Check {
            param,
            capability,
            expectation,
        };

        let before = if self.options.check_unchanged_after_reject && !expectation.legal {
            Some(check.read(session, Step::ReadBefore)?)
        } else {
            None
        };

        let reply = session
            .set_parameter(param)
            .map_err(CaseError::unreachable(Step::Set))?;
        let observed = reply.status();
        phases.push(Phase::Applied { observed });

        if observed != expectation.status() {
            return Err(check.unexpected(Step::Set, expectation.status(), &reply));
        }

        if reply.is_accepted() {
            let got = check.read(session, Step::Get)?;
            if got != param {
                return Err(CaseError::ValueMismatch {
                    expected: param,
                    observed: got,
                    capability,
                });
            }
        } else if let Some(before) = before {
            let after = check.read(session, Step::ReadAfterReject)?;
            if after != before {
                return Err(CaseError::StoreMutated {
                    param,
                    before,
                    after,
                });
            }
        }
        Ok(())
    }
}

/// Context shared by the diagnostics of one round trip
struct Check {
    param: VolumeParam,
    capability: VolumeCapability,
    expectation: Expectation,
}

impl Check {
    /// Read back the stored value of the parameter being checked; the read itself must succeed
    fn read(&self, session: &mut dyn EffectSession, step: Step) -> Result<VolumeParam, CaseError> {
        let reply = session
            .get_parameter(self.param.tag())
            .map_err(CaseError::unreachable(step))?;
        match reply {
            Reply::Accepted(value) => Ok(value),
            rejected @ Reply::Rejected(_) => Err(self.unexpected(step, Status::Ok, &rejected)),
        }
    }

    fn unexpected<T>(&self, step: Step, expected: Status, reply: &Reply<T>) -> CaseError {
        let detail = match reply {
            Reply::Accepted(_) => None,
            Reply::Rejected(rejection) => Some(rejection.message.clone()),
        };
        CaseError::UnexpectedStatus {
            step,
            param: self.param,
            expected,
            observed: reply.status(),
            capability: self.capability,
            reason: self.expectation.reason,
            detail,
        }
    }
}
