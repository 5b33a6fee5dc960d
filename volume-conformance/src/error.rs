use crate::legality::Reason;
use effect_backend::{Rejection, Status, TransportError, VolumeCapability, VolumeParam};
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Protocol step a case was performing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Create,
    Open,
    Descriptor,
    ReadBefore,
    Set,
    Get,
    ReadAfterReject,
    Close,
    Destroy,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Step::Create => "createEffect",
            Step::Open => "open",
            Step::Descriptor => "getDescriptor",
            Step::ReadBefore => "getParameter (before set)",
            Step::Set => "setParameter",
            Step::Get => "getParameter",
            Step::ReadAfterReject => "getParameter (after rejected set)",
            Step::Close => "close",
            Step::Destroy => "destroyEffect",
        };
        write!(f, "{}", name)
    }
}

/// Why a single conformance case failed
///
/// Failures never leave the case they happened in.
#[derive(Debug, Error)]
pub enum CaseError {
    #[error("implementation unreachable during {step}: {source}")]
    UnreachableImplementation {
        step: Step,
        #[source]
        source: TransportError,
    },

    #[error(
        "{step} {param}: expected {expected}, observed {observed} (max_level {}, {reason}){}",
        .capability.max_level,
        detail_suffix(.detail)
    )]
    UnexpectedStatus {
        step: Step,
        param: VolumeParam,
        expected: Status,
        observed: Status,
        capability: VolumeCapability,
        reason: Reason,
        detail: Option<String>,
    },

    #[error(
        "getParameter after setting {expected} returned {observed} (max_level {})",
        .capability.max_level
    )]
    ValueMismatch {
        expected: VolumeParam,
        observed: VolumeParam,
        capability: VolumeCapability,
    },

    #[error("implementation refused {step}: {rejection}")]
    Refused { step: Step, rejection: Rejection },

    #[error("descriptor advertises no volume capability (found {found})")]
    IncompatibleDescriptor { found: String },

    #[error("rejected set of {param} changed the stored value from {before} to {after}")]
    StoreMutated {
        param: VolumeParam,
        before: VolumeParam,
        after: VolumeParam,
    },
}

fn detail_suffix(detail: &Option<String>) -> String {
    match detail {
        Some(detail) => format!(": {}", detail),
        None => String::new(),
    }
}

/// Coarse classification of a `CaseError`, for reports and filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    UnreachableImplementation,
    UnexpectedStatus,
    ValueMismatch,
    Refused,
    IncompatibleDescriptor,
    StoreMutated,
}

impl CaseError {
    pub fn unreachable(step: Step) -> impl FnOnce(TransportError) -> CaseError {
        move |source| CaseError::UnreachableImplementation { step, source }
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            CaseError::UnreachableImplementation { .. } => FailureKind::UnreachableImplementation,
            CaseError::UnexpectedStatus { .. } => FailureKind::UnexpectedStatus,
            CaseError::ValueMismatch { .. } => FailureKind::ValueMismatch,
            CaseError::Refused { .. } => FailureKind::Refused,
            CaseError::IncompatibleDescriptor { .. } => FailureKind::IncompatibleDescriptor,
            CaseError::StoreMutated { .. } => FailureKind::StoreMutated,
        }
    }
}
