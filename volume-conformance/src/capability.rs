use crate::error::{CaseError, Step};
use effect_backend::{
    Capability, EffectSession, Reply, VolumeCapability, MAX_LEVEL_DB, MIN_LEVEL_DB,
};
use log::{debug, warn};

/// Query the live capability of the instance behind `session`
///
/// Always asks the implementation; a snapshot is only valid for the case
/// that fetched it.
pub fn fetch_capability(session: &mut dyn EffectSession) -> Result<VolumeCapability, CaseError> {
    let descriptor = match session
        .get_descriptor()
        .map_err(CaseError::unreachable(Step::Descriptor))?
    {
        Reply::Accepted(descriptor) => descriptor,
        Reply::Rejected(rejection) => {
            return Err(CaseError::Refused {
                step: Step::Descriptor,
                rejection,
            })
        }
    };

    let capability = match descriptor.capability {
        Capability::Volume(capability) => capability,
        other => {
            return Err(CaseError::IncompatibleDescriptor {
                found: format!("{:?}", other),
            })
        }
    };

    if !within_global_range(&capability) {
        warn!(
            "'{}' advertises max_level {} outside [{}, {}]",
            descriptor.common.name, capability.max_level, MIN_LEVEL_DB, MAX_LEVEL_DB
        );
    }
    debug!(
        "'{}' capability: max_level {}",
        descriptor.common.name, capability.max_level
    );
    Ok(capability)
}

/// Whether an advertised ceiling respects the contract's global range
pub fn within_global_range(capability: &VolumeCapability) -> bool {
    (MIN_LEVEL_DB..=MAX_LEVEL_DB).contains(&capability.max_level)
}
