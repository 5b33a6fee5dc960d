// Effect Backend
//
// The volume effect contract (descriptors, capabilities, parameters, replies),
// the factory/session interface clients program against, and reference
// volume implementations hosted on worker threads behind a command channel.

pub mod command;
pub mod effects;
pub mod factory;
pub mod host;
pub mod interface;
pub mod types;

// Re-export commonly used types
pub use effects::{Effect, Fault, VolumeEffect};
pub use factory::LocalFactory;
pub use host::{EffectHost, HostedSession};
pub use interface::{EffectFactory, EffectSession};
pub use types::{
    Capability, CommonParams, Descriptor, DescriptorCommon, EffectFlags, EffectId, EffectKind,
    InsertPosition, RejectKind, Rejection, Reply, Status, TransportError, VolumeCapability,
    VolumeControl, VolumeParam, VolumeTag, MAX_LEVEL_DB, MIN_LEVEL_DB, VOLUME_TYPE_UUID,
};
