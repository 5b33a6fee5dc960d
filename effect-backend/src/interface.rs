//! Contract between effect implementations and their clients.
//!
//! Every call is a round trip: `Err` means the request or its reply never made
//! it across the channel, `Ok(Reply::Rejected(..))` means the implementation
//! answered and refused.

use crate::types::{CommonParams, Descriptor, Reply, TransportError, VolumeParam, VolumeTag};
use uuid::Uuid;

/// A live connection to one effect instance
pub trait EffectSession: Send {
    /// Open the effect. Parameters can only be set or read while open.
    fn open(
        &mut self,
        common: &CommonParams,
        specific: Option<VolumeParam>,
    ) -> Result<Reply<()>, TransportError>;

    /// Close the effect; the session can be opened again afterwards
    fn close(&mut self) -> Result<Reply<()>, TransportError>;

    fn get_descriptor(&mut self) -> Result<Reply<Descriptor>, TransportError>;

    fn set_parameter(&mut self, param: VolumeParam) -> Result<Reply<()>, TransportError>;

    fn get_parameter(&mut self, tag: VolumeTag) -> Result<Reply<VolumeParam>, TransportError>;

    /// Tear down the connection. Called by the owning factory's `destroy_effect`.
    fn release(self: Box<Self>) -> Result<Reply<()>, TransportError>;
}

/// Creates and destroys effect instances
pub trait EffectFactory: Send + Sync {
    /// Name used in logs
    fn name(&self) -> &str;

    /// Descriptors of all implementations, optionally restricted to one effect type
    fn query_descriptors(&self, type_uuid: Option<Uuid>) -> Result<Vec<Descriptor>, TransportError>;

    /// Create an instance of the implementation identified by `uuid`
    fn create_effect(&self, uuid: Uuid) -> Result<Reply<Box<dyn EffectSession>>, TransportError>;

    /// Destroy an instance. Rejected with an illegal-state status if it is still open.
    fn destroy_effect(&self, session: Box<dyn EffectSession>) -> Result<Reply<()>, TransportError>;
}
