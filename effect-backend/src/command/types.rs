use crate::types::{CommonParams, Descriptor, Reply, VolumeParam, VolumeTag};
use crossbeam_channel::Sender;

/// Requests sent from a session to the thread hosting its effect
///
/// Every request except `Shutdown` carries the sender its reply goes to.
#[derive(Debug, Clone)]
pub enum Command {
    // Lifecycle commands
    /// Open the effect with common parameters and an optional initial value
    Open {
        common: CommonParams,
        specific: Option<VolumeParam>,
        reply: Sender<Reply<()>>,
    },
    /// Close the effect (back to the initial state)
    Close { reply: Sender<Reply<()>> },
    /// Tear down the host; rejected while the effect is still open
    Destroy { reply: Sender<Reply<()>> },
    /// Stop the host without a reply
    Shutdown,

    // Query commands
    /// Fetch the effect descriptor
    GetDescriptor { reply: Sender<Reply<Descriptor>> },

    // Parameter commands
    /// Validate and store a parameter
    SetParameter {
        param: VolumeParam,
        reply: Sender<Reply<()>>,
    },
    /// Read back a stored parameter
    GetParameter {
        tag: VolumeTag,
        reply: Sender<Reply<VolumeParam>>,
    },
}
