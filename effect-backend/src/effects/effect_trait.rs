use crate::types::{CommonParams, Descriptor, Rejection, VolumeParam, VolumeTag};

/// Volume effect implementation trait
///
/// Implementations only validate and store parameters. Session state
/// (opened/closed) is tracked by the host that owns the effect, so these
/// methods are only called while that state allows them.
pub trait Effect: Send {
    /// Descriptor advertised by this implementation
    fn descriptor(&self) -> Descriptor;

    /// Prepare the effect for use
    ///
    /// # Arguments
    /// * `common` - Session, IO handle and stream configuration
    /// * `specific` - Optional initial parameter value
    fn open(
        &mut self,
        common: &CommonParams,
        specific: Option<VolumeParam>,
    ) -> Result<(), Rejection>;

    /// Release whatever `open` prepared
    fn close(&mut self);

    /// Validate and store a parameter
    ///
    /// Returns an illegal-argument rejection for values outside the
    /// advertised capability; the stored value must then be left untouched.
    fn set_parameter(&mut self, param: VolumeParam) -> Result<(), Rejection>;

    /// Get the stored value of a parameter
    fn get_parameter(&self, tag: VolumeTag) -> Result<VolumeParam, Rejection>;
}
