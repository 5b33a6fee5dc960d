use super::Effect;
use crate::types::{
    Capability, CommonParams, Descriptor, Rejection, VolumeParam, VolumeTag, MAX_LEVEL_DB,
    MIN_LEVEL_DB,
};
use std::time::Duration;

/// Deliberate contract violations a reference volume can be built with
///
/// Used to check that a conformance run actually catches broken
/// implementations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Fault {
    /// Honors the contract
    #[default]
    None,
    /// Clamps out-of-range levels into range and accepts them
    ClampsLevel,
    /// Only checks the global range, not the advertised `max_level`
    IgnoresCeiling,
    /// Accepts mute but always reports it as off
    ForgetsMute,
    /// Accepts one level below the global floor
    OffByOneFloor,
    /// Stalls for the given time before answering a parameter change
    Unresponsive(Duration),
}

/// Reference volume effect
///
/// Parameters:
/// - levelDb: MIN_LEVEL_DB up to the advertised `max_level`
/// - mute: on/off, always accepted
pub struct VolumeEffect {
    descriptor: Descriptor,
    max_level: i32,
    level: i32,
    mute: bool,
    fault: Fault,
}

impl VolumeEffect {
    /// Create a volume effect advertising `descriptor`
    ///
    /// A descriptor without a volume capability is treated as `max_level = MAX_LEVEL_DB`.
    pub fn new(descriptor: Descriptor) -> Self {
        Self::with_fault(descriptor, Fault::None)
    }

    pub fn with_fault(descriptor: Descriptor, fault: Fault) -> Self {
        let max_level = match &descriptor.capability {
            Capability::Volume(cap) => cap.max_level,
            Capability::None => MAX_LEVEL_DB,
        };
        Self {
            descriptor,
            max_level,
            level: MIN_LEVEL_DB,
            mute: false,
            fault,
        }
    }

    /// Current level
    pub fn level(&self) -> i32 {
        self.level
    }

    /// Current mute state
    pub fn is_muted(&self) -> bool {
        self.mute
    }

    fn apply(&mut self, param: VolumeParam) -> Result<(), Rejection> {
        match param {
            VolumeParam::LevelDb(level) => self.set_level(level),
            VolumeParam::Mute(mute) => {
                self.mute = mute;
                Ok(())
            }
        }
    }

    fn set_level(&mut self, level: i32) -> Result<(), Rejection> {
        let floor = match self.fault {
            Fault::OffByOneFloor => MIN_LEVEL_DB - 1,
            _ => MIN_LEVEL_DB,
        };
        let ceiling = match self.fault {
            Fault::IgnoresCeiling => MAX_LEVEL_DB,
            _ => MAX_LEVEL_DB.min(self.max_level),
        };

        if self.fault == Fault::ClampsLevel {
            self.level = level.clamp(floor, ceiling);
            return Ok(());
        }

        if level < floor || level > ceiling {
            return Err(Rejection::illegal_argument(format!(
                "level {} outside [{}, {}]",
                level, floor, ceiling
            )));
        }
        self.level = level;
        Ok(())
    }
}

impl Effect for VolumeEffect {
    fn descriptor(&self) -> Descriptor {
        self.descriptor.clone()
    }

    fn open(
        &mut self,
        common: &CommonParams,
        specific: Option<VolumeParam>,
    ) -> Result<(), Rejection> {
        if common.input_sample_rate == 0 || common.output_sample_rate == 0 {
            return Err(Rejection::illegal_argument("sample rate must be positive"));
        }
        if common.input_frame_count < 0 || common.output_frame_count < 0 {
            return Err(Rejection::illegal_argument("frame count must not be negative"));
        }
        match specific {
            Some(param) => self.apply(param),
            None => Ok(()),
        }
    }

    fn close(&mut self) {
        // Nothing is held between open and close
    }

    fn set_parameter(&mut self, param: VolumeParam) -> Result<(), Rejection> {
        if let Fault::Unresponsive(stall) = self.fault {
            std::thread::sleep(stall);
        }
        self.apply(param)
    }

    fn get_parameter(&self, tag: VolumeTag) -> Result<VolumeParam, Rejection> {
        match tag {
            VolumeTag::LevelDb => Ok(VolumeParam::LevelDb(self.level)),
            VolumeTag::Mute if self.fault == Fault::ForgetsMute => Ok(VolumeParam::Mute(false)),
            VolumeTag::Mute => Ok(VolumeParam::Mute(self.mute)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn volume(max_level: i32, fault: Fault) -> VolumeEffect {
        let desc = Descriptor::volume(Uuid::nil(), "Volume", "Test", max_level);
        VolumeEffect::with_fault(desc, fault)
    }

    #[test]
    fn test_rejects_above_advertised_ceiling() {
        let mut vol = volume(-1000, Fault::None);
        assert!(vol.set_parameter(VolumeParam::LevelDb(-500)).is_err());
        assert_eq!(vol.level(), MIN_LEVEL_DB);

        assert!(vol.set_parameter(VolumeParam::LevelDb(-1000)).is_ok());
        assert_eq!(vol.get_parameter(VolumeTag::LevelDb), Ok(VolumeParam::LevelDb(-1000)));
    }

    #[test]
    fn test_rejects_outside_global_range() {
        let mut vol = volume(MAX_LEVEL_DB, Fault::None);
        assert!(vol.set_parameter(VolumeParam::LevelDb(MIN_LEVEL_DB - 1)).is_err());
        assert!(vol.set_parameter(VolumeParam::LevelDb(MAX_LEVEL_DB + 1)).is_err());
        assert!(vol.set_parameter(VolumeParam::LevelDb(MIN_LEVEL_DB)).is_ok());
        assert!(vol.set_parameter(VolumeParam::LevelDb(MAX_LEVEL_DB)).is_ok());
    }

    #[test]
    fn test_mute_round_trip() {
        let mut vol = volume(MAX_LEVEL_DB, Fault::None);
        vol.set_parameter(VolumeParam::Mute(true)).unwrap();
        assert!(vol.is_muted());
        assert_eq!(vol.get_parameter(VolumeTag::Mute), Ok(VolumeParam::Mute(true)));
    }

    #[test]
    fn test_clamping_fault_accepts_and_clamps() {
        let mut vol = volume(-1000, Fault::ClampsLevel);
        assert!(vol.set_parameter(VolumeParam::LevelDb(1)).is_ok());
        assert_eq!(vol.level(), -1000);
    }

    #[test]
    fn test_forgets_mute_fault() {
        let mut vol = volume(MAX_LEVEL_DB, Fault::ForgetsMute);
        vol.set_parameter(VolumeParam::Mute(true)).unwrap();
        assert_eq!(vol.get_parameter(VolumeTag::Mute), Ok(VolumeParam::Mute(false)));
    }

    #[test]
    fn test_open_rejects_zero_sample_rate() {
        let mut vol = volume(MAX_LEVEL_DB, Fault::None);
        let common = CommonParams::new(0, 1, 0, 44100, 256, 256);
        let err = vol.open(&common, None).unwrap_err();
        assert_eq!(err.kind, crate::types::RejectKind::IllegalArgument);
    }

    #[test]
    fn test_open_applies_initial_level() {
        let mut vol = volume(MAX_LEVEL_DB, Fault::None);
        let common = CommonParams::new(0, 1, 44100, 44100, 256, 256);
        vol.open(&common, Some(VolumeParam::LevelDb(-200))).unwrap();
        assert_eq!(vol.level(), -200);
    }
}
