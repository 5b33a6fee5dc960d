use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

/// Lowest attenuation level any volume implementation may accept
pub const MIN_LEVEL_DB: i32 = -9600;

/// Highest level any volume implementation may accept (unity)
pub const MAX_LEVEL_DB: i32 = 0;

/// Effect type identifier shared by every volume implementation
pub const VOLUME_TYPE_UUID: Uuid = Uuid::from_u128(0xfa81a2b4_588b_11ed_9b6a_0242ac120003);

/// Identity of one effect implementation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EffectId {
    /// Effect type (e.g. volume), shared across implementations
    pub type_uuid: Uuid,
    /// This implementation
    pub uuid: Uuid,
    /// Set when the implementation is a proxy for other implementations
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy: Option<Uuid>,
}

/// Where an effect sits in the processing chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectKind {
    #[default]
    Insert,
    Auxiliary,
    Replace,
    PreProcessing,
    PostProcessing,
}

/// Position an insert effect asks for within its chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsertPosition {
    #[default]
    Any,
    First,
    Last,
    Exclusive,
}

/// How an effect takes part in stream volume control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolumeControl {
    #[default]
    None,
    /// Applies the stream volume itself
    Control,
    /// Is told the stream volume
    Indication,
    /// Observes the volume without affecting it
    Monitor,
}

/// Behavior flags advertised alongside an effect's identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectFlags {
    pub kind: EffectKind,
    pub insert: InsertPosition,
    pub volume: VolumeControl,
    pub offload: bool,
    pub bypass: bool,
}

/// Descriptor fields common to every effect type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescriptorCommon {
    pub id: EffectId,
    #[serde(default)]
    pub flags: EffectFlags,
    pub name: String,
    pub implementor: String,
}

/// Self-reported limits of a volume implementation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeCapability {
    /// Upper bound on the level this implementation accepts
    pub max_level: i32,
}

/// Effect-type specific capability advertised in a descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum Capability {
    Volume(VolumeCapability),
    /// The implementation advertises no type-specific limits
    None,
}

/// Full descriptor of an effect implementation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Descriptor {
    pub common: DescriptorCommon,
    pub capability: Capability,
}

impl Descriptor {
    pub fn volume(
        uuid: Uuid,
        name: impl Into<String>,
        implementor: impl Into<String>,
        max_level: i32,
    ) -> Self {
        Self {
            common: DescriptorCommon {
                id: EffectId {
                    type_uuid: VOLUME_TYPE_UUID,
                    uuid,
                    proxy: None,
                },
                flags: EffectFlags {
                    volume: VolumeControl::Control,
                    ..EffectFlags::default()
                },
                name: name.into(),
                implementor: implementor.into(),
            },
            capability: Capability::Volume(VolumeCapability { max_level }),
        }
    }
}

/// Controllable quantities of a volume effect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum VolumeTag {
    LevelDb,
    Mute,
}

impl fmt::Display for VolumeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VolumeTag::LevelDb => write!(f, "levelDb"),
            VolumeTag::Mute => write!(f, "mute"),
        }
    }
}

/// A volume parameter value. Exactly one quantity per value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum VolumeParam {
    LevelDb(i32),
    Mute(bool),
}

impl VolumeParam {
    pub fn tag(&self) -> VolumeTag {
        match self {
            VolumeParam::LevelDb(_) => VolumeTag::LevelDb,
            VolumeParam::Mute(_) => VolumeTag::Mute,
        }
    }
}

impl fmt::Display for VolumeParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VolumeParam::LevelDb(level) => write!(f, "Volume{{levelDb: {}}}", level),
            VolumeParam::Mute(mute) => write!(f, "Volume{{mute: {}}}", mute),
        }
    }
}

/// Parameters every effect is opened with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommonParams {
    pub session: i32,
    pub io_handle: i32,
    pub input_sample_rate: u32,
    pub output_sample_rate: u32,
    pub input_frame_count: i64,
    pub output_frame_count: i64,
}

impl CommonParams {
    pub fn new(
        session: i32,
        io_handle: i32,
        input_sample_rate: u32,
        output_sample_rate: u32,
        input_frame_count: i64,
        output_frame_count: i64,
    ) -> Self {
        Self {
            session,
            io_handle,
            input_sample_rate,
            output_sample_rate,
            input_frame_count,
            output_frame_count,
        }
    }
}

/// Why an implementation refused a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectKind {
    IllegalArgument,
    IllegalState,
    UnsupportedOperation,
}

/// A refusal, with the implementation's explanation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rejection {
    pub kind: RejectKind,
    pub message: String,
}

impl Rejection {
    pub fn new(kind: RejectKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn illegal_argument(message: impl Into<String>) -> Self {
        Self::new(RejectKind::IllegalArgument, message)
    }

    pub fn illegal_state(message: impl Into<String>) -> Self {
        Self::new(RejectKind::IllegalState, message)
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", Status::from(self.kind), self.message)
    }
}

/// Definite answer of an implementation to one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply<T> {
    Accepted(T),
    Rejected(Rejection),
}

impl<T> Reply<T> {
    pub fn status(&self) -> Status {
        match self {
            Reply::Accepted(_) => Status::Ok,
            Reply::Rejected(rejection) => rejection.kind.into(),
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, Reply::Accepted(_))
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Reply<U> {
        match self {
            Reply::Accepted(value) => Reply::Accepted(f(value)),
            Reply::Rejected(rejection) => Reply::Rejected(rejection),
        }
    }
}

impl<T> From<Result<T, Rejection>> for Reply<T> {
    fn from(result: Result<T, Rejection>) -> Self {
        match result {
            Ok(value) => Reply::Accepted(value),
            Err(rejection) => Reply::Rejected(rejection),
        }
    }
}

/// Status code of a reply, without payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Ok,
    IllegalArgument,
    IllegalState,
    UnsupportedOperation,
}

impl From<RejectKind> for Status {
    fn from(kind: RejectKind) -> Self {
        match kind {
            RejectKind::IllegalArgument => Status::IllegalArgument,
            RejectKind::IllegalState => Status::IllegalState,
            RejectKind::UnsupportedOperation => Status::UnsupportedOperation,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Ok => write!(f, "OK"),
            Status::IllegalArgument => write!(f, "ILLEGAL_ARGUMENT"),
            Status::IllegalState => write!(f, "ILLEGAL_STATE"),
            Status::UnsupportedOperation => write!(f, "UNSUPPORTED_OPERATION"),
        }
    }
}

/// The channel to an implementation failed to deliver a request or its reply
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("no reply within {0:?}")]
    Timeout(Duration),
    #[error("effect host disconnected")]
    Disconnected,
    #[error("failed to start effect host: {0}")]
    Spawn(#[source] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_volume_type_uuid_formats_hyphenated() {
        assert_eq!(
            VOLUME_TYPE_UUID.to_string(),
            "fa81a2b4-588b-11ed-9b6a-0242ac120003"
        );
    }

    #[test]
    fn test_reply_status() {
        let ok: Reply<()> = Reply::Accepted(());
        assert_eq!(ok.status(), Status::Ok);
        assert!(ok.is_accepted());

        let rejected: Reply<()> = Reply::Rejected(Rejection::illegal_argument("too loud"));
        assert_eq!(rejected.status(), Status::IllegalArgument);
        assert!(!rejected.is_accepted());
    }

    #[test]
    fn test_param_equality_is_structural() {
        assert_eq!(VolumeParam::LevelDb(-100), VolumeParam::LevelDb(-100));
        assert_ne!(VolumeParam::LevelDb(0), VolumeParam::Mute(false));
        assert_ne!(VolumeParam::Mute(true), VolumeParam::Mute(false));
        assert_eq!(VolumeParam::Mute(true).tag(), VolumeTag::Mute);
    }

    #[test]
    fn test_descriptor_serializes_capability() {
        let desc = Descriptor::volume(Uuid::nil(), "Volume", "Reference", -1000);
        let json = serde_json::to_value(&desc).unwrap();
        assert_eq!(json["capability"]["volume"]["max_level"], -1000);
        assert_eq!(json["common"]["implementor"], "Reference");

        let back: Descriptor = serde_json::from_value(json).unwrap();
        assert_eq!(back, desc);
    }

    #[test]
    fn test_missing_flags_take_defaults() {
        let json = serde_json::json!({
            "common": {
                "id": { "type_uuid": VOLUME_TYPE_UUID, "uuid": Uuid::nil() },
                "name": "Volume",
                "implementor": "Reference"
            },
            "capability": { "volume": { "max_level": 0 } }
        });
        let desc: Descriptor = serde_json::from_value(json).unwrap();
        assert_eq!(desc.common.flags, EffectFlags::default());
        assert_eq!(desc.common.flags.kind, EffectKind::Insert);

        let volume = Descriptor::volume(Uuid::nil(), "Volume", "Reference", 0);
        assert_eq!(volume.common.flags.volume, VolumeControl::Control);
        assert!(!volume.common.flags.bypass);
    }
}
