pub mod effect_trait;
pub mod volume;

pub use effect_trait::Effect;
pub use volume::{Fault, VolumeEffect};
