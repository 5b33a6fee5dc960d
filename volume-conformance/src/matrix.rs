//! Expands discovered instances into independent, named conformance cases.

use crate::values::{level_values, mute_values};
use effect_backend::{Descriptor, EffectFactory, VolumeParam, VolumeTag};
use log::warn;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Prefix shared by every case id
pub const SUITE_NAME: &str = "VolumeTest/VolumeParamTest";

/// Separator replacing every non-alphanumeric character in case names
pub const NAME_SEPARATOR: char = '_';

/// One discovered implementation, reachable through its factory
#[derive(Clone)]
pub struct Instance {
    pub factory: Arc<dyn EffectFactory>,
    pub descriptor: Descriptor,
}

impl Instance {
    pub fn new(factory: Arc<dyn EffectFactory>, descriptor: Descriptor) -> Self {
        Self {
            factory,
            descriptor,
        }
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("factory", &self.factory.name())
            .field("descriptor", &self.descriptor)
            .finish()
    }
}

/// Parameter kind a case exercises
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CaseKind {
    SetAndGetLevel,
    SetAndGetMute,
}

impl CaseKind {
    pub const ALL: [CaseKind; 2] = [CaseKind::SetAndGetLevel, CaseKind::SetAndGetMute];

    pub fn tag(&self) -> VolumeTag {
        match self {
            CaseKind::SetAndGetLevel => VolumeTag::LevelDb,
            CaseKind::SetAndGetMute => VolumeTag::Mute,
        }
    }
}

impl fmt::Display for CaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaseKind::SetAndGetLevel => write!(f, "SetAndGetLevel"),
            CaseKind::SetAndGetMute => write!(f, "SetAndGetMute"),
        }
    }
}

/// A single (instance, kind, value) verification
#[derive(Debug, Clone)]
pub struct TestCase {
    instance: Instance,
    kind: CaseKind,
    level: i32,
    mute: bool,
    name: String,
}

impl TestCase {
    pub fn new(instance: Instance, kind: CaseKind, level: i32, mute: bool) -> Self {
        let name = case_name(&instance.descriptor, level, mute);
        Self {
            instance,
            kind,
            level,
            mute,
            name,
        }
    }

    pub fn instance(&self) -> &Instance {
        &self.instance
    }

    pub fn kind(&self) -> CaseKind {
        self.kind
    }

    pub fn level(&self) -> i32 {
        self.level
    }

    pub fn mute(&self) -> bool {
        self.mute
    }

    /// Sanitized parameter part of the id
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Full id, e.g. `VolumeTest/VolumeParamTest.SetAndGetLevel/Implementor_...`
    pub fn id(&self) -> String {
        format!("{}.{}/{}", SUITE_NAME, self.kind, self.name)
    }

    /// The value this case submits
    pub fn param(&self) -> VolumeParam {
        match self.kind {
            CaseKind::SetAndGetLevel => VolumeParam::LevelDb(self.level),
            CaseKind::SetAndGetMute => VolumeParam::Mute(self.mute),
        }
    }
}

/// Cases for `instances` over the standard level and mute values
pub fn instantiate(instances: &[Instance]) -> Vec<TestCase> {
    instantiate_with(instances, &level_values(), &mute_values())
}

/// Cross product `kind x instance x level x mute`
///
/// Names are made unique by suffixing repeats in order, so two instances
/// with identical descriptors still get stable, distinct ids.
pub fn instantiate_with(instances: &[Instance], levels: &[i32], mutes: &[bool]) -> Vec<TestCase> {
    let mut cases =
        Vec::with_capacity(CaseKind::ALL.len() * instances.len() * levels.len() * mutes.len());

    for kind in CaseKind::ALL {
        let mut seen: HashMap<String, usize> = HashMap::new();
        for instance in instances {
            for &level in levels {
                for &mute in mutes {
                    let mut case = TestCase::new(instance.clone(), kind, level, mute);
                    let count = seen.entry(case.name.clone()).or_insert(0);
                    *count += 1;
                    if *count > 1 {
                        warn!("Duplicate case name '{}', suffixing", case.name);
                        case.name = format!("{}{}{}", case.name, NAME_SEPARATOR, count);
                    }
                    cases.push(case);
                }
            }
        }
    }
    cases
}

/// Name of the case for `descriptor` at the given matrix coordinates
pub fn case_name(descriptor: &Descriptor, level: i32, mute: bool) -> String {
    let common = &descriptor.common;
    let raw = format!(
        "Implementor_{}_name_{}_UUID_{}_level{}_mute{}",
        common.implementor,
        common.name,
        common.id.uuid,
        level,
        u8::from(mute)
    );
    sanitize(&raw)
}

/// Replace every character that is not an ASCII letter or digit
pub fn sanitize(raw: &str) -> String {
    raw.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { NAME_SEPARATOR })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use effect_backend::LocalFactory;
    use proptest::prelude::*;
    use std::time::Duration;
    use uuid::Uuid;

    const UUID: Uuid = Uuid::from_u128(0xb8a031e0_6bbf_11ed_a1eb_0242ac120002);

    fn instance(name: &str) -> Instance {
        let factory = Arc::new(LocalFactory::new("test", Duration::from_millis(100)));
        Instance::new(factory, Descriptor::volume(UUID, name, "The Reference Co.", 0))
    }

    #[test]
    fn test_case_name_format() {
        let desc = Descriptor::volume(UUID, "VolumeSw", "The Reference Co.", 0);
        assert_eq!(
            case_name(&desc, -9601, true),
            "Implementor_The_Reference_Co__name_VolumeSw_UUID_b8a031e0_6bbf_11ed_a1eb_0242ac120002_level_9601_mute1"
        );
        assert_eq!(
            case_name(&desc, 0, false),
            "Implementor_The_Reference_Co__name_VolumeSw_UUID_b8a031e0_6bbf_11ed_a1eb_0242ac120002_level0_mute0"
        );
    }

    #[test]
    fn test_matrix_size_and_order() {
        let cases = instantiate(&[instance("A"), instance("B")]);
        assert_eq!(cases.len(), 2 * 2 * 5 * 2);

        assert_eq!(cases[0].kind(), CaseKind::SetAndGetLevel);
        assert_eq!(cases[0].param(), VolumeParam::LevelDb(-9601));
        assert_eq!(cases[1].param(), VolumeParam::LevelDb(-9601));
        assert!(cases[1].mute());

        let mute_cases: Vec<_> = cases
            .iter()
            .filter(|c| c.kind() == CaseKind::SetAndGetMute)
            .collect();
        assert_eq!(mute_cases.len(), 20);
        assert_eq!(mute_cases[0].param(), VolumeParam::Mute(false));
        assert_eq!(mute_cases[1].param(), VolumeParam::Mute(true));
    }

    #[test]
    fn test_ids_unique_and_stable() {
        let instances = [instance("A"), instance("B")];
        let first: Vec<String> = instantiate(&instances).iter().map(TestCase::id).collect();
        let second: Vec<String> = instantiate(&instances).iter().map(TestCase::id).collect();
        assert_eq!(first, second);

        let mut unique = first.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), first.len());
        assert!(first[0].starts_with("VolumeTest/VolumeParamTest.SetAndGetLevel/Implementor_"));
    }

    #[test]
    fn test_identical_descriptors_get_distinct_ids() {
        let cases = instantiate_with(&[instance("A"), instance("A")], &[0], &[false]);
        assert_eq!(cases.len(), 4);
        assert_ne!(cases[0].id(), cases[1].id());
        assert!(cases[1].name().ends_with("_mute0_2"));
    }

    #[test]
    fn test_empty_instances_yield_no_cases() {
        assert!(instantiate(&[]).is_empty());
    }

    proptest! {
        #[test]
        fn prop_sanitized_names_are_alphanumeric(raw in ".*") {
            let name = sanitize(&raw);
            prop_assert!(name.chars().all(|c| c.is_ascii_alphanumeric() || c == NAME_SEPARATOR));
            prop_assert_eq!(name.chars().count(), raw.chars().count());
        }
    }
}
