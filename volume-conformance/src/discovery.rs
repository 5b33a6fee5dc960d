use crate::matrix::Instance;
use effect_backend::EffectFactory;
use log::{info, warn};
use std::sync::Arc;
use uuid::Uuid;

/// Collect every implementation of `type_uuid` across `factories`
///
/// Instances come back in factory order, then descriptor order. A factory
/// that cannot be queried is skipped; the others still contribute.
pub fn discover_instances(factories: &[Arc<dyn EffectFactory>], type_uuid: Uuid) -> Vec<Instance> {
    let mut instances = Vec::new();

    for factory in factories {
        match factory.query_descriptors(Some(type_uuid)) {
            Ok(descriptors) => {
                info!(
                    "Factory '{}': {} implementation(s) of {}",
                    factory.name(),
                    descriptors.len(),
                    type_uuid
                );
                instances.extend(
                    descriptors
                        .into_iter()
                        .map(|descriptor| Instance::new(Arc::clone(factory), descriptor)),
                );
            }
            Err(e) => {
                warn!("Factory '{}' could not be queried: {}", factory.name(), e);
            }
        }
    }

    instances
}
