use crate::effects::{Effect, Fault, VolumeEffect};
use crate::host::EffectHost;
use crate::interface::{EffectFactory, EffectSession};
use crate::types::{
    CommonParams, Descriptor, Rejection, Reply, TransportError, VolumeParam, VolumeTag,
};
use log::{debug, info};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

type EffectConstructor = Box<dyn Fn(&Descriptor) -> Box<dyn Effect> + Send + Sync>;

struct Registration {
    descriptor: Descriptor,
    make: EffectConstructor,
}

/// Keeps an effect counted as live until the host thread that owns it drops it
struct Tracked {
    effect: Box<dyn Effect>,
    live: Arc<AtomicUsize>,
}

impl Tracked {
    fn new(effect: Box<dyn Effect>, live: &Arc<AtomicUsize>) -> Self {
        live.fetch_add(1, Ordering::SeqCst);
        Self {
            effect,
            live: Arc::clone(live),
        }
    }
}

impl Effect for Tracked {
    fn descriptor(&self) -> Descriptor {
        self.effect.descriptor()
    }

    fn open(
        &mut self,
        common: &CommonParams,
        specific: Option<VolumeParam>,
    ) -> Result<(), Rejection> {
        self.effect.open(common, specific)
    }

    fn close(&mut self) {
        self.effect.close();
    }

    fn set_parameter(&mut self, param: VolumeParam) -> Result<(), Rejection> {
        self.effect.set_parameter(param)
    }

    fn get_parameter(&self, tag: VolumeTag) -> Result<VolumeParam, Rejection> {
        self.effect.get_parameter(tag)
    }
}

impl Drop for Tracked {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::SeqCst);
    }
}

/// In-process factory hosting each created effect on its own thread
pub struct LocalFactory {
    name: String,
    registrations: Vec<Registration>,
    timeout: Duration,
    live: Arc<AtomicUsize>,
}

impl LocalFactory {
    /// Create an empty factory whose sessions wait `timeout` for each reply
    pub fn new(name: impl Into<String>, timeout: Duration) -> Self {
        Self {
            name: name.into(),
            registrations: Vec::new(),
            timeout,
            live: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Register an implementation
    ///
    /// `make` is called once per `create_effect` with the registered descriptor.
    pub fn register(
        &mut self,
        descriptor: Descriptor,
        make: impl Fn(&Descriptor) -> Box<dyn Effect> + Send + Sync + 'static,
    ) {
        debug!(
            "Factory '{}': registered '{}' ({})",
            self.name, descriptor.common.name, descriptor.common.id.uuid
        );
        self.registrations.push(Registration {
            descriptor,
            make: Box::new(make),
        });
    }

    /// Register a reference volume implementation
    pub fn register_volume(&mut self, descriptor: Descriptor, fault: Fault) {
        self.register(descriptor, move |desc: &Descriptor| -> Box<dyn Effect> {
            Box::new(VolumeEffect::with_fault(desc.clone(), fault))
        });
    }

    /// Number of created effects whose host thread is still running
    ///
    /// A session whose destroy timed out stays counted until its host
    /// catches up with the queued commands and exits.
    pub fn live_sessions(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl EffectFactory for LocalFactory {
    fn name(&self) -> &str {
        &self.name
    }

    fn query_descriptors(
        &self,
        type_uuid: Option<Uuid>,
    ) -> Result<Vec<Descriptor>, TransportError> {
        Ok(self
            .registrations
            .iter()
            .map(|reg| &reg.descriptor)
            .filter(|desc| type_uuid.map_or(true, |t| desc.common.id.type_uuid == t))
            .cloned()
            .collect())
    }

    fn create_effect(&self, uuid: Uuid) -> Result<Reply<Box<dyn EffectSession>>, TransportError> {
        let Some(reg) = self
            .registrations
            .iter()
            .find(|reg| reg.descriptor.common.id.uuid == uuid)
        else {
            return Ok(Reply::Rejected(Rejection::illegal_argument(format!(
                "no implementation with uuid {}",
                uuid
            ))));
        };

        let effect = Tracked::new((reg.make)(&reg.descriptor), &self.live);
        let session: Box<dyn EffectSession> =
            Box::new(EffectHost::spawn(Box::new(effect), self.timeout)?);
        info!(
            "Factory '{}': created '{}' ({} live)",
            self.name,
            reg.descriptor.common.name,
            self.live_sessions()
        );
        Ok(Reply::Accepted(session))
    }

    fn destroy_effect(&self, session: Box<dyn EffectSession>) -> Result<Reply<()>, TransportError> {
        let reply = session.release()?;
        if reply.is_accepted() {
            info!(
                "Factory '{}': destroyed effect ({} live)",
                self.name,
                self.live_sessions()
            );
        }
        Ok(reply)
    }
}
