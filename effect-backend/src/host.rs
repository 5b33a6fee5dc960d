use crate::command::Command;
use crate::effects::Effect;
use crate::interface::EffectSession;
use crate::types::{
    CommonParams, Descriptor, Rejection, Reply, TransportError, VolumeParam, VolumeTag,
};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use log::{debug, warn};
use std::ops::ControlFlow;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Lifecycle state of a hosted effect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostState {
    /// Created or closed; only descriptor queries and `open` are allowed
    Init,
    /// Opened; parameters can be set and read
    Idle,
}

/// Owns one effect on a worker thread and answers session commands
pub struct EffectHost {
    effect: Box<dyn Effect>,
    state: HostState,
    command_rx: Receiver<Command>,
}

impl EffectHost {
    pub fn new(effect: Box<dyn Effect>, command_rx: Receiver<Command>) -> Self {
        Self {
            effect,
            state: HostState::Init,
            command_rx,
        }
    }

    /// Start a worker thread hosting `effect` and return the session talking to it
    ///
    /// `timeout` bounds how long the session waits for each reply.
    pub fn spawn(
        effect: Box<dyn Effect>,
        timeout: Duration,
    ) -> Result<HostedSession, TransportError> {
        let name = effect.descriptor().common.name;
        let (command_tx, command_rx) = crossbeam_channel::unbounded();
        let host = EffectHost::new(effect, command_rx);

        let worker = thread::Builder::new()
            .name(format!("effect-host:{}", name))
            .spawn(move || host.run())
            .map_err(TransportError::Spawn)?;

        debug!("Spawned host for effect '{}'", name);
        Ok(HostedSession {
            name,
            command_tx,
            worker: Some(worker),
            timeout,
        })
    }

    pub fn state(&self) -> HostState {
        self.state
    }

    /// Handle commands until shut down or every sender is gone
    pub fn run(mut self) {
        while let Ok(cmd) = self.command_rx.recv() {
            if self.handle_command(cmd).is_break() {
                break;
            }
        }

        if self.state == HostState::Idle {
            self.effect.close();
        }
        debug!("Host for effect '{}' stopped", self.effect.descriptor().common.name);
    }

    /// Handle a single command from a session
    pub fn handle_command(&mut self, cmd: Command) -> ControlFlow<()> {
        match cmd {
            Command::Open {
                common,
                specific,
                reply,
            } => {
                let result = match self.state {
                    HostState::Idle => Err(Rejection::illegal_state("effect already open")),
                    HostState::Init => self.effect.open(&common, specific),
                };
                if result.is_ok() {
                    self.state = HostState::Idle;
                }
                let _ = reply.send(result.into());
            }
            Command::Close { reply } => {
                if self.state == HostState::Idle {
                    self.effect.close();
                    self.state = HostState::Init;
                }
                let _ = reply.send(Reply::Accepted(()));
            }
            Command::Destroy { reply } => {
                if self.state == HostState::Idle {
                    let _ = reply.send(Reply::Rejected(Rejection::illegal_state(
                        "effect must be closed before it is destroyed",
                    )));
                } else {
                    let _ = reply.send(Reply::Accepted(()));
                    return ControlFlow::Break(());
                }
            }
            Command::Shutdown => {
                return ControlFlow::Break(());
            }
            Command::GetDescriptor { reply } => {
                let _ = reply.send(Reply::Accepted(self.effect.descriptor()));
            }
            Command::SetParameter { param, reply } => {
                let result = self
                    .require_open()
                    .and_then(|()| self.effect.set_parameter(param));
                let _ = reply.send(result.into());
            }
            Command::GetParameter { tag, reply } => {
                let result = self
                    .require_open()
                    .and_then(|()| self.effect.get_parameter(tag));
                let _ = reply.send(result.into());
            }
        }
        ControlFlow::Continue(())
    }

    fn require_open(&self) -> Result<(), Rejection> {
        match self.state {
            HostState::Idle => Ok(()),
            HostState::Init => Err(Rejection::illegal_state("effect is not open")),
        }
    }
}

/// Session handle for an effect running in an `EffectHost`
pub struct HostedSession {
    name: String,
    command_tx: Sender<Command>,
    worker: Option<JoinHandle<()>>,
    timeout: Duration,
}

impl HostedSession {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Send a command and wait for its reply
    fn request<T>(
        &self,
        make: impl FnOnce(Sender<Reply<T>>) -> Command,
    ) -> Result<Reply<T>, TransportError> {
        let (reply_tx, reply_rx) = crossbeam_channel::bounded(1);
        self.command_tx
            .send(make(reply_tx))
            .map_err(|_| TransportError::Disconnected)?;

        match reply_rx.recv_timeout(self.timeout) {
            Ok(reply) => Ok(reply),
            Err(RecvTimeoutError::Timeout) => Err(TransportError::Timeout(self.timeout)),
            Err(RecvTimeoutError::Disconnected) => Err(TransportError::Disconnected),
        }
    }
}

impl EffectSession for HostedSession {
    fn open(
        &mut self,
        common: &CommonParams,
        specific: Option<VolumeParam>,
    ) -> Result<Reply<()>, TransportError> {
        let common = *common;
        self.request(|reply| Command::Open {
            common,
            specific,
            reply,
        })
    }

    fn close(&mut self) -> Result<Reply<()>, TransportError> {
        self.request(|reply| Command::Close { reply })
    }

    fn get_descriptor(&mut self) -> Result<Reply<Descriptor>, TransportError> {
        self.request(|reply| Command::GetDescriptor { reply })
    }

    fn set_parameter(&mut self, param: VolumeParam) -> Result<Reply<()>, TransportError> {
        self.request(|reply| Command::SetParameter { param, reply })
    }

    fn get_parameter(&mut self, tag: VolumeTag) -> Result<Reply<VolumeParam>, TransportError> {
        self.request(|reply| Command::GetParameter { tag, reply })
    }

    fn release(mut self: Box<Self>) -> Result<Reply<()>, TransportError> {
        let reply = self.request(|reply| Command::Destroy { reply })?;
        if reply.is_accepted() {
            if let Some(worker) = self.worker.take() {
                if worker.join().is_err() {
                    warn!("Host thread for effect '{}' panicked", self.name);
                }
            }
        }
        Ok(reply)
    }
}

impl Drop for HostedSession {
    fn drop(&mut self) {
        // A stalled host is left to finish on its own rather than joined here
        if self.worker.is_some() {
            let _ = self.command_tx.send(Command::Shutdown);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::{Fault, VolumeEffect};
    use crate::types::{Status, MIN_LEVEL_DB};
    use uuid::Uuid;

    const TIMEOUT: Duration = Duration::from_millis(500);

    fn common() -> CommonParams {
        CommonParams::new(0, 1, 44100, 44100, 0x100, 0x100)
    }

    fn spawn(max_level: i32, fault: Fault) -> HostedSession {
        let desc = Descriptor::volume(Uuid::new_v4(), "Volume", "Test", max_level);
        EffectHost::spawn(Box::new(VolumeEffect::with_fault(desc, fault)), TIMEOUT).unwrap()
    }

    #[test]
    fn test_parameters_require_open() {
        let mut session = spawn(0, Fault::None);
        let reply = session.set_parameter(VolumeParam::Mute(true)).unwrap();
        assert_eq!(reply.status(), Status::IllegalState);

        session.open(&common(), None).unwrap();
        let reply = session.set_parameter(VolumeParam::Mute(true)).unwrap();
        assert_eq!(reply.status(), Status::Ok);
        assert_eq!(
            session.get_parameter(VolumeTag::Mute).unwrap(),
            Reply::Accepted(VolumeParam::Mute(true))
        );
    }

    #[test]
    fn test_destroy_rejected_while_open() {
        let mut session = Box::new(spawn(0, Fault::None));
        session
            .open(&common(), Some(VolumeParam::LevelDb(MIN_LEVEL_DB)))
            .unwrap();
        session.close().unwrap();
        assert_eq!(session.release().unwrap(), Reply::Accepted(()));

        let mut session = Box::new(spawn(0, Fault::None));
        session.open(&common(), None).unwrap();
        assert_eq!(session.release().unwrap().status(), Status::IllegalState);
    }

    #[test]
    fn test_stalled_effect_times_out() {
        let mut session = spawn(0, Fault::Unresponsive(Duration::from_millis(1500)));
        session.open(&common(), None).unwrap();
        let err = session.set_parameter(VolumeParam::LevelDb(-100)).unwrap_err();
        assert!(matches!(err, TransportError::Timeout(_)));
    }

    #[test]
    fn test_handle_command_tracks_state() {
        let desc = Descriptor::volume(Uuid::nil(), "Volume", "Test", 0);
        let (_tx, rx) = crossbeam_channel::unbounded();
        let mut host = EffectHost::new(Box::new(VolumeEffect::new(desc)), rx);
        assert_eq!(host.state(), HostState::Init);

        let (reply_tx, reply_rx) = crossbeam_channel::bounded(1);
        let flow = host.handle_command(Command::Open {
            common: common(),
            specific: None,
            reply: reply_tx,
        });
        assert!(flow.is_continue());
        assert!(reply_rx.recv().unwrap().is_accepted());
        assert_eq!(host.state(), HostState::Idle);

        assert!(host.handle_command(Command::Shutdown).is_break());
    }
}
