use std::sync::mpsc::Sender;
use std::thread;
use std::time::Duration;

use tracing::debug;

use super::model::Annotations;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum EnvError {
    #[error("permission denied: {operation} is not allowed while the environment is read-only")]
    PermissionDenied { operation: &'static str },
    #[error("environment rejected the request: {0}")]
    Rejected(String),
    #[error("environment dropped the request without replying")]
    Disconnected,
}

/// What a remote call was issued for, so its completion can be routed back.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PendingCall {
    AnnotationsUpdated { service_id: String, drag_generation: u64 },
    ServiceDestroyed { service_id: String },
}

#[derive(Debug)]
pub struct Completion {
    pub call: PendingCall,
    pub result: Result<(), EnvError>,
}

/// One-shot reply slot handed to the environment with every call.
///
/// Sending consumes the reply; a reply dropped unanswered reports
/// [`EnvError::Disconnected`], so every call completes exactly once.
#[derive(Debug)]
pub struct Reply {
    call: Option<PendingCall>,
    tx: Sender<Completion>,
}

impl Reply {
    pub fn new(call: PendingCall, tx: Sender<Completion>) -> Self {
        Self {
            call: Some(call),
            tx,
        }
    }

    pub fn call(&self) -> Option<&PendingCall> {
        self.call.as_ref()
    }

    pub fn send(mut self, result: Result<(), EnvError>) {
        if let Some(call) = self.call.take() {
            let _ = self.tx.send(Completion { call, result });
        }
    }
}

impl Drop for Reply {
    fn drop(&mut self) {
        if let Some(call) = self.call.take() {
            let _ = self.tx.send(Completion {
                call,
                result: Err(EnvError::Disconnected),
            });
        }
    }
}

pub trait Environment {
    fn update_annotations(&self, service_id: &str, patch: Annotations, reply: Reply);
    fn destroy_service(&self, service_id: &str, reply: Reply);
}

/// Stand-in for a remote environment: answers every call from a worker
/// thread after a fixed latency.
#[derive(Clone, Debug)]
pub struct SimulatedEnvironment {
    latency: Duration,
    read_only: bool,
}

impl SimulatedEnvironment {
    pub fn new(latency: Duration, read_only: bool) -> Self {
        Self { latency, read_only }
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    fn respond(&self, operation: &'static str, reply: Reply) {
        let latency = self.latency;
        let result = if self.read_only {
            Err(EnvError::PermissionDenied { operation })
        } else {
            Ok(())
        };

        thread::spawn(move || {
            thread::sleep(latency);
            reply.send(result);
        });
    }
}

impl Environment for SimulatedEnvironment {
    fn update_annotations(&self, service_id: &str, patch: Annotations, reply: Reply) {
        debug!(service_id, keys = patch.len(), "update_annotations");
        self.respond("update_annotations", reply);
    }

    fn destroy_service(&self, service_id: &str, reply: Reply) {
        debug!(service_id, "destroy_service");
        self.respond("destroy_service", reply);
    }
}
