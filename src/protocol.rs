//! Event-bus protocol for load progress.
//!
//! Loaders report through [`LoadObserver`]; [`BusLoadObserver`] republishes
//! those callbacks on a `tokio` broadcast bus so any number of components can
//! follow a load without the loader knowing about them.

use tokio::sync::broadcast::Sender;
use uuid::Uuid;

use crate::loader::{LoadObserver, LoadReport, LoadTargetKind};

/// Top-level envelope for all bus traffic.
#[derive(Debug, Clone)]
pub enum Message {
    Load(LoadMessage),
}

/// Load lifecycle notifications. Every message carries the load's session id.
#[derive(Debug, Clone)]
pub enum LoadMessage {
    LoadStarted {
        session_id: Uuid,
        target: LoadTargetKind,
    },
    /// Indices at which one batch's tracks became available.
    BatchInserted {
        session_id: Uuid,
        indices: Vec<usize>,
    },
    LoadCompleted(LoadReport),
}

impl LoadMessage {
    pub fn session_id(&self) -> Uuid {
        match self {
            LoadMessage::LoadStarted { session_id, .. }
            | LoadMessage::BatchInserted { session_id, .. } => *session_id,
            LoadMessage::LoadCompleted(report) => report.session_id,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BusLoadObserver {
    bus_producer: Sender<Message>,
}

impl BusLoadObserver {
    pub fn new(bus_producer: Sender<Message>) -> Self {
        Self { bus_producer }
    }

    fn publish(&self, message: LoadMessage) {
        // No subscribers is fine.
        let _ = self.bus_producer.send(Message::Load(message));
    }
}

impl LoadObserver for BusLoadObserver {
    fn before_load_starts(&self, session_id: Uuid, target: LoadTargetKind) {
        self.publish(LoadMessage::LoadStarted { session_id, target });
    }

    fn batch_inserted(&self, session_id: Uuid, indices: &[usize]) {
        self.publish(LoadMessage::BatchInserted {
            session_id,
            indices: indices.to_vec(),
        });
    }

    fn after_load_completes(&self, report: &LoadReport) {
        self.publish(LoadMessage::LoadCompleted(report.clone()));
    }
}
