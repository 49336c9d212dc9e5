use crate::domain::entities::NotificationEvent;
use crate::domain::errors::DeliveryError;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

pub type ConnectionId = Uuid;

/// Handle to one open push connection (one browser tab or device).
///
/// The owning user is bound when the connection is admitted and never changes.
/// Pushes go through a bounded queue drained by the connection's socket task;
/// `close` cancels that task. Clones share the same queue and close signal, and
/// equality is by connection id.
#[derive(Debug, Clone)]
pub struct Connection {
    id: ConnectionId,
    user_id: Uuid,
    outbound: mpsc::Sender<NotificationEvent>,
    closed: CancellationToken,
}

impl Connection {
    pub fn new(user_id: Uuid, outbound: mpsc::Sender<NotificationEvent>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            outbound,
            closed: CancellationToken::new(),
        }
    }

    /// Connection plus the receiving end of its outbound queue
    pub fn channel(user_id: Uuid, capacity: usize) -> (Self, mpsc::Receiver<NotificationEvent>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self::new(user_id, tx), rx)
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn is_open(&self) -> bool {
        !self.closed.is_cancelled() && !self.outbound.is_closed()
    }

    /// Queue an event without waiting. A full queue counts as a failed send.
    pub fn send(&self, event: &NotificationEvent) -> Result<(), DeliveryError> {
        if self.closed.is_cancelled() {
            return Err(DeliveryError::Closed);
        }
        self.outbound
            .try_send(event.clone())
            .map_err(|e| match e {
                TrySendError::Full(_) => DeliveryError::Backpressure,
                TrySendError::Closed(_) => DeliveryError::Closed,
            })
    }

    /// Idempotent.
    pub fn close(&self) {
        self.closed.cancel();
    }

    /// Resolves once `close` has been called on any clone
    pub async fn closed(&self) {
        self.closed.cancelled().await
    }
}

impl PartialEq for Connection {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Connection {}
