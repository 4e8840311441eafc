//! Auth-change notifications within a tab and across tabs.
//!
//! Local flows [`publish`](Notifier::publish) an [`AuthEvent::AuthStateChanged`]
//! after mutating client storage. A [`Subscription`] merges those with the
//! storage writes other tabs make, so a view can simply re-read its state on
//! every event.

use tokio::sync::broadcast;

use crate::storage::StorageWatch;

const EVENT_CAPACITY: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    /// This tab changed the signed-in state.
    AuthStateChanged,
    /// Another tab wrote `key`.
    StorageChanged { key: String },
}

#[derive(Clone)]
pub struct Notifier {
    tx: broadcast::Sender<AuthEvent>,
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier {
    #[must_use]
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_CAPACITY);
        Self { tx }
    }

    /// Deliver `event` to every live subscription. Returns how many received it.
    pub fn publish(&self, event: AuthEvent) -> usize {
        tracing::debug!(?event, "auth event");
        self.tx.send(event).unwrap_or(0)
    }

    /// Local events only.
    #[must_use]
    pub fn subscribe(&self) -> Subscription {
        Subscription {
            local: self.tx.subscribe(),
            storage: None,
        }
    }
}

/// Listener registration. Dropping it unregisters.
pub struct Subscription {
    local: broadcast::Receiver<AuthEvent>,
    storage: Option<StorageWatch>,
}

impl Subscription {
    /// Also deliver writes made by other tabs.
    #[must_use]
    pub fn with_storage(mut self, watch: Option<StorageWatch>) -> Self {
        self.storage = watch;
        self
    }

    /// Next event; `None` once the notifier is gone.
    pub async fn recv(&mut self) -> Option<AuthEvent> {
        loop {
            let Some(watch) = self.storage.as_mut() else {
                return recv_local(&mut self.local).await;
            };
            let storage_closed = tokio::select! {
                event = recv_local(&mut self.local) => return event,
                change = watch.recv() => match change {
                    Some(change) => return Some(AuthEvent::StorageChanged { key: change.key }),
                    None => true,
                },
            };
            if storage_closed {
                self.storage = None;
            }
        }
    }

    /// Non-blocking variant of [`recv`](Self::recv).
    pub fn try_recv(&mut self) -> Option<AuthEvent> {
        loop {
            match self.local.try_recv() {
                Ok(event) => return Some(event),
                Err(broadcast::error::TryRecvError::Lagged(_)) => {}
                Err(_) => break,
            }
        }
        self.storage
            .as_mut()
            .and_then(StorageWatch::try_recv)
            .map(|change| AuthEvent::StorageChanged { key: change.key })
    }
}

async fn recv_local(rx: &mut broadcast::Receiver<AuthEvent>) -> Option<AuthEvent> {
    loop {
        match rx.recv().await {
            Ok(event) => return Some(event),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "auth subscription lagged");
            }
            Err(broadcast::error::RecvError::Closed) => return None,
        }
    }
}
