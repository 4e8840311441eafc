//! Handle returned by [`Baas::subscribe_messages`](crate::Baas::subscribe_messages).

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::types::MessageEvent;

/// Channel capacity for change events awaiting a reader.
pub(crate) const FEED_CAPACITY: usize = 64;

/// A live message change subscription.
///
/// Dropping the handle tears the subscription down: a background poller, if
/// any, is aborted and the sending side observes a closed channel.
#[derive(Debug)]
pub struct MessageSubscription {
    rx: mpsc::Receiver<MessageEvent>,
    task: Option<JoinHandle<()>>,
}

impl MessageSubscription {
    pub(crate) fn channel() -> (mpsc::Sender<MessageEvent>, Self) {
        let (tx, rx) = mpsc::channel(FEED_CAPACITY);
        (tx, Self { rx, task: None })
    }

    pub(crate) fn with_task(mut self, task: JoinHandle<()>) -> Self {
        self.task = Some(task);
        self
    }

    /// Next change, or `None` once the feed has closed.
    pub async fn recv(&mut self) -> Option<MessageEvent> {
        self.rx.recv().await
    }

    /// Next change if one is already buffered.
    pub fn try_recv(&mut self) -> Option<MessageEvent> {
        self.rx.try_recv().ok()
    }
}

impl Drop for MessageSubscription {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
