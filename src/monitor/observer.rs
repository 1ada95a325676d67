use anyhow::Result;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use tokio::sync::mpsc;

use crate::models::RecordedEvent;

const ENABLE_LOGS: bool = true;

use crate::log_warn;

/// Receives each non-empty batch of events, in the order they were appended.
pub trait RecordedEventObserver: Send + Sync {
    fn received_events(&self, events: &[RecordedEvent]) -> Result<()>;
}

type ObserverSlot = Arc<Mutex<Option<Weak<dyn RecordedEventObserver>>>>;

/// Hands batches to the registered observer without blocking the caller.
///
/// Batches are queued on an unbounded channel and drained by one task, so
/// delivery order matches append order. The observer is held weakly; once it
/// is dropped, batches are discarded.
pub struct EventDispatcher {
    observer: ObserverSlot,
    sender: mpsc::UnboundedSender<Vec<RecordedEvent>>,
}

impl EventDispatcher {
    /// Spawns the delivery task, so it must be called inside a Tokio runtime.
    pub fn new() -> Self {
        let observer: ObserverSlot = Arc::new(Mutex::new(None));
        let (sender, receiver) = mpsc::unbounded_channel();
        tokio::spawn(delivery_loop(receiver, Arc::clone(&observer)));
        Self { observer, sender }
    }

    pub fn register<O>(&self, observer: &Arc<O>)
    where
        O: RecordedEventObserver + 'static,
    {
        let weak: Weak<O> = Arc::downgrade(observer);
        let weak: Weak<dyn RecordedEventObserver> = weak;
        *lock_slot(&self.observer) = Some(weak);
    }

    pub fn has_observer(&self) -> bool {
        lock_slot(&self.observer)
            .as_ref()
            .is_some_and(|weak| weak.strong_count() > 0)
    }

    pub fn deliver(&self, batch: Vec<RecordedEvent>) {
        if batch.is_empty() {
            return;
        }
        if self.sender.send(batch).is_err() {
            log_warn!("event delivery task has stopped; dropping batch");
        }
    }
}

async fn delivery_loop(mut receiver: mpsc::UnboundedReceiver<Vec<RecordedEvent>>, observer: ObserverSlot) {
    while let Some(batch) = receiver.recv().await {
        let current = lock_slot(&observer).as_ref().and_then(Weak::upgrade);
        let Some(current) = current else {
            log::trace!("no observer registered; skipping {} events", batch.len());
            continue;
        };
        if let Err(err) = current.received_events(&batch) {
            log_warn!("observer failed to accept {} events: {err:?}", batch.len());
        }
    }
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

fn lock_slot(slot: &ObserverSlot) -> MutexGuard<'_, Option<Weak<dyn RecordedEventObserver>>> {
    match slot.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
