//! Shared test doubles for the monitor.
//!
//! `ScriptedProvider` replays a fixed sequence of browser states and
//! `ChannelObserver` forwards delivered batches to a channel the test can await.

#![cfg(test)]

use anyhow::{bail, Result};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, Notify};

use crate::models::{BrowserState, RecordedEvent, RunningApplication, RunningApplicationCollection};
use crate::monitor::RecordedEventObserver;
use crate::sources::SnapshotProvider;

/// Returns the queued states in order, then keeps repeating the last one.
pub struct ScriptedProvider {
    states: Mutex<VecDeque<BrowserState>>,
    last: Mutex<BrowserState>,
    apps: RunningApplicationCollection,
    gate: Option<Arc<Notify>>,
    fetches: Arc<AtomicUsize>,
}

impl ScriptedProvider {
    pub fn new(states: Vec<BrowserState>) -> Self {
        let finder = RunningApplication::new("com.apple.finder", "Finder");
        Self {
            states: Mutex::new(states.into()),
            last: Mutex::new(BrowserState::default()),
            apps: RunningApplicationCollection::new(vec![finder.clone()], Some(finder)),
            gate: None,
            fetches: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Every browser fetch waits for one `notify_one` on `gate`.
    pub fn with_gate(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn fetch_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.fetches)
    }

    fn next_state(&self) -> BrowserState {
        let next = self.states.lock().expect("states lock").pop_front();
        let mut last = self.last.lock().expect("last lock");
        if let Some(state) = next {
            *last = state;
        }
        last.clone()
    }
}

impl SnapshotProvider for ScriptedProvider {
    async fn fetch_browser_state(&self) -> BrowserState {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.next_state()
    }

    async fn fetch_running_applications(&self) -> RunningApplicationCollection {
        self.apps.clone()
    }
}

pub struct ChannelObserver {
    sender: mpsc::UnboundedSender<Vec<RecordedEvent>>,
    fail_next: AtomicBool,
}

impl ChannelObserver {
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<Vec<RecordedEvent>>) {
        Self::build(false)
    }

    /// Rejects the first batch it receives, then behaves normally.
    pub fn failing_first() -> (Arc<Self>, mpsc::UnboundedReceiver<Vec<RecordedEvent>>) {
        Self::build(true)
    }

    fn build(fail_first: bool) -> (Arc<Self>, mpsc::UnboundedReceiver<Vec<RecordedEvent>>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let observer = Arc::new(Self {
            sender,
            fail_next: AtomicBool::new(fail_first),
        });
        (observer, receiver)
    }
}

impl RecordedEventObserver for ChannelObserver {
    fn received_events(&self, events: &[RecordedEvent]) -> Result<()> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            bail!("observer rejected batch");
        }
        self.sender.send(events.to_vec())?;
        Ok(())
    }
}
