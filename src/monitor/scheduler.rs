use anyhow::{bail, Context, Result};
use chrono::Utc;
use std::sync::{Arc, Mutex as StdMutex, MutexGuard, Weak};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::models::RecordedEvent;
use crate::sources::SnapshotProvider;

use super::context::MonitorContext;
use super::history::EventHistory;
use super::observer::{EventDispatcher, RecordedEventObserver};
use super::state::{SchedulerState, StateCell};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

pub const DEFAULT_CHECK_INTERVAL_SECS: u64 = 5;

struct Ticker {
    handle: JoinHandle<()>,
    cancel_token: CancellationToken,
}

struct SchedulerInner<P> {
    provider: P,
    context: Arc<Mutex<MonitorContext>>,
    state: StateCell,
    interval: StdMutex<Duration>,
    ticker: StdMutex<Option<Ticker>>,
    dispatcher: EventDispatcher,
}

/// Drives fetch, diff, compose, append and notify on a recurring timer.
///
/// At most one cycle runs at a time. A fire that arrives while a cycle is in
/// flight is dropped rather than queued.
pub struct UpdateScheduler<P: SnapshotProvider> {
    inner: Arc<SchedulerInner<P>>,
}

impl<P: SnapshotProvider> Clone for UpdateScheduler<P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<P: SnapshotProvider> UpdateScheduler<P> {
    /// Must be called inside a Tokio runtime. Fails on a zero interval.
    pub fn new(provider: P, interval: Duration) -> Result<Self> {
        if interval.is_zero() {
            bail!("poll interval must be greater than zero");
        }
        Ok(Self {
            inner: Arc::new(SchedulerInner {
                provider,
                context: Arc::new(Mutex::new(MonitorContext::new())),
                state: StateCell::new(),
                interval: StdMutex::new(interval),
                ticker: StdMutex::new(None),
                dispatcher: EventDispatcher::new(),
            }),
        })
    }

    pub fn state(&self) -> SchedulerState {
        self.inner.state.get()
    }

    pub fn interval(&self) -> Duration {
        *lock(&self.inner.interval)
    }

    pub fn start(&self) -> Result<()> {
        if !self.inner.state.start() {
            bail!("update scheduler already running");
        }
        SchedulerInner::install_ticker(&self.inner);
        log_info!("update scheduler started ({}s interval)", self.interval().as_secs_f64());
        Ok(())
    }

    /// Stops the timer. A cycle already in flight is not cancelled; it
    /// finishes and its events are still appended and delivered.
    pub async fn stop(&self) -> Result<()> {
        let left = self.inner.state.stop();
        let ticker = lock(&self.inner.ticker).take();

        if let Some(ticker) = ticker {
            ticker.cancel_token.cancel();
            ticker
                .handle
                .await
                .context("update ticker task failed to join")?;
        }

        log_info!("update scheduler stopped (was {:?})", left);
        Ok(())
    }

    /// Changes the poll interval. A running timer is replaced, never duplicated.
    pub fn set_interval(&self, interval: Duration) -> Result<()> {
        if interval.is_zero() {
            bail!("poll interval must be greater than zero");
        }
        *lock(&self.inner.interval) = interval;

        if self.inner.state.get() != SchedulerState::Idle {
            SchedulerInner::install_ticker(&self.inner);
            log_info!("update scheduler re-armed ({}s interval)", interval.as_secs_f64());
        }
        Ok(())
    }

    /// Triggers one cycle now, exactly like a timer tick. Returns `None` when
    /// the fire was dropped because the scheduler is idle or a cycle is running.
    pub fn fire(&self) -> Option<JoinHandle<()>> {
        SchedulerInner::fire(&self.inner)
    }

    pub fn register_observer<O>(&self, observer: &Arc<O>)
    where
        O: RecordedEventObserver + 'static,
    {
        self.inner.dispatcher.register(observer);
    }

    /// Starts polling, runs a first cycle to capture the initial state, and
    /// hands that state to `observer` as the first batch it receives.
    pub async fn setup<O>(&self, observer: &Arc<O>) -> Result<()>
    where
        O: RecordedEventObserver + 'static,
    {
        self.start()?;

        // The seeding cycle runs under the context lock, so timer fires are
        // dropped until the observer holds the initial state.
        let mut context = self.inner.context.lock().await;
        if self.inner.state.begin_update() {
            self.inner.run_cycle(&mut context).await;
        }

        self.inner.dispatcher.register(observer);
        let initial = context.initial_events(Utc::now());
        if initial.is_empty() {
            log_warn!("no initial state available for the new observer");
        }
        self.inner.dispatcher.deliver(initial);
        Ok(())
    }

    /// Copy of the event log. Waits for an in-flight cycle to finish.
    pub async fn history(&self) -> EventHistory {
        self.inner.context.lock().await.history().clone()
    }

    pub async fn filter(&self, text: &str) -> Vec<RecordedEvent> {
        let context = self.inner.context.lock().await;
        context.history().filter(text).cloned().collect()
    }
}

impl<P: SnapshotProvider> SchedulerInner<P> {
    fn install_ticker(this: &Arc<Self>) {
        let mut slot = lock(&this.ticker);
        if let Some(previous) = slot.take() {
            previous.cancel_token.cancel();
            previous.handle.abort();
        }
        if this.state.get() == SchedulerState::Idle {
            return;
        }

        let period = *lock(&this.interval);
        let cancel_token = CancellationToken::new();
        let handle = tokio::spawn(tick_loop(Arc::downgrade(this), period, cancel_token.clone()));
        *slot = Some(Ticker {
            handle,
            cancel_token,
        });
    }

    fn fire(this: &Arc<Self>) -> Option<JoinHandle<()>> {
        let Ok(mut context) = Arc::clone(&this.context).try_lock_owned() else {
            log::debug!("update already in progress; dropping fire");
            return None;
        };
        if !this.state.begin_update() {
            log::debug!("scheduler is {:?}; dropping fire", this.state.get());
            return None;
        }

        let scheduler = Arc::clone(this);
        Some(tokio::spawn(async move {
            scheduler.run_cycle(&mut context).await;
        }))
    }

    /// Callers hold the context lock and have already entered `Updating`.
    async fn run_cycle(&self, context: &mut MonitorContext) {
        let fetch_start = Instant::now();
        let (browser, apps) = tokio::join!(
            self.provider.fetch_browser_state(),
            self.provider.fetch_running_applications()
        );
        let fetch_duration_ms = fetch_start.elapsed().as_millis();

        let events = context.apply(browser, apps, Utc::now());
        if events.is_empty() {
            log::debug!("update cycle found no changes (fetch {}ms)", fetch_duration_ms);
        } else {
            log_info!(
                "update cycle recorded {} events (fetch {}ms)",
                events.len(),
                fetch_duration_ms
            );
            self.dispatcher.deliver(events);
        }

        self.state.finish_update();
    }
}

async fn tick_loop<P: SnapshotProvider>(
    scheduler: Weak<SchedulerInner<P>>,
    period: Duration,
    cancel_token: CancellationToken,
) {
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let Some(scheduler) = scheduler.upgrade() else {
                    break;
                };
                SchedulerInner::fire(&scheduler);
            }
            _ = cancel_token.cancelled() => {
                log::debug!("update ticker shutting down");
                break;
            }
        }
    }
}

fn lock<T>(mutex: &StdMutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
