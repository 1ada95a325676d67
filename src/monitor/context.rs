use chrono::{DateTime, Utc};

use crate::models::{BrowserState, RecordedEvent, RunningApplicationCollection};

use super::composer::compose;
use super::diff::{diff_applications, diff_browser_states, AppTransition, TabTransition, Transition};
use super::history::EventHistory;

const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

/// Everything one update cycle reads and writes. Owned by the scheduler and
/// only touched while its lock is held, so there is a single writer.
#[derive(Debug, Default)]
pub struct MonitorContext {
    previous_browser: Option<BrowserState>,
    previous_apps: Option<RunningApplicationCollection>,
    initial_browser: Option<BrowserState>,
    initial_apps: Option<RunningApplicationCollection>,
    initial_sent: bool,
    history: EventHistory,
}

impl MonitorContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn history(&self) -> &EventHistory {
        &self.history
    }

    pub fn is_seeded(&self) -> bool {
        self.previous_browser.is_some()
    }

    /// Runs diff, compose and append for a freshly joined snapshot.
    ///
    /// The first call only seeds the previous and initial snapshots; the
    /// initial-state events are handed out later by [`Self::initial_events`].
    pub fn apply(
        &mut self,
        browser: BrowserState,
        apps: RunningApplicationCollection,
        now: DateTime<Utc>,
    ) -> Vec<RecordedEvent> {
        let Some(previous_browser) = self.previous_browser.as_ref() else {
            log_info!(
                "seeding monitor with {} tabs and {} applications",
                browser.all().len(),
                apps.len()
            );
            self.initial_browser = Some(browser.clone());
            self.initial_apps = Some(apps.clone());
            self.previous_browser = Some(browser);
            self.previous_apps = Some(apps);
            return Vec::new();
        };

        if browser.is_empty() && !previous_browser.is_empty() {
            log_warn!(
                "no tabs reported this cycle; closing all {} previously open tabs",
                previous_browser.all().len()
            );
        }

        let mut transitions: Vec<Transition> = diff_browser_states(Some(previous_browser), &browser)
            .into_iter()
            .map(Transition::Tab)
            .collect();
        transitions.extend(
            diff_applications(self.previous_apps.as_ref(), &apps)
                .into_iter()
                .map(Transition::App),
        );

        if transitions.is_empty() {
            return Vec::new();
        }

        let events = compose(transitions, &self.history, now);
        self.history.append(events.iter().cloned());
        self.previous_browser = Some(browser);
        self.previous_apps = Some(apps);
        events
    }

    /// Initial-state events for the start-up handshake. Returns them at most
    /// once, and only after the first cycle has seeded the context.
    pub fn initial_events(&mut self, now: DateTime<Utc>) -> Vec<RecordedEvent> {
        if self.initial_sent {
            return Vec::new();
        }
        let (Some(browser), Some(apps)) = (self.initial_browser.take(), self.initial_apps.take()) else {
            return Vec::new();
        };
        self.initial_sent = true;

        let transitions = vec![
            Transition::Tab(TabTransition::InitialState(browser)),
            Transition::App(AppTransition::InitialState(apps)),
        ];
        let events = compose(transitions, &self.history, now);
        self.history.append(events.iter().cloned());
        events
    }
}
