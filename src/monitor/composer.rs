use chrono::{DateTime, Utc};
use std::time::Duration;

use crate::models::{ApplicationEvent, BrowserEvent, RecordedEvent};

use super::diff::{AppTransition, TabTransition, Transition};
use super::history::EventHistory;

/// Stamps each transition with `now` and resolves durations for closing and
/// switch-away transitions from their anchors in `history`. Order is kept.
pub fn compose(
    transitions: Vec<Transition>,
    history: &EventHistory,
    now: DateTime<Utc>,
) -> Vec<RecordedEvent> {
    transitions
        .into_iter()
        .map(|transition| match transition {
            Transition::Tab(tab) => RecordedEvent::Browser(browser_event(tab, history, now), now),
            Transition::App(app) => RecordedEvent::Application(application_event(app), now),
        })
        .collect()
}

fn browser_event(transition: TabTransition, history: &EventHistory, now: DateTime<Utc>) -> BrowserEvent {
    match transition {
        TabTransition::InitialState(state) => BrowserEvent::InitialState(state),
        TabTransition::Opened(tab) => BrowserEvent::OpenedTab(tab),
        TabTransition::SwitchedTo(tab) => BrowserEvent::SwitchedToTab(tab),
        TabTransition::Closed(tab) => {
            let duration = history
                .most_recent_open(&tab.url)
                .map(|anchor| elapsed_since(anchor.timestamp(), now));
            BrowserEvent::ClosedTab(tab, duration)
        }
        TabTransition::SwitchedAwayFrom(tab) => {
            let duration = history
                .most_recent_switch_to(&tab.url)
                .map(|anchor| elapsed_since(anchor.timestamp(), now));
            BrowserEvent::SwitchedAwayFromTab(tab, duration)
        }
    }
}

fn application_event(transition: AppTransition) -> ApplicationEvent {
    match transition {
        AppTransition::InitialState(apps) => ApplicationEvent::InitialState(apps),
        AppTransition::Opened(app) => ApplicationEvent::OpenedApp(app),
        AppTransition::Closed(app) => ApplicationEvent::ClosedApp(app),
        AppTransition::SwitchedTo(app) => ApplicationEvent::SwitchedToApp(app),
    }
}

// Clamped at zero if the wall clock went backwards.
fn elapsed_since(anchor: DateTime<Utc>, now: DateTime<Utc>) -> Duration {
    (now - anchor).to_std().unwrap_or_default()
}
