use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use super::{BrowserState, RunningApplication, RunningApplicationCollection, Tab};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BrowserEvent {
    InitialState(BrowserState),
    OpenedTab(Tab),
    /// `None` means no anchor was found, which is not the same as zero.
    ClosedTab(Tab, Option<Duration>),
    SwitchedToTab(Tab),
    SwitchedAwayFromTab(Tab, Option<Duration>),
}

impl BrowserEvent {
    pub fn tab(&self) -> Option<&Tab> {
        match self {
            BrowserEvent::InitialState(_) => None,
            BrowserEvent::OpenedTab(tab)
            | BrowserEvent::ClosedTab(tab, _)
            | BrowserEvent::SwitchedToTab(tab)
            | BrowserEvent::SwitchedAwayFromTab(tab, _) => Some(tab),
        }
    }

    pub fn url(&self) -> Option<&str> {
        self.tab().map(|tab| tab.url.as_str())
    }

    pub fn duration(&self) -> Option<Duration> {
        match self {
            BrowserEvent::ClosedTab(_, duration) | BrowserEvent::SwitchedAwayFromTab(_, duration) => {
                *duration
            }
            BrowserEvent::InitialState(_)
            | BrowserEvent::OpenedTab(_)
            | BrowserEvent::SwitchedToTab(_) => None,
        }
    }

    pub fn title(&self) -> String {
        self.to_string()
    }

    pub fn subtitle(&self) -> Option<&str> {
        self.url()
    }

    pub fn matches(&self, filter: &str) -> bool {
        if filter.is_empty() {
            return true;
        }
        if self.url().is_some_and(|url| contains_ignore_case(url, filter)) {
            return true;
        }
        contains_ignore_case(&self.to_string(), filter)
    }
}

impl fmt::Display for BrowserEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BrowserEvent::InitialState(state) => write!(f, "Starting tabs: {}", state.all().len()),
            BrowserEvent::OpenedTab(tab) => write!(f, "Opened {}", tab.display_title()),
            BrowserEvent::ClosedTab(tab, duration) => {
                write!(f, "Closed {}", tab.display_title())?;
                write_duration(f, *duration)
            }
            BrowserEvent::SwitchedToTab(tab) => write!(f, "Switched to {}", tab.display_title()),
            BrowserEvent::SwitchedAwayFromTab(tab, duration) => {
                write!(f, "Switched away from {}", tab.display_title())?;
                write_duration(f, *duration)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ApplicationEvent {
    InitialState(RunningApplicationCollection),
    OpenedApp(RunningApplication),
    ClosedApp(RunningApplication),
    SwitchedToApp(RunningApplication),
}

impl ApplicationEvent {
    pub fn matches(&self, filter: &str) -> bool {
        filter.is_empty() || contains_ignore_case(&self.to_string(), filter)
    }
}

impl fmt::Display for ApplicationEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApplicationEvent::InitialState(apps) => write!(f, "Starting apps: {}", apps.len()),
            ApplicationEvent::OpenedApp(app) => write!(f, "Opened {}", app.name),
            ApplicationEvent::ClosedApp(app) => write!(f, "Closed {}", app.name),
            ApplicationEvent::SwitchedToApp(app) => write!(f, "Switched to {}", app.name),
        }
    }
}

/// One entry of the event log: what happened and when.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RecordedEvent {
    Browser(BrowserEvent, DateTime<Utc>),
    Application(ApplicationEvent, DateTime<Utc>),
}

impl RecordedEvent {
    pub fn id(&self) -> String {
        let stamp = self
            .timestamp()
            .to_rfc3339_opts(SecondsFormat::Micros, true);
        match self.url() {
            Some(url) => format!("{self}|{url}|{stamp}"),
            None => format!("{self}|{stamp}"),
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            RecordedEvent::Browser(_, at) | RecordedEvent::Application(_, at) => *at,
        }
    }

    pub fn url(&self) -> Option<&str> {
        match self {
            RecordedEvent::Browser(event, _) => event.url(),
            RecordedEvent::Application(..) => None,
        }
    }

    pub fn matches(&self, filter: &str) -> bool {
        match self {
            RecordedEvent::Browser(event, _) => event.matches(filter),
            RecordedEvent::Application(event, _) => event.matches(filter),
        }
    }

    pub fn title(&self) -> String {
        match self {
            RecordedEvent::Browser(event, _) => event.title(),
            RecordedEvent::Application(..) => self.description(),
        }
    }

    pub fn subtitle(&self) -> Option<&str> {
        match self {
            RecordedEvent::Browser(event, _) => event.subtitle(),
            RecordedEvent::Application(..) => None,
        }
    }

    pub fn description(&self) -> String {
        self.to_string()
    }

    /// Time elapsed since the event, never negative.
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        let delta = now - self.timestamp();
        let delta = if delta < chrono::Duration::zero() { -delta } else { delta };
        delta.to_std().unwrap_or_default()
    }
}

impl fmt::Display for RecordedEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordedEvent::Browser(event, _) => fmt::Display::fmt(event, f),
            RecordedEvent::Application(event, _) => fmt::Display::fmt(event, f),
        }
    }
}

/// Renders `MM:SS`, switching to `H:MM:SS` once an hour is reached.
pub fn format_duration(duration: Duration) -> String {
    let total = duration.as_secs();
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;
    if hours > 0 {
        format!("{hours}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes:02}:{seconds:02}")
    }
}

fn write_duration(f: &mut fmt::Formatter<'_>, duration: Option<Duration>) -> fmt::Result {
    match duration {
        Some(duration) => write!(f, " {}", format_duration(duration)),
        None => Ok(()),
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn docs_tab() -> Tab {
        Tab::new("https://docs.rs/tokio", Some("Tokio Docs".into()))
    }

    #[test]
    fn descriptions_use_placeholder_and_durations() {
        let untitled = Tab::new("https://example.com", None);
        assert_eq!(BrowserEvent::OpenedTab(untitled.clone()).to_string(), "Opened --");
        assert_eq!(
            BrowserEvent::ClosedTab(untitled.clone(), Some(Duration::from_secs(75))).to_string(),
            "Closed -- 01:15"
        );
        assert_eq!(
            BrowserEvent::SwitchedAwayFromTab(untitled, None).to_string(),
            "Switched away from --"
        );
    }

    #[test]
    fn durations_grow_an_hour_field() {
        assert_eq!(format_duration(Duration::from_secs(59)), "00:59");
        assert_eq!(format_duration(Duration::from_secs(3_725)), "1:02:05");
    }

    #[test]
    fn filter_matches_description_and_url_ignoring_case() {
        let event = RecordedEvent::Browser(BrowserEvent::OpenedTab(docs_tab()), at(0));
        assert!(event.matches(""));
        assert!(event.matches("tokio docs"));
        assert!(event.matches("DOCS.RS"));
        assert!(!event.matches("github"));
    }

    #[test]
    fn application_filter_only_sees_description() {
        let app = RunningApplication::new("com.apple.Safari", "Safari");
        let event = RecordedEvent::Application(ApplicationEvent::OpenedApp(app), at(0));
        assert!(event.matches("opened saf"));
        assert!(!event.matches("com.apple"));
        assert_eq!(event.subtitle(), None);
        assert_eq!(event.title(), "Opened Safari");
    }

    #[test]
    fn browser_subtitle_is_the_tab_url() {
        let event = RecordedEvent::Browser(BrowserEvent::SwitchedToTab(docs_tab()), at(0));
        assert_eq!(event.subtitle(), Some("https://docs.rs/tokio"));
        let initial = RecordedEvent::Browser(
            BrowserEvent::InitialState(BrowserState::new(vec![docs_tab()], vec![])),
            at(0),
        );
        assert_eq!(initial.subtitle(), None);
        assert_eq!(initial.title(), "Starting tabs: 1");
    }

    #[test]
    fn ids_differ_by_time_and_url() {
        let a = RecordedEvent::Browser(BrowserEvent::OpenedTab(Tab::new("a", None)), at(0));
        let b = RecordedEvent::Browser(BrowserEvent::OpenedTab(Tab::new("b", None)), at(0));
        let later = RecordedEvent::Browser(BrowserEvent::OpenedTab(Tab::new("a", None)), at(1));
        assert_ne!(a.id(), b.id());
        assert_ne!(a.id(), later.id());
    }

    #[test]
    fn age_is_measured_from_timestamp() {
        let event = RecordedEvent::Browser(BrowserEvent::OpenedTab(docs_tab()), at(0));
        assert_eq!(event.age(at(30)), Duration::from_secs(30));
    }
}
