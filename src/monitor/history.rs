use crate::models::{BrowserEvent, RecordedEvent};

/// Append-only, chronological log of everything the monitor recorded.
///
/// Entries are never removed or reordered; insertion order is time order.
#[derive(Debug, Clone, Default)]
pub struct EventHistory {
    events: Vec<RecordedEvent>,
}

impl EventHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, batch: impl IntoIterator<Item = RecordedEvent>) {
        self.events.extend(batch);
    }

    pub fn events(&self) -> &[RecordedEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn last(&self) -> Option<&RecordedEvent> {
        self.events.last()
    }

    /// Latest entry that opened the tab, or an initial state listing it among all tabs.
    pub fn most_recent_open(&self, url: &str) -> Option<&RecordedEvent> {
        self.find_latest(|event| match event {
            BrowserEvent::OpenedTab(tab) => tab.url == url,
            BrowserEvent::InitialState(state) => state.contains(url),
            BrowserEvent::ClosedTab(..)
            | BrowserEvent::SwitchedToTab(_)
            | BrowserEvent::SwitchedAwayFromTab(..) => false,
        })
    }

    /// Latest entry that switched to the tab, or an initial state showing it as visible.
    pub fn most_recent_switch_to(&self, url: &str) -> Option<&RecordedEvent> {
        self.find_latest(|event| match event {
            BrowserEvent::SwitchedToTab(tab) => tab.url == url,
            BrowserEvent::InitialState(state) => state.is_visible(url),
            BrowserEvent::OpenedTab(_)
            | BrowserEvent::ClosedTab(..)
            | BrowserEvent::SwitchedAwayFromTab(..) => false,
        })
    }

    pub fn filter<'a>(&'a self, text: &'a str) -> impl Iterator<Item = &'a RecordedEvent> + 'a {
        self.events.iter().filter(move |event| event.matches(text))
    }

    fn find_latest(&self, is_anchor: impl Fn(&BrowserEvent) -> bool) -> Option<&RecordedEvent> {
        self.events.iter().rev().find(|recorded| match recorded {
            RecordedEvent::Browser(event, _) => is_anchor(event),
            RecordedEvent::Application(..) => false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ApplicationEvent, BrowserState, RunningApplication, Tab};
    use chrono::{DateTime, TimeZone, Utc};

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn tab(url: &str) -> Tab {
        Tab::new(url, None)
    }

    fn browser(event: BrowserEvent, secs: i64) -> RecordedEvent {
        RecordedEvent::Browser(event, at(secs))
    }

    #[test]
    fn open_anchor_prefers_latest_entry() {
        let mut history = EventHistory::new();
        history.append(vec![
            browser(
                BrowserEvent::InitialState(BrowserState::new(vec![tab("a")], vec![])),
                0,
            ),
            browser(BrowserEvent::ClosedTab(tab("a"), None), 5),
            browser(BrowserEvent::OpenedTab(tab("a")), 10),
        ]);

        let anchor = history.most_recent_open("a").map(RecordedEvent::timestamp);
        assert_eq!(anchor, Some(at(10)));
        assert!(history.most_recent_open("b").is_none());
    }

    #[test]
    fn switch_anchor_uses_visible_tabs_of_initial_state() {
        let mut history = EventHistory::new();
        history.append(vec![browser(
            BrowserEvent::InitialState(BrowserState::new(
                vec![tab("a"), tab("b")],
                vec![tab("a")],
            )),
            0,
        )]);

        assert!(history.most_recent_switch_to("a").is_some());
        assert!(history.most_recent_switch_to("b").is_none());
        assert!(history.most_recent_open("b").is_some());
    }

    #[test]
    fn application_entries_are_never_anchors() {
        let mut history = EventHistory::new();
        history.append(vec![RecordedEvent::Application(
            ApplicationEvent::OpenedApp(RunningApplication::new("a", "a")),
            at(0),
        )]);
        assert!(history.most_recent_open("a").is_none());
        assert!(history.most_recent_switch_to("a").is_none());
    }

    #[test]
    fn append_keeps_insertion_order() {
        let mut history = EventHistory::new();
        history.append(vec![browser(BrowserEvent::OpenedTab(tab("a")), 0)]);
        history.append(vec![
            browser(BrowserEvent::OpenedTab(tab("b")), 1),
            browser(BrowserEvent::OpenedTab(tab("c")), 1),
        ]);
        let urls: Vec<&str> = history.events().iter().filter_map(RecordedEvent::url).collect();
        assert_eq!(urls, vec!["a", "b", "c"]);
        assert_eq!(history.last().and_then(RecordedEvent::url), Some("c"));
    }

    #[test]
    fn filter_with_empty_text_returns_everything() {
        let mut history = EventHistory::new();
        history.append(vec![
            browser(BrowserEvent::OpenedTab(Tab::new("https://rust-lang.org", None)), 0),
            browser(BrowserEvent::OpenedTab(Tab::new("https://crates.io", None)), 1),
        ]);
        assert_eq!(history.filter("").count(), 2);
        assert_eq!(history.filter("CRATES").count(), 1);
    }
}
