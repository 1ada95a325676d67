use crate::models::{BrowserState, RunningApplication, RunningApplicationCollection, Tab};

/// A single tab-level change between two consecutive browser states.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TabTransition {
    InitialState(BrowserState),
    Closed(Tab),
    Opened(Tab),
    SwitchedAwayFrom(Tab),
    SwitchedTo(Tab),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppTransition {
    InitialState(RunningApplicationCollection),
    Closed(RunningApplication),
    Opened(RunningApplication),
    SwitchedTo(RunningApplication),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Tab(TabTransition),
    App(AppTransition),
}

/// Compares two browser states and lists what changed, in a fixed order:
/// closed, opened, switched away, switched to.
///
/// Without a previous state the only output is the initial state. A tab that
/// left `all` is reported as closed and never also as switched away.
pub fn diff_browser_states(
    previous: Option<&BrowserState>,
    current: &BrowserState,
) -> Vec<TabTransition> {
    let Some(previous) = previous else {
        return vec![TabTransition::InitialState(current.clone())];
    };

    let previous_all = previous.all_urls();
    let current_all = current.all_urls();
    let previous_visible = previous.visible_urls();
    let current_visible = current.visible_urls();

    let mut transitions = Vec::new();

    transitions.extend(
        previous
            .all()
            .iter()
            .filter(|tab| !current_all.contains(tab.url.as_str()))
            .cloned()
            .map(TabTransition::Closed),
    );

    transitions.extend(
        current
            .all()
            .iter()
            .filter(|tab| !previous_all.contains(tab.url.as_str()))
            .cloned()
            .map(TabTransition::Opened),
    );

    transitions.extend(
        previous
            .visible()
            .iter()
            .filter(|tab| {
                !current_visible.contains(tab.url.as_str()) && current_all.contains(tab.url.as_str())
            })
            .cloned()
            .map(TabTransition::SwitchedAwayFrom),
    );

    transitions.extend(
        current
            .visible()
            .iter()
            .filter(|tab| !previous_visible.contains(tab.url.as_str()))
            .cloned()
            .map(TabTransition::SwitchedTo),
    );

    transitions
}

/// Same contract as [`diff_browser_states`] for running applications: closed,
/// opened, then a switch when the frontmost application changed.
pub fn diff_applications(
    previous: Option<&RunningApplicationCollection>,
    current: &RunningApplicationCollection,
) -> Vec<AppTransition> {
    let Some(previous) = previous else {
        return vec![AppTransition::InitialState(current.clone())];
    };

    let previous_ids = previous.identifiers();
    let current_ids = current.identifiers();

    let mut transitions: Vec<AppTransition> = previous
        .apps()
        .iter()
        .filter(|app| !current_ids.contains(app.identifier.as_str()))
        .cloned()
        .map(AppTransition::Closed)
        .collect();

    transitions.extend(
        current
            .apps()
            .iter()
            .filter(|app| !previous_ids.contains(app.identifier.as_str()))
            .cloned()
            .map(AppTransition::Opened),
    );

    let previous_front = previous.frontmost().map(|app| app.identifier.as_str());
    if let Some(front) = current.frontmost() {
        if previous_front != Some(front.identifier.as_str()) {
            transitions.push(AppTransition::SwitchedTo(front.clone()));
        }
    }

    transitions
}
