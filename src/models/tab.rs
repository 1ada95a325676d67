use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Shown wherever a tab has no usable title.
pub const UNTITLED_TAB: &str = "--";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tab {
    pub url: String,
    pub title: Option<String>,
}

impl Tab {
    pub fn new(url: impl Into<String>, title: Option<String>) -> Self {
        Self {
            url: url.into(),
            title,
        }
    }

    pub fn display_title(&self) -> &str {
        self.title
            .as_deref()
            .filter(|title| !title.trim().is_empty())
            .unwrap_or(UNTITLED_TAB)
    }
}

/// Every open tab plus the ones currently in front, captured at one instant.
///
/// Tabs are unique by URL within each set and `visible` is always a subset of
/// `all`. A state is never mutated after construction; the next poll builds a
/// fresh one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrowserState {
    all: Vec<Tab>,
    visible: Vec<Tab>,
}

impl BrowserState {
    pub fn new(all: Vec<Tab>, visible: Vec<Tab>) -> Self {
        let all = dedup_by_url(all);
        let known: HashSet<&str> = all.iter().map(|tab| tab.url.as_str()).collect();
        let visible = dedup_by_url(visible)
            .into_iter()
            .filter(|tab| {
                let listed = known.contains(tab.url.as_str());
                if !listed {
                    log::debug!("dropping visible tab missing from all tabs: {}", tab.url);
                }
                listed
            })
            .collect();

        Self { all, visible }
    }

    /// Joins per-browser contributions into a single state.
    pub fn merge(parts: impl IntoIterator<Item = (Vec<Tab>, Vec<Tab>)>) -> Self {
        let mut all = Vec::new();
        let mut visible = Vec::new();
        for (part_all, part_visible) in parts {
            all.extend(part_all);
            visible.extend(part_visible);
        }
        Self::new(all, visible)
    }

    pub fn all(&self) -> &[Tab] {
        &self.all
    }

    pub fn visible(&self) -> &[Tab] {
        &self.visible
    }

    pub fn contains(&self, url: &str) -> bool {
        self.all.iter().any(|tab| tab.url == url)
    }

    pub fn is_visible(&self, url: &str) -> bool {
        self.visible.iter().any(|tab| tab.url == url)
    }

    pub fn is_empty(&self) -> bool {
        self.all.is_empty()
    }

    pub(crate) fn all_urls(&self) -> HashSet<&str> {
        self.all.iter().map(|tab| tab.url.as_str()).collect()
    }

    pub(crate) fn visible_urls(&self) -> HashSet<&str> {
        self.visible.iter().map(|tab| tab.url.as_str()).collect()
    }
}

fn dedup_by_url(tabs: Vec<Tab>) -> Vec<Tab> {
    let mut seen = HashSet::new();
    tabs.into_iter()
        .filter(|tab| seen.insert(tab.url.clone()))
        .collect()
}
