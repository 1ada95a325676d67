mod applications;
mod browser;
mod script_runner;

pub use applications::{frontmost_application_name, ApplicationScanner};
pub use browser::{fetch_tabs, parse_tabs, Browser, TabScope};
pub use script_runner::ScriptRunner;

use std::future::Future;
use tokio::task::JoinSet;

use crate::models::{BrowserState, RunningApplicationCollection, Tab};

const ENABLE_LOGS: bool = true;

use crate::log_warn;

/// Where snapshots come from. Implementations never fail: an unavailable
/// source contributes nothing instead of returning an error.
pub trait SnapshotProvider: Send + Sync + 'static {
    fn fetch_browser_state(&self) -> impl Future<Output = BrowserState> + Send;

    fn fetch_running_applications(&self) -> impl Future<Output = RunningApplicationCollection> + Send;
}

/// Reads tabs from the configured browsers via AppleScript and applications
/// from the process table.
pub struct DesktopProvider {
    runner: ScriptRunner,
    scanner: ApplicationScanner,
    browsers: Vec<Browser>,
}

impl DesktopProvider {
    pub fn new(browsers: Vec<Browser>) -> Self {
        Self {
            runner: ScriptRunner::new(),
            scanner: ApplicationScanner::new(),
            browsers,
        }
    }

    pub fn browsers(&self) -> &[Browser] {
        &self.browsers
    }
}

impl SnapshotProvider for DesktopProvider {
    async fn fetch_browser_state(&self) -> BrowserState {
        let running = self.scanner.running_names().await;

        let mut fetches = JoinSet::new();
        for (index, browser) in self.browsers.iter().copied().enumerate() {
            if !running.contains(browser.process_name()) {
                log::trace!("{} is not running; skipping", browser.process_name());
                continue;
            }
            for scope in [TabScope::All, TabScope::Visible] {
                let runner = self.runner.clone();
                fetches.spawn(async move { (index, scope, fetch_tabs(&runner, browser, scope).await) });
            }
        }

        // Every sub-fetch joins before the state is assembled.
        let mut parts: Vec<(Vec<Tab>, Vec<Tab>)> = vec![(Vec::new(), Vec::new()); self.browsers.len()];
        while let Some(joined) = fetches.join_next().await {
            match joined {
                Ok((index, scope, tabs)) => {
                    if let Some((all, visible)) = parts.get_mut(index) {
                        match scope {
                            TabScope::All => *all = tabs,
                            TabScope::Visible => *visible = tabs,
                        }
                    }
                }
                Err(err) => log_warn!("tab fetch task failed: {err}"),
            }
        }

        BrowserState::merge(parts)
    }

    async fn fetch_running_applications(&self) -> RunningApplicationCollection {
        let (apps, frontmost_name) = tokio::join!(
            self.scanner.scan(),
            frontmost_application_name(&self.runner)
        );
        let frontmost = frontmost_name.and_then(|name| {
            let found = apps.iter().find(|app| app.name == name).cloned();
            if found.is_none() {
                log::debug!("frontmost application {name} not found among running applications");
            }
            found
        });
        RunningApplicationCollection::new(apps, frontmost)
    }
}
