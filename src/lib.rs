pub mod models;
pub mod monitor;
pub mod settings;
pub mod sources;
mod utils;

#[cfg(test)]
mod test_utils;

use anyhow::{anyhow, Context, Result};
use chrono::Local;
use std::{env, path::PathBuf, sync::Arc, time::Duration};
use tokio_util::sync::CancellationToken;

use models::RecordedEvent;
use monitor::{RecordedEventObserver, UpdateScheduler};
use settings::SettingsStore;
use sources::{DesktopProvider, SnapshotProvider};

const ENABLE_LOGS: bool = true;

pub const FILTER_ENV: &str = "SURVEY_FILTER";

const SETTINGS_RELOAD_SECS: u64 = 30;

/// Writes every delivered event matching `filter` to the log.
pub struct LogObserver {
    filter: String,
}

impl LogObserver {
    pub fn new(filter: impl Into<String>) -> Self {
        Self {
            filter: filter.into(),
        }
    }
}

impl RecordedEventObserver for LogObserver {
    fn received_events(&self, events: &[RecordedEvent]) -> Result<()> {
        for event in events.iter().filter(|event| event.matches(&self.filter)) {
            let at = event.timestamp().with_timezone(&Local).format("%H:%M:%S");
            match event.subtitle() {
                Some(subtitle) => log::info!("[{at}] {} ({subtitle})", event.title()),
                None => log::info!("[{at}] {}", event.title()),
            }
        }
        Ok(())
    }
}

fn settings_path() -> Result<PathBuf> {
    directories::ProjectDirs::from("", "", "Survey")
        .map(|dirs| dirs.config_dir().join("settings.json"))
        .ok_or_else(|| anyhow!("could not determine a configuration directory"))
}

/// Picks up edits to the settings file and re-arms the scheduler when the
/// poll interval changed.
async fn watch_settings<P: SnapshotProvider>(
    store: Arc<SettingsStore>,
    scheduler: UpdateScheduler<P>,
    cancel_token: CancellationToken,
) {
    let mut ticker = tokio::time::interval(Duration::from_secs(SETTINGS_RELOAD_SECS));
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if !store.path().exists() {
                    continue;
                }
                match store.reload() {
                    Ok(true) => {
                        let interval = store.poll_interval();
                        if interval != scheduler.interval() {
                            if let Err(err) = scheduler.set_interval(interval) {
                                log_error!("failed to apply poll interval: {err:#}");
                            }
                        }
                    }
                    Ok(false) => {}
                    Err(err) => log_error!("failed to reload settings: {err:#}"),
                }
            }
            _ = cancel_token.cancelled() => break,
        }
    }
}

/// Runs the monitor until Ctrl-C.
pub async fn run() -> Result<()> {
    // Reads RUST_LOG, defaulting to info
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log_info!("Survey starting up...");

    let store = Arc::new(SettingsStore::new(settings_path()?)?);
    let settings = store.settings().with_env_overrides();
    log_info!(
        "polling every {}s, browsers: {:?} (settings: {})",
        settings.poll_interval().as_secs(),
        settings.browsers,
        store.path().display()
    );

    let provider = DesktopProvider::new(settings.browsers.clone());
    let scheduler = UpdateScheduler::new(provider, settings.poll_interval())?;
    let observer = Arc::new(LogObserver::new(env::var(FILTER_ENV).unwrap_or_default()));
    scheduler.setup(&observer).await?;

    let cancel_token = CancellationToken::new();
    let watcher = tokio::spawn(watch_settings(
        Arc::clone(&store),
        scheduler.clone(),
        cancel_token.clone(),
    ));

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl-C")?;

    cancel_token.cancel();
    watcher.await.context("settings watcher failed to join")?;
    scheduler.stop().await?;

    let history = scheduler.history().await;
    log_info!("recorded {} events this session", history.len());
    Ok(())
}
