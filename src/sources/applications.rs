use std::collections::HashSet;
use std::future::Future;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use sysinfo::{ProcessRefreshKind, ProcessesToUpdate, System};
use tokio::time::Instant;

use crate::models::RunningApplication;

use super::script_runner::ScriptRunner;

const ENABLE_LOGS: bool = true;

use crate::log_warn;

// Shorter than the minimum poll interval, so only fetches within one cycle share a scan.
const SCAN_REUSE_WINDOW: Duration = Duration::from_millis(500);

const FRONTMOST_SCRIPT: &str =
    r#"tell application "System Events" to get name of first application process whose frontmost is true"#;

/// Most recent result of an expensive refresh. Callers arriving while a
/// refresh runs wait for it instead of starting another.
struct SharedScan<T> {
    latest: tokio::sync::Mutex<Option<(Instant, T)>>,
    window: Duration,
}

impl<T: Clone> SharedScan<T> {
    fn new(window: Duration) -> Self {
        Self {
            latest: tokio::sync::Mutex::new(None),
            window,
        }
    }

    async fn get_or_refresh<F, Fut>(&self, refresh: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let mut latest = self.latest.lock().await;
        if let Some((at, value)) = latest.as_ref() {
            if at.elapsed() < self.window {
                return value.clone();
            }
        }
        let value = refresh().await;
        *latest = Some((Instant::now(), value.clone()));
        value
    }
}

/// Lists running applications by scanning the process table.
#[derive(Clone)]
pub struct ApplicationScanner {
    system: Arc<Mutex<System>>,
    latest: Arc<SharedScan<Vec<RunningApplication>>>,
    own_pid: u32,
}

impl ApplicationScanner {
    pub fn new() -> Self {
        Self {
            system: Arc::new(Mutex::new(System::new())),
            latest: Arc::new(SharedScan::new(SCAN_REUSE_WINDOW)),
            own_pid: std::process::id(),
        }
    }

    /// Running applications, de-duplicated by identifier and sorted by name.
    /// Concurrent callers share one process table scan. A failed scan yields
    /// an empty list.
    pub async fn scan(&self) -> Vec<RunningApplication> {
        self.latest.get_or_refresh(|| self.scan_processes()).await
    }

    async fn scan_processes(&self) -> Vec<RunningApplication> {
        let system = Arc::clone(&self.system);
        let own_pid = self.own_pid;

        let scanned = tokio::task::spawn_blocking(move || {
            let mut system = match system.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            // everything() is needed for executable paths to be populated
            system.refresh_processes_specifics(ProcessesToUpdate::All, ProcessRefreshKind::everything());

            let mut seen = HashSet::new();
            let mut apps: Vec<RunningApplication> = system
                .processes()
                .iter()
                .filter(|(pid, _)| pid.as_u32() != own_pid)
                .filter_map(|(_, process)| {
                    application_from_process(&process.name().to_string_lossy(), process.exe())
                })
                .filter(|app| seen.insert(app.identifier.clone()))
                .collect();
            apps.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.identifier.cmp(&b.identifier)));
            apps
        })
        .await;

        match scanned {
            Ok(apps) => apps,
            Err(err) => {
                log_warn!("application scan worker failed: {err}");
                Vec::new()
            }
        }
    }

    pub async fn running_names(&self) -> HashSet<String> {
        self.scan().await.into_iter().map(|app| app.name).collect()
    }
}

impl Default for ApplicationScanner {
    fn default() -> Self {
        Self::new()
    }
}

/// Name of the frontmost application as reported by System Events. Only
/// available on macOS; elsewhere, or on failure, there is none.
pub async fn frontmost_application_name(runner: &ScriptRunner) -> Option<String> {
    if !cfg!(target_os = "macos") {
        return None;
    }
    match runner.run(FRONTMOST_SCRIPT).await {
        Ok(raw) => Some(raw.trim().to_string()).filter(|name| !name.is_empty()),
        Err(err) => {
            log_warn!("failed to read frontmost application: {err:#}");
            None
        }
    }
}

fn application_from_process(name: &str, exe: Option<&Path>) -> Option<RunningApplication> {
    let exe = exe?;
    if cfg!(target_os = "macos") {
        bundle_application(exe)
    } else {
        Some(RunningApplication::new(exe.to_string_lossy(), name))
    }
}

/// Maps an executable inside an `.app` bundle to the outermost bundle, so
/// helper processes nested in the same bundle count as one application.
fn bundle_application(exe: &Path) -> Option<RunningApplication> {
    let exe = exe.to_string_lossy();
    let end = exe.find(".app/")? + ".app".len();
    let bundle = exe.get(..end)?;
    let name = Path::new(bundle).file_stem()?.to_string_lossy().into_owned();
    Some(RunningApplication::new(bundle, name))
}
