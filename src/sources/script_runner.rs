use anyhow::{anyhow, bail, Context, Result};
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::process::Command;
use tokio::sync::OnceCell;

const DEFAULT_OSASCRIPT_PATH: &str = "/usr/bin/osascript";

/// Runs AppleScript through `osascript`. Cheap to clone; the interpreter path
/// is looked up once and shared.
#[derive(Clone, Default)]
pub struct ScriptRunner {
    osascript: Arc<OnceCell<PathBuf>>,
}

impl ScriptRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses `path` as the interpreter instead of looking up `osascript`.
    pub fn with_interpreter(path: impl Into<PathBuf>) -> Self {
        Self {
            osascript: Arc::new(OnceCell::new_with(Some(path.into()))),
        }
    }

    pub async fn osascript_path(&self) -> Result<PathBuf> {
        self.osascript
            .get_or_try_init(|| async { locate_osascript() })
            .await
            .cloned()
    }

    pub async fn run(&self, script: &str) -> Result<String> {
        let path = self.osascript_path().await?;
        let output = Command::new(&path)
            .arg("-e")
            .arg(script)
            .output()
            .await
            .with_context(|| format!("failed to launch {}", path.display()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("osascript exited with {}: {}", output.status, stderr.trim());
        }

        String::from_utf8(output.stdout).context("script output is not valid UTF-8")
    }
}

fn locate_osascript() -> Result<PathBuf> {
    let default = Path::new(DEFAULT_OSASCRIPT_PATH);
    if default.is_file() {
        return Ok(default.to_path_buf());
    }

    env::var_os("PATH")
        .and_then(|paths| {
            env::split_paths(&paths)
                .map(|dir| dir.join("osascript"))
                .find(|candidate| candidate.is_file())
        })
        .ok_or_else(|| anyhow!("osascript not found on PATH"))
}
