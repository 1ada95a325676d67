use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunningApplication {
    /// Bundle identifier on macOS, executable path elsewhere.
    pub identifier: String,
    pub name: String,
}

impl RunningApplication {
    pub fn new(identifier: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunningApplicationCollection {
    apps: Vec<RunningApplication>,
    frontmost: Option<RunningApplication>,
}

impl RunningApplicationCollection {
    pub fn new(apps: Vec<RunningApplication>, frontmost: Option<RunningApplication>) -> Self {
        let mut seen = HashSet::new();
        let mut apps: Vec<RunningApplication> = apps
            .into_iter()
            .filter(|app| seen.insert(app.identifier.clone()))
            .collect();

        if let Some(front) = &frontmost {
            if !seen.contains(&front.identifier) {
                apps.push(front.clone());
            }
        }

        Self { apps, frontmost }
    }

    pub fn apps(&self) -> &[RunningApplication] {
        &self.apps
    }

    pub fn frontmost(&self) -> Option<&RunningApplication> {
        self.frontmost.as_ref()
    }

    pub fn len(&self) -> usize {
        self.apps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.apps.is_empty()
    }

    pub(crate) fn identifiers(&self) -> HashSet<&str> {
        self.apps.iter().map(|app| app.identifier.as_str()).collect()
    }
}
