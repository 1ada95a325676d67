use serde::{Deserialize, Serialize};

use crate::models::Tab;

use super::script_runner::ScriptRunner;

const ENABLE_LOGS: bool = true;

use crate::log_warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Browser {
    Safari,
    Chrome,
    Opera,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabScope {
    /// Every tab of every window.
    All,
    /// The front tab of each window.
    Visible,
}

impl Browser {
    pub const ALL: [Browser; 3] = [Browser::Safari, Browser::Chrome, Browser::Opera];

    /// Name of the running process, which is also its AppleScript application name.
    pub fn process_name(self) -> &'static str {
        match self {
            Browser::Safari => "Safari",
            Browser::Chrome => "Google Chrome",
            Browser::Opera => "Opera",
        }
    }

    fn title_property(self) -> &'static str {
        match self {
            Browser::Safari => "name",
            Browser::Chrome | Browser::Opera => "title",
        }
    }

    fn front_tab_property(self) -> &'static str {
        match self {
            Browser::Safari => "current tab",
            Browser::Chrome | Browser::Opera => "active tab",
        }
    }

    /// AppleScript printing one `url<TAB>title` line per tab. Windows without
    /// tabs (preferences, downloads) are skipped.
    pub fn script(self, scope: TabScope) -> String {
        let tabs = match scope {
            TabScope::All => "tabs of w".to_string(),
            TabScope::Visible => format!("{{{} of w}}", self.front_tab_property()),
        };
        format!(
            r#"set sep to ASCII character 9
set output to ""
tell application "{app}"
    repeat with w in windows
        try
            repeat with t in {tabs}
                set output to output & (URL of t) & sep & ({title} of t) & linefeed
            end repeat
        end try
    end repeat
end tell
return output"#,
            app = self.process_name(),
            tabs = tabs,
            title = self.title_property(),
        )
    }
}

/// Parses `url<TAB>title` lines. Blank lines and AppleScript's
/// `missing value` are ignored; a missing title becomes `None`.
pub fn parse_tabs(raw: &str) -> Vec<Tab> {
    raw.lines()
        .filter_map(|line| {
            let line = line.trim_end_matches('\r');
            let (url, title) = line.split_once('\t').unwrap_or((line, ""));
            let url = url.trim();
            if url.is_empty() || url == "missing value" {
                return None;
            }
            let title = title.trim();
            let title = (!title.is_empty() && title != "missing value").then(|| title.to_string());
            Some(Tab::new(url, title))
        })
        .collect()
}

/// Tabs reported by one browser. Any failure degrades to an empty list.
pub async fn fetch_tabs(runner: &ScriptRunner, browser: Browser, scope: TabScope) -> Vec<Tab> {
    match runner.run(&browser.script(scope)).await {
        Ok(raw) => parse_tabs(&raw),
        Err(err) => {
            log_warn!("failed to fetch {:?} tabs from {}: {err:#}", scope, browser.process_name());
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tab_separated_lines() {
        let raw = "https://a.test/\tA Title\r\n\nhttps://b.test/\t\nhttps://c.test/\tmissing value\n";
        let tabs = parse_tabs(raw);
        assert_eq!(
            tabs,
            vec![
                Tab::new("https://a.test/", Some("A Title".into())),
                Tab::new("https://b.test/", None),
                Tab::new("https://c.test/", None),
            ]
        );
    }

    #[test]
    fn skips_missing_urls() {
        assert!(parse_tabs("missing value\tSomething\n\t\n").is_empty());
    }

    #[test]
    fn keeps_tabs_inside_titles() {
        let tabs = parse_tabs("https://a.test/\tone\ttwo");
        assert_eq!(tabs[0].title.as_deref(), Some("one\ttwo"));
    }

    #[test]
    fn scripts_target_the_right_dialect() {
        let safari = Browser::Safari.script(TabScope::Visible);
        assert!(safari.contains(r#"tell application "Safari""#));
        assert!(safari.contains("{current tab of w}"));
        assert!(safari.contains("(name of t)"));

        let chrome = Browser::Chrome.script(TabScope::All);
        assert!(chrome.contains(r#"tell application "Google Chrome""#));
        assert!(chrome.contains("repeat with t in tabs of w"));
        assert!(chrome.contains("(title of t)"));

        assert!(Browser::Opera.script(TabScope::Visible).contains("{active tab of w}"));
    }

    #[tokio::test]
    async fn failing_script_degrades_to_no_tabs() {
        let runner = ScriptRunner::with_interpreter("/nonexistent/osascript");
        assert!(runner.run("return 1").await.is_err());

        for scope in [TabScope::All, TabScope::Visible] {
            assert_eq!(fetch_tabs(&runner, Browser::Chrome, scope).await, Vec::<Tab>::new());
        }
    }
}
