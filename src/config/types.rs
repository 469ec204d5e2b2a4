use std::collections::BTreeSet;
use std::time::Duration;

use serde::Deserialize;

use crate::color::Color;
use crate::filter::{Combinator, FilterInput};
use crate::types::TestType;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub runner: RunnerConfig,
    pub defaults: Defaults,
    pub theme: Theme,
    /// Optional path to a TOML file holding only `[theme.*]` tables.
    pub theme_file: Option<String>,
}

// ---------------------------------------------------------------------------
// Server
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Base URL of the test server API.
    pub url: String,
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:9090/testrunner".to_owned(),
            request_timeout_secs: 30,
        }
    }
}

impl ServerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

// ---------------------------------------------------------------------------
// Runner timings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    pub poll_interval_ms: u64,
    pub debounce_ms: u64,
    /// Rows per block in the exported HTML list.
    pub page_size: usize,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 3000,
            debounce_ms: 1500,
            page_size: 100,
        }
    }
}

impl RunnerConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

// ---------------------------------------------------------------------------
// Filter defaults
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Defaults {
    pub operator: Combinator,
    pub case_sensitive: bool,
    /// Category names enabled at start-up; unknown names are ignored.
    pub categories: Vec<String>,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            operator: Combinator::Or,
            case_sensitive: false,
            categories: TestType::CATEGORIES
                .iter()
                .map(|t| t.as_str().to_owned())
                .collect(),
        }
    }
}

impl Defaults {
    /// The filter controls a new dashboard starts with.
    pub fn filter_input(&self, query: Option<&str>) -> FilterInput {
        let enabled: BTreeSet<TestType> = self
            .categories
            .iter()
            .filter_map(|name| {
                let t = TestType::from_name(name);
                if t.is_none() {
                    tracing::warn!("config: ignoring unknown category {name:?}");
                }
                t
            })
            .collect();
        FilterInput {
            query: query.unwrap_or_default().to_owned(),
            combinator: self.operator,
            case_sensitive: self.case_sensitive,
            enabled,
        }
    }
}

// ---------------------------------------------------------------------------
// Theme
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Theme {
    pub colors: ColorsTheme,
}

impl Theme {
    /// Overlay `top` on `base`, slot by slot.
    pub fn merge(base: Self, top: Self) -> Self {
        let (b, t) = (base.colors, top.colors);
        Self {
            colors: ColorsTheme {
                text: TextColors {
                    primary: t.text.primary.or(b.text.primary),
                    secondary: t.text.secondary.or(b.text.secondary),
                    inverted: t.text.inverted.or(b.text.inverted),
                    faint: t.text.faint.or(b.text.faint),
                    warning: t.text.warning.or(b.text.warning),
                    success: t.text.success.or(b.text.success),
                    error: t.text.error.or(b.text.error),
                },
                background: BgColors {
                    selected: t.background.selected.or(b.background.selected),
                    checked: t.background.checked.or(b.background.checked),
                },
                border: BorderColors {
                    primary: t.border.primary.or(b.border.primary),
                    faint: t.border.faint.or(b.border.faint),
                },
                state: StateColors {
                    enqueued: t.state.enqueued.or(b.state.enqueued),
                    running: t.state.running.or(b.state.running),
                    passed: t.state.passed.or(b.state.passed),
                    failed: t.state.failed.or(b.state.failed),
                },
            },
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ColorsTheme {
    pub text: TextColors,
    pub background: BgColors,
    pub border: BorderColors,
    pub state: StateColors,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TextColors {
    pub primary: Option<Color>,
    pub secondary: Option<Color>,
    pub inverted: Option<Color>,
    pub faint: Option<Color>,
    pub warning: Option<Color>,
    pub success: Option<Color>,
    pub error: Option<Color>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BgColors {
    pub selected: Option<Color>,
    /// Highlight of checked rows.
    pub checked: Option<Color>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BorderColors {
    pub primary: Option<Color>,
    pub faint: Option<Color>,
}

/// Colors of the row status column.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StateColors {
    pub enqueued: Option<Color>,
    pub running: Option<Color>,
    pub passed: Option<Color>,
    pub failed: Option<Color>,
}
