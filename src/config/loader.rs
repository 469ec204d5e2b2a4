use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::config::types::{AppConfig, Theme};

/// Wrapper used to parse a theme-only TOML file (contains only `[theme.*]`).
#[derive(Deserialize, Default)]
struct ThemeFile {
    #[serde(default)]
    theme: Theme,
}

/// Discover and load the app config.
///
/// Priority:
/// 1. `--config` flag (explicit path)
/// 2. `$TEST_BOARD_CONFIG` environment variable
/// 3. `$XDG_CONFIG_HOME/test-board/config.toml`
/// 4. `~/.config/test-board/config.toml`
///
/// Without any of these the built-in defaults are used.
pub fn load_config(explicit_path: Option<&Path>) -> Result<AppConfig> {
    let path = match explicit_path {
        Some(path) => Some(path.to_path_buf()),
        None => find_config(),
    };

    let mut config = match path {
        Some(path) => {
            tracing::info!("config: loading {}", path.display());
            parse_file(&path)?
        }
        None => {
            tracing::info!("config: no config file found, using defaults");
            AppConfig::default()
        }
    };

    apply_theme_file(&mut config)?;
    Ok(config)
}

fn parse_file(path: &Path) -> Result<AppConfig> {
    let contents =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    toml::from_str(&contents).with_context(|| format!("parsing TOML from {}", path.display()))
}

/// If `config.theme_file` is set, load it as the base theme.
///
/// Inline `[theme.*]` in the config always wins over the file theme.
fn apply_theme_file(config: &mut AppConfig) -> Result<()> {
    let Some(theme_file) = config.theme_file.as_deref() else {
        return Ok(());
    };
    let path = expand_tilde(theme_file);
    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("reading theme file {}", path.display()))?;
    let file_theme: ThemeFile = toml::from_str(&contents)
        .with_context(|| format!("parsing theme file {}", path.display()))?;

    let inline = std::mem::take(&mut config.theme);
    config.theme = Theme::merge(file_theme.theme, inline);
    Ok(())
}

fn find_config() -> Option<PathBuf> {
    // $TEST_BOARD_CONFIG
    if let Ok(path) = std::env::var("TEST_BOARD_CONFIG") {
        let p = PathBuf::from(&path);
        if p.is_file() {
            return Some(p);
        }
    }

    // $XDG_CONFIG_HOME/test-board/config.toml
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        let p = PathBuf::from(xdg).join("test-board/config.toml");
        if p.is_file() {
            return Some(p);
        }
    }

    // ~/.config/test-board/config.toml
    if let Some(home) = home_dir() {
        let p = home.join(".config/test-board/config.toml");
        if p.is_file() {
            return Some(p);
        }
    }

    None
}

fn home_dir() -> Option<PathBuf> {
    std::env::var("HOME").ok().map(PathBuf::from)
}

fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/")
        && let Some(home) = home_dir()
    {
        return home.join(rest);
    }
    PathBuf::from(path)
}
