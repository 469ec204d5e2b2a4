use crate::color::Color;
use crate::config::types::Theme;
use crate::types::RowState;

/// Detected terminal background.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Background {
    Dark,
    Light,
}

impl Background {
    /// Detect whether the terminal has a dark or light background.
    ///
    /// Heuristic: check `COLORFGBG` (format "fg;bg"), fall back to dark.
    pub fn detect() -> Self {
        if let Ok(val) = std::env::var("COLORFGBG")
            && let Some(bg) = val.rsplit(';').next()
            && let Ok(n) = bg.parse::<u8>()
            && n > 6
            && n != 8
        {
            return Background::Light;
        }
        Background::Dark
    }
}

/// A fully resolved theme: every slot has a concrete `Color`, taken from the
/// user config or from the defaults for the detected background.
#[derive(Debug, Clone)]
pub struct ResolvedTheme {
    pub text_primary: Color,
    pub text_secondary: Color,
    pub text_inverted: Color,
    pub text_faint: Color,
    pub text_warning: Color,
    pub text_success: Color,
    pub text_error: Color,
    pub bg_selected: Color,
    pub bg_checked: Color,
    pub border_primary: Color,
    pub border_faint: Color,
    pub state_enqueued: Color,
    pub state_running: Color,
    pub state_passed: Color,
    pub state_failed: Color,
}

impl ResolvedTheme {
    pub fn resolve(theme: &Theme, bg: Background) -> Self {
        let d = Self::defaults(bg);
        let c = &theme.colors;
        Self {
            text_primary: c.text.primary.unwrap_or(d.text_primary),
            text_secondary: c.text.secondary.unwrap_or(d.text_secondary),
            text_inverted: c.text.inverted.unwrap_or(d.text_inverted),
            text_faint: c.text.faint.unwrap_or(d.text_faint),
            text_warning: c.text.warning.unwrap_or(d.text_warning),
            text_success: c.text.success.unwrap_or(d.text_success),
            text_error: c.text.error.unwrap_or(d.text_error),
            bg_selected: c.background.selected.unwrap_or(d.bg_selected),
            bg_checked: c.background.checked.unwrap_or(d.bg_checked),
            border_primary: c.border.primary.unwrap_or(d.border_primary),
            border_faint: c.border.faint.unwrap_or(d.border_faint),
            // State colors fall back to the matching text slot.
            state_enqueued: c.state.enqueued.or(c.text.faint).unwrap_or(d.state_enqueued),
            state_running: c.state.running.or(c.text.warning).unwrap_or(d.state_running),
            state_passed: c.state.passed.or(c.text.success).unwrap_or(d.state_passed),
            state_failed: c.state.failed.or(c.text.error).unwrap_or(d.state_failed),
        }
    }

    /// Color of the status column for a row in `state`.
    pub fn state_color(&self, state: &RowState) -> Color {
        match state {
            RowState::Idle | RowState::Other(_) => self.text_secondary,
            RowState::Enqueued => self.state_enqueued,
            RowState::Running => self.state_running,
            RowState::Passed => self.state_passed,
            RowState::Failed => self.state_failed,
        }
    }

    fn defaults(bg: Background) -> Self {
        match bg {
            Background::Dark => Self {
                text_primary: Color::Ansi256(7),
                text_secondary: Color::Ansi256(245),
                text_inverted: Color::Ansi256(0),
                text_faint: Color::Ansi256(243),
                text_warning: Color::Ansi256(11),
                text_success: Color::Ansi256(10),
                text_error: Color::Ansi256(9),
                bg_selected: Color::Ansi256(237),
                bg_checked: Color::Ansi256(24),
                border_primary: Color::Ansi256(244),
                border_faint: Color::Ansi256(241),
                state_enqueued: Color::Ansi256(243),
                state_running: Color::Ansi256(11),
                state_passed: Color::Ansi256(10),
                state_failed: Color::Ansi256(9),
            },
            Background::Light => Self {
                text_primary: Color::Ansi256(0),
                text_secondary: Color::Ansi256(240),
                text_inverted: Color::Ansi256(15),
                text_faint: Color::Ansi256(248),
                text_warning: Color::Ansi256(3),
                text_success: Color::Ansi256(2),
                text_error: Color::Ansi256(1),
                bg_selected: Color::Ansi256(254),
                bg_checked: Color::Ansi256(153),
                border_primary: Color::Ansi256(240),
                border_faint: Color::Ansi256(252),
                state_enqueued: Color::Ansi256(248),
                state_running: Color::Ansi256(3),
                state_passed: Color::Ansi256(2),
                state_failed: Color::Ansi256(1),
            },
        }
    }
}
