use iocraft::prelude::*;

use crate::color::{Color as AppColor, ColorDepth};

// ---------------------------------------------------------------------------
// Key reference shown by `?`
// ---------------------------------------------------------------------------

pub const KEY_HELP: &[(&str, &[(&str, &str)])] = &[
    (
        "Filter",
        &[
            ("/", "Edit keywords (comma separated regexes)"),
            ("Enter / Esc", "Apply / cancel keyword edit"),
            ("o", "Toggle AND / OR"),
            ("c", "Toggle case sensitivity"),
            ("1-4", "Toggle unit / integration / jstest / webdriver"),
            ("f", "Show failed tests only"),
        ],
    ),
    (
        "Selection",
        &[
            ("Space", "Check / uncheck test"),
            ("a", "Check / uncheck all visible tests"),
            ("t", "Move checked tests to the top"),
        ],
    ),
    (
        "Run",
        &[
            ("r", "Run checked tests"),
            ("x", "Stop polling the current batch"),
        ],
    ),
    (
        "Navigation",
        &[
            ("j / \u{2193}", "Move down"),
            ("k / \u{2191}", "Move up"),
            ("g / G", "First / last test"),
            ("PgUp / PgDn", "Page up / down"),
            ("?", "Toggle this help"),
            ("q", "Quit"),
        ],
    ),
];

// ---------------------------------------------------------------------------
// Pre-rendered modal data
// ---------------------------------------------------------------------------

/// Kind of a modal line, mapped to a color at build time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Heading,
    Body,
    Hint,
}

pub struct RenderedOverlay {
    pub title: String,
    pub lines: Vec<(String, Color, Weight)>,
    pub border_fg: Color,
    pub bg: Color,
    /// Fraction of the screen width taken by the box, in percent.
    pub width_pct: u32,
}

pub struct OverlayColors {
    pub title: Option<AppColor>,
    pub body: Option<AppColor>,
    pub hint: Option<AppColor>,
    pub border: Option<AppColor>,
}

impl RenderedOverlay {
    pub fn build(
        title: &str,
        lines: Vec<(String, LineKind)>,
        width_pct: u32,
        depth: ColorDepth,
        colors: &OverlayColors,
    ) -> Self {
        let title_fg = colors.title.map_or(Color::White, |c| c.to_crossterm_color(depth));
        let body_fg = colors.body.map_or(Color::Grey, |c| c.to_crossterm_color(depth));
        let hint_fg = colors.hint.map_or(Color::Cyan, |c| c.to_crossterm_color(depth));
        let border_fg = colors.border.map_or(Color::DarkGrey, |c| c.to_crossterm_color(depth));

        let lines = lines
            .into_iter()
            .map(|(text, kind)| match kind {
                LineKind::Heading => (text, title_fg, Weight::Bold),
                LineKind::Body => (text, body_fg, Weight::Normal),
                LineKind::Hint => (text, hint_fg, Weight::Normal),
            })
            .collect();

        Self {
            title: title.to_owned(),
            lines,
            border_fg,
            bg: Color::Black,
            width_pct,
        }
    }

    /// The key reference.
    pub fn help(depth: ColorDepth, colors: &OverlayColors) -> Self {
        Self::build("Keybindings", help_lines(), 60, depth, colors)
    }

    /// A blocking message the user must dismiss.
    pub fn notice(message: &str, depth: ColorDepth, colors: &OverlayColors) -> Self {
        let lines = vec![
            (message.to_owned(), LineKind::Body),
            (String::new(), LineKind::Body),
            ("Press Enter to continue".to_owned(), LineKind::Hint),
        ];
        Self::build("Notice", lines, 50, depth, colors)
    }

    /// Yes/no question.
    pub fn confirm(question: &str, depth: ColorDepth, colors: &OverlayColors) -> Self {
        let lines = vec![
            (question.to_owned(), LineKind::Body),
            (String::new(), LineKind::Body),
            ("y: yes    n: no".to_owned(), LineKind::Hint),
        ];
        Self::build("Confirm", lines, 50, depth, colors)
    }
}

fn help_lines() -> Vec<(String, LineKind)> {
    let mut lines = Vec::new();
    for (section, keys) in KEY_HELP {
        lines.push(((*section).to_owned(), LineKind::Heading));
        for (key, desc) in *keys {
            lines.push((format!("  {key:>12}  {desc}"), LineKind::Body));
        }
        lines.push((String::new(), LineKind::Body));
    }
    lines.push(("Press ? to close".to_owned(), LineKind::Hint));
    lines
}

// ---------------------------------------------------------------------------
// Modal component
// ---------------------------------------------------------------------------

#[derive(Default, Props)]
pub struct ModalProps {
    pub overlay: Option<RenderedOverlay>,
    pub width: u16,
    pub height: u16,
}

#[component]
pub fn Modal(props: &mut ModalProps) -> impl Into<AnyElement<'static>> {
    let Some(overlay) = props.overlay.take() else {
        return element! { View }.into_any();
    };

    let width = u32::from(props.width);
    let height = u32::from(props.height);

    #[allow(clippy::cast_possible_truncation)]
    let content_height = overlay.lines.len() as u32 + 2;
    let overlay_width = (width * overlay.width_pct / 100)
        .max(40)
        .min(width.saturating_sub(4));
    let overlay_height = content_height.min(height.saturating_sub(2));
    let pad_left = width.saturating_sub(overlay_width) / 2;
    let pad_top = height.saturating_sub(overlay_height) / 2;

    let mut lines = overlay.lines;
    lines.truncate(overlay_height.saturating_sub(2) as usize);

    element! {
        View(
            width,
            height,
            position: Position::Absolute,
        ) {
            View(
                margin_left: pad_left,
                margin_top: pad_top,
                width: overlay_width,
                height: overlay_height,
                flex_direction: FlexDirection::Column,
                border_style: BorderStyle::Double,
                border_color: overlay.border_fg,
                background_color: overlay.bg,
                padding_left: 1,
                padding_right: 1,
                overflow: Overflow::Hidden,
            ) {
                Text(content: overlay.title, weight: Weight::Bold, wrap: TextWrap::NoWrap)
                #(lines.into_iter().map(|(text, color, weight)| {
                    element! {
                        Text(content: text, color, weight, wrap: TextWrap::Wrap)
                    }
                }))
            }
        }
    }
    .into_any()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn colors() -> OverlayColors {
        OverlayColors {
            title: None,
            body: None,
            hint: None,
            border: None,
        }
    }

    #[test]
    fn help_lists_every_key() {
        let overlay = RenderedOverlay::help(ColorDepth::TrueColor, &colors());
        let keys: usize = KEY_HELP.iter().map(|(_, keys)| keys.len()).sum();
        // heading + blank per section, plus the closing hint
        assert_eq!(overlay.lines.len(), keys + KEY_HELP.len() * 2 + 1);
        assert!(overlay.lines.iter().any(|(l, _, _)| l.contains("Run checked tests")));
    }

    #[test]
    fn notice_carries_message() {
        let overlay = RenderedOverlay::notice(
            "You must select at least one test",
            ColorDepth::TrueColor,
            &colors(),
        );
        assert_eq!(overlay.title, "Notice");
        assert_eq!(overlay.lines[0].0, "You must select at least one test");
    }
}
