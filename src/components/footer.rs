use iocraft::prelude::*;

use crate::color::{Color as AppColor, ColorDepth};
use crate::dashboard::Dashboard;
use crate::types::TestType;

// ---------------------------------------------------------------------------
// Footer component: filter controls, run status and totals
// ---------------------------------------------------------------------------

pub struct FooterChip {
    pub label: String,
    pub is_active: bool,
}

pub struct RenderedFooter {
    pub chips: Vec<FooterChip>,
    pub status_text: String,
    pub selected_text: String,
    pub stat_text: String,
    pub help_hint: String,
    pub active_fg: Color,
    pub active_bg: Color,
    pub inactive_fg: Color,
    pub text_fg: Color,
    pub border_fg: Color,
}

pub struct FooterColors {
    pub active: Option<AppColor>,
    pub inactive: Option<AppColor>,
    pub text: Option<AppColor>,
    pub border: Option<AppColor>,
    pub inverted: Option<AppColor>,
}

impl RenderedFooter {
    pub fn build(dashboard: &Dashboard, depth: ColorDepth, colors: &FooterColors) -> Self {
        let to_ct = |c: Option<AppColor>, fallback: Color| {
            c.map_or(fallback, |c| c.to_crossterm_color(depth))
        };

        Self {
            chips: filter_chips(dashboard),
            status_text: dashboard.status().to_owned(),
            selected_text: dashboard.selected_label(),
            stat_text: dashboard.stat_line(),
            help_hint: "? help".to_owned(),
            active_fg: to_ct(colors.inverted, Color::Black),
            active_bg: to_ct(colors.active, Color::Cyan),
            inactive_fg: to_ct(colors.inactive, Color::DarkGrey),
            text_fg: to_ct(colors.text, Color::Grey),
            border_fg: to_ct(colors.border, Color::DarkGrey),
        }
    }
}

/// One chip per category key (`1`..`4`) followed by the operator, case and
/// failed-only toggles.
pub fn filter_chips(dashboard: &Dashboard) -> Vec<FooterChip> {
    let filter = dashboard.filter();
    let mut chips: Vec<FooterChip> = TestType::CATEGORIES
        .iter()
        .enumerate()
        .map(|(i, t)| FooterChip {
            label: format!("{} {}", i + 1, t.as_str()),
            is_active: filter.is_enabled(*t),
        })
        .collect();
    chips.push(FooterChip {
        label: filter.combinator.label().to_owned(),
        is_active: true,
    });
    chips.push(FooterChip {
        label: "Aa".to_owned(),
        is_active: filter.case_sensitive,
    });
    chips.push(FooterChip {
        label: "failed".to_owned(),
        is_active: dashboard.failed_only(),
    });
    chips
}

#[derive(Default, Props)]
pub struct FooterProps {
    pub footer: Option<RenderedFooter>,
}

#[component]
pub fn Footer(props: &mut FooterProps) -> impl Into<AnyElement<'static>> {
    let Some(f) = props.footer.take() else {
        return element! { View }.into_any();
    };

    let mut context_contents = Vec::new();
    if !f.status_text.is_empty() {
        context_contents.push(MixedTextContent::new(&f.status_text).color(f.text_fg));
    }
    if !f.status_text.is_empty() && !f.selected_text.is_empty() {
        context_contents.push(MixedTextContent::new("  \u{2022}  ").color(f.inactive_fg));
    }
    if !f.selected_text.is_empty() {
        context_contents.push(
            MixedTextContent::new(&f.selected_text)
                .color(f.text_fg)
                .weight(Weight::Bold),
        );
    }

    element! {
        View(
            border_style: BorderStyle::Single,
            border_edges: Edges::Top,
            border_color: f.border_fg,
            padding_left: 1,
            padding_right: 1,
        ) {
            #(f.chips.iter().map(|chip| {
                let (fg, bg, weight) = if chip.is_active {
                    (f.active_fg, f.active_bg, Weight::Bold)
                } else {
                    (f.inactive_fg, Color::Reset, Weight::Normal)
                };
                element! {
                    View(background_color: bg, margin_right: 1) {
                        Text(content: format!(" {} ", chip.label), color: fg, weight, wrap: TextWrap::NoWrap)
                    }
                }
            }))
            Text(content: "\u{2502} ", color: f.inactive_fg, wrap: TextWrap::NoWrap)
            View(flex_grow: 1.0) {
                MixedText(contents: context_contents, wrap: TextWrap::NoWrap)
            }
            Text(content: f.stat_text.clone(), color: f.text_fg, wrap: TextWrap::NoWrap)
            Text(content: " \u{2502} ", color: f.inactive_fg, wrap: TextWrap::NoWrap)
            Text(content: f.help_hint.clone(), color: f.text_fg, wrap: TextWrap::NoWrap)
        }
    }
    .into_any()
}
