use iocraft::prelude::*;

use crate::color::{Color as AppColor, ColorDepth};

// ---------------------------------------------------------------------------
// Pre-rendered keyword input
// ---------------------------------------------------------------------------

pub struct RenderedTextInput {
    pub prompt: String,
    pub text: String,
    pub hint: String,
    pub text_fg: Color,
    pub prompt_fg: Color,
    pub hint_fg: Color,
    pub border_fg: Color,
}

pub struct TextInputColors {
    pub text: Option<AppColor>,
    pub prompt: Option<AppColor>,
    pub hint: Option<AppColor>,
    pub border: Option<AppColor>,
}

impl RenderedTextInput {
    /// `focused` draws a block cursor after the text; `hint` is shown dimmed
    /// on the right (e.g. "Loading..." while a filter is pending).
    pub fn build(
        prompt: &str,
        text: &str,
        focused: bool,
        hint: &str,
        depth: ColorDepth,
        colors: &TextInputColors,
    ) -> Self {
        let text_fg = colors.text.map_or(Color::White, |c| c.to_crossterm_color(depth));
        let prompt_fg = colors.prompt.map_or(Color::Cyan, |c| c.to_crossterm_color(depth));
        let hint_fg = colors.hint.map_or(Color::DarkGrey, |c| c.to_crossterm_color(depth));
        let border_fg = colors.border.map_or(Color::DarkGrey, |c| c.to_crossterm_color(depth));

        Self {
            prompt: prompt.to_owned(),
            text: display_text(text, focused),
            hint: hint.to_owned(),
            text_fg,
            prompt_fg,
            hint_fg,
            border_fg,
        }
    }
}

fn display_text(text: &str, focused: bool) -> String {
    if focused {
        format!("{text}\u{2588}")
    } else {
        text.to_owned()
    }
}

// ---------------------------------------------------------------------------
// TextInput component
// ---------------------------------------------------------------------------

#[derive(Default, Props)]
pub struct TextInputProps {
    pub input: Option<RenderedTextInput>,
}

#[component]
pub fn TextInput(props: &mut TextInputProps) -> impl Into<AnyElement<'static>> {
    let Some(input) = props.input.take() else {
        return element! { View }.into_any();
    };

    element! {
        View(
            border_style: BorderStyle::Single,
            border_edges: Edges::Bottom,
            border_color: input.border_fg,
            padding_left: 1,
            padding_right: 1,
        ) {
            Text(content: input.prompt, color: input.prompt_fg, wrap: TextWrap::NoWrap)
            Text(content: " ", color: input.text_fg)
            View(flex_grow: 1.0) {
                Text(content: input.text, color: input.text_fg, wrap: TextWrap::NoWrap)
            }
            Text(content: input.hint, color: input.hint_fg, wrap: TextWrap::NoWrap)
        }
    }
    .into_any()
}
