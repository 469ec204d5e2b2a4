use iocraft::prelude::*;

use crate::color::ColorDepth;
use crate::config::types::AppConfig;
use crate::engine::EngineHandle;
use crate::filter::FilterInput;
use crate::theme::ResolvedTheme;
use crate::views::dashboard::DashboardView;

// ---------------------------------------------------------------------------
// Root App component
// ---------------------------------------------------------------------------

#[derive(Default, Props)]
pub struct AppProps<'a> {
    pub config: Option<&'a AppConfig>,
    pub engine: Option<&'a EngineHandle>,
    pub theme: Option<&'a ResolvedTheme>,
    pub color_depth: ColorDepth,
    /// Keyword given on the command line, pre-filled into the filter box.
    pub keyword: Option<&'a str>,
}

#[component]
pub fn App<'a>(props: &AppProps<'a>, mut hooks: Hooks) -> impl Into<AnyElement<'a>> {
    let (width, height) = hooks.use_terminal_size();
    let mut system = hooks.use_context_mut::<SystemContext>();
    let should_exit = hooks.use_state(|| false);

    let config = props.config;
    let filter: FilterInput = config.map_or_else(
        || FilterInput {
            query: props.keyword.unwrap_or_default().to_owned(),
            ..FilterInput::default()
        },
        |c| c.defaults.filter_input(props.keyword),
    );
    let debounce = config.map_or_else(
        || std::time::Duration::from_millis(1500),
        |c| c.runner.debounce(),
    );

    // Exit handling.
    if should_exit.get() {
        system.exit();
    }

    element! {
        View(width: u32::from(width), height: u32::from(height), flex_direction: FlexDirection::Column) {
            DashboardView(
                engine: props.engine,
                theme: props.theme,
                filter: Some(filter),
                debounce,
                color_depth: props.color_depth,
                width,
                height,
                should_exit,
            )
        }
    }
}
