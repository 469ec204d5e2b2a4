use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use iocraft::prelude::*;

use crate::color::ColorDepth;
use crate::components::footer::{Footer, FooterColors, RenderedFooter};
use crate::components::overlay::{Modal, OverlayColors, RenderedOverlay};
use crate::components::table::{
    Cell, Column, RenderedTable, Row, ScrollableTable, TableBuildConfig,
};
use crate::components::text_input::{RenderedTextInput, TextInput, TextInputColors};
use crate::dashboard::{Dashboard, RunDecision};
use crate::engine::{EngineHandle, Event, Request};
use crate::filter::{Debouncer, FilterInput};
use crate::theme::ResolvedTheme;
use crate::types::{RowState, TestType};
use crate::views::default_theme;

// ---------------------------------------------------------------------------
// Table layout
// ---------------------------------------------------------------------------

const DETAIL_MAX_LINES: usize = 8;
const CONFIRM_QUESTION: &str =
    "A batch is still running. Do you really want to submit a new request?";

fn test_columns() -> Vec<Column> {
    vec![
        Column::fixed("", 4),
        Column::fixed("Type", 13),
        Column::flex("Test", 0.35),
        Column::flex("Namespace", 0.65),
        Column::fixed("Status", 11),
        Column::fixed("JS", 3),
    ]
}

fn test_rows(dashboard: &Dashboard, order: &[usize], theme: &ResolvedTheme) -> Vec<Row> {
    order
        .iter()
        .filter_map(|&i| dashboard.row(i))
        .map(|row| {
            let checkbox = if row.checked { "[x]" } else { "[ ]" };
            let mut name = Cell::colored(row.descriptor.short_name(), theme.text_primary);
            if row.pinned {
                name = name.bold();
            }
            // Idle rows show what the catalogue reported, dimmed.
            let status = match row.state {
                RowState::Idle => Cell::colored(
                    row.descriptor.status.to_lowercase(),
                    theme.text_faint,
                ),
                ref state => Cell::colored(state.as_str(), theme.state_color(state)).bold(),
            };
            Row {
                cells: vec![
                    Cell::colored(checkbox, theme.text_secondary),
                    Cell::colored(row.descriptor.test_type.as_str(), theme.text_secondary),
                    name,
                    Cell::colored(&row.descriptor.name, theme.text_faint),
                    status,
                    Cell::colored(
                        if row.descriptor.js_console.is_some() { "\u{2197}" } else { "" },
                        theme.text_secondary,
                    ),
                ],
                highlighted: row.checked,
            }
        })
        .collect()
}

/// Exception text as terminal lines: tabs become four spaces.
fn exception_lines(text: &str, max: usize) -> Vec<String> {
    let mut lines: Vec<String> = text.lines().map(|l| l.replace('\t', "    ")).collect();
    if lines.len() > max {
        lines.truncate(max.saturating_sub(1));
        lines.push("\u{2026}".to_owned());
    }
    lines
}

/// Keep `cursor` inside a window of `page` rows starting at `offset`.
fn scroll_for(cursor: usize, offset: usize, page: usize) -> usize {
    if page == 0 || cursor < offset {
        cursor
    } else if cursor >= offset + page {
        cursor + 1 - page
    } else {
        offset
    }
}

/// Apply a batch event to the view-model. Returns `true` if it changed.
pub(crate) fn apply_batch_event(dashboard: &mut Dashboard, event: &Event) -> bool {
    match event {
        Event::BatchAccepted { batch } => {
            tracing::debug!("view: batch {batch} accepted");
            false
        }
        Event::BatchRejected {
            batch,
            state,
            message,
        } => {
            tracing::warn!("view: batch {batch} rejected ({state}): {message}");
            dashboard.batch_rejected(*batch, *state)
        }
        Event::StatusUpdated { batch, status } => dashboard.apply_status(*batch, status),
        Event::BatchFinished { batch, status } => dashboard.finish_batch(*batch, status),
        Event::PollFailed {
            batch,
            state,
            message,
        } => {
            tracing::warn!("view: polling batch {batch} failed ({state}): {message}");
            dashboard.poll_failed(*batch, *state)
        }
        Event::PollCancelled { batch } => {
            tracing::debug!("view: polling batch {batch} cancelled");
            false
        }
        Event::TestsFetched { .. } | Event::FetchError { .. } => false,
    }
}

/// Run the selection, submitting through `engine` when a batch was created.
///
/// Returns `true` when the user must confirm first.
fn start_run(
    dashboard: &mut Dashboard,
    confirmed: bool,
    engine: Option<&EngineHandle>,
    reply_tx: &std::sync::mpsc::Sender<Event>,
) -> bool {
    match dashboard.run(confirmed) {
        Ok(RunDecision::NeedsConfirmation) => true,
        Ok(RunDecision::Submit { batch, tests }) => {
            if let Some(eng) = engine {
                eng.send(Request::SubmitBatch {
                    batch,
                    tests,
                    reply_tx: reply_tx.clone(),
                });
            }
            false
        }
        Err(e) => {
            tracing::debug!("view: run refused: {e}");
            false
        }
    }
}

// ---------------------------------------------------------------------------
// Input mode
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
enum InputMode {
    Normal,
    /// Editing the keyword box; holds the query to restore on Esc.
    Search(String),
    /// Waiting for y/n before submitting over a running batch.
    Confirm,
}

// ---------------------------------------------------------------------------
// DashboardView component
// ---------------------------------------------------------------------------

#[derive(Default, Props)]
pub struct DashboardViewProps<'a> {
    /// Handle to the backend engine.
    pub engine: Option<&'a EngineHandle>,
    /// Resolved theme.
    pub theme: Option<&'a ResolvedTheme>,
    /// Filter controls the dashboard starts with.
    pub filter: Option<FilterInput>,
    /// Quiet time before a filter edit is applied.
    pub debounce: Duration,
    /// Color depth.
    pub color_depth: ColorDepth,
    /// Available width.
    pub width: u16,
    /// Available height.
    pub height: u16,
    /// Signal to exit the app.
    pub should_exit: Option<State<bool>>,
}

#[component]
#[allow(clippy::too_many_lines)]
pub fn DashboardView<'a>(
    props: &DashboardViewProps<'a>,
    mut hooks: Hooks,
) -> impl Into<AnyElement<'a>> {
    let theme = props.theme.cloned().unwrap_or_else(default_theme);
    let depth = props.color_depth;
    let should_exit = props.should_exit;
    let initial_filter = props.filter.clone().unwrap_or_default();
    let debounce = props.debounce;

    let mut dashboard = hooks.use_state(Dashboard::default);
    let mut loaded = hooks.use_state(|| false);
    let mut load_error = hooks.use_state(|| Option::<String>::None);
    let mut fetch_requested = hooks.use_state(|| false);
    let mut debouncer = hooks.use_state(move || Debouncer::new(debounce));

    let mut cursor = hooks.use_state(|| 0usize);
    let mut scroll_offset = hooks.use_state(|| 0usize);
    let mut input_mode = hooks.use_state(|| InputMode::Normal);
    let mut help_visible = hooks.use_state(|| false);

    // Event channel: engine pushes events back to UI.
    let event_channel = hooks.use_state(|| {
        let (tx, rx) = std::sync::mpsc::channel::<Event>();
        (tx, Arc::new(Mutex::new(rx)))
    });
    let (event_tx, event_rx_arc) = event_channel.read().clone();
    let engine: Option<EngineHandle> = props.engine.cloned();

    // Load the test list once at mount.
    if !fetch_requested.get()
        && let Some(ref eng) = engine
    {
        eng.send(Request::FetchTests {
            reply_tx: event_tx.clone(),
        });
        fetch_requested.set(true);
    }

    // Event polling: drain engine events and fire the filter debounce.
    {
        let rx_for_poll = event_rx_arc.clone();
        let filter_for_load = initial_filter.clone();
        hooks.use_future(async move {
            loop {
                smol::Timer::after(Duration::from_millis(100)).await;
                let events: Vec<Event> = {
                    let Ok(rx) = rx_for_poll.lock() else {
                        continue;
                    };
                    let mut evts = Vec::new();
                    while let Ok(evt) = rx.try_recv() {
                        evts.push(evt);
                    }
                    evts
                };
                let mut d = debouncer.get();
                let fired = d.fire(Instant::now());
                if fired {
                    debouncer.set(d);
                }
                if events.is_empty() && !fired {
                    continue;
                }

                let mut dash = dashboard.read().clone();
                let mut changed = false;
                for evt in events {
                    match evt {
                        Event::TestsFetched { tests } => {
                            tracing::info!("view: loaded {} tests", tests.len());
                            dash = Dashboard::new(tests).with_filter(filter_for_load.clone());
                            if dash.filter().query.is_empty() {
                                let _ = dash.apply_filter();
                            } else {
                                let mut d = debouncer.get();
                                d.trigger(Instant::now());
                                debouncer.set(d);
                            }
                            loaded.set(true);
                            cursor.set(0);
                            scroll_offset.set(0);
                            changed = true;
                        }
                        Event::FetchError { context, message } => {
                            tracing::error!("view: {context}: {message}");
                            load_error.set(Some(format!("{context}: {message}")));
                            loaded.set(true);
                        }
                        evt => changed |= apply_batch_event(&mut dash, &evt),
                    }
                }

                if fired {
                    let _ = dash.apply_filter();
                    cursor.set(0);
                    scroll_offset.set(0);
                    changed = true;
                }

                if changed {
                    dashboard.set(dash);
                }
            }
        });
    }

    let width = props.width;
    let height = props.height;

    // Layout: keyword box (2) + table header (2) + footer (2) + detail pane.
    let visible = dashboard.read().visible_rows();
    let cursor_idx = cursor.get().min(visible.len().saturating_sub(1));
    let failed_detail = visible
        .get(cursor_idx)
        .and_then(|&i| dashboard.read().row(i).cloned())
        .filter(|row| row.state == RowState::Failed)
        .and_then(|row| row.exception);
    let detail_lines = failed_detail
        .as_deref()
        .map(|text| exception_lines(text, DETAIL_MAX_LINES))
        .unwrap_or_default();
    let detail_height = if detail_lines.is_empty() {
        0
    } else {
        detail_lines.len() + 2
    };
    let page_rows = usize::from(height).saturating_sub(6 + detail_height).max(1);

    let offset = scroll_for(cursor_idx, scroll_offset.get(), page_rows);
    if offset != scroll_offset.get() {
        scroll_offset.set(offset);
    }

    // Keyboard handling.
    let visible_count = visible.len();
    let visible_for_keys = visible.clone();
    let engine_for_keys = engine.clone();
    let tx_for_keys = event_tx.clone();
    hooks.use_terminal_events({
        move |event| match event {
            TerminalEvent::Key(KeyEvent {
                code,
                kind,
                modifiers,
                ..
            }) if kind != KeyEventKind::Release => {
                // Ctrl+C always quits.
                if code == KeyCode::Char('c') && modifiers.contains(KeyModifiers::CONTROL) {
                    if let Some(mut exit) = should_exit {
                        exit.set(true);
                    }
                    return;
                }

                // Blocking notice: intercept all keys until dismissed.
                if dashboard.read().notice().is_some() {
                    if matches!(code, KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ')) {
                        let mut d = dashboard.read().clone();
                        d.dismiss_notice();
                        dashboard.set(d);
                    }
                    return;
                }

                // Help overlay: intercept all keys when visible.
                if help_visible.get() {
                    if matches!(code, KeyCode::Char('?') | KeyCode::Esc) {
                        help_visible.set(false);
                    }
                    return;
                }

                let rearm = |mut debouncer: State<Debouncer>| {
                    let mut d = debouncer.get();
                    d.trigger(Instant::now());
                    debouncer.set(d);
                };

                let current_mode = input_mode.read().clone();
                match current_mode {
                    InputMode::Confirm => match code {
                        KeyCode::Char('y' | 'Y') => {
                            input_mode.set(InputMode::Normal);
                            let mut d = dashboard.read().clone();
                            start_run(&mut d, true, engine_for_keys.as_ref(), &tx_for_keys);
                            dashboard.set(d);
                        }
                        KeyCode::Char('n' | 'N') | KeyCode::Esc => {
                            input_mode.set(InputMode::Normal);
                            let mut d = dashboard.read().clone();
                            d.decline_run();
                            dashboard.set(d);
                        }
                        _ => {}
                    },
                    InputMode::Search(origin) => match code {
                        KeyCode::Esc => {
                            input_mode.set(InputMode::Normal);
                            let mut d = dashboard.read().clone();
                            d.set_query(origin);
                            dashboard.set(d);
                            rearm(debouncer);
                        }
                        KeyCode::Enter => {
                            input_mode.set(InputMode::Normal);
                        }
                        KeyCode::Backspace => {
                            let mut d = dashboard.read().clone();
                            let mut q = d.filter().query.clone();
                            q.pop();
                            d.set_query(q);
                            dashboard.set(d);
                            rearm(debouncer);
                        }
                        KeyCode::Char(ch) if !modifiers.contains(KeyModifiers::CONTROL) => {
                            let mut d = dashboard.read().clone();
                            let mut q = d.filter().query.clone();
                            q.push(ch);
                            d.set_query(q);
                            dashboard.set(d);
                            rearm(debouncer);
                        }
                        _ => {}
                    },
                    InputMode::Normal => match code {
                        KeyCode::Char('q') => {
                            if let Some(mut exit) = should_exit {
                                exit.set(true);
                            }
                        }
                        KeyCode::Char('?') => help_visible.set(true),

                        // Navigation
                        KeyCode::Char('j') | KeyCode::Down => {
                            if visible_count > 0 {
                                cursor.set((cursor_idx + 1).min(visible_count - 1));
                            }
                        }
                        KeyCode::Char('k') | KeyCode::Up => {
                            cursor.set(cursor_idx.saturating_sub(1));
                        }
                        KeyCode::PageDown => {
                            if visible_count > 0 {
                                cursor.set((cursor_idx + page_rows).min(visible_count - 1));
                            }
                        }
                        KeyCode::PageUp => {
                            cursor.set(cursor_idx.saturating_sub(page_rows));
                        }
                        KeyCode::Char('g') | KeyCode::Home => {
                            cursor.set(0);
                            scroll_offset.set(0);
                        }
                        KeyCode::Char('G') | KeyCode::End => {
                            cursor.set(visible_count.saturating_sub(1));
                        }

                        // Filter controls
                        KeyCode::Char('/') => {
                            let origin = dashboard.read().filter().query.clone();
                            input_mode.set(InputMode::Search(origin));
                        }
                        KeyCode::Char('o') => {
                            let mut d = dashboard.read().clone();
                            d.toggle_combinator();
                            dashboard.set(d);
                            rearm(debouncer);
                        }
                        KeyCode::Char('c') => {
                            let mut d = dashboard.read().clone();
                            d.toggle_case_sensitive();
                            dashboard.set(d);
                            rearm(debouncer);
                        }
                        KeyCode::Char(ch @ '1'..='4') => {
                            let idx = usize::from(ch as u8 - b'1');
                            let mut d = dashboard.read().clone();
                            d.toggle_category(TestType::CATEGORIES[idx]);
                            dashboard.set(d);
                            rearm(debouncer);
                        }
                        KeyCode::Char('f') => {
                            let mut d = dashboard.read().clone();
                            let _ = d.toggle_failed_only();
                            dashboard.set(d);
                            cursor.set(0);
                            scroll_offset.set(0);
                        }

                        // Selection
                        KeyCode::Char(' ') => {
                            if let Some(&row_idx) = visible_for_keys.get(cursor_idx) {
                                let mut d = dashboard.read().clone();
                                d.toggle_checked(row_idx);
                                dashboard.set(d);
                            }
                        }
                        KeyCode::Char('a') => {
                            let mut d = dashboard.read().clone();
                            let all_checked = !visible_for_keys.is_empty()
                                && visible_for_keys
                                    .iter()
                                    .all(|&i| d.row(i).is_some_and(|r| r.checked));
                            d.select_all_visible(!all_checked);
                            dashboard.set(d);
                        }
                        KeyCode::Char('t') => {
                            let mut d = dashboard.read().clone();
                            d.move_selected_to_top();
                            dashboard.set(d);
                            cursor.set(0);
                            scroll_offset.set(0);
                        }

                        // Run
                        KeyCode::Char('r') => {
                            let mut d = dashboard.read().clone();
                            if start_run(&mut d, false, engine_for_keys.as_ref(), &tx_for_keys) {
                                input_mode.set(InputMode::Confirm);
                            }
                            dashboard.set(d);
                        }
                        KeyCode::Char('x') => {
                            let mut d = dashboard.read().clone();
                            if let Some(batch) = d.cancel_batch()
                                && let Some(ref eng) = engine_for_keys
                            {
                                eng.send(Request::CancelBatch { batch });
                            }
                            dashboard.set(d);
                        }
                        _ => {}
                    },
                }
            }
            _ => {}
        }
    });

    // --- Build rendered components ---

    let dash = dashboard.read();
    let columns = test_columns();
    let rows = test_rows(&dash, &visible, &theme);
    let empty_message = match (loaded.get(), load_error.read().as_deref()) {
        (false, _) => "Loading tests...".to_owned(),
        (true, Some(err)) => format!("Failed to load tests: {err}"),
        (true, None) if dash.is_empty() => "The server reported no tests".to_owned(),
        (true, None) => "No test matches the filter".to_owned(),
    };
    let rendered_table = RenderedTable::build(&TableBuildConfig {
        columns: &columns,
        rows: &rows,
        cursor: cursor_idx,
        scroll_offset: offset,
        visible_rows: page_rows,
        total_width: width,
        depth,
        selected_bg: Some(theme.bg_selected),
        highlight_bg: Some(theme.bg_checked),
        header_color: Some(theme.text_primary),
        border_color: Some(theme.border_faint),
        empty_message: Some(&empty_message),
    });

    let mode = input_mode.read().clone();
    let page_state = if !loaded.get() || debouncer.get().is_pending() {
        "Loading...".to_owned()
    } else {
        format!("{}/{}", visible.len(), dash.len())
    };
    let rendered_input = RenderedTextInput::build(
        "Filter:",
        &dash.filter().query,
        matches!(mode, InputMode::Search(_)),
        &page_state,
        depth,
        &TextInputColors {
            text: Some(theme.text_primary),
            prompt: Some(theme.text_secondary),
            hint: Some(theme.text_faint),
            border: Some(theme.border_faint),
        },
    );

    let rendered_footer = RenderedFooter::build(
        &dash,
        depth,
        &FooterColors {
            active: Some(theme.border_primary),
            inactive: Some(theme.text_faint),
            text: Some(theme.text_primary),
            border: Some(theme.border_faint),
            inverted: Some(theme.text_inverted),
        },
    );

    let overlay_colors = OverlayColors {
        title: Some(theme.text_primary),
        body: Some(theme.text_secondary),
        hint: Some(theme.text_warning),
        border: Some(theme.border_primary),
    };
    let overlay = if let Some(message) = dash.notice() {
        Some(RenderedOverlay::notice(message, depth, &overlay_colors))
    } else if mode == InputMode::Confirm {
        Some(RenderedOverlay::confirm(CONFIRM_QUESTION, depth, &overlay_colors))
    } else if help_visible.get() {
        Some(RenderedOverlay::help(depth, &overlay_colors))
    } else {
        None
    };

    let detail_fg = theme.text_error.to_crossterm_color(depth);
    let detail_border = theme.state_failed.to_crossterm_color(depth);

    element! {
        View(flex_direction: FlexDirection::Column, width: u32::from(width), height: u32::from(height)) {
            TextInput(input: rendered_input)
            View(flex_grow: 1.0, flex_direction: FlexDirection::Column, overflow: Overflow::Hidden) {
                ScrollableTable(table: rendered_table)
            }
            #((!detail_lines.is_empty()).then(|| element! {
                View(
                    flex_direction: FlexDirection::Column,
                    border_style: BorderStyle::Round,
                    border_color: detail_border,
                    padding_left: 1,
                    padding_right: 1,
                ) {
                    #(detail_lines.into_iter().enumerate().map(|(i, line)| element! {
                        Text(key: i, content: line, color: detail_fg, wrap: TextWrap::NoWrap)
                    }))
                }
            }))
            Footer(footer: rendered_footer)
            Modal(overlay, width, height)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::types::{ActionState, BatchId, PollStatus, TestDescriptor, TestStatusUpdate};

    fn dashboard() -> Dashboard {
        Dashboard::new(vec![
            TestDescriptor::new("js://ui.button.testClick()", TestType::JsTest),
            TestDescriptor::new("java://org.app$testLogin()", TestType::Unit),
        ])
    }

    #[test]
    fn scroll_follows_cursor() {
        assert_eq!(scroll_for(0, 0, 10), 0);
        assert_eq!(scroll_for(12, 0, 10), 3);
        assert_eq!(scroll_for(2, 5, 10), 2);
        assert_eq!(scroll_for(7, 5, 10), 5);
    }

    #[test]
    fn exception_lines_expand_tabs_and_cap() {
        let lines = exception_lines("boom\n\tat a\n\tat b", 10);
        assert_eq!(lines, vec!["boom", "    at a", "    at b"]);

        let long = (0..20).map(|i| i.to_string()).collect::<Vec<_>>().join("\n");
        let lines = exception_lines(&long, 5);
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[4], "\u{2026}");
    }

    #[test]
    fn rows_show_checkbox_and_state() {
        let mut dash = dashboard();
        dash.toggle_checked(1);
        let theme = default_theme();
        let rows = test_rows(&dash, &dash.visible_rows(), &theme);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].cells[0].text, "[ ]");
        assert_eq!(rows[1].cells[0].text, "[x]");
        assert!(rows[1].highlighted);
        assert_eq!(rows[1].cells[2].text, "testLogin");
    }

    #[test]
    fn submit_error_event_resets_run() {
        let mut dash = dashboard();
        dash.toggle_checked(0);
        let (tx, _rx) = std::sync::mpsc::channel();
        assert!(!start_run(&mut dash, false, None, &tx));
        let batch = dash.active_batch().unwrap();

        let changed = apply_batch_event(
            &mut dash,
            &Event::BatchRejected {
                batch,
                state: ActionState::Error,
                message: "ERROR".to_owned(),
            },
        );
        assert!(changed);
        assert!(!dash.is_running());
        assert!(dash.notice().unwrap().contains("return state = ERROR"));
    }

    #[test]
    fn stale_batch_events_are_ignored() {
        let mut dash = dashboard();
        let mut map = HashMap::new();
        map.insert(
            "js://ui.button.testClick()".to_owned(),
            TestStatusUpdate::new("passed"),
        );
        let status = PollStatus {
            tests_with_props_map: map,
            tests_running: false,
        };
        let changed = apply_batch_event(
            &mut dash,
            &Event::BatchFinished {
                batch: BatchId(42),
                status,
            },
        );
        assert!(!changed);
        assert_eq!(dash.rows()[0].state, RowState::Idle);
    }

    #[test]
    fn running_batch_needs_confirmation() {
        let mut dash = dashboard();
        dash.toggle_checked(0);
        let (tx, _rx) = std::sync::mpsc::channel();
        assert!(!start_run(&mut dash, false, None, &tx));
        assert!(start_run(&mut dash, false, None, &tx));
    }
}
