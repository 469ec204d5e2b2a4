//! HTML rendering of the dashboard, used by `test-board export`.

use maud::{DOCTYPE, Markup, PreEscaped, html};

use crate::dashboard::{Dashboard, TestRow};
use crate::types::RowState;

/// Rows per block in the exported list.
pub const DEFAULT_PAGE_SIZE: usize = 100;

const PAGE_STYLE: &str = "\
body{font-family:sans-serif;font-size:13px}\
ul{list-style:none;padding:0;margin:0}\
.list-test-item{border-bottom:1px solid #ddd;padding:4px 0}\
.hidden{display:none}\
.parts{display:flex;gap:8px;align-items:center}\
.test-type{width:90px;color:#666}\
.test{flex:1}\
.name,.ns{margin:0}.ns{color:#999;font-size:11px}\
.status{width:110px}\
.passed .status{color:#2a7d2a}\
.failed .status{color:#b00020}\
.running .status,.enqueued .status{color:#b8860b}\
.exception{font-family:monospace;background:#fff4f4;padding:4px;margin:4px 0 0 24px}\
.stat b{margin-left:12px}";

/// Escape exception text for the details panel.
///
/// Ampersands and angle brackets become entities, newlines become `<br>` and
/// tabs become four non-breaking spaces.
pub fn escape_exception(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\n' => out.push_str("<br>"),
            '\t' => out.push_str("&nbsp;&nbsp;&nbsp;&nbsp;"),
            _ => out.push(c),
        }
    }
    out
}

fn state_class(state: &RowState) -> &str {
    match state {
        RowState::Idle => "",
        other => other.as_str(),
    }
}

/// Markup for one test row.
pub fn row_markup(row: &TestRow) -> Markup {
    let d = &row.descriptor;
    let short = d.short_name();
    let mut classes = String::from("list-test-item");
    let state = state_class(&row.state);
    if !state.is_empty() {
        classes.push(' ');
        classes.push_str(state);
    }
    if !row.visible {
        classes.push_str(" hidden");
    }

    html! {
        li class=(classes) data-testid=(d.name) test-type=(d.test_type.as_str())
            data-jsc=[d.js_console.as_ref().map(|_| "true")] {
            div class="parts" {
                div class="checkbox" {
                    input type="checkbox" class="chk-test" checked[row.checked];
                }
                div class="test-type" { (d.test_type.as_str()) }
                div class="test" {
                    p class="name" title=(d.name) { (short) }
                    p class="ns" { (d.name) }
                }
                div class="status" {
                    span class="status-icon" data-state-text=(d.status) {}
                    span class="results" { (row.state.as_str()) }
                }
                @if let Some(link) = &d.js_console {
                    div class="jsConsole" {
                        a href=(link) target="_blank" { "JS console" }
                    }
                }
            }
            div class="testResult" {
                @if let Some(exception) = &row.exception {
                    div class="exception" { (PreEscaped(escape_exception(exception))) }
                }
            }
        }
    }
}

/// The whole list: pinned rows in a `selected-list` first, then the rest in
/// blocks of `page_size` rows.
pub fn list_markup(dashboard: &Dashboard, page_size: usize) -> Markup {
    let rows = dashboard.rows();
    let pinned = dashboard.pinned();
    let rest: Vec<&TestRow> = rows.iter().filter(|r| !r.pinned).collect();
    let page_size = page_size.max(1);

    html! {
        div class="test-container" {
            ul class="list selected-list" {
                @for &i in pinned {
                    (row_markup(&rows[i]))
                }
            }
            @for (n, block) in rest.chunks(page_size).enumerate() {
                ul class="list" data-block=(n) {
                    @for row in block {
                        (row_markup(row))
                    }
                }
            }
        }
    }
}

/// Per-type totals followed by the overall total.
pub fn stat_markup(dashboard: &Dashboard) -> Markup {
    html! {
        div class="stat" {
            @for (test_type, count) in dashboard.totals() {
                b { (test_type.as_str()) ":" } span { (*count) }
            }
            b { "Total:" } span { (dashboard.len()) }
        }
    }
}

/// A standalone HTML page with the status line, counters and every row.
pub fn page_document(dashboard: &Dashboard, page_size: usize) -> Markup {
    html! {
        (DOCTYPE)
        html {
            head {
                meta charset="utf-8";
                title { "Test Board" }
                style { (PreEscaped(PAGE_STYLE)) }
            }
            body {
                div class="header" {
                    div class="status-message" { (dashboard.status()) }
                    div class="selected-count" { (dashboard.selected_label()) }
                    (stat_markup(dashboard))
                }
                (list_markup(dashboard, page_size))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{TestDescriptor, TestType};

    #[test]
    fn escape_exception_handles_markup_and_whitespace() {
        assert_eq!(
            escape_exception("a<b>&c\n\td"),
            "a&lt;b&gt;&amp;c<br>&nbsp;&nbsp;&nbsp;&nbsp;d"
        );
    }

    #[test]
    fn row_carries_id_and_type_attributes() {
        let d = Dashboard::new(vec![TestDescriptor::new(
            "js://ui.button.testClick(x)",
            TestType::JsTest,
        )]);
        let html = row_markup(&d.rows()[0]).into_string();
        assert!(html.contains(r#"data-testid="js://ui.button.testClick(x)""#));
        assert!(html.contains(r#"test-type="jstest""#));
        assert!(html.contains(r#"class="chk-test""#));
        assert!(!html.contains("checked"));
    }

    #[test]
    fn hidden_rows_get_hidden_class() {
        let mut d = Dashboard::new(vec![
            TestDescriptor::new("a.one(x)", TestType::Unit),
            TestDescriptor::new("a.two(x)", TestType::Unit),
        ]);
        d.set_query("one");
        d.apply_filter().unwrap();
        let html = list_markup(&d, DEFAULT_PAGE_SIZE).into_string();
        assert_eq!(html.matches("hidden").count(), 1);
    }

    #[test]
    fn list_splits_into_blocks_after_selected_list() {
        let tests = (0..5)
            .map(|i| TestDescriptor::new(format!("t.test{i}(x)"), TestType::Unit))
            .collect();
        let mut d = Dashboard::new(tests);
        d.toggle_checked(4);
        d.move_selected_to_top();
        let html = list_markup(&d, 2).into_string();
        assert_eq!(html.matches(r#"class="list""#).count(), 2);
        let selected_at = html.find("selected-list").unwrap();
        let pinned_at = html.find("t.test4(x)").unwrap();
        let first_at = html.find("t.test0(x)").unwrap();
        assert!(selected_at < pinned_at && pinned_at < first_at);
    }

    #[test]
    fn stat_lists_types_then_total() {
        let d = Dashboard::new(vec![
            TestDescriptor::new("a(x)", TestType::WebDriver),
            TestDescriptor::new("b(x)", TestType::Unit),
            TestDescriptor::new("c(x)", TestType::WebDriver),
        ]);
        let html = stat_markup(&d).into_string();
        assert_eq!(
            html,
            "<div class=\"stat\"><b>webdriver:</b><span>2</span><b>unit:</b><span>1</span>\
             <b>Total:</b><span>3</span></div>"
        );
    }
}
