use iocraft::prelude::*;
use unicode_width::UnicodeWidthStr;

use crate::color::{Color as AppColor, ColorDepth};

// ---------------------------------------------------------------------------
// Column definition
// ---------------------------------------------------------------------------

/// How much horizontal space a column takes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColumnWidth {
    /// Exactly this many cells.
    Fixed(u16),
    /// A share of whatever the fixed columns leave over.
    Flex(f32),
}

#[derive(Debug, Clone)]
pub struct Column {
    pub header: String,
    pub width: ColumnWidth,
    pub align: TextAlign,
}

impl Column {
    pub fn fixed(header: impl Into<String>, width: u16) -> Self {
        Self {
            header: header.into(),
            width: ColumnWidth::Fixed(width),
            align: TextAlign::Left,
        }
    }

    pub fn flex(header: impl Into<String>, share: f32) -> Self {
        Self {
            header: header.into(),
            width: ColumnWidth::Flex(share),
            align: TextAlign::Left,
        }
    }
}

/// A single cell value to display.
#[derive(Debug, Clone)]
pub struct Cell {
    pub text: String,
    pub color: Option<AppColor>,
    pub bold: bool,
}

impl Cell {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            color: None,
            bold: false,
        }
    }

    pub fn colored(text: impl Into<String>, color: AppColor) -> Self {
        Self {
            text: text.into(),
            color: Some(color),
            bold: false,
        }
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }
}

/// One table row: cells in column order plus whether the row is highlighted.
#[derive(Debug, Clone)]
pub struct Row {
    pub cells: Vec<Cell>,
    pub highlighted: bool,
}

// ---------------------------------------------------------------------------
// Pre-rendered table data (all owned)
// ---------------------------------------------------------------------------

/// Table data resolved into owned values that can be moved into `element!`.
pub struct RenderedTable {
    pub header_cells: Vec<HeaderCell>,
    pub body_rows: Vec<RenderedRow>,
    pub total_width: u32,
    pub header_fg: Color,
    pub border_fg: Color,
    pub empty_message: Option<String>,
}

pub struct HeaderCell {
    pub text: String,
    pub width: u32,
    pub align: TextAlign,
}

pub struct RenderedRow {
    pub key: usize,
    pub bg: Option<Color>,
    pub cells: Vec<RenderedCell>,
}

pub struct RenderedCell {
    pub text: String,
    pub fg: Color,
    pub weight: Weight,
    pub width: u32,
    pub align: TextAlign,
}

pub struct TableBuildConfig<'a> {
    pub columns: &'a [Column],
    pub rows: &'a [Row],
    pub cursor: usize,
    pub scroll_offset: usize,
    pub visible_rows: usize,
    pub total_width: u16,
    pub depth: ColorDepth,
    pub selected_bg: Option<AppColor>,
    pub highlight_bg: Option<AppColor>,
    pub header_color: Option<AppColor>,
    pub border_color: Option<AppColor>,
    pub empty_message: Option<&'a str>,
}

impl RenderedTable {
    pub fn build(cfg: &TableBuildConfig<'_>) -> Self {
        let depth = cfg.depth;
        let widths = compute_column_widths(cfg.columns, cfg.total_width);

        let header_fg = cfg
            .header_color
            .map_or(Color::White, |c| c.to_crossterm_color(depth));
        let border_fg = cfg
            .border_color
            .map_or(Color::DarkGrey, |c| c.to_crossterm_color(depth));
        let selected_bg = cfg.selected_bg.map(|c| c.to_crossterm_color(depth));
        let highlight_bg = cfg.highlight_bg.map(|c| c.to_crossterm_color(depth));

        let header_cells = cfg
            .columns
            .iter()
            .zip(&widths)
            .map(|(col, &w)| HeaderCell {
                text: col.header.clone(),
                width: u32::from(w),
                align: col.align,
            })
            .collect();

        let body_rows = cfg
            .rows
            .iter()
            .enumerate()
            .skip(cfg.scroll_offset)
            .take(cfg.visible_rows)
            .map(|(idx, row)| {
                let bg = if idx == cfg.cursor {
                    selected_bg
                } else if row.highlighted {
                    highlight_bg
                } else {
                    None
                };
                let cells = cfg
                    .columns
                    .iter()
                    .zip(&widths)
                    .enumerate()
                    .map(|(ci, (col, &w))| {
                        let cell = row.cells.get(ci);
                        RenderedCell {
                            text: cell.map_or_else(String::new, |c| truncate(&c.text, w)),
                            fg: cell
                                .and_then(|c| c.color)
                                .map_or(Color::Reset, |c| c.to_crossterm_color(depth)),
                            weight: if cell.is_some_and(|c| c.bold) {
                                Weight::Bold
                            } else {
                                Weight::Normal
                            },
                            width: u32::from(w),
                            align: col.align,
                        }
                    })
                    .collect();
                RenderedRow {
                    key: idx,
                    bg,
                    cells,
                }
            })
            .collect();

        let empty_message = if cfg.rows.is_empty() {
            cfg.empty_message.map(String::from)
        } else {
            None
        };

        Self {
            header_cells,
            body_rows,
            total_width: u32::from(cfg.total_width),
            header_fg,
            border_fg,
            empty_message,
        }
    }
}

/// Cut `text` to fit `width` terminal cells, marking the cut with an ellipsis.
pub fn truncate(text: &str, width: u16) -> String {
    let width = usize::from(width);
    if text.width() <= width {
        return text.to_owned();
    }
    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let w = unicode_width::UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + w + 1 > width {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push('\u{2026}');
    out
}

// ---------------------------------------------------------------------------
// ScrollableTable component
// ---------------------------------------------------------------------------

#[derive(Default, Props)]
pub struct ScrollableTableProps {
    pub table: Option<RenderedTable>,
}

#[component]
pub fn ScrollableTable(props: &mut ScrollableTableProps) -> impl Into<AnyElement<'static>> {
    let Some(table) = props.table.take() else {
        return element! { View }.into_any();
    };

    element! {
        View(flex_direction: FlexDirection::Column, width: table.total_width) {
            View(
                border_style: BorderStyle::Single,
                border_edges: Edges::Bottom,
                border_color: table.border_fg,
            ) {
                #(table.header_cells.into_iter().enumerate().map(|(i, hc)| {
                    element! {
                        View(key: i, width: hc.width) {
                            Text(
                                content: hc.text,
                                weight: Weight::Bold,
                                color: table.header_fg,
                                wrap: TextWrap::NoWrap,
                                align: hc.align,
                            )
                        }
                    }
                }))
            }

            #(table.empty_message.into_iter().map(|msg| {
                element! {
                    View(padding_top: 1, padding_left: 2) {
                        Text(content: msg, color: Color::DarkGrey)
                    }
                }
            }))
            #(table.body_rows.into_iter().map(|row| {
                element! {
                    View(key: row.key, background_color: row.bg) {
                        #(row.cells.into_iter().enumerate().map(|(ci, cell)| {
                            element! {
                                View(key: ci, width: cell.width) {
                                    Text(
                                        content: cell.text,
                                        color: cell.fg,
                                        weight: cell.weight,
                                        wrap: TextWrap::NoWrap,
                                        align: cell.align,
                                    )
                                }
                            }
                        }))
                    }
                }
            }))
        }
    }
    .into_any()
}

// ---------------------------------------------------------------------------
// Column width computation
// ---------------------------------------------------------------------------

fn compute_column_widths(columns: &[Column], total: u16) -> Vec<u16> {
    let fixed: u16 = columns
        .iter()
        .filter_map(|c| match c.width {
            ColumnWidth::Fixed(w) => Some(w),
            ColumnWidth::Flex(_) => None,
        })
        .sum();
    let remaining = f32::from(total.saturating_sub(fixed));
    let flex_sum: f32 = columns
        .iter()
        .filter_map(|c| match c.width {
            ColumnWidth::Flex(share) => Some(share),
            ColumnWidth::Fixed(_) => None,
        })
        .sum();

    columns
        .iter()
        .map(|c| match c.width {
            ColumnWidth::Fixed(w) => w,
            ColumnWidth::Flex(share) if flex_sum > 0.0 => {
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                let w = (remaining * share / flex_sum).floor() as u16;
                w.max(1)
            }
            ColumnWidth::Flex(_) => 1,
        })
        .collect()
}
