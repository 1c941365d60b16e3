use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Cell, Clear, List, ListItem, Paragraph, Row, Table, TableState, Tabs, Wrap},
    Frame,
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use super::App;
use crate::view::day::DayView;
use crate::view::grid::{self, Grid};
use crate::view::{DayTab, Header, Mode, RenderModel};

const ACCENT: Color = Color::Cyan;
const HEADER_BG: Color = Color::DarkGray;
const SELECTED_BG: Color = Color::Rgb(40, 40, 60);
/// Foreground accent for the current row and highlighted courses.
const FOCAL: Color = Color::Rgb(255, 185, 50);
const CARD_FG: Color = Color::Black;
const DIM: Color = Color::DarkGray;
const GOOD: Color = Color::Green;
const WARN: Color = Color::Yellow;
const BAD: Color = Color::Red;

const TIME_COL_WIDTH: u16 = 9;
const TABLE_ROW_HEIGHT: u16 = 3;
const SPINNER: [char; 8] = ['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧'];

// ─── Main render ────────────────────────────────────────────────────────────

pub fn render(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(f.area());

    match app.render_model() {
        RenderModel::Unavailable { message } => {
            let body = chunks[0].union(chunks[1]);
            render_unavailable(f, message, body);
        }
        RenderModel::Simplified { header, tabs, view } => {
            render_header(f, app, &header, chunks[0]);
            render_simplified(f, app, &tabs, &view, chunks[1]);
        }
        RenderModel::Table { header, grid } => {
            render_header(f, app, &header, chunks[0]);
            render_table(f, app, &grid, chunks[1]);
        }
    }

    render_status_bar(f, app, chunks[2]);

    if app.picker.is_some() {
        render_picker(f, app);
    }
}

fn render_unavailable(f: &mut Frame, message: &str, area: Rect) {
    let msg = Paragraph::new(vec![Line::from(""), Line::from(message)])
        .alignment(Alignment::Center)
        .style(Style::default().fg(BAD))
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(msg, area);
}

// ─── Header ─────────────────────────────────────────────────────────────────

fn render_header(f: &mut Frame, app: &App, header: &Header, area: Rect) {
    let title = Paragraph::new(vec![
        Line::from(vec![
            Span::styled(
                format!(" {}", header.title),
                Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
            ),
            Span::styled(format!("  [{}]", header.short_id), Style::default().fg(WARN)),
        ]),
        Line::from(Span::styled(format!(" {}", header.subtitle), Style::default().fg(DIM))),
    ])
    .block(Block::default().borders(Borders::BOTTOM));
    f.render_widget(title, area);

    render_clock(f, app, area);
}

// ─── Clock ──────────────────────────────────────────────────────────────────

fn render_clock(f: &mut Frame, app: &App, header_area: Rect) {
    let now = app.now();
    let lines = [
        format!(" {} {} ", now.day.abbrev(), now.time),
        format!(" {} ", app.selection.mode.label()),
    ];
    for (i, text) in lines.iter().enumerate() {
        let width = text.width() as u16;
        let area = Rect {
            x: header_area.right().saturating_sub(width),
            y: header_area.y + i as u16,
            width: width.min(header_area.width),
            height: 1,
        };
        let style = if i == 0 {
            Style::default().fg(ACCENT)
        } else {
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
        };
        f.render_widget(Paragraph::new(text.as_str()).style(style), area);
    }
}

// ─── Status Bar ─────────────────────────────────────────────────────────────

fn render_status_bar(f: &mut Frame, app: &App, area: Rect) {
    let sync_hint = app
        .synced_at
        .map(|t| format!("  synced {}", t.format("%b %d %H:%M")))
        .unwrap_or_default();

    let spinner = if app.syncing {
        format!("{} ", SPINNER[(app.frame_count as usize / 2) % SPINNER.len()])
    } else {
        String::new()
    };

    let keys = match (app.picker.is_some(), app.selection.mode) {
        (true, _) => "  type:search  ↑/↓:nav  Enter:select  Esc:cancel",
        (false, Mode::Simplified) => {
            "  q:quit  m:table  h/l:day  1-7:jump  t:today  /:schedules  r:refresh"
        }
        (false, Mode::Table) => "  q:quit  m:simple  /:schedules  r:refresh",
    };

    let status = Paragraph::new(Line::from(vec![
        Span::styled(" ", Style::default()),
        Span::styled(spinner, Style::default().fg(WARN)),
        Span::styled(
            &app.status_message,
            Style::default().fg(if app.syncing { WARN } else { Color::White }),
        ),
        Span::styled(format!("{keys}{sync_hint}  "), Style::default().fg(DIM)),
    ]))
    .style(Style::default().bg(HEADER_BG));

    f.render_widget(status, area);
}

// ─── Simplified mode ────────────────────────────────────────────────────────

fn render_simplified(f: &mut Frame, app: &mut App, tabs: &[DayTab], view: &DayView, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(2), Constraint::Min(0)])
        .split(area);

    render_day_tabs(f, tabs, chunks[0]);

    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" {} ", view.day.name()))
        .title_style(Style::default().fg(ACCENT));

    if view.entries.is_empty() {
        let msg = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled(
                format!("No classes scheduled for {}. Enjoy your free time!", view.day.name()),
                Style::default().fg(GOOD),
            )),
        ])
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(block);
        f.render_widget(msg, chunks[1]);
        return;
    }

    // Two columns of margin inside the border.
    let card_width = chunks[1].width.saturating_sub(4) as usize;

    let items: Vec<ListItem> = view
        .entries
        .iter()
        .map(|entry| {
            let color = app.colors.color_for(&entry.course.title);
            let highlighted = entry.status.is_highlighted();
            let marker = if highlighted { "▶ " } else { "  " };

            let mut card = Style::default().bg(color).fg(CARD_FG);
            if !highlighted {
                card = card.add_modifier(Modifier::DIM);
            }
            let title_style = card.add_modifier(Modifier::BOLD);

            ListItem::new(vec![
                card_line(&format!("{marker}{}", entry.course.title), card_width, title_style),
                card_line(&format!("  {}", entry.course.time_range()), card_width, card),
                card_line(&format!("  {}", entry.course.room), card_width, card),
                Line::from(""),
            ])
        })
        .collect();

    let list = List::new(items).block(block);
    f.render_widget(list, chunks[1]);
}

fn render_day_tabs(f: &mut Frame, tabs: &[DayTab], area: Rect) {
    let titles: Vec<Line> = tabs
        .iter()
        .enumerate()
        .map(|(i, tab)| {
            let name_style = if tab.is_today {
                Style::default().fg(GOOD)
            } else {
                Style::default().fg(Color::White)
            };
            Line::from(vec![
                Span::styled(format!("{} ", i + 1), Style::default().fg(DIM)),
                Span::styled(tab.day.abbrev(), name_style),
                Span::styled(if tab.is_today { " •" } else { "" }, Style::default().fg(GOOD)),
            ])
        })
        .collect();

    let selected = tabs.iter().position(|t| t.is_selected).unwrap_or(0);

    let widget = Tabs::new(titles)
        .block(Block::default().borders(Borders::BOTTOM))
        .select(selected)
        .highlight_style(
            Style::default()
                .fg(ACCENT)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
        );
    f.render_widget(widget, area);
}

/// One full-width line of a colored card.
fn card_line(text: &str, width: usize, style: Style) -> Line<'static> {
    let mut text = fit(text, width);
    let pad = width.saturating_sub(text.width());
    text.extend(std::iter::repeat(' ').take(pad));
    Line::from(Span::styled(format!(" {text} "), style))
}

// ─── Table mode ─────────────────────────────────────────────────────────────

fn render_table(f: &mut Frame, app: &mut App, grid: &Grid, area: Rect) {
    let columns = grid.columns.len().max(1) as u16;
    let inner = area.width.saturating_sub(2);
    let cell_width =
        (inner.saturating_sub(TIME_COL_WIDTH + columns) / columns) as usize;

    let header = Row::new(
        std::iter::once(Cell::from("Time")).chain(grid.columns.iter().map(|col| {
            let style = if col.is_today {
                Style::default().fg(ACCENT).add_modifier(Modifier::UNDERLINED)
            } else {
                Style::default().fg(Color::White)
            };
            Cell::from(fit(col.day.name(), cell_width)).style(style)
        })),
    )
    .style(Style::default().add_modifier(Modifier::BOLD))
    .bottom_margin(1);

    // Background of the anchor currently spanning each column.
    let mut span_color: Vec<Option<Color>> = vec![None; grid.columns.len()];

    let rows: Vec<Row> = grid
        .rows
        .iter()
        .map(|row| {
            let time_style = if row.is_current {
                Style::default().fg(FOCAL).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(DIM)
            };
            let mut cells = vec![Cell::from(row.time.to_string()).style(time_style)];

            for (col, cell) in row.cells.iter().enumerate() {
                cells.push(match cell {
                    grid::Cell::Anchor {
                        course,
                        highlighted,
                        ..
                    } => {
                        let color = app.colors.color_for(&course.title);
                        span_color[col] = Some(color);
                        let mut style = Style::default().bg(color).fg(CARD_FG);
                        if *highlighted {
                            style = style.add_modifier(Modifier::BOLD | Modifier::UNDERLINED);
                        }
                        Cell::from(Text::from(vec![
                            Line::from(fit(&course.title, cell_width)),
                            Line::from(fit(&course.time_range(), cell_width)),
                            Line::from(fit(&course.room, cell_width)),
                        ]))
                        .style(style)
                    }
                    grid::Cell::Merged => match span_color[col] {
                        Some(color) => Cell::from("").style(Style::default().bg(color)),
                        None => Cell::from(""),
                    },
                    grid::Cell::Empty => {
                        span_color[col] = None;
                        Cell::from("")
                    }
                });
            }
            Row::new(cells).height(TABLE_ROW_HEIGHT)
        })
        .collect();

    let widths: Vec<Constraint> = std::iter::once(Constraint::Length(TIME_COL_WIDTH))
        .chain(grid.columns.iter().map(|_| Constraint::Fill(1)))
        .collect();

    let title = if grid.hazards.is_empty() {
        Line::from(Span::styled(" Week ", Style::default().fg(ACCENT)))
    } else {
        Line::from(vec![
            Span::styled(" Week ", Style::default().fg(ACCENT)),
            Span::styled(
                format!("({} overlapping hidden) ", grid.hazards.len()),
                Style::default().fg(WARN),
            ),
        ])
    };

    let table = Table::new(rows, widths)
        .header(header)
        .block(Block::default().borders(Borders::ALL).title(title));

    // Selecting the current row only scrolls it into view.
    let mut state = TableState::default();
    state.select(grid.rows.iter().position(|r| r.is_current));
    f.render_stateful_widget(table, area, &mut state);
}

// ─── Schedule picker ────────────────────────────────────────────────────────

fn render_picker(f: &mut Frame, app: &mut App) {
    let area = centered_rect(60, 60, f.area());
    f.render_widget(Clear, area);

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Select schedule ")
        .title_style(Style::default().fg(ACCENT).add_modifier(Modifier::BOLD));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(2), Constraint::Min(0)])
        .split(inner);

    let selected = app.picker.as_ref().map_or(0, |p| p.list_state.selected);
    let query = app.picker.as_ref().map(|p| p.query.clone()).unwrap_or_default();
    f.render_widget(
        Paragraph::new(Line::from(vec![
            Span::styled(" Search: ", Style::default().fg(DIM)),
            Span::styled(format!("{query}_"), Style::default().fg(Color::White)),
        ])),
        chunks[0],
    );

    let results = app.picker_results();
    if results.is_empty() {
        f.render_widget(
            Paragraph::new(Span::styled(" No schedules found.", Style::default().fg(DIM))),
            chunks[1],
        );
        return;
    }

    let items: Vec<ListItem> = results
        .iter()
        .enumerate()
        .map(|(i, schedule)| {
            let is_selected = i == selected;
            let marker = if is_selected { "> " } else { "  " };
            let title_style = Style::default().fg(Color::White).add_modifier(Modifier::BOLD);
            ListItem::new(vec![
                Line::from(vec![
                    Span::styled(marker, Style::default().fg(ACCENT)),
                    Span::styled(
                        schedule.display_name.clone(),
                        if is_selected { title_style.bg(SELECTED_BG) } else { title_style },
                    ),
                    Span::styled(format!("  {}", schedule.short_id), Style::default().fg(WARN)),
                ]),
                Line::from(Span::styled(
                    format!("    {}", schedule.subtitle),
                    Style::default().fg(DIM),
                )),
            ])
        })
        .collect();

    let list = List::new(items);
    if let Some(picker) = app.picker.as_mut() {
        picker.list_state.inner.select(Some(picker.list_state.selected));
        f.render_stateful_widget(list, chunks[1], &mut picker.list_state.inner);
    }
}

fn centered_rect(width_percent: u16, height_percent: u16, area: Rect) -> Rect {
    let vertical_margin = (100u16.saturating_sub(height_percent)) / 2;
    let horizontal_margin = (100u16.saturating_sub(width_percent)) / 2;

    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(vertical_margin),
            Constraint::Percentage(height_percent),
            Constraint::Percentage(vertical_margin),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(horizontal_margin),
            Constraint::Percentage(width_percent),
            Constraint::Percentage(horizontal_margin),
        ])
        .split(vertical[1])[1]
}

/// Truncates to `width` terminal columns, ending in `…` when cut.
fn fit(text: &str, width: usize) -> String {
    if text.width() <= width {
        return text.to_string();
    }
    if width == 0 {
        return String::new();
    }
    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w + 1 > width {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push('…');
    out
}
