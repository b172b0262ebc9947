//! Drawing the terminal UI

use super::app::App;
use crate::backend::Row;
use crate::runtime::{DiscoveryStatus, HealthStatus};
use crate::session::{AssistantReply, QueryAnswer, Role, Turn};
use crate::sql_format::format_sql;
use crate::visualize::{self, ChartKind, ChartSpec};
use chrono::Local;
use ratatui::{
    layout::{Constraint, Direction, Layout, Position, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Bar, BarChart, BarGroup, Block, Borders, Paragraph},
    Frame,
};

/// Rows shown per result table; the rest are summarized
const MAX_TABLE_ROWS: usize = 20;
/// Widest a table column is allowed to get, in characters
const MAX_COLUMN_WIDTH: usize = 24;
/// Bars shown in the chart pane
const MAX_BARS: usize = 20;

const HELP: &str =
    "Enter send · Ctrl-N new session · Ctrl-D discover schema · Ctrl-R health · Ctrl-S toggle SQL · PgUp/PgDn scroll · Esc quit";

pub fn draw(frame: &mut Frame, app: &App) {
    let [header, body, status, input] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(5),
        Constraint::Length(5),
        Constraint::Length(3),
    ])
    .areas(frame.area());

    draw_header(frame, app, header);

    let chart = latest_chart(app);
    if let Some((spec, rows)) = chart {
        let [transcript, chart_area] =
            Layout::horizontal([Constraint::Percentage(60), Constraint::Percentage(40)])
                .areas(body);
        draw_transcript(frame, app, transcript);
        draw_chart(frame, &spec, rows, chart_area);
    } else {
        draw_transcript(frame, app, body);
    }

    draw_status(frame, app, status);
    draw_input(frame, app, input);
}

fn draw_header(frame: &mut Frame, app: &App, area: Rect) {
    let session = app.snapshot.as_ref().map_or_else(
        || "starting…".to_string(),
        |s| {
            format!(
                "{} (since {})",
                s.session_id,
                s.started_at.with_timezone(&Local).format("%H:%M")
            )
        },
    );
    let health_style = match app.health {
        HealthStatus::Connected => Style::default().fg(Color::Green),
        HealthStatus::Disconnected(_) => Style::default().fg(Color::Red),
        HealthStatus::Unknown => Style::default().fg(Color::Yellow),
    };
    let line = Line::from(vec![
        Span::styled(
            " QueryDesk ",
            Style::default().fg(Color::Black).bg(Color::Cyan),
        ),
        Span::raw(format!(" {session}  ")),
        Span::styled(app.health.to_string(), health_style),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn draw_transcript(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title(" Conversation ");
    let inner_width = usize::from(area.width.saturating_sub(2)).max(1);
    let inner_height = area.height.saturating_sub(2);

    let turns = app.snapshot.as_ref().map_or(&[][..], |s| s.turns.as_slice());
    let lines = transcript_lines(turns, app.show_sql, inner_width);

    let total = u16::try_from(lines.len()).unwrap_or(u16::MAX);
    let bottom = total.saturating_sub(inner_height);
    let offset = bottom.saturating_sub(app.scroll_back);

    frame.render_widget(Paragraph::new(lines).block(block).scroll((offset, 0)), area);
}

/// Transcript as pre-wrapped lines, oldest turn first.
pub fn transcript_lines(turns: &[Turn], show_sql: bool, width: usize) -> Vec<Line<'static>> {
    if turns.is_empty() {
        return vec![
            Line::from("Ask a question about your database."),
            Line::styled(
                "Run schema discovery (Ctrl-D) first if the backend has not indexed it yet.",
                Style::default().fg(Color::DarkGray),
            ),
        ];
    }

    let user_style = Style::default()
        .fg(Color::Cyan)
        .add_modifier(Modifier::BOLD);
    let assistant_style = Style::default()
        .fg(Color::Green)
        .add_modifier(Modifier::BOLD);

    let mut lines = Vec::new();
    for turn in turns {
        lines.push(match turn.role() {
            Role::User => Line::styled("You", user_style),
            Role::Assistant => Line::styled("Assistant", assistant_style),
        });
        match turn {
            Turn::User { text }
            | Turn::Assistant {
                reply: AssistantReply::Text { text },
            } => push_wrapped(&mut lines, text, width, Style::default()),
            Turn::Assistant {
                reply: AssistantReply::Answer(answer),
            } => answer_lines(&mut lines, answer, show_sql, width),
        }
        lines.push(Line::default());
    }
    lines
}

fn answer_lines(
    lines: &mut Vec<Line<'static>>,
    answer: &QueryAnswer,
    show_sql: bool,
    width: usize,
) {
    push_wrapped(lines, &answer.summary, width, Style::default());

    if show_sql {
        if let Some(query) = &answer.query {
            let sql_style = Style::default().fg(Color::Magenta);
            for sql_line in format_sql(query).lines() {
                push_wrapped(lines, sql_line, width, sql_style);
            }
        }
    }

    if !answer.rows.is_empty() {
        for row in table_lines(&answer.rows) {
            lines.push(Line::raw(row));
        }
        if answer.row_count > MAX_TABLE_ROWS {
            lines.push(Line::styled(
                format!("… {} more rows", answer.row_count - MAX_TABLE_ROWS),
                Style::default().fg(Color::DarkGray),
            ));
        }
    }
}

/// Plain-text table with a header row and a separator.
fn table_lines(rows: &[Row]) -> Vec<String> {
    let columns = visualize::columns(rows);
    let shown = &rows[..rows.len().min(MAX_TABLE_ROWS)];

    let cells: Vec<Vec<String>> = shown
        .iter()
        .map(|row| {
            columns
                .iter()
                .map(|column| row.get(*column).map(cell_text).unwrap_or_default())
                .collect()
        })
        .collect();

    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(i, column)| {
            cells
                .iter()
                .map(|row| row[i].chars().count())
                .chain(std::iter::once(column.chars().count()))
                .max()
                .unwrap_or(0)
                .min(MAX_COLUMN_WIDTH)
        })
        .collect();

    let render_row = |values: Vec<String>| -> String {
        values
            .iter()
            .zip(&widths)
            .map(|(value, &width)| format!("{:<width$}", truncate(value, width)))
            .collect::<Vec<_>>()
            .join(" │ ")
            .trim_end()
            .to_string()
    };

    let mut out = Vec::with_capacity(cells.len() + 2);
    out.push(render_row(columns.iter().map(|c| (*c).to_string()).collect()));
    out.push(
        widths
            .iter()
            .map(|&w| "─".repeat(w))
            .collect::<Vec<_>>()
            .join("─┼─"),
    );
    out.extend(cells.into_iter().map(render_row));
    out
}

fn cell_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(text) => text.replace('\n', " "),
        other => other.to_string(),
    }
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

fn push_wrapped(lines: &mut Vec<Line<'static>>, text: &str, width: usize, style: Style) {
    for line in wrap(text, width) {
        lines.push(Line::styled(line, style));
    }
}

/// Greedy word wrap by character count; overlong words are split.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut out = Vec::new();
    for paragraph in text.lines() {
        let mut current = String::new();
        let mut current_len = 0;
        for word in paragraph.split_whitespace() {
            let mut word_chars: Vec<char> = word.chars().collect();
            while word_chars.len() > width {
                if current_len > 0 {
                    out.push(std::mem::take(&mut current));
                    current_len = 0;
                }
                let rest = word_chars.split_off(width);
                out.push(word_chars.into_iter().collect());
                word_chars = rest;
            }
            let word_len = word_chars.len();
            if current_len > 0 && current_len + 1 + word_len > width {
                out.push(std::mem::take(&mut current));
                current_len = 0;
            }
            if current_len > 0 {
                current.push(' ');
                current_len += 1;
            }
            current.extend(word_chars);
            current_len += word_len;
        }
        out.push(current);
    }
    if out.is_empty() {
        out.push(String::new());
    }
    out
}

/// Chart suggestion for the most recent answer, if any.
fn latest_chart(app: &App) -> Option<(ChartSpec, &[Row])> {
    let snapshot = app.snapshot.as_ref()?;
    let answer = snapshot.turns.iter().rev().find_map(|turn| match turn {
        Turn::Assistant {
            reply: AssistantReply::Answer(answer),
        } => Some(answer),
        _ => None,
    })?;
    let spec = visualize::suggest(&answer.rows)?;
    Some((spec, answer.rows.as_slice()))
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn draw_chart(frame: &mut Frame, spec: &ChartSpec, rows: &[Row], area: Rect) {
    let points = visualize::bar_points(rows, spec);
    // Bars only carry unsigned integers; scale so fractions stay visible
    let bars: Vec<Bar> = points
        .iter()
        .take(MAX_BARS)
        .map(|(label, value)| {
            Bar::default()
                .label(Line::from(truncate(label, 12)))
                .value((value.max(0.0) * 100.0).round() as u64)
                .text_value(format_number(*value))
        })
        .collect();

    let direction = match spec.kind {
        ChartKind::Bar => Direction::Horizontal,
    };
    let chart = BarChart::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" {} ", spec.title)),
        )
        .direction(direction)
        .bar_width(1)
        .bar_gap(0)
        .bar_style(Style::default().fg(Color::Cyan))
        .data(BarGroup::default().bars(&bars));
    frame.render_widget(chart, area);
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        format!("{value:.2}")
    }
}

fn draw_status(frame: &mut Frame, app: &App, area: Rect) {
    let mut lines = Vec::new();

    if app.discovering {
        lines.push(Line::styled(
            "Discovering schema…",
            Style::default().fg(Color::Yellow),
        ));
    } else if let Some(discovery) = &app.discovery {
        let style = match discovery {
            DiscoveryStatus::Indexed(_) => Style::default().fg(Color::Green),
            DiscoveryStatus::Failed(_) => Style::default().fg(Color::Red),
        };
        lines.push(Line::styled(discovery.to_string(), style));
    }

    if app.awaiting_reply() {
        lines.push(Line::styled("Thinking…", Style::default().fg(Color::Yellow)));
    }

    if let Some(notice) = &app.notice {
        lines.push(Line::styled(notice.clone(), Style::default().fg(Color::Yellow)));
    } else if let HealthStatus::Disconnected(reason) = &app.health {
        lines.push(Line::styled(reason.clone(), Style::default().fg(Color::Red)));
    }

    lines.push(Line::styled(HELP, Style::default().fg(Color::DarkGray)));

    frame.render_widget(
        Paragraph::new(lines).block(Block::default().borders(Borders::TOP)),
        area,
    );
}

fn draw_input(frame: &mut Frame, app: &App, area: Rect) {
    let title = if app.awaiting_reply() {
        " Waiting for answer… "
    } else {
        " Ask a question "
    };
    let inner_width = usize::from(area.width.saturating_sub(2));
    let input_len = app.input.chars().count();
    // Keep the tail of long input visible
    let skip = input_len.saturating_sub(inner_width.saturating_sub(1));
    let visible: String = app.input.chars().skip(skip).collect();

    frame.render_widget(
        Paragraph::new(visible.clone())
            .block(Block::default().borders(Borders::ALL).title(title)),
        area,
    );

    let cursor = u16::try_from(visible.chars().count()).unwrap_or(u16::MAX);
    frame.set_cursor_position(Position::new(
        area.x.saturating_add(1).saturating_add(cursor),
        area.y + 1,
    ));
}
