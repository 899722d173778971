use bellboard::schedule::{gaps, Lesson};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::Span,
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};

use crate::App;

pub fn lesson_flags(lesson: &Lesson) -> String {
    let mut flags = Vec::new();
    if !lesson.is_valid() {
        flags.push("invalid time");
    }
    if !lesson.is_active {
        flags.push("off");
    }
    flags.join(", ")
}

fn minutes(value: Option<i32>) -> String {
    value.map(|m| m.to_string()).unwrap_or_else(|| "?".to_string())
}

pub fn render_editor(app: &App, f: &mut Frame, area: Rect) {
    let board = &app.board;
    let lessons = board.lessons();
    let breaks = gaps(lessons);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(area);

    let header = Row::new(vec!["#", "Name", "Start", "End", "Min", "Break", "Flags"]).style(
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    );

    let rows: Vec<Row> = lessons
        .iter()
        .enumerate()
        .map(|(i, lesson)| {
            let flags = lesson_flags(lesson);
            let mut style = Style::default();
            if !lesson.is_active {
                style = style.add_modifier(Modifier::DIM);
            }
            if i == app.cursor {
                style = style.add_modifier(Modifier::REVERSED);
            }
            let flag_style = if lesson.is_valid() {
                Style::default()
            } else {
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
            };
            Row::new(vec![
                Cell::from((i + 1).to_string()),
                Cell::from(lesson.name.clone()),
                Cell::from(lesson.start_time.clone()),
                Cell::from(lesson.end_time.clone()),
                Cell::from(minutes(lesson.duration())),
                Cell::from(breaks.get(i).map(|g| minutes(*g)).unwrap_or_default()),
                Cell::from(Span::styled(flags, flag_style)),
            ])
            .style(style)
        })
        .collect();

    let day_state = if board.schedule.is_active(board.selected_day) {
        ""
    } else {
        " (day off)"
    };
    let title = format!(
        "Edit {} / {}{}",
        board.selected_day, board.selected_shift, day_state
    );

    let table = Table::new(
        rows,
        [
            Constraint::Length(3),
            Constraint::Min(12),
            Constraint::Length(6),
            Constraint::Length(6),
            Constraint::Length(4),
            Constraint::Length(6),
            Constraint::Length(18),
        ],
    )
    .header(header)
    .block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(table, chunks[0]);

    let gate = if board.can_save() {
        Span::styled("All times valid", Style::default().fg(Color::Green))
    } else {
        Span::styled(
            "Save blocked: fix invalid times",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )
    };
    f.render_widget(Paragraph::new(gate), chunks[1]);
}
