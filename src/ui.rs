pub mod dashboard;
pub mod editor;
pub mod screen;

use bellboard::{schedule::DayId, status::StatusKind};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Tabs},
    Frame,
};

use crate::App;

const HORIZONTAL_MARGIN: u16 = 2;

pub fn draw(app: &App, f: &mut Frame) {
    let screen = screen::current_screen(app.screen);
    let body = render_chrome(app, f, screen.help());
    screen.render(app, f, body);
}

/// Draws the parts both screens share and returns the area left for the
/// screen body.
fn render_chrome(app: &App, f: &mut Frame, help: &str) -> Rect {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .constraints([
            Constraint::Length(3), // header
            Constraint::Length(1), // day tabs
            Constraint::Length(1), // shift and status
            Constraint::Min(0),    // body
            Constraint::Length(1), // notice / input
            Constraint::Length(1), // help
        ])
        .split(f.area());

    f.render_widget(header(app), chunks[0]);
    f.render_widget(day_tabs(app), chunks[1]);
    f.render_widget(status_line(app), chunks[2]);
    f.render_widget(notice_line(app), chunks[4]);
    f.render_widget(
        Paragraph::new(Span::styled(
            help.to_string(),
            Style::default()
                .fg(Color::Gray)
                .add_modifier(Modifier::ITALIC),
        )),
        chunks[5],
    );

    chunks[3]
}

fn header(app: &App) -> Paragraph<'static> {
    let config = &app.board.config;
    let clock = app.now.format("%a %d.%m.%Y  %H:%M:%S").to_string();
    Paragraph::new(Line::from(vec![
        Span::raw(config.subtitle.clone()),
        Span::raw("   "),
        Span::styled(clock, Style::default().add_modifier(Modifier::BOLD)),
    ]))
    .block(
        Block::default().borders(Borders::ALL).title(Span::styled(
            config.school_name.clone(),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )),
    )
}

fn day_tabs(app: &App) -> Tabs<'static> {
    let board = &app.board;
    let titles: Vec<Line> = DayId::ALL
        .iter()
        .map(|&day| {
            let style = if board.schedule.is_active(day) {
                Style::default()
            } else {
                Style::default().add_modifier(Modifier::DIM)
            };
            Line::styled(day.to_string().chars().take(3).collect::<String>(), style)
        })
        .collect();

    Tabs::new(titles)
        .select(board.selected_day.device_index())
        .highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
        )
}

pub fn status_style(kind: StatusKind) -> Style {
    let bg = match kind {
        StatusKind::InLesson => Color::Green,
        StatusKind::InBreak => Color::Yellow,
        StatusKind::BeforeHours | StatusKind::AfterHours => Color::Blue,
        StatusKind::DayOff | StatusKind::NoLessons => Color::DarkGray,
    };
    Style::default()
        .bg(bg)
        .fg(Color::Black)
        .add_modifier(Modifier::BOLD)
}

fn status_line(app: &App) -> Paragraph<'static> {
    let board = &app.board;
    let status = board.status(app.now);

    let mut spans = vec![
        Span::styled(
            format!("{}", board.selected_shift),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled(format!(" {} ", status.kind), status_style(status.kind)),
    ];
    if status.kind == StatusKind::InLesson {
        spans.push(Span::raw(format!(" {}", status.text)));
    }
    if !board.follow_clock {
        spans.push(Span::styled(
            "  (pinned, t: today)",
            Style::default().add_modifier(Modifier::DIM),
        ));
    }
    Paragraph::new(Line::from(spans))
}

fn notice_line(app: &App) -> Paragraph<'static> {
    if let Some(input) = &app.input {
        return Paragraph::new(Span::styled(
            format!("{}: {}_", input.field.prompt(), input.buffer),
            Style::default().fg(Color::Cyan),
        ));
    }
    match &app.notice {
        Some(notice) => {
            let color = if notice.is_error {
                Color::Red
            } else {
                Color::Green
            };
            Paragraph::new(Span::styled(
                notice.text.clone(),
                Style::default().fg(color),
            ))
        }
        None => Paragraph::new(""),
    }
}
