use bellboard::schedule::{gaps, Lesson};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::App;

/// One row of the lesson list. The active lesson is highlighted, disabled
/// lessons are dimmed.
pub fn lesson_line(position: usize, lesson: &Lesson, is_current: bool) -> Line<'static> {
    let mut style = Style::default();
    if !lesson.is_valid() {
        style = style.fg(Color::Red);
    }
    if !lesson.is_active {
        style = style.add_modifier(Modifier::DIM | Modifier::CROSSED_OUT);
    }
    if is_current {
        style = style.fg(Color::Green).add_modifier(Modifier::BOLD);
    }

    let mut spans = vec![Span::styled(
        format!(
            "{:>2}. {:<24} {:>5} - {:<5}",
            position + 1,
            lesson.name,
            lesson.start_time,
            lesson.end_time
        ),
        style,
    )];
    if is_current {
        spans.push(Span::styled("  < now", style));
    }
    Line::from(spans)
}

fn break_line(gap: Option<i32>) -> Line<'static> {
    let text = match gap {
        Some(minutes) => format!("      break {minutes} min"),
        None => "      break ?".to_string(),
    };
    Line::styled(text, Style::default().add_modifier(Modifier::DIM))
}

pub fn render_dashboard(app: &App, f: &mut Frame, area: Rect) {
    let board = &app.board;
    let lessons = board.lessons();
    let active_id = board.status(app.now).active_lesson_id;
    let breaks = gaps(lessons);

    let mut lines = Vec::with_capacity(lessons.len() * 2);
    if !board.schedule.is_active(board.selected_day) {
        lines.push(Line::styled(
            "Day off",
            Style::default().add_modifier(Modifier::ITALIC),
        ));
    }
    for (i, lesson) in lessons.iter().enumerate() {
        let is_current = active_id.as_deref() == Some(lesson.id.as_str());
        lines.push(lesson_line(i, lesson, is_current));
        if let Some(gap) = breaks.get(i) {
            lines.push(break_line(*gap));
        }
    }
    if lessons.is_empty() {
        lines.push(Line::raw("No lessons"));
    }

    let title = format!("{} / {}", board.selected_day, board.selected_shift);
    let list = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(list, area);
}
