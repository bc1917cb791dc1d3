use anyhow::Error;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

use crate::models::User;

/// Render one list row: a dim, right-aligned id column followed by the
/// user's `first last` name.
pub(crate) fn user_row_line(user: &User, id_width: usize) -> Line<'static> {
    Line::from(vec![
        Span::styled(
            format!("#{:>width$} ", user.id, width = id_width),
            Style::default().fg(Color::DarkGray),
        ),
        Span::raw(user.full_name()),
    ])
}

/// Width of the widest id so the name column lines up.
pub(crate) fn id_column_width(users: &[User]) -> usize {
    users
        .iter()
        .map(|user| user.id.to_string().len())
        .max()
        .unwrap_or(1)
}

pub(crate) fn busy_span(busy: bool) -> Span<'static> {
    if busy {
        Span::styled(
            " working… ",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::ITALIC),
        )
    } else {
        Span::raw("")
    }
}

/// Column for a text cursor `offset` cells into `area`, kept on the last
/// column when the text runs past the right edge.
pub(crate) fn clamped_cursor_x(area: Rect, offset: usize) -> u16 {
    let offset = u16::try_from(offset).unwrap_or(u16::MAX);
    area.x
        .saturating_add(offset)
        .min(area.x.saturating_add(area.width.saturating_sub(1)))
}

/// Produce a rectangle centered within `area` that spans the requested percent
/// of the width and height. Used for modal dialogs.
pub(crate) fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(area);

    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(horizontal[1]);

    vertical[1]
}

/// Extract the most relevant error message from a chained error.
pub(crate) fn surface_error(err: &Error) -> String {
    err.chain()
        .last()
        .map(|cause| cause.to_string())
        .unwrap_or_else(|| err.to_string())
}
