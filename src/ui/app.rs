use std::mem;

use anyhow::Result;
use crossterm::event::KeyCode;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::prelude::*;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Frame;
use tokio::sync::watch;

use crate::controller::{UserController, UsersState};
use crate::models::User;

use super::forms::{ConfirmUserDelete, UserField, UserForm};
use super::helpers::{
    busy_span, centered_rect, clamped_cursor_x, id_column_width, surface_error, user_row_line,
};

/// Footer space reserved for status messages and instructions.
const FOOTER_HEIGHT: u16 = 3;
/// Name pair used by the quick-add shortcut.
const QUICK_ADD_NAME: (&str, &str) = ("el diablo", "mami");

/// Fine-grained modes layered over the user list.
enum Mode {
    Normal,
    AddingUser(UserForm),
    ConfirmDelete(ConfirmUserDelete),
}

/// Holds the footer message text plus its severity.
struct StatusMessage {
    text: String,
    kind: StatusKind,
}

/// Severity levels shown in the footer.
enum StatusKind {
    Info,
    /// A command is in flight; replaced once the controller goes idle.
    Working,
    Error,
}

impl StatusKind {
    fn style(&self) -> Style {
        match self {
            StatusKind::Info => Style::default().fg(Color::Green),
            StatusKind::Working => Style::default().fg(Color::Yellow),
            StatusKind::Error => Style::default().fg(Color::Red),
        }
    }
}

/// Central application state for the TUI. The app never reads the database
/// itself: it renders the controller's latest published state and sends it
/// commands.
pub struct App {
    controller: UserController,
    updates: watch::Receiver<UsersState>,
    state: UsersState,
    selected: usize,
    mode: Mode,
    status: Option<StatusMessage>,
}

impl App {
    pub fn new(controller: UserController) -> Self {
        let mut updates = controller.subscribe();
        let state = updates.borrow_and_update().clone();
        Self {
            controller,
            updates,
            state,
            selected: 0,
            mode: Mode::Normal,
            status: None,
        }
    }

    /// Pull the controller's newest state, if any, before drawing.
    pub(crate) fn sync_state(&mut self) {
        if !self.updates.has_changed().unwrap_or(false) {
            return;
        }
        self.state = self.updates.borrow_and_update().clone();
        if !self.state.busy
            && matches!(
                self.status,
                Some(StatusMessage {
                    kind: StatusKind::Working,
                    ..
                })
            )
        {
            self.clear_status();
        }
        if self.selected >= self.state.users.len() {
            self.selected = self.state.users.len().saturating_sub(1);
        }
    }

    /// Stop the controller's background work before the process exits.
    pub fn shutdown(&self) {
        self.controller.shutdown();
    }

    pub fn handle_key(&mut self, code: KeyCode) -> Result<bool> {
        let mut exit = false;
        let mode = mem::replace(&mut self.mode, Mode::Normal);

        self.mode = match mode {
            Mode::Normal => self.handle_normal_key(code, &mut exit),
            Mode::AddingUser(form) => self.handle_add_user(code, form),
            Mode::ConfirmDelete(confirm) => self.handle_confirm_delete(code, confirm),
        };

        Ok(exit)
    }

    fn handle_normal_key(&mut self, code: KeyCode, exit: &mut bool) -> Mode {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => *exit = true,
            KeyCode::Up => self.move_selection(-1),
            KeyCode::Down => self.move_selection(1),
            KeyCode::Home => self.selected = 0,
            KeyCode::End => self.selected = self.state.users.len().saturating_sub(1),
            KeyCode::Char('+') => {
                self.clear_status();
                return Mode::AddingUser(UserForm::default());
            }
            KeyCode::Char('a') => {
                let (first_name, last_name) = QUICK_ADD_NAME;
                let _ = self.controller.add_user(first_name, last_name);
                self.set_status(
                    format!("Adding {first_name} {last_name}."),
                    StatusKind::Working,
                );
            }
            KeyCode::Char('d') | KeyCode::Delete => match self.current_user().cloned() {
                Some(user) => return Mode::ConfirmDelete(ConfirmUserDelete { user }),
                None => self.set_status("No user selected.", StatusKind::Error),
            },
            KeyCode::Char('r') => {
                let _ = self.controller.load_users();
                self.set_status("Reloading users.", StatusKind::Working);
            }
            KeyCode::Char('c') => {
                self.controller.clear_error();
                self.clear_status();
            }
            _ => {}
        }
        Mode::Normal
    }

    fn handle_add_user(&mut self, code: KeyCode, mut form: UserForm) -> Mode {
        match code {
            KeyCode::Esc => {
                self.set_status("Add user cancelled.", StatusKind::Info);
                return Mode::Normal;
            }
            KeyCode::Tab | KeyCode::BackTab => form.toggle_field(),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => match form.parse_inputs() {
                Ok((first_name, last_name)) => {
                    self.set_status(
                        format!("Adding {first_name} {last_name}."),
                        StatusKind::Working,
                    );
                    let _ = self.controller.add_user(first_name, last_name);
                    return Mode::Normal;
                }
                Err(err) => {
                    let message = surface_error(&err);
                    form.error = Some(message.clone());
                    self.set_status(message, StatusKind::Error);
                }
            },
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }
        Mode::AddingUser(form)
    }

    fn handle_confirm_delete(&mut self, code: KeyCode, confirm: ConfirmUserDelete) -> Mode {
        match code {
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
                self.set_status("Deletion cancelled.", StatusKind::Info);
                Mode::Normal
            }
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => {
                self.set_status(format!("Deleting {}.", confirm.user), StatusKind::Working);
                let _ = self.controller.delete_user(confirm.user);
                Mode::Normal
            }
            _ => Mode::ConfirmDelete(confirm),
        }
    }

    pub(crate) fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let footer_height = FOOTER_HEIGHT.min(area.height);

        let (content_area, footer_area) = if area.height > footer_height {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(0), Constraint::Length(footer_height)])
                .split(area);
            (chunks[0], chunks[1])
        } else {
            (area, area)
        };

        self.draw_user_list(frame, content_area);

        if area.height >= footer_height {
            self.draw_footer(frame, footer_area);
        }

        match &self.mode {
            Mode::AddingUser(form) => self.draw_user_form(frame, area, form),
            Mode::ConfirmDelete(confirm) => self.draw_confirm_delete(frame, area, confirm),
            Mode::Normal => {}
        }
    }

    fn draw_user_list(&self, frame: &mut Frame, area: Rect) {
        let title = Line::from(vec![
            Span::raw(format!(" Users ({}) ", self.state.users.len())),
            busy_span(self.state.busy),
        ]);
        let block = Block::default().borders(Borders::ALL).title(title);

        if self.state.users.is_empty() {
            let message = if self.state.busy {
                "Loading users…"
            } else {
                "No users yet. Press '+' to add one."
            };
            let paragraph = Paragraph::new(message)
                .alignment(Alignment::Center)
                .block(block);
            frame.render_widget(paragraph, area);
            return;
        }

        let id_width = id_column_width(&self.state.users);
        let items: Vec<ListItem> = self
            .state
            .users
            .iter()
            .map(|user| ListItem::new(user_row_line(user, id_width)))
            .collect();

        let list = List::new(items)
            .block(block)
            .highlight_style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("> ");

        let mut list_state = ListState::default().with_selected(Some(self.selected));
        frame.render_stateful_widget(list, area, &mut list_state);
    }

    fn draw_footer(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::TOP);
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);

        let status_line = if let Some(error) = &self.state.error {
            Line::from(vec![Span::styled(
                format!("Error: {error}"),
                StatusKind::Error.style(),
            )])
        } else if let Some(status) = &self.status {
            Line::from(vec![Span::styled(status.text.clone(), status.kind.style())])
        } else {
            Line::from("")
        };

        let instructions = self.footer_instructions();

        let paragraph = Paragraph::new(vec![status_line, instructions]).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn footer_instructions(&self) -> Line<'static> {
        let key_style = Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD);
        let hints: &[(&'static str, &'static str)] = match self.mode {
            Mode::Normal => &[
                ("[↑↓]", " Navigate   "),
                ("[+]", " Add   "),
                ("[a]", " Quick add   "),
                ("[d]", " Delete   "),
                ("[r]", " Reload   "),
                ("[c]", " Clear error   "),
                ("[q]", " Quit"),
            ],
            Mode::AddingUser(_) => &[
                ("[Tab]", " Switch field   "),
                ("[Enter]", " Save   "),
                ("[Esc]", " Cancel"),
            ],
            Mode::ConfirmDelete(_) => &[("[y]", " Confirm   "), ("[n/Esc]", " Cancel")],
        };

        let spans: Vec<Span<'static>> = hints
            .iter()
            .flat_map(|(key, label)| [Span::styled(*key, key_style), Span::raw(*label)])
            .collect();
        Line::from(spans)
    }

    fn draw_user_form(&self, frame: &mut Frame, area: Rect, form: &UserForm) {
        let popup_area = centered_rect(60, 40, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title("Add User").borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut lines = vec![
            form.build_line(UserField::FirstName),
            form.build_line(UserField::LastName),
            Line::from(""),
        ];

        if let Some(error) = &form.error {
            lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::Red),
            )));
        } else {
            lines.push(Line::from(Span::styled(
                "Enter to save • Tab to switch • Esc to cancel",
                Style::default().fg(Color::Gray),
            )));
        }

        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);

        let row = match form.active {
            UserField::FirstName => 0,
            UserField::LastName => 1,
        };
        let prefix = format!("{}: ", form.active.label()).len();
        let cursor_x = clamped_cursor_x(inner, prefix + form.value_len(form.active));
        frame.set_cursor_position((cursor_x, inner.y + row));
    }

    fn draw_confirm_delete(&self, frame: &mut Frame, area: Rect, confirm: &ConfirmUserDelete) {
        let popup_area = centered_rect(60, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default()
            .title("Confirm Removal")
            .borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let lines = vec![
            Line::from(format!("Remove user #{} ({})?", confirm.user.id, confirm.user)),
            Line::from(""),
            Line::from(Span::styled(
                "Press Y to confirm or N / Esc to cancel.",
                Style::default().fg(Color::Gray),
            )),
        ];

        let paragraph = Paragraph::new(lines)
            .alignment(Alignment::Left)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn set_status<S: Into<String>>(&mut self, text: S, kind: StatusKind) {
        self.status = Some(StatusMessage {
            text: text.into(),
            kind,
        });
    }

    fn clear_status(&mut self) {
        self.status = None;
    }

    fn current_user(&self) -> Option<&User> {
        self.state.users.get(self.selected)
    }

    fn move_selection(&mut self, offset: isize) {
        let len = self.state.users.len();
        if len == 0 {
            self.selected = 0;
            return;
        }
        let next = (self.selected as isize + offset).clamp(0, len as isize - 1);
        self.selected = next as usize;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::db::Database;

    fn app_with_users(runtime: &tokio::runtime::Runtime, names: &[(&str, &str)]) -> App {
        let database = Arc::new(Database::open_in_memory().unwrap());
        let controller = UserController::new(database, runtime.handle());
        for (first, last) in names {
            controller.add_user(*first, *last).blocking_wait().unwrap();
        }
        let mut app = App::new(controller);
        app.sync_state();
        app
    }

    fn runtime() -> tokio::runtime::Runtime {
        tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
            .unwrap()
    }

    #[test]
    fn selection_is_clamped_to_the_list() {
        let runtime = runtime();
        let mut app = app_with_users(&runtime, &[("Pepe", "Botella"), ("el diablo", "mami")]);

        app.handle_key(KeyCode::Up).unwrap();
        assert_eq!(app.selected, 0);
        app.handle_key(KeyCode::Down).unwrap();
        app.handle_key(KeyCode::Down).unwrap();
        assert_eq!(app.selected, 1);
        assert_eq!(app.current_user().unwrap().first_name, "el diablo");
    }

    #[test]
    fn add_form_submits_through_the_controller() {
        let runtime = runtime();
        let mut app = app_with_users(&runtime, &[]);

        app.handle_key(KeyCode::Char('+')).unwrap();
        for ch in "Ada".chars() {
            app.handle_key(KeyCode::Char(ch)).unwrap();
        }
        app.handle_key(KeyCode::Tab).unwrap();
        for ch in "Lovelace".chars() {
            app.handle_key(KeyCode::Char(ch)).unwrap();
        }
        app.handle_key(KeyCode::Enter).unwrap();
        assert!(matches!(app.mode, Mode::Normal));

        app.controller.load_users().blocking_wait().unwrap();
        app.sync_state();
        assert_eq!(app.state.users.len(), 1);
        assert_eq!(app.state.users[0].full_name(), "Ada Lovelace");
    }

    #[test]
    fn delete_requires_confirmation() {
        let runtime = runtime();
        let mut app = app_with_users(&runtime, &[("Pepe", "Botella")]);

        app.handle_key(KeyCode::Char('d')).unwrap();
        app.handle_key(KeyCode::Char('n')).unwrap();
        app.controller.load_users().blocking_wait().unwrap();
        app.sync_state();
        assert_eq!(app.state.users.len(), 1);

        app.handle_key(KeyCode::Char('d')).unwrap();
        app.handle_key(KeyCode::Char('y')).unwrap();
        app.controller.load_users().blocking_wait().unwrap();
        app.sync_state();
        assert!(app.state.users.is_empty());
    }

    #[test]
    fn in_flight_status_clears_when_the_controller_goes_idle() {
        let runtime = runtime();
        let mut app = app_with_users(&runtime, &[]);

        app.handle_key(KeyCode::Char('a')).unwrap();
        assert!(matches!(
            app.status,
            Some(StatusMessage {
                kind: StatusKind::Working,
                ..
            })
        ));

        app.controller.load_users().blocking_wait().unwrap();
        app.sync_state();
        assert!(app.status.is_none());
        assert_eq!(app.state.users[0].full_name(), "el diablo mami");
    }

    #[test]
    fn validation_errors_survive_state_updates() {
        let runtime = runtime();
        let mut app = app_with_users(&runtime, &[]);

        app.handle_key(KeyCode::Char('+')).unwrap();
        app.handle_key(KeyCode::Enter).unwrap();
        app.controller.load_users().blocking_wait().unwrap();
        app.sync_state();
        assert!(matches!(
            app.status,
            Some(StatusMessage {
                kind: StatusKind::Error,
                ..
            })
        ));
    }

    #[test]
    fn quit_keys_exit() {
        let runtime = runtime();
        let mut app = app_with_users(&runtime, &[]);
        assert!(app.handle_key(KeyCode::Char('q')).unwrap());
    }
}
