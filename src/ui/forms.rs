use anyhow::{anyhow, Result};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

use crate::models::User;

/// Internal representation of the "add user" form fields.
#[derive(Default, Clone)]
pub(crate) struct UserForm {
    pub(crate) first_name: String,
    pub(crate) last_name: String,
    pub(crate) active: UserField,
    pub(crate) error: Option<String>,
}

/// Fields available within the user form.
#[derive(Copy, Clone, PartialEq, Eq, Default)]
pub(crate) enum UserField {
    #[default]
    FirstName,
    LastName,
}

impl UserField {
    pub(crate) fn label(self) -> &'static str {
        match self {
            UserField::FirstName => "First name",
            UserField::LastName => "Last name",
        }
    }
}

impl UserForm {
    /// Swap focus between the two name fields.
    pub(crate) fn toggle_field(&mut self) {
        self.active = match self.active {
            UserField::FirstName => UserField::LastName,
            UserField::LastName => UserField::FirstName,
        };
    }

    /// Append a character to the active field. Control characters are ignored.
    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        self.field_mut(self.active).push(ch);
        true
    }

    pub(crate) fn backspace(&mut self) {
        self.field_mut(self.active).pop();
    }

    /// Validate the inputs and return trimmed names ready for the controller.
    pub(crate) fn parse_inputs(&self) -> Result<(String, String)> {
        let first_name = self.first_name.trim();
        if first_name.is_empty() {
            return Err(anyhow!("First name is required."));
        }
        let last_name = self.last_name.trim();
        if last_name.is_empty() {
            return Err(anyhow!("Last name is required."));
        }
        Ok((first_name.to_string(), last_name.to_string()))
    }

    /// Render a single line for the form widget.
    pub(crate) fn build_line(&self, field: UserField) -> Line<'static> {
        let value = self.field(field);
        let is_active = self.active == field;

        let display = if value.is_empty() {
            "<required>".to_string()
        } else {
            value.to_string()
        };

        let style = if is_active {
            Style::default().fg(Color::Yellow)
        } else if value.is_empty() {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default()
        };

        Line::from(vec![
            Span::raw(format!("{}: ", field.label())),
            Span::styled(display, style),
        ])
    }

    /// Character count of the requested field, used for cursor placement.
    pub(crate) fn value_len(&self, field: UserField) -> usize {
        self.field(field).chars().count()
    }

    fn field(&self, field: UserField) -> &str {
        match field {
            UserField::FirstName => &self.first_name,
            UserField::LastName => &self.last_name,
        }
    }

    fn field_mut(&mut self, field: UserField) -> &mut String {
        match field {
            UserField::FirstName => &mut self.first_name,
            UserField::LastName => &mut self.last_name,
        }
    }
}

/// Pending confirmation before a user is deleted.
pub(crate) struct ConfirmUserDelete {
    pub(crate) user: User,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typing_goes_to_the_active_field() {
        let mut form = UserForm::default();
        for ch in "Pepe".chars() {
            form.push_char(ch);
        }
        form.toggle_field();
        for ch in "Botellaa".chars() {
            form.push_char(ch);
        }
        form.backspace();

        assert_eq!(form.first_name, "Pepe");
        assert_eq!(form.last_name, "Botella");
        assert!(!form.push_char('\n'));
    }

    #[test]
    fn parse_inputs_trims_and_requires_both_names() {
        let mut form = UserForm {
            first_name: "  el diablo ".into(),
            ..UserForm::default()
        };
        assert_eq!(
            form.parse_inputs().unwrap_err().to_string(),
            "Last name is required."
        );

        form.last_name = " mami".into();
        assert_eq!(
            form.parse_inputs().unwrap(),
            ("el diablo".to_string(), "mami".to_string())
        );
    }
}
