//! Domain models that mirror the SQLite schema and get passed between the
//! store, the controller and the TUI. They stay light-weight data holders so
//! the other layers can focus on persistence and presentation.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
/// A persisted row of the `users` table.
pub struct User {
    /// Primary key. Assigned by the store unless the caller upserts with an
    /// explicit id through `insert_users`.
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
}

impl User {
    pub fn new(id: i64, first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            id,
            first_name: first_name.into(),
            last_name: last_name.into(),
        }
    }

    /// `first last`, the way every list row shows a user.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// A name pair that has not been persisted yet. Inserting it through
/// `create_user` yields a `User` carrying the id the store picked.
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
}

impl NewUser {
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_joins_first_and_last_name() {
        let user = User::new(1, "Pepe", "Botella");
        assert_eq!(user.to_string(), "Pepe Botella");
        assert_eq!(user.full_name(), "Pepe Botella");
    }
}
