//! Core library surface for the User Roster TUI application.
//!
//! The binary wires these pieces together; tests and tooling can reuse the
//! store and controller without a terminal.
pub mod config;
pub mod controller;
pub mod db;
pub mod logging;
pub mod models;
pub mod ui;

pub use config::AppConfig;

/// Persistence layer: the shared database handle and its accessor.
pub use db::{get_database, seed_sample_user, Database, DbError};

/// Reactive state between the store and the TUI.
pub use controller::{ControllerError, Ticket, UserController, UsersState};

pub use models::{NewUser, User};

/// The interactive application entry point and state container.
pub use ui::{run_app, App};
