//! Ratatui front-end: a single list screen with add and delete dialogs.

mod app;
mod forms;
mod helpers;
mod terminal;

pub use app::App;
pub use terminal::run_app;
