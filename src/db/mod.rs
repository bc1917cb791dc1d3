//! Persistence module split across logical submodules.

mod connection;
mod error;
mod users;

pub use connection::{get_database, Database};
pub use error::{DbError, DbResult};
pub use users::{count_users, create_user, delete_user, fetch_users, insert_users, seed_sample_user};
