use std::path::PathBuf;

use thiserror::Error;

pub type DbResult<T> = Result<T, DbError>;

/// Failures raised while opening the database or running a store query.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("failed to create data directory `{path}`: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    #[error("database lock poisoned")]
    Poisoned,

    #[error("database already open at `{open}`; refusing to open `{requested}`")]
    AlreadyOpen { open: PathBuf, requested: PathBuf },

    #[error("could not locate home directory")]
    HomeDirMissing,
}
