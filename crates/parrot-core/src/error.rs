use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("SQLite operation failed: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Brain store for #{channel} is closed")]
    StoreClosed { channel: String },

    #[error("Invalid channel name: {0:?}")]
    InvalidChannel(String),

    #[error("Invalid settings file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
