use parrot_core::error::CoreError;

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Core error: {0}")]
    Core(#[from] CoreError),

    #[error("No brain found for #{channel}")]
    NotFound { channel: String },

    #[error("Brain for #{channel} already exists")]
    AlreadyExists { channel: String },
}
