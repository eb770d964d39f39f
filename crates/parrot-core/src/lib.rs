pub mod brain;
pub mod config;
pub mod error;
pub mod filter;
pub mod model;
pub mod sampling;
pub mod storage;

pub use brain::{Brain, TokenGenerator};
pub use config::{Settings, SettingsFile};
pub use error::CoreError;
pub use storage::TransitionStore;
