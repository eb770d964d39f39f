pub mod files;
pub mod sqlite_store;

pub use files::{brain_db_path, brains_dir, channel_key, list_brain_channels};
pub use sqlite_store::{TransitionStore, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
