pub mod error;
pub mod global;
pub mod registry;
pub mod router;
pub mod stats;

pub use error::RegistryError;
pub use global::GlobalGenerator;
pub use registry::BrainRegistry;
pub use router::ChannelRouter;
pub use stats::DatabaseStats;
