pub mod generation;
pub mod stats;
pub mod transition;

pub use generation::{FailureReason, GenerationResult, MAX_GENERATION_ATTEMPTS, MAX_RESPONSE_TOKENS};
pub use stats::{BrainStats, CleanReport, CleanWordResult, StoreStats};
pub use transition::{is_self_loop, Candidate, ContextPair, Transition, TransitionPage};
