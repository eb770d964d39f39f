use serde::{Deserialize, Serialize};

/// Row counts of one transition store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStats {
    pub unique_pairs: u64,
    pub total_entries: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrainStats {
    pub channel: String,
    pub unique_pairs: u64,
    pub total_entries: u64,
    pub message_count: u64,
    pub db_size: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanWordResult {
    pub word: String,
    pub removed: u64,
}

/// What a blacklist clean removed from one brain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanReport {
    pub channel: String,
    pub words: Vec<CleanWordResult>,
    pub total_removed: u64,
}

impl CleanReport {
    pub fn empty(channel: &str) -> Self {
        Self {
            channel: channel.to_string(),
            ..Default::default()
        }
    }
}
