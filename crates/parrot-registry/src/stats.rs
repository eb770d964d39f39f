use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Read-only rollup across every brain the registry knows about.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseStats {
    pub total_transitions: u64,
    pub unique_channels: usize,
    /// Bytes on disk, summed over every brain database.
    pub total_size: u64,
    pub data_directory: PathBuf,
    pub blacklisted_words: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_with_snake_case_keys() {
        let stats = DatabaseStats {
            total_transitions: 12,
            unique_channels: 2,
            total_size: 4096,
            data_directory: PathBuf::from("/data/brains"),
            blacklisted_words: 1,
        };
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["total_transitions"], 12);
        assert_eq!(json["unique_channels"], 2);
        assert_eq!(json["data_directory"], "/data/brains");
    }
}
