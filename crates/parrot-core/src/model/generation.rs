use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Longest output a triggered response may sample, in tokens after the seed pair.
pub const MAX_RESPONSE_TOKENS: usize = 20;

/// Attempts made before a triggered response is abandoned.
pub const MAX_GENERATION_ATTEMPTS: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    EmptyGeneration,
    BlacklistedWord,
    Unknown,
}

impl FailureReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureReason::EmptyGeneration => "empty_generation",
            FailureReason::BlacklistedWord => "blacklisted_word",
            FailureReason::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of processing one inbound chat message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationResult {
    /// The counter reached the interval and generation ran.
    pub triggered: bool,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    pub attempts: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<FailureReason>,
    pub counter_before: u32,
    /// Counter after this message, 0 when a response was triggered.
    pub counter: u32,
    pub interval: u32,
    pub using_global: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<DateTime<Utc>>,
}

impl GenerationResult {
    /// The text to send, or "" for silence.
    pub fn response_text(&self) -> &str {
        self.response.as_deref().unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_reason_codes() {
        assert_eq!(FailureReason::EmptyGeneration.as_str(), "empty_generation");
        let json = serde_json::to_string(&FailureReason::BlacklistedWord).unwrap();
        assert_eq!(json, "\"blacklisted_word\"");
    }

    #[test]
    fn test_default_result_is_silent() {
        let result = GenerationResult::default();
        assert!(!result.triggered);
        assert_eq!(result.response_text(), "");
        let json = serde_json::to_string(&result).unwrap();
        assert!(!json.contains("failure_reason"));
    }
}
