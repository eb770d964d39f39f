use serde::{Deserialize, Serialize};

/// A learned `(word1, word2) -> next_word` fact with its observation count.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Transition {
    pub word1: String,
    pub word2: String,
    pub next_word: String,
    pub count: u64,
}

impl Transition {
    pub fn new(word1: &str, word2: &str, next_word: &str, count: u64) -> Self {
        Self {
            word1: word1.to_string(),
            word2: word2.to_string(),
            next_word: next_word.to_string(),
            count,
        }
    }

    /// All three tokens are identical.
    pub fn is_self_loop(&self) -> bool {
        is_self_loop(&self.word1, &self.word2, &self.next_word)
    }

    pub fn tokens(&self) -> [&str; 3] {
        [&self.word1, &self.word2, &self.next_word]
    }
}

pub fn is_self_loop(word1: &str, word2: &str, next_word: &str) -> bool {
    word1 == word2 && word2 == next_word
}

/// The two-token window that predicts the next token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContextPair {
    pub word1: String,
    pub word2: String,
}

impl ContextPair {
    pub fn new(word1: impl Into<String>, word2: impl Into<String>) -> Self {
        Self {
            word1: word1.into(),
            word2: word2.into(),
        }
    }

    /// Slide the window forward by one token.
    pub fn advance(&mut self, next: &str) {
        self.word1 = std::mem::replace(&mut self.word2, next.to_string());
    }
}

/// One weighted candidate for the next token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub token: String,
    pub count: u64,
}

/// One page of the admin transition listing, most frequent first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransitionPage {
    pub transitions: Vec<Transition>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_self_loop() {
        assert!(Transition::new("go", "go", "go", 1).is_self_loop());
        assert!(!Transition::new("go", "go", "Go", 1).is_self_loop());
        assert!(!Transition::new("a", "b", "c", 1).is_self_loop());
    }

    #[test]
    fn test_context_advance() {
        let mut ctx = ContextPair::new("the", "quick");
        ctx.advance("brown");
        assert_eq!(ctx, ContextPair::new("quick", "brown"));
    }
}
