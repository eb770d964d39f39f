//! The per-channel learning and generation unit.

mod generator;

pub use generator::TokenGenerator;

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use parking_lot::RwLock;
use rand::Rng;

use crate::config::{resolve_interval, Settings};
use crate::error::CoreError;
use crate::filter;
use crate::model::{
    is_self_loop, BrainStats, Candidate, CleanReport, CleanWordResult, ContextPair,
    FailureReason, GenerationResult, TransitionPage, MAX_GENERATION_ATTEMPTS, MAX_RESPONSE_TOKENS,
};
use crate::storage::files::remove_brain_files;
use crate::storage::TransitionStore;

struct BrainState {
    /// `None` once the brain has been closed or deleted.
    store: Option<TransitionStore>,
    msg_counter: u32,
}

/// One channel's Markov chain plus its response policy.
///
/// A single read/write lock guards both the counter and the store: stats and
/// generation take it shared, learning and maintenance take it exclusively.
pub struct Brain {
    channel: String,
    settings: Arc<dyn Settings>,
    state: RwLock<BrainState>,
}

impl std::fmt::Debug for Brain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Brain")
            .field("channel", &self.channel)
            .finish_non_exhaustive()
    }
}

impl Brain {
    /// Open the brain stored at `db_path`, restoring its message counter.
    pub fn open(
        channel: &str,
        db_path: &Path,
        settings: Arc<dyn Settings>,
    ) -> Result<Self, CoreError> {
        let store = TransitionStore::open(db_path, channel)?;
        Ok(Self::with_store(channel, store, settings))
    }

    /// A brain whose transitions live only as long as it does.
    pub fn in_memory(channel: &str, settings: Arc<dyn Settings>) -> Result<Self, CoreError> {
        let store = TransitionStore::open_in_memory(channel)?;
        Ok(Self::with_store(channel, store, settings))
    }

    fn with_store(channel: &str, store: TransitionStore, settings: Arc<dyn Settings>) -> Self {
        let msg_counter = store.load_counter().unwrap_or_else(|e| {
            tracing::warn!(channel, "could not load message counter: {e}");
            0
        });
        Self {
            channel: channel.to_lowercase(),
            settings,
            state: RwLock::new(BrainState {
                store: Some(store),
                msg_counter,
            }),
        }
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub fn is_open(&self) -> bool {
        self.state.read().store.is_some()
    }

    pub fn message_counter(&self) -> u32 {
        self.state.read().msg_counter
    }

    /// Effective response interval for this channel.
    pub fn interval(&self) -> u32 {
        resolve_interval(self.settings.channel_message_interval(&self.channel))
    }

    /// The last response this brain produced, if any.
    pub fn last_message(&self) -> Option<String> {
        let state = self.state.read();
        let store = state.store.as_ref()?;
        store.last_message().unwrap_or_else(|e| {
            tracing::warn!(channel = %self.channel, "could not read last message: {e}");
            None
        })
    }

    /// Learn from a chat line and maybe answer. Returns "" for silence.
    pub fn process_message(
        &self,
        text: &str,
        sender: &str,
        bot_identity: &str,
        generator: Option<&dyn TokenGenerator>,
    ) -> String {
        self.process_message_with_info(text, sender, bot_identity, generator)
            .response
            .unwrap_or_default()
    }

    /// Learn from a chat line and report exactly what happened.
    ///
    /// With no `generator` the brain answers from its own store.
    pub fn process_message_with_info(
        &self,
        text: &str,
        sender: &str,
        bot_identity: &str,
        generator: Option<&dyn TokenGenerator>,
    ) -> GenerationResult {
        let mut result = GenerationResult::default();

        if filter::is_command(text)
            || sender.eq_ignore_ascii_case(bot_identity)
            || self.channel.eq_ignore_ascii_case(bot_identity)
            || self.settings.is_blacklisted_user(sender)
        {
            return result;
        }
        let blacklist = self.settings.blacklisted_words();
        if !filter::is_learnable(text, &blacklist) {
            return result;
        }

        let text = filter::normalize_unicode_punctuation(text);
        let interval = self.interval();

        let triggered = {
            let mut state = self.state.write();
            let Some(store) = state.store.as_ref() else {
                tracing::warn!(channel = %self.channel, "message dropped: brain is closed");
                return result;
            };
            learn_into(store, &self.channel, &text);

            state.msg_counter += 1;
            result.counter_before = state.msg_counter;
            result.interval = interval;
            let triggered = state.msg_counter >= interval;
            if triggered {
                state.msg_counter = 0;
            }
            result.counter = state.msg_counter;

            if let Some(store) = state.store.as_ref() {
                if let Err(e) = store.save_counter(state.msg_counter) {
                    tracing::warn!(channel = %self.channel, "could not persist counter: {e}");
                }
            }
            triggered
        };
        self.settings.increment_channel_messages(&self.channel);

        if !triggered {
            return result;
        }

        result.triggered = true;
        result.using_global = generator.map(|g| g.is_global()).unwrap_or(false);
        let generator: &dyn TokenGenerator = generator.unwrap_or(self);

        let mut last_failure = None;
        for attempt in 1..=MAX_GENERATION_ATTEMPTS {
            result.attempts = attempt;
            let response = generator.generate(MAX_RESPONSE_TOKENS);
            if response.is_empty() {
                last_failure = Some(FailureReason::EmptyGeneration);
                continue;
            }
            if !filter::is_sendable(&response, &self.settings.blacklisted_words()) {
                last_failure = Some(FailureReason::BlacklistedWord);
                continue;
            }

            self.save_last_message(&response);
            result.success = true;
            result.response = Some(response);
            result.generated_at = Some(Utc::now());
            return result;
        }

        result.failure_reason = Some(last_failure.unwrap_or(FailureReason::Unknown));
        result
    }

    fn save_last_message(&self, message: &str) {
        let state = self.state.read();
        if let Some(store) = state.store.as_ref() {
            if let Err(e) = store.save_last_message(message) {
                tracing::warn!(channel = %self.channel, "could not persist last message: {e}");
            }
        }
    }

    /// Record every consecutive token triple of `text`.
    ///
    /// Fewer than three tokens is a no-op. Triples of one repeated token are
    /// skipped so generation can never loop on a single word.
    pub fn learn(&self, text: &str) {
        let state = self.state.write();
        if let Some(store) = state.store.as_ref() {
            learn_into(store, &self.channel, text);
        }
    }

    /// Random walk over this brain's transitions.
    pub fn generate(&self, max_tokens: usize) -> String {
        self.generate_with_rng(&mut rand::thread_rng(), max_tokens)
    }

    pub fn generate_with_rng<R: Rng>(&self, rng: &mut R, max_tokens: usize) -> String {
        let state = self.state.read();
        let Some(store) = state.store.as_ref() else {
            return String::new();
        };

        let mut ctx = match store.sample_random_context(rng) {
            Ok(Some(ctx)) => ctx,
            Ok(None) => return String::new(),
            Err(e) => {
                tracing::warn!(channel = %self.channel, "could not pick a starting pair: {e}");
                return String::new();
            }
        };

        let mut words = vec![ctx.word1.clone(), ctx.word2.clone()];
        for _ in 0..max_tokens {
            match store.sample_next_token(rng, &ctx.word1, &ctx.word2) {
                Ok(Some(next)) => {
                    ctx.advance(&next);
                    words.push(next);
                }
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!(channel = %self.channel, "generation cut short: {e}");
                    break;
                }
            }
        }
        words.join(" ")
    }

    /// A random starting pair, or `None` if nothing has been learned.
    pub fn random_context<R: Rng>(&self, rng: &mut R) -> Option<ContextPair> {
        let state = self.state.read();
        let store = state.store.as_ref()?;
        store.sample_random_context(rng).unwrap_or_else(|e| {
            tracing::warn!(channel = %self.channel, "could not pick a starting pair: {e}");
            None
        })
    }

    /// Next-token candidates for a context. Storage failures read as none.
    pub fn candidates(&self, word1: &str, word2: &str) -> Vec<Candidate> {
        let state = self.state.read();
        let Some(store) = state.store.as_ref() else {
            return Vec::new();
        };
        store.candidates(word1, word2).unwrap_or_else(|e| {
            tracing::warn!(channel = %self.channel, "could not read candidates: {e}");
            Vec::new()
        })
    }

    pub fn stats(&self) -> BrainStats {
        let state = self.state.read();
        let mut stats = BrainStats {
            channel: self.channel.clone(),
            message_count: self.settings.channel_stats(&self.channel).message_count,
            ..Default::default()
        };
        if let Some(store) = state.store.as_ref() {
            match store.stats() {
                Ok(s) => {
                    stats.unique_pairs = s.unique_pairs;
                    stats.total_entries = s.total_entries;
                }
                Err(e) => tracing::warn!(channel = %self.channel, "could not read stats: {e}"),
            }
            stats.db_size = store.file_size();
        }
        stats
    }

    /// Remove transitions touching any blacklisted word or phrase.
    ///
    /// Single words match as a substring of any token. Phrases match each
    /// adjacent word pair of the phrase across neighbouring token positions.
    pub fn clean(&self) -> CleanReport {
        let mut report = CleanReport::empty(&self.channel);
        let blacklist = self.settings.blacklisted_words();
        if blacklist.is_empty() {
            return report;
        }

        let state = self.state.write();
        let Some(store) = state.store.as_ref() else {
            return report;
        };

        for entry in &blacklist {
            let words: Vec<&str> = entry.split_whitespace().collect();
            let removed = if words.len() >= 2 {
                words
                    .windows(2)
                    .map(|pair| {
                        store.purge_adjacent(pair[0], pair[1]).unwrap_or_else(|e| {
                            tracing::warn!(channel = %self.channel, phrase = %entry, "clean failed: {e}");
                            0
                        })
                    })
                    .sum::<u64>()
            } else if let Some(word) = words.first() {
                store.purge_containing(word).unwrap_or_else(|e| {
                    tracing::warn!(channel = %self.channel, word = %entry, "clean failed: {e}");
                    0
                })
            } else {
                0
            };

            if removed > 0 {
                report.words.push(CleanWordResult {
                    word: entry.clone(),
                    removed,
                });
                report.total_removed += removed;
            }
        }

        if report.total_removed > 0 {
            tracing::info!(
                channel = %self.channel,
                removed = report.total_removed,
                "cleaned blacklisted transitions"
            );
        }
        report
    }

    /// Remove self-loops and transitions holding non-ASCII, non-emoji tokens.
    pub fn clean_non_ascii(&self) -> u64 {
        let state = self.state.write();
        let Some(store) = state.store.as_ref() else {
            return 0;
        };

        let removed = store.purge_matching(|t| {
            t.is_self_loop() || t.tokens().iter().any(|w| filter::contains_non_ascii(w))
        });
        match removed {
            Ok(rows) => {
                for t in &rows {
                    if t.is_self_loop() {
                        tracing::info!(
                            channel = %self.channel,
                            "removed loop transition: {:?} -> {:?} -> {:?}",
                            t.word1, t.word2, t.next_word
                        );
                    } else {
                        let bad: Vec<&str> = t
                            .tokens()
                            .into_iter()
                            .filter(|w| filter::contains_non_ascii(w))
                            .collect();
                        tracing::info!(
                            channel = %self.channel,
                            "removed non-ASCII transition: {:?} -> {:?} -> {:?} (bad: {bad:?})",
                            t.word1, t.word2, t.next_word
                        );
                    }
                }
                rows.len() as u64
            }
            Err(e) => {
                tracing::warn!(channel = %self.channel, "non-ASCII clean failed: {e}");
                0
            }
        }
    }

    /// Drop every transition and reset the counter; the database stays.
    pub fn erase(&self) -> Result<(), CoreError> {
        let mut state = self.state.write();
        let store = self.open_store(&state)?;
        store.erase()?;
        store.vacuum()?;
        state.msg_counter = 0;
        tracing::info!(channel = %self.channel, "erased brain");
        Ok(())
    }

    /// Close the store and remove its files. Irreversible.
    ///
    /// Returns whether a database file was removed.
    pub fn delete(&self) -> Result<bool, CoreError> {
        let mut state = self.state.write();
        let Some(store) = state.store.take() else {
            return Ok(false);
        };
        state.msg_counter = 0;
        let path = store.path().map(Path::to_path_buf);
        drop(store);

        let removed = match path {
            Some(path) => remove_brain_files(&path)?,
            None => false,
        };
        tracing::info!(channel = %self.channel, "deleted brain");
        Ok(removed)
    }

    /// Compact the database. No semantic effect.
    pub fn optimize(&self) -> Result<(), CoreError> {
        let state = self.state.write();
        self.open_store(&state)?.vacuum()
    }

    /// Release the database handle, keeping its data on disk.
    pub fn close(&self) {
        if self.state.write().store.take().is_some() {
            tracing::info!(channel = %self.channel, "closed brain");
        }
    }

    pub fn transitions(
        &self,
        search: &str,
        page: u32,
        page_size: u32,
    ) -> Result<TransitionPage, CoreError> {
        let state = self.state.read();
        self.open_store(&state)?
            .transitions_page(search, page, page_size)
    }

    /// Returns whether the transition existed.
    pub fn delete_transition(
        &self,
        word1: &str,
        word2: &str,
        next_word: &str,
    ) -> Result<bool, CoreError> {
        let state = self.state.write();
        self.open_store(&state)?
            .delete_transition(word1, word2, next_word)
    }

    /// Overwrite a transition's count; below 1 deletes it.
    pub fn set_transition_count(
        &self,
        word1: &str,
        word2: &str,
        next_word: &str,
        count: i64,
    ) -> Result<bool, CoreError> {
        let state = self.state.write();
        self.open_store(&state)?
            .set_transition_count(word1, word2, next_word, count)
    }

    fn open_store<'a>(&self, state: &'a BrainState) -> Result<&'a TransitionStore, CoreError> {
        state.store.as_ref().ok_or_else(|| CoreError::StoreClosed {
            channel: self.channel.clone(),
        })
    }
}

impl TokenGenerator for Brain {
    fn generate(&self, max_tokens: usize) -> String {
        Brain::generate(self, max_tokens)
    }
}

fn learn_into(store: &TransitionStore, channel: &str, text: &str) {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    if tokens.len() < 3 {
        return;
    }
    let triples: Vec<(&str, &str, &str)> = tokens
        .windows(3)
        .map(|w| (w[0], w[1], w[2]))
        .filter(|(a, b, c)| !is_self_loop(a, b, c))
        .collect();
    if triples.is_empty() {
        return;
    }
    match store.record_transitions(&triples) {
        Ok(()) => tracing::debug!(channel, learned = triples.len(), "learned message"),
        Err(e) => tracing::warn!(channel, "could not learn message: {e}"),
    }
}
