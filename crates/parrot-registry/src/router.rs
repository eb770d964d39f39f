use std::sync::Arc;

use parrot_core::config::Settings;
use parrot_core::model::GenerationResult;
use parrot_core::storage::channel_key;
use parrot_core::TokenGenerator;

use crate::registry::BrainRegistry;

/// Entry point for inbound chat lines.
///
/// Routes each line to its channel's brain and picks that channel's
/// generator: its own store, or the pooled global one.
#[derive(Debug, Clone)]
pub struct ChannelRouter {
    registry: Arc<BrainRegistry>,
}

impl ChannelRouter {
    pub fn new(registry: Arc<BrainRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<BrainRegistry> {
        &self.registry
    }

    /// Learn from one chat line and return what, if anything, to say back.
    ///
    /// The bot's own channel never gets a brain. Disabled channels and
    /// unavailable brains drop the line.
    pub fn process_message(
        &self,
        channel: &str,
        text: &str,
        sender: &str,
        bot_identity: &str,
    ) -> GenerationResult {
        let Ok(key) = channel_key(channel) else {
            return GenerationResult::default();
        };
        if key.eq_ignore_ascii_case(bot_identity) {
            return GenerationResult::default();
        }
        if !self.registry.settings().channel_stats(&key).enabled {
            tracing::trace!(channel = %key, "channel disabled, message ignored");
            return GenerationResult::default();
        }

        let Some(brain) = self.registry.get_or_create(channel) else {
            return GenerationResult::default();
        };

        let global = self.registry.global_generator();
        let generator: Option<&dyn TokenGenerator> =
            if self.registry.settings().use_global_brain(brain.channel()) {
                Some(&global)
            } else {
                None
            };

        let result = brain.process_message_with_info(text, sender, bot_identity, generator);
        if result.triggered {
            tracing::info!(
                channel = brain.channel(),
                success = result.success,
                attempts = result.attempts,
                global = result.using_global,
                failure = result.failure_reason.map(|r| r.as_str()),
                "response triggered"
            );
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parrot_core::model::FailureReason;
    use parrot_core::SettingsFile;
    use tempfile::TempDir;

    const BOT: &str = "parrotbot";

    fn setup() -> (TempDir, Arc<SettingsFile>, ChannelRouter) {
        let tmp = TempDir::new().unwrap();
        let settings = Arc::new(SettingsFile::in_memory());
        let registry = Arc::new(BrainRegistry::new(tmp.path(), settings.clone()));
        (tmp, settings, ChannelRouter::new(registry))
    }

    #[test]
    fn test_own_channel_is_ignored() {
        let (_tmp, settings, router) = setup();
        settings.set_channel_message_interval(BOT, 1);
        let result = router.process_message("#ParrotBot", "hello there friend", "viewer", BOT);
        assert_eq!(result, GenerationResult::default());
        assert!(router.registry().loaded_channels().is_empty());
        assert!(router.registry().known_channels().is_empty());
    }

    #[test]
    fn test_disabled_channel_is_ignored() {
        let (_tmp, settings, router) = setup();
        settings.set_channel_message_interval("chan", 1);
        settings.set_channel_enabled("chan", false);
        let result = router.process_message("chan", "one two three four", "viewer", BOT);
        assert!(!result.triggered);
        assert!(router.registry().loaded("chan").is_none());

        settings.set_channel_enabled("chan", true);
        assert!(router
            .process_message("chan", "one two three four", "viewer", BOT)
            .triggered);
    }

    #[test]
    fn test_local_brain_answers_by_default() {
        let (_tmp, settings, router) = setup();
        settings.set_channel_message_interval("chan", 1);
        let result = router.process_message("chan", "one two three four", "viewer", BOT);
        assert!(result.triggered);
        assert!(result.success);
        assert!(!result.using_global);
        assert_eq!(settings.channel_stats("chan").message_count, 1);
    }

    #[test]
    fn test_hash_prefixed_settings_reach_the_brain() {
        let (_tmp, settings, router) = setup();
        settings.set_channel_message_interval("#Chan", 1);
        settings.set_channel_use_global("#Chan", true);

        let result = router.process_message("chan", "one two three four", "viewer", BOT);
        assert!(result.triggered);
        assert_eq!(result.interval, 1);
        assert!(result.using_global);

        let result = router.process_message("#Chan", "five six seven eight", "viewer", BOT);
        assert!(result.triggered);
        assert_eq!(settings.channel_stats("chan").message_count, 2);
    }

    #[test]
    fn test_global_channel_draws_on_other_brains() {
        let (_tmp, settings, router) = setup();
        router
            .registry()
            .get_or_create("donor")
            .unwrap()
            .learn("donor words flow freely");
        settings.set_channel_message_interval("quiet", 2);
        settings.set_channel_use_global("quiet", true);

        let command = router.process_message("quiet", "!not learned at all", "viewer", BOT);
        assert!(!command.triggered);
        let first = router.process_message("quiet", "tiny", "viewer", BOT);
        assert!(!first.triggered);
        let second = router.process_message("quiet", "hi", "viewer", BOT);
        assert!(second.triggered);
        assert!(second.using_global);
        // The seed brain is picked at random and "quiet" itself knows nothing.
        match second.response.as_deref() {
            Some(text) => assert!("donor words flow freely".ends_with(text)),
            None => assert_eq!(second.failure_reason, Some(FailureReason::EmptyGeneration)),
        }
    }
}
