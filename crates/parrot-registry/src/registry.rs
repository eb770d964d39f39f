use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use parrot_core::config::{resolve_interval, Settings};
use parrot_core::model::{BrainStats, CleanReport, TransitionPage};
use parrot_core::storage::files::{remove_brain_files, rename_brain_files};
use parrot_core::storage::{brain_db_path, brains_dir, channel_key, list_brain_channels};
use parrot_core::Brain;

use crate::error::RegistryError;
use crate::stats::DatabaseStats;

/// Lazily opened brains keyed by lowercase channel name.
///
/// Brains are created on first access and cached until removed. Every
/// database lives at `<data_dir>/brains/<channel>.db`.
pub struct BrainRegistry {
    data_dir: PathBuf,
    brains_dir: PathBuf,
    settings: Arc<dyn Settings>,
    brains: RwLock<HashMap<String, Arc<Brain>>>,
}

impl std::fmt::Debug for BrainRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrainRegistry")
            .field("brains_dir", &self.brains_dir)
            .field("loaded", &self.brains.read().len())
            .finish_non_exhaustive()
    }
}

impl BrainRegistry {
    pub fn new(data_dir: impl Into<PathBuf>, settings: Arc<dyn Settings>) -> Self {
        let data_dir = data_dir.into();
        let brains_dir = brains_dir(&data_dir);
        Self {
            data_dir,
            brains_dir,
            settings,
            brains: RwLock::new(HashMap::new()),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn brains_dir(&self) -> &Path {
        &self.brains_dir
    }

    pub fn settings(&self) -> &Arc<dyn Settings> {
        &self.settings
    }

    /// Fetch the brain for `channel`, opening it on first use.
    ///
    /// A brain that cannot be opened is logged and reported as `None`; the
    /// channel is then unavailable until a later call succeeds.
    pub fn get_or_create(&self, channel: &str) -> Option<Arc<Brain>> {
        match self.brain(channel) {
            Ok(brain) => Some(brain),
            Err(e) => {
                tracing::error!(channel, "could not open brain: {e}");
                None
            }
        }
    }

    /// Like [`get_or_create`](Self::get_or_create) but surfaces the failure.
    pub fn brain(&self, channel: &str) -> Result<Arc<Brain>, RegistryError> {
        let key = channel_key(channel)?;

        if let Some(brain) = self.brains.read().get(&key) {
            return Ok(Arc::clone(brain));
        }

        let mut brains = self.brains.write();
        // Another caller may have opened it while we waited for the lock.
        if let Some(brain) = brains.get(&key) {
            return Ok(Arc::clone(brain));
        }

        let path = brain_db_path(&self.brains_dir, &key);
        let brain = Arc::new(Brain::open(&key, &path, Arc::clone(&self.settings))?);
        tracing::info!(channel = %key, path = %path.display(), "opened brain");
        brains.insert(key, Arc::clone(&brain));
        Ok(brain)
    }

    /// Open a brain that already has data on disk or in memory. Unlike
    /// [`brain`](Self::brain) this never creates an empty database.
    pub fn existing(&self, channel: &str) -> Result<Arc<Brain>, RegistryError> {
        let key = channel_key(channel)?;
        let known = self.brains.read().contains_key(&key)
            || brain_db_path(&self.brains_dir, &key).is_file();
        if !known {
            return Err(RegistryError::NotFound { channel: key });
        }
        self.brain(&key)
    }

    /// The cached brain for `channel`, without opening anything.
    pub fn loaded(&self, channel: &str) -> Option<Arc<Brain>> {
        let key = channel_key(channel).ok()?;
        self.brains.read().get(&key).cloned()
    }

    /// Names of the brains currently held in memory, sorted.
    pub fn loaded_channels(&self) -> Vec<String> {
        let mut channels: Vec<String> = self.brains.read().keys().cloned().collect();
        channels.sort();
        channels
    }

    /// Cheap copy of the cached brains so callers can work without the map lock.
    pub(crate) fn snapshot(&self) -> Vec<Arc<Brain>> {
        self.brains.read().values().cloned().collect()
    }

    /// Every channel with a database on disk or a brain in memory.
    pub fn known_channels(&self) -> Vec<String> {
        let mut channels: BTreeSet<String> = match list_brain_channels(&self.brains_dir) {
            Ok(found) => found.into_iter().collect(),
            Err(e) => {
                tracing::warn!(dir = %self.brains_dir.display(), "could not scan brains: {e}");
                BTreeSet::new()
            }
        };
        channels.extend(self.brains.read().keys().cloned());
        channels.into_iter().collect()
    }

    /// Open every known brain. Returns how many are loaded afterwards.
    pub fn load_all(&self) -> usize {
        for channel in self.known_channels() {
            self.get_or_create(&channel);
        }
        self.brains.read().len()
    }

    /// Close and evict a brain, keeping its data on disk.
    ///
    /// Returns whether a brain was loaded.
    pub fn remove(&self, channel: &str) -> bool {
        let Ok(key) = channel_key(channel) else {
            return false;
        };
        let evicted = self.brains.write().remove(&key);
        match evicted {
            Some(brain) => {
                brain.close();
                true
            }
            None => false,
        }
    }

    /// Evict a brain and delete its database, loaded or not.
    ///
    /// Returns whether a database file was removed.
    pub fn delete(&self, channel: &str) -> Result<bool, RegistryError> {
        let key = channel_key(channel)?;
        let evicted = self.brains.write().remove(&key);
        let removed = match evicted {
            Some(brain) => brain.delete()?,
            None => remove_brain_files(&brain_db_path(&self.brains_dir, &key))?,
        };
        tracing::info!(channel = %key, removed, "deleted brain");
        Ok(removed)
    }

    /// Stats for every known channel. Brains not yet in memory are opened.
    pub fn list(&self) -> Vec<BrainStats> {
        self.known_channels()
            .iter()
            .filter_map(|channel| self.get_or_create(channel))
            .map(|brain| brain.stats())
            .collect()
    }

    pub fn erase(&self, channel: &str) -> Result<(), RegistryError> {
        self.existing(channel)?.erase()?;
        Ok(())
    }

    pub fn clean(&self, channel: &str) -> Result<CleanReport, RegistryError> {
        Ok(self.existing(channel)?.clean())
    }

    /// Clean every known brain. Only brains that lost rows are reported.
    pub fn clean_all(&self) -> Vec<CleanReport> {
        self.known_channels()
            .iter()
            .filter_map(|channel| self.get_or_create(channel))
            .map(|brain| brain.clean())
            .filter(|report| report.total_removed > 0)
            .collect()
    }

    /// Strip self-loops and foreign-script rows from every known brain.
    pub fn clean_non_ascii_all(&self) -> u64 {
        self.known_channels()
            .iter()
            .filter_map(|channel| self.get_or_create(channel))
            .map(|brain| brain.clean_non_ascii())
            .sum()
    }

    /// Compact every known brain. Returns the channels that were compacted.
    pub fn optimize_all(&self) -> Vec<String> {
        let mut optimized = Vec::new();
        for channel in self.known_channels() {
            let Some(brain) = self.get_or_create(&channel) else {
                continue;
            };
            match brain.optimize() {
                Ok(()) => optimized.push(channel),
                Err(e) => tracing::warn!(channel = %channel, "optimize failed: {e}"),
            }
        }
        optimized
    }

    /// Close every loaded brain and empty the cache.
    pub fn close_all(&self) {
        let drained: Vec<Arc<Brain>> = self.brains.write().drain().map(|(_, b)| b).collect();
        for brain in &drained {
            brain.close();
        }
        tracing::debug!(closed = drained.len(), "closed all brains");
    }

    /// Messages left before the channel's next response, and its interval.
    ///
    /// A channel with no loaded brain reports a full interval.
    pub fn countdown(&self, channel: &str) -> (u32, u32) {
        let key = channel_key(channel).unwrap_or_else(|_| channel.to_lowercase());
        let interval = resolve_interval(self.settings.channel_message_interval(&key));
        match self.brains.read().get(&key) {
            Some(brain) => (interval.saturating_sub(brain.message_counter()), interval),
            None => (interval, interval),
        }
    }

    /// The last response sent in a loaded channel.
    pub fn last_message(&self, channel: &str) -> Option<String> {
        self.loaded(channel)?.last_message()
    }

    /// Move a channel's brain and settings to a new name.
    ///
    /// Returns whether a database was moved. The target must not already
    /// have a database.
    pub fn rename(&self, old: &str, new: &str) -> Result<bool, RegistryError> {
        let old_key = channel_key(old)?;
        let new_key = channel_key(new)?;
        if old_key == new_key {
            return Ok(false);
        }

        let to = brain_db_path(&self.brains_dir, &new_key);
        if to.exists() || self.brains.read().contains_key(&new_key) {
            return Err(RegistryError::AlreadyExists { channel: new_key });
        }

        self.remove(&old_key);
        let moved = rename_brain_files(&brain_db_path(&self.brains_dir, &old_key), &to)?;
        self.settings.rename_channel(&old_key, &new_key);
        tracing::info!(from = %old_key, to = %new_key, moved, "renamed channel");
        Ok(moved)
    }

    pub fn transitions(
        &self,
        channel: &str,
        search: &str,
        page: u32,
        page_size: u32,
    ) -> Result<TransitionPage, RegistryError> {
        Ok(self.existing(channel)?.transitions(search, page, page_size)?)
    }

    pub fn delete_transition(
        &self,
        channel: &str,
        word1: &str,
        word2: &str,
        next_word: &str,
    ) -> Result<bool, RegistryError> {
        Ok(self
            .existing(channel)?
            .delete_transition(word1, word2, next_word)?)
    }

    pub fn set_transition_count(
        &self,
        channel: &str,
        word1: &str,
        word2: &str,
        next_word: &str,
        count: i64,
    ) -> Result<bool, RegistryError> {
        Ok(self
            .existing(channel)?
            .set_transition_count(word1, word2, next_word, count)?)
    }

    /// Rollup across every known brain plus the blacklist size.
    pub fn stats(&self) -> DatabaseStats {
        let brains = self.list();
        DatabaseStats {
            total_transitions: brains.iter().map(|b| b.total_entries).sum(),
            unique_channels: brains.len(),
            total_size: brains.iter().map(|b| b.db_size).sum(),
            data_directory: self.brains_dir.clone(),
            blacklisted_words: self.settings.blacklisted_words().len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parrot_core::SettingsFile;
    use tempfile::TempDir;

    fn setup() -> (TempDir, Arc<SettingsFile>, BrainRegistry) {
        let tmp = TempDir::new().unwrap();
        let settings = Arc::new(SettingsFile::in_memory());
        let registry = BrainRegistry::new(tmp.path(), settings.clone());
        (tmp, settings, registry)
    }

    #[derive(Clone, Default)]
    struct LogBuffer(Arc<parking_lot::Mutex<Vec<u8>>>);

    impl std::io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_brain_open_and_close_log_at_info() {
        let (_tmp, _settings, registry) = setup();
        let logs = LogBuffer::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        tracing::subscriber::with_default(subscriber, || {
            registry.get_or_create("chan").unwrap();
            assert!(registry.remove("chan"));
        });

        let out = String::from_utf8(logs.0.lock().clone()).unwrap();
        assert!(out.contains("opened brain"), "{out}");
        assert!(out.contains("closed brain"), "{out}");
        assert!(out.lines().all(|l| l.contains("INFO")), "{out}");
    }

    #[test]
    fn test_get_or_create_is_case_insensitive() {
        let (_tmp, _settings, registry) = setup();
        let a = registry.get_or_create("SomeChannel").unwrap();
        let b = registry.get_or_create("somechannel").unwrap();
        let c = registry.get_or_create("#somechannel").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert!(Arc::ptr_eq(&a, &c));
        assert_eq!(registry.loaded_channels(), vec!["somechannel".to_string()]);
        assert!(registry.brains_dir().join("somechannel.db").exists());
    }

    #[test]
    fn test_concurrent_first_access_creates_one_brain() {
        let (_tmp, _settings, registry) = setup();
        let brains: Vec<Arc<Brain>> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| s.spawn(|| registry.get_or_create("race").unwrap()))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        assert!(brains.iter().all(|b| Arc::ptr_eq(b, &brains[0])));
        assert_eq!(registry.loaded_channels().len(), 1);
    }

    #[test]
    fn test_unopenable_brain_is_unavailable() {
        let (tmp, _settings, registry) = setup();
        // A directory where the database file should be.
        std::fs::create_dir_all(tmp.path().join("brains").join("broken.db")).unwrap();
        assert!(registry.get_or_create("broken").is_none());
        assert!(registry.get_or_create("../escape").is_none());
        assert!(registry.loaded_channels().is_empty());
    }

    #[test]
    fn test_existing_never_creates() {
        let (_tmp, _settings, registry) = setup();
        assert!(matches!(
            registry.existing("ghost"),
            Err(RegistryError::NotFound { .. })
        ));
        assert!(registry.known_channels().is_empty());

        registry.get_or_create("real").unwrap();
        registry.close_all();
        assert_eq!(registry.existing("REAL").unwrap().channel(), "real");
    }

    #[test]
    fn test_remove_keeps_data() {
        let (_tmp, _settings, registry) = setup();
        registry.get_or_create("chan").unwrap().learn("a b c");
        assert!(registry.remove("chan"));
        assert!(!registry.remove("chan"));
        assert!(registry.loaded("chan").is_none());

        let brain = registry.get_or_create("chan").unwrap();
        assert_eq!(brain.stats().total_entries, 1);
    }

    #[test]
    fn test_delete_loaded_and_unloaded() {
        let (_tmp, _settings, registry) = setup();
        registry.get_or_create("loaded").unwrap().learn("a b c");
        registry.get_or_create("cold").unwrap().learn("a b c");
        registry.remove("cold");

        assert!(registry.delete("loaded").unwrap());
        assert!(registry.delete("cold").unwrap());
        assert!(!registry.delete("never").unwrap());
        assert!(registry.known_channels().is_empty());
    }

    #[test]
    fn test_list_scans_disk() {
        let (_tmp, _settings, registry) = setup();
        registry.get_or_create("alpha").unwrap().learn("a b c d");
        registry.get_or_create("beta").unwrap().learn("x y z");
        registry.close_all();
        assert!(registry.loaded_channels().is_empty());

        let stats = registry.list();
        let names: Vec<&str> = stats.iter().map(|s| s.channel.as_str()).collect();
        assert_eq!(names, vec!["alpha", "beta"]);
        assert_eq!(stats[0].total_entries, 2);
        assert_eq!(stats[1].total_entries, 1);
        assert_eq!(registry.loaded_channels().len(), 2);

        registry.close_all();
        assert_eq!(registry.load_all(), 2);
    }

    #[test]
    fn test_clean_all_reports_only_changed_brains() {
        let (_tmp, settings, registry) = setup();
        registry.get_or_create("dirty").unwrap().learn("say bad things");
        registry.get_or_create("clean").unwrap().learn("say good things");
        settings.add_blacklisted_word("bad");

        let reports = registry.clean_all();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].channel, "dirty");
        assert_eq!(reports[0].total_removed, 1);
    }

    #[test]
    fn test_clean_non_ascii_all_sums() {
        let (_tmp, _settings, registry) = setup();
        registry.get_or_create("one").unwrap().learn("caf\u{00E9} au lait");
        registry.get_or_create("two").unwrap().learn("na\u{00EF}ve idea here");
        registry.get_or_create("three").unwrap().learn("plain old words");
        assert_eq!(registry.clean_non_ascii_all(), 2);
    }

    #[test]
    fn test_optimize_and_close_all() {
        let (_tmp, _settings, registry) = setup();
        let brain = registry.get_or_create("chan").unwrap();
        brain.learn("a b c");
        assert_eq!(registry.optimize_all(), vec!["chan".to_string()]);

        registry.close_all();
        assert!(!brain.is_open());
        assert!(registry.loaded_channels().is_empty());
    }

    #[test]
    fn test_countdown() {
        let (_tmp, settings, registry) = setup();
        settings.set_channel_message_interval("chan", 4);
        assert_eq!(registry.countdown("chan"), (4, 4));

        let brain = registry.get_or_create("chan").unwrap();
        brain.process_message("one two three", "viewer", "bot", None);
        assert_eq!(registry.countdown("CHAN"), (3, 4));
    }

    #[test]
    fn test_rename_moves_brain_and_settings() {
        let (_tmp, settings, registry) = setup();
        settings.set_channel_use_global("oldname", true);
        registry.get_or_create("oldname").unwrap().learn("a b c");

        assert!(registry.rename("OldName", "NewName").unwrap());
        assert!(registry.loaded("oldname").is_none());
        assert!(settings.use_global_brain("newname"));
        assert_eq!(registry.known_channels(), vec!["newname".to_string()]);
        assert_eq!(
            registry.get_or_create("newname").unwrap().stats().total_entries,
            1
        );
    }

    #[test]
    fn test_rename_refuses_to_overwrite() {
        let (_tmp, _settings, registry) = setup();
        registry.get_or_create("a").unwrap();
        registry.get_or_create("b").unwrap();
        assert!(matches!(
            registry.rename("a", "b"),
            Err(RegistryError::AlreadyExists { .. })
        ));
        assert!(registry.loaded("a").is_some());
    }

    #[test]
    fn test_transition_editing_through_registry() {
        let (_tmp, _settings, registry) = setup();
        registry.get_or_create("chan").unwrap().learn("a b c");
        assert!(registry.set_transition_count("chan", "a", "b", "c", 5).unwrap());
        let page = registry.transitions("chan", "", 1, 10).unwrap();
        assert_eq!(page.transitions[0].count, 5);
        assert!(registry.delete_transition("chan", "a", "b", "c").unwrap());
        assert_eq!(registry.transitions("chan", "", 1, 10).unwrap().total, 0);
    }

    #[test]
    fn test_database_stats() {
        let (tmp, settings, registry) = setup();
        settings.add_blacklisted_word("one");
        settings.add_blacklisted_word("two");
        registry.get_or_create("alpha").unwrap().learn("a b c d");
        registry.get_or_create("beta").unwrap().learn("x y z");

        let stats = registry.stats();
        assert_eq!(stats.total_transitions, 3);
        assert_eq!(stats.unique_channels, 2);
        assert!(stats.total_size > 0);
        assert_eq!(stats.data_directory, tmp.path().join("brains"));
        assert_eq!(stats.blacklisted_words, 2);
    }
}
