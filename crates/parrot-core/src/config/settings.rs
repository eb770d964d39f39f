use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::storage::channel_key;

pub const DEFAULT_MESSAGE_INTERVAL: u32 = 35;
pub const MIN_MESSAGE_INTERVAL: u32 = 1;
pub const MAX_MESSAGE_INTERVAL: u32 = 100;

/// Map a stored interval to an effective one. Zero means "unset".
pub fn resolve_interval(raw: u32) -> u32 {
    if raw == 0 {
        DEFAULT_MESSAGE_INTERVAL
    } else {
        raw.clamp(MIN_MESSAGE_INTERVAL, MAX_MESSAGE_INTERVAL)
    }
}

/// Channel entries share the brain storage key, so `#Chan` and `chan`
/// address the same settings. Names that are not valid keys are only lowercased.
fn channel_entry_key(channel: &str) -> String {
    channel_key(channel).unwrap_or_else(|_| channel.to_lowercase())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelStats {
    pub message_count: u64,
    pub enabled: bool,
}

impl Default for ChannelStats {
    fn default() -> Self {
        Self {
            message_count: 0,
            enabled: true,
        }
    }
}

/// Configuration capability consumed by brains and the registry.
///
/// Besides message counting and renames the core only reads through this
/// trait; how values are persisted is up to the implementor.
pub trait Settings: Send + Sync {
    fn blacklisted_words(&self) -> Vec<String>;

    fn is_blacklisted_word(&self, token: &str) -> bool {
        let token = token.to_lowercase();
        self.blacklisted_words()
            .iter()
            .any(|w| w.to_lowercase() == token)
    }

    fn is_blacklisted_user(&self, name: &str) -> bool;

    /// Global default interval, already resolved to [1,100].
    fn message_interval(&self) -> u32;

    /// Per-channel interval, falling back to [`Settings::message_interval`].
    fn channel_message_interval(&self, channel: &str) -> u32;

    fn use_global_brain(&self, _channel: &str) -> bool {
        false
    }

    fn increment_channel_messages(&self, channel: &str);

    fn channel_stats(&self, channel: &str) -> ChannelStats;

    /// Move a channel's settings to a new name. Existing settings under the
    /// new name are replaced.
    fn rename_channel(&self, old: &str, new: &str);
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelSettings {
    /// 0 means "use the global interval".
    #[serde(default)]
    pub message_interval: u32,
    #[serde(default)]
    pub use_global_brain: bool,
    #[serde(default)]
    pub message_count: u64,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl Default for ChannelSettings {
    fn default() -> Self {
        Self {
            message_interval: 0,
            use_global_brain: false,
            message_count: 0,
            enabled: true,
        }
    }
}

/// On-disk shape of `settings.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SettingsData {
    #[serde(default)]
    pub message_interval: u32,
    #[serde(default)]
    pub blacklisted_words: BTreeSet<String>,
    #[serde(default)]
    pub blacklisted_users: BTreeSet<String>,
    #[serde(default)]
    pub channels: BTreeMap<String, ChannelSettings>,
}

/// JSON-file backed [`Settings`]. Mutations stay in memory until [`save`](Self::save).
#[derive(Debug)]
pub struct SettingsFile {
    path: Option<PathBuf>,
    data: RwLock<SettingsData>,
}

impl SettingsFile {
    /// Settings that are never written anywhere.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            data: RwLock::new(SettingsData::default()),
        }
    }

    /// Read settings from `path`. A missing file yields defaults.
    pub fn load(path: &Path) -> Result<Self, CoreError> {
        let data = if path.exists() {
            let raw = std::fs::read_to_string(path)?;
            if raw.trim().is_empty() {
                SettingsData::default()
            } else {
                serde_json::from_str(&raw)?
            }
        } else {
            SettingsData::default()
        };
        Ok(Self {
            path: Some(path.to_path_buf()),
            data: RwLock::new(data),
        })
    }

    pub fn save(&self) -> Result<(), CoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&*self.data.read())?;
        let mut tmp = path.as_os_str().to_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn snapshot(&self) -> SettingsData {
        self.data.read().clone()
    }

    /// Returns false if the word was already present.
    pub fn add_blacklisted_word(&self, word: &str) -> bool {
        let word = word.trim().to_lowercase();
        if word.is_empty() {
            return false;
        }
        self.data.write().blacklisted_words.insert(word)
    }

    pub fn remove_blacklisted_word(&self, word: &str) -> bool {
        self.data
            .write()
            .blacklisted_words
            .remove(&word.trim().to_lowercase())
    }

    pub fn blacklisted_users(&self) -> Vec<String> {
        self.data.read().blacklisted_users.iter().cloned().collect()
    }

    pub fn add_blacklisted_user(&self, user: &str) -> bool {
        let user = user.trim().to_lowercase();
        if user.is_empty() {
            return false;
        }
        self.data.write().blacklisted_users.insert(user)
    }

    pub fn remove_blacklisted_user(&self, user: &str) -> bool {
        self.data
            .write()
            .blacklisted_users
            .remove(&user.trim().to_lowercase())
    }

    pub fn set_message_interval(&self, interval: u32) {
        self.data.write().message_interval =
            interval.clamp(MIN_MESSAGE_INTERVAL, MAX_MESSAGE_INTERVAL);
    }

    pub fn set_channel_message_interval(&self, channel: &str, interval: u32) {
        let mut data = self.data.write();
        data.channels
            .entry(channel_entry_key(channel))
            .or_default()
            .message_interval = interval.clamp(MIN_MESSAGE_INTERVAL, MAX_MESSAGE_INTERVAL);
    }

    pub fn set_channel_use_global(&self, channel: &str, use_global: bool) {
        let mut data = self.data.write();
        data.channels
            .entry(channel_entry_key(channel))
            .or_default()
            .use_global_brain = use_global;
    }

    pub fn set_channel_enabled(&self, channel: &str, enabled: bool) {
        let mut data = self.data.write();
        data.channels
            .entry(channel_entry_key(channel))
            .or_default()
            .enabled = enabled;
    }
}

impl Settings for SettingsFile {
    fn blacklisted_words(&self) -> Vec<String> {
        self.data.read().blacklisted_words.iter().cloned().collect()
    }

    fn is_blacklisted_word(&self, token: &str) -> bool {
        self.data
            .read()
            .blacklisted_words
            .contains(&token.to_lowercase())
    }

    fn is_blacklisted_user(&self, name: &str) -> bool {
        self.data
            .read()
            .blacklisted_users
            .contains(&name.to_lowercase())
    }

    fn message_interval(&self) -> u32 {
        resolve_interval(self.data.read().message_interval)
    }

    fn channel_message_interval(&self, channel: &str) -> u32 {
        let raw = self
            .data
            .read()
            .channels
            .get(&channel_entry_key(channel))
            .map(|c| c.message_interval)
            .unwrap_or(0);
        if raw == 0 {
            self.message_interval()
        } else {
            resolve_interval(raw)
        }
    }

    fn use_global_brain(&self, channel: &str) -> bool {
        self.data
            .read()
            .channels
            .get(&channel_entry_key(channel))
            .map(|c| c.use_global_brain)
            .unwrap_or(false)
    }

    fn increment_channel_messages(&self, channel: &str) {
        let mut data = self.data.write();
        data.channels
            .entry(channel_entry_key(channel))
            .or_default()
            .message_count += 1;
    }

    fn channel_stats(&self, channel: &str) -> ChannelStats {
        self.data
            .read()
            .channels
            .get(&channel_entry_key(channel))
            .map(|c| ChannelStats {
                message_count: c.message_count,
                enabled: c.enabled,
            })
            .unwrap_or_default()
    }

    fn rename_channel(&self, old: &str, new: &str) {
        let mut data = self.data.write();
        if let Some(entry) = data.channels.remove(&channel_entry_key(old)) {
            data.channels.insert(channel_entry_key(new), entry);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_interval() {
        assert_eq!(resolve_interval(0), 35);
        assert_eq!(resolve_interval(1), 1);
        assert_eq!(resolve_interval(50), 50);
        assert_eq!(resolve_interval(500), 100);
    }

    #[test]
    fn test_channel_interval_falls_back_to_global() {
        let settings = SettingsFile::in_memory();
        assert_eq!(settings.channel_message_interval("somewhere"), 35);

        settings.set_message_interval(10);
        assert_eq!(settings.channel_message_interval("somewhere"), 10);

        settings.set_channel_message_interval("Somewhere", 5);
        assert_eq!(settings.channel_message_interval("somewhere"), 5);
        assert_eq!(settings.channel_message_interval("elsewhere"), 10);
    }

    #[test]
    fn test_interval_setters_clamp() {
        let settings = SettingsFile::in_memory();
        settings.set_channel_message_interval("chan", 0);
        assert_eq!(settings.channel_message_interval("chan"), 1);
        settings.set_channel_message_interval("chan", 1000);
        assert_eq!(settings.channel_message_interval("chan"), 100);
    }

    #[test]
    fn test_blacklists_are_case_insensitive() {
        let settings = SettingsFile::in_memory();
        assert!(settings.add_blacklisted_word("  BadWord "));
        assert!(!settings.add_blacklisted_word("badword"));
        assert!(settings.is_blacklisted_word("BADWORD"));
        assert_eq!(settings.blacklisted_words(), vec!["badword".to_string()]);

        settings.add_blacklisted_user("SpamBot");
        assert!(settings.is_blacklisted_user("spambot"));
        assert!(settings.remove_blacklisted_user("SPAMBOT"));
        assert!(!settings.is_blacklisted_user("spambot"));
    }

    #[test]
    fn test_message_counting_and_stats() {
        let settings = SettingsFile::in_memory();
        assert_eq!(settings.channel_stats("chan"), ChannelStats::default());
        settings.increment_channel_messages("Chan");
        settings.increment_channel_messages("chan");
        let stats = settings.channel_stats("chan");
        assert_eq!(stats.message_count, 2);
        assert!(stats.enabled);
    }

    #[test]
    fn test_rename_channel_moves_settings() {
        let settings = SettingsFile::in_memory();
        settings.set_channel_use_global("old", true);
        settings.rename_channel("old", "new");
        assert!(settings.use_global_brain("new"));
        assert!(!settings.use_global_brain("old"));
    }

    #[test]
    fn test_save_and_load() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested").join("settings.json");

        let settings = SettingsFile::load(&path).unwrap();
        assert_eq!(settings.snapshot(), SettingsData::default());
        settings.add_blacklisted_word("nope");
        settings.set_channel_message_interval("chan", 7);
        settings.save().unwrap();

        let reloaded = SettingsFile::load(&path).unwrap();
        assert!(reloaded.is_blacklisted_word("nope"));
        assert_eq!(reloaded.channel_message_interval("chan"), 7);

        let leftovers: Vec<_> = std::fs::read_dir(path.parent().unwrap())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(leftovers, vec![std::ffi::OsString::from("settings.json")]);
    }

    #[test]
    fn test_channel_entries_use_storage_keys() {
        let settings = SettingsFile::in_memory();
        settings.set_channel_message_interval(" #Chan", 4);
        settings.set_channel_use_global("#CHAN", true);
        settings.set_channel_enabled("#chan", false);
        settings.increment_channel_messages("#Chan");

        assert_eq!(settings.channel_message_interval("chan"), 4);
        assert!(settings.use_global_brain("chan"));
        let stats = settings.channel_stats("chan");
        assert_eq!(stats.message_count, 1);
        assert!(!stats.enabled);
        assert_eq!(
            settings.snapshot().channels.keys().collect::<Vec<_>>(),
            vec!["chan"]
        );

        settings.rename_channel("#Chan", "#Other");
        assert!(settings.use_global_brain("other"));
        assert!(!settings.use_global_brain("chan"));
    }

    #[test]
    fn test_load_rejects_garbage() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("settings.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            SettingsFile::load(&path),
            Err(CoreError::Json(_))
        ));
    }
}
