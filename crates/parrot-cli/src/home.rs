use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use parrot_core::config::SettingsFile;
use parrot_registry::{BrainRegistry, ChannelRouter};

const SETTINGS_FILE: &str = "settings.json";
const DEFAULT_DIR: &str = ".parrot";

/// Everything a command needs: the settings and brains stored under one
/// data directory.
pub struct ParrotHome {
    settings: Arc<SettingsFile>,
    registry: Arc<BrainRegistry>,
}

impl ParrotHome {
    /// Open the data directory, falling back to `~/.parrot`.
    pub fn open(data_dir: Option<&Path>) -> Result<Self> {
        let data_dir = match data_dir {
            Some(dir) => dir.to_path_buf(),
            None => dirs::home_dir()
                .context("Could not determine the home directory; pass --data-dir")?
                .join(DEFAULT_DIR),
        };

        let settings_path = data_dir.join(SETTINGS_FILE);
        let settings = Arc::new(
            SettingsFile::load(&settings_path)
                .with_context(|| format!("Failed to load {}", settings_path.display()))?,
        );
        let registry = Arc::new(BrainRegistry::new(&data_dir, settings.clone()));
        tracing::debug!(data_dir = %data_dir.display(), "opened parrot home");

        Ok(Self {
            settings,
            registry,
        })
    }

    pub fn settings(&self) -> &SettingsFile {
        &self.settings
    }

    pub fn registry(&self) -> &BrainRegistry {
        &self.registry
    }

    pub fn router(&self) -> ChannelRouter {
        ChannelRouter::new(Arc::clone(&self.registry))
    }

    pub fn save_settings(&self) -> Result<()> {
        self.settings
            .save()
            .context("Failed to save settings")
    }
}
