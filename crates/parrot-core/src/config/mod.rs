pub mod settings;

pub use settings::{
    resolve_interval, ChannelSettings, ChannelStats, Settings, SettingsData, SettingsFile,
    DEFAULT_MESSAGE_INTERVAL, MAX_MESSAGE_INTERVAL, MIN_MESSAGE_INTERVAL,
};
