use std::path::PathBuf;
use std::time::Duration;

use config::{Config, ConfigError, Environment};
use serde::Deserialize;

pub const DEFAULT_HOST: &str = "https://dontstarve.huijiwiki.com";
pub const ENV_PREFIX: &str = "DSTWIKI";

// Documents in the working directory
pub const WIKI_DATA_FILE: &str = "wiki_data.json";
pub const FILTERED_FILE: &str = "wiki_data_filtered.json";
pub const CATEGORIES_FILE: &str = "allcategories.json";
pub const ITEM_DATA_FILE: &str = "ItemData.json";
pub const ITEM_TAG_FILE: &str = "ItemData.Tag.json";
pub const ITEM_TABLE_FILE: &str = "ItemTable.json";
pub const ITEM_STRING_FILE: &str = "ItemString.json";
pub const MOB_INFO_FILE: &str = "DSTMobInfo.json";
pub const MOB_TAG_FILE: &str = "DSTMobInfo.Tag.json";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub host: String,
    pub workdir: PathBuf,
    pub page_size: u32,
    pub request_delay_ms: u64,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Settings {
    /// Defaults, then `DSTWIKI_*` environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("host", DEFAULT_HOST)?
            .set_default("workdir", "data")?
            .set_default("page_size", 1000)?
            .set_default("request_delay_ms", 1000)?
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?
            .try_deserialize()
    }

    pub fn path(&self, file: &str) -> PathBuf {
        self.workdir.join(file)
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    /// `None` means requests may block indefinitely.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_environment() {
        let settings = Settings::load().unwrap();
        assert_eq!(settings.page_size, 1000);
        assert_eq!(settings.request_delay(), Duration::from_secs(1));
        assert_eq!(settings.host, DEFAULT_HOST);
    }

    #[test]
    fn paths_are_relative_to_workdir() {
        let settings = Settings {
            host: DEFAULT_HOST.to_string(),
            workdir: PathBuf::from("out"),
            page_size: 10,
            request_delay_ms: 0,
            timeout_secs: Some(5),
        };
        assert_eq!(settings.path(WIKI_DATA_FILE), PathBuf::from("out/wiki_data.json"));
        assert_eq!(settings.timeout(), Some(Duration::from_secs(5)));
    }
}
