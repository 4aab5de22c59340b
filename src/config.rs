use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::info;

use crate::error::ConfigError;
use crate::reading_time::ReadingConfig;

pub const CONFIG_FILE: &str = "blog.toml";

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub site: SiteConfig,
    pub content: ContentConfig,
    pub reading: ReadingConfig,
    pub server: ServerConfig,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct SiteConfig {
    pub base_url: String,
    pub title: String,
    pub description: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            title: "Blog".to_string(),
            description: "Latest posts".to_string(),
        }
    }
}

impl SiteConfig {
    /// Base URL without a trailing slash, used as the site root in artifacts.
    pub fn root_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    pub fn post_url(&self, slug: &str) -> String {
        format!("{}/posts/{}", self.root_url(), slug)
    }

    pub fn feed_url(&self) -> String {
        format!("{}/rss", self.root_url())
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ContentConfig {
    pub posts_dir: PathBuf,
    pub index_file: String,
    pub static_dir: PathBuf,
    /// Post reads and compilations kept in flight at once.
    pub concurrency: usize,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            posts_dir: PathBuf::from("content/posts"),
            index_file: "index.md".to_string(),
            static_dir: PathBuf::from("content/static"),
            concurrency: 8,
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
    pub hot_reload: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            hot_reload: false,
        }
    }
}

impl Config {
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads `path`, falling back to defaults when the file does not exist.
    pub async fn load(path: &Path) -> Result<Self, ConfigError> {
        match tokio::fs::read_to_string(path).await {
            Ok(text) => Self::from_toml(&text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %path.display(), "no config file, using defaults");
                Ok(Self::default())
            }
            Err(source) => Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.reading.words_per_minute == 0 {
            return Err(ConfigError::Invalid("reading.words_per_minute must be positive"));
        }
        if self.content.concurrency == 0 {
            return Err(ConfigError::Invalid("content.concurrency must be positive"));
        }
        if self.site.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("site.base_url must not be empty"));
        }
        if self.content.index_file.trim().is_empty() {
            return Err(ConfigError::Invalid("content.index_file must not be empty"));
        }
        Ok(())
    }
}
