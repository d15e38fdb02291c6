//! Run configuration
//!
//! Loaded once from a TOML file (default `~/.sift.toml`), with upload
//! credentials optionally overridden from the environment or a `.env` file.
//!
//! ```toml
//! [wordpress]
//! url = "https://blog.example.com"
//! user = "author"
//! password = "secret"
//! upload = true
//! timeout_secs = 30
//! retries = 0
//!
//! [image]
//! max_width = 0
//! out_dir = "."
//! rotate = true
//! ```
//!
//! A missing file yields the defaults with uploading disabled. A file that
//! exists but does not parse is an error.

use crate::{Error, Result};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CONFIG_PATH: &str = "~/.sift.toml";

const XMLRPC_PATH: &str = "xmlrpc.php";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub wordpress: Option<WordPressSection>,
    pub image: ImageSection,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WordPressSection {
    pub url: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub upload: bool,
    pub timeout_secs: u64,
    pub retries: usize,
}

impl Default for WordPressSection {
    fn default() -> Self {
        Self {
            url: None,
            user: None,
            password: None,
            upload: true,
            timeout_secs: 30,
            retries: 0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImageSection {
    pub max_width: u32,
    pub out_dir: PathBuf,
    pub rotate: bool,
}

impl Default for ImageSection {
    fn default() -> Self {
        Self {
            max_width: 0,
            out_dir: PathBuf::from("."),
            rotate: true,
        }
    }
}

/// Image settings handed to the transformer.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessingConfig {
    /// Maximum output width in pixels; 0 disables resizing.
    pub max_width: u32,
    /// Base directory under which `YYYY/MM` is created.
    pub out_dir: PathBuf,
    pub rotate: bool,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        ImageSection::default().into()
    }
}

impl From<ImageSection> for ProcessingConfig {
    fn from(section: ImageSection) -> Self {
        Self {
            max_width: section.max_width,
            out_dir: section.out_dir,
            rotate: section.rotate,
        }
    }
}

/// Connection settings for the upload endpoint.
#[derive(Clone)]
pub struct UploadSettings {
    pub endpoint: String,
    pub user: String,
    pub password: String,
    pub timeout: Duration,
    pub retries: usize,
}

impl fmt::Debug for UploadSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadSettings")
            .field("endpoint", &self.endpoint)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("timeout", &self.timeout)
            .field("retries", &self.retries)
            .finish()
    }
}

/// Why the upload phase will not run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadDisabled {
    MissingSection,
    MissingKey(&'static str),
    TurnedOff,
}

impl fmt::Display for UploadDisabled {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingSection => write!(f, "missing wordpress configuration"),
            Self::MissingKey(key) => {
                write!(f, "incomplete wordpress configuration (no {})", key)
            }
            Self::TurnedOff => write!(f, "wordpress.upload is false"),
        }
    }
}

impl Config {
    /// Load from `path`, then apply environment overrides.
    pub fn load(path: &Path) -> Result<Self> {
        dotenvy::dotenv().ok();

        let mut config = Self::from_file(path)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::warn!(
                "Config file {} not found, using defaults",
                path.display()
            );
            return Ok(Self::default());
        }

        tracing::debug!("Reading config file {}", path.display());
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Override credentials from `SIFT_WORDPRESS_{URL,USER,PASSWORD}`.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let url = lookup("SIFT_WORDPRESS_URL");
        let user = lookup("SIFT_WORDPRESS_USER");
        let password = lookup("SIFT_WORDPRESS_PASSWORD");

        if url.is_none() && user.is_none() && password.is_none() {
            return;
        }

        let section = self.wordpress.get_or_insert_with(WordPressSection::default);
        if url.is_some() {
            section.url = url;
        }
        if user.is_some() {
            section.user = user;
        }
        if password.is_some() {
            section.password = password;
        }
    }

    pub fn processing(&self) -> ProcessingConfig {
        self.image.clone().into()
    }

    pub fn upload_settings(&self) -> std::result::Result<UploadSettings, UploadDisabled> {
        let section = self
            .wordpress
            .as_ref()
            .ok_or(UploadDisabled::MissingSection)?;

        let url = required(&section.url, "url")?;
        let user = required(&section.user, "user")?;
        let password = required(&section.password, "password")?;

        if !section.upload {
            return Err(UploadDisabled::TurnedOff);
        }

        Ok(UploadSettings {
            endpoint: xmlrpc_endpoint(url),
            user: user.to_string(),
            password: password.to_string(),
            timeout: Duration::from_secs(section.timeout_secs),
            retries: section.retries,
        })
    }
}

fn required<'a>(
    value: &'a Option<String>,
    key: &'static str,
) -> std::result::Result<&'a str, UploadDisabled> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or(UploadDisabled::MissingKey(key))
}

/// Site URL to its XML-RPC endpoint.
pub fn xmlrpc_endpoint(url: &str) -> String {
    let trimmed = url.trim_end_matches('/');
    if trimmed.ends_with(XMLRPC_PATH) {
        trimmed.to_string()
    } else {
        format!("{}/{}", trimmed, XMLRPC_PATH)
    }
}

/// Expand a leading `~/` to the current user's home directory.
pub fn expand_home(path: &str) -> Result<PathBuf> {
    match path.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .ok_or_else(|| Error::Config("Cannot determine home directory".to_string())),
        None => Ok(PathBuf::from(path)),
    }
}
