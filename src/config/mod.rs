use crate::address::DEFAULT_SOURCE_DOMAIN;
use crate::error::Result;
use crate::extractor::{DEFAULT_STATE_END, DEFAULT_STATE_START, Extractor, StateMarkers};
use crate::resolver::pattern::{DEFAULT_PATTERN_VERSION, DEFAULT_RESULT_PATTERN};
use crate::resolver::{DEFAULT_SEARCH_ENDPOINT, Resolver, ResultPattern};
use crate::session::{DEFAULT_TIMEOUT, DEFAULT_TRIES, DEFAULT_USER_AGENT, SessionConfig};
use anyhow::Context;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Environment variable holding the session token. It never goes in the file.
pub const SESSION_TOKEN_ENV: &str = "MXM_COOKIES";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub session: SessionSection,
    pub search: SearchSection,
    pub page: PageSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSection {
    pub user_agent: String,
    /// Attempts per request before giving up.
    pub tries: u32,
    /// Per-attempt timeout in seconds.
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSection {
    pub endpoint: String,
    pub source_domain: String,
    /// Regex with an `href` capture group around each result link.
    pub result_pattern: String,
    pub pattern_version: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageSection {
    pub state_start: String,
    pub state_end: String,
}

impl Default for SessionSection {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            tries: DEFAULT_TRIES,
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
        }
    }
}

impl Default for SearchSection {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_SEARCH_ENDPOINT.to_string(),
            source_domain: DEFAULT_SOURCE_DOMAIN.to_string(),
            result_pattern: DEFAULT_RESULT_PATTERN.to_string(),
            pattern_version: DEFAULT_PATTERN_VERSION.to_string(),
        }
    }
}

impl Default for PageSection {
    fn default() -> Self {
        Self {
            state_start: DEFAULT_STATE_START.to_string(),
            state_end: DEFAULT_STATE_END.to_string(),
        }
    }
}

impl Config {
    pub fn session(&self, token: Option<String>) -> Result<SessionConfig> {
        SessionConfig::new(
            self.session.user_agent.clone(),
            token,
            self.session.tries,
            Duration::from_secs(self.session.timeout_secs),
        )
    }

    pub fn resolver(&self) -> Result<Resolver> {
        let pattern = ResultPattern::new(
            self.search.pattern_version.clone(),
            &self.search.result_pattern,
        )?;
        Ok(Resolver::new(
            self.search.endpoint.clone(),
            self.search.source_domain.clone(),
            Arc::new(pattern),
        ))
    }

    pub fn extractor(&self) -> Result<Extractor> {
        let markers = StateMarkers::new(self.page.state_start.clone(), self.page.state_end.clone())?;
        Ok(Extractor::new(markers))
    }
}

pub fn save(cfg: &Config, override_path: Option<&Path>) -> anyhow::Result<()> {
    let path = match override_path {
        Some(p) => p.to_path_buf(),
        None => default_config_path()?,
    };
    write_config(cfg, &path)
}

pub fn default_config_path() -> anyhow::Result<PathBuf> {
    let proj =
        ProjectDirs::from("dev", "mxmfetch", "mxmfetch").context("ProjectDirs unavailable")?;
    Ok(proj.config_dir().join("config.toml"))
}

pub fn load(override_path: Option<&Path>) -> anyhow::Result<Config> {
    let path = match override_path {
        Some(p) => p.to_path_buf(),
        None => default_config_path()?,
    };

    if !path.exists() {
        let cfg = Config::default();
        write_config(&cfg, &path)?;
        return Ok(cfg);
    }

    let raw = fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
    let cfg = toml::from_str::<Config>(&raw).with_context(|| format!("parse {}", path.display()))?;
    Ok(cfg)
}

fn write_config(cfg: &Config, path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create dir {}", parent.display()))?;
    }
    let raw = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(path, raw).with_context(|| format!("write {}", path.display()))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let _ = fs::set_permissions(path, fs::Permissions::from_mode(0o600));
    }
    Ok(())
}
