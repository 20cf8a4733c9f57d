//! Identification and retry settings shared by every request a client makes.

use crate::error::{Error, Result};
use std::time::Duration;

pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Fedora; Linux x86_64; rv:102.0) Gecko/20100101 Firefox/102.0";
pub const DEFAULT_TRIES: u32 = 5;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    user_agent: String,
    session_token: Option<String>,
    tries: u32,
    timeout: Duration,
}

impl SessionConfig {
    pub fn new(
        user_agent: impl Into<String>,
        session_token: Option<String>,
        tries: u32,
        timeout: Duration,
    ) -> Result<Self> {
        validate_times(tries, timeout)?;
        let mut cfg = Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            session_token: None,
            tries,
            timeout,
        };
        cfg.replace_user_agent(user_agent);
        cfg.replace_session_token(session_token);
        Ok(cfg)
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    pub fn session_token(&self) -> Option<&str> {
        self.session_token.as_deref()
    }

    pub fn tries(&self) -> u32 {
        self.tries
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// An empty agent falls back to [`DEFAULT_USER_AGENT`].
    pub fn replace_user_agent(&mut self, user_agent: impl Into<String>) {
        let ua = user_agent.into();
        self.user_agent = if ua.trim().is_empty() {
            DEFAULT_USER_AGENT.to_string()
        } else {
            ua
        };
    }

    pub fn replace_session_token(&mut self, token: Option<String>) {
        self.session_token = token.filter(|t| !t.trim().is_empty());
    }

    /// Leaves the current values untouched when either one is zero.
    pub fn replace_times(&mut self, tries: u32, timeout: Duration) -> Result<()> {
        validate_times(tries, timeout)?;
        self.tries = tries;
        self.timeout = timeout;
        Ok(())
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            session_token: None,
            tries: DEFAULT_TRIES,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

fn validate_times(tries: u32, timeout: Duration) -> Result<()> {
    if tries == 0 {
        return Err(Error::InvalidConfig("tries cannot be 0".to_string()));
    }
    if timeout.is_zero() {
        return Err(Error::InvalidConfig("timeout cannot be 0".to_string()));
    }
    Ok(())
}
