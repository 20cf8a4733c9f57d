//! Result-link extraction strategies for search-engine markup.
//!
//! Search result markup changes without notice, so each pattern carries a
//! version label and can be swapped from configuration without touching the
//! fetch machinery.

use crate::error::{Error, Result};
use regex::Regex;

pub const DEFAULT_PATTERN_VERSION: &str = "google-yuRUbf-2023";
pub const DEFAULT_RESULT_PATTERN: &str = r#"<div class="yuRUbf"><div><span jscontroller="msmzHf" jsaction="rcuQ6b:npT2md;PYDNKe:bLV6Bd;mLt3mc"><a jsname="UWckNb" href="(?P<href>[^" ]*)"#;

/// Pulls result hrefs out of a search results page, in document order.
pub trait LinkExtractor: Send + Sync {
    fn version(&self) -> &str;
    fn extract(&self, markup: &str) -> Vec<String>;
}

/// A regex with an `href` capture group (or, failing that, a first group)
/// wrapping the link target.
#[derive(Debug, Clone)]
pub struct ResultPattern {
    version: String,
    re: Regex,
    group: usize,
}

impl ResultPattern {
    pub fn new(version: impl Into<String>, pattern: &str) -> Result<Self> {
        let re = Regex::new(pattern)
            .map_err(|e| Error::InvalidConfig(format!("result pattern: {e}")))?;
        let group = re
            .capture_names()
            .position(|n| n == Some("href"))
            .or_else(|| (re.captures_len() > 1).then_some(1))
            .ok_or_else(|| {
                Error::InvalidConfig("result pattern needs a capture group for the href".to_string())
            })?;
        Ok(Self {
            version: version.into(),
            re,
            group,
        })
    }
}

impl Default for ResultPattern {
    fn default() -> Self {
        Self::new(DEFAULT_PATTERN_VERSION, DEFAULT_RESULT_PATTERN)
            .expect("default result pattern is valid")
    }
}

impl LinkExtractor for ResultPattern {
    fn version(&self) -> &str {
        &self.version
    }

    fn extract(&self, markup: &str) -> Vec<String> {
        self.re
            .captures_iter(markup)
            .filter_map(|c| c.get(self.group))
            .map(|m| m.as_str().to_string())
            .collect()
    }
}
