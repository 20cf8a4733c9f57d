//! Keyword to candidate page addresses, via a web search restricted to the
//! source domain.

pub mod pattern;

use crate::address::DEFAULT_SOURCE_DOMAIN;
use crate::error::{Error, Result};
use std::sync::Arc;

pub use pattern::{LinkExtractor, ResultPattern};

pub const DEFAULT_SEARCH_ENDPOINT: &str = "https://google.com/search";

const TRANSLATION_MARKER: &str = "/translation";

#[derive(Clone)]
pub struct Resolver {
    endpoint: String,
    source_domain: String,
    extractor: Arc<dyn LinkExtractor>,
}

impl std::fmt::Debug for Resolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolver")
            .field("endpoint", &self.endpoint)
            .field("source_domain", &self.source_domain)
            .field("pattern_version", &self.extractor.version())
            .finish()
    }
}

impl Resolver {
    pub fn new(
        endpoint: impl Into<String>,
        source_domain: impl Into<String>,
        extractor: Arc<dyn LinkExtractor>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            source_domain: source_domain.into(),
            extractor,
        }
    }

    pub fn source_domain(&self) -> &str {
        &self.source_domain
    }

    pub fn pattern_version(&self) -> &str {
        self.extractor.version()
    }

    /// `"<keyword> lyrics site:<domain>"`
    pub fn query(&self, keyword: &str) -> String {
        format!("{keyword} lyrics site:{}", self.source_domain)
    }

    pub fn search_address(&self, keyword: &str) -> String {
        format!(
            "{}?q={}",
            self.endpoint,
            urlencoding::encode(&self.query(keyword))
        )
    }

    /// Every matched result link, translation pages trimmed back to their
    /// parent. An empty scan is an error, never an empty success.
    pub fn candidates(&self, keyword: &str, markup: &str) -> Result<Vec<String>> {
        let urls: Vec<String> = self
            .extractor
            .extract(markup)
            .into_iter()
            .map(|href| strip_translation(&href).to_string())
            .collect();

        tracing::debug!(
            keyword,
            pattern = self.extractor.version(),
            found = urls.len(),
            "scanned search results"
        );

        if urls.is_empty() {
            return Err(Error::NoCandidatesFound {
                keyword: keyword.to_string(),
            });
        }
        Ok(urls)
    }
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new(
            DEFAULT_SEARCH_ENDPOINT,
            DEFAULT_SOURCE_DOMAIN,
            Arc::new(ResultPattern::default()),
        )
    }
}

fn strip_translation(href: &str) -> &str {
    match href.find(TRANSLATION_MARKER) {
        Some(idx) => &href[..idx],
        None => href,
    }
}
