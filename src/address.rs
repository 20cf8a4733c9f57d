use regex::Regex;
use std::sync::LazyLock;

pub const DEFAULT_SOURCE_DOMAIN: &str = "musixmatch.com";

static DEFAULT_PREDICATE: LazyLock<AddressPredicate> =
    LazyLock::new(|| AddressPredicate::new(DEFAULT_SOURCE_DOMAIN));

/// Whether `address` points at the default source domain.
pub fn is_supported_address(address: &str) -> bool {
    DEFAULT_PREDICATE.matches(address)
}

/// Matches addresses on one registrable domain: optional scheme, any number
/// of subdomain labels, then the domain itself followed by a path, port,
/// query, fragment or the end of input.
#[derive(Debug, Clone)]
pub struct AddressPredicate {
    re: Regex,
}

impl AddressPredicate {
    pub fn new(domain: &str) -> Self {
        let pattern = format!(
            r"(?i)^(?:https?://)?(?:[a-z0-9-]+\.)*{}(?:[:/?#]|$)",
            regex::escape(domain.trim_matches('.'))
        );
        Self {
            re: Regex::new(&pattern).expect("escaped domain pattern is valid"),
        }
    }

    pub fn matches(&self, address: &str) -> bool {
        !address.is_empty() && self.re.is_match(address)
    }
}
