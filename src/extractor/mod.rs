//! Locates the embedded render-state literal inside a fetched page.

pub mod lenient;

use crate::error::{Error, Result};
use serde_json::Value;

pub const DEFAULT_STATE_START: &str = "var __mxmState = ";
pub const DEFAULT_STATE_END: &str = ";</script>";

/// The text that immediately precedes and follows the literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateMarkers {
    start: String,
    end: String,
}

impl StateMarkers {
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Result<Self> {
        let start = start.into();
        let end = end.into();
        if start.is_empty() || end.is_empty() {
            return Err(Error::InvalidConfig(
                "state markers cannot be empty".to_string(),
            ));
        }
        Ok(Self { start, end })
    }

    /// Everything strictly between the first start marker and the first end
    /// marker after it.
    pub fn locate<'a>(&self, body: &'a str) -> Option<&'a str> {
        let from = body.find(&self.start)? + self.start.len();
        let len = body[from..].find(&self.end)?;
        Some(&body[from..from + len])
    }
}

impl Default for StateMarkers {
    fn default() -> Self {
        Self {
            start: DEFAULT_STATE_START.to_string(),
            end: DEFAULT_STATE_END.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Extractor {
    markers: StateMarkers,
}

impl Extractor {
    pub fn new(markers: StateMarkers) -> Self {
        Self { markers }
    }

    pub fn markers(&self) -> &StateMarkers {
        &self.markers
    }

    pub fn raw(&self, address: &str, body: &str) -> Result<String> {
        self.markers
            .locate(body)
            .map(str::to_string)
            .ok_or_else(|| Error::DataNotFound {
                address: address.to_string(),
            })
    }

    pub fn structured(&self, address: &str, body: &str) -> Result<Value> {
        let literal = self.raw(address, body)?;
        lenient::parse(&literal).map_err(Error::MalformedData)
    }
}
