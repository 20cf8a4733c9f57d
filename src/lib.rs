//! Resolve a song keyword or page address into the page's embedded
//! render state: search for candidate pages, fetch one with a bounded retry
//! budget, and lift the state literal out of the markup.

pub mod address;
pub mod client;
pub mod config;
pub mod error;
pub mod extractor;
pub mod playlist;
pub mod resolver;
pub mod session;
pub mod track;
pub mod transport;

pub use address::{AddressPredicate, is_supported_address};
pub use client::SongClient;
pub use error::{AttemptFailure, Error, Result, TransportError};
pub use extractor::{Extractor, StateMarkers};
pub use resolver::{LinkExtractor, Resolver, ResultPattern};
pub use session::SessionConfig;
pub use track::TrackSummary;
pub use transport::{HttpTransport, Transport};
