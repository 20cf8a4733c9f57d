//! Well-known fields of a page state value.
//!
//! The state is schemaless on purpose; this is a best-effort projection for
//! callers that only want the usual track details. Every field is optional.

use serde_json::Value;

pub const NO_LYRICS: &str = "This song has no lyrics";
pub const RESTRICTED_LYRICS: &str = "We do not have access to the lyrics";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackSummary {
    pub name: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub genre: Option<String>,
    pub has_lyrics: bool,
    pub restricted: bool,
    pub lyrics: Option<String>,
}

impl TrackSummary {
    pub fn from_state(state: &Value) -> Self {
        let str_at = |ptr: &str| {
            state
                .pointer(ptr)
                .and_then(|x| x.as_str())
                .map(|s| s.to_string())
        };

        Self {
            name: str_at("/page/track/name"),
            artist: str_at("/page/track/artistName"),
            album: str_at("/page/track/albumName"),
            genre: state
                .pointer("/page/track/primaryGenres")
                .and_then(|x| x.as_array())
                .and_then(|genres| {
                    genres
                        .iter()
                        .find_map(|g| g.get("name").and_then(|n| n.as_str()))
                })
                .map(|s| s.to_string()),
            has_lyrics: flag(state.pointer("/page/track/hasLyrics")),
            restricted: flag(state.pointer("/page/lyrics/lyrics/restricted")),
            lyrics: str_at("/page/lyrics/lyrics/body"),
        }
    }

    /// The lyric body, or the reason there is none to show.
    pub fn lyrics_text(&self) -> &str {
        if self.restricted {
            RESTRICTED_LYRICS
        } else if !self.has_lyrics {
            NO_LYRICS
        } else {
            self.lyrics.as_deref().unwrap_or(NO_LYRICS)
        }
    }
}

// Flags show up as 0/1 integers, occasionally as booleans.
fn flag(v: Option<&Value>) -> bool {
    match v {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_i64() == Some(1),
        _ => false,
    }
}
