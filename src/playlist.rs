//! M3U playlists and tag-derived search keywords.

use anyhow::Context;
use lofty::prelude::*;
use lofty::probe::Probe;
use std::path::{Path, PathBuf};

/// Entry paths in playlist order. Relative entries are resolved against the
/// playlist's own directory.
pub fn read_m3u(path: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let base = path.parent().unwrap_or_else(|| Path::new(""));
    Ok(parse_m3u(&raw, base))
}

fn parse_m3u(raw: &str, base: &Path) -> Vec<PathBuf> {
    raw.lines()
        .map(|l| l.trim_start_matches('\u{feff}').trim_end())
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(|l| {
            let entry = PathBuf::from(l);
            if entry.is_absolute() {
                entry
            } else {
                base.join(entry)
            }
        })
        .collect()
}

/// `"<title> - <artist>"` from the file's primary (or first) tag.
pub fn keyword_for(path: &Path) -> anyhow::Result<String> {
    let tagged = Probe::open(path)
        .with_context(|| format!("open {}", path.display()))?
        .read()
        .with_context(|| format!("read tags of {}", path.display()))?;
    let tag = tagged
        .primary_tag()
        .or_else(|| tagged.first_tag())
        .with_context(|| format!("no tags in {}", path.display()))?;

    let title = tag
        .title()
        .with_context(|| format!("no title tag in {}", path.display()))?;
    let artist = tag
        .artist()
        .with_context(|| format!("no artist tag in {}", path.display()))?;
    Ok(format!("{} - {}", title.trim(), artist.trim()))
}
