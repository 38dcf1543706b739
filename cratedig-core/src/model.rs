//! Catalog records as served by the library endpoint.

use crate::error::Result;
use crate::time::duration_from_secs;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Duration assumed for tracks whose length is unknown.
pub const DEFAULT_TRACK_SECS: f64 = 180.0;

/// The full album catalog, in server order.
pub type Catalog = Vec<Arc<Album>>;

/// A single album with its discs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Album {
    /// Stable identifier, used to relocate the album after the catalog is re-sorted
    pub id: String,
    pub title: String,
    pub artist: String,
    /// CSS color string propagated to the theme when the album is inspected
    #[serde(default)]
    pub accent_color: Option<String>,
    #[serde(default)]
    pub cover_url: String,
    #[serde(default)]
    pub discs: Vec<Disc>,
}

impl Album {
    /// The string the given sort key orders by.
    #[must_use]
    pub fn sort_value(&self, by_artist: bool) -> &str {
        if by_artist {
            &self.artist
        } else {
            &self.title
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Disc {
    pub disc_number: u32,
    #[serde(default)]
    pub tracks: Vec<Track>,
}

impl Disc {
    /// Sum of all track durations, using the default for unknown lengths.
    #[must_use]
    pub fn total_duration(&self) -> Duration {
        self.tracks.iter().map(Track::duration).sum()
    }

    /// Index of the first track with exactly this title.
    #[must_use]
    pub fn position_of(&self, title: &str) -> Option<usize> {
        self.tracks.iter().position(|t| t.title == title)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub title: String,
    pub file_path: String,
    /// Length in seconds; the scanner writes 0 when it could not probe the file
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub duration_str: Option<String>,
}

impl Track {
    /// Track length, falling back to three minutes when absent or non-positive.
    #[must_use]
    pub fn duration(&self) -> Duration {
        match self.duration {
            Some(secs) if secs > 0.0 => duration_from_secs(secs),
            _ => duration_from_secs(DEFAULT_TRACK_SECS),
        }
    }
}

/// Parse the catalog endpoint's JSON body.
///
/// # Errors
///
/// Returns an error if the payload is not a JSON array of album records.
pub fn parse_catalog(json: &str) -> Result<Catalog> {
    let albums: Vec<Album> = serde_json::from_str(json)?;
    Ok(albums.into_iter().map(Arc::new).collect())
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn track(title: &str, secs: Option<f64>) -> Track {
        Track {
            title: title.to_string(),
            file_path: format!("/music/{title}.flac"),
            duration: secs,
            duration_str: None,
        }
    }

    pub fn disc(number: u32, titles: &[&str]) -> Disc {
        Disc {
            disc_number: number,
            tracks: titles.iter().map(|t| track(t, Some(200.0))).collect(),
        }
    }

    pub fn album(id: &str, title: &str, artist: &str) -> Arc<Album> {
        Arc::new(Album {
            id: id.to_string(),
            title: title.to_string(),
            artist: artist.to_string(),
            accent_color: Some(format!("#{id}")),
            cover_url: format!("/static/covers/{id}.jpg"),
            discs: vec![disc(1, &["A", "B", "C"]), disc(2, &["D", "E"])],
        })
    }

    /// Numbered albums `a0..aN` with matching titles and artists.
    pub fn numbered(count: usize) -> Catalog {
        (0..count)
            .map(|i| album(&format!("a{i}"), &format!("Title {i}"), &format!("Artist {i}")))
            .collect()
    }
}
