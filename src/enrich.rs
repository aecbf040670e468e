//! Scrobble batches to enriched tables.

use crate::scrobble::Scrobble;
use crate::{Result, ScrobbleError};
use chrono::DateTime;
use serde::{Deserialize, Serialize};

/// Replaces an empty album name.
pub const UNKNOWN_ALBUM: &str = "[Desconocido]";

/// Format of the `fechahora` column.
pub const FECHAHORA_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Column names, in table order.
pub const COLUMNS: [&str; 8] = [
    "uts",
    "artist",
    "artist_mbid",
    "album",
    "album_mbid",
    "title",
    "track_mbid",
    "fechahora",
];

/// A scrobble ready for storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichedRow {
    pub uts: i64,
    pub artist: String,
    pub artist_mbid: String,
    /// Album name, or [`UNKNOWN_ALBUM`] when the scrobble had none
    pub album: String,
    pub album_mbid: String,
    pub title: String,
    pub track_mbid: String,
    /// `uts` rendered as a UTC date-time, see [`FECHAHORA_FORMAT`]
    pub fechahora: String,
}

impl EnrichedRow {
    /// Value of a column as text, `None` for an unknown column name.
    pub fn get(&self, column: &str) -> Option<String> {
        Some(match column {
            "uts" => self.uts.to_string(),
            "artist" => self.artist.clone(),
            "artist_mbid" => self.artist_mbid.clone(),
            "album" => self.album.clone(),
            "album_mbid" => self.album_mbid.clone(),
            "title" => self.title.clone(),
            "track_mbid" => self.track_mbid.clone(),
            "fechahora" => self.fechahora.clone(),
            _ => return None,
        })
    }
}

/// Ordered rows produced by [`enrich`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScrobbleTable {
    rows: Vec<EnrichedRow>,
}

impl ScrobbleTable {
    pub fn columns(&self) -> &'static [&'static str] {
        &COLUMNS
    }

    pub fn rows(&self) -> &[EnrichedRow] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<EnrichedRow> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, EnrichedRow> {
        self.rows.iter()
    }

    /// All values of one column, in row order.
    pub fn column(&self, name: &str) -> Option<Vec<String>> {
        if !COLUMNS.contains(&name) {
            return None;
        }
        self.rows.iter().map(|row| row.get(name)).collect()
    }

    /// One JSON object per row, newline separated.
    pub fn to_json_lines(&self) -> Result<String> {
        let mut out = String::new();
        for row in &self.rows {
            let line =
                serde_json::to_string(row).map_err(|e| ScrobbleError::Parse(e.to_string()))?;
            out.push_str(&line);
            out.push('\n');
        }
        Ok(out)
    }
}

impl<'a> IntoIterator for &'a ScrobbleTable {
    type Item = &'a EnrichedRow;
    type IntoIter = std::slice::Iter<'a, EnrichedRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

/// Render a Unix timestamp as `YYYY-MM-DD HH:MM:SS` in UTC.
pub fn fechahora(uts: i64) -> Result<String> {
    DateTime::from_timestamp(uts, 0)
        .map(|dt| dt.format(FECHAHORA_FORMAT).to_string())
        .ok_or_else(|| ScrobbleError::Validation {
            field: "uts",
            reason: format!("{uts} is outside the supported date range"),
        })
}

/// Build the enriched table for a batch of scrobbles.
///
/// One row per scrobble, in input order. Albums that are exactly `""` become
/// [`UNKNOWN_ALBUM`]; any other value passes through.
pub fn enrich(scrobbles: &[Scrobble]) -> Result<ScrobbleTable> {
    let rows = scrobbles
        .iter()
        .map(|scrobble| {
            let album = if scrobble.album.is_empty() {
                UNKNOWN_ALBUM.to_string()
            } else {
                scrobble.album.clone()
            };

            Ok(EnrichedRow {
                uts: scrobble.uts,
                artist: scrobble.artist.clone(),
                artist_mbid: scrobble.artist_mbid.clone(),
                album,
                album_mbid: scrobble.album_mbid.clone(),
                title: scrobble.title.clone(),
                track_mbid: scrobble.track_mbid.clone(),
                fechahora: fechahora(scrobble.uts)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let unknown_albums = rows.iter().filter(|r| r.album == UNKNOWN_ALBUM).count();
    log::debug!(
        "Enriched {} scrobbles ({unknown_albums} without album)",
        rows.len()
    );

    Ok(ScrobbleTable { rows })
}
