//! Raw track documents to validated scrobbles.

use crate::api::RawTrack;
use crate::scrobble::{Scrobble, ScrobbleDraft};
use crate::Result;

/// Pull the seven scrobble fields out of their nested locations and validate
/// them.
///
/// | field | source |
/// |---|---|
/// | `uts` | `date.uts` |
/// | `artist` | `artist.name`, or `artist.#text` |
/// | `artist_mbid` | `artist.mbid` |
/// | `album` | `album.#text` |
/// | `album_mbid` | `album.mbid` |
/// | `title` | `name` |
/// | `track_mbid` | `mbid` |
pub fn extract(raw: &RawTrack) -> Result<Scrobble> {
    let artist = raw.artist.as_ref();
    let album = raw.album.as_ref();

    let draft = ScrobbleDraft {
        uts: raw.date.as_ref().and_then(|d| d.uts.clone()),
        artist: artist.and_then(|a| a.display_name()).map(str::to_string),
        artist_mbid: artist.and_then(|a| a.mbid.clone()),
        album: album.and_then(|a| a.text.clone()),
        album_mbid: album.and_then(|a| a.mbid.clone()),
        title: raw.name.clone(),
        track_mbid: raw.mbid.clone(),
    };

    Scrobble::try_from(draft)
}

/// Extract every track in order. The first invalid track aborts the batch.
pub fn transform_all(raws: &[RawTrack]) -> Result<Vec<Scrobble>> {
    let scrobbles = raws.iter().map(extract).collect::<Result<Vec<_>>>()?;
    log::debug!("Validated {} scrobbles", scrobbles.len());
    Ok(scrobbles)
}
