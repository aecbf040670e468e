use crate::{Result, ScrobbleError};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One completed play of a track, validated.
///
/// All seven fields are always present. The three MusicBrainz identifiers and
/// `album` may be empty strings, which means "unknown".
///
/// # Examples
///
/// ```rust
/// use scrobble_ingest::Scrobble;
///
/// let scrobble: Scrobble = serde_json::from_str(r#"{
///     "uts": "1765549946",
///     "artist": "Extremoduro",
///     "artist_mbid": "",
///     "album": "Yo, Minoría Absoluta",
///     "album_mbid": "",
///     "title": "Standby",
///     "track_mbid": "2f04902e-2ffd-4fc2-b988-f9aaf36a029a"
/// }"#).unwrap();
///
/// assert_eq!(scrobble.uts, 1765549946);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "ScrobbleDraft")]
pub struct Scrobble {
    /// Unix timestamp (seconds) of the play
    pub uts: i64,
    pub artist: String,
    pub artist_mbid: String,
    pub album: String,
    pub album_mbid: String,
    /// Track title
    pub title: String,
    pub track_mbid: String,
}

/// Unvalidated scrobble fields, as pulled out of a raw document.
///
/// `uts` is kept as a JSON value so both numbers and numeric strings can be
/// coerced during validation.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ScrobbleDraft {
    pub uts: Option<Value>,
    pub artist: Option<String>,
    pub artist_mbid: Option<String>,
    pub album: Option<String>,
    pub album_mbid: Option<String>,
    pub title: Option<String>,
    pub track_mbid: Option<String>,
}

impl TryFrom<ScrobbleDraft> for Scrobble {
    type Error = ScrobbleError;

    fn try_from(draft: ScrobbleDraft) -> Result<Self> {
        let uts = draft.uts.ok_or_else(|| ScrobbleError::missing("uts"))?;

        Ok(Scrobble {
            uts: coerce_uts(&uts)?,
            artist: draft.artist.ok_or_else(|| ScrobbleError::missing("artist"))?,
            artist_mbid: draft
                .artist_mbid
                .ok_or_else(|| ScrobbleError::missing("artist_mbid"))?,
            album: draft.album.ok_or_else(|| ScrobbleError::missing("album"))?,
            album_mbid: draft
                .album_mbid
                .ok_or_else(|| ScrobbleError::missing("album_mbid"))?,
            title: draft.title.ok_or_else(|| ScrobbleError::missing("title"))?,
            track_mbid: draft
                .track_mbid
                .ok_or_else(|| ScrobbleError::missing("track_mbid"))?,
        })
    }
}

/// Accepts integers and strings holding an integer (surrounding whitespace is
/// tolerated). Floats, booleans, empty and non-numeric strings are rejected.
fn coerce_uts(value: &Value) -> Result<i64> {
    let invalid = |reason: String| ScrobbleError::Validation {
        field: "uts",
        reason,
    };

    match value {
        Value::Number(n) => n
            .as_i64()
            .ok_or_else(|| invalid(format!("expected an integer, got {n}"))),
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| invalid(format!("unable to parse string as an integer: {s:?}"))),
        other => Err(invalid(format!("expected an integer, got {other}"))),
    }
}

impl std::fmt::Display for Scrobble {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.album.is_empty() {
            write!(f, "{} - {}", self.artist, self.title)
        } else {
            write!(f, "{} - {} [{}]", self.artist, self.title, self.album)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_scrobble() -> Value {
        json!({
            "uts": 1234567890,
            "artist": "fake_artist",
            "artist_mbid": "fake_artist_mbid",
            "album": "fake_album",
            "album_mbid": "fake_album_mbid",
            "title": "fake_title",
            "track_mbid": "fake_album_mbid",
        })
    }

    fn parse(value: Value) -> std::result::Result<Scrobble, serde_json::Error> {
        serde_json::from_value(value)
    }

    #[test]
    fn test_valid_scrobble_round_trips() {
        let scrobble = parse(valid_scrobble()).unwrap();
        assert_eq!(serde_json::to_value(&scrobble).unwrap(), valid_scrobble());
    }

    #[test]
    fn test_should_fail_if_field_is_missing() {
        let fields = [
            "uts",
            "artist",
            "artist_mbid",
            "album",
            "album_mbid",
            "title",
            "track_mbid",
        ];
        for field in fields {
            let mut invalid = valid_scrobble();
            invalid.as_object_mut().unwrap().remove(field);

            let err = parse(invalid).unwrap_err();
            assert!(
                err.to_string().contains(field),
                "error for missing {field} should name it: {err}"
            );
        }
    }

    #[test]
    fn test_missing_title_names_title() {
        let draft = ScrobbleDraft {
            uts: Some(json!(1)),
            artist: Some("a".into()),
            artist_mbid: Some(String::new()),
            album: Some(String::new()),
            album_mbid: Some(String::new()),
            title: None,
            track_mbid: Some(String::new()),
        };

        match Scrobble::try_from(draft) {
            Err(ScrobbleError::Validation { field, .. }) => assert_eq!(field, "title"),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_mbid_fields_can_be_empty_string() {
        let mut value = valid_scrobble();
        value["artist_mbid"] = json!("");
        value["album_mbid"] = json!("");
        value["track_mbid"] = json!("");

        let scrobble = parse(value).unwrap();
        assert_eq!(scrobble.artist_mbid, "");
        assert_eq!(scrobble.album_mbid, "");
        assert_eq!(scrobble.track_mbid, "");
    }

    #[test]
    fn test_uts_must_be_an_integer() {
        for invalid_uts in [json!(""), json!("uts"), json!(12.5), json!(true), json!(null)] {
            let mut value = valid_scrobble();
            value["uts"] = invalid_uts.clone();
            assert!(parse(value).is_err(), "{invalid_uts} should be rejected");
        }
    }

    #[test]
    fn test_numeric_string_uts_is_coerced() {
        let mut value = valid_scrobble();
        value["uts"] = json!("1234567890");
        assert_eq!(parse(value).unwrap().uts, 1234567890);
    }

    #[test]
    fn test_display() {
        let mut scrobble = parse(valid_scrobble()).unwrap();
        assert_eq!(scrobble.to_string(), "fake_artist - fake_title [fake_album]");
        scrobble.album.clear();
        assert_eq!(scrobble.to_string(), "fake_artist - fake_title");
    }
}
