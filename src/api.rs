use crate::events::{ClientEvent, ClientEventReceiver, RequestInfo, SharedEventBroadcaster};
use crate::iterator::{AsyncPaginatedIterator, RecentTracksIterator, RecentTracksQuery};
use crate::{Config, Result, ScrobbleError};
use async_trait::async_trait;
use http_client::{HttpClient, Request};
use http_types::{Method, Url};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::sync::Arc;

/// Last.fm web service endpoint.
pub const API_ROOT: &str = "http://ws.audioscrobbler.com/2.0/";

/// Method name of the paginated listening history call.
pub const RECENT_TRACKS_METHOD: &str = "user.getrecenttracks";

// =============================================================================
// RecentTracksSource trait and implementation
// =============================================================================

/// A source of decoded API responses.
///
/// The pagination logic only needs this one operation, which keeps it
/// independent of the HTTP stack.
#[cfg_attr(feature = "mock", mockall::automock)]
#[async_trait(?Send)]
pub trait RecentTracksSource {
    /// Call an API method with extra query parameters and return the decoded
    /// JSON body.
    ///
    /// Fails with [`ScrobbleError::Request`] when the status is not 200.
    async fn request(&self, method: &str, params: &[(String, String)]) -> Result<Value>;
}

/// Identity parameters sent with every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiIdentity {
    pub user: String,
    pub api_key: String,
}

impl ApiIdentity {
    pub fn new(user: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            api_key: api_key.into(),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(
            config.get(crate::config::LASTFM_USER)?,
            config.get(crate::config::LASTFM_KEY)?,
        ))
    }

    /// Full parameter set for one call: identity, response format, method,
    /// then the caller's parameters.
    pub fn query_for(&self, method: &str, params: &[(String, String)]) -> Vec<(String, String)> {
        let mut query = vec![
            ("user".to_string(), self.user.clone()),
            ("api_key".to_string(), self.api_key.clone()),
            ("format".to_string(), "json".to_string()),
            ("method".to_string(), method.to_string()),
        ];
        query.extend(params.iter().cloned());
        query
    }
}

#[derive(Clone)]
pub struct LastFmApiClientImpl {
    client: Arc<dyn HttpClient + Send + Sync>,
    identity: ApiIdentity,
    base_url: String,
    broadcaster: Arc<SharedEventBroadcaster>,
}

impl LastFmApiClientImpl {
    pub fn new(client: Box<dyn HttpClient + Send + Sync>, identity: ApiIdentity) -> Self {
        Self::with_base_url(client, identity, API_ROOT.to_string())
    }

    /// Create a client against another endpoint (useful for testing).
    pub fn with_base_url(
        client: Box<dyn HttpClient + Send + Sync>,
        identity: ApiIdentity,
        base_url: String,
    ) -> Self {
        Self {
            client: Arc::from(client),
            identity,
            base_url,
            broadcaster: Arc::new(SharedEventBroadcaster::new()),
        }
    }

    /// Create a client with `LASTFM_USER`/`LASTFM_KEY` from the config.
    pub fn from_config(client: Box<dyn HttpClient + Send + Sync>, config: &Config) -> Result<Self> {
        Ok(Self::new(client, ApiIdentity::from_config(config)?))
    }

    pub fn subscribe(&self) -> ClientEventReceiver {
        self.broadcaster.subscribe()
    }

    pub fn latest_event(&self) -> Option<ClientEvent> {
        self.broadcaster.latest_event()
    }

    pub fn broadcaster(&self) -> &SharedEventBroadcaster {
        &self.broadcaster
    }

    pub fn username(&self) -> &str {
        &self.identity.user
    }

    /// Iterate over the user's recent tracks, reporting page progress on this
    /// client's event channel.
    pub fn recent_tracks(
        &self,
        query: RecentTracksQuery,
    ) -> Box<dyn AsyncPaginatedIterator<RawTrack> + '_> {
        Box::new(
            RecentTracksIterator::new(self, query)
                .with_broadcaster(self.broadcaster.as_ref().clone()),
        )
    }

    fn build_url(&self, method: &str, params: &[(String, String)]) -> Result<Url> {
        let query = self.identity.query_for(method, params);
        Url::parse_with_params(&self.base_url, &query)
            .map_err(|e| ScrobbleError::Http(format!("invalid URL {}: {e}", self.base_url)))
    }
}

#[async_trait(?Send)]
impl RecentTracksSource for LastFmApiClientImpl {
    async fn request(&self, method: &str, params: &[(String, String)]) -> Result<Value> {
        let url = self.build_url(method, params)?;

        let request_info = RequestInfo::from_url_and_method(&url, "GET");
        let request_start = std::time::Instant::now();
        log::debug!("Requesting {}", request_info.short_description());

        self.broadcaster.broadcast_event(ClientEvent::RequestStarted {
            request: request_info.clone(),
        });

        let request = Request::new(Method::Get, url);
        let mut response = self
            .client
            .send(request)
            .await
            .map_err(|e| ScrobbleError::Http(e.to_string()))?;

        let status: u16 = response.status().into();
        self.broadcaster.broadcast_event(ClientEvent::RequestCompleted {
            request: request_info,
            status_code: status,
            duration_ms: request_start.elapsed().as_millis() as u64,
        });

        let body = response
            .body_string()
            .await
            .map_err(|e| ScrobbleError::Http(e.to_string()))?;

        if status != 200 {
            let message = error_message(&body);
            log::debug!("{method} failed with status {status}: {message}");
            return Err(ScrobbleError::Request { status, message });
        }

        serde_json::from_str(&body).map_err(|e| ScrobbleError::Parse(e.to_string()))
    }
}

/// Extract the `message` field of an API error body. Non-JSON bodies and
/// bodies without a message yield an empty string.
pub fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_default()
}

// =============================================================================
// Response documents
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct ApiRecentTracksResponse {
    pub recenttracks: ApiRecentTracks,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiRecentTracks {
    #[serde(default, deserialize_with = "one_or_many")]
    pub track: Vec<RawTrack>,
    #[serde(rename = "@attr")]
    pub attr: ApiPaginationAttr,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ApiPaginationAttr {
    #[serde(default)]
    pub page: Option<String>,
    /// Usually a string; numeric values are kept in their decimal form.
    #[serde(rename = "totalPages", deserialize_with = "string_or_number")]
    pub total_pages: String,
}

/// One entry of `recenttracks.track`.
///
/// Every field is optional: absence is reported by scrobble validation with
/// the name of the missing field rather than by the response parser.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawTrack {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub mbid: Option<String>,
    #[serde(default)]
    pub artist: Option<RawArtist>,
    #[serde(default)]
    pub album: Option<RawTextField>,
    #[serde(default)]
    pub date: Option<RawDate>,
    /// Out-of-band marker, present on the "now playing" entry. A present key
    /// is `Some` even when its value is `null`.
    #[serde(default, rename = "@attr", deserialize_with = "present_key")]
    pub attr: Option<Value>,
}

impl RawTrack {
    pub fn is_marked(&self) -> bool {
        self.attr.is_some()
    }

    /// Decode one element of the track list. A type mismatch names the track
    /// index and the offending top-level field.
    fn from_element(index: usize, element: Value) -> std::result::Result<Self, String> {
        match RawTrack::deserialize(&element) {
            Ok(track) => Ok(track),
            Err(e) => {
                let field = element.as_object().and_then(|fields| {
                    fields.iter().find_map(|(key, value)| {
                        let single =
                            Value::Object([(key.clone(), value.clone())].into_iter().collect());
                        RawTrack::deserialize(&single).err().map(|_| key.clone())
                    })
                });
                Err(match field {
                    Some(field) => format!("track {index}: field `{field}`: {e}"),
                    None => format!("track {index}: {e}"),
                })
            }
        }
    }
}

/// Artist container. The plain API form carries the name in `#text`, the
/// extended form in `name`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RawArtist {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "#text")]
    pub text: Option<String>,
    #[serde(default)]
    pub mbid: Option<String>,
}

impl RawArtist {
    pub fn display_name(&self) -> Option<&str> {
        self.name.as_deref().or(self.text.as_deref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RawTextField {
    #[serde(default, rename = "#text")]
    pub text: Option<String>,
    #[serde(default)]
    pub mbid: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawDate {
    /// Either a JSON string or number; coerced during validation.
    #[serde(default)]
    pub uts: Option<Value>,
    #[serde(default, rename = "#text")]
    pub text: Option<String>,
}

/// The API sends a bare object instead of a list when a page holds one track.
fn one_or_many<'de, D>(deserializer: D) -> std::result::Result<Vec<RawTrack>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Array(elements) => elements
            .into_iter()
            .enumerate()
            .map(|(index, element)| RawTrack::from_element(index, element))
            .collect::<std::result::Result<Vec<_>, String>>()
            .map_err(D::Error::custom),
        element @ Value::Object(_) => RawTrack::from_element(0, element)
            .map(|track| vec![track])
            .map_err(D::Error::custom),
        other => Err(D::Error::custom(format!(
            "track list is neither an array nor an object: {other}"
        ))),
    }
}

fn present_key<'de, D>(deserializer: D) -> std::result::Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(D::Error::custom(format!(
            "expected a string or a number, found {other}"
        ))),
    }
}

pub fn parse_recent_tracks_response(body: Value) -> Result<ApiRecentTracks> {
    let response: ApiRecentTracksResponse =
        serde_json::from_value(body).map_err(|e| ScrobbleError::Parse(e.to_string()))?;
    Ok(response.recenttracks)
}

/// Parse `totalPages`. Anything but a non-negative integer fails fast.
pub fn parse_total_pages(attr: &ApiPaginationAttr) -> Result<u32> {
    attr.total_pages.trim().parse::<u32>().map_err(|_| {
        ScrobbleError::Parse(format!(
            "totalPages is not a page count: {:?}",
            attr.total_pages
        ))
    })
}
