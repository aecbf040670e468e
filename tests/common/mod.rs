#![allow(dead_code)]
use async_trait::async_trait;
use http_client::{Error, HttpClient, Request, Response};
use http_types::Url;
use scrobble_ingest::{ApiIdentity, LastFmApiClientImpl};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

pub const TEST_BASE_URL: &str = "http://ws.audioscrobbler.test/2.0/";

#[derive(Debug, Clone)]
pub enum ScriptedResponse {
    Status(u16, String),
    TransportError(String),
}

impl ScriptedResponse {
    pub fn ok(body: Value) -> Self {
        ScriptedResponse::Status(200, body.to_string())
    }
}

/// In-memory HTTP client that replays scripted responses in order and records
/// every requested URL. Clones share the script and the request log.
#[derive(Debug, Clone, Default)]
pub struct ScriptedHttpClient {
    responses: Arc<Mutex<VecDeque<ScriptedResponse>>>,
    requests: Arc<Mutex<Vec<Url>>>,
}

impl ScriptedHttpClient {
    pub fn new(responses: Vec<ScriptedResponse>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses.into())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn requests(&self) -> Vec<Url> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl HttpClient for ScriptedHttpClient {
    async fn send(&self, req: Request) -> Result<Response, Error> {
        self.requests.lock().unwrap().push(req.url().clone());

        let next = self.responses.lock().unwrap().pop_front();
        match next {
            Some(ScriptedResponse::Status(status, body)) => {
                let mut response = Response::new(status);
                response.set_body(body);
                Ok(response)
            }
            Some(ScriptedResponse::TransportError(message)) => Err(Error::from_str(500u16, message)),
            None => Err(Error::from_str(500u16, "no scripted response left")),
        }
    }
}

pub fn create_test_client(http: &ScriptedHttpClient) -> LastFmApiClientImpl {
    LastFmApiClientImpl::with_base_url(
        Box::new(http.clone()),
        ApiIdentity::new("sinatxester", "fake_lastfm_key"),
        TEST_BASE_URL.to_string(),
    )
}

/// Query parameter of a recorded request.
pub fn param(url: &Url, key: &str) -> Option<String> {
    url.query_pairs()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
}

pub fn track(name: &str, uts: &str, album: &str) -> Value {
    json!({
        "artist": {"mbid": "", "#text": "Extremoduro"},
        "streamable": "0",
        "mbid": "",
        "album": {"mbid": "", "#text": album},
        "name": name,
        "url": format!("https://www.last.fm/music/Extremoduro/_/{name}"),
        "date": {"uts": uts, "#text": "12 Dec 2025, 14:32"}
    })
}

pub fn now_playing(name: &str) -> Value {
    json!({
        "artist": {"mbid": "", "#text": "Extremoduro"},
        "mbid": "",
        "album": {"mbid": "", "#text": "Agila"},
        "name": name,
        "@attr": {"nowplaying": "true"}
    })
}

pub fn recent_tracks_page(page: u32, total_pages: &str, tracks: Vec<Value>) -> Value {
    json!({
        "recenttracks": {
            "track": tracks,
            "@attr": {
                "user": "sinatxester",
                "totalPages": total_pages,
                "page": page.to_string(),
                "perPage": "200",
                "total": "0"
            }
        }
    })
}
