//! Client activity events.
//!
//! The API client and the recent-tracks iterator report what they do through a
//! broadcast channel. Consumers can subscribe to follow a collection run or
//! just peek at the latest event.

use http_types::Url;
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, watch};

/// Request information for client events.
///
/// The `api_key` query parameter is masked so events can be logged freely.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestInfo {
    /// The HTTP method (always GET for this API)
    pub method: String,
    /// Path without query parameters
    pub path: String,
    /// Query parameters as key-value pairs
    pub query_params: Vec<(String, String)>,
}

impl RequestInfo {
    pub fn from_url_and_method(url: &Url, method: &str) -> Self {
        let query_params = url
            .query_pairs()
            .map(|(k, v)| {
                let value = if k == "api_key" {
                    "***".to_string()
                } else {
                    v.into_owned()
                };
                (k.into_owned(), value)
            })
            .collect();

        Self {
            method: method.to_string(),
            path: url.path().to_string(),
            query_params,
        }
    }

    /// Value of a query parameter, if present.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.query_params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Get a short description of the request for logging
    pub fn short_description(&self) -> String {
        let mut desc = format!("{} {}", self.method, self.path);
        if let Some(method) = self.param("method") {
            desc.push_str(&format!(" {method}"));
        }
        if let Some(page) = self.param("page") {
            desc.push_str(&format!(" page={page}"));
        }
        desc
    }
}

/// Event type to describe client activity
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ClientEvent {
    /// Request started
    RequestStarted {
        /// Request details
        request: RequestInfo,
    },
    /// Response received, whatever its status
    RequestCompleted {
        /// Request details
        request: RequestInfo,
        /// HTTP status code
        status_code: u16,
        /// Duration of the request in milliseconds
        duration_ms: u64,
    },
    /// One page of recent tracks was fetched and corrected
    PageFetched {
        /// Page number (1-indexed)
        page: u32,
        /// Total pages reported by the discovery request
        total_pages: u32,
        /// Tracks kept from this page
        tracks: usize,
        /// Whether a leading now-playing entry was dropped
        dropped_now_playing: bool,
    },
}

/// Type alias for the broadcast receiver
pub type ClientEventReceiver = broadcast::Receiver<ClientEvent>;

/// Shared event broadcasting state that persists across client clones
#[derive(Clone)]
pub struct SharedEventBroadcaster {
    event_tx: broadcast::Sender<ClientEvent>,
    last_event_tx: watch::Sender<Option<ClientEvent>>,
}

impl SharedEventBroadcaster {
    pub fn new() -> Self {
        let (event_tx, _) = broadcast::channel(100);
        let (last_event_tx, _) = watch::channel(None);

        Self {
            event_tx,
            last_event_tx,
        }
    }

    /// Broadcast an event to all subscribers
    pub fn broadcast_event(&self, event: ClientEvent) {
        let _ = self.event_tx.send(event.clone());
        self.last_event_tx.send_replace(Some(event));
    }

    pub fn subscribe(&self) -> ClientEventReceiver {
        self.event_tx.subscribe()
    }

    pub fn latest_event(&self) -> Option<ClientEvent> {
        self.last_event_tx.borrow().clone()
    }
}

impl Default for SharedEventBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SharedEventBroadcaster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedEventBroadcaster")
            .field("subscribers", &self.event_tx.receiver_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_info_masks_api_key() {
        let url = Url::parse(
            "http://ws.audioscrobbler.com/2.0/?user=someone&api_key=secret&format=json&method=user.getrecenttracks&page=2",
        )
        .unwrap();

        let info = RequestInfo::from_url_and_method(&url, "GET");

        assert_eq!(info.path, "/2.0/");
        assert_eq!(info.param("api_key"), Some("***"));
        assert_eq!(info.param("user"), Some("someone"));
        assert_eq!(
            info.short_description(),
            "GET /2.0/ user.getrecenttracks page=2"
        );
    }

    #[test]
    fn test_latest_event_survives_without_subscribers() {
        let broadcaster = SharedEventBroadcaster::new();
        assert!(broadcaster.latest_event().is_none());

        let event = ClientEvent::PageFetched {
            page: 1,
            total_pages: 3,
            tracks: 200,
            dropped_now_playing: true,
        };
        broadcaster.broadcast_event(event.clone());

        assert_eq!(broadcaster.latest_event(), Some(event));
    }
}
