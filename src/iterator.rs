use crate::api::{
    parse_recent_tracks_response, parse_total_pages, RawTrack, RecentTracksSource,
    RECENT_TRACKS_METHOD,
};
use crate::events::{ClientEvent, SharedEventBroadcaster};
use crate::{Result, ScrobbleError};

use async_trait::async_trait;

/// Async iterator trait for paginated Last.fm data.
///
/// Pages are fetched lazily, one at a time and in page order.
#[async_trait(?Send)]
pub trait AsyncPaginatedIterator<T> {
    /// Fetch the next item from the iterator.
    ///
    /// This method automatically handles pagination, fetching new pages as needed.
    /// Returns `None` when there are no more items available.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(item))` - Next item in the sequence
    /// - `Ok(None)` - No more items available
    /// - `Err(...)` - Network or parsing error occurred
    async fn next(&mut self) -> Result<Option<T>>;

    /// Collect all remaining items into a Vec.
    ///
    /// **Warning**: This method will fetch ALL remaining pages, which can be
    /// tens of thousands of scrobbles for an old account. Use
    /// [`take`](Self::take) for bounded collection.
    async fn collect_all(&mut self) -> Result<Vec<T>> {
        let mut items = Vec::new();
        while let Some(item) = self.next().await? {
            items.push(item);
        }
        Ok(items)
    }

    /// Take up to n items from the iterator.
    ///
    /// # Arguments
    ///
    /// * `n` - Maximum number of items to collect
    async fn take(&mut self, n: usize) -> Result<Vec<T>> {
        let mut items = Vec::new();
        for _ in 0..n {
            match self.next().await? {
                Some(item) => items.push(item),
                None => break,
            }
        }
        Ok(items)
    }

    /// Get the number of the most recently fetched page (1-indexed, 0 before
    /// the first page).
    fn current_page(&self) -> u32;

    /// Get the total number of pages, if known.
    ///
    /// This information is not available until the first request completed.
    fn total_pages(&self) -> Option<u32> {
        None
    }
}

/// Parameters of a recent tracks collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecentTracksQuery {
    /// Tracks per page (the API caps this at 200)
    pub limit: u32,
    /// Only plays at or after this Unix timestamp
    pub from: Option<i64>,
    /// Only plays at or before this Unix timestamp
    pub to: Option<i64>,
}

impl Default for RecentTracksQuery {
    fn default() -> Self {
        Self {
            limit: 200,
            from: None,
            to: None,
        }
    }
}

impl RecentTracksQuery {
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_range(mut self, from: Option<i64>, to: Option<i64>) -> Self {
        self.from = from;
        self.to = to;
        self
    }

    /// `limit`, then the bounds that are set.
    fn base_params(&self) -> Vec<(String, String)> {
        let mut params = vec![("limit".to_string(), self.limit.to_string())];
        if let Some(from) = self.from {
            params.push(("from".to_string(), from.to_string()));
        }
        if let Some(to) = self.to {
            params.push(("to".to_string(), to.to_string()));
        }
        params
    }

    /// Parameters of the discovery request, which only reads `totalPages`.
    pub fn discovery_params(&self) -> Vec<(String, String)> {
        self.base_params()
    }

    pub fn page_params(&self, page: u32) -> Vec<(String, String)> {
        let mut params = vec![("page".to_string(), page.to_string())];
        params.extend(self.base_params());
        params
    }
}

/// Drop the first track of a page when it carries an `@attr` marker (the
/// "now playing" entry). Only the front of the page is inspected.
///
/// Returns whether an entry was dropped.
pub fn drop_leading_now_playing(tracks: &mut Vec<RawTrack>) -> bool {
    if tracks.first().is_some_and(RawTrack::is_marked) {
        tracks.remove(0);
        true
    } else {
        false
    }
}

/// Iterator over a user's whole listening history.
///
/// The first call to [`next`](AsyncPaginatedIterator::next) issues a discovery
/// request to learn the page count, then every page from 1 to the total is
/// requested in order, page 1 included. A discovery response reporting zero
/// pages ends the iteration with [`ScrobbleError::NoNewData`].
pub struct RecentTracksIterator<'a, S: RecentTracksSource + ?Sized> {
    source: &'a S,
    query: RecentTracksQuery,
    broadcaster: Option<SharedEventBroadcaster>,
    current_page: u32,
    total_pages: Option<u32>,
    buffer: Vec<RawTrack>,
    finished: bool,
}

#[async_trait(?Send)]
impl<'a, S: RecentTracksSource + ?Sized> AsyncPaginatedIterator<RawTrack>
    for RecentTracksIterator<'a, S>
{
    async fn next(&mut self) -> Result<Option<RawTrack>> {
        loop {
            if let Some(track) = self.buffer.pop() {
                return Ok(Some(track));
            }
            if self.finished {
                return Ok(None);
            }

            let total_pages = match self.total_pages {
                Some(total) => total,
                None => {
                    let total = self.discover_total_pages().await?;
                    self.total_pages = Some(total);
                    total
                }
            };

            if self.current_page >= total_pages {
                log::debug!("All {total_pages} pages of recent tracks fetched");
                self.finished = true;
                return Ok(None);
            }

            let page = self.current_page + 1;
            let tracks = self.fetch_page(page, total_pages).await?;
            self.current_page = page;
            self.buffer = tracks;
            self.buffer.reverse(); // Reverse so we can pop from end efficiently
        }
    }

    fn current_page(&self) -> u32 {
        self.current_page
    }

    fn total_pages(&self) -> Option<u32> {
        self.total_pages
    }
}

impl<'a, S: RecentTracksSource + ?Sized> RecentTracksIterator<'a, S> {
    pub fn new(source: &'a S, query: RecentTracksQuery) -> Self {
        Self {
            source,
            query,
            broadcaster: None,
            current_page: 0,
            total_pages: None,
            buffer: Vec::new(),
            finished: false,
        }
    }

    /// Report a [`ClientEvent::PageFetched`] for every page.
    pub fn with_broadcaster(mut self, broadcaster: SharedEventBroadcaster) -> Self {
        self.broadcaster = Some(broadcaster);
        self
    }

    async fn discover_total_pages(&mut self) -> Result<u32> {
        let body = self
            .source
            .request(RECENT_TRACKS_METHOD, &self.query.discovery_params())
            .await?;
        let recent = parse_recent_tracks_response(body)?;

        let total_pages = parse_total_pages(&recent.attr)?;
        if total_pages == 0 {
            log::info!("No new scrobbles to add");
            self.finished = true;
            return Err(ScrobbleError::NoNewData);
        }
        log::debug!("Recent tracks span {total_pages} pages");
        Ok(total_pages)
    }

    async fn fetch_page(&self, page: u32, total_pages: u32) -> Result<Vec<RawTrack>> {
        log::debug!("Fetching recent tracks page {page}/{total_pages}");

        let body = self
            .source
            .request(RECENT_TRACKS_METHOD, &self.query.page_params(page))
            .await?;
        let mut tracks = parse_recent_tracks_response(body)?.track;

        let dropped_now_playing = drop_leading_now_playing(&mut tracks);
        if dropped_now_playing {
            log::debug!("Dropped now playing entry at the top of page {page}");
        }

        if let Some(broadcaster) = &self.broadcaster {
            broadcaster.broadcast_event(ClientEvent::PageFetched {
                page,
                total_pages,
                tracks: tracks.len(),
                dropped_now_playing,
            });
        }

        Ok(tracks)
    }
}

/// Fetch every page of the user's recent tracks and concatenate them in page
/// order, with the leading now-playing entry of each page removed.
///
/// # Examples
///
/// ```rust,no_run
/// # use scrobble_ingest::{fetch_all_recent_tracks, ApiIdentity, LastFmApiClientImpl, RecentTracksQuery};
/// # tokio_test::block_on(async {
/// let client = LastFmApiClientImpl::new(
///     Box::new(http_client::native::NativeClient::new()),
///     ApiIdentity::new("username", "api_key"),
/// );
///
/// let query = RecentTracksQuery::default().with_range(Some(1765000000), None);
/// let tracks = fetch_all_recent_tracks(&client, &query).await?;
/// println!("{} tracks", tracks.len());
/// # Ok::<(), scrobble_ingest::ScrobbleError>(())
/// # });
/// ```
pub async fn fetch_all_recent_tracks<S: RecentTracksSource + ?Sized>(
    source: &S,
    query: &RecentTracksQuery,
) -> Result<Vec<RawTrack>> {
    RecentTracksIterator::new(source, query.clone())
        .collect_all()
        .await
}
