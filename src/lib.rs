//! Collect a user's Last.fm listening history, validate every scrobble and
//! enrich the batch for storage.
//!
//! The pipeline has three stages:
//!
//! 1. [`fetch_all_recent_tracks`] walks every page of `user.getrecenttracks`
//!    through a [`RecentTracksSource`], dropping the "now playing" entry at the
//!    top of each page.
//! 2. [`transform_all`] turns each raw track document into a validated
//!    [`Scrobble`].
//! 3. [`enrich()`] builds a [`ScrobbleTable`] with a `fechahora` column and the
//!    `"[Desconocido]"` placeholder for missing albums.
//!
//! [`collect_enriched_scrobbles`] chains the three.

pub mod api;
pub mod config;
pub mod database;
pub mod enrich;
pub mod error;
pub mod events;
pub mod iterator;
pub mod pipeline;
pub mod scrobble;
pub mod transform;

pub use api::{ApiIdentity, LastFmApiClientImpl, RawTrack, RecentTracksSource};
pub use config::Config;
pub use database::DatabaseSettings;
pub use enrich::{enrich, EnrichedRow, ScrobbleTable, UNKNOWN_ALBUM};
pub use error::ScrobbleError;
pub use events::{ClientEvent, ClientEventReceiver, RequestInfo, SharedEventBroadcaster};
pub use iterator::{
    fetch_all_recent_tracks, AsyncPaginatedIterator, RecentTracksIterator, RecentTracksQuery,
};
pub use pipeline::collect_enriched_scrobbles;
pub use scrobble::Scrobble;
pub use transform::{extract, transform_all};

#[cfg(feature = "mock")]
pub use api::MockRecentTracksSource;

pub type Result<T> = std::result::Result<T, ScrobbleError>;
