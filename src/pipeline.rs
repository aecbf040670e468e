use crate::api::RecentTracksSource;
use crate::enrich::{enrich, ScrobbleTable};
use crate::iterator::{fetch_all_recent_tracks, RecentTracksQuery};
use crate::transform::transform_all;
use crate::Result;

/// Run a full collection: fetch every page, validate every track, enrich the
/// batch.
///
/// Each stage is all-or-nothing, so the first error of any stage is returned
/// and no partial table is produced. A user with no history in the requested
/// range yields [`ScrobbleError::NoNewData`](crate::ScrobbleError::NoNewData).
pub async fn collect_enriched_scrobbles<S: RecentTracksSource + ?Sized>(
    source: &S,
    query: &RecentTracksQuery,
) -> Result<ScrobbleTable> {
    let raw_tracks = fetch_all_recent_tracks(source, query).await?;
    log::info!("Fetched {} tracks", raw_tracks.len());

    let scrobbles = transform_all(&raw_tracks)?;
    enrich(&scrobbles)
}
