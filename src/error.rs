use thiserror::Error;

/// Error types for scrobble collection.
///
/// Every stage of the pipeline is all-or-nothing: the first error aborts the
/// whole run and is returned unchanged to the caller.
///
/// # Error Handling Examples
///
/// ```rust,no_run
/// use scrobble_ingest::{
///     collect_enriched_scrobbles, Config, LastFmApiClientImpl, RecentTracksQuery, ScrobbleError,
/// };
///
/// #[tokio::main]
/// async fn main() {
///     let config = Config::from_env();
///     let client = LastFmApiClientImpl::from_config(
///         Box::new(http_client::native::NativeClient::new()),
///         &config,
///     )
///     .expect("credentials");
///
///     match collect_enriched_scrobbles(&client, &RecentTracksQuery::default()).await {
///         Ok(table) => println!("{} scrobbles", table.len()),
///         Err(ScrobbleError::NoNewData) => println!("Nothing to do"),
///         Err(ScrobbleError::Request { status, message }) => {
///             eprintln!("Last.fm answered {status}: {message}")
///         }
///         Err(e) => eprintln!("Other error: {e}"),
///     }
/// }
/// ```
#[derive(Error, Debug)]
pub enum ScrobbleError {
    /// HTTP/network related errors.
    ///
    /// Connection failures, DNS errors and body read failures. The request
    /// never produced a usable response.
    #[error("HTTP error: {0}")]
    Http(String),

    /// The API answered with a status other than 200.
    ///
    /// `message` is the `message` field of the JSON error body, or empty when
    /// the body carried none. Requests are never retried.
    #[error("status_code: {status}, message: {message}")]
    Request {
        /// HTTP status code of the response
        status: u16,
        /// Message reported by the API
        message: String,
    },

    /// The API reported zero pages of history.
    ///
    /// This is the normal "nothing to do" outcome of a collection run.
    /// Callers that accept an empty result should match on it explicitly.
    #[error("no new scrobbles to add")]
    NoNewData,

    /// A record does not satisfy the [`Scrobble`](crate::Scrobble) shape.
    #[error("invalid `{field}`: {reason}")]
    Validation {
        /// Name of the offending scrobble field
        field: &'static str,
        /// What was wrong with it
        reason: String,
    },

    /// A response body does not match the expected document shape.
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// A credential is missing or the env file could not be read.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ScrobbleError {
    pub(crate) fn missing(field: &'static str) -> Self {
        ScrobbleError::Validation {
            field,
            reason: "field required".to_string(),
        }
    }

    /// Whether this error is the "nothing to collect" signal rather than a fault.
    pub fn is_no_new_data(&self) -> bool {
        matches!(self, ScrobbleError::NoNewData)
    }
}
