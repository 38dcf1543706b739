use cratedig_core::CoreError;
use thiserror::Error;

/// Errors from the network layer.
///
/// None of these are fatal to the session: the channel reconnects and a
/// failed catalog fetch leaves the navigator in its loading state.
#[derive(Debug, Error)]
pub enum NetError {
    /// The websocket handshake or an established socket failed.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// Failed to build the HTTP client or read a response body.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// A request failed after the retry middleware gave up.
    #[error("HTTP request failed: {0}")]
    Middleware(#[from] reqwest_middleware::Error),

    /// The catalog endpoint answered with a non-success status.
    #[error("Catalog request to {url} returned status {status}")]
    Status { url: String, status: u16 },

    /// A payload could not be encoded or decoded.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The channel was cancelled.
    #[error("Network channel stopped")]
    ChannelStopped,
}

/// Convenience type alias for Results with `NetError`.
pub type Result<T> = std::result::Result<T, NetError>;
