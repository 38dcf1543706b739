use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    // Configuration errors
    #[error("Invalid config: {message}")]
    ConfigInvalid { message: String },

    #[error("Failed to parse config file: {0}")]
    ConfigParseError(#[from] toml::de::Error),

    // Catalog / protocol errors
    #[error("Malformed JSON payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unknown view state index: {0}")]
    UnknownViewState(u8),

    #[error("Album has no disc at index {index}")]
    DiscOutOfRange { index: usize },

    #[error("Disc {disc_number} has no tracks")]
    EmptyDisc { disc_number: u32 },

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;
