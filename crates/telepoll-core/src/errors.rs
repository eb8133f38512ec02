use crate::domain::UpdateId;

/// Boxed cause carried by transport failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Core error type for the bot API client.
///
/// Transport implementations map their specific failures into `Transport` so the
/// cursor and the facade can surface them uniformly.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("transport error on {endpoint}: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: BoxError,
    },

    #[error("failed to decode {endpoint} response: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("api error on {endpoint}: {description}")]
    Api {
        endpoint: String,
        error_code: Option<i64>,
        description: String,
    },

    #[error("{endpoint} response has no result")]
    MissingResult { endpoint: String },

    #[error("no updates available")]
    EmptyBatch,

    #[error("update {0} not found in current batch")]
    NotFound(UpdateId),
}

impl Error {
    pub fn transport(endpoint: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Error::Transport {
            endpoint: endpoint.into(),
            source: source.into(),
        }
    }

    /// True for outcomes that mean "nothing to work with" rather than a broken exchange.
    ///
    /// A polling loop treats these as its steady state.
    pub fn is_no_data(&self) -> bool {
        matches!(
            self,
            Error::EmptyBatch | Error::NotFound(_) | Error::Api { .. } | Error::MissingResult { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
