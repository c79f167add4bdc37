use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScoutError {
    #[error("Invalid cache name: '{name}' - {reason}")]
    InvalidName { name: String, reason: &'static str },

    #[error("Invalid source URL: '{url}' - {reason}")]
    InvalidSource { url: String, reason: String },

    #[error("Unsupported repository host: {url} (only github.com catalogs can be fetched)")]
    UnsupportedHost { url: String },

    #[error("Network error for {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP {status} from {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Response from {url} exceeds maximum allowed size ({limit} bytes)")]
    ResponseTooLarge { url: String, limit: usize },

    #[error("Failed to decode {what}: {source}")]
    Decode {
        what: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to encode {what}: {source}")]
    Encode {
        what: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Registry {url} lists no usable marketplaces")]
    EmptyRegistry { url: String },

    #[error("Corrupt cache entry {path}: {source}")]
    CacheCorrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Gave up after {attempts} attempt(s): {source}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        source: Box<ScoutError>,
    },

    #[error("All {} marketplace fetches failed", failures.len())]
    AllFetchesFailed { failures: Vec<(String, String)> },

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Configuration parse error in {path}: {message}")]
    ConfigParse { path: PathBuf, message: String },

    #[error("Unknown config key: {key}")]
    ConfigKeyNotFound { key: String },

    #[error("Home directory not found")]
    HomeNotFound,

    #[error("Worker task failed: {0}")]
    Task(String),
}

pub type Result<T> = std::result::Result<T, ScoutError>;

impl ScoutError {
    /// Whether another attempt could plausibly succeed.
    ///
    /// Connection/timeout faults and 5xx/429 responses are transient.
    /// Everything else (other 4xx, malformed bodies, validation,
    /// cancellation) fails fast.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network { source, .. } => {
                source.is_timeout()
                    || source.is_connect()
                    || source.is_request()
                    || source.is_body()
            }
            Self::HttpStatus { status, .. } => *status == 429 || (500..600).contains(status),
            _ => false,
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            Self::InvalidName { .. } | Self::InvalidSource { .. } => 2,
            Self::Network { .. } | Self::HttpStatus { .. } | Self::RetriesExhausted { .. } => 3,
            Self::AllFetchesFailed { .. } => 4,
            Self::CacheCorrupt { .. } => 5,
            Self::ConfigParse { .. } | Self::ConfigKeyNotFound { .. } => 6,
            _ => 1,
        }
    }
}
