#[derive(Debug, thiserror::Error)]
pub enum InsightsError {
    #[error("DuckDB error: {0}")]
    DuckDb(#[from] duckdb::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid window: {0}")]
    InvalidWindow(String),

    #[error("Comparison '{selector}' is not supported for {granularity} periods")]
    UnsupportedSelector {
        selector: String,
        granularity: String,
    },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

pub type Result<T> = std::result::Result<T, InsightsError>;
