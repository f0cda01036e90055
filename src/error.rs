use thiserror::Error;

/// Failure while fetching a listing page.
///
/// The collector recovers from these: the affected date check becomes an
/// `error` record and the run continues.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("browser error: {0}")]
    Browser(String),

    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {status} for {url}")]
    Status { status: u16, url: String },
}

/// Failure in the persistence layer (dataset, progress file, analysis output).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
