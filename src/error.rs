use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("server answered with HTTP {0}")]
    Http(reqwest::StatusCode),
    #[error("unexpected payload: {0}")]
    Payload(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database returned error: {0}")]
    Db(#[from] sqlx::Error),
    #[error("manga {0} is missing right after insert")]
    MissingAfterInsert(String),
}

#[derive(Debug, Error)]
pub enum CatalogueError {
    #[error("no source registered with id {0}")]
    UnknownSource(i32),
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("invalid config {path}: {source}")]
    Config {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
