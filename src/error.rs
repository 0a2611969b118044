//! Crate-wide error type.

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("fetch failed: {0}")]
    Fetch(String),

    #[error("no parser registered for domain '{0}' and no fallback configured")]
    NoParser(String),

    #[error("config error: {0}")]
    Config(#[from] figment::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
