use std::sync::Arc;

pub type CarouselResult<T> = Result<T, CarouselError>;

/// Everything that can go wrong inside the carousel. None of these ever
/// reach the visitor: callers log them and fall back to a placeholder.
///
/// Cloneable so one failed image fetch can be reported to every card that
/// shows that image.
#[derive(thiserror::Error, Debug, Clone)]
pub enum CarouselError {
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("fetch failed: {0}")]
    Fetch(String),

    #[error("decode failed: {0}")]
    Decode(String),

    #[error("canvas error: {0}")]
    Canvas(String),

    #[error("manifest error: {0}")]
    Manifest(Arc<serde_json::Error>),
}

impl From<serde_json::Error> for CarouselError {
    fn from(e: serde_json::Error) -> Self {
        Self::Manifest(Arc::new(e))
    }
}

impl CarouselError {
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    pub fn fetch(msg: impl Into<String>) -> Self {
        Self::Fetch(msg.into())
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    pub fn canvas(msg: impl Into<String>) -> Self {
        Self::Canvas(msg.into())
    }
}
