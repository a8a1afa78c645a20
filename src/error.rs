//! Error types for the Los Libros reader

use thiserror::Error;

use crate::highlights::InjectError;
use crate::menu::MenuError;
use crate::surface::{QueryError, SurfaceError};

/// Reader-wide result type
pub type Result<T> = std::result::Result<T, ReaderError>;

/// Reader error type
#[derive(Error, Debug)]
pub enum ReaderError {
    #[error("Page is not attached to a rendering surface")]
    Detached,

    #[error("Surface query unavailable: {0}")]
    Query(#[from] QueryError),

    #[error("Rendering surface error: {0}")]
    Surface(#[from] SurfaceError),

    #[error("Highlight locator not found: {0}")]
    LocatorNotFound(String),

    #[error("Malformed highlight record: {0}")]
    MalformedRecord(String),

    #[error("Document preparation failed: {0}")]
    Inject(#[from] InjectError),

    #[error(transparent)]
    Menu(#[from] MenuError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ReaderError {
    /// Whether the failure only means "not shown this pass".
    ///
    /// Unavailable queries, stale completions, detached pages and
    /// unanchorable highlights degrade to a no-op; store and document
    /// failures are reported to the caller.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ReaderError::Detached
                | ReaderError::Query(_)
                | ReaderError::LocatorNotFound(_)
                | ReaderError::MalformedRecord(_)
                | ReaderError::Menu(_)
        )
    }

    /// Whether the result arrived after the owning page was recycled
    pub fn is_stale(&self) -> bool {
        matches!(self, ReaderError::Query(QueryError::Stale))
    }
}
