//! Dimensions provider
//!
//! Metrics read before the document is parsed are unreliable, so the query
//! always goes through the readiness check first.

use crate::surface::{scripts, CompletionGuard, QueryError, ReadyQuery, RenderingSurface};

use super::ContentDimensions;

/// Queries scroll metrics from a rendering surface
pub struct DimensionsProvider<'a> {
    surface: &'a dyn RenderingSurface,
}

impl<'a> DimensionsProvider<'a> {
    pub fn new(surface: &'a dyn RenderingSurface) -> Self {
        Self { surface }
    }

    /// Query the six metrics, reporting why they are unavailable
    pub async fn query(&self, guard: CompletionGuard) -> Result<ContentDimensions, QueryError> {
        let mut query = ReadyQuery::new(self.surface, guard);
        let value = query.run(scripts::CONTENT_DIMENSIONS).await?;

        ContentDimensions::from_script_result(&value)
            .ok_or_else(|| QueryError::Malformed(scripts::CONTENT_DIMENSIONS.to_string()))
    }

    /// Query the metrics; `None` means the caller should not scroll
    pub async fn query_dimensions(&self, guard: CompletionGuard) -> Option<ContentDimensions> {
        match self.query(guard).await {
            Ok(dims) => Some(dims),
            Err(e) => {
                tracing::debug!(error = %e, "Content dimensions unavailable");
                None
            }
        }
    }
}
