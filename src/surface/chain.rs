//! Readiness-then-query chains
//!
//! Metrics and scroll commands are only meaningful once the document has
//! been parsed. `ReadyQuery` first evaluates `document.readyState` and only
//! from that completion issues the dependent script, so the two never run
//! concurrently.

use serde_json::Value;

use super::guard::CompletionGuard;
use super::{scripts, RenderingSurface, SurfaceError};

/// Progress of a two-step query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryState {
    Idle,
    AwaitingReadiness,
    AwaitingResult,
    Done,
    Failed,
}

/// Why a surface query produced no usable result
#[derive(Debug, Clone, thiserror::Error)]
pub enum QueryError {
    #[error("Document not ready (readyState: {0})")]
    NotReady(String),

    #[error("Malformed response to {0}")]
    Malformed(String),

    #[error("Completion arrived after the page was recycled")]
    Stale,

    #[error("Rendering surface error: {0}")]
    Surface(#[from] SurfaceError),
}

/// A two-step query against one rendering surface
pub struct ReadyQuery<'a> {
    surface: &'a dyn RenderingSurface,
    guard: CompletionGuard,
    state: QueryState,
}

impl<'a> ReadyQuery<'a> {
    pub fn new(surface: &'a dyn RenderingSurface, guard: CompletionGuard) -> Self {
        Self {
            surface,
            guard,
            state: QueryState::Idle,
        }
    }

    pub fn state(&self) -> QueryState {
        self.state
    }

    /// Wait for a parsed document, then evaluate `script`
    pub async fn run(&mut self, script: &str) -> Result<Value, QueryError> {
        self.state = QueryState::AwaitingReadiness;

        let ready = self.surface.evaluate(scripts::READY_STATE).await;
        self.settle(ready.map_err(QueryError::from))
            .and_then(|value| match value.as_str() {
                Some("interactive") | Some("complete") => Ok(()),
                _ => Err(QueryError::NotReady(value.to_string())),
            })
            .map_err(|e| self.fail(e))?;

        self.state = QueryState::AwaitingResult;

        let result = self.surface.evaluate(script).await;
        let value = self.settle(result.map_err(QueryError::from)).map_err(|e| self.fail(e))?;

        self.state = QueryState::Done;
        Ok(value)
    }

    /// Stale completions win over whatever the surface returned
    fn settle(&self, result: Result<Value, QueryError>) -> Result<Value, QueryError> {
        self.guard.check()?;
        result
    }

    fn fail(&mut self, err: QueryError) -> QueryError {
        self.state = QueryState::Failed;
        err
    }
}

/// Single-step evaluation with stale-completion suppression
pub async fn evaluate_guarded(
    surface: &dyn RenderingSurface,
    guard: &CompletionGuard,
    script: &str,
) -> Result<Value, QueryError> {
    let result = surface.evaluate(script).await;
    guard.check()?;
    Ok(result?)
}
