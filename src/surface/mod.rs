//! Rendering surface contract
//!
//! The HTML rendering engine is external. This module defines what the
//! reader needs from it and how queries against it are sequenced:
//!
//! - `RenderingSurface`: load a document, evaluate scripts, apply native
//!   scroll behavior
//! - `ReadyQuery`: the two-step readiness-then-query chain
//! - `PageGeneration` / `CompletionGuard`: stale-completion suppression
//!   for recycled pages
//! - `scripts`: builders for every script the reader evaluates

mod chain;
mod guard;
pub mod scripts;

#[cfg(test)]
pub(crate) mod testing;

pub use chain::{evaluate_guarded, QueryError, QueryState, ReadyQuery};
pub use guard::{CompletionGuard, PageGeneration};

use async_trait::async_trait;
use serde_json::Value;

use crate::pagination::ScrollBehavior;

/// Errors reported by the rendering surface itself
#[derive(Debug, Clone, thiserror::Error)]
pub enum SurfaceError {
    #[error("Script evaluation failed: {0}")]
    Script(String),

    #[error("Document load failed: {0}")]
    Load(String),

    #[error("Rendering surface is gone")]
    Gone,
}

/// An HTML rendering surface that can run scripts against its document
///
/// Results are delivered asynchronously; implementations never block the
/// caller's thread.
#[async_trait]
pub trait RenderingSurface: Send + Sync {
    /// Replace the current document
    async fn load_document(&self, html: &str, base_url: Option<&str>) -> Result<(), SurfaceError>;

    /// Evaluate a script in the document and return its JSON-converted result.
    ///
    /// Scripts that produce `undefined` resolve to `Value::Null`.
    async fn evaluate(&self, script: &str) -> Result<Value, SurfaceError>;

    /// Apply native paging snap and bounce settings
    fn apply_scroll_behavior(&self, behavior: ScrollBehavior);
}
