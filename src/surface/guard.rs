//! Stale-completion suppression
//!
//! A page owns a `PageGeneration`. Every query takes a `CompletionGuard`
//! when it is dispatched; recycling the page advances the generation, so
//! completions that arrive afterwards can be detected and dropped.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::chain::QueryError;

/// Generation counter shared between a page and its in-flight queries
#[derive(Debug, Clone, Default)]
pub struct PageGeneration {
    current: Arc<AtomicU64>,
}

impl PageGeneration {
    pub fn new() -> Self {
        Self::default()
    }

    /// The current generation
    pub fn current(&self) -> u64 {
        self.current.load(Ordering::Acquire)
    }

    /// Invalidate every guard issued so far and return the new generation
    pub fn advance(&self) -> u64 {
        self.current.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Issue a guard bound to the current generation
    pub fn guard(&self) -> CompletionGuard {
        CompletionGuard {
            generation: self.clone(),
            issued: self.current(),
        }
    }
}

/// Token carried by a query from dispatch to completion
#[derive(Debug, Clone)]
pub struct CompletionGuard {
    generation: PageGeneration,
    issued: u64,
}

impl CompletionGuard {
    /// Whether the owning page is still the one that issued the query
    pub fn is_live(&self) -> bool {
        self.generation.current() == self.issued
    }

    /// `Err(QueryError::Stale)` once the owning page has been recycled
    pub fn check(&self) -> Result<(), QueryError> {
        if self.is_live() {
            Ok(())
        } else {
            Err(QueryError::Stale)
        }
    }
}
