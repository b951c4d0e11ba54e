//! Consent/DAR restriction matching seam.

use std::sync::Arc;

use async_trait::async_trait;
use dac_common::AppResult;

/// Computes whether a DAR's research purpose satisfies a consent's data use
/// restriction. Results feed manual-review flags outside the core.
#[async_trait]
pub trait MatchEngine: Send + Sync {
    /// Request a match computation for a consent and a DAR.
    async fn request_match(&self, consent_id: &str, dar_id: &str) -> AppResult<()>;
}

/// A no-op implementation of `MatchEngine` for when matching is disabled.
#[derive(Clone, Default)]
pub struct NoOpMatchEngine;

#[async_trait]
impl MatchEngine for NoOpMatchEngine {
    async fn request_match(&self, _consent_id: &str, _dar_id: &str) -> AppResult<()> {
        Ok(())
    }
}

/// Wrapper for shared `MatchEngine` trait object.
pub type MatchEngineService = Arc<dyn MatchEngine>;
