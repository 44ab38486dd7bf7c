//! The provider contract.
//!
//! Every backend generates `k` raw text responses for one prompt. Attempt
//! `i` (`0..k`) is sent with seed `i`, so attempts at the same prompt sample
//! differently where the backend supports seeding, and each attempt gets its
//! own cache entry.
//!
//! # Batch semantics
//!
//! - Results are index-aligned: element `i` is the response for seed `i`,
//!   whatever order the attempts completed in.
//! - Fail-fast: if any attempt fails after its retries, the whole batch fails
//!   and no partial results are returned.
//!
//! # Example
//!
//! ```ignore
//! let responses = provider
//!     .generate_responses("Name a colour.", 3, &ProviderConfig::new().length(16))
//!     .await?;
//! assert_eq!(responses.len(), 3);
//! ```

use std::future::Future;

use async_trait::async_trait;

use crate::Result;
use crate::types::ProviderConfig;

/// A backend that produces `k` completions for a prompt.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Provider name for logging/debugging.
    fn name(&self) -> &str;

    /// Generate `k` responses for `prompt`, one per seed `0..k`.
    async fn generate_responses(
        &self,
        prompt: &str,
        k: usize,
        config: &ProviderConfig,
    ) -> Result<Vec<String>>;

    /// Blocking wrapper around [`generate_responses()`](Self::generate_responses).
    ///
    /// Runs the batch to completion on a private current-thread runtime.
    /// Must not be called from inside an async context.
    fn sync_generate_responses(
        &self,
        prompt: &str,
        k: usize,
        config: &ProviderConfig,
    ) -> Result<Vec<String>> {
        block_on(self.generate_responses(prompt, k, config))?
    }
}

/// Drive `future` to completion on a fresh current-thread runtime.
pub(crate) fn block_on<F: Future>(future: F) -> Result<F::Output> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    Ok(runtime.block_on(future))
}
