//! Provider adapters.
//!
//! Each backend implements [`Provider`]: generate `k` responses for one
//! prompt, with per-attempt caching and (for network backends) per-attempt
//! retry with backoff.
//!
//! | Adapter            | Fan-out    | Retry | Cache key                  |
//! |--------------------|------------|-------|----------------------------|
//! | [`OpenAiProvider`] | concurrent | yes   | prompt prefix + seed + hash |
//! | [`MistralProvider`]| concurrent | yes   | hash of all arguments      |
//! | [`LocalProvider`]  | sequential | no    | prompt prefix + seed + hash |

mod http;
pub mod local;
pub mod mistral;
pub mod openai;
pub mod retry;
pub mod traits;

pub use local::{CompletionEngine, LocalCompletionRequest, LocalModelConfig, LocalProvider};
pub use mistral::MistralProvider;
pub use openai::OpenAiProvider;
pub use retry::{RetryConfig, with_retry};
pub use traits::Provider;
