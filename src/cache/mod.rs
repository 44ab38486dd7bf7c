//! Response caching.
//!
//! - [`CacheStore`]: flat, file-per-key JSON store for one namespace.
//! - [`key`]: deterministic, path-safe key derivation from call arguments.
//!
//! Providers compose the two: every generation attempt derives a key from its
//! full argument set (including its seed) and goes through
//! [`CacheStore::get_or_compute()`], so identical attempts hit the disk and
//! distinct attempts at the same prompt never collide.

pub mod key;
pub mod store;

pub use key::{default_key, make_path_safe, prompt_seed_key};
pub use store::CacheStore;
