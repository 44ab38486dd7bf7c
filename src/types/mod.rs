//! Public types shared by providers and the function builder.

mod message;
mod options;

pub use message::{Message, Role};
pub use options::ProviderConfig;
