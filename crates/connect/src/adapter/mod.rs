//! Platform adapters: the capability trait, its registry and errors.

mod errors;
mod http;
mod registry;
mod traits;

pub use errors::{AdapterError, RetryClass};
pub use http::HttpPlatformAdapter;
pub use registry::AdapterRegistry;
pub use traits::PlatformAdapter;
