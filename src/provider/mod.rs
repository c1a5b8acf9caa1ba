pub mod client;
pub mod http_client;
pub mod scrub;
pub mod traits;
pub mod types;

pub use client::{GeminiClient, GeminiFactory};
pub use http_client::build_provider_client;
pub use scrub::sanitize_api_error;
pub use traits::{MediaProvider, ProviderFactory};
