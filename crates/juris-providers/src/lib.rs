//! External provider integrations.
//!
//! Request builders and response extractors for the Gemini generative,
//! TTS and vision endpoints, the env-driven credential pools, and the
//! production reqwest transport. Incompatible response shapes stay here;
//! the invoker only sees (request, extractor) pairs.

pub mod config;
pub mod gemini;
pub mod transport;

pub use config::ProviderConfig;
pub use transport::HttpTransport;
