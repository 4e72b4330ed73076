//! Shared application state.

use std::time::{Duration, Instant};

use parking_lot::RwLock;

use juris_core::JurisConfig;
use juris_invoke::{ChunkPolicy, InvokeOptions, RetryPolicy};
use juris_providers::{HttpTransport, ProviderConfig};

/// Shared application state accessible from all route handlers.
pub struct AppState {
    pub config: JurisConfig,
    pub providers: RwLock<ProviderConfig>,
    pub transport: HttpTransport,
}

impl AppState {
    pub fn new(config: JurisConfig) -> Self {
        let providers = ProviderConfig::from_env();

        // One client for every outbound call; connection reuse matters
        // when a single invocation dispatches many chunks.
        let client = reqwest::Client::new();

        Self {
            config,
            providers: RwLock::new(providers),
            transport: HttpTransport::new(client),
        }
    }

    /// Invoke options for one request: the deadline clock starts now.
    pub fn invoke_options(&self, chunking: ChunkPolicy) -> InvokeOptions {
        InvokeOptions {
            chunking,
            retry: RetryPolicy::default(),
            attempt_timeout: Duration::from_secs(self.config.attempt_timeout_secs),
            deadline: Instant::now() + Duration::from_secs(self.config.invocation_deadline_secs),
        }
    }
}
