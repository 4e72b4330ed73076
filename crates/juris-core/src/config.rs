//! Server configuration from environment.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Top-level Juris configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JurisConfig {
    /// HTTP server port.
    pub port: u16,
    /// Per-attempt timeout for outbound provider calls, in seconds.
    pub attempt_timeout_secs: u64,
    /// Overall deadline for one invocation (all chunks), in seconds.
    pub invocation_deadline_secs: u64,
}

impl JurisConfig {
    /// Create configuration from environment and defaults. A `PORT`
    /// that is set but unparsable is an operator mistake, not something
    /// to paper over with the default.
    pub fn from_env() -> Result<Self> {
        let port = parse_port(std::env::var("PORT").ok())?;

        let attempt_timeout_secs = env_u64("JURIS_ATTEMPT_TIMEOUT_SECS", 30);
        let invocation_deadline_secs = env_u64("JURIS_INVOCATION_DEADLINE_SECS", 120);

        Ok(Self {
            port,
            attempt_timeout_secs,
            invocation_deadline_secs,
        })
    }
}

fn parse_port(value: Option<String>) -> Result<u16> {
    match value {
        Some(v) => v
            .parse()
            .map_err(|_| Error::Config(format!("invalid PORT value: {}", v))),
        None => Ok(3004),
    }
}

fn env_u64(name: &str, default: u64) -> u64 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
