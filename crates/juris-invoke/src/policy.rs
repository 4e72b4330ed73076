//! Retry classification for provider responses.
//!
//! Which failures advance the rotation cursor is caller policy: some
//! downstream APIs answer quota exhaustion with 400, others reserve it
//! for malformed payloads. The invoker never decides this on its own.

/// What to do with a non-success provider response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Transient: advance to the next credential for the same chunk.
    Retryable,
    /// Abort the invocation.
    Terminal,
}

/// Caller-configured classification of provider failures.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    retryable_statuses: Vec<u16>,
    /// Substrings of the response body that signal quota exhaustion
    /// regardless of the status code. Matched case-insensitively.
    quota_markers: Vec<String>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retryable_statuses: vec![429, 503],
            quota_markers: vec![
                "quota".into(),
                "rate limit".into(),
                "resource_exhausted".into(),
            ],
        }
    }
}

impl RetryPolicy {
    /// Policy with an explicit retryable status set and default quota markers.
    pub fn with_statuses(statuses: impl Into<Vec<u16>>) -> Self {
        Self {
            retryable_statuses: statuses.into(),
            ..Self::default()
        }
    }

    pub fn add_quota_marker(mut self, marker: impl Into<String>) -> Self {
        self.quota_markers.push(marker.into());
        self
    }

    /// Classify a non-success response.
    pub fn classify(&self, status: u16, body: &str) -> Disposition {
        if self.retryable_statuses.contains(&status) {
            return Disposition::Retryable;
        }
        let lower = body.to_lowercase();
        if self.quota_markers.iter().any(|m| lower.contains(m.as_str())) {
            return Disposition::Retryable;
        }
        Disposition::Terminal
    }
}
