//! Sequential chunk dispatch with credential rotation.

use std::future::Future;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, warn};

use crate::chunk::{split_chunks, ChunkPolicy};
use crate::policy::{Disposition, RetryPolicy};

/// Where a chunk sits in the dispatch sequence. Continuation prompts
/// depend on this, which is why chunks are never dispatched in parallel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkPosition {
    Only,
    First,
    Middle,
    Last,
}

impl ChunkPosition {
    fn of(index: usize, total: usize) -> Self {
        match (index, total) {
            (_, 1) => ChunkPosition::Only,
            (0, _) => ChunkPosition::First,
            (i, t) if i + 1 == t => ChunkPosition::Last,
            _ => ChunkPosition::Middle,
        }
    }
}

/// How the credential is attached to the outbound request.
#[derive(Debug, Clone)]
pub enum KeyAuth {
    /// Appended as a query parameter, e.g. `?key=...`.
    QueryParam(String),
    /// Sent in a named header, e.g. `x-goog-api-key`.
    Header(String),
    /// `Authorization: Bearer ...`.
    Bearer,
}

/// One outbound request, minus the credential.
#[derive(Debug, Clone)]
pub struct ProviderRequest {
    pub url: String,
    pub body: serde_json::Value,
    pub auth: KeyAuth,
}

/// Raw provider response. The body may be JSON or binary (audio, image);
/// extraction is caller-supplied.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Outbound HTTP seam. Production uses reqwest; tests use a scripted mock.
pub trait Transport: Send + Sync {
    fn send(
        &self,
        request: &ProviderRequest,
        credential: &str,
    ) -> impl Future<Output = Result<RawResponse, String>> + Send;
}

/// Position in the credential pool, threaded through the chunk loop as a
/// plain value. Never a hidden global: the cursor a chunk ends on is the
/// cursor the next chunk starts from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RotationCursor(usize);

impl RotationCursor {
    pub fn position(&self, pool_size: usize) -> usize {
        self.0 % pool_size.max(1)
    }

    fn advanced(self) -> Self {
        RotationCursor(self.0 + 1)
    }

    fn at(index: usize) -> Self {
        RotationCursor(index)
    }
}

/// Per-invocation options.
#[derive(Debug, Clone)]
pub struct InvokeOptions {
    pub chunking: ChunkPolicy,
    pub retry: RetryPolicy,
    /// Timeout for a single credential attempt.
    pub attempt_timeout: Duration,
    /// Hard deadline for the whole invocation, all chunks included.
    pub deadline: Instant,
}

#[derive(Error, Debug)]
pub enum InvokeError {
    #[error("no credentials configured")]
    NoCredentialsConfigured,

    #[error("all credentials exhausted on chunk {chunk} after {attempts} attempts: {last_error}")]
    AllCredentialsExhausted {
        chunk: usize,
        attempts: usize,
        last_error: String,
    },

    #[error("invocation deadline exceeded on chunk {chunk}")]
    DeadlineExceeded { chunk: usize },
}

/// Execute one unit of work against an external API.
///
/// The payload is split per `options.chunking`; chunks are dispatched
/// strictly in order. For each chunk, credentials are attempted from the
/// current cursor position: a retryable response (per `options.retry`),
/// a transport failure, an attempt timeout, or an unextractable success
/// body advances the cursor; a terminal response or an exhausted pool
/// aborts the invocation, skipping remaining chunks. Outputs come back
/// in chunk order.
pub async fn invoke<T, Tr, B, E>(
    transport: &Tr,
    payload: &str,
    credentials: &[String],
    options: &InvokeOptions,
    mut build_request: B,
    mut extract: E,
) -> Result<Vec<T>, InvokeError>
where
    Tr: Transport,
    B: FnMut(&str, ChunkPosition) -> ProviderRequest,
    E: FnMut(&RawResponse) -> Result<T, String>,
{
    if credentials.is_empty() {
        return Err(InvokeError::NoCredentialsConfigured);
    }

    let chunks = split_chunks(payload, &options.chunking);
    let total = chunks.len();
    debug!("dispatching {} chunk(s), pool of {} credential(s)", total, credentials.len());

    let mut cursor = RotationCursor::default();
    let mut outputs = Vec::with_capacity(total);

    for (chunk_index, chunk) in chunks.iter().enumerate() {
        let request = build_request(chunk, ChunkPosition::of(chunk_index, total));
        let (output, next_cursor) = dispatch_chunk(
            transport,
            &request,
            credentials,
            options,
            cursor,
            chunk_index,
            &mut extract,
        )
        .await?;
        outputs.push(output);
        cursor = next_cursor;
    }

    Ok(outputs)
}

/// Walk the credential pool for a single chunk.
async fn dispatch_chunk<T, Tr, E>(
    transport: &Tr,
    request: &ProviderRequest,
    credentials: &[String],
    options: &InvokeOptions,
    cursor: RotationCursor,
    chunk_index: usize,
    extract: &mut E,
) -> Result<(T, RotationCursor), InvokeError>
where
    Tr: Transport,
    E: FnMut(&RawResponse) -> Result<T, String>,
{
    let pool = credentials.len();
    let mut cursor = cursor;
    let mut last_error = String::from("no attempt made");

    for attempt in 0..pool {
        let remaining = options.deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(InvokeError::DeadlineExceeded { chunk: chunk_index });
        }

        let index = cursor.position(pool);
        let credential = &credentials[index];
        let attempt_budget = options.attempt_timeout.min(remaining);

        let outcome = tokio::time::timeout(attempt_budget, transport.send(request, credential)).await;

        match outcome {
            Err(_) => {
                warn!(
                    "chunk {} attempt {} timed out after {:?}",
                    chunk_index, attempt, attempt_budget
                );
                last_error = format!("attempt timed out after {:?}", attempt_budget);
                cursor = cursor.advanced();
            }
            Ok(Err(err)) => {
                warn!("chunk {} attempt {} transport failure: {}", chunk_index, attempt, err);
                last_error = err;
                cursor = cursor.advanced();
            }
            Ok(Ok(response)) if (200..300).contains(&response.status) => {
                match extract(&response) {
                    Ok(output) => {
                        debug!("chunk {} served by credential #{}", chunk_index, index);
                        return Ok((output, RotationCursor::at(index)));
                    }
                    Err(err) => {
                        // Empty or unusable success body: same handling
                        // as a rate limit, next credential may do better.
                        warn!("chunk {} unextractable response: {}", chunk_index, err);
                        last_error = format!("malformed response: {}", err);
                        cursor = cursor.advanced();
                    }
                }
            }
            Ok(Ok(response)) => {
                let body = response.text();
                match options.retry.classify(response.status, &body) {
                    Disposition::Retryable => {
                        debug!(
                            "chunk {} credential #{} got retryable status {}",
                            chunk_index, index, response.status
                        );
                        last_error = format!("status {}", response.status);
                        cursor = cursor.advanced();
                    }
                    Disposition::Terminal => {
                        return Err(InvokeError::AllCredentialsExhausted {
                            chunk: chunk_index,
                            attempts: attempt + 1,
                            last_error: format!("terminal status {}: {}", response.status, body),
                        });
                    }
                }
            }
        }
    }

    Err(InvokeError::AllCredentialsExhausted {
        chunk: chunk_index,
        attempts: pool,
        last_error,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    /// Scripted transport: pops responses in order and records which
    /// credential served each call.
    struct ScriptedTransport {
        script: Mutex<Vec<Result<RawResponse, String>>>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedTransport {
        fn new(script: Vec<Result<RawResponse, String>>) -> Self {
            let mut script = script;
            script.reverse();
            Self {
                script: Mutex::new(script),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.lock().len()
        }

        fn credentials_used(&self) -> Vec<String> {
            self.calls.lock().clone()
        }
    }

    impl Transport for ScriptedTransport {
        async fn send(
            &self,
            _request: &ProviderRequest,
            credential: &str,
        ) -> Result<RawResponse, String> {
            self.calls.lock().push(credential.to_string());
            self.script
                .lock()
                .pop()
                .unwrap_or_else(|| Err("script exhausted".into()))
        }
    }

    fn ok(body: &str) -> Result<RawResponse, String> {
        Ok(RawResponse {
            status: 200,
            body: body.as_bytes().to_vec(),
        })
    }

    fn status(code: u16) -> Result<RawResponse, String> {
        Ok(RawResponse {
            status: code,
            body: Vec::new(),
        })
    }

    fn options(max_bytes: usize, boundary: Option<&str>) -> InvokeOptions {
        InvokeOptions {
            chunking: match boundary {
                Some(b) => ChunkPolicy::with_boundary(max_bytes, b),
                None => ChunkPolicy::new(max_bytes),
            },
            retry: RetryPolicy::default(),
            attempt_timeout: Duration::from_secs(5),
            deadline: Instant::now() + Duration::from_secs(30),
        }
    }

    fn request(chunk: &str, _pos: ChunkPosition) -> ProviderRequest {
        ProviderRequest {
            url: "https://provider.test/generate".into(),
            body: serde_json::json!({ "text": chunk }),
            auth: KeyAuth::Bearer,
        }
    }

    fn text_extract(response: &RawResponse) -> Result<String, String> {
        let text = response.text();
        if text.is_empty() {
            Err("empty body".into())
        } else {
            Ok(text)
        }
    }

    fn keys(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn empty_credentials_fail_without_network() {
        let transport = ScriptedTransport::new(vec![]);
        let result = invoke(&transport, "payload", &[], &options(100, None), request, text_extract).await;
        assert!(matches!(result, Err(InvokeError::NoCredentialsConfigured)));
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn first_credential_success_makes_one_call() {
        let transport = ScriptedTransport::new(vec![ok("resposta")]);
        let result = invoke(
            &transport,
            "payload",
            &keys(&["k1", "k2", "k3"]),
            &options(100, None),
            request,
            text_extract,
        )
        .await
        .unwrap();
        assert_eq!(result, vec!["resposta".to_string()]);
        assert_eq!(transport.call_count(), 1);
        assert_eq!(transport.credentials_used(), vec!["k1"]);
    }

    #[tokio::test]
    async fn all_rate_limited_attempts_exactly_pool_size() {
        let transport = ScriptedTransport::new(vec![status(429), status(429), status(429)]);
        let result = invoke(
            &transport,
            "payload",
            &keys(&["k1", "k2", "k3"]),
            &options(100, None),
            request,
            text_extract,
        )
        .await;
        match result {
            Err(InvokeError::AllCredentialsExhausted { chunk, attempts, .. }) => {
                assert_eq!(chunk, 0);
                assert_eq!(attempts, 3);
            }
            other => panic!("unexpected: {:?}", other),
        }
        assert_eq!(transport.call_count(), 3);
        assert_eq!(transport.credentials_used(), vec!["k1", "k2", "k3"]);
    }

    #[tokio::test]
    async fn cursor_rolls_across_chunks() {
        // Two chunks. k1 is rate-limited on chunk 1, k2 serves it; the
        // cursor stays on k2 for chunk 2. Three calls total.
        let transport = ScriptedTransport::new(vec![status(429), ok("parte um"), ok("parte dois")]);
        let payload = format!("{}{}", "a".repeat(90), "b".repeat(60));
        let result = invoke(
            &transport,
            &payload,
            &keys(&["k1", "k2"]),
            &options(90, None),
            request,
            text_extract,
        )
        .await
        .unwrap();
        assert_eq!(result, vec!["parte um".to_string(), "parte dois".to_string()]);
        assert_eq!(transport.credentials_used(), vec!["k1", "k2", "k2"]);
    }

    #[tokio::test]
    async fn terminal_status_aborts_remaining_chunks() {
        let transport = ScriptedTransport::new(vec![status(400)]);
        let payload = "x".repeat(200);
        let result = invoke(
            &transport,
            &payload,
            &keys(&["k1", "k2"]),
            &options(90, None),
            request,
            text_extract,
        )
        .await;
        match result {
            Err(InvokeError::AllCredentialsExhausted { chunk, attempts, last_error }) => {
                assert_eq!(chunk, 0);
                assert_eq!(attempts, 1);
                assert!(last_error.contains("400"));
            }
            other => panic!("unexpected: {:?}", other),
        }
        // k2 never touched, chunks 2 and 3 never dispatched.
        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test]
    async fn exhaustion_on_later_chunk_aborts_invocation() {
        let transport = ScriptedTransport::new(vec![ok("um"), status(503), status(503)]);
        let payload = "x".repeat(150);
        let result = invoke(
            &transport,
            &payload,
            &keys(&["k1", "k2"]),
            &options(90, None),
            request,
            text_extract,
        )
        .await;
        match result {
            Err(InvokeError::AllCredentialsExhausted { chunk, attempts, .. }) => {
                assert_eq!(chunk, 1);
                assert_eq!(attempts, 2);
            }
            other => panic!("unexpected: {:?}", other),
        }
        assert_eq!(transport.call_count(), 3);
    }

    #[tokio::test]
    async fn empty_success_body_advances_credential() {
        let transport = ScriptedTransport::new(vec![ok(""), ok("agora sim")]);
        let result = invoke(
            &transport,
            "payload",
            &keys(&["k1", "k2"]),
            &options(100, None),
            request,
            text_extract,
        )
        .await
        .unwrap();
        assert_eq!(result, vec!["agora sim".to_string()]);
        assert_eq!(transport.credentials_used(), vec!["k1", "k2"]);
    }

    #[tokio::test]
    async fn transport_failure_advances_credential() {
        let transport = ScriptedTransport::new(vec![Err("connection reset".into()), ok("ok")]);
        let result = invoke(
            &transport,
            "payload",
            &keys(&["k1", "k2"]),
            &options(100, None),
            request,
            text_extract,
        )
        .await
        .unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(transport.call_count(), 2);
    }

    #[tokio::test]
    async fn expired_deadline_fails_before_any_call() {
        let transport = ScriptedTransport::new(vec![ok("nunca")]);
        let mut opts = options(100, None);
        opts.deadline = Instant::now() - Duration::from_secs(1);
        let result = invoke(
            &transport,
            "payload",
            &keys(&["k1"]),
            &opts,
            request,
            text_extract,
        )
        .await;
        assert!(matches!(result, Err(InvokeError::DeadlineExceeded { chunk: 0 })));
        assert_eq!(transport.call_count(), 0);
    }

    /// Never resolves within any attempt budget; optionally recovers
    /// after the first call.
    struct StallingTransport {
        calls: Mutex<Vec<String>>,
        stall_first_only: bool,
    }

    impl StallingTransport {
        fn new(stall_first_only: bool) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                stall_first_only,
            }
        }
    }

    impl Transport for StallingTransport {
        async fn send(
            &self,
            _request: &ProviderRequest,
            credential: &str,
        ) -> Result<RawResponse, String> {
            let first = {
                let mut calls = self.calls.lock();
                calls.push(credential.to_string());
                calls.len() == 1
            };
            if first || !self.stall_first_only {
                std::future::pending::<()>().await;
            }
            Ok(RawResponse {
                status: 200,
                body: b"resposta".to_vec(),
            })
        }
    }

    #[tokio::test]
    async fn attempt_timeout_advances_to_next_credential() {
        let transport = StallingTransport::new(true);
        let mut opts = options(100, None);
        opts.attempt_timeout = Duration::from_millis(20);
        let result = invoke(
            &transport,
            "payload",
            &keys(&["k1", "k2"]),
            &opts,
            request,
            text_extract,
        )
        .await
        .unwrap();
        assert_eq!(result, vec!["resposta".to_string()]);
        assert_eq!(*transport.calls.lock(), vec!["k1", "k2"]);
    }

    #[tokio::test]
    async fn attempt_timeout_exhaustion_reports_the_timeout() {
        let transport = StallingTransport::new(false);
        let mut opts = options(100, None);
        opts.attempt_timeout = Duration::from_millis(20);
        let result = invoke(
            &transport,
            "payload",
            &keys(&["k1"]),
            &opts,
            request,
            text_extract,
        )
        .await;
        match result {
            Err(InvokeError::AllCredentialsExhausted { chunk, attempts, last_error }) => {
                assert_eq!(chunk, 0);
                assert_eq!(attempts, 1);
                assert!(last_error.contains("timed out"));
            }
            other => panic!("unexpected: {:?}", other),
        }
        assert_eq!(transport.calls.lock().len(), 1);
    }

    #[tokio::test]
    async fn quota_text_in_bad_request_is_retryable() {
        let quota = Ok(RawResponse {
            status: 400,
            body: br#"{"error":{"status":"RESOURCE_EXHAUSTED"}}"#.to_vec(),
        });
        let transport = ScriptedTransport::new(vec![quota, ok("ok")]);
        let result = invoke(
            &transport,
            "payload",
            &keys(&["k1", "k2"]),
            &options(100, None),
            request,
            text_extract,
        )
        .await
        .unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(transport.credentials_used(), vec!["k1", "k2"]);
    }

    #[tokio::test]
    async fn chunk_positions_reach_request_builder() {
        let transport = ScriptedTransport::new(vec![ok("a"), ok("b"), ok("c")]);
        let payload = "x".repeat(250);
        let positions = Mutex::new(Vec::new());
        let result = invoke(
            &transport,
            &payload,
            &keys(&["k1"]),
            &options(90, None),
            |chunk, pos| {
                positions.lock().push(pos);
                request(chunk, pos)
            },
            text_extract,
        )
        .await
        .unwrap();
        assert_eq!(result.len(), 3);
        assert_eq!(
            *positions.lock(),
            vec![ChunkPosition::First, ChunkPosition::Middle, ChunkPosition::Last]
        );
    }
}
