//! Resilient external-call invoker.
//!
//! One logical unit of work is executed against a rate-limited,
//! multi-tenant-keyed API by rotating through an ordered credential
//! pool, splitting oversized payloads into ordered chunks first.
//! Chunks are dispatched strictly sequentially; the rotation cursor
//! carries across chunks.

pub mod chunk;
pub mod invoker;
pub mod policy;

pub use chunk::{split_chunks, ChunkPolicy};
pub use invoker::{
    invoke, ChunkPosition, InvokeError, InvokeOptions, KeyAuth, ProviderRequest, RawResponse,
    RotationCursor, Transport,
};
pub use policy::{Disposition, RetryPolicy};
