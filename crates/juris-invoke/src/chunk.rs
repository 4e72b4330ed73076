//! Boundary-aware payload splitting.
//!
//! Oversized payloads are cut at the last occurrence of a caller-supplied
//! boundary token at or before the size limit, provided it falls in the
//! back half of the window. Without a usable boundary the cut is a hard
//! one at the limit. Concatenating the chunks reconstructs the input
//! exactly.

/// How to split a payload before dispatch.
#[derive(Debug, Clone)]
pub struct ChunkPolicy {
    /// Maximum bytes per call. Hand-tuned per downstream API's
    /// documented payload limit.
    pub max_bytes: usize,
    /// Preferred split token, e.g. `"\nArt."` for legal articles or
    /// `"\n\n"` for paragraphs. The next chunk starts at the token.
    pub boundary: Option<String>,
}

impl ChunkPolicy {
    pub fn new(max_bytes: usize) -> Self {
        Self {
            max_bytes,
            boundary: None,
        }
    }

    pub fn with_boundary(max_bytes: usize, boundary: impl Into<String>) -> Self {
        Self {
            max_bytes,
            boundary: Some(boundary.into()),
        }
    }
}

/// Split `text` into ordered chunks of at most `policy.max_bytes` each.
///
/// Inputs at or under the limit come back as a single chunk identical to
/// the input. Hard cuts never land inside a UTF-8 sequence, so a chunk
/// may exceed the limit by up to one character's width when the limit is
/// narrower than a single character.
pub fn split_chunks<'a>(text: &'a str, policy: &ChunkPolicy) -> Vec<&'a str> {
    let max = policy.max_bytes.max(1);
    if text.len() <= max {
        return vec![text];
    }

    let mut chunks = Vec::new();
    let mut rest = text;

    while rest.len() > max {
        let cut = find_cut(rest, max, policy.boundary.as_deref());
        chunks.push(&rest[..cut]);
        rest = &rest[cut..];
    }
    if !rest.is_empty() {
        chunks.push(rest);
    }
    chunks
}

/// Pick the cut offset for the next chunk of `rest`. Always returns at
/// least one whole character so the split loop makes progress.
fn find_cut(rest: &str, max: usize, boundary: Option<&str>) -> usize {
    let mut window_end = max.min(rest.len());
    while !rest.is_char_boundary(window_end) {
        window_end -= 1;
    }
    if window_end == 0 {
        // The limit is narrower than the leading character; an empty
        // chunk would never consume input. Take the character whole.
        let mut end = 1;
        while !rest.is_char_boundary(end) {
            end += 1;
        }
        return end;
    }

    if let Some(token) = boundary {
        if !token.is_empty() {
            // Only boundaries in the back half of the window avoid
            // degenerate tiny chunks; a match at offset 0 would not
            // advance at all.
            if let Some(pos) = rest[..window_end].rfind(token) {
                if pos >= max / 2 && pos > 0 {
                    return pos;
                }
            }
        }
    }

    window_end
}
