//! Tool-call id normalization for vendors that only accept short ids.
//!
//! Some upstreams reject any tool-call id that is not exactly nine ASCII
//! alphanumerics. [`normalize`] maps an arbitrary id onto that grammar
//! deterministically: the same input always yields the same output, across
//! runs and processes. Distinct inputs may collide; uniqueness is best-effort.

use crate::util::push_u32_base62;
use serde::Serialize;
use std::fmt;

/// Length of an id in the vendor grammar.
pub const TOOL_CALL_ID_LEN: usize = 9;

/// A tool-call id guaranteed to be [`TOOL_CALL_ID_LEN`] ASCII alphanumerics.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct NormalizedId(String);

impl NormalizedId {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for NormalizedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NormalizedId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<NormalizedId> for String {
    fn from(id: NormalizedId) -> Self {
        id.0
    }
}

/// Whether `id` already satisfies the vendor grammar.
#[inline]
#[must_use]
pub fn is_valid_tool_call_id(id: &str) -> bool {
    id.len() == TOOL_CALL_ID_LEN && id.bytes().all(|b| b.is_ascii_alphanumeric())
}

/// Map an arbitrary tool-call id onto the vendor grammar.
///
/// Compliant ids are returned unchanged. Anything else is hashed over its
/// UTF-16 code units, base-62 encoded, then truncated or left-padded with
/// `'0'` to exactly nine characters.
#[must_use]
pub fn normalize(raw: &str) -> NormalizedId {
    if is_valid_tool_call_id(raw) {
        return NormalizedId(raw.to_string());
    }

    let mut encoded = String::with_capacity(TOOL_CALL_ID_LEN);
    push_u32_base62(&mut encoded, utf16_hash_magnitude(raw));

    if encoded.len() >= TOOL_CALL_ID_LEN {
        encoded.truncate(TOOL_CALL_ID_LEN);
        return NormalizedId(encoded);
    }

    let mut out = String::with_capacity(TOOL_CALL_ID_LEN);
    for _ in encoded.len()..TOOL_CALL_ID_LEN {
        out.push('0');
    }
    out.push_str(&encoded);
    NormalizedId(out)
}

/// `h = h * 31 + unit` over UTF-16 code units with 32-bit two's-complement
/// wraparound, then the absolute value.
///
/// `i32::MIN` has no positive counterpart; its magnitude is reported as
/// `2^31` through the unsigned reinterpretation.
#[inline]
fn utf16_hash_magnitude(raw: &str) -> u32 {
    let mut hash: i32 = 0;
    for unit in raw.encode_utf16() {
        hash = hash
            .wrapping_shl(5)
            .wrapping_sub(hash)
            .wrapping_add(i32::from(unit));
    }
    hash.unsigned_abs()
}
