// crates/pipeline-collector-core/src/runtime/truncate.rs
// ============================================================================
// Module: Audit Truncation
// Description: Bounds the size of a serialized audit line.
// Purpose: Keep the head and tail of oversized payloads around a marker.
// Dependencies: none
// ============================================================================

//! ## Overview
//! Truncation works on raw bytes and never inspects the payload, so a
//! multi-byte character may be split at either cut. Payloads shorter than the
//! limit are returned unchanged.

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Marker inserted between the kept head and tail.
pub const TRUNCATION_MARKER: &[u8] = b"......";

/// One mebibyte.
const MIB: usize = 1024 * 1024;

/// Default truncation limit (2.5 MiB).
pub const DEFAULT_AUDIT_LIMIT_BYTES: usize = MIB * 5 / 2;

/// Default head and tail size (1 MiB each).
pub const DEFAULT_AUDIT_SLICE_BYTES: usize = MIB;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Size bounds applied to audit lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuditLimits {
    /// Payloads at or above this size are truncated.
    pub limit: usize,
    /// Bytes kept from the start.
    pub head: usize,
    /// Bytes kept from the end.
    pub tail: usize,
}

impl Default for AuditLimits {
    fn default() -> Self {
        Self {
            limit: DEFAULT_AUDIT_LIMIT_BYTES,
            head: DEFAULT_AUDIT_SLICE_BYTES,
            tail: DEFAULT_AUDIT_SLICE_BYTES,
        }
    }
}

// ============================================================================
// SECTION: Truncation
// ============================================================================

/// Returns `payload` unchanged when shorter than the limit, otherwise
/// `head ++ "......" ++ tail`.
#[must_use]
pub fn truncate_middle(payload: Vec<u8>, limits: &AuditLimits) -> Vec<u8> {
    let len = payload.len();
    if len < limits.limit {
        return payload;
    }
    let head_end = limits.head.min(len);
    let tail_start = len.saturating_sub(limits.tail);
    let mut out = Vec::with_capacity(head_end + TRUNCATION_MARKER.len() + (len - tail_start));
    out.extend_from_slice(&payload[.. head_end]);
    out.extend_from_slice(TRUNCATION_MARKER);
    out.extend_from_slice(&payload[tail_start ..]);
    out
}
