//! Process-wide logging setup shared by every binary.

/// Tracing subscriber configuration.
pub mod tracing;

/// Initialize process-wide observability (tracing/logging).
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init();
}
