//! Tracing/logging setup shared by the clinic binaries.

/// Initialize process-wide tracing, choosing the output format from
/// `PETCLINIC_LOG_FORMAT`.
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    let format = std::env::var(tracing::FORMAT_VAR)
        .map(|value| tracing::LogFormat::parse(&value))
        .unwrap_or_default();
    tracing::init(format);
}

/// Tracing configuration (filters, formats).
pub mod tracing;

pub use crate::tracing::LogFormat;
