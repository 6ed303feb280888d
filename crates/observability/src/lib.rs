//! Tracing and logging setup shared by the rolesync binaries.

/// Tracing configuration (filters, output format).
pub mod tracing;

pub use crate::tracing::{LogFormat, LoggingConfig};

/// Initialize process-wide logging from the configured section.
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init_with(config: &LoggingConfig) {
    tracing::init(config);
}
