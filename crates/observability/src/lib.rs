//! Tracing/logging setup shared by the binaries and black-box tests.

/// Initialize process-wide tracing/logging in the given format.
///
/// Safe to call multiple times; subsequent calls become no-ops.
pub fn init(format: LogFormat) {
    tracing::init(format);
}

/// Subscriber configuration (filters, output format).
pub mod tracing;

pub use self::tracing::{LogFormat, LogFormatError};
