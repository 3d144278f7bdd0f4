//! Call-site timing for expensive crypto operations

use std::time::Instant;

/// Run `f`, logging its wall-clock duration at debug level
///
/// Explicit wrapper instead of instrumentation magic: wrap the call you want
/// timed and nothing else. Only the operation name is logged, never operands.
pub fn timed<T>(operation: &str, f: impl FnOnce() -> T) -> T {
    let start = Instant::now();
    let result = f();
    tracing::debug!(
        operation,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "crypto operation finished"
    );
    result
}
