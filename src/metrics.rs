use std::sync::atomic::AtomicUsize;
use std::sync::Arc;

use once_cell::sync::Lazy;

/// Process-wide HTTP counters.
///
/// Purpose:
/// - Track outbound requests and their failures
/// - Track response volume
///
/// These are transport telemetry only. Collection results and the
/// error log live on the `Collector` instance, not here.
///
/// Design:
/// - Lock-free (Atomics)
/// - Cheap to update
#[derive(Default)]
pub struct RuntimeMetrics {
    pub requests_sent: AtomicUsize,
    pub request_errors: AtomicUsize,
    pub bytes_received: AtomicUsize,
}

/// Global metrics registry (singleton)
pub static METRICS: Lazy<Arc<RuntimeMetrics>> =
    Lazy::new(|| Arc::new(RuntimeMetrics::default()));
