use tracing::trace;

// Lightweight trace-based helpers for request and stage visibility. The
// Prometheus recorder installed in main serves the /metrics endpoint.

pub fn inc_requests(route: &'static str) {
    trace!(
        target = "marketlens.metrics",
        route = route,
        "requests_total_inc"
    );
}

pub fn stage_elapsed(stage: &'static str, elapsed_ms: u128) {
    trace!(
        target = "marketlens.metrics",
        stage = stage,
        elapsed_ms = elapsed_ms as u64,
        "stage_elapsed"
    );
}
