//! Prometheus metrics for run observability
//!
//! Registered on the default registry at first use; the server exposes them
//! on `/metrics` via [`render`].

use lazy_static::lazy_static;
use prometheus::{
    register_counter_vec, register_histogram, register_histogram_vec, CounterVec, Histogram,
    HistogramVec, TextEncoder,
};

lazy_static! {
    /// Completed runs by outcome (answered / budget_exhausted / error)
    pub static ref RUN_TASKS: CounterVec = register_counter_vec!(
        "rlm_runs_total",
        "Completed RLM runs by outcome",
        &["outcome"]
    )
    .expect("metric can be registered");

    /// Model calls consumed per run
    pub static ref RUN_ITERATIONS: Histogram = register_histogram!(
        "rlm_run_iterations",
        "Model calls consumed per run",
        vec![1.0, 2.0, 3.0, 5.0, 8.0, 13.0, 21.0]
    )
    .expect("metric can be registered");

    /// Wall time of individual model calls, in seconds
    pub static ref LLM_CALL_TIME: Histogram = register_histogram!(
        "rlm_llm_call_seconds",
        "Duration of individual model calls in seconds"
    )
    .expect("metric can be registered");

    /// Code submissions to the sandbox, by execution status
    pub static ref CODE_EXECUTIONS: CounterVec = register_counter_vec!(
        "rlm_code_executions_total",
        "Code fragments submitted to the REPL environment",
        &["status"]
    )
    .expect("metric can be registered");

    /// Dataset example fetches, by source (cache / remote)
    pub static ref DATASET_FETCHES: CounterVec = register_counter_vec!(
        "rlm_dataset_fetches_total",
        "Dataset example fetches by source",
        &["source"]
    )
    .expect("metric can be registered");

    /// HTTP API requests, by route and status class
    pub static ref API_REQUESTS: HistogramVec = register_histogram_vec!(
        "rlm_api_request_seconds",
        "API request handling time by route",
        &["route"]
    )
    .expect("metric can be registered");
}

/// Render all registered metrics in the Prometheus text format
pub fn render() -> String {
    let encoder = TextEncoder::new();
    let families = prometheus::gather();
    encoder.encode_to_string(&families).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_render_after_touch() {
        RUN_TASKS.with_label_values(&["answered"]).inc();
        CODE_EXECUTIONS.with_label_values(&["success"]).inc();
        let text = render();
        assert!(text.contains("rlm_runs_total"));
        assert!(text.contains("rlm_code_executions_total"));
    }
}
