use std::time::Instant;

use axum::{extract::Request, middleware::Next, response::Response};
use once_cell::sync::Lazy;
use prometheus::{
    register_histogram_vec, register_int_counter, register_int_counter_vec, Encoder, HistogramVec, IntCounter,
    IntCounterVec, TextEncoder,
};

// Prometheus metrics (default registry)
pub static REGISTRATIONS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!("marketplace_registrations_total", "Accounts registered")
        .expect("register registrations_total")
});

pub static LOGINS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!("marketplace_logins_total", "Login attempts by outcome", &["outcome"])
        .expect("register logins_total")
});

pub static ORDERS_CREATED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!("marketplace_orders_created_total", "Service requests created")
        .expect("register orders_created_total")
});

pub static ORDER_ASSIGNMENTS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!("marketplace_order_assignments_total", "Orders claimed by a worker")
        .expect("register order_assignments_total")
});

pub static RATINGS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!("marketplace_ratings_total", "Worker ratings recorded")
        .expect("register ratings_total")
});

pub static REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "marketplace_request_duration_seconds",
        "Request duration in seconds",
        &["method", "status"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]
    )
    .expect("register request_duration")
});

/// Records the duration of every request.
pub async fn track_requests(req: Request, next: Next) -> Response {
    let method = req.method().as_str().to_owned();
    let started = Instant::now();
    let resp = next.run(req).await;
    REQUEST_DURATION
        .with_label_values(&[method.as_str(), resp.status().as_str()])
        .observe(started.elapsed().as_secs_f64());
    resp
}

pub fn encode_metrics() -> (axum::http::StatusCode, String) {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        return (
            axum::http::StatusCode::INTERNAL_SERVER_ERROR,
            format!("metrics encode error: {e}"),
        );
    }
    (
        axum::http::StatusCode::OK,
        String::from_utf8(buffer).unwrap_or_default(),
    )
}
