//! Prometheus metrics for community-service
use actix_web::{
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
    Error, HttpResponse, Responder,
};
use futures::future::{ready, LocalBoxFuture, Ready};
use once_cell::sync::Lazy;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, register_int_gauge_vec, Encoder,
    HistogramVec, IntCounterVec, IntGaugeVec, TextEncoder,
};
use std::rc::Rc;
use std::time::Instant;

pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "community_http_requests_total",
        "Total HTTP requests",
        &["method", "path", "status"]
    )
    .expect("http_requests_total can be registered")
});

pub static HTTP_REQUEST_DURATION_SECONDS: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "community_http_request_duration_seconds",
        "HTTP request latency",
        &["method", "path"],
        vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5]
    )
    .expect("http_request_duration_seconds can be registered")
});

/// Event joins by outcome: joined, conflict, not_found, invalid
pub static EVENT_JOINS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "community_event_joins_total",
        "Event join attempts by outcome",
        &["outcome"]
    )
    .expect("event_joins_total can be registered")
});

pub static CONNECTION_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "community_connection_requests_total",
        "Connection workflow transitions",
        &["action"]
    )
    .expect("connection_requests_total can be registered")
});

/// Live pushes: delivered reached at least one socket, dropped reached none
pub static LIVE_PUSH_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "community_live_push_total",
        "Live socket pushes by result",
        &["result"]
    )
    .expect("live_push_total can be registered")
});

pub static ACTIVE_SOCKETS: Lazy<IntGaugeVec> = Lazy::new(|| {
    register_int_gauge_vec!(
        "community_active_sockets",
        "Open WebSocket sessions per channel",
        &["channel"]
    )
    .expect("active_sockets can be registered")
});

pub fn record_event_join(outcome: &str) {
    EVENT_JOINS_TOTAL.with_label_values(&[outcome]).inc();
}

pub fn record_connection_action(action: &str) {
    CONNECTION_REQUESTS_TOTAL.with_label_values(&[action]).inc();
}

pub fn record_live_push(delivered: bool) {
    let result = if delivered { "delivered" } else { "dropped" };
    LIVE_PUSH_TOTAL.with_label_values(&[result]).inc();
}

/// Handler that serialises Prometheus metrics in text format.
pub async fn metrics_handler() -> impl Responder {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    match encoder.encode(&metric_families, &mut buffer) {
        Ok(_) => HttpResponse::Ok()
            .content_type(encoder.format_type())
            .body(buffer),
        Err(err) => HttpResponse::InternalServerError().body(err.to_string()),
    }
}

/// Records request count and latency per matched route
pub struct MetricsMiddleware;

impl<S, B> Transform<S, ServiceRequest> for MetricsMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = MetricsMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(MetricsMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct MetricsMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for MetricsMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    actix_web::dev::forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let start = Instant::now();
        let method = req.method().to_string();

        Box::pin(async move {
            let res = service.call(req).await?;
            let status = res.status().as_u16().to_string();
            // Route pattern keeps label cardinality bounded ("/events/{id}" rather than every id)
            let path = res
                .request()
                .match_pattern()
                .unwrap_or_else(|| "unmatched".to_string());

            HTTP_REQUESTS_TOTAL
                .with_label_values(&[&method, &path, &status])
                .inc();
            HTTP_REQUEST_DURATION_SECONDS
                .with_label_values(&[&method, &path])
                .observe(start.elapsed().as_secs_f64());

            Ok(res)
        })
    }
}
