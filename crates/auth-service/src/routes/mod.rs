use crate::handlers::auth_handler::{self, AppState};
use crate::middleware::http_metrics::http_metrics_middleware;
use axum::{
    http::{header, HeaderName, HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::CorsLayer, set_header::SetResponseHeaderLayer, timeout::TimeoutLayer,
    trace::TraceLayer,
};

/// Upper bound on a single request, bcrypt included.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Install the global Prometheus recorder and return its render handle.
pub fn init_metrics_recorder() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Build the application router.
///
/// `cors_allowed_origin` is the single origin allowed to call the API from
/// a browser; `None` grants no cross-origin access.
pub fn build_routes(
    state: Arc<AppState>,
    metrics_handle: PrometheusHandle,
    cors_allowed_origin: Option<HeaderValue>,
) -> Router {
    let api = Router::new()
        .route("/auth/register", post(auth_handler::handle_register))
        .route("/auth/login", post(auth_handler::handle_login))
        .with_state(state);

    let ops = Router::new()
        .route("/health", get(health_check))
        .route(
            "/metrics",
            get(move || std::future::ready(metrics_handle.render())),
        );

    let mut router = api
        .merge(ops)
        .layer(middleware::from_fn(http_metrics_middleware))
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT));

    if let Some(origin) = cors_allowed_origin {
        router = router.layer(cors_layer(origin));
    }

    with_security_headers(router).layer(TraceLayer::new_for_http())
}

async fn health_check() -> &'static str {
    "OK"
}

fn cors_layer(origin: HeaderValue) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([
            Method::GET,
            Method::HEAD,
            Method::PUT,
            Method::PATCH,
            Method::POST,
            Method::DELETE,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}

/// Conservative response headers for an API that never serves HTML.
fn with_security_headers(router: Router) -> Router {
    let headers: [(HeaderName, &'static str); 5] = [
        (header::X_CONTENT_TYPE_OPTIONS, "nosniff"),
        (header::X_FRAME_OPTIONS, "DENY"),
        (header::REFERRER_POLICY, "no-referrer"),
        (
            header::STRICT_TRANSPORT_SECURITY,
            "max-age=15552000; includeSubDomains",
        ),
        (
            header::CONTENT_SECURITY_POLICY,
            "default-src 'none'; frame-ancestors 'none'",
        ),
    ];

    headers.into_iter().fold(router, |router, (name, value)| {
        router.layer(SetResponseHeaderLayer::overriding(
            name,
            HeaderValue::from_static(value),
        ))
    })
}
