use std::fmt::Write as _;

use axum::Json;
use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use trajview_shared::{ServiceRequest, SimplifyRequest};

use crate::state::{AppState, ObservabilitySnapshot};

const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

pub async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    let observability = state.observability.snapshot();
    Json(serde_json::json!({
        "status": "ok",
        "upstream": state.algorithm_url(),
        "started_at": state.started_at.to_rfc3339(),
        "uptime_secs": state.uptime().as_secs(),
        "observability": {
            "forwarded_requests_total": observability.forwarded_requests_total,
            "rejected_requests_total": observability.rejected_requests_total,
            "upstream_errors_total": observability.upstream_errors_total,
        }
    }))
}

pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    let body = render_prometheus_metrics(state.uptime().as_secs(), state.observability.snapshot());

    (
        [
            (header::CONTENT_TYPE, PROMETHEUS_CONTENT_TYPE),
            (header::CACHE_CONTROL, "no-store"),
        ],
        body,
    )
}

fn render_prometheus_metrics(uptime_secs: u64, observability: ObservabilitySnapshot) -> String {
    let mut body = String::new();
    let _ = writeln!(
        body,
        "# HELP trajview_uptime_seconds Seconds since the dashboard server started."
    );
    let _ = writeln!(body, "# TYPE trajview_uptime_seconds gauge");
    let _ = writeln!(body, "trajview_uptime_seconds {uptime_secs}");

    let counters = [
        (
            "trajview_forwarded_requests_total",
            "Algorithm requests forwarded to the simplification service.",
            observability.forwarded_requests_total,
        ),
        (
            "trajview_rejected_requests_total",
            "Algorithm requests rejected before forwarding.",
            observability.rejected_requests_total,
        ),
        (
            "trajview_upstream_errors_total",
            "Forwarded requests that failed in transport or returned a non-success status.",
            observability.upstream_errors_total,
        ),
    ];
    for (name, help, value) in counters {
        let _ = writeln!(body, "# HELP {name} {help}");
        let _ = writeln!(body, "# TYPE {name} counter");
        let _ = writeln!(body, "{name} {value}");
    }
    body
}

/// Validate a dashboard request, translate it to the service's body and forward it.
pub async fn proxy_algorithm(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Response, StatusCode> {
    let request = parse_simplify_request(&body)
        .and_then(|request| service_request(&request))
        .inspect_err(|_| {
            state.observability.record_rejected_request();
        })?;

    state.observability.record_forwarded_request();
    let resp = state
        .http_client
        .post(state.algorithm_url())
        .json(&request)
        .send()
        .await
        .map_err(|e| {
            state.observability.record_upstream_error();
            tracing::warn!(error = %e, "simplification service unreachable");
            StatusCode::BAD_GATEWAY
        })?;

    if !resp.status().is_success() {
        state.observability.record_upstream_error();
        tracing::warn!(status = %resp.status(), "simplification service returned an error");
        return Err(StatusCode::from_u16(resp.status().as_u16()).unwrap_or(StatusCode::BAD_GATEWAY));
    }

    let data = resp.bytes().await.map_err(|e| {
        state.observability.record_upstream_error();
        tracing::warn!(error = %e, "failed to read simplification response");
        StatusCode::BAD_GATEWAY
    })?;

    Ok(json_bytes_response(data, "no-store"))
}

fn parse_simplify_request(body: &[u8]) -> Result<SimplifyRequest, StatusCode> {
    let request: SimplifyRequest = serde_json::from_slice(body).map_err(|e| {
        tracing::debug!(error = %e, "malformed algorithm request");
        StatusCode::BAD_REQUEST
    })?;
    request.validate().map_err(|reason| {
        tracing::debug!(%reason, "rejected algorithm request");
        StatusCode::BAD_REQUEST
    })?;
    Ok(request)
}

fn service_request(request: &SimplifyRequest) -> Result<ServiceRequest, StatusCode> {
    request.to_service_request().map_err(|reason| {
        tracing::debug!(%reason, "untranslatable algorithm request");
        StatusCode::BAD_REQUEST
    })
}

fn json_bytes_response(body: Bytes, cache_control: &'static str) -> Response {
    let mut response = Response::new(Body::from(body));
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static(cache_control),
    );
    response
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;
    use std::time::Duration;

    use axum::Router;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::{parse_simplify_request, render_prometheus_metrics};
    use crate::state::{AppState, ObservabilitySnapshot};

    async fn spawn_fake_upstream(router: Router) -> (SocketAddr, tokio::task::JoinHandle<()>) {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind fake upstream");
        let addr = listener.local_addr().expect("listener address");
        let handle = tokio::spawn(async move {
            axum::serve(listener, router).await.expect("serve fake upstream");
        });
        (addr, handle)
    }

    /// Upstream that echoes the forwarded request back inside a trajectory response.
    async fn echo_upstream() -> (SocketAddr, tokio::task::JoinHandle<()>) {
        let router = Router::new().route(
            "/algorithm",
            axum::routing::post(|axum::Json(body): axum::Json<Value>| async move {
                axum::Json(json!({
                    "raw": [[56.0, 10.0], [56.1, 10.1]],
                    "echo": body,
                }))
            }),
        );
        spawn_fake_upstream(router).await
    }

    fn state_for(upstream: &str) -> AppState {
        AppState::new(upstream, Duration::from_secs(5), Duration::from_secs(1)).expect("client")
    }

    fn algorithm_request(body: Value) -> Request<Body> {
        Request::post("/api/algorithm")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request")
    }

    fn valid_body() -> Value {
        json!({
            "algorithms": ["DP"],
            "start_date": null,
            "end_time": "2024-01-01 06:00:00",
            "params": {}
        })
    }

    async fn read_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        serde_json::from_slice(&bytes).expect("json body")
    }

    #[tokio::test]
    async fn forwards_valid_request_and_returns_upstream_body() {
        let (addr, upstream) = echo_upstream().await;
        let state = state_for(&format!("http://{addr}"));
        let app = crate::app::build_app(state.clone(), "client/dist");

        let response = app
            .oneshot(algorithm_request(valid_body()))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CACHE_CONTROL).expect("cache-control"),
            "no-store"
        );
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).expect("content-type"),
            "application/json"
        );
        let body = read_json(response).await;
        assert_eq!(body["echo"]["algorithms"], json!(["DP"]));
        assert_eq!(body["echo"]["start_date"], json!("2024-01-01"));
        assert_eq!(body["echo"]["end_date"], json!("2024-01-01 06:00:00"));
        assert!(body["echo"].get("end_time").is_none());
        assert_eq!(state.observability.snapshot().forwarded_requests_total, 1);

        upstream.abort();
    }

    /// Upstream that reads the body the way the simplification service does: a
    /// `YYYY-MM-DD` start date, an `end_date` timestamp and flat parameters.
    async fn strict_upstream() -> (SocketAddr, tokio::task::JoinHandle<()>) {
        let router = Router::new().route(
            "/algorithm",
            axum::routing::post(|axum::Json(body): axum::Json<Value>| async move {
                let start = body["start_date"].as_str().and_then(|s| {
                    chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
                });
                let end = body["end_date"].as_str().and_then(|s| {
                    chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").ok()
                });
                let epsilon = body["params"]["epsilon"].as_f64();
                match (start, end, epsilon) {
                    (Some(_), Some(_), Some(epsilon)) => Ok(axum::Json(json!({
                        "DP": [[56.0, 10.0], [56.1, 10.1]],
                        "raw": [[56.0, 10.0], [56.05, 10.05], [56.1, 10.1]],
                        "epsilon": epsilon,
                    }))),
                    _ => Err(StatusCode::INTERNAL_SERVER_ERROR),
                }
            }),
        );
        spawn_fake_upstream(router).await
    }

    #[tokio::test]
    async fn default_dashboard_body_is_accepted_by_the_service() {
        let (addr, upstream) = strict_upstream().await;
        let state = state_for(&format!("http://{addr}"));
        let app = crate::app::build_app(state.clone(), "client/dist");

        let response = app
            .oneshot(algorithm_request(json!({
                "algorithms": ["DP"],
                "start_date": null,
                "end_time": "2024-01-01 00:00:00",
                "params": {"DP": {"epsilon": 10.0}}
            })))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let body = read_json(response).await;
        assert_eq!(body["epsilon"], json!(10.0));
        assert_eq!(state.observability.snapshot().upstream_errors_total, 0);

        upstream.abort();
    }

    #[tokio::test]
    async fn empty_selection_is_rejected_without_forwarding() {
        let (addr, upstream) = echo_upstream().await;
        let state = state_for(&format!("http://{addr}"));
        let app = crate::app::build_app(state.clone(), "client/dist");

        let mut body = valid_body();
        body["algorithms"] = json!([]);
        let response = app.oneshot(algorithm_request(body)).await.expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let counters = state.observability.snapshot();
        assert_eq!(counters.rejected_requests_total, 1);
        assert_eq!(counters.forwarded_requests_total, 0);

        upstream.abort();
    }

    #[tokio::test]
    async fn upstream_error_status_is_passed_through() {
        let router = Router::new().route(
            "/algorithm",
            axum::routing::post(|| async { StatusCode::SERVICE_UNAVAILABLE }),
        );
        let (addr, upstream) = spawn_fake_upstream(router).await;
        let state = state_for(&format!("http://{addr}"));
        let app = crate::app::build_app(state.clone(), "client/dist");

        let response = app
            .oneshot(algorithm_request(valid_body()))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(state.observability.snapshot().upstream_errors_total, 1);

        upstream.abort();
    }

    #[tokio::test]
    async fn unreachable_upstream_is_bad_gateway() {
        // Grab a free port and release it so nothing is listening there.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let addr = listener.local_addr().expect("address");
        drop(listener);

        let state = state_for(&format!("http://{addr}"));
        let app = crate::app::build_app(state.clone(), "client/dist");
        let response = app
            .oneshot(algorithm_request(valid_body()))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(state.observability.snapshot().upstream_errors_total, 1);
    }

    #[tokio::test]
    async fn health_reports_upstream_and_counters() {
        let state = state_for("http://127.0.0.1:5000");
        let app = crate::app::build_app(state, "client/dist");

        let response = app
            .oneshot(Request::get("/api/health").body(Body::empty()).expect("request"))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let body = read_json(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["upstream"], "http://127.0.0.1:5000/algorithm");
        assert_eq!(body["observability"]["forwarded_requests_total"], 0);
    }

    #[test]
    fn malformed_or_invalid_bodies_are_bad_requests() {
        assert_eq!(
            parse_simplify_request(b"{not json").unwrap_err(),
            StatusCode::BAD_REQUEST
        );
        let raw_only = json!({
            "algorithms": ["raw"],
            "end_time": "2024-01-01 00:00:00"
        });
        assert_eq!(
            parse_simplify_request(raw_only.to_string().as_bytes()).unwrap_err(),
            StatusCode::BAD_REQUEST
        );
        let legacy_end_date = json!({
            "algorithms": ["DP"],
            "end_date": "2024-01-01 00:00:00"
        });
        let request = parse_simplify_request(legacy_end_date.to_string().as_bytes())
            .expect("end_date alias accepted");
        assert_eq!(request.end_time, "2024-01-01 00:00:00");
    }

    #[test]
    fn metrics_output_contains_prometheus_help_type_and_values() {
        let body = render_prometheus_metrics(
            42,
            ObservabilitySnapshot {
                forwarded_requests_total: 7,
                rejected_requests_total: 2,
                upstream_errors_total: 1,
            },
        );

        assert!(body.contains("# TYPE trajview_uptime_seconds gauge"));
        assert!(body.contains("trajview_uptime_seconds 42"));
        assert!(body.contains("# TYPE trajview_forwarded_requests_total counter"));
        assert!(body.contains("trajview_forwarded_requests_total 7"));
        assert!(body.contains("trajview_rejected_requests_total 2"));
        assert!(body.contains("trajview_upstream_errors_total 1"));
    }
}
