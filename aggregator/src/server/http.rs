//! Admin HTTP server for health checks, metrics and live GPU views

use crate::audit;
use crate::engine::AggregationEngine;
use crate::metrics;
use crate::sink::PrometheusSink;
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::service::{make_service_fn, service_fn};
use hyper::{Body, Method, Request, Response, Server, StatusCode};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

const TEXT: &str = "text/plain; charset=utf-8";
const JSON: &str = "application/json";
const PROMETHEUS_TEXT: &str = "text/plain; version=0.0.4";

/// Serve /healthz, /readyz, /metrics, /gpus and /gpu/{uuid}/metrics until
/// `shutdown` resolves.
pub async fn serve_admin(
    addr: SocketAddr,
    engine: Arc<AggregationEngine>,
    sink: Arc<PrometheusSink>,
    shutdown: impl Future<Output = ()>,
) -> Result<(), hyper::Error> {
    let make_svc = make_service_fn(move |_| {
        let engine = engine.clone();
        let sink = sink.clone();
        async move {
            Ok::<_, hyper::Error>(service_fn(move |req: Request<Body>| {
                let engine = engine.clone();
                let sink = sink.clone();
                async move { Ok::<_, hyper::Error>(handle(&req, &engine, &sink)) }
            }))
        }
    });

    tracing::info!("Admin HTTP server listening on {}", addr);
    Server::try_bind(&addr)?
        .serve(make_svc)
        .with_graceful_shutdown(shutdown)
        .await
}

fn respond(status: StatusCode, content_type: &'static str, body: impl Into<Body>) -> Response<Body> {
    let mut res = Response::new(body.into());
    *res.status_mut() = status;
    res.headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    res
}

fn json<T: serde::Serialize>(value: &T) -> Response<Body> {
    match serde_json::to_string(value) {
        Ok(body) => respond(StatusCode::OK, JSON, body),
        Err(e) => {
            tracing::error!("Failed to encode JSON response: {}", e);
            respond(StatusCode::INTERNAL_SERVER_ERROR, TEXT, "encoding error\n")
        }
    }
}

fn not_found(message: &str) -> Response<Body> {
    let body = serde_json::json!({ "error": message }).to_string();
    respond(StatusCode::NOT_FOUND, JSON, body)
}

/// `/gpu/{uuid}/metrics` → `uuid`
fn gpu_uuid_from_path(path: &str) -> Option<&str> {
    path.strip_prefix("/gpu/")?
        .strip_suffix("/metrics")
        .filter(|uuid| !uuid.is_empty() && !uuid.contains('/'))
}

fn render_metrics(sink: &PrometheusSink) -> crate::error::Result<String> {
    let mut body = sink.encode()?;
    body.push_str(&metrics::encode_metrics()?);
    Ok(body)
}

pub fn handle(req: &Request<Body>, engine: &AggregationEngine, sink: &PrometheusSink) -> Response<Body> {
    let path = req.uri().path();

    let response = if req.method() != Method::GET {
        respond(StatusCode::METHOD_NOT_ALLOWED, TEXT, "method not allowed\n")
    } else {
        match path {
            "/healthz" => respond(StatusCode::OK, TEXT, "ok\n"),

            "/readyz" => respond(StatusCode::OK, TEXT, "ready\n"),

            "/metrics" => match render_metrics(sink) {
                Ok(body) => respond(StatusCode::OK, PROMETHEUS_TEXT, body),
                Err(e) => {
                    tracing::error!("Failed to render metrics: {}", e);
                    respond(StatusCode::INTERNAL_SERVER_ERROR, TEXT, "metrics unavailable\n")
                }
            },

            "/gpus" => json(&engine.get_all_gpu_metrics()),

            _ => match gpu_uuid_from_path(path) {
                Some(uuid) => match engine.get_gpu_metrics(uuid) {
                    Some(snapshot) => json(&snapshot),
                    None => not_found("gpu not found"),
                },
                None => respond(StatusCode::NOT_FOUND, TEXT, "not found\n"),
            },
        }
    };

    audit::admin_http_request(path, response.status().as_u16());
    response
}
