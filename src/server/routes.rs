//! Demo routes
//!
//! Small handlers that exercise the segment façade the way an application
//! would: attributes on the transaction, a generic segment around the work.

use crate::segments::{add_attribute, start_segment};
use bytes::Bytes;
use http_body_util::Full;
use hyper::{Method, Request, Response, StatusCode};
use std::convert::Infallible;

/// Dispatch a request to its handler
pub async fn route<B>(req: Request<B>) -> Result<Response<Full<Bytes>>, Infallible> {
    let response = match (req.method(), req.uri().path()) {
        (&Method::GET, "/health") => health_handler(&req),
        (&Method::GET, "/") => index_handler(&req),
        _ => not_found_handler(&req),
    };
    Ok(response)
}

/// Handle /health endpoint
fn health_handler<B>(req: &Request<B>) -> Response<Full<Bytes>> {
    add_attribute(req, "route", "health");
    json_response(StatusCode::OK, r#"{"status":"ok"}"#)
}

/// Handle / endpoint
fn index_handler<B>(req: &Request<B>) -> Response<Full<Bytes>> {
    add_attribute(req, "route", "index");

    let segment = start_segment(req, "render_index");
    let body = format!(r#"{{"service":"{}"}}"#, env!("CARGO_PKG_NAME"));
    segment.end();

    json_response(StatusCode::OK, body)
}

/// Handle unknown endpoints
fn not_found_handler<B>(req: &Request<B>) -> Response<Full<Bytes>> {
    add_attribute(req, "route", "not_found");
    let mut response = Response::new(Full::new(Bytes::from("Not Found")));
    *response.status_mut() = StatusCode::NOT_FOUND;
    response
}

fn json_response(status: StatusCode, body: impl Into<Bytes>) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(body.into()));
    *response.status_mut() = status;
    response.headers_mut().insert(
        hyper::header::CONTENT_TYPE,
        hyper::header::HeaderValue::from_static("application/json"),
    );
    response
}
