//! `tracing`-backed APM agent
//!
//! Transactions become `apm.transaction` spans and segments become child
//! `apm.segment` spans. Ending either emits a completion event carrying the
//! elapsed time and closes the span, so any subscriber layer (fmt, JSON,
//! OpenTelemetry) sees the same shape a hosted APM would.

use super::{
    Agent, DatastoreParams, ExternalSegmentHandle, OutboundRequest, RequestInfo, ResponseMeta,
    SegmentHandle, Transaction,
};
use hyper::http::StatusCode;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Instant;
use tracing::{field, info, info_span, Span};

/// Agent that reports through the global `tracing` dispatcher
#[derive(Debug, Clone)]
pub struct TracingAgent {
    app_name: String,
}

impl TracingAgent {
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
        }
    }

    pub fn app_name(&self) -> &str {
        &self.app_name
    }
}

impl Agent for TracingAgent {
    fn start_transaction(&self, name: &str, request: &RequestInfo) -> Arc<dyn Transaction> {
        let span = info_span!(
            target: "apm",
            "apm.transaction",
            apm.app = %self.app_name,
            otel.name = name,
            otel.kind = "server",
            http.method = %request.method,
            http.target = %request.path,
            http.host = request.host.as_deref().unwrap_or(""),
            http.user_agent = request.user_agent.as_deref().unwrap_or(""),
            http.status_code = field::Empty,
        );

        Arc::new(SpanTransaction {
            name: name.to_string(),
            started: Instant::now(),
            span: Mutex::new(Some(span)),
        })
    }
}

/// Transaction backed by a span that closes on `end`
#[derive(Debug)]
struct SpanTransaction {
    name: String,
    started: Instant,
    span: Mutex<Option<Span>>,
}

impl SpanTransaction {
    /// Parent for new segments; detached once the transaction has ended
    fn parent(&self) -> Span {
        self.span.lock().clone().unwrap_or_else(Span::none)
    }
}

impl Transaction for SpanTransaction {
    fn end(&self) {
        let Some(span) = self.span.lock().take() else {
            return;
        };
        let elapsed = self.started.elapsed();
        info!(
            target: "apm",
            parent: &span,
            transaction = %self.name,
            duration_ms = elapsed.as_secs_f64() * 1000.0,
            "transaction finished"
        );
    }

    fn add_attribute(&self, key: &str, value: &str) {
        if let Some(span) = self.span.lock().as_ref() {
            info!(
                target: "apm",
                parent: span,
                attribute_key = key,
                attribute_value = value,
                "transaction attribute"
            );
        }
    }

    fn set_response_status(&self, status: StatusCode) {
        if let Some(span) = self.span.lock().as_ref() {
            span.record("http.status_code", status.as_u16());
        }
    }

    fn start_datastore_segment(&self, params: DatastoreParams) -> Box<dyn SegmentHandle> {
        let parent = self.parent();
        let span = info_span!(
            target: "apm",
            parent: &parent,
            "apm.segment",
            segment.kind = "datastore",
            db.system = params.product.as_str(),
            db.collection = params.collection.as_deref().unwrap_or(""),
            db.operation = %params.operation,
            db.statement = params.parameterized_query.as_deref().unwrap_or(""),
        );

        if !params.query_parameters.is_empty() {
            let query_parameters =
                serde_json::to_string(&params.query_parameters).unwrap_or_default();
            info!(target: "apm", parent: &span, %query_parameters, "datastore query parameters");
        }

        Box::new(SpanSegment {
            label: format!("{}/{}", params.product, params.operation),
            started: Instant::now(),
            span,
        })
    }

    fn start_external_segment(
        &self,
        request: &OutboundRequest,
    ) -> Box<dyn ExternalSegmentHandle> {
        let parent = self.parent();
        let span = info_span!(
            target: "apm",
            parent: &parent,
            "apm.segment",
            segment.kind = "external",
            otel.kind = "client",
            http.method = %request.method,
            http.url = %request.url,
            http.status_code = field::Empty,
        );

        Box::new(ExternalSpanSegment {
            url: request.url.clone(),
            started: Instant::now(),
            span,
            response: None,
        })
    }

    fn start_segment(&self, name: &str) -> Box<dyn SegmentHandle> {
        let parent = self.parent();
        let span = info_span!(
            target: "apm",
            parent: &parent,
            "apm.segment",
            segment.kind = "generic",
            segment.name = name,
        );

        Box::new(SpanSegment {
            label: name.to_string(),
            started: Instant::now(),
            span,
        })
    }
}

struct SpanSegment {
    label: String,
    started: Instant,
    span: Span,
}

impl SegmentHandle for SpanSegment {
    fn end(self: Box<Self>) {
        info!(
            target: "apm",
            parent: &self.span,
            segment = %self.label,
            duration_ms = self.started.elapsed().as_secs_f64() * 1000.0,
            "segment finished"
        );
    }
}

struct ExternalSpanSegment {
    url: String,
    started: Instant,
    span: Span,
    response: Option<ResponseMeta>,
}

impl ExternalSegmentHandle for ExternalSpanSegment {
    fn set_response(&mut self, response: Option<ResponseMeta>) {
        if let Some(meta) = &response {
            self.span.record("http.status_code", meta.status.as_u16());
        }
        self.response = response;
    }

    fn end(self: Box<Self>) {
        let status = self.response.as_ref().map(|r| r.status.as_u16()).unwrap_or(0);
        info!(
            target: "apm",
            parent: &self.span,
            url = %self.url,
            status,
            duration_ms = self.started.elapsed().as_secs_f64() * 1000.0,
            "external call finished"
        );
    }
}
