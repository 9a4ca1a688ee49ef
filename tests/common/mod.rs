//! Shared test utilities: an in-memory APM backend that records every call

#![allow(dead_code)]

use apm_segments::apm::{
    Agent, DatastoreParams, ExternalSegmentHandle, OutboundRequest, RequestInfo, ResponseMeta,
    SegmentHandle, Transaction,
};
use apm_segments::config::ApmConfig;
use apm_segments::transaction::Application;
use hyper::http::StatusCode;
use parking_lot::Mutex;
use std::sync::Arc;

pub const LICENSE_KEY: &str = "0123456789abcdef0123456789abcdef01234567";

/// Backend call observed by the recorder
#[derive(Debug, Clone, PartialEq)]
pub enum Recorded {
    TransactionStarted { name: String, info: RequestInfo },
    TransactionEnded { name: String },
    Attribute { key: String, value: String },
    ResponseStatus(StatusCode),
    /// Reported when the datastore segment ends
    Datastore(DatastoreParams),
    /// Reported when the external segment ends
    External {
        request: OutboundRequest,
        response: Option<ResponseMeta>,
    },
    /// Reported when the generic segment ends
    Segment { name: String },
}

type Log = Arc<Mutex<Vec<Recorded>>>;

#[derive(Clone, Default)]
pub struct RecordingAgent {
    log: Log,
}

impl RecordingAgent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Recorded> {
        self.log.lock().clone()
    }

    pub fn count(&self, matches: impl Fn(&Recorded) -> bool) -> usize {
        self.log.lock().iter().filter(|e| matches(e)).count()
    }

    pub fn ended_transactions(&self) -> usize {
        self.count(|e| matches!(e, Recorded::TransactionEnded { .. }))
    }

    /// Application wired to this recorder
    pub fn application(&self) -> Application {
        Application::with_agent(&apm_config(), Arc::new(self.clone())).expect("valid test config")
    }
}

impl Agent for RecordingAgent {
    fn start_transaction(&self, name: &str, info: &RequestInfo) -> Arc<dyn Transaction> {
        self.log.lock().push(Recorded::TransactionStarted {
            name: name.to_string(),
            info: info.clone(),
        });
        Arc::new(RecordingTransaction {
            name: name.to_string(),
            log: self.log.clone(),
        })
    }
}

struct RecordingTransaction {
    name: String,
    log: Log,
}

impl Transaction for RecordingTransaction {
    fn end(&self) {
        self.log.lock().push(Recorded::TransactionEnded {
            name: self.name.clone(),
        });
    }

    fn add_attribute(&self, key: &str, value: &str) {
        self.log.lock().push(Recorded::Attribute {
            key: key.to_string(),
            value: value.to_string(),
        });
    }

    fn set_response_status(&self, status: StatusCode) {
        self.log.lock().push(Recorded::ResponseStatus(status));
    }

    fn start_datastore_segment(&self, params: DatastoreParams) -> Box<dyn SegmentHandle> {
        Box::new(RecordingSegment {
            report: Recorded::Datastore(params),
            log: self.log.clone(),
        })
    }

    fn start_external_segment(
        &self,
        request: &OutboundRequest,
    ) -> Box<dyn ExternalSegmentHandle> {
        Box::new(RecordingExternal {
            request: request.clone(),
            response: None,
            log: self.log.clone(),
        })
    }

    fn start_segment(&self, name: &str) -> Box<dyn SegmentHandle> {
        Box::new(RecordingSegment {
            report: Recorded::Segment {
                name: name.to_string(),
            },
            log: self.log.clone(),
        })
    }
}

struct RecordingSegment {
    report: Recorded,
    log: Log,
}

impl SegmentHandle for RecordingSegment {
    fn end(self: Box<Self>) {
        let this = *self;
        this.log.lock().push(this.report);
    }
}

struct RecordingExternal {
    request: OutboundRequest,
    response: Option<ResponseMeta>,
    log: Log,
}

impl ExternalSegmentHandle for RecordingExternal {
    fn set_response(&mut self, response: Option<ResponseMeta>) {
        self.response = response;
    }

    fn end(self: Box<Self>) {
        let this = *self;
        this.log.lock().push(Recorded::External {
            request: this.request,
            response: this.response,
        });
    }
}

pub fn apm_config() -> ApmConfig {
    ApmConfig {
        app_name: "orders-api".to_string(),
        license_key: LICENSE_KEY.to_string(),
        enabled: true,
    }
}
