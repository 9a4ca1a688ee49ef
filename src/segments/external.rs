//! Outbound HTTP call segment

use super::{Segment, SegmentKind};
use crate::apm::{ExternalSegmentHandle, OutboundRequest, ResponseMeta, Transaction};
use std::sync::Arc;

/// Outbound call made while handling a request
pub struct ExternalSegment {
    request: OutboundRequest,
    handle: Box<dyn ExternalSegmentHandle>,
}

impl ExternalSegment {
    pub fn start(transaction: &Arc<dyn Transaction>, request: &OutboundRequest) -> Self {
        Self {
            request: request.clone(),
            handle: transaction.start_external_segment(request),
        }
    }

    pub fn request(&self) -> &OutboundRequest {
        &self.request
    }
}

impl Segment for ExternalSegment {
    fn kind(&self) -> SegmentKind {
        SegmentKind::External
    }

    fn set_response(&mut self, response: Option<ResponseMeta>) {
        self.handle.set_response(response);
    }

    fn end(self: Box<Self>) {
        self.handle.end();
    }
}
