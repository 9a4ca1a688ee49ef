//! Named and no-op segments

use super::{Segment, SegmentKind};
use crate::apm::{SegmentHandle, Transaction};
use std::sync::Arc;

/// Arbitrary named unit of work
pub struct NamedSegment {
    name: String,
    handle: Box<dyn SegmentHandle>,
}

impl NamedSegment {
    pub fn start(transaction: &Arc<dyn Transaction>, name: &str) -> Self {
        Self {
            name: name.to_string(),
            handle: transaction.start_segment(name),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Segment for NamedSegment {
    fn kind(&self) -> SegmentKind {
        SegmentKind::Generic
    }

    fn end(self: Box<Self>) {
        self.handle.end();
    }
}

/// Segment returned when no transaction is in scope
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoopSegment;

impl Segment for NoopSegment {
    fn kind(&self) -> SegmentKind {
        SegmentKind::Noop
    }

    fn end(self: Box<Self>) {}
}
