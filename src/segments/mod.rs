//! Segment façade
//!
//! Uniform constructors for timed sub-spans of the active transaction. Every
//! constructor takes the inbound request (or `None`) and returns a
//! `Box<dyn Segment>`: a live segment when the request carries a transaction,
//! a [`NoopSegment`] otherwise. Callers write the same code either way:
//!
//! ```
//! use apm_segments::segments::{start_cache_segment, start_database_segment};
//! use hyper::Request;
//!
//! let request = Request::new(());
//!
//! let segment = start_database_segment(&request, "users", "SELECT");
//! // ... run the query ...
//! segment.end();
//!
//! let segment = start_cache_segment(&request, "GET", "user:42");
//! segment.end();
//! ```
//!
//! Segments must be ended by the caller. One that is dropped without `end`
//! is never reported.

mod datastore;
mod external;
mod generic;

pub use datastore::{CacheSegment, DatabaseSegment};
pub use external::ExternalSegment;
pub use generic::{NamedSegment, NoopSegment};

use crate::apm::{OutboundRequest, ResponseMeta};
use crate::transaction::transaction_from;
use hyper::Request;
use std::fmt;

/// Which variant a segment is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SegmentKind {
    Database,
    Cache,
    External,
    Generic,
    Noop,
}

impl fmt::Display for SegmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SegmentKind::Database => "database",
            SegmentKind::Cache => "cache",
            SegmentKind::External => "external",
            SegmentKind::Generic => "generic",
            SegmentKind::Noop => "noop",
        };
        f.write_str(name)
    }
}

/// A timed operation within a transaction
pub trait Segment: Send {
    fn kind(&self) -> SegmentKind;

    /// Attach the response of the traced operation.
    ///
    /// Only outbound call segments use it; every other kind ignores it.
    fn set_response(&mut self, _response: Option<ResponseMeta>) {}

    /// Finish the segment and report it with its elapsed time
    fn end(self: Box<Self>);
}

/// Start a segment for a relational database call on `table`
pub fn start_database_segment<'a, B: 'a>(
    request: impl Into<Option<&'a Request<B>>>,
    table: &str,
    operation: &str,
) -> Box<dyn Segment> {
    match transaction_from::<B>(request.into()) {
        Some(transaction) => Box::new(DatabaseSegment::start(transaction, table, operation)),
        None => Box::new(NoopSegment),
    }
}

/// Start a segment for a cache call on `key`
pub fn start_cache_segment<'a, B: 'a>(
    request: impl Into<Option<&'a Request<B>>>,
    operation: &str,
    key: &str,
) -> Box<dyn Segment> {
    match transaction_from::<B>(request.into()) {
        Some(transaction) => Box::new(CacheSegment::start(transaction, operation, key)),
        None => Box::new(NoopSegment),
    }
}

/// Start a segment for an outbound HTTP call
pub fn start_external_segment<'a, B: 'a>(
    request: impl Into<Option<&'a Request<B>>>,
    outbound: &OutboundRequest,
) -> Box<dyn Segment> {
    match transaction_from::<B>(request.into()) {
        Some(transaction) => Box::new(ExternalSegment::start(transaction, outbound)),
        None => Box::new(NoopSegment),
    }
}

/// Start a generic segment called `name`
pub fn start_segment<'a, B: 'a>(
    request: impl Into<Option<&'a Request<B>>>,
    name: &str,
) -> Box<dyn Segment> {
    match transaction_from::<B>(request.into()) {
        Some(transaction) => Box::new(NamedSegment::start(transaction, name)),
        None => Box::new(NoopSegment),
    }
}

/// Attach a key/value attribute to the request's transaction, if any
pub fn add_attribute<'a, B: 'a>(request: impl Into<Option<&'a Request<B>>>, key: &str, value: &str) {
    if let Some(transaction) = transaction_from::<B>(request.into()) {
        transaction.add_attribute(key, value);
    }
}
