//! Database and cache segments
//!
//! Both report as backend datastore segments; they differ in product and in
//! which metadata they fill in.

use super::{Segment, SegmentKind};
use crate::apm::{DatastoreParams, DatastoreProduct, SegmentHandle, Transaction};
use std::collections::HashMap;
use std::sync::Arc;

/// Relational database call against one table
pub struct DatabaseSegment {
    table: String,
    operation: String,
    handle: Box<dyn SegmentHandle>,
}

impl DatabaseSegment {
    pub fn start(transaction: &Arc<dyn Transaction>, table: &str, operation: &str) -> Self {
        let mut params = DatastoreParams::new(DatastoreProduct::Postgres, operation);
        params.collection = Some(table.to_string());

        Self {
            table: table.to_string(),
            operation: operation.to_string(),
            handle: transaction.start_datastore_segment(params),
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }
}

impl Segment for DatabaseSegment {
    fn kind(&self) -> SegmentKind {
        SegmentKind::Database
    }

    fn end(self: Box<Self>) {
        self.handle.end();
    }
}

/// Cache call on a single key
pub struct CacheSegment {
    operation: String,
    key: String,
    handle: Box<dyn SegmentHandle>,
}

impl CacheSegment {
    pub fn start(transaction: &Arc<dyn Transaction>, operation: &str, key: &str) -> Self {
        let mut params = DatastoreParams::new(DatastoreProduct::Redis, operation);
        params.parameterized_query = Some(cache_query(operation, key));
        params.query_parameters = HashMap::from([("key".to_string(), key.into())]);

        Self {
            operation: operation.to_string(),
            key: key.to_string(),
            handle: transaction.start_datastore_segment(params),
        }
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Segment for CacheSegment {
    fn kind(&self) -> SegmentKind {
        SegmentKind::Cache
    }

    fn end(self: Box<Self>) {
        self.handle.end();
    }
}

/// Parameterized query string recorded for a cache call: `"<verb> <key>"`
fn cache_query(operation: &str, key: &str) -> String {
    format!("{} {}", operation, key)
}
