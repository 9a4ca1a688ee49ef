//! Request-scoped transaction storage
//!
//! The active transaction lives in the request's `http::Extensions`, keyed by
//! the private [`ActiveTransaction`] type. Nothing outside this module can
//! name that type, so no other extension can shadow or spoof it.

use crate::apm::Transaction;
use hyper::http::Extensions;
use hyper::Request;
use std::sync::Arc;

/// Extension slot holding the active transaction
#[derive(Clone)]
struct ActiveTransaction(Arc<dyn Transaction>);

/// Store `transaction` as the active transaction for a request
pub(crate) fn attach(extensions: &mut Extensions, transaction: Arc<dyn Transaction>) {
    extensions.insert(ActiveTransaction(transaction));
}

/// Resolve the active transaction carried by a request, if any
pub fn transaction_from<B>(request: Option<&Request<B>>) -> Option<&Arc<dyn Transaction>> {
    request?
        .extensions()
        .get::<ActiveTransaction>()
        .map(|active| &active.0)
}

/// Ends its transaction when dropped
///
/// Held across the wrapped service call so the transaction ends on normal
/// return, on error, on panic, and when hyper drops the request future.
pub struct TransactionGuard {
    transaction: Arc<dyn Transaction>,
}

impl TransactionGuard {
    pub fn new(transaction: Arc<dyn Transaction>) -> Self {
        Self { transaction }
    }

    pub fn transaction(&self) -> &Arc<dyn Transaction> {
        &self.transaction
    }
}

impl Drop for TransactionGuard {
    fn drop(&mut self) {
        self.transaction.end();
    }
}
