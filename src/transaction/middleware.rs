//! Service wrapper that runs each request inside a transaction

use super::{attach, Application, TransactionGuard};
use hyper::service::Service;
use hyper::{Request, Response};
use std::future::Future;
use std::pin::Pin;

/// A service wrapped by [`Application::handler`]
#[derive(Debug, Clone)]
pub struct Traced<S> {
    app: Application,
    inner: S,
}

impl<S> Traced<S> {
    pub(crate) fn new(app: Application, inner: S) -> Self {
        Self { app, inner }
    }

    pub fn get_ref(&self) -> &S {
        &self.inner
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S, B, ResBody> Service<Request<B>> for Traced<S>
where
    S: Service<Request<B>, Response = Response<ResBody>>,
    S::Future: Send + 'static,
    S::Error: 'static,
    ResBody: 'static,
{
    type Response = Response<ResBody>;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, mut req: Request<B>) -> Self::Future {
        let Some(transaction) = self.app.start_transaction(&req) else {
            return Box::pin(self.inner.call(req));
        };

        // Created before the inner call so a panic in `call` still ends it.
        let guard = TransactionGuard::new(transaction.clone());
        attach(req.extensions_mut(), transaction);
        let future = self.inner.call(req);

        Box::pin(async move {
            let result = future.await;
            if let Ok(response) = &result {
                guard.transaction().set_response_status(response.status());
            }
            drop(guard);
            result
        })
    }
}
