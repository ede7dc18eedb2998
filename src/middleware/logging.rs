//! Per-request logging with a correlation span.

use std::fmt::Debug;
use std::task::{Context, Poll};

use futures::future::BoxFuture;
use tower::{Layer, Service};
use tracing::{field, info_span, Instrument};
use uuid::Uuid;

/// Wraps each call in a `request` span and logs its outcome
#[derive(Debug, Clone)]
pub struct RequestLogLayer {
    service_name: String,
}

impl RequestLogLayer {
    /// Creates a new logging layer
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
        }
    }
}

impl<S> Layer<S> for RequestLogLayer {
    type Service = RequestLogService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequestLogService {
            inner,
            service_name: self.service_name.clone(),
        }
    }
}

/// Service produced by [`RequestLogLayer`]
#[derive(Debug, Clone)]
pub struct RequestLogService<S> {
    inner: S,
    service_name: String,
}

impl<S, Req> Service<Req> for RequestLogService<S>
where
    S: Service<Req> + Clone + Send + 'static,
    S::Response: Send + 'static,
    S::Error: Debug + Send + 'static,
    S::Future: Send + 'static,
    Req: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Req) -> Self::Future {
        let correlation_id = Uuid::new_v4();
        // Hand the service polled ready to this call, keep a fresh clone.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        let span = info_span!(
            "request",
            service = %self.service_name,
            correlation_id = %correlation_id,
            auth.sub = field::Empty,
        );

        Box::pin(
            async move {
                let result = inner.call(req).await;
                match &result {
                    Ok(_) => tracing::info!("Request completed"),
                    Err(err) => tracing::error!(
                        error = ?err,
                        error_type = std::any::type_name::<S::Error>(),
                        "Request failed"
                    ),
                }
                result
            }
            .instrument(span),
        )
    }
}
