//! Server interceptor that authenticates every call.

use std::sync::Arc;

use tonic::service::Interceptor;
use tonic::{Request, Status};
use tracing::Span;

use crate::auth::{AuthApi, AuthContext};

/// Authenticates incoming calls and attaches their claims.
///
/// On success the request carries an [`AuthContext`] in its extensions, which
/// the `authorize_*` predicates read. Failures are returned as
/// `Unauthenticated` before the handler runs.
#[derive(Clone)]
pub struct AuthInterceptor {
    api: Arc<dyn AuthApi>,
}

impl AuthInterceptor {
    /// Creates an interceptor backed by `api`
    pub fn new(api: Arc<dyn AuthApi>) -> Self {
        Self { api }
    }

    /// The underlying auth API
    pub fn api(&self) -> &Arc<dyn AuthApi> {
        &self.api
    }
}

impl std::fmt::Debug for AuthInterceptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthInterceptor").finish_non_exhaustive()
    }
}

impl Interceptor for AuthInterceptor {
    fn call(&mut self, mut request: Request<()>) -> Result<Request<()>, Status> {
        let claims = self
            .api
            .authenticate(request.metadata())
            .map_err(|err| err.to_status())?;

        Span::current().record("auth.sub", claims.subject());
        request.extensions_mut().insert(AuthContext::new(claims));
        Ok(request)
    }
}
