//! Cookie to bearer token translation for HTTP gateway requests.
//!
//! Browsers carry the session token in an encrypted cookie. When a request
//! arrives without an `authorization` header, the cookie is decrypted and
//! the token is forwarded as `authorization: Bearer <token>`.

use std::sync::Arc;
use std::task::{Context, Poll};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use http::header::{HeaderMap, HeaderValue, AUTHORIZATION, COOKIE};
use tower::{Layer, Service};
use tracing::debug;

use crate::auth::BEARER_SCHEME;
use crate::encryption::Cipher;
use crate::error::AuthError;

/// Layer that turns an encrypted session cookie into a bearer header
#[derive(Clone)]
pub struct CookieAuthLayer {
    cookie_name: Arc<str>,
    cipher: Arc<Cipher>,
}

impl CookieAuthLayer {
    /// Creates a layer reading `cookie_name`, decrypted with `cipher`
    pub fn new(cookie_name: impl Into<String>, cipher: Cipher) -> Self {
        Self {
            cookie_name: Arc::from(cookie_name.into()),
            cipher: Arc::new(cipher),
        }
    }

    /// Name of the session cookie
    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    /// Encrypts `token` into a cookie value this layer accepts.
    ///
    /// # Errors
    ///
    /// Returns an encryption error if sealing fails.
    pub fn encode_token(&self, token: &str) -> Result<String, AuthError> {
        let sealed = self.cipher.encrypt(token.as_bytes())?;
        Ok(URL_SAFE_NO_PAD.encode(sealed))
    }

    /// Decrypts a cookie value back into its token.
    ///
    /// # Errors
    ///
    /// Returns an encryption error for bad encoding, a failed tag check or a
    /// non UTF-8 token.
    pub fn decode_token(&self, value: &str) -> Result<String, AuthError> {
        let sealed = URL_SAFE_NO_PAD
            .decode(value.trim().trim_end_matches('='))
            .map_err(|e| AuthError::encryption(format!("cookie is not base64url: {e}")))?;
        let plain = self.cipher.decrypt(&sealed)?;
        String::from_utf8(plain).map_err(|_| AuthError::encryption("cookie token is not UTF-8"))
    }
}

impl std::fmt::Debug for CookieAuthLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CookieAuthLayer")
            .field("cookie_name", &self.cookie_name)
            .finish_non_exhaustive()
    }
}

impl<S> Layer<S> for CookieAuthLayer {
    type Service = CookieAuthService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        CookieAuthService {
            inner,
            layer: self.clone(),
        }
    }
}

/// Service produced by [`CookieAuthLayer`]
#[derive(Clone, Debug)]
pub struct CookieAuthService<S> {
    inner: S,
    layer: CookieAuthLayer,
}

impl<S> CookieAuthService<S> {
    fn bearer_from_cookie(&self, headers: &HeaderMap) -> Option<HeaderValue> {
        let value = find_cookie(headers, self.layer.cookie_name())?;
        match self.layer.decode_token(value) {
            Ok(token) => HeaderValue::from_str(&format!("{BEARER_SCHEME} {token}")).ok(),
            Err(err) => {
                debug!(error = %err, "Ignoring undecodable session cookie");
                None
            }
        }
    }
}

impl<S, B> Service<http::Request<B>> for CookieAuthService<S>
where
    S: Service<http::Request<B>>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: http::Request<B>) -> Self::Future {
        if !req.headers().contains_key(AUTHORIZATION) {
            if let Some(bearer) = self.bearer_from_cookie(req.headers()) {
                req.headers_mut().insert(AUTHORIZATION, bearer);
            }
        }
        self.inner.call(req)
    }
}

/// Value of the first cookie called `name` across all `Cookie` headers.
fn find_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|header| header.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim_matches('"'))
}
