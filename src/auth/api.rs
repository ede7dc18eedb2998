//! JWT authentication and authorization API.

use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use tonic::metadata::MetadataMap;
use tonic::{Extensions, Request};
use tracing::{debug, instrument, warn};
use uuid::Uuid;
use zeroize::Zeroizing;

use crate::auth::claims::{AuthContext, Claims, Payload};
use crate::auth::metadata::{add_token_md, bearer_token};
use crate::config::ConfigError;
use crate::error::AuthError;

/// Default group for ordinary users
pub const DEFAULT_USER_GROUP: &str = "USER";
/// Default administrators group
pub const DEFAULT_ADMIN_GROUP: &str = "ADMIN";
/// Default super administrators group
pub const DEFAULT_SUPER_ADMIN_GROUP: &str = "SUPER_ADMIN";

/// Admin groups used when none are configured
pub fn default_admin_groups() -> Vec<String> {
    vec![
        DEFAULT_ADMIN_GROUP.to_string(),
        DEFAULT_SUPER_ADMIN_GROUP.to_string(),
    ]
}

/// Authentication and authorization operations used by request handlers.
///
/// Predicates read the claims attached by [`AuthApi::authenticate`] (via the
/// interceptor) from the request extensions; they never verify tokens
/// themselves.
#[cfg_attr(any(test, feature = "mocks"), mockall::automock)]
pub trait AuthApi: Send + Sync {
    /// Verifies the bearer token in `metadata` and returns its claims.
    fn authenticate(&self, metadata: &MetadataMap) -> Result<Claims, AuthError>;

    /// Verifies the bearer token in `metadata` and returns its identity.
    fn authenticate_request(&self, metadata: &MetadataMap) -> Result<Payload, AuthError> {
        self.authenticate(metadata).map(|claims| claims.payload)
    }

    /// Claims attached to an authenticated request.
    fn get_claims(&self, extensions: &Extensions) -> Result<Claims, AuthError>;

    /// Identity attached to an authenticated request.
    fn get_jwt_payload(&self, extensions: &Extensions) -> Result<Payload, AuthError> {
        self.get_claims(extensions).map(|claims| claims.payload)
    }

    /// Requires the group or one of the roles to be in `allowed_groups`.
    fn authorize_group<'a>(
        &self,
        extensions: &Extensions,
        allowed_groups: &[&'a str],
    ) -> Result<Payload, AuthError>;

    /// Requires the subject to be exactly `actor_id`.
    fn authorize_actor(&self, extensions: &Extensions, actor_id: &str)
        -> Result<Payload, AuthError>;

    /// Requires the subject to be one of `actor_ids`.
    fn authorize_actors<'a>(
        &self,
        extensions: &Extensions,
        actor_ids: &[&'a str],
    ) -> Result<Payload, AuthError>;

    /// Requires both the group check and the actor check to pass.
    fn authorize_actor_and_group<'a>(
        &self,
        extensions: &Extensions,
        actor_id: &str,
        allowed_groups: &[&'a str],
    ) -> Result<Payload, AuthError>;

    /// Requires either the actor check or the group check to pass.
    fn authorize_actor_or_group<'a>(
        &self,
        extensions: &Extensions,
        actor_id: &str,
        allowed_groups: &[&'a str],
    ) -> Result<Payload, AuthError>;

    /// Requires membership of an admin group.
    fn authorize_admin(&self, extensions: &Extensions) -> Result<Payload, AuthError>;

    /// Requires membership of an admin group and the subject to be `admin_id`.
    fn authorize_admin_strict(
        &self,
        extensions: &Extensions,
        admin_id: &str,
    ) -> Result<Payload, AuthError>;

    /// Snapshot of the configured admin groups.
    fn admin_groups(&self) -> Vec<String>;

    /// Appends labels to the admin groups.
    fn add_admin_groups<'a>(&self, groups: &[&'a str]);

    /// Whether `group` is an admin group.
    fn is_admin(&self, group: &str) -> bool;

    /// Signs a token for `payload` that expires at `expires_at`.
    fn issue_token(&self, payload: &Payload, expires_at: DateTime<Utc>)
        -> Result<String, AuthError>;
}

/// Parameters for building a [`JwtAuthApi`].
#[derive(Clone)]
pub struct AuthOptions {
    /// HMAC signing key
    pub signing_key: Zeroizing<Vec<u8>>,
    /// Issuer written into and required on tokens
    pub issuer: String,
    /// Audience written into and required on tokens
    pub audience: String,
    /// Admin groups; defaults apply when empty
    pub admin_groups: Vec<String>,
}

impl AuthOptions {
    /// Creates options with the default admin groups
    pub fn new(
        signing_key: impl Into<Vec<u8>>,
        issuer: impl Into<String>,
        audience: impl Into<String>,
    ) -> Self {
        Self {
            signing_key: Zeroizing::new(signing_key.into()),
            issuer: issuer.into(),
            audience: audience.into(),
            admin_groups: Vec::new(),
        }
    }

    /// Sets the admin groups
    #[must_use]
    pub fn with_admin_groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.admin_groups = groups.into_iter().map(Into::into).collect();
        self
    }
}

impl fmt::Debug for AuthOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthOptions")
            .field("signing_key", &"[REDACTED]")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("admin_groups", &self.admin_groups)
            .finish()
    }
}

/// HS256 implementation of [`AuthApi`].
pub struct JwtAuthApi {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    issuer: String,
    audience: String,
    admin_groups: ArcSwap<Vec<String>>,
}

impl JwtAuthApi {
    /// Signing algorithm for issued and accepted tokens
    pub const ALGORITHM: Algorithm = Algorithm::HS256;

    /// Creates the API from validated options.
    ///
    /// # Errors
    ///
    /// Returns `MissingRequired` if the key, issuer or audience is empty.
    pub fn new(options: AuthOptions) -> Result<Self, ConfigError> {
        if options.signing_key.is_empty() {
            return Err(ConfigError::MissingRequired("jwt signing key".to_string()));
        }
        if options.issuer.trim().is_empty() {
            return Err(ConfigError::MissingRequired("jwt issuer".to_string()));
        }
        if options.audience.trim().is_empty() {
            return Err(ConfigError::MissingRequired("jwt audience".to_string()));
        }

        let admin_groups = if options.admin_groups.is_empty() {
            default_admin_groups()
        } else {
            options.admin_groups.clone()
        };

        let mut validation = Validation::new(Self::ALGORITHM);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["iss", "aud"]);
        validation.set_issuer(&[&options.issuer]);
        validation.set_audience(&[&options.audience]);

        Ok(Self {
            encoding_key: EncodingKey::from_secret(&options.signing_key),
            decoding_key: DecodingKey::from_secret(&options.signing_key),
            validation,
            issuer: options.issuer,
            audience: options.audience,
            admin_groups: ArcSwap::from_pointee(admin_groups),
        })
    }

    /// Verifies a raw token and returns its claims.
    ///
    /// # Errors
    ///
    /// Returns an unauthenticated-class error for bad signatures, expired
    /// tokens, foreign issuers/audiences and undecodable input.
    pub fn verify_token(&self, token: &str) -> Result<Claims, AuthError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation)?;
        // jsonwebtoken skips an `exp` it cannot read as u64 (pre-epoch).
        if data.claims.is_expired() {
            return Err(AuthError::TokenExpired);
        }
        Ok(data.claims)
    }

    /// Issues a non-expiring token for `actor_id` in `group` and attaches it
    /// to `request`. Intended for tests of services built on this API.
    ///
    /// # Errors
    ///
    /// Fails if signing fails or the token cannot be carried as metadata.
    pub fn add_md<T>(
        &self,
        request: &mut Request<T>,
        actor_id: &str,
        group: &str,
    ) -> Result<(), AuthError> {
        let tag = Uuid::new_v4().simple().to_string();
        let payload = Payload::new(actor_id, group)
            .with_names(format!("user-{}", &tag[..8]))
            .with_email(format!("{}@example.com", &tag[..12]));
        let token = self.sign(&payload, None)?;
        add_token_md(request, &token)
    }

    fn sign(&self, payload: &Payload, expires: Option<i64>) -> Result<String, AuthError> {
        let claims = Claims {
            payload: payload.clone(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            exp: expires,
            iat: Some(Utc::now().timestamp()),
        };

        let mut header = Header::new(Self::ALGORITHM);
        if !payload.project_id.is_empty() {
            header.kid = Some(payload.project_id.clone());
        }

        encode(&header, &claims, &self.encoding_key).map_err(|e| AuthError::Signing {
            reason: format!("{:?}", e.kind()),
        })
    }

    fn context<'a>(&self, extensions: &'a Extensions) -> Result<&'a AuthContext, AuthError> {
        extensions.get::<AuthContext>().ok_or(AuthError::NoClaims)
    }
}

impl fmt::Debug for JwtAuthApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtAuthApi")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("admin_groups", &**self.admin_groups.load())
            .finish_non_exhaustive()
    }
}

fn match_group<S: AsRef<str>>(payload: &Payload, allowed_groups: &[S]) -> Result<(), AuthError> {
    if payload.in_any_group(allowed_groups) {
        Ok(())
    } else {
        Err(AuthError::GroupDenied {
            group: payload.group.clone(),
            allowed: allowed_groups.iter().map(|g| g.as_ref().to_string()).collect(),
        })
    }
}

fn match_actor(payload: &Payload, actor_id: &str) -> Result<(), AuthError> {
    if payload.id == actor_id {
        Ok(())
    } else {
        Err(AuthError::ActorDenied {
            actor_id: payload.id.clone(),
        })
    }
}

impl AuthApi for JwtAuthApi {
    #[instrument(skip_all)]
    fn authenticate(&self, metadata: &MetadataMap) -> Result<Claims, AuthError> {
        let result = bearer_token(metadata).and_then(|token| self.verify_token(token));
        match &result {
            Ok(claims) => debug!(subject = %claims.subject(), "Request authenticated"),
            Err(err) => warn!(
                error_code = err.code().as_str(),
                error = %err,
                "Request authentication failed"
            ),
        }
        result
    }

    fn get_claims(&self, extensions: &Extensions) -> Result<Claims, AuthError> {
        self.context(extensions).map(|ctx| ctx.claims().clone())
    }

    fn authorize_group(
        &self,
        extensions: &Extensions,
        allowed_groups: &[&str],
    ) -> Result<Payload, AuthError> {
        let payload = self.context(extensions)?.payload();
        match_group(payload, allowed_groups)?;
        Ok(payload.clone())
    }

    fn authorize_actor(
        &self,
        extensions: &Extensions,
        actor_id: &str,
    ) -> Result<Payload, AuthError> {
        let payload = self.context(extensions)?.payload();
        match_actor(payload, actor_id)?;
        Ok(payload.clone())
    }

    fn authorize_actors(
        &self,
        extensions: &Extensions,
        actor_ids: &[&str],
    ) -> Result<Payload, AuthError> {
        let payload = self.context(extensions)?.payload();
        if actor_ids.iter().any(|id| payload.id == *id) {
            return Ok(payload.clone());
        }
        Err(AuthError::ActorsDenied {
            allowed: actor_ids.iter().map(|id| (*id).to_string()).collect(),
        })
    }

    fn authorize_actor_and_group(
        &self,
        extensions: &Extensions,
        actor_id: &str,
        allowed_groups: &[&str],
    ) -> Result<Payload, AuthError> {
        let payload = self.context(extensions)?.payload();
        match_group(payload, allowed_groups)?;
        match_actor(payload, actor_id)?;
        Ok(payload.clone())
    }

    fn authorize_actor_or_group(
        &self,
        extensions: &Extensions,
        actor_id: &str,
        allowed_groups: &[&str],
    ) -> Result<Payload, AuthError> {
        let payload = self.context(extensions)?.payload();
        match (match_actor(payload, actor_id), match_group(payload, allowed_groups)) {
            (Err(actor_err), Err(_)) => Err(actor_err),
            _ => Ok(payload.clone()),
        }
    }

    fn authorize_admin(&self, extensions: &Extensions) -> Result<Payload, AuthError> {
        let payload = self.context(extensions)?.payload();
        match_group(payload, self.admin_groups.load().as_slice())?;
        Ok(payload.clone())
    }

    fn authorize_admin_strict(
        &self,
        extensions: &Extensions,
        admin_id: &str,
    ) -> Result<Payload, AuthError> {
        let payload = self.authorize_admin(extensions)?;
        if payload.id != admin_id {
            return Err(AuthError::AdminDenied {
                admin_id: payload.id,
            });
        }
        Ok(payload)
    }

    fn admin_groups(&self) -> Vec<String> {
        Vec::clone(&self.admin_groups.load())
    }

    fn add_admin_groups(&self, groups: &[&str]) {
        self.admin_groups.rcu(|current| {
            let mut next = Vec::clone(current);
            next.extend(groups.iter().map(|g| (*g).to_string()));
            Arc::new(next)
        });
    }

    fn is_admin(&self, group: &str) -> bool {
        self.admin_groups.load().iter().any(|g| g == group)
    }

    fn issue_token(
        &self,
        payload: &Payload,
        expires_at: DateTime<Utc>,
    ) -> Result<String, AuthError> {
        self.sign(payload, Some(expires_at.timestamp()))
    }
}
