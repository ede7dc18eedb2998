//! Bearer token transport in request metadata.

use tonic::metadata::{Ascii, MetadataMap, MetadataValue};
use tonic::Request;

use crate::error::AuthError;

/// Metadata key carrying the credential
pub const AUTHORIZATION: &str = "authorization";

/// Scheme expected in front of the token
pub const BEARER_SCHEME: &str = "Bearer";

/// Extracts the bearer token from `authorization` metadata.
///
/// # Errors
///
/// `TokenMissing` when the entry is absent or empty, `BadScheme` when the
/// scheme is not `Bearer` (compared case-insensitively), `TokenMalformed`
/// when the value is not a `<scheme> <token>` pair.
pub fn bearer_token(metadata: &MetadataMap) -> Result<&str, AuthError> {
    let value = metadata.get(AUTHORIZATION).ok_or(AuthError::TokenMissing)?;
    let value = value
        .to_str()
        .map_err(|_| AuthError::malformed("authorization metadata is not valid ASCII"))?;
    parse_bearer(value)
}

/// Splits an `authorization` value into its bearer token.
///
/// # Errors
///
/// See [`bearer_token`].
pub fn parse_bearer(value: &str) -> Result<&str, AuthError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AuthError::TokenMissing);
    }

    let Some((scheme, token)) = value.split_once(' ') else {
        if value.eq_ignore_ascii_case(BEARER_SCHEME) {
            return Err(AuthError::TokenMissing);
        }
        return Err(AuthError::malformed("bad authorization string"));
    };

    if !scheme.eq_ignore_ascii_case(BEARER_SCHEME) {
        return Err(AuthError::BadScheme {
            scheme: scheme.to_string(),
        });
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(AuthError::TokenMissing);
    }
    Ok(token)
}

/// Sets `authorization: Bearer <token>` on an outgoing request.
///
/// # Errors
///
/// Returns `TokenMalformed` if the token cannot be carried as ASCII metadata.
pub fn add_token_md<T>(request: &mut Request<T>, token: &str) -> Result<(), AuthError> {
    let value: MetadataValue<Ascii> = format!("{BEARER_SCHEME} {token}")
        .parse()
        .map_err(|_| AuthError::malformed("token is not valid metadata"))?;
    request.metadata_mut().insert(AUTHORIZATION, value);
    Ok(())
}
