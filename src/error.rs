//! Error handling module with type-safe, non-exhaustive error types
//!
//! Authentication failures surface as `Unauthenticated`, failed
//! authorization predicates as `PermissionDenied`, and signing problems as
//! `Internal`. Messages are sanitized before they reach a gRPC `Status` so
//! that neither the signing key nor token text leaks to callers.

use thiserror::Error;
use tonic::{Code, Status};

/// Sensitive patterns that should be sanitized from error messages
const SENSITIVE_PATTERNS: &[&str] = &[
    "password",
    "secret",
    "token",
    "key",
    "credential",
    "bearer",
    "authorization",
    "private",
];

/// Authentication and authorization errors
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No bearer token was present in the request metadata
    #[error("Bearer token missing from authorization metadata")]
    TokenMissing,

    /// The authorization metadata did not use the bearer scheme
    #[error("Authorization scheme {scheme} is not Bearer")]
    BadScheme {
        /// Scheme presented by the caller
        scheme: String,
    },

    /// Token signature verification failed
    #[error("Token signature invalid")]
    TokenInvalid,

    /// Token has expired
    #[error("Token expired")]
    TokenExpired,

    /// Token issuer or audience does not match this service
    #[error("Token not issued for this service: {claim} mismatch")]
    WrongRecipient {
        /// Claim that failed to match (`iss` or `aud`)
        claim: &'static str,
    },

    /// Token structure is malformed
    #[error("Token malformed: {reason}")]
    TokenMalformed {
        /// Description of the malformation
        reason: String,
    },

    /// An authorization predicate ran on a request that was never authenticated
    #[error("No claims found in request context")]
    NoClaims,

    /// Subject did not match the required actor
    #[error("Permission denied for actor with id {actor_id}")]
    ActorDenied {
        /// Subject id carried by the token
        actor_id: String,
    },

    /// Subject matched none of the allowed actors
    #[error("Permission denied for actors ids [{}]", .allowed.join(", "))]
    ActorsDenied {
        /// Actor ids that would have been accepted
        allowed: Vec<String>,
    },

    /// Neither the group nor any role matched the allowed groups
    #[error("Permission denied for group {group}, allowed [{}]", .allowed.join(", "))]
    GroupDenied {
        /// Primary group carried by the token
        group: String,
        /// Groups that would have been accepted
        allowed: Vec<String>,
    },

    /// Admin subject did not match the required admin id
    #[error("Permission denied for admin with id {admin_id}")]
    AdminDenied {
        /// Subject id carried by the token
        admin_id: String,
    },

    /// Token signing failed
    #[error("Failed to sign token: {reason}")]
    Signing {
        /// Sanitized signing failure
        reason: String,
    },

    /// Symmetric encryption or decryption failed
    #[error("Encryption error: {reason}")]
    Encryption {
        /// Description of the failure
        reason: String,
    },
}

/// Error codes for gRPC/API responses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Token absent or not presented as a bearer token
    TokenMissing,
    /// Signature did not verify
    TokenInvalid,
    /// Expiration time passed
    TokenExpired,
    /// Token could not be decoded, or was meant for another service
    TokenMalformed,
    /// Predicate evaluated without prior authentication
    NoClaims,
    /// Authorization predicate failed
    PermissionDenied,
    /// Signing or encryption failure
    Internal,
}

impl ErrorCode {
    /// Get the string representation of the error code
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TokenMissing => "AUTH_TOKEN_MISSING",
            Self::TokenInvalid => "AUTH_TOKEN_INVALID",
            Self::TokenExpired => "AUTH_TOKEN_EXPIRED",
            Self::TokenMalformed => "AUTH_TOKEN_MALFORMED",
            Self::NoClaims => "AUTH_NO_CLAIMS",
            Self::PermissionDenied => "AUTH_PERMISSION_DENIED",
            Self::Internal => "INTERNAL_ERROR",
        }
    }

    /// Get the gRPC status code for this error
    pub fn grpc_code(&self) -> Code {
        match self {
            Self::TokenMissing
            | Self::TokenInvalid
            | Self::TokenExpired
            | Self::TokenMalformed
            | Self::NoClaims => Code::Unauthenticated,
            Self::PermissionDenied => Code::PermissionDenied,
            Self::Internal => Code::Internal,
        }
    }
}

impl AuthError {
    /// Get the error code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::TokenMissing | Self::BadScheme { .. } => ErrorCode::TokenMissing,
            Self::TokenInvalid => ErrorCode::TokenInvalid,
            Self::TokenExpired => ErrorCode::TokenExpired,
            Self::WrongRecipient { .. } | Self::TokenMalformed { .. } => ErrorCode::TokenMalformed,
            Self::NoClaims => ErrorCode::NoClaims,
            Self::ActorDenied { .. }
            | Self::ActorsDenied { .. }
            | Self::GroupDenied { .. }
            | Self::AdminDenied { .. } => ErrorCode::PermissionDenied,
            Self::Signing { .. } | Self::Encryption { .. } => ErrorCode::Internal,
        }
    }

    /// True when no usable identity was established
    pub fn is_unauthenticated(&self) -> bool {
        self.code().grpc_code() == Code::Unauthenticated
    }

    /// True when an identity was established but failed a predicate
    pub fn is_permission_denied(&self) -> bool {
        self.code() == ErrorCode::PermissionDenied
    }

    /// Convert to gRPC Status
    pub fn to_status(&self) -> Status {
        let message = match self {
            Self::TokenMalformed { reason } => {
                format!("invalid auth token: {}", sanitize_message(reason))
            }
            // Never expose internal error details
            Self::Signing { .. } | Self::Encryption { .. } => "Internal error".to_string(),
            other => other.to_string(),
        };
        Status::new(self.code().grpc_code(), message)
    }

    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Self::TokenMalformed {
            reason: reason.into(),
        }
    }

    pub(crate) fn encryption(reason: impl Into<String>) -> Self {
        Self::Encryption {
            reason: reason.into(),
        }
    }
}

impl From<AuthError> for Status {
    fn from(err: AuthError) -> Self {
        err.to_status()
    }
}

/// Sanitize a message by removing sensitive information
fn sanitize_message(message: &str) -> String {
    if contains_sensitive_info(message) {
        return "Invalid token format".to_string();
    }
    message.to_string()
}

/// Check if a string contains sensitive information
pub fn contains_sensitive_info(text: &str) -> bool {
    let lower = text.to_lowercase();
    SENSITIVE_PATTERNS.iter().any(|p| lower.contains(p))
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            ErrorKind::InvalidSignature => AuthError::TokenInvalid,
            ErrorKind::InvalidIssuer => AuthError::WrongRecipient { claim: "iss" },
            ErrorKind::InvalidAudience => AuthError::WrongRecipient { claim: "aud" },
            ErrorKind::InvalidToken
            | ErrorKind::InvalidAlgorithm
            | ErrorKind::InvalidAlgorithmName
            | ErrorKind::MissingAlgorithm
            | ErrorKind::Base64(_)
            | ErrorKind::Json(_)
            | ErrorKind::Utf8(_) => AuthError::malformed(sanitize_message(&err.to_string())),
            ErrorKind::MissingRequiredClaim(claim) => {
                AuthError::malformed(format!("missing required claim {claim}"))
            }
            _ => AuthError::malformed("Token validation failed"),
        }
    }
}
