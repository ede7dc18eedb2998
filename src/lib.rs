//! Service Auth - JWT authentication and claims-based authorization.
//!
//! This crate provides the authorization layer shared by gRPC services,
//! including bearer token verification, actor/group authorization
//! predicates, token issuance, and the tonic/tower middleware that wires
//! them into a server.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod auth;
pub mod config;
pub mod encryption;
pub mod error;
pub mod middleware;
#[cfg(any(test, feature = "mocks"))]
pub mod mocks;
pub mod observability;
pub mod status;

pub use crate::auth::{AuthApi, AuthContext, AuthOptions, Claims, JwtAuthApi, Payload};
pub use crate::config::AuthConfig;
pub use crate::error::{AuthError, ErrorCode};
