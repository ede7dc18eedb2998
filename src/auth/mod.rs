//! Bearer token authentication and claims-based authorization.

pub mod api;
pub mod claims;
pub mod metadata;

pub use api::{
    default_admin_groups, AuthApi, AuthOptions, JwtAuthApi, DEFAULT_ADMIN_GROUP,
    DEFAULT_SUPER_ADMIN_GROUP, DEFAULT_USER_GROUP,
};
#[cfg(any(test, feature = "mocks"))]
pub use api::MockAuthApi;
pub use claims::{AuthContext, Claims, Payload};
pub use metadata::{add_token_md, bearer_token, parse_bearer, AUTHORIZATION, BEARER_SCHEME};
