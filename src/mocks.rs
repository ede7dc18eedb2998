//! [`AuthApi`] mocks for tests of downstream services.
//!
//! [`MockAuthApi`] is generated by `mockall` and can be programmed per test,
//! including denials. [`permissive_auth_api`] returns one preloaded to
//! approve every call as a fixed admin identity.

use chrono::Utc;
use rand::Rng;
use uuid::Uuid;

pub use crate::auth::MockAuthApi;
use crate::auth::{default_admin_groups, Claims, Payload, DEFAULT_ADMIN_GROUP};

/// Token returned by the permissive mock's `issue_token`
pub const STATIC_TOKEN: &str = "token";

/// Generated admin identity in project `test`
pub fn mock_payload() -> Payload {
    let tag = Uuid::new_v4().simple().to_string();
    let id = rand::thread_rng().gen_range(1..=10u32);
    Payload::new(id.to_string(), DEFAULT_ADMIN_GROUP)
        .with_project_id("test")
        .with_names(format!("user-{}", &tag[..8]))
        .with_email(format!("{}@example.com", &tag[..12]))
}

/// Mock approving every call as [`mock_payload`].
pub fn permissive_auth_api() -> MockAuthApi {
    permissive_auth_api_with(mock_payload())
}

/// Mock approving every call as `payload`.
///
/// Expectations can still be added on top; mockall matches the earliest
/// matching expectation, so program denials on a fresh [`MockAuthApi`].
pub fn permissive_auth_api_with(payload: Payload) -> MockAuthApi {
    let claims = Claims {
        payload: payload.clone(),
        iss: "test".to_string(),
        aud: "test".to_string(),
        exp: None,
        iat: Some(Utc::now().timestamp()),
    };

    let mut api = MockAuthApi::new();

    let c = claims.clone();
    api.expect_authenticate().returning(move |_| Ok(c.clone()));
    let p = payload.clone();
    api.expect_authenticate_request()
        .returning(move |_| Ok(p.clone()));
    let c = claims;
    api.expect_get_claims().returning(move |_| Ok(c.clone()));
    let p = payload.clone();
    api.expect_get_jwt_payload().returning(move |_| Ok(p.clone()));
    let p = payload.clone();
    api.expect_authorize_group()
        .returning(move |_, _| Ok(p.clone()));
    let p = payload.clone();
    api.expect_authorize_actor()
        .returning(move |_, _| Ok(p.clone()));
    let p = payload.clone();
    api.expect_authorize_actors()
        .returning(move |_, _| Ok(p.clone()));
    let p = payload.clone();
    api.expect_authorize_actor_and_group()
        .returning(move |_, _, _| Ok(p.clone()));
    let p = payload.clone();
    api.expect_authorize_actor_or_group()
        .returning(move |_, _, _| Ok(p.clone()));
    let p = payload.clone();
    api.expect_authorize_admin().returning(move |_| Ok(p.clone()));
    let p = payload;
    api.expect_authorize_admin_strict()
        .returning(move |_, _| Ok(p.clone()));

    api.expect_admin_groups().returning(default_admin_groups);
    api.expect_add_admin_groups().return_const(());
    api.expect_is_admin().return_const(true);
    api.expect_issue_token()
        .returning(|_, _| Ok(STATIC_TOKEN.to_string()));
    api
}
