//! Issue, authenticate and authorize through the public API.

use std::sync::Arc;

use chrono::{Duration, Utc};
use service_auth::auth::{add_token_md, AuthOptions};
use service_auth::middleware::AuthInterceptor;
use service_auth::{AuthApi, AuthError, JwtAuthApi, Payload};
use tonic::service::Interceptor;
use tonic::{Code, Request};

fn service_api() -> Arc<JwtAuthApi> {
    Arc::new(JwtAuthApi::new(AuthOptions::new(b"K".to_vec(), "svc", "svc-clients")).unwrap())
}

/// Runs `token` through the interceptor and returns the authenticated request.
fn intercept(api: &Arc<JwtAuthApi>, token: &str) -> Result<Request<()>, tonic::Status> {
    let mut request = Request::new(());
    add_token_md(&mut request, token).unwrap();
    AuthInterceptor::new(api.clone()).call(request)
}

#[test]
fn admin_token_passes_admin_check_but_not_foreign_actor() {
    let api = service_api();
    let token = api
        .issue_token(&Payload::new("42", "ADMIN"), Utc::now() + Duration::hours(1))
        .unwrap();

    let request = intercept(&api, &token).unwrap();
    let ext = request.extensions();

    let payload = api.authorize_admin(ext).unwrap();
    assert_eq!(payload.id, "42");

    let denied = api.authorize_actor(ext, "43").unwrap_err();
    assert_eq!(
        denied,
        AuthError::ActorDenied {
            actor_id: "42".to_string()
        }
    );
    assert_eq!(denied.to_status().code(), Code::PermissionDenied);
}

#[test]
fn payload_fields_survive_the_round_trip() {
    let api = service_api();
    let payload = Payload::new("u-1", "USER")
        .with_project_id("acme")
        .with_names("Jane Doe")
        .with_phone("+254700000000")
        .with_email("jane@acme.io")
        .with_roles(["BILLING", "SUPPORT"]);
    let token = api
        .issue_token(&payload, Utc::now() + Duration::minutes(10))
        .unwrap();

    let request = intercept(&api, &token).unwrap();
    assert_eq!(api.get_jwt_payload(request.extensions()).unwrap(), payload);
    assert!(api
        .authorize_group(request.extensions(), &["SUPPORT"])
        .is_ok());
}

#[test]
fn token_from_another_issuer_is_unauthenticated() {
    let api = service_api();
    let other = JwtAuthApi::new(AuthOptions::new(b"K".to_vec(), "other", "svc-clients")).unwrap();
    let token = other
        .issue_token(&Payload::new("42", "ADMIN"), Utc::now() + Duration::hours(1))
        .unwrap();

    let status = intercept(&api, &token).unwrap_err();
    assert_eq!(status.code(), Code::Unauthenticated);
}

#[test]
fn expired_token_is_unauthenticated() {
    let api = service_api();
    let token = api
        .issue_token(&Payload::new("42", "ADMIN"), Utc::now() - Duration::seconds(5))
        .unwrap();

    assert_eq!(
        api.verify_token(&token).unwrap_err(),
        AuthError::TokenExpired
    );
    assert_eq!(
        intercept(&api, &token).unwrap_err().code(),
        Code::Unauthenticated
    );
}

#[test]
fn predicates_without_interception_report_no_claims() {
    let api = service_api();
    let request = Request::new(());
    let err = api.authorize_group(request.extensions(), &["USER"]).unwrap_err();
    assert_eq!(err, AuthError::NoClaims);
    assert_eq!(err.to_status().code(), Code::Unauthenticated);
}

#[test]
fn admin_groups_can_grow_at_runtime() {
    let api = service_api();
    let token = api
        .issue_token(&Payload::new("7", "OPS"), Utc::now() + Duration::hours(1))
        .unwrap();
    let request = intercept(&api, &token).unwrap();

    assert!(api.authorize_admin(request.extensions()).is_err());
    api.add_admin_groups(&["OPS"]);
    assert!(api.authorize_admin(request.extensions()).is_ok());
    assert!(api.authorize_admin_strict(request.extensions(), "7").is_ok());
}

#[test]
fn add_md_issues_a_usable_token() {
    let api = service_api();
    let mut request = Request::new(());
    api.add_md(&mut request, "svc-account", "USER").unwrap();

    let request = AuthInterceptor::new(api.clone()).call(request).unwrap();
    let claims = api.get_claims(request.extensions()).unwrap();
    assert_eq!(claims.subject(), "svc-account");
    assert!(claims.exp.is_none());
    assert!(!claims.payload.email_address.is_empty());
}
