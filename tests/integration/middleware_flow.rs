//! Gateway stack: request logging, cookie translation and interception.

use std::sync::Arc;

use chrono::{Duration, Utc};
use http::header::{AUTHORIZATION, COOKIE};
use service_auth::auth::AuthOptions;
use service_auth::encryption::Cipher;
use service_auth::middleware::{AuthInterceptor, CookieAuthLayer, RequestLogLayer};
use service_auth::{AuthApi, JwtAuthApi, Payload};
use tonic::service::Interceptor;
use tonic::{Code, Status};
use tower::{service_fn, ServiceBuilder, ServiceExt};

const COOKIE_KEY: &[u8] = b"0123456789abcdef0123456789abcdef";

fn api() -> Arc<JwtAuthApi> {
    Arc::new(
        JwtAuthApi::new(AuthOptions::new(b"gateway-key".to_vec(), "svc", "svc-clients")).unwrap(),
    )
}

/// Runs `req` through the stack; the handler returns the authenticated subject.
async fn call_stack(api: Arc<JwtAuthApi>, req: http::Request<()>) -> Result<String, Status> {
    let interceptor = AuthInterceptor::new(api.clone());
    let handler = service_fn(move |req: http::Request<()>| {
        let mut interceptor = interceptor.clone();
        let api = api.clone();
        async move {
            let request = interceptor.call(tonic::Request::from_http(req))?;
            let payload = api.get_jwt_payload(request.extensions())?;
            Ok::<_, Status>(payload.id)
        }
    });

    ServiceBuilder::new()
        .layer(RequestLogLayer::new("gateway-test"))
        .layer(CookieAuthLayer::new(
            "session",
            Cipher::new(COOKIE_KEY).unwrap(),
        ))
        .service(handler)
        .oneshot(req)
        .await
}

fn session_cookie(token: &str) -> String {
    let layer = CookieAuthLayer::new("session", Cipher::new(COOKIE_KEY).unwrap());
    format!("lang=en; session={}", layer.encode_token(token).unwrap())
}

#[tokio::test]
async fn session_cookie_authenticates() {
    let api = api();
    let token = api
        .issue_token(&Payload::new("browser-user", "USER"), Utc::now() + Duration::hours(1))
        .unwrap();

    let req = http::Request::builder()
        .header(COOKIE, session_cookie(&token))
        .body(())
        .unwrap();

    assert_eq!(call_stack(api, req).await.unwrap(), "browser-user");
}

#[tokio::test]
async fn authorization_header_takes_precedence() {
    let api = api();
    let header_token = api
        .issue_token(&Payload::new("header-user", "USER"), Utc::now() + Duration::hours(1))
        .unwrap();
    let cookie_token = api
        .issue_token(&Payload::new("cookie-user", "USER"), Utc::now() + Duration::hours(1))
        .unwrap();

    let req = http::Request::builder()
        .header(AUTHORIZATION, format!("Bearer {header_token}"))
        .header(COOKIE, session_cookie(&cookie_token))
        .body(())
        .unwrap();

    assert_eq!(call_stack(api, req).await.unwrap(), "header-user");
}

#[tokio::test]
async fn missing_credentials_are_rejected() {
    let req = http::Request::builder()
        .header(COOKIE, "lang=en")
        .body(())
        .unwrap();

    let status = call_stack(api(), req).await.unwrap_err();
    assert_eq!(status.code(), Code::Unauthenticated);
}

#[tokio::test]
async fn tampered_cookie_is_rejected() {
    let req = http::Request::builder()
        .header(COOKIE, "session=AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA")
        .body(())
        .unwrap();

    let status = call_stack(api(), req).await.unwrap_err();
    assert_eq!(status.code(), Code::Unauthenticated);
}
