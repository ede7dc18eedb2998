//! Token issue/verify properties.

use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;
use service_auth::{AuthApi, AuthError};
use tonic::Code;

use crate::generators::{api_with_key, arb_key, arb_payload};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Verifying an issued token yields the identity it was issued for.
    #[test]
    fn prop_issue_verify_round_trip(key in arb_key(), payload in arb_payload(), ttl in 60i64..86_400) {
        let api = api_with_key(&key);
        let token = api.issue_token(&payload, Utc::now() + Duration::seconds(ttl)).unwrap();

        let claims = api.verify_token(&token).unwrap();
        prop_assert_eq!(&claims.payload, &payload);
        prop_assert_eq!(claims.iss.as_str(), "svc");
        prop_assert_eq!(claims.aud.as_str(), "svc-clients");
        prop_assert!(!claims.is_expired());
    }

    /// Tokens signed with another key never verify.
    #[test]
    fn prop_foreign_key_rejected(k1 in arb_key(), k2 in arb_key(), payload in arb_payload()) {
        prop_assume!(k1 != k2);
        let token = api_with_key(&k1)
            .issue_token(&payload, Utc::now() + Duration::hours(1))
            .unwrap();

        let err = api_with_key(&k2).verify_token(&token).unwrap_err();
        prop_assert_eq!(&err, &AuthError::TokenInvalid);
        prop_assert_eq!(err.to_status().code(), Code::Unauthenticated);
    }

    /// Tokens past their expiry never verify.
    #[test]
    fn prop_expired_rejected(key in arb_key(), payload in arb_payload(), age in 1i64..1_000_000) {
        let api = api_with_key(&key);
        let token = api.issue_token(&payload, Utc::now() - Duration::seconds(age)).unwrap();

        let err = api.verify_token(&token).unwrap_err();
        prop_assert_eq!(&err, &AuthError::TokenExpired);
        prop_assert!(err.is_unauthenticated());
    }

    /// Expiries before the unix epoch are expired too.
    #[test]
    fn prop_pre_epoch_expiry_rejected(key in arb_key(), payload in arb_payload(), age in 1i64..10_000_000_000) {
        let api = api_with_key(&key);
        let expires_at = Utc.timestamp_opt(-age, 0).unwrap();
        let token = api.issue_token(&payload, expires_at).unwrap();

        let mut request = tonic::Request::new(());
        service_auth::auth::add_token_md(&mut request, &token).unwrap();
        let err = api.authenticate(request.metadata()).unwrap_err();
        prop_assert_eq!(&err, &AuthError::TokenExpired);
        prop_assert_eq!(err.to_status().code(), Code::Unauthenticated);
    }

    /// Any edit to the signed part invalidates the token.
    #[test]
    fn prop_tampered_payload_rejected(key in arb_key(), payload in arb_payload()) {
        let api = api_with_key(&key);
        let token = api.issue_token(&payload, Utc::now() + Duration::hours(1)).unwrap();

        let forged = api
            .issue_token(&payload.clone().with_roles(["SUPER_ADMIN"]), Utc::now() + Duration::hours(1))
            .unwrap();
        let mut parts: Vec<&str> = token.split('.').collect();
        let forged_body = forged.split('.').nth(1).unwrap();
        prop_assume!(parts[1] != forged_body);
        parts[1] = forged_body;

        prop_assert!(api.verify_token(&parts.join(".")).is_err());
    }

    /// Arbitrary strings are rejected as unauthenticated.
    #[test]
    fn prop_garbage_rejected(token in "[A-Za-z0-9._-]{0,64}") {
        let err = api_with_key(b"0123456789abcdef").verify_token(&token).unwrap_err();
        prop_assert!(err.is_unauthenticated());
    }
}
