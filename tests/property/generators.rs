//! Proptest Generators
//!
//! Shared generators for property-based tests.

use proptest::prelude::*;
use service_auth::auth::AuthOptions;
use service_auth::{JwtAuthApi, Payload};

/// Actor identifiers
pub fn arb_actor_id() -> impl Strategy<Value = String> {
    "[a-z0-9]{1,12}"
}

/// Group and role labels
pub fn arb_group() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("USER".to_string()),
        Just("ADMIN".to_string()),
        Just("SUPER_ADMIN".to_string()),
        "[A-Z_]{3,10}",
    ]
}

/// Small sets of group labels
pub fn arb_groups() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(arb_group(), 0..4)
}

/// Arbitrary identities
pub fn arb_payload() -> impl Strategy<Value = Payload> {
    (
        arb_actor_id(),
        "[a-z0-9-]{0,10}",
        "[A-Za-z ]{0,20}",
        "[0-9+]{0,12}",
        "[a-z]{0,8}@[a-z]{1,8}\\.com",
        arb_group(),
        arb_groups(),
    )
        .prop_map(|(id, project, names, phone, email, group, roles)| {
            Payload::new(id, group)
                .with_project_id(project)
                .with_names(names)
                .with_phone(phone)
                .with_email(email)
                .with_roles(roles)
        })
}

/// Signing keys
pub fn arb_key() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 16..48)
}

/// API keyed with `key` for issuer `svc` and audience `svc-clients`
pub fn api_with_key(key: &[u8]) -> JwtAuthApi {
    JwtAuthApi::new(AuthOptions::new(key.to_vec(), "svc", "svc-clients")).unwrap()
}
