//! Integration Tests
//!
//! End-to-end flows across configuration, token issuance, interception and
//! authorization, without a network listener.

mod auth_flow;
mod middleware_flow;
