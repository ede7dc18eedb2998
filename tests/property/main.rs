//! Property-Based Tests
//!
//! Uses proptest for invariant verification.
//!
//! Test categories:
//! - tokens: issue/verify agreement, key and expiry enforcement
//! - authorization: predicate semantics over arbitrary identities

mod generators;
mod tokens;
