//! Identity payload and JWT claims.
//!
//! Field names on the wire match the tokens already issued by existing
//! services (`ID`, `ProjectID`, ... plus the registered `iss`/`aud`/`exp`/
//! `iat` claims), so tokens remain interchangeable.

use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize};

/// Identity carried inside a token.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payload {
    /// Subject (actor) identifier
    #[serde(rename = "ID", default)]
    pub id: String,
    /// Tenant or project identifier
    #[serde(rename = "ProjectID", default)]
    pub project_id: String,
    /// Display name
    #[serde(rename = "Names", default)]
    pub names: String,
    /// Phone number
    #[serde(rename = "PhoneNumber", default)]
    pub phone_number: String,
    /// Email address
    #[serde(rename = "EmailAddress", default)]
    pub email_address: String,
    /// Primary group label
    #[serde(rename = "Group", default)]
    pub group: String,
    /// Additional role labels
    #[serde(
        rename = "Roles",
        default,
        deserialize_with = "nullable_list",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub roles: Vec<String>,
}

impl Payload {
    /// Creates a payload for an actor in a group
    pub fn new(id: impl Into<String>, group: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            group: group.into(),
            ..Self::default()
        }
    }

    /// Sets the project id
    #[must_use]
    pub fn with_project_id(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = project_id.into();
        self
    }

    /// Sets the display name
    #[must_use]
    pub fn with_names(mut self, names: impl Into<String>) -> Self {
        self.names = names.into();
        self
    }

    /// Sets the email address
    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email_address = email.into();
        self
    }

    /// Sets the phone number
    #[must_use]
    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone_number = phone.into();
        self
    }

    /// Sets the role labels
    #[must_use]
    pub fn with_roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.roles = roles.into_iter().map(Into::into).collect();
        self
    }

    /// Primary group first, then roles; first match wins.
    pub fn in_any_group<S: AsRef<str>>(&self, allowed: &[S]) -> bool {
        let matches = |label: &str| allowed.iter().any(|g| g.as_ref() == label);
        matches(&self.group) || self.roles.iter().any(|role| matches(role))
    }
}

/// Payload plus the registered claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Identity claims
    #[serde(flatten)]
    pub payload: Payload,
    /// Issuer
    #[serde(default)]
    pub iss: String,
    /// Audience
    #[serde(default)]
    pub aud: String,
    /// Expiration (unix seconds); absent tokens never expire
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
    /// Issued at (unix seconds)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
}

impl Claims {
    /// Subject id
    pub fn subject(&self) -> &str {
        &self.payload.id
    }

    /// True once `exp` is in the past
    pub fn is_expired(&self) -> bool {
        let now = chrono::Utc::now().timestamp();
        self.exp.is_some_and(|exp| exp < now)
    }
}

/// Verified claims attached to a request after authentication.
///
/// Stored in the request extensions; keyed by type so nothing else can
/// collide with it.
#[derive(Debug, Clone)]
pub struct AuthContext(Arc<Claims>);

impl AuthContext {
    /// Wraps verified claims
    pub fn new(claims: Claims) -> Self {
        Self(Arc::new(claims))
    }

    /// The verified claims
    pub fn claims(&self) -> &Claims {
        &self.0
    }

    /// The verified identity
    pub fn payload(&self) -> &Payload {
        &self.0.payload
    }
}

fn nullable_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}
