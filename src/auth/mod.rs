use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::Rule;

/// A rule bound to one namespace. An empty namespace grants the rule in every
/// namespace and on cluster-scoped kinds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopedRule {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub namespace: String,
    #[serde(flatten)]
    pub rule: Rule,
}

impl ScopedRule {
    pub fn cluster(rule: Rule) -> Self {
        Self {
            namespace: String::new(),
            rule,
        }
    }

    pub fn namespaced(namespace: &str, rule: Rule) -> Self {
        Self {
            namespace: namespace.to_string(),
            rule,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(default)]
    pub groups: Vec<String>,
    #[serde(default)]
    pub rules: Vec<ScopedRule>,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(sub: impl Into<String>, groups: Vec<String>, rules: Vec<ScopedRule>, expiry_hours: u64) -> Self {
        let now = Utc::now();
        let exp = (now + Duration::hours(expiry_hours as i64)).timestamp();

        Self {
            sub: sub.into(),
            groups,
            rules,
            exp,
            iat: now.timestamp(),
        }
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing Authorization header")]
    MissingHeader,

    #[error("Authorization header must use Bearer token format")]
    BadScheme,

    #[error("JWT secret not configured")]
    InvalidSecret,

    #[error("Invalid JWT token: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),
}

pub fn generate_jwt(claims: &Claims, secret: &str) -> Result<String, AuthError> {
    if secret.is_empty() {
        return Err(AuthError::InvalidSecret);
    }
    let encoding_key = EncodingKey::from_secret(secret.as_bytes());
    Ok(encode(&Header::default(), claims, &encoding_key)?)
}

pub fn validate_jwt(token: &str, secret: &str) -> Result<Claims, AuthError> {
    if secret.is_empty() {
        return Err(AuthError::InvalidSecret);
    }
    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    let token_data = decode::<Claims>(token, &decoding_key, &Validation::default())?;
    Ok(token_data.claims)
}

/// The caller of one request, as seen by the capability predicates
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Viewer {
    pub username: String,
    pub groups: Vec<String>,
    pub rules: Vec<ScopedRule>,
}

impl Viewer {
    pub fn new(username: impl Into<String>, rules: Vec<ScopedRule>) -> Self {
        Self {
            username: username.into(),
            groups: Vec::new(),
            rules,
        }
    }

    /// Unrestricted viewer used when authentication is disabled and for boot-time seeding
    pub fn cluster_admin(username: impl Into<String>) -> Self {
        Self::new(username, vec![ScopedRule::cluster(Rule::new(&["*"], &["*"]))])
    }

    /// Whether any rule grants `verb` on `kind` in `namespace`.
    /// Pass an empty namespace for cluster-scoped kinds.
    pub fn allows(&self, verb: &str, kind: &str, namespace: &str, name: Option<&str>) -> bool {
        self.rules.iter().any(|scoped| {
            (scoped.namespace.is_empty() || scoped.namespace == namespace)
                && scoped.rule.allows(verb, kind, name)
        })
    }
}

impl From<Claims> for Viewer {
    fn from(claims: Claims) -> Self {
        Self {
            username: claims.sub,
            groups: claims.groups,
            rules: claims.rules,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_round_trip() {
        let rules = vec![ScopedRule::namespaced("default", Rule::new(&["get"], &["checks"]))];
        let claims = Claims::new("alice", vec!["ops".into()], rules.clone(), 1);
        let token = generate_jwt(&claims, "s3cret").unwrap();

        let decoded = validate_jwt(&token, "s3cret").unwrap();
        assert_eq!(decoded.sub, "alice");
        assert_eq!(decoded.rules, rules);

        assert!(matches!(validate_jwt(&token, "other"), Err(AuthError::InvalidToken(_))));
        assert!(matches!(generate_jwt(&claims, ""), Err(AuthError::InvalidSecret)));
    }

    #[test]
    fn namespaced_rules_stay_in_their_namespace() {
        let viewer = Viewer::new(
            "alice",
            vec![ScopedRule::namespaced("default", Rule::new(&["get"], &["checks"]))],
        );
        assert!(viewer.allows("get", "checks", "default", Some("cpu")));
        assert!(!viewer.allows("get", "checks", "prod", Some("cpu")));
        assert!(!viewer.allows("get", "namespaces", "", Some("default")));
    }

    #[test]
    fn cluster_admin_can_do_anything() {
        let admin = Viewer::cluster_admin("root");
        assert!(admin.allows("delete", "users", "", Some("bob")));
        assert!(admin.allows("create", "checks", "prod", None));
    }
}
