use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::{DestroyOrder, EmptyName, ObjectMeta, Resource, Scope, ValidationError};

pub const MIN_PASSWORD_LENGTH: usize = 8;

/// API user. The plaintext password is accepted on input only; what is stored
/// is a digest, and neither ever appears in a response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "metadata")]
    pub meta: ObjectMeta,
    #[serde(default, skip_serializing)]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub password_hash: String,
    #[serde(default)]
    pub groups: Vec<String>,
    #[serde(default)]
    pub disabled: bool,
}

impl User {
    pub fn fixture(name: &str) -> Self {
        Self {
            meta: ObjectMeta::cluster(name),
            password: Some("P@ssw0rd!".into()),
            groups: vec!["ops".into()],
            ..Default::default()
        }
    }

    pub fn hash_password(username: &str, password: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(username.as_bytes());
        hasher.update(b":");
        hasher.update(password.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    pub fn verify_password(&self, password: &str) -> bool {
        !self.password_hash.is_empty()
            && self.password_hash == User::hash_password(&self.meta.name, password)
    }

    pub fn validate_password(password: &str) -> Result<(), ValidationError> {
        if password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(ValidationError::new(
                "password",
                format!("must be at least {} characters", MIN_PASSWORD_LENGTH),
            ));
        }
        Ok(())
    }
}

impl Resource for User {
    const KIND: &'static str = "users";
    const SCOPE: Scope = Scope::Cluster;
    const DESTROY_ORDER: DestroyOrder = DestroyOrder::FetchFirst;
    const EMPTY_NAME: EmptyName = EmptyName::InvalidArgument;

    fn meta(&self) -> &ObjectMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut ObjectMeta {
        &mut self.meta
    }

    // A digest is only ever computed here; one supplied in a body is dropped
    fn normalize(&mut self) {
        self.password_hash.clear();
    }

    fn validate(&self) -> Result<(), ValidationError> {
        match &self.password {
            Some(password) => User::validate_password(password),
            None if self.password_hash.is_empty() => {
                Err(ValidationError::new("password", "must not be empty"))
            }
            None => Ok(()),
        }
    }

    fn prepare(&mut self) -> Result<(), ValidationError> {
        if let Some(password) = self.password.take() {
            self.password_hash = User::hash_password(&self.meta.name, &password);
        }
        Ok(())
    }

    fn redacted(mut self) -> Self {
        self.password = None;
        self.password_hash.clear();
        self
    }

    fn apply_update(&mut self, delta: Self) {
        self.groups = delta.groups;
        self.disabled = delta.disabled;
    }
}
