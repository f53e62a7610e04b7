use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{DestroyOrder, EmptyName, ObjectMeta, Resource, Scope, ValidationError};

/// Downloadable runtime dependency for checks, handlers, and mutators
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    #[serde(rename = "metadata")]
    pub meta: ObjectMeta,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub sha512: String,
    #[serde(default)]
    pub filters: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
}

impl Asset {
    pub fn fixture(namespace: &str, name: &str) -> Self {
        Self {
            meta: ObjectMeta::new(namespace, name),
            url: format!("https://assets.example.com/{}.tar.gz", name),
            sha512: "a".repeat(128),
            ..Default::default()
        }
    }
}

impl Resource for Asset {
    const KIND: &'static str = "assets";
    const SCOPE: Scope = Scope::Namespaced;
    const DESTROY_ORDER: DestroyOrder = DestroyOrder::FetchFirst;
    const EMPTY_NAME: EmptyName = EmptyName::InvalidArgument;

    fn meta(&self) -> &ObjectMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut ObjectMeta {
        &mut self.meta
    }

    fn validate(&self) -> Result<(), ValidationError> {
        let parsed = url::Url::parse(&self.url)
            .map_err(|e| ValidationError::new("url", e.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ValidationError::new("url", "scheme must be http or https"));
        }
        if self.sha512.len() != 128 || !self.sha512.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ValidationError::new("sha512", "must be 128 hexadecimal characters"));
        }
        Ok(())
    }

    fn apply_update(&mut self, delta: Self) {
        self.url = delta.url;
        self.sha512 = delta.sha512;
        self.filters = delta.filters;
        self.headers = delta.headers;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_and_digest() {
        let mut asset = Asset::fixture("default", "ruby");
        assert!(asset.validate().is_ok());

        asset.url = "ftp://example.com/x".into();
        assert_eq!(asset.validate().unwrap_err().field, "url");

        asset.url = "https://example.com/x".into();
        asset.sha512 = "abc".into();
        assert_eq!(asset.validate().unwrap_err().field, "sha512");
    }
}
