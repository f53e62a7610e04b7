use serde::{Deserialize, Serialize};

use super::{require, DestroyOrder, EmptyName, ObjectMeta, Resource, Scope, ValidationError};

pub const VERBS: &[&str] = &["get", "list", "create", "update", "delete", "*"];

/// Grants `verbs` on `resources`, optionally narrowed to `resource_names`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    #[serde(default)]
    pub verbs: Vec<String>,
    #[serde(default)]
    pub resources: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resource_names: Vec<String>,
}

impl Rule {
    pub fn new(verbs: &[&str], resources: &[&str]) -> Self {
        Self {
            verbs: verbs.iter().map(|v| v.to_string()).collect(),
            resources: resources.iter().map(|r| r.to_string()).collect(),
            resource_names: Vec::new(),
        }
    }

    pub fn allows(&self, verb: &str, resource: &str, name: Option<&str>) -> bool {
        let matches = |set: &[String], value: &str| set.iter().any(|s| s == "*" || s == value);
        if !matches(&self.verbs, verb) || !matches(&self.resources, resource) {
            return false;
        }
        if self.resource_names.is_empty() {
            return true;
        }
        name.is_some_and(|name| matches(&self.resource_names, name))
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.verbs.is_empty() {
            return Err(ValidationError::new("rules.verbs", "must not be empty"));
        }
        if let Some(verb) = self.verbs.iter().find(|v| !VERBS.contains(&v.as_str())) {
            return Err(ValidationError::new("rules.verbs", format!("unknown verb {:?}", verb)));
        }
        if self.resources.is_empty() {
            return Err(ValidationError::new("rules.resources", "must not be empty"));
        }
        Ok(())
    }
}

fn validate_rules(rules: &[Rule]) -> Result<(), ValidationError> {
    if rules.is_empty() {
        return Err(ValidationError::new("rules", "at least one rule is required"));
    }
    rules.iter().try_for_each(Rule::validate)
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleRef {
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    /// `User` or `Group`
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
}

fn validate_subjects(subjects: &[Subject]) -> Result<(), ValidationError> {
    if subjects.is_empty() {
        return Err(ValidationError::new("subjects", "at least one subject is required"));
    }
    for subject in subjects {
        if !matches!(subject.kind.as_str(), "User" | "Group") {
            return Err(ValidationError::new("subjects", "type must be User or Group"));
        }
        require("subjects.name", &subject.name)?;
    }
    Ok(())
}

macro_rules! impl_meta {
    () => {
        fn meta(&self) -> &ObjectMeta {
            &self.meta
        }

        fn meta_mut(&mut self) -> &mut ObjectMeta {
            &mut self.meta
        }
    };
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    #[serde(rename = "metadata")]
    pub meta: ObjectMeta,
    #[serde(default)]
    pub rules: Vec<Rule>,
}

impl Resource for Role {
    const KIND: &'static str = "roles";
    const SCOPE: Scope = Scope::Namespaced;
    const DESTROY_ORDER: DestroyOrder = DestroyOrder::FetchFirst;
    const EMPTY_NAME: EmptyName = EmptyName::NotFound;

    impl_meta!();

    fn validate(&self) -> Result<(), ValidationError> {
        validate_rules(&self.rules)
    }

    fn apply_update(&mut self, delta: Self) {
        self.rules = delta.rules;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterRole {
    #[serde(rename = "metadata")]
    pub meta: ObjectMeta,
    #[serde(default)]
    pub rules: Vec<Rule>,
}

impl Resource for ClusterRole {
    const KIND: &'static str = "clusterroles";
    const SCOPE: Scope = Scope::Cluster;
    const DESTROY_ORDER: DestroyOrder = DestroyOrder::FetchFirst;
    const EMPTY_NAME: EmptyName = EmptyName::NotFound;

    impl_meta!();

    fn validate(&self) -> Result<(), ValidationError> {
        validate_rules(&self.rules)
    }

    fn apply_update(&mut self, delta: Self) {
        self.rules = delta.rules;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleBinding {
    #[serde(rename = "metadata")]
    pub meta: ObjectMeta,
    pub role_ref: RoleRef,
    #[serde(default)]
    pub subjects: Vec<Subject>,
}

impl Resource for RoleBinding {
    const KIND: &'static str = "rolebindings";
    const SCOPE: Scope = Scope::Namespaced;
    const DESTROY_ORDER: DestroyOrder = DestroyOrder::FetchFirst;
    const EMPTY_NAME: EmptyName = EmptyName::NotFound;

    impl_meta!();

    fn validate(&self) -> Result<(), ValidationError> {
        if !matches!(self.role_ref.kind.as_str(), "Role" | "ClusterRole") {
            return Err(ValidationError::new("role_ref", "type must be Role or ClusterRole"));
        }
        require("role_ref.name", &self.role_ref.name)?;
        validate_subjects(&self.subjects)
    }

    fn apply_update(&mut self, delta: Self) {
        self.subjects = delta.subjects;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterRoleBinding {
    #[serde(rename = "metadata")]
    pub meta: ObjectMeta,
    pub role_ref: RoleRef,
    #[serde(default)]
    pub subjects: Vec<Subject>,
}

impl Resource for ClusterRoleBinding {
    const KIND: &'static str = "clusterrolebindings";
    const SCOPE: Scope = Scope::Cluster;
    const DESTROY_ORDER: DestroyOrder = DestroyOrder::FetchFirst;
    const EMPTY_NAME: EmptyName = EmptyName::NotFound;

    impl_meta!();

    fn validate(&self) -> Result<(), ValidationError> {
        if self.role_ref.kind != "ClusterRole" {
            return Err(ValidationError::new("role_ref", "type must be ClusterRole"));
        }
        require("role_ref.name", &self.role_ref.name)?;
        validate_subjects(&self.subjects)
    }

    fn apply_update(&mut self, delta: Self) {
        self.subjects = delta.subjects;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rule_matching() {
        let rule = Rule::new(&["get", "list"], &["checks"]);
        assert!(rule.allows("get", "checks", Some("cpu")));
        assert!(rule.allows("list", "checks", None));
        assert!(!rule.allows("delete", "checks", Some("cpu")));
        assert!(!rule.allows("get", "entities", Some("web")));

        let wildcard = Rule::new(&["*"], &["*"]);
        assert!(wildcard.allows("delete", "namespaces", Some("prod")));
    }

    #[test]
    fn named_rules_only_match_their_names() {
        let mut rule = Rule::new(&["update"], &["users"]);
        rule.resource_names = vec!["alice".into()];
        assert!(rule.allows("update", "users", Some("alice")));
        assert!(!rule.allows("update", "users", Some("bob")));
        assert!(!rule.allows("update", "users", None));
    }

    #[test]
    fn role_validation() {
        let mut role = Role {
            meta: ObjectMeta::new("default", "read-only"),
            rules: vec![Rule::new(&["get"], &["checks"])],
        };
        assert!(role.validate().is_ok());
        role.rules[0].verbs = vec!["fly".into()];
        assert_eq!(role.validate().unwrap_err().field, "rules.verbs");
        role.rules.clear();
        assert_eq!(role.validate().unwrap_err().field, "rules");
    }

    #[test]
    fn binding_validation() {
        let binding = ClusterRoleBinding {
            meta: ObjectMeta::cluster("admins"),
            role_ref: RoleRef { kind: "Role".into(), name: "admin".into() },
            subjects: vec![Subject { kind: "Group".into(), name: "ops".into() }],
        };
        assert_eq!(binding.validate().unwrap_err().field, "role_ref");
    }
}
