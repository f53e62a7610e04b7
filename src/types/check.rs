use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{require, DestroyOrder, EmptyName, ObjectMeta, Resource, Scope, ValidationError};

/// Hooks to run for a given check status ("0", "critical", "non-zero", ...)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HookList {
    pub status: String,
    #[serde(default)]
    pub hooks: Vec<String>,
}

/// Scheduled check definition
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckConfig {
    #[serde(rename = "metadata")]
    pub meta: ObjectMeta,
    #[serde(default)]
    pub command: String,
    #[serde(default)]
    pub handlers: Vec<String>,
    /// Seconds between executions; mutually exclusive with `cron`
    #[serde(default)]
    pub interval: u32,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub cron: String,
    #[serde(default)]
    pub publish: bool,
    #[serde(default)]
    pub subscriptions: Vec<String>,
    #[serde(default)]
    pub timeout: u32,
    #[serde(default)]
    pub ttl: i64,
    #[serde(default)]
    pub stdin: bool,
    #[serde(default)]
    pub round_robin: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub proxy_entity_name: String,
    #[serde(default)]
    pub runtime_assets: Vec<String>,
    #[serde(default)]
    pub check_hooks: Vec<HookList>,
    #[serde(default)]
    pub high_flap_threshold: u32,
    #[serde(default)]
    pub low_flap_threshold: u32,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub output_metric_format: String,
    #[serde(default)]
    pub output_metric_handlers: Vec<String>,
    #[serde(default)]
    pub env_vars: Vec<String>,
}

const METRIC_FORMATS: &[&str] = &[
    "nagios_perfdata",
    "graphite_plaintext",
    "influxdb_line",
    "opentsdb_line",
    "prometheus_text",
];

impl CheckConfig {
    pub fn fixture(namespace: &str, name: &str) -> Self {
        Self {
            meta: ObjectMeta::new(namespace, name),
            command: "true".into(),
            interval: 60,
            publish: true,
            subscriptions: vec!["linux".into()],
            ..Default::default()
        }
    }
}

impl Resource for CheckConfig {
    const KIND: &'static str = "checks";
    const SCOPE: Scope = Scope::Namespaced;
    const DESTROY_ORDER: DestroyOrder = DestroyOrder::AuthorizeFirst;
    const EMPTY_NAME: EmptyName = EmptyName::NotFound;

    fn meta(&self) -> &ObjectMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut ObjectMeta {
        &mut self.meta
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require("command", &self.command)?;

        match (self.interval > 0, !self.cron.is_empty()) {
            (true, true) => {
                return Err(ValidationError::new(
                    "interval",
                    "must only specify either an interval or a cron schedule",
                ))
            }
            (false, false) => {
                return Err(ValidationError::new(
                    "interval",
                    "must specify either an interval or a cron schedule",
                ))
            }
            _ => {}
        }
        if !self.cron.is_empty() && self.cron.split_whitespace().count() < 5 {
            return Err(ValidationError::new("cron", "invalid cron schedule"));
        }

        if self.ttl > 0 && self.interval > 0 && self.ttl <= i64::from(self.interval) {
            return Err(ValidationError::new("ttl", "must be greater than the check interval"));
        }
        if self.low_flap_threshold > self.high_flap_threshold {
            return Err(ValidationError::new(
                "low_flap_threshold",
                "must be lower than high_flap_threshold",
            ));
        }
        if !self.output_metric_format.is_empty()
            && !METRIC_FORMATS.contains(&self.output_metric_format.as_str())
        {
            return Err(ValidationError::new(
                "output_metric_format",
                format!("unknown format {:?}", self.output_metric_format),
            ));
        }
        for hooks in &self.check_hooks {
            require("check_hooks.status", &hooks.status)?;
        }
        Ok(())
    }

    fn apply_update(&mut self, delta: Self) {
        self.command = delta.command;
        self.handlers = delta.handlers;
        self.interval = delta.interval;
        self.cron = delta.cron;
        self.publish = delta.publish;
        self.subscriptions = delta.subscriptions;
        self.timeout = delta.timeout;
        self.ttl = delta.ttl;
        self.stdin = delta.stdin;
        self.round_robin = delta.round_robin;
        self.proxy_entity_name = delta.proxy_entity_name;
        self.runtime_assets = delta.runtime_assets;
        self.check_hooks = delta.check_hooks;
        self.high_flap_threshold = delta.high_flap_threshold;
        self.low_flap_threshold = delta.low_flap_threshold;
        self.output_metric_format = delta.output_metric_format;
        self.output_metric_handlers = delta.output_metric_handlers;
        self.env_vars = delta.env_vars;
    }
}

/// Result of one check execution, embedded in events
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckStatus {
    #[serde(rename = "metadata")]
    pub meta: ObjectMeta,
    #[serde(default)]
    pub command: String,
    #[serde(default)]
    pub status: u32,
    #[serde(default)]
    pub output: String,
    #[serde(default)]
    pub executed: i64,
    #[serde(default)]
    pub issued: i64,
    #[serde(default)]
    pub duration: f64,
    #[serde(default)]
    pub handlers: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, serde_json::Value>,
}
