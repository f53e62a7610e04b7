#![allow(dead_code)]

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde_json::Value;

use monitor_api::auth::{generate_jwt, Claims, ScopedRule};
use monitor_api::config::AppConfig;
use monitor_api::store::MemoryStore;
use monitor_api::types::Rule;
use monitor_api::{app, AppState};

/// In-process server on its own port, backed by a fresh in-memory store
pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    pub config: AppConfig,
    pub client: reqwest::Client,
}

impl TestServer {
    /// Development config: no authentication required
    pub async fn start() -> Result<Self> {
        Self::start_with(AppConfig::development()).await
    }

    /// Same, but every request must carry a valid token
    pub async fn start_secured() -> Result<Self> {
        let mut config = AppConfig::development();
        config.security.require_auth = true;
        Self::start_with(config).await
    }

    pub async fn start_with(config: AppConfig) -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let state = AppState::new(config.clone(), Arc::new(MemoryStore::new()));
        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
            .await
            .context("failed to bind test port")?;
        tokio::spawn(async move {
            let _ = axum::serve(listener, app(state)).await;
        });

        let server = Self {
            port,
            base_url,
            config,
            client: reqwest::Client::new(),
        };
        server.wait_ready(Duration::from_secs(5)).await?;
        Ok(server)
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if let Ok(resp) = self.client.get(self.url("/health")).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Bearer token for `user` granted `rules`
    pub fn token(&self, user: &str, rules: Vec<ScopedRule>) -> Result<String> {
        let claims = Claims::new(user, Vec::new(), rules, 1);
        Ok(generate_jwt(&claims, &self.config.security.jwt_secret)?)
    }

    pub fn admin_token(&self) -> Result<String> {
        self.token("admin", vec![ScopedRule::cluster(Rule::new(&["*"], &["*"]))])
    }
}

/// `{message, code}` error body
pub async fn error_code(resp: reqwest::Response) -> Result<u64> {
    let body: Value = resp.json().await?;
    assert!(body["message"].is_string(), "missing message in {}", body);
    body["code"].as_u64().context("missing numeric code")
}

pub fn check(name: &str) -> Value {
    serde_json::json!({
        "metadata": { "name": name },
        "command": "check-cpu.sh",
        "interval": 60,
        "subscriptions": ["linux"],
        "handlers": ["slack"],
    })
}

pub fn entity(name: &str) -> Value {
    serde_json::json!({
        "metadata": { "name": name },
        "entity_class": "agent",
        "subscriptions": ["linux"],
    })
}

pub fn event(entity: &str, check: &str) -> Value {
    serde_json::json!({
        "entity": {
            "metadata": { "name": entity },
            "entity_class": "agent",
        },
        "check": {
            "metadata": { "name": check },
            "command": "check.sh",
            "status": 0,
            "output": "ok",
        },
        "timestamp": 1_700_000_000,
    })
}
