mod common;

use anyhow::Result;
use common::{check, error_code, TestServer};
use monitor_api::auth::ScopedRule;
use monitor_api::types::Rule;
use reqwest::StatusCode;

#[tokio::test]
async fn health_and_root_are_public() -> Result<()> {
    let server = TestServer::start_secured().await?;

    let res = server.client.get(server.url("/health")).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await?;
    assert_eq!(body["status"], "ok");

    let res = server.client.get(server.url("/")).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await?;
    assert_eq!(body["name"], "monitor-api");
    Ok(())
}

#[tokio::test]
async fn missing_or_bad_tokens_are_unauthenticated() -> Result<()> {
    let server = TestServer::start_secured().await?;
    let url = server.url("/namespaces/default/checks");

    let res = server.client.get(&url).send().await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(res).await?, 5);

    let res = server.client.get(&url).bearer_auth("not-a-jwt").send().await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = server
        .client
        .get(&url)
        .header("Authorization", "Basic YWRtaW46cGFzcw==")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = server.client.get(&url).bearer_auth(server.admin_token()?).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn anonymous_requests_are_allowed_when_auth_is_off() -> Result<()> {
    let server = TestServer::start().await?;
    let res = server
        .client
        .post(server.url("/namespaces/default/checks"))
        .json(&check("cpu"))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    Ok(())
}

#[tokio::test]
async fn permission_denied_looks_like_not_found() -> Result<()> {
    let server = TestServer::start_secured().await?;
    let admin = server.admin_token()?;
    let reader = server.token(
        "reader",
        vec![ScopedRule::namespaced("default", Rule::new(&["get"], &["checks"]))],
    )?;

    let res = server
        .client
        .post(server.url("/namespaces/default/checks"))
        .bearer_auth(&admin)
        .json(&check("cpu"))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);

    // Readers can see it
    let res = server
        .client
        .get(server.url("/namespaces/default/checks/cpu"))
        .bearer_auth(&reader)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    // but a denied write is reported as 404 with the PermissionDenied code
    let res = server
        .client
        .post(server.url("/namespaces/default/checks"))
        .bearer_auth(&reader)
        .json(&check("mem"))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(error_code(res).await?, 4);

    // and other namespaces are invisible
    let res = server
        .client
        .get(server.url("/namespaces/prod/checks/cpu"))
        .bearer_auth(&reader)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(error_code(res).await?, 2);
    Ok(())
}

#[tokio::test]
async fn users_change_their_own_password_only() -> Result<()> {
    let server = TestServer::start_secured().await?;
    let admin = server.admin_token()?;

    for name in ["alice", "bob"] {
        let res = server
            .client
            .post(server.url("/users"))
            .bearer_auth(&admin)
            .json(&serde_json::json!({ "metadata": { "name": name }, "password": "initial-pass" }))
            .send()
            .await?;
        assert_eq!(res.status(), StatusCode::CREATED);
    }

    let alice = server.token("alice", Vec::new())?;
    let res = server
        .client
        .put(server.url("/users/alice/password"))
        .bearer_auth(&alice)
        .json(&serde_json::json!({ "password": "brand-new-pass" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = server
        .client
        .put(server.url("/users/bob/password"))
        .bearer_auth(&alice)
        .json(&serde_json::json!({ "password": "brand-new-pass" }))
        .send()
        .await?;
    assert_eq!(error_code(res).await?, 4);

    // Password material never comes back
    let res = server
        .client
        .get(server.url("/users/alice"))
        .bearer_auth(&admin)
        .send()
        .await?;
    let body: serde_json::Value = res.json().await?;
    assert_eq!(body["metadata"]["name"], "alice");
    assert!(body.get("password").is_none());
    assert!(body["password_hash"].as_str().unwrap_or_default().is_empty());
    Ok(())
}

#[tokio::test]
async fn users_cannot_supply_their_own_digest() -> Result<()> {
    let server = TestServer::start().await?;

    let res = server
        .client
        .post(server.url("/users"))
        .json(&serde_json::json!({ "metadata": { "name": "mallory" }, "password_hash": "x" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_code(res).await?, 1);

    let res = server.client.get(server.url("/users/mallory")).send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}
