mod common;

use anyhow::Result;
use common::{entity, error_code, event, TestServer};
use reqwest::StatusCode;
use serde_json::Value;

async fn seed_entity(server: &TestServer, name: &str, checks: &[&str]) -> Result<()> {
    let res = server
        .client
        .post(server.url("/namespaces/default/entities"))
        .json(&entity(name))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);

    for check in checks {
        let res = server
            .client
            .post(server.url("/namespaces/default/events"))
            .json(&event(name, check))
            .send()
            .await?;
        assert_eq!(res.status(), StatusCode::CREATED, "event {}/{}", name, check);
    }
    Ok(())
}

async fn event_names(server: &TestServer, path: &str) -> Result<Vec<String>> {
    let events: Vec<Value> = server.client.get(server.url(path)).send().await?.json().await?;
    Ok(events
        .iter()
        .filter_map(|e| e["metadata"]["name"].as_str().map(str::to_string))
        .collect())
}

#[tokio::test]
async fn deleting_an_entity_removes_its_events() -> Result<()> {
    let server = TestServer::start().await?;
    seed_entity(&server, "web-1", &["cpu", "disk", "mem"]).await?;
    seed_entity(&server, "web-2", &["cpu"]).await?;

    assert_eq!(
        event_names(&server, "/namespaces/default/events/web-1").await?,
        vec!["web-1/cpu", "web-1/disk", "web-1/mem"]
    );

    let res = server
        .client
        .delete(server.url("/namespaces/default/entities/web-1"))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let deleted: Value = res.json().await?;
    assert_eq!(deleted["metadata"]["name"], "web-1");
    assert_eq!(deleted["entity_class"], "agent");

    assert!(event_names(&server, "/namespaces/default/events/web-1").await?.is_empty());
    assert_eq!(
        event_names(&server, "/namespaces/default/events").await?,
        vec!["web-2/cpu"]
    );

    let res = server
        .client
        .get(server.url("/namespaces/default/entities/web-1"))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn missing_entity_is_not_found() -> Result<()> {
    let server = TestServer::start().await?;

    let res = server
        .client
        .delete(server.url("/namespaces/default/entities/ghost"))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(error_code(res).await?, 2);
    Ok(())
}

#[tokio::test]
async fn events_are_addressed_by_entity_and_check() -> Result<()> {
    let server = TestServer::start().await?;
    seed_entity(&server, "db-1", &["cpu"]).await?;
    let item = server.url("/namespaces/default/events/db-1/cpu");

    let res = server.client.get(&item).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    let found: Value = res.json().await?;
    assert_eq!(found["check"]["metadata"]["name"], "cpu");

    // Replace with a failing status
    let mut failing = event("db-1", "cpu");
    failing["check"]["status"] = serde_json::json!(2);
    let res = server.client.put(&item).json(&failing).send().await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let found: Value = server.client.get(&item).send().await?.json().await?;
    assert_eq!(found["check"]["status"], 2);

    // The body must describe the event the path names
    let res = server
        .client
        .put(server.url("/namespaces/default/events/db-1/disk"))
        .json(&failing)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_code(res).await?, 1);

    let res = server.client.delete(&item).send().await?;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    let res = server.client.delete(&item).send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}
