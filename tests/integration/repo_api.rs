//! Full-flow tests for the repository API
//!
//! Runs a create, read, update, delete lifecycle over one scripted
//! transport, checking the exact payloads put on the wire and that every
//! call carries the installed token.

use super::support::{client_config, repository_json, ScriptedTransport, SERVER};
use forgekit::api::repos::{
    create_repo, delete_repo, read_repo, search_repos, update_repo, NewRepository, RepoPatch,
};
use forgekit::api::orgs::current_user_orgs;
use forgekit::error::Error;
use forgekit::http::ClientConfig;
use serde_json::json;
use std::sync::Arc;

fn authed_config() -> ClientConfig {
    let mut config = client_config();
    config.token = Some("t0ken".into());
    config
}

fn repo_url(owner: &str, name: &str) -> String {
    format!("{}/api/v1/repos/{}/{}", SERVER, owner, name)
}

#[tokio::test]
async fn test_create_repo_payload_carries_auto_init() {
    let transport = Arc::new(ScriptedTransport::new());
    let create_url = format!("{}/api/v1/user/repos", SERVER);
    transport.script(
        "POST",
        &create_url,
        Ok(repository_json("door43", "en_obs", "master", true)),
    );

    let config = authed_config();
    let mut new_repo = NewRepository::new("en_obs");
    new_repo.description = Some("Open Bible Stories".into());
    new_repo.private = Some(true);

    let repository = create_repo(transport.as_ref(), &config, &new_repo)
        .await
        .unwrap();
    assert_eq!(repository.full_name, "door43/en_obs");

    let call = transport.last_call("POST", &create_url).unwrap();
    assert_eq!(call.token.as_deref(), Some("t0ken"));
    assert_eq!(
        call.payload,
        Some(json!({
            "name": "en_obs",
            "description": "Open Bible Stories",
            "private": true,
            "auto_init": true
        }))
    );
}

#[tokio::test]
async fn test_repository_lifecycle() {
    let transport = Arc::new(ScriptedTransport::new());
    let config = authed_config();
    let create_url = format!("{}/api/v1/user/repos", SERVER);
    let url = repo_url("door43", "en_obs");

    transport.script(
        "POST",
        &create_url,
        Ok(repository_json("door43", "en_obs", "master", true)),
    );
    transport.script(
        "GET",
        &url,
        Ok(repository_json("door43", "en_obs", "master", true)),
    );
    transport.script(
        "PATCH",
        &url,
        Ok(repository_json("door43", "en_obs", "master", true)),
    );
    transport.script("DELETE", &url, Ok(json!(null)));
    transport.script("GET", &url, Err(Error::NotFound("gone".into())));

    create_repo(transport.as_ref(), &config, &NewRepository::new("en_obs"))
        .await
        .unwrap();

    let read = read_repo(transport.as_ref(), &config, "door43", "en_obs")
        .await
        .unwrap();
    assert_eq!(read.unwrap().default_branch, "master");

    // A sparse patch serializes only the fields being changed
    let patch = RepoPatch {
        description: Some("updated".into()),
        ..RepoPatch::default()
    };
    let updated = update_repo(transport.as_ref(), &config, "door43", "en_obs", &patch)
        .await
        .unwrap();
    assert!(updated.is_some());
    let call = transport.last_call("PATCH", &url).unwrap();
    assert_eq!(call.payload, Some(json!({"description": "updated"})));

    let deleted = delete_repo(transport.as_ref(), &config, "door43", "en_obs")
        .await
        .unwrap();
    assert!(deleted.is_some());

    let gone = read_repo(transport.as_ref(), &config, "door43", "en_obs")
        .await
        .unwrap();
    assert!(gone.is_none());
}

#[tokio::test]
async fn test_refused_update_reports_none() {
    let transport = Arc::new(ScriptedTransport::new());
    let config = authed_config();
    let url = repo_url("door43", "en_obs");
    transport.script("PATCH", &url, Err(Error::PermissionDenied("read only".into())));

    let patch = RepoPatch {
        private: Some(true),
        ..RepoPatch::default()
    };
    let updated = update_repo(transport.as_ref(), &config, "door43", "en_obs", &patch)
        .await
        .unwrap();
    assert!(updated.is_none());
}

#[tokio::test]
async fn test_search_scopes_by_resolved_owner_uid() {
    let transport = Arc::new(ScriptedTransport::new());
    let config = authed_config();
    let owner_url = format!("{}/api/v1/users/door43", SERVER);
    let scoped_url = format!("{}/api/v1/repos/search?q=obs&limit=50&uid=7", SERVER);
    transport.script("GET", &owner_url, Ok(json!({"id": 7, "login": "door43"})));
    transport.script(
        "GET",
        &scoped_url,
        Ok(json!({
            "ok": true,
            "data": [repository_json("door43", "en_obs", "master", false)]
        })),
    );

    let repos = search_repos(transport.as_ref(), &config, "door43", "obs")
        .await
        .unwrap();
    assert_eq!(repos.len(), 1);
    assert_eq!(repos[0].full_name, "door43/en_obs");
    assert_eq!(transport.call_count("GET", &scoped_url), 1);
}

#[tokio::test]
async fn test_search_rejects_a_not_ok_envelope() {
    let transport = Arc::new(ScriptedTransport::new());
    let config = authed_config();
    let url = format!("{}/api/v1/repos/search?q=obs&limit=50", SERVER);
    transport.script("GET", &url, Ok(json!({"ok": false, "data": []})));

    let err = search_repos(transport.as_ref(), &config, "", "obs")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Decode(_)));
}

#[tokio::test]
async fn test_org_listing_runs_on_the_token() {
    let transport = Arc::new(ScriptedTransport::new());
    let config = authed_config();
    let url = format!("{}/api/v1/user/orgs", SERVER);
    transport.script(
        "GET",
        &url,
        Ok(json!([
            {"id": 5, "username": "unfoldingword", "visibility": "public"},
            {"id": 6, "username": "door43"}
        ])),
    );

    let orgs = current_user_orgs(transport.as_ref(), &config).await.unwrap();
    assert_eq!(orgs.len(), 2);
    assert_eq!(orgs[0].username, "unfoldingword");

    let call = transport.last_call("GET", &url).unwrap();
    assert_eq!(call.token.as_deref(), Some("t0ken"));
}
