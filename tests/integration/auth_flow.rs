//! Full-flow tests for session authentication
//!
//! Exercises login, restore, and logout against a scripted forge, with the
//! transport recording which credentials each request carried: token
//! endpoints must see basic auth, everything after must see the token.

use super::support::{client_config, user_json, MemoryStorage, ScriptedTransport, SERVER};
use forgekit::auth::{authorization_headers, AuthSession, Credentials};
use serde_json::json;
use std::sync::Arc;

fn tokens_url() -> String {
    format!("{}/api/v1/users/mab/tokens", SERVER)
}

fn user_url() -> String {
    format!("{}/api/v1/user", SERVER)
}

fn credentials(remember: bool) -> Credentials {
    Credentials {
        username: "mab".into(),
        password: "secret".into(),
        remember,
    }
}

fn script_fresh_login(transport: &ScriptedTransport) {
    transport.script("GET", &tokens_url(), Ok(json!([])));
    transport.script(
        "POST",
        &tokens_url(),
        Ok(json!({"id": 1, "name": "forgekit", "sha1": "fresh"})),
    );
    transport.script("GET", &user_url(), Ok(user_json(9, "mab")));
}

#[tokio::test]
async fn test_login_sends_basic_auth_to_token_endpoints_only() {
    let transport = Arc::new(ScriptedTransport::new());
    script_fresh_login(&transport);

    let storage = Arc::new(MemoryStorage::new());
    let mut session = AuthSession::new(storage, "forgekit");
    let mut config = client_config();

    let auth = session
        .login(transport.as_ref(), &mut config, credentials(true))
        .await
        .unwrap();
    assert_eq!(auth.user.username, "mab");
    assert_eq!(config.token.as_deref(), Some("fresh"));

    let basic = authorization_headers("mab", "secret");
    let list = transport.last_call("GET", &tokens_url()).unwrap();
    assert_eq!(list.headers, basic);
    assert_eq!(list.token, None);

    let create = transport.last_call("POST", &tokens_url()).unwrap();
    assert_eq!(create.headers, basic);
    assert_eq!(create.payload, Some(json!({"name": "forgekit"})));

    // The user fetch runs on the installed token, not on basic auth
    let whoami = transport.last_call("GET", &user_url()).unwrap();
    assert_eq!(whoami.token.as_deref(), Some("fresh"));
    assert!(whoami.headers.is_empty());
}

#[tokio::test]
async fn test_remembered_session_restores_without_network() {
    let transport = Arc::new(ScriptedTransport::new());
    script_fresh_login(&transport);

    let storage = Arc::new(MemoryStorage::new());
    let mut first = AuthSession::new(storage.clone(), "forgekit");
    let mut config = client_config();
    first
        .login(transport.as_ref(), &mut config, credentials(true))
        .await
        .unwrap();
    let calls_after_login = transport.total_calls();
    assert!(storage.stored().is_some());

    // A later run over the same storage picks the session up offline
    let mut second = AuthSession::new(storage.clone(), "forgekit");
    let mut fresh_config = client_config();
    let restored = second.restore(&mut fresh_config).unwrap();

    assert_eq!(restored.unwrap().user.username, "mab");
    assert_eq!(fresh_config.token.as_deref(), Some("fresh"));
    assert_eq!(transport.total_calls(), calls_after_login);
}

#[tokio::test]
async fn test_relogin_reuses_the_remembered_secret() {
    let transport = Arc::new(ScriptedTransport::new());
    script_fresh_login(&transport);

    let storage = Arc::new(MemoryStorage::new());
    let mut session = AuthSession::new(storage.clone(), "forgekit");
    let mut config = client_config();
    session
        .login(transport.as_ref(), &mut config, credentials(true))
        .await
        .unwrap();

    // The forge lists the token but never repeats its secret
    transport.script(
        "GET",
        &tokens_url(),
        Ok(json!([{"id": 1, "name": "forgekit"}])),
    );
    transport.script("GET", &user_url(), Ok(user_json(9, "mab")));

    let mut again = AuthSession::new(storage, "forgekit");
    let mut fresh_config = client_config();
    again
        .login(transport.as_ref(), &mut fresh_config, credentials(true))
        .await
        .unwrap();

    assert_eq!(fresh_config.token.as_deref(), Some("fresh"));
    assert_eq!(transport.call_count("POST", &tokens_url()), 1);
}

#[tokio::test]
async fn test_logout_forgets_the_stored_session() {
    let transport = Arc::new(ScriptedTransport::new());
    script_fresh_login(&transport);

    let storage = Arc::new(MemoryStorage::new());
    let mut session = AuthSession::new(storage.clone(), "forgekit");
    let mut config = client_config();
    session
        .login(transport.as_ref(), &mut config, credentials(true))
        .await
        .unwrap();

    session.logout(&mut config).unwrap();
    assert!(config.token.is_none());
    assert!(session.authentication().is_none());
    assert!(storage.stored().is_none());

    let mut later = AuthSession::new(storage, "forgekit");
    let mut fresh_config = client_config();
    assert!(later.restore(&mut fresh_config).unwrap().is_none());
}

#[tokio::test]
async fn test_unremembered_login_stores_nothing() {
    let transport = Arc::new(ScriptedTransport::new());
    script_fresh_login(&transport);

    let storage = Arc::new(MemoryStorage::new());
    let mut session = AuthSession::new(storage.clone(), "forgekit");
    let mut config = client_config();
    session
        .login(transport.as_ref(), &mut config, credentials(false))
        .await
        .unwrap();

    // The live session works, but nothing survives for the next run
    assert_eq!(config.token.as_deref(), Some("fresh"));
    assert!(storage.stored().is_none());
}
