//! Lifecycle calls and the admin login flow against the fake API

mod common;

use std::collections::VecDeque;

use common::FakeServer;
use dsbase_core::{
    AdminOutcome, ApiError, Credentials, LoginForm, MemoryStore, add_admin_tools,
};
use serde_json::json;

#[tokio::test]
async fn test_server_versions() {
    let server = FakeServer::start().await;
    server.reply("/api/server_versions", 200, r#"{"node":"20.1.0","server":"1.4.2"}"#);
    let client = server.client().store(MemoryStore::with_token("T")).build().unwrap();

    let versions = client.server_versions().await.unwrap();

    assert_eq!(versions["server"], "1.4.2");
    let sent = server.last();
    assert_eq!(sent.method, "POST");
    assert_eq!(sent.authorization.as_deref(), Some("bearer T"));
    assert_eq!(sent.body_json(), json!({}));
}

#[tokio::test]
async fn test_server_versions_malformed() {
    let server = FakeServer::start().await;
    server.reply("/api/server_versions", 200, "<html>");
    let client = server.client().build().unwrap();

    assert_eq!(client.server_versions().await.unwrap_err().code(), 500);
}

#[tokio::test]
async fn test_get_startup() {
    let server = FakeServer::start().await;
    let client = server.client().store(MemoryStore::with_token("T")).build().unwrap();

    server.reply("/api/startup", 200, r#"{"startup":"http://device.local/app"}"#);
    assert_eq!(
        client.startup().await.unwrap().as_deref(),
        Some("http://device.local/app")
    );
    let sent = server.last();
    assert_eq!(sent.method, "GET");
    assert_eq!(sent.authorization.as_deref(), Some("bearer T"));
    assert!(sent.body.is_empty());

    server.reply("/api/startup", 200, "{}");
    assert_eq!(client.startup().await.unwrap(), None);

    // A bare array is not a reply carrying a startup URL
    server.reply("/api/startup", 200, r#"["http://device.local/app"]"#);
    assert_eq!(client.startup().await.unwrap(), None);

    server.reply("/api/startup", 200, "nope");
    assert_eq!(client.startup().await.unwrap_err().code(), 500);
}

#[tokio::test]
async fn test_set_startup() {
    let server = FakeServer::start().await;
    server.reply("/api/startup", 200, "");
    let client = server.client().build().unwrap();

    client
        .set_startup("http://device.local/app")
        .unwrap()
        .await
        .unwrap();

    let sent = server.last();
    assert_eq!(sent.method, "POST");
    assert_eq!(sent.body_json(), json!({"startup": "http://device.local/app"}));
}

#[tokio::test]
async fn test_install_and_update() {
    let server = FakeServer::start().await;
    server.reply("/api/install", 200, "");
    server.reply("/api/update", 403, "");
    let client = server.client().store(MemoryStore::with_token("T")).build().unwrap();

    client.install("bob", "signage").unwrap().await.unwrap();
    let sent = server.last();
    assert_eq!(sent.path, "/api/install");
    assert_eq!(sent.body_json(), json!({"user": "bob", "repo": "signage"}));

    let err = client.update("bob", "signage").unwrap().await.unwrap_err();
    assert_eq!(err.code(), 403);
    assert_eq!(server.last().path, "/api/update");
}

struct ScriptedForm {
    submissions: VecDeque<(&'static str, &'static str)>,
    rejected_codes: Vec<u16>,
    dismissed: bool,
}

impl ScriptedForm {
    fn new(submissions: &[(&'static str, &'static str)]) -> Self {
        Self {
            submissions: submissions.iter().copied().collect(),
            rejected_codes: Vec::new(),
            dismissed: false,
        }
    }
}

impl LoginForm for ScriptedForm {
    fn submit(&mut self) -> Option<Credentials> {
        self.submissions
            .pop_front()
            .map(|(username, password)| Credentials {
                username: username.to_string(),
                password: password.to_string(),
            })
    }

    fn rejected(&mut self, error: &ApiError) {
        self.rejected_codes.push(error.code());
    }

    fn dismiss(&mut self) {
        self.dismissed = true;
    }
}

#[tokio::test]
async fn test_admin_tools_login_flow() {
    let server = FakeServer::start().await;
    server.reply("/api/login", 200, r#"{"token":"T"}"#);
    let client = server.client().build().unwrap();
    let mut form = ScriptedForm::new(&[("", ""), ("alice", "secret")]);

    let mut logged_in = false;
    let outcome = add_admin_tools(&client, &mut form, || logged_in = true).await;

    assert_eq!(outcome, AdminOutcome::LoggedIn);
    assert!(logged_in);
    assert!(form.dismissed);
    assert!(client.authenticated());
    // The blank submission never reached the server
    assert_eq!(server.requests().len(), 1);
}

#[tokio::test]
async fn test_admin_tools_rejected_then_abandoned() {
    let server = FakeServer::start().await;
    server.reply("/api/login", 403, "");
    let client = server.client().build().unwrap();
    let mut form = ScriptedForm::new(&[("alice", "wrong"), ("alice", "still wrong")]);

    let mut logged_in = false;
    let outcome = add_admin_tools(&client, &mut form, || logged_in = true).await;

    assert_eq!(outcome, AdminOutcome::Abandoned);
    assert!(!logged_in);
    assert!(!form.dismissed);
    assert_eq!(form.rejected_codes, vec![403, 403]);
    assert_eq!(server.requests().len(), 2);
}
