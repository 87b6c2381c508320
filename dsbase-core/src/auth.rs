//! Session lifecycle: login, token login, logout
//!
//! `login` and `login_token` are the only writers of the session token and
//! `logout` is the only remover. Presence is all the client knows about a
//! token; expiry and refresh are the server's business.

use std::future::Future;

use serde_json::{Value, json};

use crate::client::Client;
use crate::error::{ApiError, ApiResult, UsageError};
use crate::protocol::Call;
use crate::session::StoreError;
use crate::transfer::require;

/// Token carried by a login reply, if it is a non-empty string field
fn reply_token(reply: &Value) -> Option<&str> {
    reply
        .get("token")
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())
}

impl Client {
    /// True iff a session token is stored
    pub fn authenticated(&self) -> bool {
        self.store.has_token()
    }

    pub fn token(&self) -> Option<String> {
        self.store.get_token()
    }

    /// Log in with username and password
    ///
    /// On success the returned token is stored. A 200 reply without a
    /// token fails with code 500.
    pub fn login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<impl Future<Output = ApiResult<()>>, UsageError> {
        let username = require("username", username)?.to_string();
        let password = require("password", password)?.to_string();
        let call = Call::post(self.endpoint.api_url("login"))
            .form(vec![("username", username.clone()), ("password", password)]);

        Ok(async move {
            let reply: Value = self.invoke_json(call, ApiError::MalformedBody).await?;
            let token = reply_token(&reply).ok_or(ApiError::MissingToken)?;

            self.store.set_token(token)?;
            tracing::info!("Logged in as {}", username);
            Ok::<(), ApiError>(())
        })
    }

    /// Adopt an externally issued token after the server accepts it
    ///
    /// The validation endpoint only accepts or rejects; the token is stored
    /// as given.
    pub fn login_token(&self, token: &str) -> Result<impl Future<Output = ApiResult<()>>, UsageError> {
        let token = require("token", token)?.to_string();
        let call = Call::post(self.endpoint.api_url("valid"))
            .bearer(token.clone())
            .json(json!({}));

        Ok(async move {
            self.invoke_status(call).await?;
            self.store.set_token(&token)?;
            tracing::info!("Session token accepted");
            Ok::<(), ApiError>(())
        })
    }

    /// Drop the session and run the reset hook
    pub fn logout(&self) -> Result<(), StoreError> {
        self.store.clear_token()?;
        tracing::info!("Logged out");

        if let Some(hook) = &self.on_reset {
            hook();
        }
        Ok(())
    }
}
