//! Application lifecycle calls: server versions, startup URL, install, update

use std::future::Future;

use serde_json::{Value, json};

use crate::client::Client;
use crate::error::{ApiError, ApiResult, UsageError};
use crate::protocol::Call;
use crate::transfer::require;

/// Startup URL named in a reply; a non-string value is malformed
fn reply_startup(reply: &Value) -> ApiResult<Option<String>> {
    match reply.get("startup") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(url)) => Ok(Some(url.clone())),
        Some(other) => Err(ApiError::MalformedBody(format!(
            "startup is not a string: {}",
            other
        ))),
    }
}

impl Client {
    /// Versions of the server components, as reported by the server
    pub async fn server_versions(&self) -> ApiResult<Value> {
        let call = Call::post(self.endpoint.api_url("server_versions"))
            .session_auth()
            .json(json!({}));
        self.invoke_json(call, ApiError::MalformedBody).await
    }

    /// Current startup URL; `None` when the server has none
    pub async fn startup(&self) -> ApiResult<Option<String>> {
        let call = Call::get(self.endpoint.api_url("startup")).session_auth();
        let reply: Value = self.invoke_json(call, ApiError::MalformedBody).await?;
        reply_startup(&reply)
    }

    pub fn set_startup(&self, url: &str) -> Result<impl Future<Output = ApiResult<()>>, UsageError> {
        let url = require("startup", url)?;
        let call = Call::post(self.endpoint.api_url("startup"))
            .session_auth()
            .json(json!({ "startup": url }));

        Ok(async move { self.invoke_status(call).await })
    }

    /// Install the app from `user`/`repo`
    pub fn install(
        &self,
        user: &str,
        repo: &str,
    ) -> Result<impl Future<Output = ApiResult<()>>, UsageError> {
        self.repo_call("install", user, repo)
    }

    /// Update the installed app from `user`/`repo`
    pub fn update(
        &self,
        user: &str,
        repo: &str,
    ) -> Result<impl Future<Output = ApiResult<()>>, UsageError> {
        self.repo_call("update", user, repo)
    }

    fn repo_call(
        &self,
        name: &str,
        user: &str,
        repo: &str,
    ) -> Result<impl Future<Output = ApiResult<()>>, UsageError> {
        let user = require("user", user)?;
        let repo = require("repo", repo)?;
        let call = Call::post(self.endpoint.api_url(name))
            .session_auth()
            .json(json!({ "user": user, "repo": repo }));

        Ok(async move { self.invoke_status(call).await })
    }
}
