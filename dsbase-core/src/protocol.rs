//! Request protocol shared by every remote call
//!
//! A call goes `Idle -> Sent -> Succeeded | Failed` exactly once:
//! - the bearer token (if any) is read from the store right before dispatch
//! - any status other than 200 fails with that status
//! - transport failures fail with the fallback code
//! - a 200 whose body must be JSON but is not fails with the caller's
//!   chosen parse error
//!
//! There is no retry and no timeout beyond the transport default.

use reqwest::header::AUTHORIZATION;
use reqwest::{Method, StatusCode, multipart};
use serde::de::DeserializeOwned;

use crate::client::Client;
use crate::error::{ApiError, ApiResult};

/// Credential attached to a call
pub(crate) enum Auth {
    None,
    /// Token read from the session store at dispatch time
    Session,
    /// Caller-supplied token (token validation)
    Bearer(String),
}

pub(crate) enum Body {
    Empty,
    Form(Vec<(&'static str, String)>),
    Json(serde_json::Value),
    Multipart(multipart::Form),
}

/// One remote call, before dispatch
pub(crate) struct Call {
    method: Method,
    url: String,
    auth: Auth,
    body: Body,
}

impl Call {
    pub(crate) fn get(url: String) -> Self {
        Self {
            method: Method::GET,
            url,
            auth: Auth::None,
            body: Body::Empty,
        }
    }

    pub(crate) fn post(url: String) -> Self {
        Self {
            method: Method::POST,
            ..Self::get(url)
        }
    }

    pub(crate) fn session_auth(mut self) -> Self {
        self.auth = Auth::Session;
        self
    }

    pub(crate) fn bearer(mut self, token: String) -> Self {
        self.auth = Auth::Bearer(token);
        self
    }

    pub(crate) fn form(mut self, fields: Vec<(&'static str, String)>) -> Self {
        self.body = Body::Form(fields);
        self
    }

    pub(crate) fn json(mut self, body: serde_json::Value) -> Self {
        self.body = Body::Json(body);
        self
    }

    pub(crate) fn multipart(mut self, form: multipart::Form) -> Self {
        self.body = Body::Multipart(form);
        self
    }
}

impl Client {
    /// Send a call and return the body of a 200 response
    pub(crate) async fn invoke(&self, call: Call) -> ApiResult<Vec<u8>> {
        let Call {
            method,
            url,
            auth,
            body,
        } = call;

        let mut request = self.http.request(method.clone(), &url);

        let token = match auth {
            Auth::None => None,
            Auth::Session => Some(self.store.get_token().unwrap_or_default()),
            Auth::Bearer(token) => Some(token),
        };
        let authed = token.is_some();
        if let Some(token) = token {
            request = request.header(AUTHORIZATION, format!("bearer {}", token));
        }

        request = match body {
            Body::Empty => request,
            Body::Form(fields) => request.form(&fields),
            Body::Json(value) => request.json(&value),
            Body::Multipart(form) => request.multipart(form),
        };

        tracing::debug!(%method, %url, authed, "Sending request");

        let response = request.send().await.map_err(|e| {
            tracing::warn!(%method, %url, "Transport failed: {}", e);
            ApiError::Transport(e)
        })?;

        let status = response.status();
        tracing::debug!(%method, %url, status = status.as_u16(), "Request completed");

        if status != StatusCode::OK {
            tracing::warn!(%method, %url, "Request failed with HTTP {}", status.as_u16());
            return Err(ApiError::Status(status.as_u16()));
        }

        Ok(response.bytes().await?.to_vec())
    }

    /// Send a call whose 200 body must parse as `T`
    ///
    /// `malformed` builds the error reported when parsing fails.
    pub(crate) async fn invoke_json<T: DeserializeOwned>(
        &self,
        call: Call,
        malformed: fn(String) -> ApiError,
    ) -> ApiResult<T> {
        let body = self.invoke(call).await?;
        serde_json::from_slice(&body).map_err(|e| {
            tracing::warn!("Response body did not parse: {}", e);
            malformed(e.to_string())
        })
    }

    /// Send a call where only the 200 status matters
    pub(crate) async fn invoke_status(&self, call: Call) -> ApiResult<()> {
        self.invoke(call).await.map(|_| ())
    }
}
