//! Resource transfer: object/file upload, download, remove, list
//!
//! Operations that take arguments check them first and return
//! `Err(UsageError)` without sending anything. Awaiting the returned future
//! performs exactly one request.

use std::future::Future;
use std::path::Path;

use reqwest::multipart::{Form, Part};
use serde::Serialize;
use serde_json::{Value, json};

use crate::client::{Client, LEGACY_REMOVE_FILENAME};
use crate::error::{ApiError, ApiResult, UsageError};
use crate::protocol::Call;

/// An opaque file to upload
#[derive(Debug, Clone)]
pub struct UploadFile {
    /// Name of the multipart file part
    pub name: String,
    pub bytes: Vec<u8>,
    pub mime: Option<String>,
}

impl UploadFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
            mime: None,
        }
    }

    pub fn with_mime(mut self, mime: impl Into<String>) -> Self {
        self.mime = Some(mime.into());
        self
    }

    /// Read a file from disk, named after its final path component
    pub async fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "file".to_string());
        Ok(Self::new(name, bytes))
    }
}

pub(crate) fn require<'a>(name: &'static str, value: &'a str) -> Result<&'a str, UsageError> {
    if value.is_empty() {
        return Err(UsageError::invalid(name, "must not be empty"));
    }
    Ok(value)
}

impl Client {
    /// Download a JSON object stored as `filename`
    ///
    /// A 200 response that is not JSON fails with code 415.
    pub fn download_object(
        &self,
        filename: &str,
    ) -> Result<impl Future<Output = ApiResult<Value>>, UsageError> {
        let filename = require("filename", filename)?;
        let (user, repo) = self.endpoint.identity()?;
        let call = Call::get(self.endpoint.content_url(user, repo, filename)?);

        Ok(async move { self.invoke_json(call, ApiError::NotJson).await })
    }

    /// Upload `object` as a JSON file named `filename`
    pub fn upload_object<T: Serialize + ?Sized>(
        &self,
        object: &T,
        filename: &str,
    ) -> Result<impl Future<Output = ApiResult<()>>, UsageError> {
        let filename = require("filename", filename)?.to_string();
        let value =
            serde_json::to_value(object).map_err(|e| UsageError::invalid("object", e.to_string()))?;
        if !(value.is_object() || value.is_array()) {
            return Err(UsageError::invalid(
                "object",
                "must serialize to a JSON object or array",
            ));
        }
        let (user, repo) = self.endpoint.identity()?;
        let bytes =
            serde_json::to_vec(&value).map_err(|e| UsageError::invalid("object", e.to_string()))?;
        let blob = Part::bytes(bytes)
            .file_name(filename)
            .mime_str("application/json")
            .map_err(|e| UsageError::invalid("object", e.to_string()))?;
        let form = Form::new()
            .text("user", user.to_string())
            .text("repo", repo.to_string())
            .part("file", blob);
        let call = Call::post(self.endpoint.api_url("upload"))
            .session_auth()
            .multipart(form);

        Ok(async move { self.invoke_status(call).await })
    }

    /// Upload an opaque file
    ///
    /// `filename` is forwarded as its own form field; the file part keeps
    /// the file's own name.
    pub fn upload_file(
        &self,
        file: UploadFile,
        filename: Option<&str>,
    ) -> Result<impl Future<Output = ApiResult<()>>, UsageError> {
        require("file.name", &file.name)?;
        let filename = filename
            .map(|f| require("filename", f).map(str::to_string))
            .transpose()?;
        let (user, repo) = self.endpoint.identity()?;

        let mut part = Part::bytes(file.bytes).file_name(file.name);
        if let Some(mime) = &file.mime {
            part = part
                .mime_str(mime)
                .map_err(|e| UsageError::invalid("file.mime", e.to_string()))?;
        }
        let mut form = Form::new()
            .text("user", user.to_string())
            .text("repo", repo.to_string())
            .part("file", part);
        if let Some(filename) = filename {
            form = form.text("filename", filename);
        }
        let call = Call::post(self.endpoint.api_url("upload"))
            .session_auth()
            .multipart(form);

        Ok(async move { self.invoke_status(call).await })
    }

    /// Remove the upload named `filename`
    pub fn remove(&self, filename: &str) -> Result<impl Future<Output = ApiResult<()>>, UsageError> {
        let filename = require("filename", filename)?;
        let (user, repo) = self.endpoint.identity()?;

        let target = if self.endpoint.fixed_remove_filename() {
            LEGACY_REMOVE_FILENAME
        } else {
            filename
        };
        let call = Call::post(self.endpoint.api_url("delete"))
            .session_auth()
            .json(json!({
                "user": user,
                "repo": repo,
                "filename": target,
            }));

        Ok(async move { self.invoke_status(call).await })
    }

    /// List stored resources; the server's collection is passed through as-is
    pub async fn list(&self) -> ApiResult<Value> {
        let call = Call::post(self.endpoint.api_url("list"))
            .session_auth()
            .json(json!({}));
        self.invoke_json(call, ApiError::MalformedBody).await
    }
}
