//! Client context: endpoint configuration, HTTP client and session store
//!
//! One `Client` holds everything a call needs. Nothing is process-global, so
//! several clients (or tests) can talk to different servers side by side.

use std::sync::Arc;

use reqwest::Url;

use crate::config::{Config, StoreKind};
use crate::error::UsageError;
use crate::session::{FileStore, MemoryStore, StoreError, TokenStore};

/// Filename the legacy remove call always sent
pub const LEGACY_REMOVE_FILENAME: &str = "example.pdf";

type ResetHook = Arc<dyn Fn() + Send + Sync>;

/// Immutable endpoint configuration
#[derive(Debug, Clone)]
pub struct Endpoint {
    origin: String,
    api_port: u16,
    content_origin: String,
    user: Option<String>,
    repo: Option<String>,
    fixed_remove_filename: bool,
}

impl Endpoint {
    /// URL of an administration API call: `<origin>:<port>/api/<name>`
    pub fn api_url(&self, name: &str) -> String {
        format!("{}:{}/api/{}", self.origin, self.api_port, name)
    }

    /// URL of an uploaded resource: `<content origin>/upload/<user>-<repo>/<filename>`
    ///
    /// Each segment is percent-encoded, so a filename cannot add query,
    /// fragment or path components. Dot segments are refused.
    pub fn content_url(&self, user: &str, repo: &str, filename: &str) -> Result<String, UsageError> {
        if matches!(filename, "." | "..") {
            return Err(UsageError::invalid("filename", "must not be a dot segment"));
        }

        let mut url = Url::parse(&self.content_origin)
            .map_err(|e| UsageError::invalid("content_origin", e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| UsageError::invalid("content_origin", "cannot be a base URL"))?
            .pop_if_empty()
            .push("upload")
            .push(&format!("{}-{}", user, repo))
            .push(filename);

        Ok(url.into())
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn api_port(&self) -> u16 {
        self.api_port
    }

    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    pub fn repo(&self) -> Option<&str> {
        self.repo.as_deref()
    }

    /// The (user, repo) pair, required by every resource operation
    pub(crate) fn identity(&self) -> Result<(&str, &str), UsageError> {
        match (self.user.as_deref(), self.repo.as_deref()) {
            (Some(user), Some(repo)) => Ok((user, repo)),
            _ => Err(UsageError::MissingConfig("user/repo")),
        }
    }

    pub(crate) fn fixed_remove_filename(&self) -> bool {
        self.fixed_remove_filename
    }
}

/// Client for the ds administration API
#[derive(Clone)]
pub struct Client {
    pub(crate) http: reqwest::Client,
    pub(crate) endpoint: Arc<Endpoint>,
    pub(crate) store: Arc<dyn TokenStore>,
    pub(crate) on_reset: Option<ResetHook>,
}

impl Client {
    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn store(&self) -> &dyn TokenStore {
        self.store.as_ref()
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("endpoint", &self.endpoint)
            .field("authenticated", &self.store.has_token())
            .finish()
    }
}

/// Builder for [`Client`]
///
/// Values are checked in `build`, before any request can exist.
pub struct ClientBuilder {
    origin: Option<String>,
    api_port: u16,
    content_origin: Option<String>,
    user: Option<String>,
    repo: Option<String>,
    fixed_remove_filename: bool,
    store: Option<Arc<dyn TokenStore>>,
    http: Option<reqwest::Client>,
    on_reset: Option<ResetHook>,
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self {
            origin: None,
            api_port: crate::DEFAULT_API_PORT,
            content_origin: None,
            user: None,
            repo: None,
            fixed_remove_filename: false,
            store: None,
            http: None,
            on_reset: None,
        }
    }
}

impl ClientBuilder {
    /// Start from a loaded config, opening the configured session store
    pub fn from_config(config: &Config) -> Result<Self, StoreError> {
        let store: Arc<dyn TokenStore> = match config.session.store {
            StoreKind::Memory => Arc::new(MemoryStore::new()),
            StoreKind::File => match &config.session.path {
                Some(path) => Arc::new(FileStore::new(path)),
                None => Arc::new(FileStore::at_default_path()?),
            },
        };

        let endpoint = &config.endpoint;
        Ok(Self {
            origin: endpoint.origin.clone(),
            api_port: endpoint.api_port,
            content_origin: endpoint.content_origin.clone(),
            user: endpoint.user.clone(),
            repo: endpoint.repo.clone(),
            fixed_remove_filename: config.compat.fixed_remove_filename,
            store: Some(store),
            http: None,
            on_reset: None,
        })
    }

    /// API origin, scheme and host only (e.g. "http://device.local")
    pub fn origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    pub fn api_port(mut self, port: u16) -> Self {
        self.api_port = port;
        self
    }

    /// Origin serving `/upload/...` content, if it differs from the API origin
    pub fn content_origin(mut self, origin: impl Into<String>) -> Self {
        self.content_origin = Some(origin.into());
        self
    }

    /// Repository identity scoping all resource operations
    pub fn repo(mut self, user: impl Into<String>, repo: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self.repo = Some(repo.into());
        self
    }

    pub fn fixed_remove_filename(mut self, enabled: bool) -> Self {
        self.fixed_remove_filename = enabled;
        self
    }

    pub fn store(mut self, store: impl TokenStore + 'static) -> Self {
        self.store = Some(Arc::new(store));
        self
    }

    pub fn shared_store(mut self, store: Arc<dyn TokenStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn http_client(mut self, http: reqwest::Client) -> Self {
        self.http = Some(http);
        self
    }

    /// Hook run after `logout` has cleared the session
    pub fn on_reset(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_reset = Some(Arc::new(hook));
        self
    }

    pub fn build(self) -> Result<Client, UsageError> {
        let origin = self.origin.ok_or(UsageError::MissingConfig("origin"))?;
        let origin = parse_origin("origin", &origin, false)?;

        let content_origin = match self.content_origin {
            Some(content) => parse_origin("content_origin", &content, true)?,
            None => origin.clone(),
        };

        if self.user.as_deref() == Some("") {
            return Err(UsageError::invalid("user", "must not be empty"));
        }
        if self.repo.as_deref() == Some("") {
            return Err(UsageError::invalid("repo", "must not be empty"));
        }

        let endpoint = Endpoint {
            origin,
            api_port: self.api_port,
            content_origin,
            user: self.user,
            repo: self.repo,
            fixed_remove_filename: self.fixed_remove_filename,
        };

        tracing::debug!(
            "Client configured for {} (user: {:?}, repo: {:?})",
            endpoint.api_url(""),
            endpoint.user,
            endpoint.repo
        );

        Ok(Client {
            http: self.http.unwrap_or_default(),
            endpoint: Arc::new(endpoint),
            store: self.store.unwrap_or_else(|| Arc::new(MemoryStore::new())),
            on_reset: self.on_reset,
        })
    }
}

/// Check an origin and return it without trailing slash
fn parse_origin(name: &'static str, raw: &str, allow_port: bool) -> Result<String, UsageError> {
    let url = Url::parse(raw).map_err(|e| UsageError::invalid(name, e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(UsageError::invalid(name, "scheme must be http or https"));
    }
    if url.host_str().is_none() {
        return Err(UsageError::invalid(name, "missing host"));
    }
    if !allow_port && url.port().is_some() {
        return Err(UsageError::invalid(name, "must not carry a port, set api_port instead"));
    }
    if url.path() != "/" || url.query().is_some() {
        return Err(UsageError::invalid(name, "must not carry a path or query"));
    }

    Ok(raw.trim_end_matches('/').to_string())
}
