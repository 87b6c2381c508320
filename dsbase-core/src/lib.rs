//! dsbase-core: Client library for the ds administration API
//!
//! This crate provides:
//! - Token session store (file-backed or in-memory)
//! - A single request protocol with uniform error-code mapping
//! - Resource transfer (object/file upload, download, list, remove)
//! - Session lifecycle (login, token login, logout)
//! - Lifecycle operations (server versions, startup, install, update)

pub mod admin;
pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod lifecycle;
mod protocol;
pub mod session;
pub mod transfer;

pub use admin::{AdminOutcome, Credentials, LoginForm, add_admin_tools};
pub use client::{Client, ClientBuilder, Endpoint};
pub use config::Config;
pub use error::{ApiError, ApiResult, UsageError};
pub use session::{FileStore, MemoryStore, StoreError, TokenStore};
pub use transfer::UploadFile;

/// Default port of the administration API
pub const DEFAULT_API_PORT: u16 = 3010;

/// Key of the persisted session token slot
pub const TOKEN_KEY: &str = "ds_token";
