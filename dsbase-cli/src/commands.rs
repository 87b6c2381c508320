//! Subcommands

use std::path::PathBuf;

use anyhow::Context;
use clap::Subcommand;

use dsbase_core::{AdminOutcome, Client, UploadFile, add_admin_tools};

use crate::prompt::TerminalForm;

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Log in (prompts for credentials unless a session exists)
    Login {
        /// Pre-fill the username
        #[arg(long)]
        username: Option<String>,
    },
    /// Adopt an existing token after the server validates it
    LoginToken { token: String },
    /// Forget the session
    Logout,
    /// Show whether a session is stored
    Status,
    /// Print a stored JSON object
    Download { filename: String },
    /// Upload a local JSON file as an object
    UploadObject {
        path: PathBuf,
        /// Remote name (defaults to the local file name)
        #[arg(long = "as")]
        name: Option<String>,
    },
    /// Upload a local file as-is
    UploadFile {
        path: PathBuf,
        /// Filename forwarded to the server
        #[arg(long)]
        filename: Option<String>,
    },
    /// Remove an upload
    Remove { filename: String },
    /// List uploads
    List,
    /// Show server component versions
    Versions,
    /// Show or change the startup URL
    Startup {
        /// New startup URL
        set: Option<String>,
    },
    /// Install an app repository
    Install { user: String, repo: String },
    /// Update an app repository
    Update { user: String, repo: String },
}

pub async fn run(client: &Client, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Login { username } => {
            let mut form = TerminalForm::new(username);
            match add_admin_tools(client, &mut form, || println!("Logged in")).await {
                AdminOutcome::LoggedIn => {}
                AdminOutcome::Abandoned => anyhow::bail!("Login abandoned"),
            }
        }
        Command::LoginToken { token } => {
            client.login_token(&token)?.await?;
            println!("Token accepted");
        }
        Command::Logout => {
            client.logout()?;
            println!("Logged out");
        }
        Command::Status => {
            if client.authenticated() {
                println!("Authenticated");
            } else {
                println!("Not authenticated");
            }
        }
        Command::Download { filename } => {
            let object = client.download_object(&filename)?.await?;
            println!("{}", serde_json::to_string_pretty(&object)?);
        }
        Command::UploadObject { path, name } => {
            let content = tokio::fs::read_to_string(&path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let object: serde_json::Value = serde_json::from_str(&content)
                .with_context(|| format!("{} is not JSON", path.display()))?;
            let name = remote_name(&path, name)?;

            client.upload_object(&object, &name)?.await?;
            println!("Uploaded {}", name);
        }
        Command::UploadFile { path, filename } => {
            let file = UploadFile::from_path(&path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let name = file.name.clone();

            client.upload_file(file, filename.as_deref())?.await?;
            println!("Uploaded {}", name);
        }
        Command::Remove { filename } => {
            client.remove(&filename)?.await?;
            println!("Removed {}", filename);
        }
        Command::List => {
            let resources = client.list().await?;
            println!("{}", serde_json::to_string_pretty(&resources)?);
        }
        Command::Versions => {
            let versions = client.server_versions().await?;
            println!("{}", serde_json::to_string_pretty(&versions)?);
        }
        Command::Startup { set: Some(url) } => {
            client.set_startup(&url)?.await?;
            println!("Startup set to {}", url);
        }
        Command::Startup { set: None } => match client.startup().await? {
            Some(url) => println!("{}", url),
            None => println!("No startup URL"),
        },
        Command::Install { user, repo } => {
            client.install(&user, &repo)?.await?;
            println!("Installed {}/{}", user, repo);
        }
        Command::Update { user, repo } => {
            client.update(&user, &repo)?.await?;
            println!("Updated {}/{}", user, repo);
        }
    }

    Ok(())
}

fn remote_name(path: &std::path::Path, name: Option<String>) -> anyhow::Result<String> {
    match name {
        Some(name) => Ok(name),
        None => path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .with_context(|| format!("{} has no file name", path.display())),
    }
}
