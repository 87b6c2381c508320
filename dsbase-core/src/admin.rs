//! Admin tools login flow
//!
//! The host supplies the form (a terminal prompt, a dialog, a web form);
//! this module only decides when to ask, when to log in and when to run the
//! post-login hook.

use crate::client::Client;
use crate::error::ApiError;

#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// A place credentials are typed into
pub trait LoginForm {
    /// Wait for the next submission; `None` when the user gives up
    fn submit(&mut self) -> Option<Credentials>;

    /// The last submission was refused
    fn rejected(&mut self, error: &ApiError);

    /// Login succeeded, the form is no longer needed
    fn dismiss(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminOutcome {
    LoggedIn,
    Abandoned,
}

/// Make sure the client is logged in, then run `on_login`
///
/// An existing session skips the form entirely. Blank submissions are
/// ignored; every other submission is one login attempt.
pub async fn add_admin_tools<F, H>(client: &Client, form: &mut F, on_login: H) -> AdminOutcome
where
    F: LoginForm,
    H: FnOnce(),
{
    if client.authenticated() {
        on_login();
        return AdminOutcome::LoggedIn;
    }

    while let Some(credentials) = form.submit() {
        let attempt = match client.login(&credentials.username, &credentials.password) {
            Ok(attempt) => attempt,
            Err(e) => {
                tracing::debug!("Ignoring submission: {}", e);
                continue;
            }
        };

        match attempt.await {
            Ok(()) => {
                form.dismiss();
                on_login();
                return AdminOutcome::LoggedIn;
            }
            Err(e) => {
                tracing::warn!("Login failed with code {}", e.code());
                form.rejected(&e);
            }
        }
    }

    AdminOutcome::Abandoned
}
