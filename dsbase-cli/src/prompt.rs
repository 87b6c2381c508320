//! Terminal login form

use std::io::{self, BufRead, Write};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use dsbase_core::{ApiError, Credentials, LoginForm};

/// Maximum submissions before giving up
const MAX_ATTEMPTS: usize = 3;

/// What a key press does to a hidden entry
#[derive(Debug, PartialEq, Eq)]
enum Entry {
    Editing,
    Done,
    Cancelled,
}

/// Apply one key to the hidden buffer
fn apply_key(buffer: &mut String, key: KeyEvent) -> Entry {
    match key.code {
        KeyCode::Char('c') | KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            Entry::Cancelled
        }
        KeyCode::Esc => Entry::Cancelled,
        KeyCode::Enter => Entry::Done,
        KeyCode::Backspace => {
            buffer.pop();
            Entry::Editing
        }
        KeyCode::Char(c) => {
            buffer.push(c);
            Entry::Editing
        }
        _ => Entry::Editing,
    }
}

/// Leaves raw mode when dropped
struct RawMode;

impl RawMode {
    fn enter() -> io::Result<Self> {
        enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
    }
}

pub struct TerminalForm {
    username: Option<String>,
    attempts: usize,
}

impl TerminalForm {
    pub fn new(username: Option<String>) -> Self {
        Self {
            username,
            attempts: 0,
        }
    }

    fn ask(label: &str) -> Option<String> {
        print!("{}: ", label);
        io::stdout().flush().ok()?;
        Self::read_line()
    }

    fn read_line() -> Option<String> {
        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line.trim_end_matches(['\r', '\n']).to_string()),
        }
    }

    /// Read a secret without echoing it
    ///
    /// Falls back to a plain line read when stdin is not a terminal.
    fn ask_hidden(label: &str) -> Option<String> {
        print!("{}: ", label);
        io::stdout().flush().ok()?;

        let raw = match RawMode::enter() {
            Ok(raw) => raw,
            Err(e) => {
                tracing::debug!("Raw mode unavailable ({}), reading a plain line", e);
                return Self::read_line();
            }
        };

        let mut secret = String::new();
        let outcome = loop {
            let key = match event::read() {
                Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => key,
                Ok(_) => continue,
                Err(e) => {
                    tracing::warn!("Failed to read key: {}", e);
                    break Entry::Cancelled;
                }
            };
            match apply_key(&mut secret, key) {
                Entry::Editing => {}
                done => break done,
            }
        };
        drop(raw);
        println!();

        match outcome {
            Entry::Done => Some(secret),
            _ => None,
        }
    }
}

impl LoginForm for TerminalForm {
    fn submit(&mut self) -> Option<Credentials> {
        if self.attempts >= MAX_ATTEMPTS {
            return None;
        }
        self.attempts += 1;

        let username = match &self.username {
            Some(username) => username.clone(),
            None => Self::ask("Username")?,
        };
        let password = Self::ask_hidden("Password")?;

        Some(Credentials { username, password })
    }

    fn rejected(&mut self, error: &ApiError) {
        eprintln!("Login failed ({})", error.code());
    }

    fn dismiss(&mut self) {
        tracing::debug!("Login form dismissed after {} attempt(s)", self.attempts);
    }
}
