//! Builder for creating switch sessions.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretString;

use super::switch::SwitchSession;
use crate::channel::{PromptMatcher, PromptPattern, PtyConfig};
use crate::error::{Result, SessionError};
use crate::transport::config::{AuthMethod, HostKeyVerification, SshConfig};

/// Commands that turn off output paging on the default switch family.
pub const DISABLE_PAGING_COMMANDS: &[&str] = &["enable", "config", "no clipaging", "exit"];

/// Builder for constructing switch sessions.
///
/// # Example
///
/// ```rust,no_run
/// use std::time::Duration;
/// use switchscrape::{Session, SessionBuilder};
/// use tokio::time::Instant;
///
/// # async fn example() -> Result<(), switchscrape::Error> {
/// let mut session = SessionBuilder::new("192.168.0.1")
///     .username("admin")
///     .password("secret")
///     .disable_paging()
///     .build()?;
///
/// let deadline = Instant::now() + Duration::from_secs(15);
/// session.connect(deadline).await?;
/// let response = session.run("show power inline information interface", deadline).await?;
/// let ports = switchscrape::parser::parse_poe_table(&response.result)?;
/// session.close().await;
/// # Ok(())
/// # }
/// ```
pub struct SessionBuilder {
    host: String,
    port: u16,
    username: Option<String>,
    auth: Option<AuthMethod>,
    enable_password: Option<SecretString>,
    timeout: Duration,
    terminal_width: u32,
    terminal_height: u32,
    host_key_verification: HostKeyVerification,
    known_hosts_path: Option<PathBuf>,
    matcher: Option<Arc<dyn PromptMatcher>>,
    pty_config: PtyConfig,
    on_open_commands: Vec<String>,
}

impl SessionBuilder {
    /// Create a new session builder for the specified host.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: 22,
            username: None,
            auth: None,
            enable_password: None,
            timeout: Duration::from_secs(5),
            terminal_width: 120,
            terminal_height: 40,
            host_key_verification: HostKeyVerification::default(),
            known_hosts_path: None,
            matcher: None,
            pty_config: PtyConfig::default(),
            on_open_commands: Vec::new(),
        }
    }

    /// Set the SSH port (default: 22).
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the username for authentication.
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Set password authentication.
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.auth = Some(AuthMethod::Password(SecretString::from(password.into())));
        self
    }

    /// Set private key authentication.
    pub fn private_key(mut self, key_path: impl Into<PathBuf>) -> Self {
        self.auth = Some(AuthMethod::PrivateKey {
            path: key_path.into(),
            passphrase: None,
        });
        self
    }

    /// Set private key authentication with a passphrase for an encrypted key.
    pub fn private_key_with_passphrase(
        mut self,
        key_path: impl Into<PathBuf>,
        passphrase: impl Into<String>,
    ) -> Self {
        self.auth = Some(AuthMethod::PrivateKey {
            path: key_path.into(),
            passphrase: Some(SecretString::from(passphrase.into())),
        });
        self
    }

    /// Set the password sent when the switch asks for one mid-session
    /// (e.g. after `enable`). Defaults to the login password.
    pub fn enable_password(mut self, password: impl Into<String>) -> Self {
        self.enable_password = Some(SecretString::from(password.into()));
        self
    }

    /// Set the SSH connect and inactivity timeout (default: 5s).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set terminal dimensions.
    pub fn terminal_size(mut self, width: u32, height: u32) -> Self {
        self.terminal_width = width;
        self.terminal_height = height;
        self
    }

    /// Set host key verification mode.
    pub fn host_key_verification(mut self, mode: HostKeyVerification) -> Self {
        self.host_key_verification = mode;
        self
    }

    /// Use a specific known_hosts file.
    pub fn known_hosts_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.known_hosts_path = Some(path.into());
        self
    }

    /// Replace the prompt strategy (default: [`PromptPattern::tplink`]).
    pub fn prompt_matcher(mut self, matcher: impl PromptMatcher + 'static) -> Self {
        self.matcher = Some(Arc::new(matcher));
        self
    }

    /// Set the line terminator sent after commands (default: `"\r\n"`).
    pub fn line_terminator(mut self, terminator: impl Into<String>) -> Self {
        self.pty_config.line_terminator = terminator.into();
        self
    }

    /// Add a command run once right after connecting.
    pub fn on_open_command(mut self, command: impl Into<String>) -> Self {
        self.on_open_commands.push(command.into());
        self
    }

    /// Turn off output paging on connect.
    pub fn disable_paging(mut self) -> Self {
        self.on_open_commands
            .extend(DISABLE_PAGING_COMMANDS.iter().map(|c| c.to_string()));
        self
    }

    /// Build the session.
    ///
    /// This creates the session but does not connect. Call `connect()` on
    /// the returned session to establish the connection.
    pub fn build(self) -> Result<SwitchSession> {
        let username = self.username.ok_or_else(|| SessionError::InvalidConfig {
            message: "Username is required".to_string(),
        })?;

        let auth = self.auth.ok_or_else(|| SessionError::InvalidConfig {
            message: "Password or private key is required".to_string(),
        })?;

        if self.pty_config.line_terminator.is_empty() {
            return Err(SessionError::InvalidConfig {
                message: "Line terminator must not be empty".to_string(),
            }
            .into());
        }

        let ssh_config = SshConfig {
            host: self.host,
            port: self.port,
            username,
            auth,
            timeout: self.timeout,
            terminal_width: self.terminal_width,
            terminal_height: self.terminal_height,
            host_key_verification: self.host_key_verification,
            known_hosts_path: self.known_hosts_path,
        };

        let matcher = self
            .matcher
            .unwrap_or_else(|| Arc::new(PromptPattern::tplink()));

        Ok(SwitchSession::new(
            ssh_config,
            matcher,
            self.pty_config,
            self.enable_password,
            self.on_open_commands,
        ))
    }
}

impl std::fmt::Debug for SessionBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionBuilder")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("timeout", &self.timeout)
            .field("on_open_commands", &self.on_open_commands)
            .finish_non_exhaustive()
    }
}
