//! SSH-backed session to a real switch.

use std::sync::Arc;

use log::{debug, info, warn};
use secrecy::{ExposeSecret, SecretString};
use tokio::time::Instant;

use super::response::Response;
use super::{Session, SessionState};
use crate::channel::{PromptMatcher, PtyChannel, PtyConfig};
use crate::error::{Result, SessionError};
use crate::transport::{ShellStream, SshConfig, SshTransport};

/// Session to a switch over SSH.
///
/// Created by [`SessionBuilder`](super::SessionBuilder). Handles:
/// - SSH transport and interactive shell lifecycle
/// - Initial banner drain and optional on-open commands
/// - The per-command read cycle, including the enable password interjection
pub struct SwitchSession {
    /// SSH configuration.
    ssh_config: SshConfig,

    /// Prompt strategy shared with the channel.
    matcher: Arc<dyn PromptMatcher>,

    /// Channel behavior.
    pty_config: PtyConfig,

    /// Credential for secondary (enable) prompts; falls back to the login password.
    enable_password: Option<SecretString>,

    /// Commands run once after the first prompt.
    on_open_commands: Vec<String>,

    /// SSH transport (None when disconnected).
    transport: Option<SshTransport>,

    /// Interactive shell (None until the shell starts).
    channel: Option<PtyChannel<ShellStream>>,

    /// State while no channel exists.
    state: SessionState,

    /// Banner text drained on connect.
    banner: Option<String>,
}

impl SwitchSession {
    pub(crate) fn new(
        ssh_config: SshConfig,
        matcher: Arc<dyn PromptMatcher>,
        pty_config: PtyConfig,
        enable_password: Option<SecretString>,
        on_open_commands: Vec<String>,
    ) -> Self {
        Self {
            ssh_config,
            matcher,
            pty_config,
            enable_password,
            on_open_commands,
            transport: None,
            channel: None,
            state: SessionState::Disconnected,
            banner: None,
        }
    }

    /// Banner received before the first prompt, once connected.
    pub fn banner(&self) -> Option<&str> {
        self.banner.as_deref()
    }

    /// SSH configuration in use.
    pub fn ssh_config(&self) -> &SshConfig {
        &self.ssh_config
    }

    fn secondary_credential(&self) -> Option<SecretString> {
        self.enable_password
            .as_ref()
            .or_else(|| self.ssh_config.auth.password())
            .map(|secret| SecretString::from(secret.expose_secret().to_string()))
    }
}

impl Session for SwitchSession {
    async fn connect(&mut self, deadline: Instant) -> Result<()> {
        match self.state() {
            SessionState::Disconnected => {}
            SessionState::Closed => return Err(SessionError::Closed.into()),
            SessionState::Connecting => {
                return Err(SessionError::Unusable {
                    state: SessionState::Connecting,
                }
                .into());
            }
            SessionState::Ready | SessionState::Busy => {
                return Err(SessionError::AlreadyConnected.into());
            }
        }

        self.state = SessionState::Connecting;

        let transport = SshTransport::connect(&self.ssh_config, deadline).await?;
        // Keep the transport before the shell can fail so close() releases it.
        let transport = self.transport.insert(transport);
        let stream = transport.open_shell(deadline).await?;

        let mut channel = PtyChannel::new(stream, self.matcher.clone(), self.pty_config.clone());
        if let Some(credential) = self.secondary_credential() {
            channel = channel.with_secondary_credential(credential);
        }
        let channel = self.channel.insert(channel);

        let banner = channel.open(deadline).await?;
        debug!("banner: {:?}", banner);
        self.banner = Some(banner);

        for command in self.on_open_commands.clone() {
            self.run(&command, deadline)
                .await
                .map_err(|e| SessionError::CommandFailed {
                    command,
                    source: Box::new(e),
                })?;
        }

        info!("session to {} ready", self.ssh_config.socket_addr());
        Ok(())
    }

    async fn run(&mut self, command: &str, deadline: Instant) -> Result<Response> {
        match self.channel.as_mut() {
            Some(channel) => channel.run(command, deadline).await,
            None => Err(match self.state {
                SessionState::Closed => SessionError::Closed,
                SessionState::Disconnected => SessionError::NotConnected,
                state => SessionError::Unusable { state },
            }
            .into()),
        }
    }

    async fn close(&mut self) {
        let was = self.state();
        self.state = SessionState::Closed;

        if let Some(mut channel) = self.channel.take() {
            channel.shutdown().await;
        }
        if let Some(transport) = self.transport.take() {
            transport.close().await;
        }

        if was != SessionState::Closed {
            debug!("session to {} closed from {:?}", self.ssh_config.socket_addr(), was);
        }
    }

    fn state(&self) -> SessionState {
        match (&self.channel, self.state) {
            (_, SessionState::Closed) => SessionState::Closed,
            (Some(channel), _) => channel.state(),
            (None, state) => state,
        }
    }
}

impl Drop for SwitchSession {
    fn drop(&mut self) {
        if self.transport.is_some() {
            warn!(
                "session to {} dropped without close()",
                self.ssh_config.socket_addr()
            );
        }
    }
}

impl std::fmt::Debug for SwitchSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SwitchSession")
            .field("ssh_config", &self.ssh_config)
            .field("pty_config", &self.pty_config)
            .field("on_open_commands", &self.on_open_commands)
            .field("state", &self.state())
            .finish()
    }
}
