//! SSH transport implementation using russh.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use log::{debug, info, warn};
use russh::client::{self, Handle, Msg};
use russh::keys::{PrivateKeyWithHashAlg, PublicKey, load_secret_key};
use russh::{ChannelStream, Pty};
use secrecy::ExposeSecret;
use tokio::time::{Instant, timeout, timeout_at};

use super::config::{AuthMethod, HostKeyVerification, SshConfig};
use crate::error::{ChannelError, Result, TransportError};

/// Interactive shell as a duplex byte stream.
pub type ShellStream = ChannelStream<Msg>;

/// How long `close` lets the disconnect message take before giving up.
const DISCONNECT_GRACE: Duration = Duration::from_millis(500);

/// Terminal modes requested with the PTY: local echo on, 14400 baud.
const TERMINAL_MODES: &[(Pty, u32)] = &[
    (Pty::ECHO, 1),
    (Pty::TTY_OP_ISPEED, 14400),
    (Pty::TTY_OP_OSPEED, 14400),
];

/// SSH transport wrapping russh client.
pub struct SshTransport {
    /// The russh session handle.
    session: Handle<SshHandler>,

    /// Terminal size requested for the shell.
    terminal_width: u32,
    terminal_height: u32,
}

impl SshTransport {
    /// Connect to the SSH server and authenticate.
    ///
    /// Bounded by both `config.timeout` and `deadline`, whichever is sooner.
    pub async fn connect(config: &SshConfig, deadline: Instant) -> Result<Self> {
        let ssh_config = Arc::new(client::Config {
            inactivity_timeout: Some(config.timeout),
            ..Default::default()
        });

        let host_key_error: Arc<Mutex<Option<TransportError>>> = Arc::new(Mutex::new(None));

        let handler = SshHandler {
            host: config.host.clone(),
            port: config.port,
            host_key_verification: config.host_key_verification.clone(),
            known_hosts_path: config.known_hosts_path.clone(),
            host_key_error: host_key_error.clone(),
        };

        let start = Instant::now();
        let deadline = deadline.min(start + config.timeout);
        info!("connecting to {}", config.socket_addr());

        let mut session = timeout_at(
            deadline,
            client::connect(ssh_config, (config.host.as_str(), config.port), handler),
        )
        .await
        .map_err(|_| TransportError::Timeout(deadline.saturating_duration_since(start)))?
        .map_err(|e| {
            // Prefer the detailed host-key error recorded by the handler
            // over russh's generic UnknownKey.
            let detailed = host_key_error.lock().ok().and_then(|mut slot| slot.take());
            detailed.unwrap_or(TransportError::ConnectionFailed {
                host: config.host.clone(),
                port: config.port,
                source: e,
            })
        })?;

        timeout_at(deadline, Self::authenticate(&mut session, config))
            .await
            .map_err(|_| TransportError::Timeout(deadline.saturating_duration_since(start)))??;

        info!("authenticated to {} as '{}'", config.socket_addr(), config.username);

        Ok(Self {
            session,
            terminal_width: config.terminal_width,
            terminal_height: config.terminal_height,
        })
    }

    /// Open a session channel, request a PTY and start the shell.
    pub async fn open_shell(&self, deadline: Instant) -> Result<ShellStream> {
        let start = Instant::now();
        let elapsed = || TransportError::Timeout(deadline.saturating_duration_since(start));

        let channel = timeout_at(deadline, self.session.channel_open_session())
            .await
            .map_err(|_| elapsed())?
            .map_err(TransportError::Ssh)?;

        timeout_at(
            deadline,
            channel.request_pty(
                true,
                "xterm",
                self.terminal_width,
                self.terminal_height,
                0,
                0,
                TERMINAL_MODES,
            ),
        )
        .await
        .map_err(|_| elapsed())?
        .map_err(ChannelError::PtyOpenFailed)?;

        timeout_at(deadline, channel.request_shell(true))
            .await
            .map_err(|_| elapsed())?
            .map_err(ChannelError::ShellRequestFailed)?;

        debug!("interactive shell started");
        Ok(channel.into_stream())
    }

    /// Authenticate with the server.
    async fn authenticate(session: &mut Handle<SshHandler>, config: &SshConfig) -> Result<()> {
        let success = match &config.auth {
            AuthMethod::Password(password) => session
                .authenticate_password(&config.username, password.expose_secret())
                .await
                .map_err(TransportError::Ssh)?
                .success(),
            AuthMethod::PrivateKey { path, passphrase } => {
                let key = load_secret_key(path, passphrase.as_ref().map(|p| p.expose_secret()))
                    .map_err(|e| TransportError::Key(format!("{}: {}", path.display(), e)))?;

                let hash_alg = session
                    .best_supported_rsa_hash()
                    .await
                    .map_err(TransportError::Ssh)?
                    .flatten();

                session
                    .authenticate_publickey(
                        &config.username,
                        PrivateKeyWithHashAlg::new(Arc::new(key), hash_alg),
                    )
                    .await
                    .map_err(TransportError::Ssh)?
                    .success()
            }
        };

        if !success {
            return Err(TransportError::AuthenticationFailed {
                user: config.username.clone(),
            }
            .into());
        }

        Ok(())
    }

    /// Send a disconnect without waiting for the peer to acknowledge it.
    pub async fn close(self) {
        let disconnect = self
            .session
            .disconnect(russh::Disconnect::ByApplication, "", "en");
        match timeout(DISCONNECT_GRACE, disconnect).await {
            Ok(Ok(())) => info!("disconnected"),
            Ok(Err(e)) => warn!("disconnect failed: {}", e),
            Err(_) => warn!("disconnect not sent within {:?}", DISCONNECT_GRACE),
        }
    }
}

/// SSH client handler for russh.
struct SshHandler {
    host: String,
    port: u16,
    host_key_verification: HostKeyVerification,
    known_hosts_path: Option<PathBuf>,
    /// Stores a detailed host-key error so connect() can surface it
    /// instead of the generic russh::Error::UnknownKey.
    host_key_error: Arc<Mutex<Option<TransportError>>>,
}

impl SshHandler {
    /// Check the host key against known_hosts.
    ///
    /// Returns `Ok(true)` if matched, `Ok(false)` if host not found,
    /// `Err(TransportError::HostKeyChanged)` if key changed.
    fn check_known_hosts(&self, pubkey: &PublicKey) -> std::result::Result<bool, TransportError> {
        let result = if let Some(ref path) = self.known_hosts_path {
            russh::keys::check_known_hosts_path(&self.host, self.port, pubkey, path)
        } else {
            russh::keys::check_known_hosts(&self.host, self.port, pubkey)
        };

        match result {
            Ok(matched) => Ok(matched),
            Err(russh::keys::Error::KeyChanged { line }) => Err(TransportError::HostKeyChanged {
                host: self.host.clone(),
                port: self.port,
                line,
            }),
            Err(e) => Err(TransportError::KnownHosts(e.to_string())),
        }
    }

    /// Save a new host key to known_hosts.
    fn learn_host_key(&self, pubkey: &PublicKey) -> std::result::Result<(), TransportError> {
        let result = if let Some(ref path) = self.known_hosts_path {
            russh::keys::known_hosts::learn_known_hosts_path(&self.host, self.port, pubkey, path)
        } else {
            russh::keys::known_hosts::learn_known_hosts(&self.host, self.port, pubkey)
        };

        result.map_err(|e| TransportError::KnownHosts(e.to_string()))
    }

    fn reject(&self, error: TransportError) -> bool {
        if let Ok(mut slot) = self.host_key_error.lock() {
            *slot = Some(error);
        }
        false
    }
}

impl client::Handler for SshHandler {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &PublicKey,
    ) -> std::result::Result<bool, Self::Error> {
        let accepted = match self.host_key_verification {
            HostKeyVerification::Disabled => true,

            HostKeyVerification::AcceptNew => match self.check_known_hosts(server_public_key) {
                Ok(true) => true,
                Ok(false) => {
                    if let Err(e) = self.learn_host_key(server_public_key) {
                        warn!("Failed to save host key: {}", e);
                    }
                    true
                }
                Err(e) => self.reject(e),
            },

            HostKeyVerification::Strict => match self.check_known_hosts(server_public_key) {
                Ok(true) => true,
                Ok(false) => self.reject(TransportError::HostKeyUnknown {
                    host: self.host.clone(),
                    port: self.port,
                }),
                Err(e) => self.reject(e),
            },
        };

        Ok(accepted)
    }
}
