//! Interactive shell channel: the read-cycle state machine.
//!
//! A CLI shell never says how long its answer is. The only end-of-output
//! signal is the prompt reappearing, so every read cycle accumulates bytes
//! and re-tests the whole normalized buffer after each chunk until the
//! prompt settles, the deadline passes, or the stream fails.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, trace, warn};
use secrecy::{ExposeSecret, SecretString};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::{Instant, timeout, timeout_at};

use super::buffer::OutputBuffer;
use super::patterns::PromptMatcher;
use crate::error::{ChannelError, Result, SessionError, TransportError};
use crate::session::{Response, SessionState};

/// Upper bound on how long `shutdown` waits for the stream to flush.
const SHUTDOWN_GRACE: Duration = Duration::from_millis(250);

/// Configuration for PTY channel behavior.
#[derive(Debug, Clone)]
pub struct PtyConfig {
    /// Appended to every command and to the secondary credential.
    pub line_terminator: String,

    /// Size of a single transport read.
    pub read_chunk: usize,
}

impl Default for PtyConfig {
    fn default() -> Self {
        Self {
            line_terminator: "\r\n".to_string(),
            read_chunk: 4096,
        }
    }
}

/// Outcome of a successful read cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptMatch {
    /// Normalized output received before the prompt line.
    pub output: String,

    /// The settled prompt.
    pub prompt: String,
}

/// Shell session over any duplex byte stream.
///
/// Owns the stream exclusively; exactly one read cycle runs at a time
/// because every operation takes `&mut self`.
pub struct PtyChannel<S> {
    stream: S,
    matcher: Arc<dyn PromptMatcher>,
    config: PtyConfig,
    secondary_credential: Option<SecretString>,
    state: SessionState,
}

impl<S> PtyChannel<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    /// Wrap a freshly opened shell stream.
    pub fn new(stream: S, matcher: Arc<dyn PromptMatcher>, config: PtyConfig) -> Self {
        Self {
            stream,
            matcher,
            config,
            secondary_credential: None,
            state: SessionState::Disconnected,
        }
    }

    /// Set the credential sent in answer to a secondary prompt.
    pub fn with_secondary_credential(mut self, credential: SecretString) -> Self {
        self.secondary_credential = Some(credential);
        self
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Drain the login banner and wait for the first settled prompt.
    ///
    /// Returns the banner text.
    pub async fn open(&mut self, deadline: Instant) -> Result<String> {
        match self.state {
            SessionState::Disconnected => {}
            SessionState::Closed => return Err(SessionError::Closed.into()),
            SessionState::Connecting => {
                return Err(SessionError::Unusable { state: self.state }.into());
            }
            SessionState::Ready | SessionState::Busy => {
                return Err(SessionError::AlreadyConnected.into());
            }
        }

        self.state = SessionState::Connecting;
        let matched = self.read_until_prompt(deadline).await?;
        debug!("initial prompt settled: {:?}", matched.prompt);
        self.state = SessionState::Ready;
        Ok(matched.output)
    }

    /// Send a command and collect everything up to the next prompt.
    ///
    /// On failure the channel stays `Busy`; it must be closed.
    pub async fn run(&mut self, command: &str, deadline: Instant) -> Result<Response> {
        self.ensure_ready()?;
        self.state = SessionState::Busy;

        let start = Instant::now();
        debug!("sending command: {:?}", command);
        let line = format!("{}{}", command, self.config.line_terminator);
        self.write_all(line.as_bytes(), deadline).await?;

        let matched = self.read_until_prompt(deadline).await?;
        let elapsed = start.elapsed();
        debug!(
            "command {:?} completed in {:?}, prompt={:?}",
            command, elapsed, matched.prompt
        );

        self.state = SessionState::Ready;
        Ok(Response::new(command, matched.output, matched.prompt, elapsed))
    }

    /// Shut down the write side without waiting on the peer.
    pub async fn shutdown(&mut self) {
        self.state = SessionState::Closed;
        match timeout(SHUTDOWN_GRACE, self.stream.shutdown()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => debug!("stream shutdown failed: {}", e),
            Err(_) => debug!("stream shutdown did not complete within {:?}", SHUTDOWN_GRACE),
        }
    }

    fn ensure_ready(&self) -> Result<()> {
        match self.state {
            SessionState::Ready => Ok(()),
            SessionState::Disconnected => Err(SessionError::NotConnected.into()),
            SessionState::Closed => Err(SessionError::Closed.into()),
            state => Err(SessionError::Unusable { state }.into()),
        }
    }

    /// One read cycle.
    ///
    /// The accumulator lives only for this call. A secondary prompt is
    /// answered at most once per cycle, and answering it discards everything
    /// received so far.
    async fn read_until_prompt(&mut self, deadline: Instant) -> Result<PromptMatch> {
        let start = Instant::now();
        let mut buffer = OutputBuffer::default();
        let mut chunk = vec![0u8; self.config.read_chunk.max(1)];
        let mut secondary_handled = false;

        loop {
            let n = match timeout_at(deadline, self.stream.read(&mut chunk)).await {
                Err(_) => return Err(self.timed_out(start, deadline, &buffer)),
                Ok(Err(e)) => return Err(ChannelError::Io(e).into()),
                Ok(Ok(0)) => {
                    // Nothing more can arrive; the prompt will never settle.
                    warn!(
                        "connection closed by peer before prompt, waiting out the deadline ({:?} left)",
                        deadline.saturating_duration_since(Instant::now())
                    );
                    tokio::time::sleep_until(deadline).await;
                    return Err(self.timed_out(start, deadline, &buffer));
                }
                Ok(Ok(n)) => n,
            };

            trace!("read {} bytes: {:?}", n, String::from_utf8_lossy(&chunk[..n]));
            buffer.extend(&chunk[..n]);
            let normalized = self.matcher.normalize(buffer.as_raw());

            if !secondary_handled && self.matcher.is_secondary_prompt(&normalized) {
                secondary_handled = true;
                if self.answer_secondary_prompt(deadline).await? {
                    buffer.clear();
                    continue;
                }
            }

            if let Some(range) = self.matcher.find_prompt(&normalized) {
                let mut end = range.start;
                while end > 0 && normalized[end - 1] == b'\n' {
                    end -= 1;
                }
                return Ok(PromptMatch {
                    output: String::from_utf8_lossy(&normalized[..end]).into_owned(),
                    prompt: String::from_utf8_lossy(&normalized[range]).trim().to_string(),
                });
            }
        }
    }

    /// Send the secondary credential. Returns false when none is configured.
    async fn answer_secondary_prompt(&mut self, deadline: Instant) -> Result<bool> {
        let Some(credential) = self.secondary_credential.as_ref() else {
            warn!("secondary password prompt seen but no credential configured");
            return Ok(false);
        };

        debug!("secondary password prompt detected, sending credential");
        let mut line = credential.expose_secret().as_bytes().to_vec();
        line.extend_from_slice(self.config.line_terminator.as_bytes());
        self.write_all(&line, deadline).await?;
        Ok(true)
    }

    async fn write_all(&mut self, data: &[u8], deadline: Instant) -> Result<()> {
        let start = Instant::now();
        let stream = &mut self.stream;
        let write = async move {
            stream.write_all(data).await?;
            stream.flush().await
        };

        match timeout_at(deadline, write).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(ChannelError::Io(e).into()),
            Err(_) => Err(TransportError::Timeout(deadline.saturating_duration_since(start)).into()),
        }
    }

    fn timed_out(
        &self,
        start: Instant,
        deadline: Instant,
        buffer: &OutputBuffer,
    ) -> crate::error::Error {
        let waited = deadline.saturating_duration_since(start);
        debug!(
            "no prompt within {:?}; discarding partial output: {:?}",
            waited,
            buffer.normalized_lossy().trim()
        );
        ChannelError::PromptTimeout(waited).into()
    }
}

impl<S> std::fmt::Debug for PtyChannel<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PtyChannel")
            .field("config", &self.config)
            .field("state", &self.state)
            .field(
                "secondary_credential",
                &self.secondary_credential.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio_test::io::Builder;

    use super::*;
    use crate::channel::PromptPattern;
    use crate::error::Error;

    fn channel<S>(stream: S) -> PtyChannel<S>
    where
        S: AsyncRead + AsyncWrite + Unpin + Send,
    {
        PtyChannel::new(stream, Arc::new(PromptPattern::tplink()), PtyConfig::default())
            .with_secondary_credential(SecretString::from("enable-secret".to_string()))
    }

    fn soon() -> Instant {
        Instant::now() + Duration::from_secs(5)
    }

    #[tokio::test]
    async fn test_open_drains_banner() {
        let mock = Builder::new()
            .read(b"\x1b[0mWelcome\r\n")
            .read(b"\r\nSG2210XMP-M2>")
            .build();
        let mut ch = channel(mock);

        let banner = ch.open(soon()).await.unwrap();
        assert_eq!(banner, "Welcome");
        assert_eq!(ch.state(), SessionState::Ready);
    }

    #[tokio::test]
    async fn test_run_returns_output_without_prompt() {
        let mock = Builder::new()
            .read(b"SG2210XMP-M2>")
            .write(b"show cpu\r\n")
            .read(b"show cpu\r\n| 1% 2% 3%\r\n")
            .read(b"SG2210XMP-M2>")
            .build();
        let mut ch = channel(mock);
        ch.open(soon()).await.unwrap();

        let response = ch.run("show cpu", soon()).await.unwrap();
        assert_eq!(response.result, "show cpu\n| 1% 2% 3%");
        assert_eq!(response.prompt, "SG2210XMP-M2>");
        assert_eq!(ch.state(), SessionState::Ready);
    }

    #[tokio::test]
    async fn test_prompt_split_across_reads() {
        let mock = Builder::new()
            .read(b"SG2210")
            .read(b"XMP-M2")
            .read(b"\x1b[0")
            .read(b"m#")
            .build();
        let mut ch = channel(mock);
        assert!(ch.open(soon()).await.is_ok());
    }

    #[tokio::test]
    async fn test_secondary_prompt_answered_once_and_cleared() {
        let mock = Builder::new()
            .read(b"SG2210XMP-M2>")
            .write(b"enable\r\n")
            .read(b"enable\r\nPassword:")
            .write(b"enable-secret\r\n")
            .read(b"\r\nPassword:\r\n")
            .read(b"\r\nSG2210XMP-M2#")
            .build();
        let mut ch = channel(mock);
        ch.open(soon()).await.unwrap();

        let response = ch.run("enable", soon()).await.unwrap();
        assert_eq!(response.result, "\nPassword:");
        assert_eq!(response.prompt, "SG2210XMP-M2#");
    }

    #[tokio::test]
    async fn test_run_before_open_is_rejected() {
        let mut ch = channel(Builder::new().build());
        let err = ch.run("show x", soon()).await.unwrap_err();
        assert!(matches!(err, Error::Session(SessionError::NotConnected)));
    }

    #[tokio::test]
    async fn test_read_error_leaves_channel_busy() {
        let mock = Builder::new()
            .read(b"SG2210XMP-M2>")
            .write(b"show x\r\n")
            .read_error(std::io::Error::other("reset"))
            .build();
        let mut ch = channel(mock);
        ch.open(soon()).await.unwrap();

        let err = ch.run("show x", soon()).await.unwrap_err();
        assert!(matches!(err, Error::Channel(ChannelError::Io(_))));
        assert_eq!(ch.state(), SessionState::Busy);

        let err = ch.run("show y", soon()).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Session(SessionError::Unusable {
                state: SessionState::Busy
            })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_without_prompt() {
        let (client, mut server) = tokio::io::duplex(1024);
        server.write_all(b"banner without prompt\r\n").await.unwrap();
        let mut ch = channel(client);

        let deadline = Instant::now() + Duration::from_millis(50);
        let err = ch.open(deadline).await.unwrap_err();
        assert!(err.is_timeout());
        assert_eq!(ch.state(), SessionState::Connecting);
        drop(server);
    }

    #[tokio::test(start_paused = true)]
    async fn test_end_of_stream_reports_timeout() {
        let (client, server) = tokio::io::duplex(64);
        drop(server);
        let mut ch = channel(client);

        let err = ch.open(Instant::now() + Duration::from_millis(50)).await.unwrap_err();
        assert!(matches!(err, Error::Channel(ChannelError::PromptTimeout(_))));
    }
}
