//! In-memory session for testing code that drives a switch.

use std::collections::HashMap;
use std::time::Duration;

use tokio::time::Instant;

use super::response::Response;
use super::{Session, SessionState};
use crate::channel::{DEFAULT_DEVICE_ID, normalize};
use crate::error::{ChannelError, Result, SessionError, TransportError};

/// Scripted reaction to one command.
#[derive(Debug, Clone)]
enum Reply {
    /// Output followed by a prompt (None keeps the current prompt).
    Output { text: String, prompt: Option<String> },
    /// The device never answers; the call times out at its deadline.
    Hang,
}

/// Scripted stand-in for [`SwitchSession`](super::SwitchSession).
///
/// Follows the same lifecycle rules: a timed-out command leaves the session
/// `Busy`, and `close()` is always safe.
///
/// ```rust
/// use std::time::Duration;
/// use switchscrape::{MockSession, Session};
/// use tokio::time::Instant;
///
/// # async fn example() -> Result<(), switchscrape::Error> {
/// let mut session = MockSession::new()
///     .respond("show cpu-utilization", "| 3% 4% 5%");
/// let deadline = Instant::now() + Duration::from_secs(1);
/// session.connect(deadline).await?;
/// let response = session.run("show cpu-utilization", deadline).await?;
/// assert_eq!(response.result, "| 3% 4% 5%");
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct MockSession {
    replies: HashMap<String, Reply>,
    prompt: String,
    state: SessionState,
    fail_connect: bool,
    history: Vec<String>,
}

impl MockSession {
    /// Create a mock with the default user-mode prompt.
    pub fn new() -> Self {
        Self {
            replies: HashMap::new(),
            prompt: format!("{}>", DEFAULT_DEVICE_ID),
            state: SessionState::Disconnected,
            fail_connect: false,
            history: Vec::new(),
        }
    }

    /// Answer `command` with `output`.
    ///
    /// Output is normalized like real device output.
    pub fn respond(mut self, command: impl Into<String>, output: impl AsRef<[u8]>) -> Self {
        self.replies.insert(
            command.into(),
            Reply::Output {
                text: normalized(output.as_ref()),
                prompt: None,
            },
        );
        self
    }

    /// Answer `command` with `output` and switch to a new prompt.
    pub fn respond_with_prompt(
        mut self,
        command: impl Into<String>,
        output: impl AsRef<[u8]>,
        prompt: impl Into<String>,
    ) -> Self {
        self.replies.insert(
            command.into(),
            Reply::Output {
                text: normalized(output.as_ref()),
                prompt: Some(prompt.into()),
            },
        );
        self
    }

    /// Never answer `command`.
    pub fn hang_on(mut self, command: impl Into<String>) -> Self {
        self.replies.insert(command.into(), Reply::Hang);
        self
    }

    /// Make `connect` fail as if the transport could not be opened.
    pub fn fail_connect(mut self) -> Self {
        self.fail_connect = true;
        self
    }

    /// Commands received so far, in order.
    pub fn history(&self) -> &[String] {
        &self.history
    }
}

impl Default for MockSession {
    fn default() -> Self {
        Self::new()
    }
}

fn normalized(output: &[u8]) -> String {
    String::from_utf8_lossy(&normalize(output)).into_owned()
}

impl Session for MockSession {
    async fn connect(&mut self, _deadline: Instant) -> Result<()> {
        match self.state {
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
        if self.fail_connect {
            return Err(TransportError::AuthenticationFailed {
                user: "mock".to_string(),
            }
            .into());
        }
        self.state = SessionState::Ready;
        Ok(())
    }

    async fn run(&mut self, command: &str, deadline: Instant) -> Result<Response> {
        match self.state {
            SessionState::Ready => {}
            SessionState::Disconnected => return Err(SessionError::NotConnected.into()),
            SessionState::Closed => return Err(SessionError::Closed.into()),
            state => return Err(SessionError::Unusable { state }.into()),
        }

        let start = Instant::now();
        self.state = SessionState::Busy;
        self.history.push(command.to_string());

        match self.replies.get(command).cloned() {
            Some(Reply::Hang) => {
                tokio::time::sleep_until(deadline).await;
                Err(ChannelError::PromptTimeout(deadline.saturating_duration_since(start)).into())
            }
            Some(Reply::Output { text, prompt }) => {
                if let Some(prompt) = prompt {
                    self.prompt = prompt;
                }
                self.state = SessionState::Ready;
                Ok(Response::new(command, text, self.prompt.clone(), start.elapsed()))
            }
            None => {
                self.state = SessionState::Ready;
                Ok(Response::new(command, "", self.prompt.clone(), Duration::ZERO))
            }
        }
    }

    async fn close(&mut self) {
        self.state = SessionState::Closed;
    }

    fn state(&self) -> SessionState {
        self.state
    }
}
