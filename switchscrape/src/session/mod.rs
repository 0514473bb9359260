//! Session layer: the public connect/run/close contract.
//!
//! [`Session`] is the capability a host process depends on. It is
//! implemented by [`SwitchSession`] (SSH to a real switch) and by
//! [`MockSession`] (scripted, in memory) so callers can be tested without
//! a device.

mod builder;
mod mock;
mod response;
mod switch;

pub use builder::{DISABLE_PAGING_COMMANDS, SessionBuilder};
pub use mock::MockSession;
pub use response::Response;
pub use switch::SwitchSession;

use std::future::Future;

use tokio::time::Instant;

use crate::error::{Result, SessionError};

/// Lifecycle of an interactive session.
///
/// ```text
/// Disconnected -> Connecting -> Ready <-> Busy
///                                 \
///                                  +-> Closed (from any state)
/// ```
///
/// A failed `connect` leaves the session `Connecting`; a failed or
/// abandoned `run` leaves it `Busy`. Both are terminal until `close`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Nothing opened yet.
    Disconnected,
    /// Transport opening or initial banner draining.
    Connecting,
    /// Prompt settled, ready for a command.
    Ready,
    /// A read cycle is in flight (or failed without recovery).
    Busy,
    /// Released.
    Closed,
}

/// Trait for interactive switch sessions.
pub trait Session: Send {
    /// Open the transport, start the shell and wait for the first prompt.
    fn connect(&mut self, deadline: Instant) -> impl Future<Output = Result<()>> + Send;

    /// Send a command and wait for the prompt.
    fn run(
        &mut self,
        command: &str,
        deadline: Instant,
    ) -> impl Future<Output = Result<Response>> + Send;

    /// Release the session. Safe to call in any state, any number of times.
    fn close(&mut self) -> impl Future<Output = ()> + Send;

    /// Current lifecycle state.
    fn state(&self) -> SessionState;

    /// Send multiple commands sequentially under one shared deadline.
    ///
    /// Stops at the first failure; the error names the failing command.
    fn run_commands(
        &mut self,
        commands: &[&str],
        deadline: Instant,
    ) -> impl Future<Output = Result<Vec<Response>>> + Send {
        async move {
            let mut responses = Vec::with_capacity(commands.len());
            for command in commands {
                let response = self.run(command, deadline).await.map_err(|e| {
                    SessionError::CommandFailed {
                        command: command.to_string(),
                        source: Box::new(e),
                    }
                })?;
                responses.push(response);
            }
            Ok(responses)
        }
    }

    /// Check if the session accepts commands.
    fn is_ready(&self) -> bool {
        self.state() == SessionState::Ready
    }
}
