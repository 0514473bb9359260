//! SSH transport layer wrapping russh.
//!
//! Establishes the encrypted, authenticated connection and hands the
//! session layer an interactive shell as a plain duplex byte stream.

pub mod config;
mod ssh;

pub use config::{AuthMethod, HostKeyVerification, SshConfig};
pub use ssh::{ShellStream, SshTransport};
