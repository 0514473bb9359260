//! # switchscrape
//!
//! Async SSH CLI scraper for TP-Link managed switches.
//!
//! switchscrape drives the switch's interactive shell the way a person
//! would: it sends a command, reads until the prompt comes back, and hands
//! over the text in between. Stateless parsers turn that text into typed
//! records.
//!
//! ## Features
//!
//! - Async SSH connections via russh, with PTY and interactive shell
//! - Prompt detection on ANSI-stripped output, tolerant of split reads
//! - Automatic answer to the mid-session `Password:` prompt (e.g. `enable`)
//! - One caller-supplied deadline per operation
//! - Parsers for PoE, counters, status, MAC table, configuration, CPU and memory
//! - [`MockSession`] for testing code that talks to a switch
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use switchscrape::{Session, SessionBuilder};
//! use tokio::time::Instant;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), switchscrape::Error> {
//!     let mut session = SessionBuilder::new("192.168.0.1")
//!         .username("admin")
//!         .password("secret")
//!         .disable_paging()
//!         .build()?;
//!
//!     let deadline = Instant::now() + Duration::from_secs(15);
//!     session.connect(deadline).await?;
//!
//!     let response = session.run("show cpu-utilization", deadline).await?;
//!     let cpu = switchscrape::parser::parse_cpu_utilization(&response.result)?;
//!     println!("5s load: {}%", cpu.five_seconds);
//!
//!     session.close().await;
//!     Ok(())
//! }
//! ```

pub mod channel;
pub mod error;
pub mod parser;
pub mod session;
pub mod transport;

// Re-export main types for convenience
pub use channel::{PromptMatcher, PromptPattern};
pub use error::{Error, Result};
pub use session::{MockSession, Response, Session, SessionBuilder, SessionState, SwitchSession};
pub use transport::{AuthMethod, HostKeyVerification, SshConfig};
