//! Channel layer: prompt detection and the interactive read cycle.
//!
//! This module handles the interactive shell session, including
//! pattern-based prompt detection and ANSI stripping.

mod buffer;
mod patterns;
mod pty;

pub use buffer::OutputBuffer;
pub use patterns::{
    DEFAULT_DEVICE_ID, DEFAULT_SECONDARY_PROMPT, PromptMatcher, PromptPattern,
    compile_prompt_pattern, normalize, strip_ansi,
};
pub use pty::{PromptMatch, PtyChannel, PtyConfig};
