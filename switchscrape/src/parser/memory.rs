//! `show memory-utilization`

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use super::parse_field;
use crate::error::ParseError;

/// Memory in use, in percent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MemoryUtilization {
    pub percent: u32,
}

static MEMORY_ROW: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\|\s*(\d+)%\s*$").expect("static regex"));

/// Parse the first row ending in `| N%`.
///
/// ```text
/// Unit | Current Memory Utilization
/// -----+---------------------------
/// 1    | 47%
/// ```
pub fn parse_memory_utilization(output: &str) -> Result<MemoryUtilization, ParseError> {
    for line in output.lines().map(str::trim) {
        if let Some(caps) = MEMORY_ROW.captures(line) {
            return Ok(MemoryUtilization {
                percent: parse_field(line, "percent", &caps[1])?,
            });
        }
    }

    Err(ParseError::NoMatch {
        table: "memory utilization",
    })
}
