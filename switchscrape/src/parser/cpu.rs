//! `show cpu-utilization`

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use super::parse_field;
use crate::error::ParseError;

/// CPU load averages in percent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CpuUtilization {
    pub five_seconds: u32,
    pub one_minute: u32,
    pub five_minutes: u32,
}

static CPU_ROW: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\|\s*(\d+)%\s*\|?\s*(\d+)%\s*\|?\s*(\d+)%").expect("static regex")
});

/// Parse the first utilization row.
///
/// ```text
/// Unit | Five Seconds | One Minute | Five Minutes
/// -----+--------------+------------+-------------
/// 1    | 10%          | 20%        | 30%
/// ```
pub fn parse_cpu_utilization(output: &str) -> Result<CpuUtilization, ParseError> {
    for line in output.lines() {
        let Some(caps) = CPU_ROW.captures(line) else {
            continue;
        };
        let line = line.trim();
        return Ok(CpuUtilization {
            five_seconds: parse_field(line, "five_seconds", &caps[1])?,
            one_minute: parse_field(line, "one_minute", &caps[2])?,
            five_minutes: parse_field(line, "five_minutes", &caps[3])?,
        });
    }

    Err(ParseError::NoMatch {
        table: "CPU utilization",
    })
}
