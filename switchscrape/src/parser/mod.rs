//! Table parsers for switch CLI output.
//!
//! Each parser is a stateless function over one command's normalized
//! output. Rows that do not have the expected shape are skipped. Rows that
//! do have it but carry a malformed number are errors.

mod config;
mod counters;
mod cpu;
mod mac_table;
mod memory;
mod poe;
mod status;

pub use config::{InterfaceConfig, parse_interface_config};
pub use counters::{InterfaceCounters, InterfaceStats, parse_interface_counters};
pub use cpu::{CpuUtilization, parse_cpu_utilization};
pub use mac_table::{MacEntry, parse_mac_table};
pub use memory::{MemoryUtilization, parse_memory_utilization};
pub use poe::{PoePort, parse_poe_table};
pub use status::{InterfaceStatus, parse_interface_status};

use std::sync::LazyLock;

use regex::Regex;

use crate::error::ParseError;

/// Port names such as `Gi1/0/1`, `Tw1/0/10` or `Te1/1`.
static INTERFACE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z]+\d+(?:/\d+){1,2}$").expect("static regex"));

/// Whether a field looks like a switch port name.
pub(crate) fn is_interface_name(field: &str) -> bool {
    INTERFACE_NAME.is_match(field)
}

/// Parse a number, reporting the offending line and field on failure.
pub(crate) fn parse_field<T>(line: &str, field: &str, value: &str) -> Result<T, ParseError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e: T::Err| ParseError::InvalidField {
            line: line.to_string(),
            field: field.to_string(),
            reason: e.to_string(),
        })
}
