//! `show interface counters`

use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;

use super::parse_field;
use crate::error::ParseError;

/// Counter name to value for one port.
pub type InterfaceCounters = IndexMap<String, u64>;

/// Counters per port, in the order the switch listed them.
pub type InterfaceStats = IndexMap<String, InterfaceCounters>;

static COUNTER_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([\w\- /]+):\s+([\d,]+)$").expect("static regex"));

/// Parse per-port counter blocks.
///
/// ```text
/// Port: Gi1/0/1
///   InOctets:       1,234,567
///   InUcastPkts:    8,910
/// ```
///
/// Counter lines before the first `Port:` header are ignored, as are lines
/// whose value is not digits and commas.
pub fn parse_interface_counters(output: &str) -> Result<InterfaceStats, ParseError> {
    let mut stats = InterfaceStats::new();
    let mut current: Option<String> = None;

    for line in output.lines() {
        let line = line.trim();

        if let Some(port) = line.strip_prefix("Port:") {
            let port = port.trim().to_string();
            stats.insert(port.clone(), InterfaceCounters::new());
            current = Some(port);
            continue;
        }

        let Some(port) = current.as_ref() else {
            continue;
        };

        if let Some(caps) = COUNTER_LINE.captures(line) {
            let key = caps[1].trim();
            let value: u64 = parse_field(line, key, &caps[2].replace(',', ""))?;
            if let Some(counters) = stats.get_mut(port) {
                counters.insert(key.to_string(), value);
            }
        }
    }

    Ok(stats)
}
