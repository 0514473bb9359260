//! `show mac address-table`

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use super::parse_field;
use crate::error::ParseError;

/// One learned or static MAC address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MacEntry {
    pub mac: String,
    pub vlan: u16,
    pub port: String,
    pub entry_type: String,
    pub aging: Option<String>,
}

static MAC_ADDRESS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9A-Fa-f]{2}(?:[:-][0-9A-Fa-f]{2}){5}$").expect("static regex")
});

/// Parse the MAC address table.
///
/// ```text
/// MAC Address        VLAN    Port      Type      Aging
/// -----------------  ----    --------  -------   -----
/// 00:0a:eb:13:a2:01  1       Gi1/0/1   dynamic   Aging
/// Total MAC Addresses for this criterion: 1
/// ```
///
/// Rows start with a MAC address and have at least four fields. A VLAN
/// column that is not a `u16` fails the whole call.
pub fn parse_mac_table(output: &str) -> Result<Vec<MacEntry>, ParseError> {
    let mut entries = Vec::new();

    for line in output.lines() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 4 || !MAC_ADDRESS.is_match(fields[0]) {
            continue;
        }

        entries.push(MacEntry {
            mac: fields[0].to_lowercase(),
            vlan: parse_field(line.trim(), "vlan", fields[1])?,
            port: fields[2].to_string(),
            entry_type: fields[3].to_string(),
            aging: fields.get(4).map(|a| a.to_string()),
        });
    }

    Ok(entries)
}
