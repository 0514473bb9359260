//! `show power inline information interface`

use indexmap::IndexMap;
use serde::Serialize;

use crate::error::ParseError;

/// Power-over-ethernet details for one port.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PoePort {
    pub power_watts: f64,
    pub current_ma: u32,
    pub voltage_v: f64,
    pub pd_class: String,
    pub status: String,
}

/// Parse the PoE table into ports keyed by interface name.
///
/// ```text
/// Interface  Power(W)  Current(mA)  Voltage(V)  PD-Class  Power-Status
/// ---------  --------  -----------  ----------  --------  ------------
/// Tw1/0/1    4.2       84           52.0        Class1    ON
/// ```
///
/// Rows start with `Tw` and have at least six fields; the PD class may span
/// several fields. Unlike the other tables, any eligible row with a bad
/// number fails the whole call.
pub fn parse_poe_table(output: &str) -> Result<IndexMap<String, PoePort>, ParseError> {
    let mut ports = IndexMap::new();

    for line in output.lines() {
        let line = line.trim();
        if !line.starts_with("Tw") {
            continue;
        }
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 6 {
            continue;
        }

        let invalid = || ParseError::InvalidRow {
            line: line.to_string(),
        };
        let power_watts = fields[1].parse::<f64>().map_err(|_| invalid())?;
        let current_ma = fields[2].parse::<u32>().map_err(|_| invalid())?;
        let voltage_v = fields[3].parse::<f64>().map_err(|_| invalid())?;

        let last = fields.len() - 1;
        ports.insert(
            fields[0].to_string(),
            PoePort {
                power_watts,
                current_ma,
                voltage_v,
                pd_class: fields[4..last].join(" "),
                status: fields[last].to_string(),
            },
        );
    }

    Ok(ports)
}
