//! `show interface configuration`

use serde::Serialize;

use super::is_interface_name;
use crate::error::ParseError;

/// Administrative settings of one port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InterfaceConfig {
    pub port: String,
    pub state: String,
    pub speed: String,
    pub duplex: String,
    pub flow_control: String,
    pub description: Option<String>,
}

/// Parse the interface configuration table.
///
/// ```text
/// Port      State    Speed    Duplex   FlowCtrl   Description
/// -------   -----    -----    ------   --------   -----------
/// Gi1/0/1   Enable   Auto     Auto     Disable
/// Tw1/0/1   Enable   2500M    Full     Disable    uplink to core
/// ```
pub fn parse_interface_config(output: &str) -> Result<Vec<InterfaceConfig>, ParseError> {
    let mut rows = Vec::new();

    for line in output.lines() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 5 || !is_interface_name(fields[0]) {
            continue;
        }

        let description = (fields.len() > 5).then(|| fields[5..].join(" "));
        rows.push(InterfaceConfig {
            port: fields[0].to_string(),
            state: fields[1].to_string(),
            speed: fields[2].to_string(),
            duplex: fields[3].to_string(),
            flow_control: fields[4].to_string(),
            description,
        });
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_table() {
        let output = "\
Port      State    Speed    Duplex   FlowCtrl   Description
-------   -----    -----    ------   --------   -----------
Gi1/0/1   Enable   Auto     Auto     Disable
Tw1/0/1   Enable   2500M    Full     Disable    uplink to core
";
        let rows = parse_interface_config(output).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].description, None);
        assert_eq!(rows[1].description.as_deref(), Some("uplink to core"));
        assert_eq!(rows[1].flow_control, "Disable");
    }
}
