//! `show interface status`

use serde::Serialize;

use super::is_interface_name;
use crate::error::ParseError;

/// Link state of one port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InterfaceStatus {
    pub port: String,
    pub status: String,
    pub speed: String,
    pub duplex: String,
    pub flow_control: String,
    pub medium: Option<String>,
}

/// Parse the interface status table.
///
/// ```text
/// Port      Status    Speed    Duplex   FlowCtrl   Active-Medium
/// --------  ------    -----    ------   --------   -------------
/// Gi1/0/1   LinkDown  N/A      N/A      N/A        Copper
/// Tw1/0/1   LinkUp    2500M    Full     Disable    Copper
/// ```
pub fn parse_interface_status(output: &str) -> Result<Vec<InterfaceStatus>, ParseError> {
    let rows = output
        .lines()
        .filter_map(|line| {
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() < 5 || !is_interface_name(fields[0]) {
                return None;
            }
            Some(InterfaceStatus {
                port: fields[0].to_string(),
                status: fields[1].to_string(),
                speed: fields[2].to_string(),
                duplex: fields[3].to_string(),
                flow_control: fields[4].to_string(),
                medium: fields.get(5).map(|m| m.to_string()),
            })
        })
        .collect();

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_table() {
        let output = "\
Port      Status    Speed    Duplex   FlowCtrl   Active-Medium
--------  ------    -----    ------   --------   -------------
Gi1/0/1   LinkDown  N/A      N/A      N/A        Copper
Tw1/0/1   LinkUp    2500M    Full     Disable
Tw1/0/2   LinkUp
";
        let rows = parse_interface_status(output).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].port, "Gi1/0/1");
        assert_eq!(rows[0].medium.as_deref(), Some("Copper"));
        assert_eq!(rows[1].speed, "2500M");
        assert_eq!(rows[1].medium, None);
    }
}
