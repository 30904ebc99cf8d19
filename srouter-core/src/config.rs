use crate::{RouteEntry, RouterError, RoutingTable};
use srouter_packets::MacAddr;
use std::fs;
use std::net::Ipv4Addr;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

/// An interface as written in the interface file. The link address is optional; when it is
/// missing, the caller has to ask the operating system for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceConfig {
    pub name: String,
    pub ip: Ipv4Addr,
    pub mac: Option<MacAddr>,
}

/// Reads a routing table file: one `destination gateway mask interface` entry per line.
pub fn load_routing_table<P: AsRef<Path>>(path: P) -> Result<RoutingTable, RouterError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;
    let table = parse_routing_table(&path.display().to_string(), &contents)?;
    debug!(file = %path.display(), routes = table.len(), "loaded routing table");
    Ok(table)
}

/// Parses the contents of a routing table file. `file` only labels errors.
pub fn parse_routing_table(file: &str, contents: &str) -> Result<RoutingTable, RouterError> {
    let mut table = RoutingTable::default();
    for (line_no, fields) in significant_lines(contents) {
        let error = |reason: String| RouterError::Parse {
            file: String::from(file),
            line: line_no,
            reason,
        };

        if fields.len() != 4 {
            return Err(error(format!(
                "expected `destination gateway mask interface`, found {} fields",
                fields.len()
            )));
        }
        let destination = parse_addr(fields[0], "destination").map_err(error)?;
        let gateway = parse_addr(fields[1], "gateway").map_err(error)?;
        let mask = parse_addr(fields[2], "mask").map_err(error)?;
        table.push(RouteEntry::new(destination, gateway, mask, fields[3]));
    }
    Ok(table)
}

/// Reads an interface file: one `name ipv4 [mac]` entry per line.
pub fn load_interfaces<P: AsRef<Path>>(path: P) -> Result<Vec<InterfaceConfig>, RouterError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;
    let interfaces = parse_interfaces(&path.display().to_string(), &contents)?;
    debug!(file = %path.display(), interfaces = interfaces.len(), "loaded interfaces");
    Ok(interfaces)
}

pub fn parse_interfaces(file: &str, contents: &str) -> Result<Vec<InterfaceConfig>, RouterError> {
    let mut interfaces = Vec::new();
    for (line_no, fields) in significant_lines(contents) {
        let error = |reason: String| RouterError::Parse {
            file: String::from(file),
            line: line_no,
            reason,
        };

        if fields.len() != 2 && fields.len() != 3 {
            return Err(error(format!(
                "expected `name ipv4 [mac]`, found {} fields",
                fields.len()
            )));
        }
        let ip = parse_addr(fields[1], "address").map_err(error)?;
        let mac = match fields.get(2) {
            Some(mac) => Some(
                MacAddr::from_str(mac)
                    .map_err(|reason| error(format!("invalid link address `{}`: {}", mac, reason)))?,
            ),
            None => None,
        };
        interfaces.push(InterfaceConfig {
            name: String::from(fields[0]),
            ip,
            mac,
        });
    }
    Ok(interfaces)
}

/// Non-blank, non-comment lines split on whitespace, with 1-based line numbers
fn significant_lines(contents: &str) -> impl Iterator<Item = (usize, Vec<&str>)> {
    contents
        .lines()
        .enumerate()
        .map(|(index, line)| (index + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
        .map(|(line_no, line)| (line_no, line.split_whitespace().collect()))
}

fn parse_addr(field: &str, what: &str) -> Result<Ipv4Addr, String> {
    Ipv4Addr::from_str(field).map_err(|_| format!("invalid {} `{}`", what, field))
}
