use crate::RouterError;
use srouter_packets::MacAddr;
use std::fmt;
use std::net::Ipv4Addr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interface {
    pub name: String,
    pub mac: MacAddr,
    pub ip: Ipv4Addr,
}

impl Interface {
    pub fn new(name: &str, mac: MacAddr, ip: Ipv4Addr) -> Self {
        Interface {
            name: String::from(name),
            mac,
            ip,
        }
    }
}

impl fmt::Display for Interface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.name, self.ip, self.mac)
    }
}

/// The router's interfaces in configuration order. Lookups scan the whole list; routers have a
/// handful of interfaces.
#[derive(Debug, Clone, Default)]
pub struct InterfaceList {
    interfaces: Vec<Interface>,
}

impl InterfaceList {
    /// Fails if two interfaces share a name or an IPv4 address.
    pub fn new(interfaces: Vec<Interface>) -> Result<Self, RouterError> {
        for (i, interface) in interfaces.iter().enumerate() {
            for earlier in &interfaces[..i] {
                if earlier.name == interface.name {
                    return Err(RouterError::DuplicateInterface(interface.name.clone()));
                }
                if earlier.ip == interface.ip {
                    return Err(RouterError::DuplicateAddress(interface.ip));
                }
            }
        }
        Ok(InterfaceList { interfaces })
    }

    pub fn by_name(&self, name: &str) -> Option<&Interface> {
        self.interfaces.iter().find(|interface| interface.name == name)
    }

    pub fn by_ip(&self, ip: Ipv4Addr) -> Option<&Interface> {
        self.interfaces.iter().find(|interface| interface.ip == ip)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Interface> {
        self.interfaces.iter()
    }

    pub fn len(&self) -> usize {
        self.interfaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interfaces.is_empty()
    }
}
