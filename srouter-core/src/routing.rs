use std::fmt;
use std::net::Ipv4Addr;

/// One line of the static routing table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteEntry {
    pub destination: Ipv4Addr,
    pub gateway: Ipv4Addr,
    pub mask: Ipv4Addr,
    pub interface: String,
}

impl RouteEntry {
    pub fn new(destination: Ipv4Addr, gateway: Ipv4Addr, mask: Ipv4Addr, interface: &str) -> Self {
        RouteEntry {
            destination,
            gateway,
            mask,
            interface: String::from(interface),
        }
    }

    pub fn matches(&self, ip: Ipv4Addr) -> bool {
        let mask = u32::from(self.mask);
        u32::from(ip) & mask == u32::from(self.destination) & mask
    }

    /// The address whose link address a datagram for `destination` is sent to. A gateway of
    /// 0.0.0.0 marks a directly connected network.
    pub fn next_hop(&self, destination: Ipv4Addr) -> Ipv4Addr {
        if self.gateway.is_unspecified() {
            destination
        } else {
            self.gateway
        }
    }

    /// Number of leading one bits in the mask
    pub fn prefix_len(&self) -> u32 {
        u32::from(self.mask).leading_ones()
    }
}

impl fmt::Display for RouteEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} via {} dev {}",
            self.destination,
            self.prefix_len(),
            self.gateway,
            self.interface
        )
    }
}

/// Ordered sequence of routes. Every lookup scans all of them; the winner is picked by mask,
/// never by position, except between equal masks where the earlier entry wins.
#[derive(Debug, Clone, Default)]
pub struct RoutingTable {
    entries: Vec<RouteEntry>,
}

impl RoutingTable {
    pub fn new(entries: Vec<RouteEntry>) -> Self {
        RoutingTable { entries }
    }

    pub fn push(&mut self, entry: RouteEntry) {
        self.entries.push(entry);
    }

    /// The matching entry with the numerically largest mask, or None, meaning net unreachable.
    pub fn longest_prefix_match(&self, ip: Ipv4Addr) -> Option<&RouteEntry> {
        let mut best: Option<&RouteEntry> = None;
        for entry in self.entries.iter().filter(|entry| entry.matches(ip)) {
            match best {
                Some(current) if u32::from(current.mask) >= u32::from(entry.mask) => {}
                _ => best = Some(entry),
            }
        }
        best
    }

    pub fn iter(&self) -> impl Iterator<Item = &RouteEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
