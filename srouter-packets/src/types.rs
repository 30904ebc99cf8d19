use std::fmt;
use std::str::FromStr;

/// The common datatype that all packet structures share to represent their data
pub type PacketData = Vec<u8>;

/// Marker trait for every packet wrapper in this crate
pub trait Packet: Clone {}

pub const IPV4_ETHER_TYPE: u16 = 0x0800;
pub const ARP_ETHER_TYPE: u16 = 0x0806;

/// Size of an Ethernet II header: two MAC addresses and the ether type
pub const ETHERNET_HEADER_LEN: usize = 14;

/// Size of an IPv4 header without options
pub const IPV4_HEADER_LEN: usize = 20;

// Most significant byte is 0th
#[derive(Eq, Clone, Copy, Hash, PartialEq, Default)]
pub struct MacAddr {
    pub bytes: [u8; 6],
}

impl MacAddr {
    pub const BROADCAST: MacAddr = MacAddr { bytes: [0xff; 6] };
    pub const ZERO: MacAddr = MacAddr { bytes: [0; 6] };

    pub fn new(bytes: [u8; 6]) -> MacAddr {
        MacAddr { bytes }
    }

    /// Builds a MacAddr from the first 6 bytes of a slice, returns None if the slice is shorter
    pub fn from_slice(bytes: &[u8]) -> Option<MacAddr> {
        if bytes.len() < 6 {
            return None;
        }
        let mut mac = [0; 6];
        mac.copy_from_slice(&bytes[..6]);
        Some(MacAddr::new(mac))
    }

    pub fn is_broadcast(&self) -> bool {
        *self == MacAddr::BROADCAST
    }
}

impl fmt::Display for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = &self.bytes;
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            b[0], b[1], b[2], b[3], b[4], b[5]
        )
    }
}

impl fmt::Debug for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MacAddr({})", self)
    }
}

impl FromStr for MacAddr {
    type Err = &'static str;

    /// Parses the colon separated hex form, `aa:bb:cc:dd:ee:ff`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0u8; 6];
        let mut octets = s.split(':');
        for byte in bytes.iter_mut() {
            let octet = octets.next().ok_or("MAC address has fewer than 6 octets")?;
            if octet.is_empty() || octet.len() > 2 {
                return Err("MAC address octet must be one or two hex digits");
            }
            *byte = u8::from_str_radix(octet, 16).map_err(|_| "MAC address octet is not hex")?;
        }
        if octets.next().is_some() {
            return Err("MAC address has more than 6 octets");
        }
        Ok(MacAddr::new(bytes))
    }
}

/// Protocol numbers carried in the IPv4 protocol field that the router cares about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IpProtocol {
    ICMP,
    TCP,
    UDP,
    Unknown(u8),
}

impl From<u8> for IpProtocol {
    fn from(protocol_number: u8) -> Self {
        match protocol_number {
            1 => IpProtocol::ICMP,
            6 => IpProtocol::TCP,
            17 => IpProtocol::UDP,
            other => IpProtocol::Unknown(other),
        }
    }
}

impl From<IpProtocol> for u8 {
    fn from(protocol: IpProtocol) -> Self {
        match protocol {
            IpProtocol::ICMP => 1,
            IpProtocol::TCP => 6,
            IpProtocol::UDP => 17,
            IpProtocol::Unknown(other) => other,
        }
    }
}
