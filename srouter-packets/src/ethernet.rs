use crate::*;
use std::borrow::Cow;
use std::convert::TryFrom;

#[derive(Clone, Debug)]
pub struct EthernetFrame {
    pub data: PacketData,
    pub layer2_offset: usize,
    pub payload_offset: usize,
}

impl Packet for EthernetFrame {}

impl EthernetFrame {
    pub fn from_buffer(
        frame: PacketData,
        layer2_offset: usize,
    ) -> Result<EthernetFrame, &'static str> {
        // Ethernet II frames must be at least the header, which is 14bytes
        // 0                    6                    12                      14
        // |---6 byte Dest_MAC--|---6 byte Src_MAC---|--2 Byte EtherType---|
        // 802.1Q tags are not supported, the payload always starts right after the ether type.
        if frame.len() < layer2_offset + ETHERNET_HEADER_LEN {
            return Err("Frame is less than the minimum of 14 bytes");
        }

        Ok(EthernetFrame {
            data: frame,
            layer2_offset,
            payload_offset: ETHERNET_HEADER_LEN + layer2_offset,
        })
    }

    /// Returns an empty EthernetFrame where all values all populated to zero. This function allocates a
    /// new array to hold the header.
    pub fn empty() -> EthernetFrame {
        EthernetFrame {
            data: vec![0; ETHERNET_HEADER_LEN],
            layer2_offset: 0,
            payload_offset: ETHERNET_HEADER_LEN,
        }
    }

    pub fn dest_mac(&self) -> MacAddr {
        let start = self.layer2_offset;
        MacAddr::from_slice(&self.data[start..start + 6]).unwrap_or_default()
    }

    pub fn src_mac(&self) -> MacAddr {
        let start = self.layer2_offset + 6;
        MacAddr::from_slice(&self.data[start..start + 6]).unwrap_or_default()
    }

    pub fn set_dest_mac(&mut self, mac: MacAddr) {
        let start = self.layer2_offset;
        self.data[start..start + 6].copy_from_slice(&mac.bytes);
    }

    pub fn set_src_mac(&mut self, mac: MacAddr) {
        let start = self.layer2_offset + 6;
        self.data[start..start + 6].copy_from_slice(&mac.bytes);
    }

    pub fn ether_type(&self) -> u16 {
        ether_type_of(&self.data[self.layer2_offset..]).unwrap_or(0)
    }

    pub fn set_ether_type(&mut self, ether_type: u16) {
        let start = self.layer2_offset + 12;
        self.data[start..start + 2].copy_from_slice(&ether_type.to_be_bytes());
    }

    // This gives you a cow of a slice of the payload.
    pub fn payload(&self) -> Cow<[u8]> {
        Cow::from(&self.data[self.payload_offset..])
    }

    pub fn set_payload(&mut self, payload: &[u8]) {
        self.data.truncate(self.payload_offset);
        self.data.reserve_exact(payload.len());
        self.data.extend(payload);
    }

    pub fn encap_ipv4(ipv4: Ipv4Packet) -> EthernetFrame {
        let mut frame = EthernetFrame::empty();
        frame.set_payload(&ipv4.data[ipv4.layer3_offset..]);
        frame.set_ether_type(IPV4_ETHER_TYPE);
        frame
    }

    /// Hands the underlying buffer back to the caller
    pub fn into_inner(self) -> PacketData {
        self.data
    }
}

/// Reads the ether type of a raw frame without taking ownership of it. Returns None when the
/// slice is too short to hold an Ethernet header.
pub fn ether_type_of(frame: &[u8]) -> Option<u16> {
    if frame.len() < ETHERNET_HEADER_LEN {
        return None;
    }
    Some(u16::from_be_bytes([frame[12], frame[13]]))
}

/// EthernetFrames are considered the same if they have the same data from the layer 2
/// header and onward. This function does not consider the data before the start of the
/// Ethernet header
impl PartialEq for EthernetFrame {
    fn eq(&self, other: &Self) -> bool {
        self.data[self.layer2_offset..] == other.data[other.layer2_offset..]
    }
}

impl Eq for EthernetFrame {}

impl TryFrom<Ipv4Packet> for EthernetFrame {
    type Error = &'static str;

    fn try_from(packet: Ipv4Packet) -> Result<Self, Self::Error> {
        if let Some(layer2_offset) = packet.layer2_offset {
            EthernetFrame::from_buffer(packet.data, layer2_offset)
        } else {
            Err("IPv4 Packet does not contain an Ethernet Frame")
        }
    }
}

impl TryFrom<IcmpPacket> for EthernetFrame {
    type Error = &'static str;

    fn try_from(packet: IcmpPacket) -> Result<Self, Self::Error> {
        EthernetFrame::try_from(Ipv4Packet::from(packet))
    }
}
