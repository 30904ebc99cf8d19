use crate::*;
use std::borrow::Cow;
use std::convert::TryFrom;
use std::net::Ipv4Addr;

/// Offset of the checksum field inside the IPv4 header
const CHECKSUM_OFFSET: usize = 10;

/// Default TTL given to datagrams the router originates
pub const DEFAULT_TTL: u8 = 64;

#[derive(Clone, Debug)]
pub struct Ipv4Packet {
    pub data: PacketData,
    pub layer2_offset: Option<usize>,
    pub layer3_offset: usize,
    pub payload_offset: usize,
}

impl Packet for Ipv4Packet {}

impl Ipv4Packet {
    /// Wraps a buffer holding an IPv4 header at `layer3_offset`. Options are not supported, so
    /// the header is always taken to be 20 bytes long; the IHL field is left untouched.
    pub fn from_buffer(
        data: PacketData,
        layer2_offset: Option<usize>,
        layer3_offset: usize,
    ) -> Result<Ipv4Packet, &'static str> {
        // Header of Ethernet Frame: 14 bytes
        // Header of IPv4 Frame: 20 bytes
        if data.len() < layer3_offset + IPV4_HEADER_LEN {
            return Err("Data is too short to be an IPv4 Packet");
        }

        let version: u8 = (data[layer3_offset] & 0xF0) >> 4;
        if version != 4 {
            return Err("Packet has incorrect version, is not Ipv4Packet");
        }

        // TotalLen is the 3rd and 4th byte of the IP Header. Frames may carry link layer padding
        // past the end of the datagram, but never less than the datagram.
        let total_len =
            u16::from_be_bytes([data[layer3_offset + 2], data[layer3_offset + 3]]) as usize;
        if total_len < IPV4_HEADER_LEN || data.len() < layer3_offset + total_len {
            return Err("Packet has invalid total length field");
        }

        Ok(Ipv4Packet {
            data,
            layer2_offset,
            layer3_offset,
            payload_offset: layer3_offset + IPV4_HEADER_LEN,
        })
    }

    /// An option-less header with version, IHL and total length filled in, everything else zero.
    /// There is no layer 2 header in front of it.
    pub fn empty() -> Ipv4Packet {
        let mut data = vec![0; IPV4_HEADER_LEN];
        data[0] = 0x45;
        data[3] = IPV4_HEADER_LEN as u8;
        Ipv4Packet {
            data,
            layer2_offset: None,
            layer3_offset: 0,
            payload_offset: IPV4_HEADER_LEN,
        }
    }

    pub fn version(&self) -> u8 {
        self.data[self.layer3_offset] >> 4
    }

    pub fn ihl(&self) -> u8 {
        self.data[self.layer3_offset] & 0x0F
    }

    pub fn tos(&self) -> u8 {
        self.data[self.layer3_offset + 1]
    }

    pub fn set_tos(&mut self, tos: u8) {
        self.data[self.layer3_offset + 1] = tos;
    }

    pub fn total_len(&self) -> u16 {
        self.read_u16(2)
    }

    pub fn identification(&self) -> u16 {
        self.read_u16(4)
    }

    pub fn set_identification(&mut self, id: u16) {
        self.write_u16(4, id);
    }

    /// Returns tuple of (Don't Fragment, More Fragments)
    pub fn flags(&self) -> (bool, bool) {
        let df = (self.data[self.layer3_offset + 6] & 0x40) != 0;
        let mf = (self.data[self.layer3_offset + 6] & 0x20) != 0;
        (df, mf)
    }

    /// Fragment offset in units of 8 bytes
    pub fn fragment_offset(&self) -> u16 {
        self.read_u16(6) & 0x1FFF
    }

    pub fn ttl(&self) -> u8 {
        self.data[self.layer3_offset + 8]
    }

    pub fn set_ttl(&mut self, ttl: u8) {
        self.data[self.layer3_offset + 8] = ttl;
    }

    pub fn protocol(&self) -> IpProtocol {
        IpProtocol::from(self.data[self.layer3_offset + 9])
    }

    pub fn set_protocol(&mut self, protocol: IpProtocol) {
        self.data[self.layer3_offset + 9] = protocol.into();
    }

    pub fn checksum(&self) -> u16 {
        self.read_u16(CHECKSUM_OFFSET)
    }

    pub fn src_addr(&self) -> Ipv4Addr {
        self.read_addr(12)
    }

    pub fn set_src_addr(&mut self, addr: Ipv4Addr) {
        let start = self.layer3_offset + 12;
        self.data[start..start + 4].copy_from_slice(&addr.octets());
    }

    pub fn dest_addr(&self) -> Ipv4Addr {
        self.read_addr(16)
    }

    pub fn set_dest_addr(&mut self, addr: Ipv4Addr) {
        let start = self.layer3_offset + 16;
        self.data[start..start + 4].copy_from_slice(&addr.octets());
    }

    /// The 20 header bytes
    pub fn header(&self) -> &[u8] {
        &self.data[self.layer3_offset..self.payload_offset]
    }

    /// Payload as delimited by the total length field, link layer padding excluded.
    pub fn payload(&self) -> Cow<[u8]> {
        Cow::from(&self.data[self.payload_offset..self.end_offset()])
    }

    pub fn payload_mut(&mut self) -> &mut [u8] {
        let end = self.end_offset();
        &mut self.data[self.payload_offset..end]
    }

    /// Replaces the payload and updates the total length field. Does not touch the checksum.
    pub fn set_payload(&mut self, payload: &[u8]) {
        self.data.truncate(self.payload_offset);
        self.data.reserve_exact(payload.len());
        self.data.extend(payload);
        self.write_u16(2, (IPV4_HEADER_LEN + payload.len()) as u16);
    }

    /// Calculates what the checksum should be set to given the current header. The checksum
    /// field itself is treated as zero.
    pub fn calculate_checksum(&self) -> u16 {
        let header = self.header();
        let sum = ones_complement_sum(&header[..CHECKSUM_OFFSET])
            + ones_complement_sum(&header[CHECKSUM_OFFSET + 2..]);
        !fold_sum(sum)
    }

    /// True when the transmitted checksum matches the one recomputed over the header
    pub fn validate_checksum(&self) -> bool {
        self.checksum() == self.calculate_checksum()
    }

    /// Sets checksum field to valid value
    pub fn set_checksum(&mut self) {
        let new_checksum = self.calculate_checksum();
        self.write_u16(CHECKSUM_OFFSET, new_checksum);
    }

    /// Offset one past the last byte of the datagram
    pub fn end_offset(&self) -> usize {
        self.layer3_offset + self.total_len() as usize
    }

    fn read_u16(&self, offset: usize) -> u16 {
        let start = self.layer3_offset + offset;
        u16::from_be_bytes([self.data[start], self.data[start + 1]])
    }

    fn write_u16(&mut self, offset: usize, value: u16) {
        let start = self.layer3_offset + offset;
        self.data[start..start + 2].copy_from_slice(&value.to_be_bytes());
    }

    fn read_addr(&self, offset: usize) -> Ipv4Addr {
        let start = self.layer3_offset + offset;
        Ipv4Addr::new(
            self.data[start],
            self.data[start + 1],
            self.data[start + 2],
            self.data[start + 3],
        )
    }
}

/// Ipv4Packets are considered the same if they have the same data from the layer 3
/// header and onward. This function does not consider the data before the start of
/// the IPv4 header.
impl PartialEq for Ipv4Packet {
    fn eq(&self, other: &Self) -> bool {
        self.data[self.layer3_offset..] == other.data[other.layer3_offset..]
    }
}

impl Eq for Ipv4Packet {}

impl TryFrom<EthernetFrame> for Ipv4Packet {
    type Error = &'static str;

    fn try_from(frame: EthernetFrame) -> Result<Self, Self::Error> {
        Ipv4Packet::from_buffer(frame.data, Some(frame.layer2_offset), frame.payload_offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::vec::Vec;

    fn mac_data() -> Vec<u8> {
        vec![0xde, 0xad, 0xbe, 0xef, 0xff, 0xff, 1, 2, 3, 4, 5, 6, 0x08, 0x00]
    }

    fn packet_from(ip_data: &[u8]) -> Ipv4Packet {
        let mut frame = EthernetFrame::from_buffer(mac_data(), 0).unwrap();
        frame.set_payload(ip_data);
        Ipv4Packet::try_from(frame).unwrap()
    }

    #[test]
    fn ipv4_packet() {
        let packet = packet_from(&[
            0x45, 0, 0, 20, 0, 0, 0, 0, 64, 17, 0, 0, 192, 178, 128, 0, 10, 0, 0, 1,
        ]);

        assert_eq!(packet.src_addr(), Ipv4Addr::new(192, 178, 128, 0));
        assert_eq!(packet.dest_addr(), Ipv4Addr::new(10, 0, 0, 1));
        assert_eq!(packet.version(), 4);
        assert_eq!(packet.ihl(), 5);
        assert_eq!(packet.payload().len(), 0);
        assert_eq!(packet.protocol(), IpProtocol::UDP);
        assert_eq!(packet.total_len(), 20);
        assert_eq!(packet.ttl(), 64);
        assert_eq!(packet.checksum(), 0);
        assert_eq!(packet.tos(), 0);
        assert_eq!(packet.identification(), 0);
        assert_eq!(packet.fragment_offset(), 0);
        assert_eq!(packet.flags(), (false, false));
    }

    #[test]
    fn rejects_short_and_wrong_version() {
        let mut frame = EthernetFrame::from_buffer(mac_data(), 0).unwrap();
        frame.set_payload(&[0x45, 0, 0, 20, 0, 0, 0, 0]);
        assert!(Ipv4Packet::try_from(frame).is_err());

        let mut frame = EthernetFrame::from_buffer(mac_data(), 0).unwrap();
        frame.set_payload(&[
            0x65, 0, 0, 20, 0, 0, 0, 0, 64, 17, 0, 0, 192, 178, 128, 0, 10, 0, 0, 1,
        ]);
        assert_eq!(
            Ipv4Packet::try_from(frame).unwrap_err(),
            "Packet has incorrect version, is not Ipv4Packet"
        );
    }

    #[test]
    fn rejects_total_len_past_end_of_data() {
        let mut frame = EthernetFrame::from_buffer(mac_data(), 0).unwrap();
        frame.set_payload(&[
            0x45, 0, 0, 40, 0, 0, 0, 0, 64, 17, 0, 0, 192, 178, 128, 0, 10, 0, 0, 1,
        ]);
        assert_eq!(
            Ipv4Packet::try_from(frame).unwrap_err(),
            "Packet has invalid total length field"
        );
    }

    #[test]
    fn payload_excludes_link_padding() {
        let packet = packet_from(&[
            0x45, 0, 0, 22, 0, 0, 0, 0, 64, 17, 0, 0, 192, 178, 128, 0, 10, 0, 0, 1, 0xaa, 0xbb,
            0, 0, 0, 0,
        ]);
        assert_eq!(packet.payload(), vec![0xaa, 0xbb]);
        assert_eq!(packet.end_offset(), 14 + 22);
    }

    #[test]
    fn validate_checksum() {
        let invalid = packet_from(&[
            0x45, 0x00, 0x00, 0x14, 0x00, 0x00, 0x40, 0x00, 0x40, 0x11, 0xb8, 0x61, 0xc0, 0xa8,
            0x00, 0x01, 0xc0, 0xa8, 0x00, 0xc7,
        ]);
        assert!(!invalid.validate_checksum());

        let valid = packet_from(&[
            0x45, 0x00, 0x00, 0x14, 0x00, 0x00, 0x40, 0x00, 0x40, 0x11, 0xb8, 0xc0, 0xc0, 0xa8,
            0x00, 0x01, 0xc0, 0xa8, 0x00, 0xc7,
        ]);
        assert!(valid.validate_checksum());
        assert_eq!(valid.calculate_checksum(), 0xb8c0);
    }

    #[test]
    fn set_checksum() {
        let mut packet = packet_from(&[
            0x45, 0x00, 0x00, 0x14, 0x00, 0x00, 0x40, 0x00, 0x40, 0x11, 0xb8, 0x61, 0xc0, 0xa8,
            0x00, 0x01, 0xc0, 0xa8, 0x00, 0xc7,
        ]);
        assert!(!packet.validate_checksum());
        packet.set_checksum();
        assert!(packet.validate_checksum());
        assert_eq!(packet.checksum(), 0xb8c0);
    }

    #[test]
    fn checksum_detects_every_single_bit_flip() {
        let packet = packet_from(&[
            0x45, 0x00, 0x00, 0x14, 0x00, 0x00, 0x40, 0x00, 0x40, 0x11, 0xb8, 0xc0, 0xc0, 0xa8,
            0x00, 0x01, 0xc0, 0xa8, 0x00, 0xc7,
        ]);
        let original = packet.calculate_checksum();
        for byte in 0..IPV4_HEADER_LEN {
            if byte == CHECKSUM_OFFSET || byte == CHECKSUM_OFFSET + 1 {
                continue;
            }
            for bit in 0..8 {
                let mut corrupted = packet.clone();
                corrupted.data[14 + byte] ^= 1 << bit;
                assert_ne!(corrupted.calculate_checksum(), original);
                assert!(!corrupted.validate_checksum());
            }
        }
    }

    #[test]
    fn checksum_agrees_with_smoltcp() {
        let mut packet = packet_from(&[
            0x45, 0x10, 0x00, 0x1c, 0x12, 0x34, 0x40, 0x00, 0x03, 0x06, 0x00, 0x00, 0x0a, 0x00,
            0x01, 0x64, 0xc0, 0xa8, 0x02, 0x02, 1, 2, 3, 4, 5, 6, 7, 8,
        ]);
        packet.set_checksum();
        let raw = &packet.data[packet.layer3_offset..];
        let checked = smoltcp::wire::Ipv4Packet::new_checked(raw).unwrap();
        assert!(checked.verify_checksum());
    }

    #[test]
    fn set_payload_updates_total_len() {
        let mut packet = Ipv4Packet::empty();
        packet.set_payload(&[1, 2, 3, 4]);
        assert_eq!(packet.total_len(), 24);
        assert_eq!(packet.payload(), vec![1, 2, 3, 4]);
        assert_eq!(packet.layer2_offset, None);
    }
}
