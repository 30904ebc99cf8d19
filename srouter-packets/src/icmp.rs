use crate::*;
use std::borrow::Cow;
use std::convert::TryFrom;

/// The size of an ICMP "header", which precedes the data field
pub const ICMP_HEADER_LEN: usize = 8;

/// Bytes of the offending datagram quoted by an ICMP error: its header plus 64 bits of data
pub const ICMP_ERROR_DATA_LEN: usize = IPV4_HEADER_LEN + 8;

/// ICMP message types from RFC 792
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IcmpType {
    EchoReply = 0,
    DestinationUnreachable = 3,
    SourceQuench = 4,
    Redirect = 5,
    EchoRequest = 8,
    TimeExceeded = 11,
    ParameterProblem = 12,
}

impl IcmpType {
    /// Types that report a problem with another datagram, as opposed to queries
    pub fn is_error(msg_type: u8) -> bool {
        [
            IcmpType::DestinationUnreachable,
            IcmpType::SourceQuench,
            IcmpType::Redirect,
            IcmpType::TimeExceeded,
            IcmpType::ParameterProblem,
        ]
        .iter()
        .any(|error_type| *error_type as u8 == msg_type)
    }
}

/// Codes for `IcmpType::DestinationUnreachable`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnreachableCode {
    Net = 0,
    Host = 1,
    Protocol = 2,
    Port = 3,
}

/// Codes for `IcmpType::TimeExceeded`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeExceededCode {
    TtlExpired = 0,
    FragmentReassembly = 1,
}

#[derive(Clone, Debug)]
pub struct IcmpPacket {
    pub data: PacketData,
    pub layer2_offset: Option<usize>,
    pub layer3_offset: Option<usize>,
    pub layer4_offset: usize,
    end_offset: usize,
}

impl Packet for IcmpPacket {}

impl IcmpPacket {
    /// Wraps an ICMP message that runs from `layer4_offset` to `end_offset`.
    pub fn from_buffer(
        data: PacketData,
        layer2_offset: Option<usize>,
        layer3_offset: Option<usize>,
        layer4_offset: usize,
        end_offset: usize,
    ) -> Result<IcmpPacket, &'static str> {
        if end_offset > data.len() || end_offset < layer4_offset + ICMP_HEADER_LEN {
            return Err("Message is too short to hold an ICMP header");
        }
        Ok(IcmpPacket {
            data,
            layer2_offset,
            layer3_offset,
            layer4_offset,
            end_offset,
        })
    }

    /// A bare ICMP message with the given type and code, zeroed rest-of-header, and `body` as its
    /// data. The checksum is filled in. There is no layer 3 or layer 2 header in front of it.
    pub fn new(msg_type: u8, code: u8, body: &[u8]) -> IcmpPacket {
        let mut data = vec![0; ICMP_HEADER_LEN];
        data.extend_from_slice(body);
        let end_offset = data.len();
        let mut packet = IcmpPacket {
            data,
            layer2_offset: None,
            layer3_offset: None,
            layer4_offset: 0,
            end_offset,
        };
        packet.set_msg_type(msg_type);
        packet.set_code(code);
        packet.set_checksum();
        packet
    }

    /// Builds an error message (destination unreachable, time exceeded, ...) quoting the header
    /// and first 8 data bytes of `offending`. Shorter datagrams are zero padded, so the message
    /// body is always `ICMP_ERROR_DATA_LEN` bytes.
    pub fn error(msg_type: IcmpType, code: u8, offending: &Ipv4Packet) -> IcmpPacket {
        let start = offending.layer3_offset;
        let end = (start + ICMP_ERROR_DATA_LEN).min(offending.end_offset());
        let mut body = offending.data[start..end].to_vec();
        body.resize(ICMP_ERROR_DATA_LEN, 0);
        IcmpPacket::new(msg_type as u8, code, &body)
    }

    pub fn msg_type(&self) -> u8 {
        self.data[self.layer4_offset]
    }

    pub fn set_msg_type(&mut self, msg_type: u8) {
        self.data[self.layer4_offset] = msg_type;
    }

    pub fn code(&self) -> u8 {
        self.data[self.layer4_offset + 1]
    }

    pub fn set_code(&mut self, code: u8) {
        self.data[self.layer4_offset + 1] = code;
    }

    pub fn checksum(&self) -> u16 {
        self.read_u16(2)
    }

    /// Echo identifier, only meaningful for echo request/reply
    pub fn identifier(&self) -> u16 {
        self.read_u16(4)
    }

    /// Echo sequence number, only meaningful for echo request/reply
    pub fn sequence(&self) -> u16 {
        self.read_u16(6)
    }

    /// The whole message: header and data
    pub fn message(&self) -> &[u8] {
        &self.data[self.layer4_offset..self.end_offset]
    }

    /// The data that follows the 8 byte header
    pub fn body(&self) -> Cow<[u8]> {
        Cow::from(&self.data[self.layer4_offset + ICMP_HEADER_LEN..self.end_offset])
    }

    /// Checksum over the full message with the checksum field treated as zero
    pub fn calculate_checksum(&self) -> u16 {
        let message = self.message();
        let sum = ones_complement_sum(&message[..2]) + ones_complement_sum(&message[4..]);
        !fold_sum(sum)
    }

    pub fn validate_checksum(&self) -> bool {
        self.checksum() == self.calculate_checksum()
    }

    pub fn set_checksum(&mut self) {
        let checksum = self.calculate_checksum();
        let start = self.layer4_offset + 2;
        self.data[start..start + 2].copy_from_slice(&checksum.to_be_bytes());
    }

    fn read_u16(&self, offset: usize) -> u16 {
        let start = self.layer4_offset + offset;
        u16::from_be_bytes([self.data[start], self.data[start + 1]])
    }
}

impl Ipv4Packet {
    /// Wraps an ICMP message in a fresh option-less IPv4 header carrying protocol 1 and the
    /// default TTL. Addresses are left for the caller; the header checksum is not set.
    pub fn encap_icmp(icmp: IcmpPacket) -> Ipv4Packet {
        let mut packet = Ipv4Packet::empty();
        packet.set_payload(icmp.message());
        packet.set_protocol(IpProtocol::ICMP);
        packet.set_ttl(DEFAULT_TTL);
        packet
    }
}

impl TryFrom<Ipv4Packet> for IcmpPacket {
    type Error = &'static str;

    fn try_from(packet: Ipv4Packet) -> Result<Self, Self::Error> {
        if packet.protocol() != IpProtocol::ICMP {
            return Err("Protocol is incorrect, since it isn't ICMP");
        }
        let end_offset = packet.end_offset();
        IcmpPacket::from_buffer(
            packet.data,
            packet.layer2_offset,
            Some(packet.layer3_offset),
            packet.payload_offset,
            end_offset,
        )
    }
}

impl From<IcmpPacket> for Ipv4Packet {
    /// Unwraps back to the enclosing datagram. A bare message (no layer 3 header) is encapsulated
    /// in a new header instead.
    fn from(icmp: IcmpPacket) -> Self {
        match icmp.layer3_offset {
            Some(layer3_offset) => Ipv4Packet {
                data: icmp.data,
                layer2_offset: icmp.layer2_offset,
                layer3_offset,
                payload_offset: icmp.layer4_offset,
            },
            None => Ipv4Packet::encap_icmp(icmp),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn echo_request_frame() -> EthernetFrame {
        let ip_data: Vec<u8> = vec![
            0x45, 0x00, 0x00, 0x24, 0xab, 0xcd, 0x00, 0x00, 0x40, 0x01, 0x00, 0x00, 10, 0, 1, 100,
            10, 0, 1, 1, // IP header
            0x08, 0x00, 0x00, 0x00, 0x12, 0x34, 0x00, 0x07, // ICMP echo header
            b'a', b'b', b'c', b'd', b'e', b'f', b'g', b'h',
        ];
        let mut frame = EthernetFrame::empty();
        frame.set_ether_type(IPV4_ETHER_TYPE);
        frame.set_payload(&ip_data);
        frame
    }

    #[test]
    fn icmp_from_ipv4() {
        let packet = Ipv4Packet::try_from(echo_request_frame()).unwrap();
        let icmp = IcmpPacket::try_from(packet).unwrap();
        assert_eq!(icmp.msg_type(), IcmpType::EchoRequest as u8);
        assert_eq!(icmp.code(), 0);
        assert_eq!(icmp.identifier(), 0x1234);
        assert_eq!(icmp.sequence(), 7);
        assert_eq!(icmp.body(), b"abcdefgh".to_vec());
        assert_eq!(icmp.layer4_offset, 34);
    }

    #[test]
    fn non_icmp_is_rejected() {
        let mut packet = Ipv4Packet::try_from(echo_request_frame()).unwrap();
        packet.set_protocol(IpProtocol::UDP);
        assert_eq!(
            IcmpPacket::try_from(packet).unwrap_err(),
            "Protocol is incorrect, since it isn't ICMP"
        );
    }

    #[test]
    fn checksum_round_trip() {
        let packet = Ipv4Packet::try_from(echo_request_frame()).unwrap();
        let mut icmp = IcmpPacket::try_from(packet).unwrap();
        assert!(!icmp.validate_checksum());
        icmp.set_checksum();
        assert!(icmp.validate_checksum());

        let checked = smoltcp::wire::Icmpv4Packet::new_checked(icmp.message()).unwrap();
        assert!(checked.verify_checksum());
    }

    #[test]
    fn error_quotes_header_and_eight_bytes() {
        let offending = Ipv4Packet::try_from(echo_request_frame()).unwrap();
        let error = IcmpPacket::error(
            IcmpType::TimeExceeded,
            TimeExceededCode::TtlExpired as u8,
            &offending,
        );
        assert_eq!(error.msg_type(), 11);
        assert_eq!(error.code(), 0);
        assert_eq!(error.message().len(), ICMP_HEADER_LEN + ICMP_ERROR_DATA_LEN);
        assert_eq!(&error.message()[4..8], &[0, 0, 0, 0]);
        assert_eq!(&error.body()[..], &offending.data[14..14 + 28]);
        assert!(error.validate_checksum());
    }

    #[test]
    fn error_pads_short_datagrams() {
        let mut offending = Ipv4Packet::empty();
        offending.set_payload(&[1, 2, 3]);
        let error = IcmpPacket::error(
            IcmpType::DestinationUnreachable,
            UnreachableCode::Port as u8,
            &offending,
        );
        let body = error.body();
        assert_eq!(body.len(), ICMP_ERROR_DATA_LEN);
        assert_eq!(&body[20..23], &[1, 2, 3]);
        assert_eq!(&body[23..], &[0, 0, 0, 0, 0]);
    }

    #[test]
    fn encap_icmp_builds_a_valid_datagram() {
        let icmp = IcmpPacket::new(IcmpType::EchoReply as u8, 0, &[9, 9]);
        let mut packet = Ipv4Packet::from(icmp);
        packet.set_src_addr(Ipv4Addr::new(10, 0, 0, 1));
        packet.set_dest_addr(Ipv4Addr::new(10, 0, 0, 2));
        packet.set_checksum();

        assert_eq!(packet.protocol(), IpProtocol::ICMP);
        assert_eq!(packet.ttl(), DEFAULT_TTL);
        assert_eq!(packet.total_len() as usize, 20 + 8 + 2);

        let checked = smoltcp::wire::Ipv4Packet::new_checked(&packet.data[..]).unwrap();
        assert!(checked.verify_checksum());
        let icmp = IcmpPacket::try_from(packet).unwrap();
        assert!(icmp.validate_checksum());
    }

    #[test]
    fn error_types() {
        assert!(IcmpType::is_error(3));
        assert!(IcmpType::is_error(11));
        assert!(!IcmpType::is_error(0));
        assert!(!IcmpType::is_error(8));
    }
}
