use crate::{EthernetFrame, MacAddr, Packet, ARP_ETHER_TYPE, IPV4_ETHER_TYPE};
use std::convert::TryFrom;
use std::net::Ipv4Addr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArpOp {
    Request = 1,
    Reply = 2,
}

pub enum ArpHardwareType {
    Ethernet = 1,
}

const HARDWARE_TYPE_RANGE: (usize, usize) = (0, 2);
const PROTOCOL_TYPE_RANGE: (usize, usize) = (2, 4);
const HARDWARE_ADDR_LEN_RANGE: (usize, usize) = (4, 5);
const PROTOCOL_ADDR_LEN_RANGE: (usize, usize) = (5, 6);
const OPCODE_RANGE: (usize, usize) = (6, 8);

/// Length of an ARP payload for Ethernet hardware and IPv4 protocol addresses
pub const ARP_IPV4_PAYLOAD_LEN: usize = 28;

///
/// EthernetFrame wrapper with getters/setters for the packet structure described in RFC 826
/// https://tools.ietf.org/html/rfc826
///
#[derive(Clone, Debug)]
pub struct ArpFrame {
    frame: EthernetFrame,
}

impl Packet for ArpFrame {}

impl ArpFrame {
    ///
    /// Constructs a new, empty packet with a payload big enough for all ARP fields,
    /// given some hardware/protocol address lengths. The ether type is set to ARP.
    ///
    pub fn new(hardware_addr_len: u8, protocol_addr_len: u8) -> Self {
        let payload_len = 8 + (2 * hardware_addr_len as usize) + (2 * protocol_addr_len as usize);
        let payload: Vec<u8> = vec![0; payload_len];

        let mut frame = EthernetFrame::empty();
        frame.set_payload(payload.as_slice());
        frame.set_ether_type(ARP_ETHER_TYPE);

        let mut arp_frame = ArpFrame { frame };
        arp_frame.set_hardware_addr_len(hardware_addr_len);
        arp_frame.set_protocol_addr_len(protocol_addr_len);
        arp_frame
    }

    ///
    /// Builds a broadcast request asking who has `target_ip`, on behalf of the station at
    /// (`sender_mac`, `sender_ip`). The target hardware address is left zeroed, it is the value
    /// being asked for.
    ///
    pub fn request(sender_mac: MacAddr, sender_ip: Ipv4Addr, target_ip: Ipv4Addr) -> Self {
        let mut arp_frame = ArpFrame::default();
        arp_frame.set_opcode(ArpOp::Request as u16);
        arp_frame.set_sender_hardware_addr(sender_mac);
        arp_frame.set_sender_protocol_addr(sender_ip);
        arp_frame.set_target_hardware_addr(MacAddr::ZERO);
        arp_frame.set_target_protocol_addr(target_ip);
        arp_frame.frame.set_src_mac(sender_mac);
        arp_frame.frame.set_dest_mac(MacAddr::BROADCAST);
        arp_frame
    }

    ///
    /// Builds the reply to `request`: the requester becomes the target, and the local station
    /// (`local_mac`, `local_ip`) goes into the sender fields. Addressed straight to the requester.
    ///
    pub fn reply_to(request: &ArpFrame, local_mac: MacAddr, local_ip: Ipv4Addr) -> Self {
        let mut arp_frame = ArpFrame::default();
        arp_frame.set_opcode(ArpOp::Reply as u16);
        arp_frame.set_sender_hardware_addr(local_mac);
        arp_frame.set_sender_protocol_addr(local_ip);
        arp_frame.set_target_hardware_addr(request.sender_mac_addr());
        arp_frame.set_target_protocol_addr(request.sender_ipv4_addr());
        arp_frame.frame.set_src_mac(local_mac);
        arp_frame.frame.set_dest_mac(request.sender_mac_addr());
        arp_frame
    }

    pub fn hardware_type(&self) -> u16 {
        let (start, end) = HARDWARE_TYPE_RANGE;
        be_u16(self.arp_data(start, end))
    }

    pub fn protocol_type(&self) -> u16 {
        let (start, end) = PROTOCOL_TYPE_RANGE;
        be_u16(self.arp_data(start, end))
    }

    pub fn hardware_addr_len(&self) -> u8 {
        let (start, _) = HARDWARE_ADDR_LEN_RANGE;
        self.arp_data(start, start + 1)[0]
    }

    pub fn protocol_addr_len(&self) -> u8 {
        let (start, _) = PROTOCOL_ADDR_LEN_RANGE;
        self.arp_data(start, start + 1)[0]
    }

    pub fn opcode(&self) -> u16 {
        let (start, end) = OPCODE_RANGE;
        be_u16(self.arp_data(start, end))
    }

    pub fn sender_hardware_addr(&self) -> &[u8] {
        let (start, end) = self.sender_hardware_addr_range();
        self.arp_data(start, end)
    }

    pub fn sender_protocol_addr(&self) -> &[u8] {
        let (start, end) = self.sender_protocol_addr_range();
        self.arp_data(start, end)
    }

    pub fn target_hardware_addr(&self) -> &[u8] {
        let (start, end) = self.target_hardware_addr_range();
        self.arp_data(start, end)
    }

    pub fn target_protocol_addr(&self) -> &[u8] {
        let (start, end) = self.target_protocol_addr_range();
        self.arp_data(start, end)
    }

    /// True for the only flavour the router speaks: Ethernet hardware addresses resolving IPv4
    pub fn is_ethernet_ipv4(&self) -> bool {
        self.hardware_type() == ArpHardwareType::Ethernet as u16
            && self.protocol_type() == IPV4_ETHER_TYPE
            && self.hardware_addr_len() == 6
            && self.protocol_addr_len() == 4
    }

    // The typed accessors below assume `is_ethernet_ipv4()`; with other address lengths they
    // read whatever bytes sit at the Ethernet/IPv4 positions.

    pub fn sender_mac_addr(&self) -> MacAddr {
        MacAddr::from_slice(self.arp_data(8, 14)).unwrap_or_default()
    }

    pub fn sender_ipv4_addr(&self) -> Ipv4Addr {
        ipv4_from(self.arp_data(14, 18))
    }

    pub fn target_mac_addr(&self) -> MacAddr {
        MacAddr::from_slice(self.arp_data(18, 24)).unwrap_or_default()
    }

    pub fn target_ipv4_addr(&self) -> Ipv4Addr {
        ipv4_from(self.arp_data(24, 28))
    }

    pub fn set_hardware_type(&mut self, htype: u16) {
        let (start, end) = HARDWARE_TYPE_RANGE;
        self.set_arp_data(&htype.to_be_bytes(), start, end);
    }

    pub fn set_protocol_type(&mut self, ptype: u16) {
        let (start, end) = PROTOCOL_TYPE_RANGE;
        self.set_arp_data(&ptype.to_be_bytes(), start, end);
    }

    pub fn set_hardware_addr_len(&mut self, len: u8) {
        let (start, end) = HARDWARE_ADDR_LEN_RANGE;
        self.set_arp_data(&[len], start, end);
    }

    pub fn set_protocol_addr_len(&mut self, len: u8) {
        let (start, end) = PROTOCOL_ADDR_LEN_RANGE;
        self.set_arp_data(&[len], start, end);
    }

    pub fn set_opcode(&mut self, code: u16) {
        let (start, end) = OPCODE_RANGE;
        self.set_arp_data(&code.to_be_bytes(), start, end);
    }

    pub fn set_sender_hardware_addr(&mut self, addr: MacAddr) {
        let (start, end) = self.sender_hardware_addr_range();
        self.set_arp_data(&addr.bytes, start, end);
    }

    pub fn set_sender_protocol_addr(&mut self, ip_addr: Ipv4Addr) {
        let (start, end) = self.sender_protocol_addr_range();
        self.set_arp_data(&ip_addr.octets(), start, end);
    }

    pub fn set_target_hardware_addr(&mut self, addr: MacAddr) {
        let (start, end) = self.target_hardware_addr_range();
        self.set_arp_data(&addr.bytes, start, end);
    }

    pub fn set_target_protocol_addr(&mut self, ip_addr: Ipv4Addr) {
        let (start, end) = self.target_protocol_addr_range();
        self.set_arp_data(&ip_addr.octets(), start, end);
    }

    // Move ownership of the frame back to the caller
    pub fn frame(self) -> EthernetFrame {
        self.frame
    }

    pub fn frame_ref(&self) -> &EthernetFrame {
        &self.frame
    }

    // Returns the bytes in the ethernet frame between start and end, exclusive
    fn arp_data(&self, start: usize, end: usize) -> &[u8] {
        let frame_offset_start = self.frame.payload_offset + start;
        let frame_offset_end = self.frame.payload_offset + end;
        &self.frame.data[frame_offset_start..frame_offset_end]
    }

    fn set_arp_data(&mut self, bytes: &[u8], start: usize, end: usize) {
        let frame_offset_start = self.frame.payload_offset + start;
        let frame_offset_end = self.frame.payload_offset + end;
        self.frame.data[frame_offset_start..frame_offset_end].copy_from_slice(bytes);
    }

    fn sender_hardware_addr_range(&self) -> (usize, usize) {
        let hlen = self.hardware_addr_len() as usize;

        let start = 8;
        let end = start + hlen;
        (start, end)
    }

    fn sender_protocol_addr_range(&self) -> (usize, usize) {
        let hlen = self.hardware_addr_len() as usize;
        let plen = self.protocol_addr_len() as usize;

        let start = 8 + hlen;
        let end = start + plen;
        (start, end)
    }

    fn target_hardware_addr_range(&self) -> (usize, usize) {
        let hlen = self.hardware_addr_len() as usize;
        let plen = self.protocol_addr_len() as usize;

        let start = 8 + hlen + plen;
        let end = start + hlen;
        (start, end)
    }

    fn target_protocol_addr_range(&self) -> (usize, usize) {
        let hlen = self.hardware_addr_len() as usize;
        let plen = self.protocol_addr_len() as usize;

        let start = 8 + (2 * hlen) + plen;
        let end = start + plen;
        (start, end)
    }
}

/// An Ethernet/IPv4 ARP frame with every field zeroed except the fixed type and length fields
impl Default for ArpFrame {
    fn default() -> Self {
        let mut arp_frame = ArpFrame::new(6, 4);
        arp_frame.set_hardware_type(ArpHardwareType::Ethernet as u16);
        arp_frame.set_protocol_type(IPV4_ETHER_TYPE);
        arp_frame
    }
}

impl TryFrom<EthernetFrame> for ArpFrame {
    type Error = &'static str;

    ///
    /// Decorates the given EthernetFrame with ArpFrame getters/setters.
    /// Validates
    /// - The frame has an ARP ether type
    /// - The frame has a reasonable payload size given the hardware/protocol address lengths
    ///
    /// Frames on the wire are padded to the Ethernet minimum, so the payload may be longer than
    /// the ARP fields; it may never be shorter.
    ///
    fn try_from(frame: EthernetFrame) -> Result<Self, Self::Error> {
        if frame.ether_type() != ARP_ETHER_TYPE {
            return Err("Frame does not have ARP ether type.");
        };

        let arp_frame = ArpFrame { frame };
        let payload_len = arp_frame.frame.payload().len();

        if payload_len < 8 {
            return Err("Frame payload is too small");
        }

        let hlen = arp_frame.hardware_addr_len() as usize;
        let plen = arp_frame.protocol_addr_len() as usize;

        if payload_len < (8 + (2 * hlen) + (2 * plen)) {
            return Err("Frame payload doesn't match address length fields");
        }

        Ok(arp_frame)
    }
}

impl From<ArpFrame> for EthernetFrame {
    fn from(arp_frame: ArpFrame) -> Self {
        arp_frame.frame
    }
}

fn be_u16(bytes: &[u8]) -> u16 {
    u16::from_be_bytes([bytes[0], bytes[1]])
}

fn ipv4_from(bytes: &[u8]) -> Ipv4Addr {
    Ipv4Addr::new(bytes[0], bytes[1], bytes[2], bytes[3])
}
