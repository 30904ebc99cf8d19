use srouter_packets::{
    internet_checksum, ArpFrame, EthernetFrame, IcmpType, IpProtocol, Ipv4Packet, MacAddr,
    IPV4_ETHER_TYPE,
};
use std::net::Ipv4Addr;

/// The link and network addresses of one end of a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Station {
    pub mac: MacAddr,
    pub ip: Ipv4Addr,
}

impl Station {
    pub fn new(mac: [u8; 6], ip: [u8; 4]) -> Self {
        Station {
            mac: MacAddr::new(mac),
            ip: Ipv4Addr::from(ip),
        }
    }
}

/// An Ethernet frame carrying an option-less IPv4 datagram with a valid header checksum. The
/// link destination is `to_mac`, which is the router's interface for transit traffic.
pub fn ipv4_frame(
    from: Station,
    to_mac: MacAddr,
    dest: Ipv4Addr,
    ttl: u8,
    protocol: IpProtocol,
    payload: &[u8],
) -> Vec<u8> {
    let mut packet = Ipv4Packet::empty();
    packet.set_payload(payload);
    packet.set_identification(0x1c46);
    packet.set_ttl(ttl);
    packet.set_protocol(protocol);
    packet.set_src_addr(from.ip);
    packet.set_dest_addr(dest);
    packet.set_checksum();

    let mut frame = EthernetFrame::encap_ipv4(packet);
    frame.set_src_mac(from.mac);
    frame.set_dest_mac(to_mac);
    frame.into_inner()
}

/// A UDP datagram from port 5000 to port 53 carrying `data`. The UDP checksum is left zero.
pub fn udp_frame(from: Station, to_mac: MacAddr, dest: Ipv4Addr, ttl: u8, data: &[u8]) -> Vec<u8> {
    let mut udp = Vec::with_capacity(8 + data.len());
    udp.extend_from_slice(&5000u16.to_be_bytes());
    udp.extend_from_slice(&53u16.to_be_bytes());
    udp.extend_from_slice(&((8 + data.len()) as u16).to_be_bytes());
    udp.extend_from_slice(&[0, 0]);
    udp.extend_from_slice(data);
    ipv4_frame(from, to_mac, dest, ttl, IpProtocol::UDP, &udp)
}

/// An ICMP message of the given type and code with `rest` following the checksum field.
pub fn icmp_message(msg_type: u8, code: u8, rest: &[u8]) -> Vec<u8> {
    let mut message = vec![msg_type, code, 0, 0];
    message.extend_from_slice(rest);
    let checksum = internet_checksum(&message);
    message[2..4].copy_from_slice(&checksum.to_be_bytes());
    message
}

pub fn echo_request_frame(
    from: Station,
    to_mac: MacAddr,
    dest: Ipv4Addr,
    identifier: u16,
    sequence: u16,
    data: &[u8],
) -> Vec<u8> {
    let mut rest = Vec::with_capacity(4 + data.len());
    rest.extend_from_slice(&identifier.to_be_bytes());
    rest.extend_from_slice(&sequence.to_be_bytes());
    rest.extend_from_slice(data);
    let message = icmp_message(IcmpType::EchoRequest as u8, 0, &rest);
    ipv4_frame(from, to_mac, dest, 64, IpProtocol::ICMP, &message)
}

/// Broadcast request from `from` asking for `target`
pub fn arp_request_frame(from: Station, target: Ipv4Addr) -> Vec<u8> {
    ArpFrame::request(from.mac, from.ip, target).frame().into_inner()
}

/// Reply from `from` to a request `to` sent
pub fn arp_reply_frame(from: Station, to: Station) -> Vec<u8> {
    let request = ArpFrame::request(to.mac, to.ip, from.ip);
    ArpFrame::reply_to(&request, from.mac, from.ip)
        .frame()
        .into_inner()
}

/// A frame with an ether type the router does not handle (IPv6)
pub fn ipv6_frame(from: Station, to_mac: MacAddr) -> Vec<u8> {
    let mut frame = EthernetFrame::empty();
    frame.set_src_mac(from.mac);
    frame.set_dest_mac(to_mac);
    frame.set_ether_type(0x86dd);
    frame.set_payload(&[0x60, 0, 0, 0, 0, 0, 59, 64]);
    frame.into_inner()
}

/// True when `frame` carries IPv4, for filtering collected output
pub fn is_ipv4(frame: &[u8]) -> bool {
    srouter_packets::ether_type_of(frame) == Some(IPV4_ETHER_TYPE)
}
