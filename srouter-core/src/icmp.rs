use crate::{Interface, Router, Transmit};
use srouter_packets::{
    EthernetFrame, IcmpPacket, IcmpType, IpProtocol, Ipv4Packet, DEFAULT_TTL, ICMP_HEADER_LEN,
};
use std::convert::TryFrom;
use std::time::Instant;
use tracing::{debug, trace, warn};

impl<T: Transmit> Router<T> {
    /// Answers an echo request addressed to one of the router's own addresses. The reply reuses
    /// the request's buffer and goes back out of the interface the request came in on. Other
    /// ICMP messages for the router are ignored.
    pub(crate) fn echo_reply(&self, packet: Ipv4Packet, ingress: &Interface) {
        let mut icmp = match IcmpPacket::try_from(packet) {
            Ok(icmp) => icmp,
            Err(reason) => {
                trace!(iface = %ingress.name, reason, "dropping truncated ICMP message");
                return;
            }
        };
        if icmp.msg_type() != IcmpType::EchoRequest as u8 {
            trace!(iface = %ingress.name, msg_type = icmp.msg_type(), "ignoring ICMP message for router");
            return;
        }
        if !icmp.validate_checksum() {
            trace!(iface = %ingress.name, "dropping echo request with bad ICMP checksum");
            return;
        }

        icmp.set_msg_type(IcmpType::EchoReply as u8);
        icmp.set_code(0);
        icmp.set_checksum();

        let mut reply = Ipv4Packet::from(icmp);
        let requester = reply.src_addr();
        let target = reply.dest_addr();
        reply.set_src_addr(target);
        reply.set_dest_addr(requester);
        reply.set_ttl(DEFAULT_TTL);
        reply.set_checksum();

        let end = reply.end_offset();
        let mut frame = match EthernetFrame::try_from(reply) {
            Ok(frame) => frame,
            Err(reason) => {
                warn!(reason, "echo request lost its link header");
                return;
            }
        };
        frame.data.truncate(end);
        let requester_mac = frame.src_mac();
        frame.set_dest_mac(requester_mac);
        frame.set_src_mac(ingress.mac);

        debug!(iface = %ingress.name, dest = %requester, "sending echo reply");
        self.send(&frame.data, &ingress.name);
    }

    /// Reports a dropped datagram back to its source. `ingress` is where the offending datagram
    /// arrived and supplies the error's source address; without one, the address of the
    /// interface facing the source is used. The error is silently skipped when one must not be
    /// sent or when there is no route back.
    pub(crate) fn send_icmp_error(
        &self,
        offending: &Ipv4Packet,
        ingress: Option<&Interface>,
        msg_type: IcmpType,
        code: u8,
        now: Instant,
    ) {
        if !self.should_generate_error(offending) {
            trace!(src = %offending.src_addr(), ?msg_type, "suppressing ICMP error");
            return;
        }

        let destination = offending.src_addr();
        let route = match self.routing_table().longest_prefix_match(destination) {
            Some(route) => route,
            None => {
                debug!(dest = %destination, ?msg_type, "no route back for ICMP error");
                return;
            }
        };
        let source = match ingress.or_else(|| self.interface_by_name(&route.interface)) {
            Some(interface) => interface.ip,
            None => return,
        };

        let mut datagram = Ipv4Packet::encap_icmp(IcmpPacket::error(msg_type, code, offending));
        datagram.set_src_addr(source);
        datagram.set_dest_addr(destination);
        datagram.set_checksum();

        debug!(dest = %destination, ?msg_type, code, "sending ICMP error");
        self.output(datagram, &route.interface, route.next_hop(destination), now);
    }

    // RFC 1812 4.3.2.7: when not to send ICMP errors
    fn should_generate_error(&self, packet: &Ipv4Packet) -> bool {
        // Only the first fragment
        if packet.fragment_offset() != 0 {
            return false;
        }
        // No errors about errors, or about ICMP too short to tell
        if packet.protocol() == IpProtocol::ICMP {
            let payload = packet.payload();
            if payload.len() < ICMP_HEADER_LEN || IcmpType::is_error(payload[0]) {
                return false;
            }
        }
        let source = packet.src_addr();
        if source.is_broadcast()
            || source.is_multicast()
            || source.is_unspecified()
            || source.is_loopback()
        {
            return false;
        }
        self.interface_by_ip(source).is_none()
    }
}
