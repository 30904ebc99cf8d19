use crate::{Interface, Router, Transmit};
use srouter_packets::{
    EthernetFrame, IcmpType, IpProtocol, Ipv4Packet, TimeExceededCode, UnreachableCode,
};
use std::convert::TryFrom;
use std::net::Ipv4Addr;
use std::time::Instant;
use tracing::{debug, trace, warn};

impl<T: Transmit> Router<T> {
    pub(crate) fn handle_ipv4(&self, frame: EthernetFrame, ingress: &Interface, now: Instant) {
        let packet = match Ipv4Packet::try_from(frame) {
            Ok(packet) => packet,
            Err(reason) => {
                trace!(iface = %ingress.name, reason, "dropping malformed IPv4 datagram");
                return;
            }
        };
        if !packet.validate_checksum() {
            trace!(iface = %ingress.name, src = %packet.src_addr(), "dropping datagram with bad header checksum");
            return;
        }

        if self.interface_by_ip(packet.dest_addr()).is_some() {
            self.deliver_local(packet, ingress, now);
        } else {
            self.forward(packet, ingress, now);
        }
    }

    // The router runs no transport protocols, so anything that is not ICMP gets turned away.
    fn deliver_local(&self, packet: Ipv4Packet, ingress: &Interface, now: Instant) {
        match packet.protocol() {
            IpProtocol::ICMP => self.echo_reply(packet, ingress),
            protocol => {
                debug!(src = %packet.src_addr(), ?protocol, "no listener for datagram addressed to router");
                self.send_icmp_error(
                    &packet,
                    Some(ingress),
                    IcmpType::DestinationUnreachable,
                    UnreachableCode::Port as u8,
                    now,
                );
            }
        }
    }

    fn forward(&self, mut packet: Ipv4Packet, ingress: &Interface, now: Instant) {
        if packet.ttl() <= 1 {
            debug!(src = %packet.src_addr(), dest = %packet.dest_addr(), "TTL expired in transit");
            self.send_icmp_error(
                &packet,
                Some(ingress),
                IcmpType::TimeExceeded,
                TimeExceededCode::TtlExpired as u8,
                now,
            );
            return;
        }

        let destination = packet.dest_addr();
        let route = match self.routing_table().longest_prefix_match(destination) {
            Some(route) => route,
            None => {
                debug!(dest = %destination, "no route to destination");
                self.send_icmp_error(
                    &packet,
                    Some(ingress),
                    IcmpType::DestinationUnreachable,
                    UnreachableCode::Net as u8,
                    now,
                );
                return;
            }
        };

        packet.set_ttl(packet.ttl() - 1);
        packet.set_checksum();
        trace!(dest = %destination, route = %route, "forwarding datagram");
        self.output(packet, &route.interface, route.next_hop(destination), now);
    }

    /// Puts a datagram on the wire towards `next_hop` out of `egress_name`. Datagrams that still
    /// sit in the frame they arrived in are rewritten in place; bare ones get a new Ethernet
    /// header. Without a cached link address for the next hop the frame is queued until ARP
    /// resolves it.
    pub(crate) fn output(
        &self,
        packet: Ipv4Packet,
        egress_name: &str,
        next_hop: Ipv4Addr,
        now: Instant,
    ) {
        let egress = match self.interface_by_name(egress_name) {
            Some(egress) => egress,
            None => {
                warn!(iface = %egress_name, "route names an unknown interface");
                return;
            }
        };

        let mut frame = match packet.layer2_offset {
            Some(_) => {
                let end = packet.end_offset();
                match EthernetFrame::try_from(packet) {
                    Ok(mut frame) => {
                        // Link layer padding is not carried over to the next link.
                        frame.data.truncate(end);
                        frame
                    }
                    Err(reason) => {
                        warn!(reason, "cannot reuse link header");
                        return;
                    }
                }
            }
            None => EthernetFrame::encap_ipv4(packet),
        };
        frame.set_src_mac(egress.mac);
        self.resolve_and_send(frame, egress, next_hop, now);
    }
}
