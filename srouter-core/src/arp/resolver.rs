use super::{QueuedPacket, Resolution};
use crate::{Interface, Router, Transmit};
use srouter_packets::{
    ArpFrame, ArpOp, EthernetFrame, IcmpType, Ipv4Packet, MacAddr, UnreachableCode,
};
use std::convert::TryFrom;
use std::net::Ipv4Addr;
use std::time::Instant;
use tracing::{debug, trace, warn};

impl<T: Transmit> Router<T> {
    pub(crate) fn handle_arp(&self, frame: EthernetFrame, ingress: &Interface, now: Instant) {
        let arp = match ArpFrame::try_from(frame) {
            Ok(arp) => arp,
            Err(reason) => {
                trace!(iface = %ingress.name, reason, "dropping malformed ARP frame");
                return;
            }
        };
        if !arp.is_ethernet_ipv4() {
            trace!(iface = %ingress.name, "dropping ARP frame for other hardware or protocol");
            return;
        }

        let opcode = arp.opcode();
        if opcode == ArpOp::Request as u16 {
            if arp.target_ipv4_addr() != ingress.ip {
                trace!(iface = %ingress.name, target = %arp.target_ipv4_addr(), "ARP request is not for us");
                return;
            }
            debug!(
                iface = %ingress.name,
                requester = %arp.sender_ipv4_addr(),
                "answering ARP request"
            );
            let reply = ArpFrame::reply_to(&arp, ingress.mac, ingress.ip);
            self.send(&reply.frame_ref().data, &ingress.name);
        } else if opcode == ArpOp::Reply as u16 {
            if self.interface_by_ip(arp.target_ipv4_addr()).is_none() {
                trace!(iface = %ingress.name, target = %arp.target_ipv4_addr(), "ARP reply is not for us");
                return;
            }
            self.learn(arp.sender_mac_addr(), arp.sender_ipv4_addr(), now);
        } else {
            trace!(iface = %ingress.name, opcode, "dropping ARP frame with unknown opcode");
        }
    }

    /// Records `ip` at `mac` and releases every packet that was waiting on it, oldest first.
    pub(crate) fn learn(&self, mac: MacAddr, ip: Ipv4Addr, now: Instant) {
        let waiting = self.arp_cache().insert(mac, ip, now);
        debug!(ip = %ip, mac = %mac, "learned link address");

        if let Some(request) = waiting {
            debug!(ip = %ip, packets = request.packets.len(), "sending queued packets");
            for packet in request.packets {
                self.send_queued(packet, mac);
            }
        }
    }

    /// Sends `frame` to `next_hop` when its link address is known. Otherwise the frame is parked
    /// until ARP resolves it; the first packet for an address triggers an ARP request right away
    /// and later ones wait on the sweep for retries.
    pub(crate) fn resolve_and_send(
        &self,
        frame: EthernetFrame,
        egress: &Interface,
        next_hop: Ipv4Addr,
        now: Instant,
    ) {
        let resolution = self
            .arp_cache()
            .resolve_or_enqueue(next_hop, frame, &egress.name, now);
        match resolution {
            Resolution::Ready(frame) => self.send(&frame.data, &egress.name),
            Resolution::Queued { new_request } => {
                trace!(next_hop = %next_hop, iface = %egress.name, "queued packet for address resolution");
                if new_request {
                    self.send_arp_request(next_hop, egress);
                }
            }
        }
    }

    /// Retries unanswered ARP requests, gives up on the ones that have run out of attempts, and
    /// drops aged-out cache entries. Every packet of a request that is given up on is answered
    /// with a host unreachable error.
    pub fn sweep_arp(&self, now: Instant) {
        let outcome = self.arp_cache().sweep(now);
        if outcome.purged_entries > 0 {
            trace!(count = outcome.purged_entries, "purged expired ARP entries");
        }

        for resend in outcome.resend {
            match self.interface_by_name(&resend.interface) {
                Some(egress) => self.send_arp_request(resend.ip, egress),
                None => warn!(iface = %resend.interface, "cannot resend ARP request on unknown interface"),
            }
        }

        for request in outcome.expired {
            debug!(
                ip = %request.ip,
                packets = request.packets.len(),
                "address resolution failed, dropping queued packets"
            );
            for packet in request.packets {
                self.host_unreachable(packet, now);
            }
        }
    }

    fn send_arp_request(&self, target: Ipv4Addr, egress: &Interface) {
        debug!(target = %target, iface = %egress.name, "sending ARP request");
        let request = ArpFrame::request(egress.mac, egress.ip, target);
        self.send(&request.frame_ref().data, &egress.name);
    }

    fn send_queued(&self, packet: QueuedPacket, mac: MacAddr) {
        let egress = match self.interface_by_name(&packet.interface) {
            Some(egress) => egress,
            None => {
                warn!(iface = %packet.interface, "dropping queued packet for unknown interface");
                return;
            }
        };
        let mut frame = match EthernetFrame::from_buffer(packet.frame, 0) {
            Ok(frame) => frame,
            Err(reason) => {
                warn!(reason, "dropping corrupt queued packet");
                return;
            }
        };
        frame.set_dest_mac(mac);
        frame.set_src_mac(egress.mac);
        self.send(&frame.data, &egress.name);
    }

    fn host_unreachable(&self, packet: QueuedPacket, now: Instant) {
        let datagram = EthernetFrame::from_buffer(packet.frame, 0).and_then(Ipv4Packet::try_from);
        match datagram {
            Ok(datagram) => self.send_icmp_error(
                &datagram,
                None,
                IcmpType::DestinationUnreachable,
                UnreachableCode::Host as u8,
                now,
            ),
            Err(reason) => trace!(reason, "queued packet is not an IPv4 datagram"),
        }
    }
}
