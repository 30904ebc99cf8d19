use crate::arp::ArpCache;
use crate::{Interface, InterfaceList, RouterError, RoutingTable, Transmit};
use srouter_packets::{EthernetFrame, ARP_ETHER_TYPE, IPV4_ETHER_TYPE};
use std::net::Ipv4Addr;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Instant;
use tracing::{debug, trace, warn};

/// A static IPv4 router. Interfaces and routes are fixed at construction; the only state that
/// changes at runtime is the ARP cache, shared between the packet path and the sweep task.
///
/// Frames come in through `handle_frame` and leave through the `Transmit` implementation the
/// router was built with.
pub struct Router<T: Transmit> {
    interfaces: InterfaceList,
    routes: RoutingTable,
    arp_cache: Mutex<ArpCache>,
    transmitter: T,
}

impl<T: Transmit> Router<T> {
    /// Fails if a route names an interface that is not in `interfaces`.
    pub fn new(
        interfaces: InterfaceList,
        routes: RoutingTable,
        transmitter: T,
    ) -> Result<Self, RouterError> {
        if let Some(route) = routes
            .iter()
            .find(|route| interfaces.by_name(&route.interface).is_none())
        {
            return Err(RouterError::UnknownInterface {
                destination: route.destination,
                interface: route.interface.clone(),
            });
        }

        Ok(Router {
            interfaces,
            routes,
            arp_cache: Mutex::new(ArpCache::new()),
            transmitter,
        })
    }

    /// Entry point for every frame received on `interface`.
    pub fn handle_frame(&self, frame: &[u8], interface: &str) {
        self.handle_frame_at(frame, interface, Instant::now())
    }

    /// `handle_frame` with an explicit notion of the current time, which drives ARP cache
    /// expiry and retry bookkeeping.
    pub fn handle_frame_at(&self, frame: &[u8], interface: &str, now: Instant) {
        let frame = match EthernetFrame::from_buffer(frame.to_vec(), 0) {
            Ok(frame) => frame,
            Err(reason) => {
                trace!(iface = %interface, reason, "dropping runt frame");
                return;
            }
        };

        let ingress = match self.interfaces.by_name(interface) {
            Some(ingress) => ingress,
            None => {
                debug!(iface = %interface, "dropping frame from unknown interface");
                return;
            }
        };

        // Interfaces listen promiscuously, so frames between other stations show up here too.
        let dest_mac = frame.dest_mac();
        if dest_mac != ingress.mac && !dest_mac.is_broadcast() {
            trace!(iface = %interface, dest = %dest_mac, "ignoring frame for another station");
            return;
        }

        match frame.ether_type() {
            ARP_ETHER_TYPE => self.handle_arp(frame, ingress, now),
            IPV4_ETHER_TYPE => self.handle_ipv4(frame, ingress, now),
            ether_type => {
                trace!(iface = %interface, ether_type, "ignoring frame with unhandled ether type")
            }
        }
    }

    pub fn interface_by_name(&self, name: &str) -> Option<&Interface> {
        self.interfaces.by_name(name)
    }

    pub fn interface_by_ip(&self, ip: Ipv4Addr) -> Option<&Interface> {
        self.interfaces.by_ip(ip)
    }

    pub fn all_interfaces(&self) -> &InterfaceList {
        &self.interfaces
    }

    pub fn routing_table(&self) -> &RoutingTable {
        &self.routes
    }

    pub fn transmitter(&self) -> &T {
        &self.transmitter
    }

    /// Locks the ARP cache. A panic on another thread while it held the lock does not leave the
    /// cache in a torn state, so a poisoned lock is taken over rather than propagated.
    pub fn arp_cache(&self) -> MutexGuard<'_, ArpCache> {
        self.arp_cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Hands a finished frame to the link layer. Failures are logged and otherwise ignored.
    pub(crate) fn send(&self, frame: &[u8], interface: &str) {
        trace!(iface = %interface, len = frame.len(), "transmitting frame");
        if let Err(err) = self.transmitter.transmit(frame, interface) {
            warn!(iface = %interface, error = %err, "failed to transmit frame");
        }
    }
}
