use srouter_packets::{EthernetFrame, MacAddr};
use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::time::{Duration, Instant};

/// How long a learned link address stays usable
pub const ARP_ENTRY_TTL: Duration = Duration::from_secs(15);

/// Minimum spacing between two requests for the same address
pub const ARP_RETRY_INTERVAL: Duration = Duration::from_secs(1);

/// Requests sent for one address before its queued packets are given up on
pub const ARP_MAX_SENDS: u32 = 5;

/// An outbound frame parked until its next hop resolves. The Ethernet destination is filled in
/// once the address is known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedPacket {
    pub frame: Vec<u8>,
    pub interface: String,
}

impl QueuedPacket {
    pub fn len(&self) -> usize {
        self.frame.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frame.is_empty()
    }
}

/// An address being resolved and the packets waiting on it, oldest first.
#[derive(Debug, Clone)]
pub struct PendingRequest {
    pub ip: Ipv4Addr,
    pub times_sent: u32,
    pub last_sent: Option<Instant>,
    pub packets: Vec<QueuedPacket>,
}

impl PendingRequest {
    fn new(ip: Ipv4Addr) -> Self {
        PendingRequest {
            ip,
            times_sent: 0,
            last_sent: None,
            packets: Vec::new(),
        }
    }

    /// Records that a request went out at `now`.
    pub fn record_send(&mut self, now: Instant) {
        self.times_sent += 1;
        self.last_sent = Some(now);
    }

    /// Interface the ARP request goes out of: the one the oldest queued packet is bound for.
    pub fn interface(&self) -> Option<&str> {
        self.packets.first().map(|packet| packet.interface.as_str())
    }

    fn due(&self, now: Instant) -> bool {
        match self.last_sent {
            Some(last_sent) => now.saturating_duration_since(last_sent) >= ARP_RETRY_INTERVAL,
            None => true,
        }
    }
}

/// What became of a frame handed to `ArpCache::resolve_or_enqueue`
#[derive(Debug)]
pub enum Resolution {
    /// The next hop is known and the frame is addressed to it.
    Ready(EthernetFrame),
    /// The frame waits on a request. `new_request` is set when this frame opened the request and
    /// its first ARP request is due now.
    Queued { new_request: bool },
}

/// A request the sweep wants sent again
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArpResend {
    pub ip: Ipv4Addr,
    pub interface: String,
}

/// What one sweep decided. The caller acts on it after releasing the cache.
#[derive(Debug, Default)]
pub struct SweepOutcome {
    pub resend: Vec<ArpResend>,
    pub expired: Vec<PendingRequest>,
    pub purged_entries: usize,
}

#[derive(Debug, Clone, Copy)]
struct ArpEntry {
    mac: MacAddr,
    inserted: Instant,
}

/// Learned IPv4 to link address mappings plus the requests still waiting for an answer. An
/// address is either resolved or pending, never both.
#[derive(Debug, Default)]
pub struct ArpCache {
    entries: HashMap<Ipv4Addr, ArpEntry>,
    requests: Vec<PendingRequest>,
}

impl ArpCache {
    pub fn new() -> Self {
        ArpCache {
            entries: HashMap::new(),
            requests: Vec::new(),
        }
    }

    /// The link address of `ip`, unless it was never learned or has aged out.
    pub fn lookup(&self, ip: Ipv4Addr, now: Instant) -> Option<MacAddr> {
        self.entries
            .get(&ip)
            .filter(|entry| now.saturating_duration_since(entry.inserted) < ARP_ENTRY_TTL)
            .map(|entry| entry.mac)
    }

    /// Records a fresh mapping, replacing any older one. Returns the request that was waiting on
    /// this address so its packets can be sent.
    pub fn insert(&mut self, mac: MacAddr, ip: Ipv4Addr, now: Instant) -> Option<PendingRequest> {
        self.entries.insert(ip, ArpEntry { mac, inserted: now });
        let index = self.requests.iter().position(|request| request.ip == ip)?;
        Some(self.requests.remove(index))
    }

    /// Parks `frame` behind the request for `ip`, creating the request if this is the first
    /// packet waiting on it. A new request has `times_sent == 0`. An aged-out entry for `ip` is
    /// dropped so that it cannot shadow the request once it resolves.
    fn enqueue(
        &mut self,
        ip: Ipv4Addr,
        frame: Vec<u8>,
        interface: &str,
        now: Instant,
    ) -> &mut PendingRequest {
        if self.lookup(ip, now).is_none() {
            self.entries.remove(&ip);
        }

        let index = match self.requests.iter().position(|request| request.ip == ip) {
            Some(index) => index,
            None => {
                self.requests.push(PendingRequest::new(ip));
                self.requests.len() - 1
            }
        };
        let request = &mut self.requests[index];
        request.packets.push(QueuedPacket {
            frame,
            interface: String::from(interface),
        });
        request
    }

    /// Addresses `frame` to the cached link address of `ip`, or queues it behind a request for
    /// `ip` when there is none. Both happen under one borrow of the cache, so an answer cannot
    /// slip in between the lookup and the enqueue. A request opened here counts its first send.
    pub fn resolve_or_enqueue(
        &mut self,
        ip: Ipv4Addr,
        mut frame: EthernetFrame,
        interface: &str,
        now: Instant,
    ) -> Resolution {
        if let Some(mac) = self.lookup(ip, now) {
            frame.set_dest_mac(mac);
            return Resolution::Ready(frame);
        }

        let request = self.enqueue(ip, frame.into_inner(), interface, now);
        let new_request = request.times_sent == 0;
        if new_request {
            request.record_send(now);
        }
        Resolution::Queued { new_request }
    }

    pub fn pending(&self, ip: Ipv4Addr) -> Option<&PendingRequest> {
        self.requests.iter().find(|request| request.ip == ip)
    }

    pub fn pending_count(&self) -> usize {
        self.requests.len()
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Retries or expires pending requests and purges aged-out entries. A request whose last
    /// send is at least one retry interval old is sent again, or dropped if it has already been
    /// sent `ARP_MAX_SENDS` times.
    pub fn sweep(&mut self, now: Instant) -> SweepOutcome {
        let mut outcome = SweepOutcome::default();

        let before = self.entries.len();
        self.entries
            .retain(|_, entry| now.saturating_duration_since(entry.inserted) < ARP_ENTRY_TTL);
        outcome.purged_entries = before - self.entries.len();

        let mut kept = Vec::with_capacity(self.requests.len());
        for mut request in self.requests.drain(..) {
            if !request.due(now) {
                kept.push(request);
            } else if request.times_sent >= ARP_MAX_SENDS {
                outcome.expired.push(request);
            } else {
                request.record_send(now);
                if let Some(interface) = request.interface() {
                    outcome.resend.push(ArpResend {
                        ip: request.ip,
                        interface: String::from(interface),
                    });
                }
                kept.push(request);
            }
        }
        self.requests = kept;

        outcome
    }
}
