/// Interfaces are the router's named attachment points to a link, each with a link address and
/// an IPv4 address. They are configured once at startup and never change afterwards.
pub mod interface;

/// The static routing table, answering longest-prefix-match queries by scanning every entry.
pub mod routing;

/// Address resolution: the cache of learned link addresses, the queue of packets waiting on an
/// answer, and the router logic that sends, retries and answers ARP requests.
pub mod arp;

/// ICMP generation: echo replies for pings aimed at the router and error messages for datagrams
/// the router had to drop.
pub mod icmp;

/// The IPv4 path: validation, local delivery, TTL handling, and the output path shared by
/// forwarded and router-originated datagrams.
pub mod forward;

/// The router itself and its entry point, which classifies incoming frames by ether type.
pub mod router;

/// The background task that periodically sweeps the ARP cache.
pub mod sweep;

/// The seam to the link layer: how the router hands finished frames to an interface.
pub mod transmit;

/// Loading interfaces and routes from their on-disk text formats.
pub mod config;

mod error;
pub use error::{RouterError, TransmitError};

pub use interface::{Interface, InterfaceList};
pub use router::Router;
pub use routing::{RouteEntry, RoutingTable};
pub use transmit::Transmit;

/// Utility module
pub mod utils;
