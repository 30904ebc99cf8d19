//! Tests are written Given/When/Then. The "Given" is nearly always the same small network, so it
//! lives here:
//!
//! ```text
//!   client 192.168.2.2 --- eth1 192.168.2.1
//!   server 172.64.3.10 --- eth2 172.64.3.1
//!   gateway 10.0.1.100 --- eth3 10.0.1.1 --- 10.0.0.0/8
//! ```
//!
//! There is no default route, so anything outside those networks is unreachable.

use crate::utils::test::packet_collectors::{CollectingTransmitter, SentFrame};
use crate::utils::test::packet_generators::Station;
use crate::{Interface, InterfaceList, RouteEntry, Router, RoutingTable};
use crossbeam::channel::Receiver;
use std::net::Ipv4Addr;

pub const ETH1_MAC: [u8; 6] = [0x02, 0, 0, 0, 0, 0x01];
pub const ETH2_MAC: [u8; 6] = [0x02, 0, 0, 0, 0, 0x02];
pub const ETH3_MAC: [u8; 6] = [0x02, 0, 0, 0, 0, 0x03];

pub fn eth1() -> Station {
    Station::new(ETH1_MAC, [192, 168, 2, 1])
}

pub fn eth2() -> Station {
    Station::new(ETH2_MAC, [172, 64, 3, 1])
}

pub fn eth3() -> Station {
    Station::new(ETH3_MAC, [10, 0, 1, 1])
}

pub fn client() -> Station {
    Station::new([0xaa, 0, 0, 0, 0, 0x02], [192, 168, 2, 2])
}

pub fn server() -> Station {
    Station::new([0xbb, 0, 0, 0, 0, 0x10], [172, 64, 3, 10])
}

pub fn gateway() -> Station {
    Station::new([0xcc, 0, 0, 0, 0, 0x64], [10, 0, 1, 100])
}

pub fn interfaces() -> InterfaceList {
    let interface = |name: &str, station: Station| Interface::new(name, station.mac, station.ip);
    InterfaceList::new(vec![
        interface("eth1", eth1()),
        interface("eth2", eth2()),
        interface("eth3", eth3()),
    ])
    .expect("test interfaces are distinct")
}

pub fn routes() -> RoutingTable {
    let mask24 = Ipv4Addr::new(255, 255, 255, 0);
    RoutingTable::new(vec![
        RouteEntry::new(
            Ipv4Addr::new(192, 168, 2, 0),
            Ipv4Addr::UNSPECIFIED,
            mask24,
            "eth1",
        ),
        RouteEntry::new(
            Ipv4Addr::new(172, 64, 3, 0),
            Ipv4Addr::UNSPECIFIED,
            mask24,
            "eth2",
        ),
        RouteEntry::new(
            Ipv4Addr::new(10, 0, 0, 0),
            gateway().ip,
            Ipv4Addr::new(255, 0, 0, 0),
            "eth3",
        ),
        RouteEntry::new(
            Ipv4Addr::new(10, 0, 1, 0),
            Ipv4Addr::UNSPECIFIED,
            mask24,
            "eth3",
        ),
    ])
}

/// The router above, sending into a channel
pub fn test_router() -> (Router<CollectingTransmitter>, Receiver<SentFrame>) {
    let (transmitter, receiver) = CollectingTransmitter::new();
    (router_with(transmitter), receiver)
}

/// The router above with a caller supplied transmitter
pub fn router_with(transmitter: CollectingTransmitter) -> Router<CollectingTransmitter> {
    Router::new(interfaces(), routes(), transmitter).expect("test routes use known interfaces")
}
