#![cfg(target_os = "linux")]

use rand::{self, Rng};
use srouter_afpacket::{AfPacketTransmitter, Socket};
use srouter_core::Transmit;
use srouter_packets::{EthernetFrame, IpProtocol, Ipv4Packet, MacAddr};
use std::{net, sync::mpsc, sync::Arc, thread, time::Duration};

fn random_frame() -> Vec<u8> {
    let mut rng = rand::thread_rng();
    let body = {
        let mut body = vec![0; 64];
        rng.fill(&mut body[..]);
        body
    };
    let mut ipv4_pkt = Ipv4Packet::empty();
    ipv4_pkt.set_payload(&body);
    ipv4_pkt.set_protocol(IpProtocol::UDP);
    ipv4_pkt.set_src_addr(net::Ipv4Addr::new(10, 0, 0, 1));
    ipv4_pkt.set_dest_addr(net::Ipv4Addr::new(10, 0, 0, 2));
    ipv4_pkt.set_ttl(2);
    ipv4_pkt.set_checksum();
    let mut eth_pkt = EthernetFrame::encap_ipv4(ipv4_pkt);
    eth_pkt.set_src_mac(MacAddr::BROADCAST);
    eth_pkt.set_dest_mac(MacAddr::BROADCAST);
    eth_pkt.into_inner()
}

#[test]
#[ignore]
fn layer2_loopback() {
    // If this takes more than a second to occur, something's definitely wrong.
    let timeout = Duration::from_secs(1);

    let side_a = Arc::new(Socket::new().unwrap().bind("lo").unwrap());
    let side_b = Socket::new().unwrap().bind("lo").unwrap();

    let (tx, rx) = mpsc::channel();
    let thread_b = thread::spawn(move || {
        let mut in_buffer = vec![0; 1500];
        let len = side_b.recv(&mut in_buffer).unwrap();
        in_buffer.truncate(len);
        tx.send(in_buffer).unwrap();
    });

    let frame = random_frame();
    let mut transmitter = AfPacketTransmitter::new();
    transmitter.add(Arc::clone(&side_a));
    transmitter.transmit(&frame, "lo").unwrap();

    let in_buffer = rx.recv_timeout(timeout).unwrap();
    assert_eq!(in_buffer, frame);

    thread_b.join().unwrap();
}

#[test]
#[ignore]
fn loopback_hardware_address_is_zero() {
    assert_eq!(srouter_afpacket::hardware_addr("lo").unwrap(), MacAddr::ZERO);
    let socket = Socket::new().unwrap().bind("lo").unwrap();
    assert_eq!(socket.hardware_addr().unwrap(), MacAddr::ZERO);
    assert_eq!(socket.name(), "lo");
}

#[test]
fn empty_interface_name_is_an_error() {
    // Fails on the name, or on the socket call when not privileged.
    assert!(srouter_afpacket::hardware_addr("").is_err());
}
