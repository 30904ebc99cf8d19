#![cfg(target_os = "linux")]
mod linux;
mod sockets;
mod transmitter;

pub use sockets::{hardware_addr, BoundSocket, Socket};
pub use transmitter::AfPacketTransmitter;
