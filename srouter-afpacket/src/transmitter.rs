use crate::BoundSocket;
use srouter_core::{Transmit, TransmitError};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::trace;

/// Sends frames out of bound `AF_PACKET` sockets, one per interface name.
#[derive(Default)]
pub struct AfPacketTransmitter {
    sockets: HashMap<String, Arc<BoundSocket>>,
}

impl AfPacketTransmitter {
    pub fn new() -> Self {
        AfPacketTransmitter {
            sockets: HashMap::new(),
        }
    }

    /// Registers `socket` under the name of the interface it is bound to.
    pub fn add(&mut self, socket: Arc<BoundSocket>) {
        self.sockets.insert(String::from(socket.name()), socket);
    }

    pub fn len(&self) -> usize {
        self.sockets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sockets.is_empty()
    }
}

impl Transmit for AfPacketTransmitter {
    fn transmit(&self, frame: &[u8], interface: &str) -> Result<(), TransmitError> {
        let socket = self
            .sockets
            .get(interface)
            .ok_or_else(|| TransmitError::UnknownInterface(String::from(interface)))?;
        let sent = socket.send(frame).map_err(|source| TransmitError::Io {
            interface: String::from(interface),
            source,
        })?;
        if sent != frame.len() {
            return Err(TransmitError::ShortWrite {
                interface: String::from(interface),
                sent,
                len: frame.len(),
            });
        }
        trace!(iface = %interface, len = sent, "frame sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_interface_is_an_error() {
        let transmitter = AfPacketTransmitter::new();
        assert!(transmitter.is_empty());
        match transmitter.transmit(&[0; 60], "eth0") {
            Err(TransmitError::UnknownInterface(name)) => assert_eq!(name, "eth0"),
            other => panic!("unexpected {:?}", other),
        }
    }
}
