use crate::TransmitError;
use std::sync::Arc;

/// Hands a complete Ethernet frame to the named interface. Implementations must be shareable
/// between the packet path and the ARP sweep task.
pub trait Transmit: Send + Sync {
    fn transmit(&self, frame: &[u8], interface: &str) -> Result<(), TransmitError>;
}

impl<T: Transmit + ?Sized> Transmit for Arc<T> {
    fn transmit(&self, frame: &[u8], interface: &str) -> Result<(), TransmitError> {
        (**self).transmit(frame, interface)
    }
}

impl<T: Transmit + ?Sized> Transmit for Box<T> {
    fn transmit(&self, frame: &[u8], interface: &str) -> Result<(), TransmitError> {
        (**self).transmit(frame, interface)
    }
}
