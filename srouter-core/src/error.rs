use std::io;
use std::net::Ipv4Addr;
use thiserror::Error;

/// Errors raised while assembling a router. Once a router is running, nothing it does is fatal:
/// bad packets are dropped and failed sends are logged.
#[derive(Debug, Error)]
pub enum RouterError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A line of a configuration file could not be understood.
    #[error("{file}:{line}: {reason}")]
    Parse {
        file: String,
        line: usize,
        reason: String,
    },

    #[error("route to {destination} uses unknown interface {interface}")]
    UnknownInterface {
        destination: Ipv4Addr,
        interface: String,
    },

    #[error("interface {0} is configured more than once")]
    DuplicateInterface(String),

    #[error("address {0} is assigned to more than one interface")]
    DuplicateAddress(Ipv4Addr),

    #[error("interface {0} has no link address")]
    MissingLinkAddress(String),
}

/// A frame could not be handed to the link layer.
#[derive(Debug, Error)]
pub enum TransmitError {
    #[error("no such interface: {0}")]
    UnknownInterface(String),

    #[error("send on {interface} failed: {source}")]
    Io {
        interface: String,
        #[source]
        source: io::Error,
    },

    #[error("short send on {interface}: {sent} of {len} bytes")]
    ShortWrite {
        interface: String,
        sent: usize,
        len: usize,
    },
}
