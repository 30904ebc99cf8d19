mod link;

use clap::{App, Arg};
use crossbeam::channel;
use srouter_afpacket::{AfPacketTransmitter, Socket};
use srouter_core::config::{self, InterfaceConfig};
use srouter_core::sweep::spawn_arp_sweeper;
use srouter_core::{Interface, InterfaceList, Router, RouterError};
use srouter_packets::MacAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Frames waiting between the receive threads and the router
const FRAME_QUEUE_LEN: usize = 1024;

fn main() -> Result<(), RouterError> {
    // Collect arguments from user
    let matches = cli().get_matches();

    init_logging(matches.is_present("verbose"));

    // Both are required, clap has already rejected a missing one.
    let interfaces_path = matches.value_of("interfaces").unwrap_or_default();
    let rtable_path = matches.value_of("rtable").unwrap_or_default();

    let interface_configs = config::load_interfaces(interfaces_path)?;
    let routes = config::load_routing_table(rtable_path)?;

    let mut transmitter = AfPacketTransmitter::new();
    let mut interfaces = Vec::with_capacity(interface_configs.len());
    let mut sockets = Vec::with_capacity(interface_configs.len());
    for interface_config in interface_configs {
        let socket = Arc::new(Socket::new()?.bind(&interface_config.name)?);
        let interface = bring_up(&interface_config, &socket)?;
        info!(iface = %interface.name, ip = %interface.ip, mac = %interface.mac, "interface up");
        transmitter.add(Arc::clone(&socket));
        interfaces.push(interface);
        sockets.push(socket);
    }

    let router = Arc::new(Router::new(
        InterfaceList::new(interfaces)?,
        routes,
        transmitter,
    )?);
    for route in router.routing_table().iter() {
        debug!(%route, "route");
    }

    let (frames_tx, frames_rx) = channel::bounded(FRAME_QUEUE_LEN);
    for socket in sockets {
        link::spawn_receiver(socket, frames_tx.clone())?;
    }
    drop(frames_tx);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(async {
        let sweeper = spawn_arp_sweeper(Arc::clone(&router));
        let processor = {
            let router = Arc::clone(&router);
            tokio::task::spawn_blocking(move || link::process_frames(&router, frames_rx))
        };
        info!(interfaces = router.all_interfaces().len(), "router running");

        tokio::select! {
            result = tokio::signal::ctrl_c() => match result {
                Ok(()) => info!("interrupted, shutting down"),
                Err(err) => warn!(error = %err, "cannot listen for interrupts, shutting down"),
            },
            _ = processor => warn!("all interfaces closed, shutting down"),
        }
        sweeper.abort();
    });
    // The frame loop is parked in a blocking receive and is not waited for.
    runtime.shutdown_timeout(Duration::from_millis(100));

    println!("The world has been routed");
    Ok(())
}

fn cli() -> App<'static, 'static> {
    App::new("srouter")
        .version("0.1")
        .author("The srouter developers")
        .about("A static IPv4 router on raw Ethernet sockets")
        .arg(
            Arg::with_name("interfaces")
                .short("i")
                .long("interfaces")
                .value_name("FILE")
                .help("Interface file: one `name ipv4 [mac]` per line")
                .required(true)
                .takes_value(true),
        )
        .arg(
            Arg::with_name("rtable")
                .short("r")
                .long("rtable")
                .value_name("FILE")
                .help("Routing table: one `destination gateway mask interface` per line")
                .required(true)
                .takes_value(true),
        )
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .long("verbose")
                .help("Log every routing decision"),
        )
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        "srouter=debug,srouter_core=debug,srouter_afpacket=debug"
    } else {
        "info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}

/// Settles the link address of a configured interface, asking the kernel when the interface file
/// does not give one, and starts listening to all traffic on it.
fn bring_up(
    interface_config: &InterfaceConfig,
    socket: &srouter_afpacket::BoundSocket,
) -> Result<Interface, RouterError> {
    let mac = match interface_config.mac {
        Some(mac) => mac,
        None => socket.hardware_addr()?,
    };
    if mac == MacAddr::ZERO {
        return Err(RouterError::MissingLinkAddress(interface_config.name.clone()));
    }
    socket.set_promiscuous(true)?;
    Ok(Interface::new(&interface_config.name, mac, interface_config.ip))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_files_are_required() {
        assert!(cli()
            .get_matches_from_safe(vec!["srouter", "--rtable", "rtable"])
            .is_err());
        assert!(cli()
            .get_matches_from_safe(vec!["srouter", "--interfaces", "if.conf"])
            .is_err());
    }

    #[test]
    fn parses_files_and_verbosity() {
        let matches = cli()
            .get_matches_from_safe(vec!["srouter", "-i", "if.conf", "--rtable", "rtable", "-v"])
            .unwrap();
        assert_eq!(matches.value_of("interfaces"), Some("if.conf"));
        assert_eq!(matches.value_of("rtable"), Some("rtable"));
        assert!(matches.is_present("verbose"));
    }
}
