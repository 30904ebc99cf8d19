use crossbeam::channel::{Receiver, Sender};
use srouter_afpacket::BoundSocket;
use srouter_core::{Router, Transmit};
use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, trace, warn};

/// Big enough for a standard frame and then some; longer frames are truncated by the kernel.
const RECV_BUFFER_LEN: usize = 9216;

/// A frame as it came off the wire, tagged with the interface it arrived on
pub type ReceivedFrame = (String, Vec<u8>);

/// Starts a thread that blocks on `socket` and forwards every frame it reads into `frames`. The
/// thread ends when the socket fails or nobody is listening anymore.
pub fn spawn_receiver(
    socket: Arc<BoundSocket>,
    frames: Sender<ReceivedFrame>,
) -> io::Result<JoinHandle<()>> {
    let name = String::from(socket.name());
    thread::Builder::new()
        .name(format!("rx-{}", name))
        .spawn(move || {
            let mut buffer = vec![0; RECV_BUFFER_LEN];
            loop {
                let len = match socket.recv(&mut buffer) {
                    Ok(len) => len,
                    Err(err) => {
                        warn!(iface = %name, error = %err, "receive failed, closing interface");
                        return;
                    }
                };
                trace!(iface = %name, len, "frame received");
                if frames.send((name.clone(), buffer[..len].to_vec())).is_err() {
                    debug!(iface = %name, "frame consumer is gone");
                    return;
                }
            }
        })
}

/// Feeds received frames to the router until every receiver has hung up.
pub fn process_frames<T: Transmit>(router: &Router<T>, frames: Receiver<ReceivedFrame>) {
    for (interface, frame) in frames.iter() {
        router.handle_frame(&frame, &interface);
    }
}
