#![deny(missing_docs)]

use crate::linux;
use libc;
use srouter_packets::MacAddr;
use std::{
    io,
    mem::{self, MaybeUninit},
    ptr,
};

/// Represents an unbound `AF_PACKET` socket.  At this phase of a socket's lifecycle, it can be
/// configured.
pub struct Socket {
    fd: libc::c_int,
}

/// Represents an `AF_PACKET` socket bound to one network interface. Frames can be sent and
/// received through a shared reference, so one socket may serve a receive thread and the
/// transmit path at the same time.
pub struct BoundSocket {
    fd: libc::c_int,
    name: String,
    send_addr: libc::sockaddr_ll,
}

/// Copies an interface name into an `ifreq`, rejecting names the kernel could not hold.
fn ifreq_for(name: &str) -> io::Result<linux::ifreq> {
    if name.is_empty() || name.len() >= libc::IFNAMSIZ || name.as_bytes().contains(&0) {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("invalid interface name {:?}", name),
        ));
    }
    // The name fits with room for its terminating nul, which the zeroed buffer supplies.
    unsafe {
        let mut ifr: linux::ifreq = MaybeUninit::zeroed().assume_init();
        ptr::copy_nonoverlapping(
            name.as_ptr() as *const libc::c_char,
            ifr.ifr_ifrn.ifrn_name.as_mut_ptr(),
            name.len(),
        );
        Ok(ifr)
    }
}

/// Asks the kernel for the hardware address of the named interface.
pub fn hardware_addr(name: &str) -> io::Result<MacAddr> {
    let socket = Socket::new()?;
    ioctl_hardware_addr(socket.fd, name)
}

fn ioctl_hardware_addr(fd: libc::c_int, name: &str) -> io::Result<MacAddr> {
    let mut ifr = ifreq_for(name)?;
    // man 7 netdevice, SIOCGIFHWADDR
    let data = unsafe {
        let err = libc::ioctl(fd, linux::SIOCGIFHWADDR as _, &mut ifr);
        if err < 0 {
            return Err(io::Error::last_os_error());
        }
        ifr.ifr_ifru.ifru_hwaddr.sa_data
    };
    let mut bytes = [0u8; 6];
    for (byte, value) in bytes.iter_mut().zip(data.iter()) {
        *byte = *value as u8;
    }
    Ok(MacAddr::new(bytes))
}

impl Socket {
    /// Creates a new unbound socket. Requires CAP_NET_RAW.
    pub fn new() -> io::Result<Self> {
        // FFI only; nothing Rust owns is handed to the kernel.
        let fd = unsafe {
            // man 7 packet
            let fd = libc::socket(
                libc::AF_PACKET,
                libc::SOCK_RAW,
                (libc::ETH_P_ALL as u16).to_be() as libc::c_int,
            );
            if fd < 0 {
                return Err(io::Error::last_os_error());
            }
            fd
        };
        Ok(Self { fd })
    }

    /// Binds the socket to a network interface. This function consumes the `Socket` instance, as
    /// no more configuration options may be safely changed.
    pub fn bind(self, name: &str) -> io::Result<BoundSocket> {
        let mut ifr = ifreq_for(name)?;
        // The ifreq and sockaddr_ll live on this stack frame for the duration of each call.
        let send_addr = unsafe {
            // ioctl(SIOCGIFINDEX) fills in the index field of the ifreq object
            // man 7 netdevice
            let err = libc::ioctl(self.fd, linux::SIOCGIFINDEX as _, &mut ifr);
            if err < 0 {
                return Err(io::Error::last_os_error());
            }

            let mut ll: libc::sockaddr_ll = MaybeUninit::zeroed().assume_init();
            ll.sll_family = libc::AF_PACKET as libc::c_ushort;
            ll.sll_protocol = (libc::ETH_P_ALL as u16).to_be();
            // expanded from `ifr_ifindex` in kernel headers
            ll.sll_ifindex = ifr.ifr_ifru.ifru_ivalue;
            let err = libc::bind(
                self.fd,
                &ll as *const _ as *const libc::sockaddr,
                mem::size_of::<libc::sockaddr_ll>() as libc::socklen_t,
            );
            if err < 0 {
                return Err(io::Error::last_os_error());
            }
            ll
        };
        let fd = self.fd;
        // The descriptor now belongs to the BoundSocket; `self` must not close it.
        mem::forget(self);
        Ok(BoundSocket {
            fd,
            name: String::from(name),
            send_addr,
        })
    }
}

impl BoundSocket {
    /// Name of the interface the socket is bound to
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Sends a frame to the NIC. Returns the number of bytes the kernel accepted.
    pub fn send(&self, frame: &[u8]) -> io::Result<usize> {
        // The frame is borrowed for the duration of the call and its length passed alongside.
        unsafe {
            let bytes = libc::sendto(
                self.fd,
                frame.as_ptr() as *const _,
                frame.len(),
                0,
                &self.send_addr as *const _ as *const libc::sockaddr,
                mem::size_of::<libc::sockaddr_ll>() as libc::socklen_t,
            );
            if bytes < 0 {
                Err(io::Error::last_os_error())
            } else {
                Ok(bytes as usize)
            }
        }
    }

    /// Blocks until a frame arrives from the NIC and copies it into `frame`, returning its
    /// length. Frames this host transmitted itself are skipped. Frames longer than the buffer are
    /// truncated.
    pub fn recv(&self, frame: &mut [u8]) -> io::Result<usize> {
        loop {
            // See `send`; the sockaddr_ll lives on this stack frame.
            let (bytes, from) = unsafe {
                let mut from = MaybeUninit::<libc::sockaddr_ll>::zeroed();
                let mut addrlen = mem::size_of::<libc::sockaddr_ll>() as libc::socklen_t;
                let bytes = libc::recvfrom(
                    self.fd,
                    frame.as_mut_ptr() as *mut _,
                    frame.len(),
                    0,
                    from.as_mut_ptr() as *mut libc::sockaddr,
                    &mut addrlen,
                );
                (bytes, from.assume_init())
            };
            if bytes < 0 {
                let err = io::Error::last_os_error();
                if err.kind() == io::ErrorKind::Interrupted {
                    continue;
                }
                return Err(err);
            }
            if from.sll_pkttype != linux::PACKET_OUTGOING {
                return Ok(bytes as usize);
            }
        }
    }

    /// Turns promiscuous mode on or off on this NIC. Useful for receiving all frames on an
    /// interface, including those not addressed to the device.
    pub fn set_promiscuous(&self, promiscuous: bool) -> io::Result<()> {
        let mreq = linux::packet_mreq {
            mr_ifindex: self.send_addr.sll_ifindex,
            mr_type: linux::PACKET_MR_PROMISC,
            mr_alen: 0,
            mr_address: [0; 8],
        };
        let option = if promiscuous {
            linux::PACKET_ADD_MEMBERSHIP
        } else {
            linux::PACKET_DROP_MEMBERSHIP
        };
        // man 7 packet, PACKET_ADD_MEMBERSHIP
        let err = unsafe {
            libc::setsockopt(
                self.fd,
                linux::SOL_PACKET,
                option,
                &mreq as *const _ as *const libc::c_void,
                mem::size_of::<linux::packet_mreq>() as libc::socklen_t,
            )
        };
        if err < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    /// Hardware address of the interface the socket is bound to
    pub fn hardware_addr(&self) -> io::Result<MacAddr> {
        ioctl_hardware_addr(self.fd, &self.name)
    }
}

impl Drop for Socket {
    fn drop(&mut self) {
        unsafe {
            libc::close(self.fd);
        }
    }
}

impl Drop for BoundSocket {
    fn drop(&mut self) {
        unsafe {
            libc::close(self.fd);
        }
    }
}
