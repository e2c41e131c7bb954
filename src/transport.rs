//! Collaborator interfaces: the datagram transport and the resolved-event
//! sink.
//!
//! The resolver is transport-agnostic; anything that can push a datagram at
//! an address implements [`Transport`]. On hosted targets a plain
//! [`UdpSocket`] works out of the box, and [`mdns_socket_v4`] builds the
//! shared-port multicast socket that mDNS needs.

use std::{
    io,
    net::{IpAddr, Ipv4Addr, SocketAddr, UdpSocket},
};

use socket2::{Domain, Protocol, Socket, Type};

use crate::{MDNS_GROUP_V4, MDNS_PORT};

/// The unreliable datagram transport the resolver sends through.
pub trait Transport {
    fn send(&mut self, payload: &[u8], dst: SocketAddr) -> io::Result<()>;
}

impl Transport for UdpSocket {
    fn send(&mut self, payload: &[u8], dst: SocketAddr) -> io::Result<()> {
        self.send_to(payload, dst).map(|_| ())
    }
}

impl<T: Transport> Transport for &mut T {
    fn send(&mut self, payload: &[u8], dst: SocketAddr) -> io::Result<()> {
        (**self).send(payload, dst)
    }
}

/// Receives resolution announcements.
///
/// The announcement is a broadcast: it carries the name, and interested
/// parties call [`lookup`][crate::resolver::Resolver::lookup] to decide
/// whether the name they care about is the one that resolved. `addr` is
/// `None` when resolution failed terminally.
pub trait EventSink {
    fn resolved(&mut self, name: &str, addr: Option<IpAddr>);
}

impl<F: FnMut(&str, Option<IpAddr>)> EventSink for F {
    fn resolved(&mut self, name: &str, addr: Option<IpAddr>) {
        self(name, addr)
    }
}

/// Creates a UDP socket bound to the mDNS port and joined to the IPv4 mDNS
/// multicast group.
///
/// The port is shared (`SO_REUSEADDR`) so that the resolver can coexist with
/// other mDNS responders on the same host.
pub fn mdns_socket_v4() -> io::Result<UdpSocket> {
    let sock = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;
    sock.set_reuse_address(true)?;
    sock.bind(&SocketAddr::from((Ipv4Addr::UNSPECIFIED, MDNS_PORT)).into())?;

    let sock = UdpSocket::from(sock);
    sock.join_multicast_v4(&MDNS_GROUP_V4, &Ipv4Addr::UNSPECIFIED)?;
    Ok(sock)
}
