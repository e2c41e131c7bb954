//! Embedded DNS and mDNS hostname resolver.
//!
//! This crate implements the hostname resolution layer of a small-footprint
//! TCP/IP stack: a fixed-capacity table of in-flight and resolved names, a
//! bounds-checked DNS wire codec, a tick-driven retry engine, and (optionally)
//! an mDNS responder that answers queries for the device's own `.local` name.
//!
//! The resolver does not own a socket or a timer. The embedding environment
//! drives it through two entry points on [`resolver::Resolver`]:
//! [`tick`][resolver::Resolver::tick] at a fixed cadence, and
//! [`handle_datagram`][resolver::Resolver::handle_datagram] for every datagram
//! received on the resolver's port. Outgoing packets leave through the
//! [`transport::Transport`] collaborator, and resolution results are announced
//! through [`transport::EventSink`].

use std::net::{Ipv4Addr, Ipv6Addr};

mod error;
mod hex;
mod num;

pub mod name;
pub mod packet;
pub mod resolver;
#[cfg(feature = "responder")]
mod responder;
pub mod table;
pub mod transport;

pub use error::Error;

/// Size of unicast DNS message buffers.
///
/// Unicast DNS messages are limited to 512 Bytes.
pub const DNS_BUFFER_SIZE: usize = 512;

/// Size of multicast DNS message buffers.
///
/// mDNS stays within the local network, so it can use messages up to an
/// Ethernet frame in size.
pub const MDNS_BUFFER_SIZE: usize = 1500;

/// Port that unicast DNS servers listen on.
pub const DNS_PORT: u16 = 53;

/// Port used by mDNS queries and responses.
pub const MDNS_PORT: u16 = 5353;

/// The IPv4 mDNS multicast group.
pub const MDNS_GROUP_V4: Ipv4Addr = Ipv4Addr::new(224, 0, 0, 251);

/// The IPv6 mDNS multicast group.
pub const MDNS_GROUP_V6: Ipv6Addr = Ipv6Addr::new(0xff02, 0, 0, 0, 0, 0, 0, 0xfb);
