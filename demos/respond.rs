//! Runs the mDNS responder, answering queries for `<hostname>.local` with the
//! host's interface addresses.

use std::{env, net::IpAddr};

use tinyresolv::{
    name::HostName,
    resolver::{Config, Resolver},
    transport, MDNS_BUFFER_SIZE,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::new()
        .filter_module("tinyresolv", log::LevelFilter::Trace)
        .init();

    let hostname = env::args().nth(1).unwrap_or_else(|| "device".to_string());

    let addrs: Vec<IpAddr> = if_addrs::get_if_addrs()?
        .into_iter()
        .filter(|iface| !iface.is_loopback())
        .map(|iface| iface.ip())
        .collect();

    let sock = transport::mdns_socket_v4()?;
    let mut resolver = Resolver::new(
        Config {
            hostname: HostName::new(&hostname)?,
            addrs,
            ..Config::default()
        },
        sock.try_clone()?,
        |_: &str, _: Option<IpAddr>| {},
    );

    println!("answering mDNS queries for \"{}.local\"", resolver.hostname());
    let mut buf = [0; MDNS_BUFFER_SIZE];
    loop {
        let (len, src) = sock.recv_from(&mut buf)?;
        resolver.handle_datagram(&buf[..len], src);
    }
}
