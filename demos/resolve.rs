//! Resolves a hostname given on the command line and prints the result.

use std::{env, io, net::IpAddr, net::UdpSocket, process, time::Duration};

use tinyresolv::{
    resolver::{Config, Resolver},
    table::Lookup,
    MDNS_BUFFER_SIZE,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::new()
        .filter_module("tinyresolv", log::LevelFilter::Trace)
        .init();

    let name = env::args().nth(1).unwrap_or_else(|| {
        eprintln!("usage: resolve <hostname>");
        process::exit(1);
    });

    let sock = UdpSocket::bind("0.0.0.0:0")?;
    // The receive timeout doubles as the resolver's tick cadence.
    sock.set_read_timeout(Some(Duration::from_secs(1)))?;

    let mut resolver = Resolver::new(
        Config::default(),
        sock.try_clone()?,
        |name: &str, addr: Option<IpAddr>| match addr {
            Some(addr) => println!("{} -> {}", name, addr),
            None => println!("{}: resolution failed", name),
        },
    );
    resolver.query(&name)?;

    let mut buf = [0; MDNS_BUFFER_SIZE];
    loop {
        match sock.recv_from(&mut buf) {
            Ok((len, src)) => resolver.handle_datagram(&buf[..len], src),
            Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) => {
                resolver.tick();
            }
            Err(e) => return Err(e.into()),
        }
        if resolver.lookup(&name)? != Lookup::Pending {
            return Ok(());
        }
    }
}
