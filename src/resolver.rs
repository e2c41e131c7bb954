//! The resolver context: configuration, the tick-driven query engine, and
//! the inbound datagram handler.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use crate::{
    hex::Hex,
    name::HostName,
    packet::{
        decoder::Reader,
        encoder::encode_query,
        Class, Header, QType, RCode, Type,
    },
    table::{Lookup, NameTable, State, DEFAULT_CAPACITY},
    transport::{EventSink, Transport},
    Error, DNS_BUFFER_SIZE, DNS_PORT, MDNS_GROUP_V4, MDNS_GROUP_V6, MDNS_PORT,
};

/// The address family this resolver queries for.
///
/// The family decides the record type of outgoing questions (A or AAAA) and
/// which answer records are usable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Family {
    V4,
    V6,
}

impl Family {
    pub(crate) fn qtype(self) -> QType {
        match self {
            Family::V4 => QType::A,
            Family::V6 => QType::AAAA,
        }
    }

    pub(crate) fn answer_type(self) -> Type {
        match self {
            Family::V4 => Type::A,
            Family::V6 => Type::AAAA,
        }
    }

    pub(crate) fn is_v6(self) -> bool {
        self == Family::V6
    }

    pub(crate) fn mdns_group(self) -> IpAddr {
        match self {
            Family::V4 => IpAddr::V4(MDNS_GROUP_V4),
            Family::V6 => IpAddr::V6(MDNS_GROUP_V6),
        }
    }

    #[cfg(feature = "localhost")]
    pub(crate) fn loopback(self) -> IpAddr {
        match self {
            Family::V4 => IpAddr::V4(Ipv4Addr::LOCALHOST),
            Family::V6 => IpAddr::V6(Ipv6Addr::LOCALHOST),
        }
    }

    /// Interprets an answer's record data as an address of this family.
    ///
    /// Returns `None` when the data length does not match the family, which
    /// disqualifies the record.
    pub(crate) fn addr_from(self, rdata: &[u8]) -> Option<IpAddr> {
        match self {
            Family::V4 => <[u8; 4]>::try_from(rdata).ok().map(|o| Ipv4Addr::from(o).into()),
            Family::V6 => <[u8; 16]>::try_from(rdata).ok().map(|o| Ipv6Addr::from(o).into()),
        }
    }
}

/// Resolver configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Number of name cache slots.
    pub capacity: usize,
    /// Queries sent per name before giving up (unicast DNS).
    pub max_retries: u8,
    /// Queries sent per name before giving up (mDNS).
    pub max_mdns_retries: u8,
    /// Address family to resolve to.
    pub family: Family,
    /// The unicast DNS server for non-`.local` names.
    pub server: IpAddr,
    /// The device's own hostname, answered for by the mDNS responder as
    /// `<hostname>.local`.
    pub hostname: HostName,
    /// The device's own addresses, advertised by the mDNS responder.
    pub addrs: Vec<IpAddr>,
    /// Advertise global-scope IPv6 addresses in mDNS answers too, instead of
    /// only link-local ones.
    pub include_global_v6: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            max_retries: 8,
            max_mdns_retries: 3,
            family: Family::V4,
            server: IpAddr::V4(Ipv4Addr::new(8, 8, 8, 8)),
            hostname: HostName::new("device").unwrap(),
            addrs: Vec::new(),
            include_global_v6: false,
        }
    }
}

/// A hostname resolver instance.
///
/// Owned by the embedding environment and driven from a single task: the
/// caller invokes [`tick`][Self::tick] at a fixed cadence and
/// [`handle_datagram`][Self::handle_datagram] for inbound traffic. No
/// operation blocks; outgoing packets go through the [`Transport`]
/// collaborator and results are announced through the [`EventSink`].
pub struct Resolver<T: Transport, E: EventSink> {
    config: Config,
    table: NameTable,
    transport: T,
    events: E,
}

impl<T: Transport, E: EventSink> Resolver<T, E> {
    pub fn new(config: Config, transport: T, events: E) -> Self {
        let table = NameTable::new(config.capacity);
        Self {
            config,
            table,
            transport,
            events,
        }
    }

    /// Queues `name` for resolution.
    ///
    /// There is no synchronous result and no capacity error: if the table is
    /// full, the oldest entry is evicted. Callers observe completion through
    /// the event sink or by polling [`lookup`][Self::lookup]. Querying a name
    /// that is already cached restarts its resolution.
    pub fn query(&mut self, name: &str) -> Result<(), Error> {
        let name = HostName::new(name)?;
        log::debug!("starting query for \"{}\"", name);
        self.table.insert(name);
        // Run the driver right away instead of waiting for the next tick.
        self.check_entries();
        Ok(())
    }

    /// Looks `name` up in the cache without sending anything.
    ///
    /// [`query`][Self::query] must have been called for the name first;
    /// resolution is never synchronous.
    pub fn lookup(&self, name: &str) -> Result<Lookup, Error> {
        let name = HostName::new(name)?;
        #[cfg(feature = "localhost")]
        if name.as_str().eq_ignore_ascii_case("localhost") {
            return Ok(Lookup::Resolved(self.config.family.loopback()));
        }
        Ok(self.table.lookup(&name))
    }

    /// Advances the retry state machine by one tick.
    ///
    /// At most one entry is acted on, and at most one query is sent, per
    /// tick; outgoing traffic is bounded by the tick cadence no matter how
    /// many names are pending.
    pub fn tick(&mut self) {
        self.check_entries();
    }

    /// Processes a datagram received on the resolver's port.
    ///
    /// Malformed and unsolicited input is logged and dropped; it never
    /// changes an entry that is not awaiting exactly this response.
    pub fn handle_datagram(&mut self, packet: &[u8], src: SocketAddr) {
        log::trace!("raw packet from {}: {} bytes {}", src, packet.len(), Hex(packet));
        if let Err(e) = self.process_datagram(packet, src) {
            log::warn!("dropping malformed datagram from {}: {}", src, e);
        }
    }

    /// Replaces the unicast DNS server.
    pub fn set_server(&mut self, server: IpAddr) {
        log::info!("using DNS server {}", server);
        self.config.server = server;
    }

    pub fn server(&self) -> IpAddr {
        self.config.server
    }

    /// Replaces the device hostname.
    ///
    /// With the responder enabled this also probes the new name on the
    /// network, so that a collision with another responder shows up as a
    /// resolved entry for our own name.
    pub fn set_hostname(&mut self, hostname: &str) -> Result<(), Error> {
        self.config.hostname = HostName::new(hostname)?;
        #[cfg(feature = "responder")]
        self.check_own_name();
        Ok(())
    }

    pub fn hostname(&self) -> &str {
        self.config.hostname.as_str()
    }

    #[cfg(feature = "responder")]
    fn check_own_name(&mut self) {
        let own = format!("{}.local", self.config.hostname);
        match self.query(&own) {
            Ok(()) => {}
            Err(e) => log::warn!("cannot probe own hostname \"{}\": {}", own, e),
        }
    }

    /// One driver pass: finds the first entry that needs attention, advances
    /// its state, and sends at most one query.
    fn check_entries(&mut self) {
        for index in 0..self.table.len() {
            match self.table.slot(index).state {
                State::New => {
                    let slot = self.table.slot_mut(index);
                    slot.state = State::Asking;
                    slot.timer = 1;
                    slot.retries = 0;
                }
                State::Asking => {
                    let max_retries = if self.table.slot(index).is_mdns {
                        self.config.max_mdns_retries
                    } else {
                        self.config.max_retries
                    };
                    let slot = self.table.slot_mut(index);
                    slot.timer = slot.timer.saturating_sub(1);
                    if slot.timer != 0 {
                        continue;
                    }
                    slot.retries += 1;
                    if slot.retries >= max_retries {
                        slot.state = State::Error;
                        if let Some(name) = slot.name.clone() {
                            log::debug!(
                                "giving up on \"{}\" after {} queries",
                                name,
                                max_retries
                            );
                            self.events.resolved(name.as_str(), None);
                        }
                        continue;
                    }
                    // Linear backoff: wait one tick more per attempt.
                    slot.timer = slot.retries;
                }
                _ => continue,
            }
            self.send_query(index);
            return;
        }
    }

    fn send_query(&mut self, index: usize) {
        let slot = self.table.slot(index);
        let Some(name) = slot.name.clone() else { return };
        let is_mdns = slot.is_mdns;
        let id = self.table.encode_id(index);
        let dst: SocketAddr = if is_mdns {
            (self.config.family.mdns_group(), MDNS_PORT).into()
        } else {
            (self.config.server, DNS_PORT).into()
        };

        let mut buf = [0; DNS_BUFFER_SIZE];
        match encode_query(&mut buf, id, &name, self.config.family.qtype(), !is_mdns) {
            Ok(len) => {
                log::debug!("querying {} for \"{}\" (id {:#06x})", dst, name, id);
                log::trace!("raw query: {}", Hex(&buf[..len]));
                if let Err(e) = self.transport.send(&buf[..len], dst) {
                    log::warn!("failed to send query for \"{}\": {}", name, e);
                }
            }
            Err(e) => log::warn!("failed to encode query for \"{}\": {}", name, e),
        }
    }

    fn process_datagram(&mut self, packet: &[u8], src: SocketAddr) -> Result<(), Error> {
        let mut r = Reader::new(packet);
        let header = r.read_obj::<Header>()?;

        if header.is_unflagged_query() {
            // A query, not a response: only interesting to the responder.
            #[cfg(feature = "responder")]
            return self.answer_query(&header, r, src);
            #[cfg(not(feature = "responder"))]
            {
                let _ = src;
                return Ok(());
            }
        }

        self.process_response(&header, r)
    }

    #[cfg(feature = "responder")]
    fn answer_query(&mut self, header: &Header, r: Reader<'_>, src: SocketAddr) -> Result<(), Error> {
        let mut out = [0; crate::MDNS_BUFFER_SIZE];
        let Some((len, dst)) = crate::responder::answer_query(&self.config, header, r, src, &mut out)?
        else {
            return Ok(());
        };
        log::debug!("answering mDNS query from {} via {}", src, dst);
        if let Err(e) = self.transport.send(&out[..len], dst) {
            log::warn!("failed to send mDNS response: {}", e);
        }
        Ok(())
    }

    fn process_response(&mut self, header: &Header, mut r: Reader<'_>) -> Result<(), Error> {
        let Some(index) = self.table.decode_id(header.id()) else {
            log::debug!("bad ID {:#06x} on incoming response", header.id());
            return Ok(());
        };
        if self.table.slot(index).state != State::Asking {
            log::debug!("stale response for slot {}", index);
            return Ok(());
        }
        if header.answer_count() == 0 {
            // Nothing to learn; keep waiting.
            return Ok(());
        }

        // The entry is finished now: Error until a usable record proves
        // otherwise.
        let name = {
            let slot = self.table.slot_mut(index);
            slot.state = State::Error;
            slot.err = header.rcode();
            slot.name.clone()
        };
        let Some(name) = name else { return Ok(()) };

        if header.rcode() != RCode::NO_ERROR {
            log::debug!("server error for \"{}\": {}", name, header.rcode());
            self.events.resolved(name.as_str(), None);
            return Ok(());
        }

        for _ in 0..header.question_count() {
            r.skip_name()?;
            r.read_slice(4)?; // question type and class
        }

        let family = self.config.family;
        for _ in 0..header.answer_count() {
            let ans = r.read_answer()?;
            if ans.type_() != family.answer_type() || ans.class() != Class::IN {
                continue;
            }
            // A record of the right type whose data length does not match the
            // family is disqualifying too.
            let Some(addr) = family.addr_from(ans.rdata()) else {
                continue;
            };
            let slot = self.table.slot_mut(index);
            slot.state = State::Done;
            slot.addr = Some(addr);
            log::debug!("resolved \"{}\" to {}", name, addr);
            self.events.resolved(name.as_str(), Some(addr));
            return Ok(());
        }

        // Answers were present but none usable: the entry stays failed, and
        // callers see it via `lookup`.
        Ok(())
    }
}
