//! mDNS responder: answers queries for the device's own `.local` name.
//!
//! The response is built into a fresh buffer from the parsed question rather
//! than by patching the inbound datagram in place, so the query bytes stay
//! untouched while the answer is assembled.

use std::net::{IpAddr, Ipv6Addr, SocketAddr};

use crate::{
    name::HostName,
    packet::{
        decoder::Reader,
        encoder::Writer,
        Class, Header, QClass, QType, CLASS_FLAG,
    },
    resolver::Config,
    Error, MDNS_PORT,
};

/// TTL advertised on our own address records, in seconds.
const ANSWER_TTL: u32 = 120;

/// Examines an inbound query and, if it asks for this device's name, encodes
/// a response into `out`.
///
/// Returns the response length and destination, or `None` when the query is
/// not for us (which is the common case and not an error). `reader` must be
/// positioned just past the message header.
pub(crate) fn answer_query(
    config: &Config,
    header: &Header,
    mut reader: Reader<'_>,
    src: SocketAddr,
    out: &mut [u8],
) -> Result<Option<(usize, SocketAddr)>, Error> {
    // Only plain one-question queries are considered. Queries carrying
    // answers are valid mDNS (known-answer suppression) but are skipped.
    if header.question_count() != 1 || header.answer_count() != 0 {
        return Ok(None);
    }

    let Some(name) = reader.read_question_name()? else {
        return Ok(None);
    };
    let qtype = QType(reader.read_u16()?);
    // The high class bit is mDNS "unicast response requested", not part of
    // the class itself.
    let qclass = QClass(reader.read_u16()? & !CLASS_FLAG);

    if qclass != QClass::IN {
        return Ok(None);
    }
    if !qtype.matches(config.family.answer_type()) {
        return Ok(None);
    }
    if !is_own_name(&name, config.hostname.as_str()) {
        return Ok(None);
    }

    let addrs: Vec<IpAddr> = config
        .addrs
        .iter()
        .copied()
        .filter(|addr| eligible(addr, config))
        .collect();
    if addrs.is_empty() {
        log::debug!("query for our name but no eligible address to answer with");
        return Ok(None);
    }

    let len = encode_response(out, header.id(), &name, &addrs)?;

    // Queries from the mDNS port get a multicast response; legacy queriers
    // on an ephemeral port are answered directly.
    let dst = if src.port() == MDNS_PORT {
        SocketAddr::from((config.family.mdns_group(), MDNS_PORT))
    } else {
        src
    };
    Ok(Some((len, dst)))
}

/// Checks that `name` is `<hostname>.local`, ASCII case-insensitively.
fn is_own_name(name: &HostName, hostname: &str) -> bool {
    let name = name.as_str();
    if name.len() != hostname.len() + ".local".len() {
        return false;
    }
    let (head, tail) = name.split_at(hostname.len());
    head.eq_ignore_ascii_case(hostname) && tail.eq_ignore_ascii_case(".local")
}

/// Returns whether `addr` may be advertised in a response.
fn eligible(addr: &IpAddr, config: &Config) -> bool {
    match addr {
        IpAddr::V4(_) => !config.family.is_v6(),
        IpAddr::V6(addr) => {
            config.family.is_v6() && (config.include_global_v6 || is_link_local_v6(addr))
        }
    }
}

fn is_link_local_v6(addr: &Ipv6Addr) -> bool {
    addr.segments()[0] & 0xffc0 == 0xfe80
}

/// Encodes an authoritative response carrying one address record per entry in
/// `addrs`.
///
/// The queried name is spelled out once; every further record refers back to
/// it with a compression pointer.
fn encode_response(
    out: &mut [u8],
    id: u16,
    name: &HostName,
    addrs: &[IpAddr],
) -> Result<usize, Error> {
    let mut header = Header::default();
    header.set_id(id);
    header.set_response(true);
    header.set_authority(true);
    header.set_answer_count(addrs.len() as u16);

    let name_offset = std::mem::size_of::<Header>() as u8;

    let mut w = Writer::new(out);
    w.write_obj(header);
    for (i, addr) in addrs.iter().enumerate() {
        if i == 0 {
            w.write_host_name(name);
        } else {
            w.write_u8(0b1100_0000);
            w.write_u8(name_offset);
        }
        match addr {
            IpAddr::V4(addr) => {
                w.write_u16(crate::packet::Type::A.0);
                w.write_u16(Class::IN.0 | CLASS_FLAG);
                w.write_u32(ANSWER_TTL);
                w.write_u16(4);
                w.write_slice(&addr.octets());
            }
            IpAddr::V6(addr) => {
                w.write_u16(crate::packet::Type::AAAA.0);
                w.write_u16(Class::IN.0 | CLASS_FLAG);
                w.write_u32(ANSWER_TTL);
                w.write_u16(16);
                w.write_slice(&addr.octets());
            }
        }
    }
    w.finish()
}

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;

    use super::*;
    use crate::packet::Type;
    use crate::resolver::Family;
    use crate::MDNS_BUFFER_SIZE;

    fn test_config() -> Config {
        Config {
            hostname: HostName::new("gadget").unwrap(),
            addrs: vec![
                IpAddr::V4(Ipv4Addr::new(192, 0, 2, 10)),
                IpAddr::V4(Ipv4Addr::new(192, 0, 2, 11)),
            ],
            ..Config::default()
        }
    }

    fn query_for(name: &str, qtype: QType, qclass: u16) -> Vec<u8> {
        let mut buf = vec![0; MDNS_BUFFER_SIZE];
        let mut header = Header::default();
        header.set_id(0x1234);
        header.set_question_count(1);
        let mut w = Writer::new(&mut buf);
        w.write_obj(header);
        w.write_host_name(&HostName::new(name).unwrap());
        w.write_u16(qtype.0);
        w.write_u16(qclass);
        let len = w.finish().unwrap();
        buf.truncate(len);
        buf
    }

    fn answer(config: &Config, packet: &[u8], src: SocketAddr) -> Option<(Vec<u8>, SocketAddr)> {
        let mut r = Reader::new(packet);
        let header = r.read_obj::<Header>().unwrap();
        let mut out = [0; MDNS_BUFFER_SIZE];
        answer_query(config, &header, r, src, &mut out)
            .unwrap()
            .map(|(len, dst)| (out[..len].to_vec(), dst))
    }

    fn mdns_src() -> SocketAddr {
        SocketAddr::from((Ipv4Addr::new(192, 0, 2, 99), MDNS_PORT))
    }

    #[test]
    fn answers_query_for_own_name() {
        let config = test_config();
        let query = query_for("gadget.local", QType::ANY, QClass::IN.0);
        let (resp, dst) = answer(&config, &query, mdns_src()).unwrap();

        // Multicast query gets a multicast response.
        assert_eq!(dst, SocketAddr::from((crate::MDNS_GROUP_V4, MDNS_PORT)));

        let mut r = Reader::new(&resp);
        let header = r.read_obj::<Header>().unwrap();
        assert_eq!(header.id(), 0x1234);
        assert!(header.is_response());
        assert!(header.is_authority());
        assert_eq!(header.question_count(), 0);
        assert_eq!(header.answer_count(), 2);

        let first = r.read_answer().unwrap();
        assert_eq!(first.type_(), Type::A);
        assert_eq!(first.class(), Class::IN);
        assert!(first.cache_flush());
        assert_eq!(first.ttl(), 120);
        assert_eq!(first.rdata(), &[192, 0, 2, 10]);

        let second = r.read_answer().unwrap();
        assert_eq!(second.rdata(), &[192, 0, 2, 11]);

        // The second record's name must be a 2-byte pointer to the first.
        let name_len = "gadget.local".len() + 2;
        let second_name = 12 + name_len + 10 + 4;
        assert_eq!(resp[second_name], 0b1100_0000);
        assert_eq!(resp[second_name + 1], 12);
    }

    #[test]
    fn matches_case_insensitively() {
        let config = test_config();
        let query = query_for("GaDgEt.LOCAL", QType::A, QClass::IN.0);
        assert!(answer(&config, &query, mdns_src()).is_some());
    }

    #[test]
    fn ignores_other_names() {
        let config = test_config();
        for name in ["other.local", "gadget.example", "gadget.local.lan", "local"] {
            let query = query_for(name, QType::ANY, QClass::IN.0);
            assert_eq!(answer(&config, &query, mdns_src()), None);
        }
    }

    #[test]
    fn ignores_wrong_type_or_class() {
        let config = test_config();
        let query = query_for("gadget.local", QType::AAAA, QClass::IN.0);
        assert_eq!(answer(&config, &query, mdns_src()), None);

        let query = query_for("gadget.local", QType::A, QClass::ANY.0);
        assert_eq!(answer(&config, &query, mdns_src()), None);
    }

    #[test]
    fn accepts_unicast_response_bit() {
        let config = test_config();
        let query = query_for("gadget.local", QType::A, QClass::IN.0 | CLASS_FLAG);
        // A legacy querier on an ephemeral port is answered directly.
        let src = SocketAddr::from((Ipv4Addr::new(192, 0, 2, 99), 49152));
        let (_, dst) = answer(&config, &query, src).unwrap();
        assert_eq!(dst, src);
    }

    #[test]
    fn v6_global_addresses_are_filtered() {
        let mut config = test_config();
        config.family = Family::V6;
        config.addrs = vec![
            "fe80::1".parse().unwrap(),
            "2001:db8::1".parse().unwrap(),
        ];

        let query = query_for("gadget.local", QType::AAAA, QClass::IN.0);
        let (resp, _) = answer(&config, &query, mdns_src()).unwrap();
        let mut r = Reader::new(&resp);
        let header = r.read_obj::<Header>().unwrap();
        assert_eq!(header.answer_count(), 1);
        let ans = r.read_answer().unwrap();
        assert_eq!(ans.type_(), Type::AAAA);
        assert_eq!(ans.rdata()[..2], [0xfe, 0x80]);

        config.include_global_v6 = true;
        let (resp, _) = answer(&config, &query, mdns_src()).unwrap();
        let mut r = Reader::new(&resp);
        assert_eq!(r.read_obj::<Header>().unwrap().answer_count(), 2);
    }
}
