//! The fixed-capacity name cache table.
//!
//! Every resolution attempt, in-flight or finished, occupies one slot. Slots
//! are never freed: a finished slot is overwritten when its name is queried
//! again, or evicted when the table is full and it holds the oldest sequence
//! number. The 8-bit sequence counter wraps, so ages are computed with
//! wrapping subtraction.

use std::net::IpAddr;

use crate::{name::HostName, packet::RCode};

/// Default number of cache slots.
pub const DEFAULT_CAPACITY: usize = 4;

/// Offset added to a slot index to form the transaction ID of its queries.
///
/// Not a security mechanism; it merely keeps our IDs away from the all-zero
/// default so that unrelated traffic is unlikely to decode to slot 0.
const ID_BASE: u16 = 61616;

/// Per-slot resolution state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum State {
    Unused,
    New,
    Asking,
    Done,
    Error,
}

/// One cache slot, tracking a single name's resolution attempt and result.
pub(crate) struct NameEntry {
    pub(crate) name: Option<HostName>,
    pub(crate) state: State,
    /// Ticks until the next retry while in `Asking`.
    pub(crate) timer: u8,
    /// Queries sent so far for the current attempt.
    pub(crate) retries: u8,
    /// Sequence number assigned when the slot was last (re)queried.
    pub(crate) seqno: u8,
    /// Query and answer over the multicast channel instead of the configured
    /// server.
    pub(crate) is_mdns: bool,
    /// The resolved address; only meaningful in `Done`.
    pub(crate) addr: Option<IpAddr>,
    /// The server's response code; only meaningful in `Error`.
    pub(crate) err: RCode,
}

impl NameEntry {
    fn unused() -> Self {
        Self {
            name: None,
            state: State::Unused,
            timer: 0,
            retries: 0,
            seqno: 0,
            is_mdns: false,
            addr: None,
            err: RCode::NO_ERROR,
        }
    }
}

/// The result of a cache lookup.
///
/// `Pending` and `Failed` are distinct on purpose: a caller that polls after
/// the resolved-event can tell "still resolving" apart from "gave up" without
/// tracking events itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    /// The name resolved to this address.
    Resolved(IpAddr),
    /// A query for the name is queued or in flight.
    Pending,
    /// Resolution failed terminally; re-query to try again.
    Failed,
    /// The name is not in the table. It has never been queried, or its slot
    /// has since been evicted.
    Unknown,
}

/// Fixed-capacity table of name entries.
pub struct NameTable {
    slots: Box<[NameEntry]>,
    seqno: u8,
}

impl NameTable {
    pub(crate) fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "name table needs at least one slot");
        Self {
            slots: (0..capacity).map(|_| NameEntry::unused()).collect(),
            seqno: 0,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn slot(&self, index: usize) -> &NameEntry {
        &self.slots[index]
    }

    pub(crate) fn slot_mut(&mut self, index: usize) -> &mut NameEntry {
        &mut self.slots[index]
    }

    /// Claims a slot for `name` and marks it `New`, returning the slot index.
    ///
    /// An existing entry with the same name is refreshed in place. Otherwise
    /// the first unused slot is taken, and if there is none, the slot with the
    /// oldest sequence number is evicted. This never fails: eviction is normal
    /// operation for a bounded cache, not an error.
    pub(crate) fn insert(&mut self, name: HostName) -> usize {
        let mut found = None;
        let mut oldest = 0;
        let mut oldest_age = 0;
        for (i, slot) in self.slots.iter().enumerate() {
            if slot.state == State::Unused || slot.name.as_ref() == Some(&name) {
                found = Some(i);
                break;
            }
            let age = self.seqno.wrapping_sub(slot.seqno);
            if age > oldest_age {
                oldest_age = age;
                oldest = i;
            }
        }
        let index = found.unwrap_or(oldest);

        let slot = &mut self.slots[index];
        slot.is_mdns = cfg!(feature = "mdns") && name.is_link_local();
        slot.name = Some(name);
        slot.state = State::New;
        slot.timer = 0;
        slot.retries = 0;
        slot.seqno = self.seqno;
        slot.addr = None;
        slot.err = RCode::NO_ERROR;
        self.seqno = self.seqno.wrapping_add(1);
        index
    }

    /// Looks `name` up without sending anything.
    pub(crate) fn lookup(&self, name: &HostName) -> Lookup {
        for slot in self.slots.iter() {
            if slot.state == State::Unused || slot.name.as_ref() != Some(name) {
                continue;
            }
            return match slot.state {
                State::Done => match slot.addr {
                    Some(addr) => Lookup::Resolved(addr),
                    None => Lookup::Failed,
                },
                State::New | State::Asking => Lookup::Pending,
                State::Error => Lookup::Failed,
                State::Unused => unreachable!(),
            };
        }
        Lookup::Unknown
    }

    /// Returns the transaction ID that queries for slot `index` carry.
    pub(crate) fn encode_id(&self, index: usize) -> u16 {
        debug_assert!(index < self.slots.len());
        ID_BASE + index as u16
    }

    /// Decodes a response's transaction ID back into a slot index.
    ///
    /// Total and checked: IDs outside the encoding range belong to somebody
    /// else's traffic and yield `None` without touching the table.
    pub(crate) fn decode_id(&self, id: u16) -> Option<usize> {
        let index = usize::from(id.checked_sub(ID_BASE)?);
        (index < self.slots.len()).then_some(index)
    }
}

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;

    use super::*;

    fn host(name: &str) -> HostName {
        HostName::new(name).unwrap()
    }

    #[test]
    fn lookup_is_never_synchronous() {
        let mut table = NameTable::new(DEFAULT_CAPACITY);
        table.insert(host("host.example"));
        assert_eq!(table.lookup(&host("host.example")), Lookup::Pending);
        assert_eq!(table.lookup(&host("other.example")), Lookup::Unknown);
    }

    #[test]
    fn repeated_query_refreshes_in_place() {
        let mut table = NameTable::new(DEFAULT_CAPACITY);
        let first = table.insert(host("host.example"));
        let again = table.insert(host("host.example"));
        assert_eq!(first, again);
        assert_eq!(table.slot(first).seqno, 1);
        assert_eq!(table.seqno, 2);
    }

    #[test]
    fn refresh_resets_finished_entries() {
        let mut table = NameTable::new(DEFAULT_CAPACITY);
        let i = table.insert(host("host.example"));
        table.slot_mut(i).state = State::Done;
        table.slot_mut(i).addr = Some(IpAddr::V4(Ipv4Addr::new(192, 0, 2, 1)));

        assert_eq!(table.insert(host("host.example")), i);
        assert_eq!(table.slot(i).state, State::New);
        assert_eq!(table.lookup(&host("host.example")), Lookup::Pending);
    }

    #[test]
    fn eviction_takes_the_oldest_entry() {
        let mut table = NameTable::new(4);
        for name in ["a.example", "b.example", "c.example", "d.example"] {
            table.insert(host(name));
        }
        // Refresh "a" so that "b" becomes the oldest.
        table.insert(host("a.example"));

        let evicted = table.insert(host("e.example"));
        assert_eq!(table.slot(evicted).name.as_ref(), Some(&host("e.example")));
        assert_eq!(table.lookup(&host("b.example")), Lookup::Unknown);
        assert_eq!(table.lookup(&host("a.example")), Lookup::Pending);
    }

    #[test]
    fn eviction_across_seqno_wraparound() {
        let mut table = NameTable::new(2);
        table.seqno = 254;
        table.insert(host("old.example")); // seqno 254
        table.insert(host("new.example")); // seqno 255, counter wraps to 0

        let evicted = table.insert(host("c.example"));
        assert_eq!(table.slot(evicted).name.as_ref(), Some(&host("c.example")));
        assert_eq!(table.lookup(&host("old.example")), Lookup::Unknown);
        assert_eq!(table.lookup(&host("new.example")), Lookup::Pending);
    }

    #[test]
    fn failed_entries_report_failed() {
        let mut table = NameTable::new(DEFAULT_CAPACITY);
        let i = table.insert(host("host.example"));
        table.slot_mut(i).state = State::Error;
        assert_eq!(table.lookup(&host("host.example")), Lookup::Failed);
    }

    #[test]
    fn transaction_id_roundtrip() {
        let table = NameTable::new(4);
        for i in 0..4 {
            assert_eq!(table.decode_id(table.encode_id(i)), Some(i));
        }
        // Out-of-range and garbage IDs are rejected.
        assert_eq!(table.decode_id(61616 + 4), None);
        assert_eq!(table.decode_id(0), None);
        assert_eq!(table.decode_id(u16::MAX), None);
        assert_eq!(table.decode_id(61615), None);
    }

    #[cfg(feature = "mdns")]
    #[test]
    fn local_names_are_flagged_mdns() {
        let mut table = NameTable::new(DEFAULT_CAPACITY);
        let local = table.insert(host("printer.local"));
        let global = table.insert(host("host.example"));
        assert!(table.slot(local).is_mdns);
        assert!(!table.slot(global).is_mdns);
    }
}
