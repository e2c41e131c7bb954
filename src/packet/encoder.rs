//! Message writing and query construction.

use bytemuck::NoUninit;

use crate::{
    name::HostName,
    packet::{Header, QClass, QType},
    Error,
};

/// A cursor over an outgoing message buffer.
///
/// Writes that do not fit set a truncation flag instead of panicking;
/// [`Writer::finish`] reports truncation as [`Error::Truncated`].
pub(crate) struct Writer<'a> {
    buf: &'a mut [u8],
    pos: usize,
    trunc: bool,
}

impl<'a> Writer<'a> {
    pub(crate) fn new(buf: &'a mut [u8]) -> Self {
        Self {
            buf,
            pos: 0,
            trunc: false,
        }
    }

    pub(crate) fn write_slice(&mut self, data: &[u8]) {
        let buf = &mut self.buf[self.pos..];
        if data.len() > buf.len() {
            self.trunc = true;
            buf.copy_from_slice(&data[..buf.len()]);
            self.pos += buf.len();
        } else {
            buf[..data.len()].copy_from_slice(data);
            self.pos += data.len();
        }
    }

    pub(crate) fn write_obj<T: NoUninit>(&mut self, obj: T) {
        self.write_slice(bytemuck::bytes_of(&obj))
    }

    pub(crate) fn write_u8(&mut self, b: u8) {
        self.write_slice(&[b]);
    }

    pub(crate) fn write_u16(&mut self, v: u16) {
        self.write_slice(&v.to_be_bytes());
    }

    pub(crate) fn write_u32(&mut self, v: u32) {
        self.write_slice(&v.to_be_bytes());
    }

    /// Writes `name` as a sequence of length-prefixed labels, terminated by
    /// the root label.
    ///
    /// Host names are bounded well below the 63-byte label limit, so every
    /// label fits into a plain length byte.
    pub(crate) fn write_host_name(&mut self, name: &HostName) {
        for label in name.labels() {
            self.write_u8(label.len() as u8);
            self.write_slice(label.as_bytes());
        }
        self.write_u8(0);
    }

    pub(crate) fn finish(self) -> Result<usize, Error> {
        if self.trunc {
            Err(Error::Truncated)
        } else {
            Ok(self.pos)
        }
    }
}

/// Builds a single-question query message in `buf`, returning the number of
/// bytes written.
///
/// The message consists of a header carrying `id`, the encoded `name`, and the
/// fixed 4-byte type/class trailer. `recursion_desired` is set for unicast
/// queries only; mDNS has no recursing servers.
pub fn encode_query(
    buf: &mut [u8],
    id: u16,
    name: &HostName,
    qtype: QType,
    recursion_desired: bool,
) -> Result<usize, Error> {
    let mut header = Header::default();
    header.set_id(id);
    header.set_recursion_desired(recursion_desired);
    header.set_question_count(1);

    let mut w = Writer::new(buf);
    w.write_obj(header);
    w.write_host_name(name);
    w.write_u16(qtype.0);
    w.write_u16(QClass::IN.0);
    w.finish()
}
