//! Bounds-checked message reading.
//!
//! Every read is checked against the length of the datagram; parsing
//! attacker-supplied input can fail with [`Error::Eof`] but can never read
//! past the buffer.

use std::mem::size_of;

use bytemuck::AnyBitPattern;

use crate::{
    name::HostName,
    packet::{Class, Type, CLASS_FLAG},
    Error,
};

/// A cursor over a received datagram.
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    /// The buffer containing the whole DNS message.
    full_buf: &'a [u8],
    /// The current reader position in the buffer.
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { full_buf: buf, pos: 0 }
    }

    fn buf(&self) -> &'a [u8] {
        &self.full_buf[self.pos..]
    }

    pub(crate) fn read_obj<T: AnyBitPattern>(&mut self) -> Result<T, Error> {
        let bytes = self.buf().get(..size_of::<T>()).ok_or(Error::Eof)?;
        self.pos += size_of::<T>();
        Ok(bytemuck::pod_read_unaligned(bytes))
    }

    fn peek_u8(&self) -> Result<u8, Error> {
        self.full_buf.get(self.pos).copied().ok_or(Error::Eof)
    }

    pub(crate) fn read_u8(&mut self) -> Result<u8, Error> {
        let b = self.peek_u8()?;
        self.pos += 1;
        Ok(b)
    }

    pub(crate) fn read_u16(&mut self) -> Result<u16, Error> {
        Ok(u16::from_be_bytes(*self.read_array()?))
    }

    pub(crate) fn read_u32(&mut self) -> Result<u32, Error> {
        Ok(u32::from_be_bytes(*self.read_array()?))
    }

    pub(crate) fn read_slice(&mut self, len: usize) -> Result<&'a [u8], Error> {
        match self.full_buf.get(self.pos..self.pos + len) {
            Some(slice) => {
                self.pos += len;
                Ok(slice)
            }
            None => Err(Error::Eof),
        }
    }

    pub(crate) fn read_array<const LEN: usize>(&mut self) -> Result<&'a [u8; LEN], Error> {
        let slice = self.read_slice(LEN)?;
        Ok(slice.try_into().unwrap())
    }

    /// Advances the cursor past a (possibly compressed) encoded name.
    ///
    /// A compression pointer is consumed as exactly 2 bytes and never
    /// followed: this resolver only needs to step over names inside records,
    /// not reconstruct them.
    pub fn skip_name(&mut self) -> Result<(), Error> {
        loop {
            let len = self.read_u8()?;
            match len & 0b1100_0000 {
                0b1100_0000 => {
                    // Second pointer byte.
                    self.read_u8()?;
                    return Ok(());
                }
                0b0000_0000 => {
                    if len == 0 {
                        return Ok(());
                    }
                    self.read_slice(usize::from(len))?;
                }
                _ => return Err(Error::InvalidValue), // 01/10 in the MSbs is reserved
            }
        }
    }

    /// Reads an uncompressed question name for matching against the device
    /// hostname.
    ///
    /// Returns `None` (with the cursor past the name) when the name cannot
    /// possibly refer to this device: it uses compression, exceeds the fixed
    /// name length, or is otherwise not a valid [`HostName`].
    pub fn read_question_name(&mut self) -> Result<Option<HostName>, Error> {
        let mut text = String::new();
        let mut matchable = true;
        loop {
            let len = self.read_u8()?;
            match len & 0b1100_0000 {
                0b1100_0000 => {
                    self.read_u8()?;
                    return Ok(None);
                }
                0b0000_0000 => {
                    if len == 0 {
                        break;
                    }
                    let label = self.read_slice(usize::from(len))?;
                    if text.len() + label.len() >= HostName::MAX_LEN {
                        // Keep consuming so the cursor ends up past the name.
                        matchable = false;
                        continue;
                    }
                    if !text.is_empty() {
                        text.push('.');
                    }
                    match std::str::from_utf8(label) {
                        Ok(label) => text.push_str(label),
                        Err(_) => matchable = false,
                    }
                }
                _ => return Err(Error::InvalidValue),
            }
        }

        if !matchable {
            return Ok(None);
        }
        Ok(HostName::new(&text).ok())
    }

    /// Reads one answer record, returning a view whose record data borrows
    /// from the datagram.
    pub fn read_answer(&mut self) -> Result<Answer<'a>, Error> {
        self.skip_name()?;
        let type_ = Type(self.read_u16()?);
        let mut cache_flush = false;
        let class = {
            let mut raw = self.read_u16()?;
            if raw & CLASS_FLAG != 0 {
                cache_flush = true;
                raw &= !CLASS_FLAG;
            }
            Class(raw)
        };
        let ttl = self.read_u32()?;
        let rdlength = self.read_u16()?;
        let rdata = self.read_slice(usize::from(rdlength))?;
        Ok(Answer {
            type_,
            class,
            cache_flush,
            ttl,
            rdata,
        })
    }
}

/// A decoded answer record.
///
/// The name field has already been stepped over; only the fixed fields and the
/// record data are retained.
#[derive(Debug)]
pub struct Answer<'a> {
    type_: Type,
    class: Class,
    cache_flush: bool,
    ttl: u32,
    rdata: &'a [u8],
}

impl<'a> Answer<'a> {
    #[inline]
    pub fn type_(&self) -> Type {
        self.type_
    }

    #[inline]
    pub fn class(&self) -> Class {
        self.class
    }

    /// Returns whether the record's mDNS cache-flush bit was set.
    #[inline]
    pub fn cache_flush(&self) -> bool {
        self.cache_flush
    }

    /// Returns the record's Time To Live, in seconds.
    #[inline]
    pub fn ttl(&self) -> u32 {
        self.ttl
    }

    /// Returns the raw record data.
    #[inline]
    pub fn rdata(&self) -> &'a [u8] {
        self.rdata
    }
}
