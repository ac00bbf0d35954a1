//! BER primitives for the subset of ASN.1 that SNMP uses.
//!
//! ## Wire format
//!
//! Every element is a definite-length TLV:
//! ```text
//! tag:      u8
//! length:   short form  (0xxx_xxxx)          for 0..=127
//!           long form   (1nnn_nnnn) + n bytes big-endian
//! content:  [u8; length]
//! ```
//!
//! Indefinite lengths are rejected; SNMP never uses them.

use bytes::{BufMut, BytesMut};

use crate::error::CopyError;
use crate::snmp::oid::Oid;

// ── Tags ─────────────────────────────────────────────────────────

pub mod tag {
    pub const INTEGER: u8 = 0x02;
    pub const OCTET_STRING: u8 = 0x04;
    pub const NULL: u8 = 0x05;
    pub const OBJECT_IDENTIFIER: u8 = 0x06;
    pub const SEQUENCE: u8 = 0x30;

    pub const IP_ADDRESS: u8 = 0x40;
    pub const COUNTER32: u8 = 0x41;
    pub const GAUGE32: u8 = 0x42;
    pub const TIME_TICKS: u8 = 0x43;
    pub const OPAQUE: u8 = 0x44;
    pub const COUNTER64: u8 = 0x46;

    pub const NO_SUCH_OBJECT: u8 = 0x80;
    pub const NO_SUCH_INSTANCE: u8 = 0x81;
    pub const END_OF_MIB_VIEW: u8 = 0x82;

    pub const GET_REQUEST: u8 = 0xA0;
    pub const GET_NEXT_REQUEST: u8 = 0xA1;
    pub const RESPONSE: u8 = 0xA2;
    pub const SET_REQUEST: u8 = 0xA3;
}

/// Longest length field we accept, in bytes after the `0x8n` prefix.
const MAX_LENGTH_OCTETS: usize = 4;

// ── Writing ──────────────────────────────────────────────────────

pub fn put_length(buf: &mut BytesMut, len: usize) {
    if len < 0x80 {
        buf.put_u8(len as u8);
        return;
    }
    let bytes = (len as u64).to_be_bytes();
    let skip = bytes.iter().take_while(|&&b| b == 0).count();
    let significant = &bytes[skip..];
    buf.put_u8(0x80 | significant.len() as u8);
    buf.put_slice(significant);
}

pub fn put_tlv(buf: &mut BytesMut, tag: u8, content: &[u8]) {
    buf.put_u8(tag);
    put_length(buf, content.len());
    buf.put_slice(content);
}

/// Minimal two's-complement content octets for a signed integer.
pub fn integer_content(value: i64) -> Vec<u8> {
    let bytes = value.to_be_bytes();
    let mut start = 0;
    while start < bytes.len() - 1 {
        let redundant = (bytes[start] == 0x00 && bytes[start + 1] & 0x80 == 0)
            || (bytes[start] == 0xFF && bytes[start + 1] & 0x80 != 0);
        if !redundant {
            break;
        }
        start += 1;
    }
    bytes[start..].to_vec()
}

/// Content octets for an unsigned application type (Counter, Gauge, ...).
pub fn unsigned_content(value: u64) -> Vec<u8> {
    let bytes = value.to_be_bytes();
    let skip = bytes
        .iter()
        .take(bytes.len() - 1)
        .take_while(|&&b| b == 0)
        .count();
    let mut out = Vec::with_capacity(bytes.len() - skip + 1);
    if bytes[skip] & 0x80 != 0 {
        out.push(0);
    }
    out.extend_from_slice(&bytes[skip..]);
    out
}

pub fn oid_content(oid: &Oid) -> Result<Vec<u8>, CopyError> {
    let arcs = oid.arcs();
    if arcs.len() < 2 {
        return Err(CopyError::InvalidArgument(format!(
            "object identifier {oid} needs at least two arcs"
        )));
    }
    if arcs[0] > 2 || (arcs[0] < 2 && arcs[1] >= 40) {
        return Err(CopyError::InvalidArgument(format!(
            "object identifier {oid} has an invalid leading arc"
        )));
    }

    let mut out = Vec::with_capacity(arcs.len() + 4);
    put_subidentifier(&mut out, u64::from(arcs[0]) * 40 + u64::from(arcs[1]));
    for &arc in &arcs[2..] {
        put_subidentifier(&mut out, u64::from(arc));
    }
    Ok(out)
}

fn put_subidentifier(out: &mut Vec<u8>, mut value: u64) {
    let mut stack = [0u8; 10];
    let mut n = 0;
    loop {
        stack[n] = (value & 0x7F) as u8;
        n += 1;
        value >>= 7;
        if value == 0 {
            break;
        }
    }
    for i in (0..n).rev() {
        let continuation = if i > 0 { 0x80 } else { 0x00 };
        out.push(stack[i] | continuation);
    }
}

// ── Reading ──────────────────────────────────────────────────────

/// Cursor over a buffer of consecutive TLVs.
#[derive(Debug, Clone)]
pub struct BerReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> BerReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Read the next element, returning its tag and content octets.
    pub fn read_tlv(&mut self) -> Result<(u8, &'a [u8]), CopyError> {
        let tag = *self
            .data
            .get(self.pos)
            .ok_or_else(|| CopyError::malformed("truncated tag"))?;
        self.pos += 1;

        let len = self.read_length()?;
        let end = self
            .pos
            .checked_add(len)
            .filter(|&end| end <= self.data.len())
            .ok_or_else(|| {
                CopyError::malformed(format!(
                    "element of {len} bytes overruns buffer of {}",
                    self.data.len()
                ))
            })?;
        let content = &self.data[self.pos..end];
        self.pos = end;
        Ok((tag, content))
    }

    /// Read the next element and require `expected` as its tag.
    pub fn expect(&mut self, expected: u8) -> Result<&'a [u8], CopyError> {
        let (tag, content) = self.read_tlv()?;
        if tag != expected {
            return Err(CopyError::malformed(format!(
                "expected tag {expected:#04x}, found {tag:#04x}"
            )));
        }
        Ok(content)
    }

    pub fn read_integer(&mut self) -> Result<i64, CopyError> {
        decode_integer(self.expect(tag::INTEGER)?)
    }

    fn read_length(&mut self) -> Result<usize, CopyError> {
        let first = *self
            .data
            .get(self.pos)
            .ok_or_else(|| CopyError::malformed("truncated length"))?;
        self.pos += 1;

        if first & 0x80 == 0 {
            return Ok(usize::from(first));
        }
        let octets = usize::from(first & 0x7F);
        if octets == 0 {
            return Err(CopyError::malformed("indefinite length"));
        }
        if octets > MAX_LENGTH_OCTETS {
            return Err(CopyError::malformed(format!("{octets}-byte length field")));
        }
        let bytes = self
            .data
            .get(self.pos..self.pos + octets)
            .ok_or_else(|| CopyError::malformed("truncated length"))?;
        self.pos += octets;
        Ok(bytes.iter().fold(0usize, |acc, &b| (acc << 8) | usize::from(b)))
    }
}

pub fn decode_integer(content: &[u8]) -> Result<i64, CopyError> {
    if content.is_empty() || content.len() > 8 {
        return Err(CopyError::malformed(format!(
            "{}-byte INTEGER",
            content.len()
        )));
    }
    let negative = content[0] & 0x80 != 0;
    let init: i64 = if negative { -1 } else { 0 };
    Ok(content
        .iter()
        .fold(init, |acc, &b| (acc << 8) | i64::from(b)))
}

pub fn decode_unsigned(content: &[u8]) -> Result<u64, CopyError> {
    let digits = match content {
        [] => return Err(CopyError::malformed("empty unsigned value")),
        [0, rest @ ..] if !rest.is_empty() => rest,
        all => all,
    };
    if digits.len() > 8 {
        return Err(CopyError::malformed(format!(
            "{}-byte unsigned value",
            content.len()
        )));
    }
    Ok(digits.iter().fold(0u64, |acc, &b| (acc << 8) | u64::from(b)))
}

pub fn decode_oid(content: &[u8]) -> Result<Oid, CopyError> {
    if content.is_empty() {
        return Err(CopyError::malformed("empty OBJECT IDENTIFIER"));
    }

    let mut subids = Vec::with_capacity(content.len() + 1);
    let mut acc: u64 = 0;
    for (i, &b) in content.iter().enumerate() {
        acc = (acc << 7) | u64::from(b & 0x7F);
        if acc > u64::from(u32::MAX) * 40 + 80 {
            return Err(CopyError::malformed("sub-identifier overflow"));
        }
        if b & 0x80 == 0 {
            subids.push(acc);
            acc = 0;
        } else if i == content.len() - 1 {
            return Err(CopyError::malformed("truncated sub-identifier"));
        }
    }

    let first = subids[0];
    let (a, b) = match first {
        0..=39 => (0, first),
        40..=79 => (1, first - 40),
        _ => (2, first - 80),
    };
    let mut arcs = Vec::with_capacity(subids.len() + 1);
    for value in std::iter::once(a).chain(std::iter::once(b)).chain(subids[1..].iter().copied()) {
        let arc = u32::try_from(value)
            .map_err(|_| CopyError::malformed("sub-identifier exceeds 32 bits"))?;
        arcs.push(arc);
    }
    Ok(Oid::new(arcs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_and_long_lengths() {
        let mut buf = BytesMut::new();
        put_length(&mut buf, 5);
        assert_eq!(&buf[..], &[0x05]);

        let mut buf = BytesMut::new();
        put_length(&mut buf, 300);
        assert_eq!(&buf[..], &[0x82, 0x01, 0x2C]);
    }

    #[test]
    fn integer_minimal_encoding() {
        assert_eq!(integer_content(0), vec![0x00]);
        assert_eq!(integer_content(127), vec![0x7F]);
        assert_eq!(integer_content(128), vec![0x00, 0x80]);
        assert_eq!(integer_content(-1), vec![0xFF]);
        assert_eq!(integer_content(-129), vec![0xFF, 0x7F]);
        assert_eq!(decode_integer(&[0x00, 0x80]).unwrap(), 128);
        assert_eq!(decode_integer(&[0xFF, 0x7F]).unwrap(), -129);
    }

    #[test]
    fn unsigned_keeps_high_bit_positive() {
        assert_eq!(unsigned_content(0), vec![0x00]);
        assert_eq!(unsigned_content(0xFFFF_FFFF), vec![0x00, 0xFF, 0xFF, 0xFF, 0xFF]);
        assert_eq!(
            decode_unsigned(&[0x00, 0xFF, 0xFF, 0xFF, 0xFF]).unwrap(),
            0xFFFF_FFFF
        );
    }

    #[test]
    fn copy_mib_oid_bytes() {
        // 1.3.6.1.4.1.9.9.96.1.1.1.1.14.451
        let oid: Oid = "1.3.6.1.4.1.9.9.96.1.1.1.1.14.451".parse().unwrap();
        let content = oid_content(&oid).unwrap();
        assert_eq!(
            content,
            vec![
                0x2B, 0x06, 0x01, 0x04, 0x01, 0x09, 0x09, 0x60, 0x01, 0x01, 0x01, 0x01, 0x0E,
                0x83, 0x43
            ]
        );
        assert_eq!(decode_oid(&content).unwrap(), oid);
    }

    #[test]
    fn oid_needs_two_arcs() {
        assert!(oid_content(&Oid::new(vec![1])).is_err());
        assert!(oid_content(&Oid::new(vec![1, 40])).is_err());
    }

    #[test]
    fn reader_rejects_overrun_and_indefinite() {
        let mut r = BerReader::new(&[0x04, 0x05, b'a']);
        assert!(r.read_tlv().is_err());

        let mut r = BerReader::new(&[0x30, 0x80, 0x00, 0x00]);
        assert!(r.read_tlv().is_err());
    }

    #[test]
    fn reader_walks_consecutive_elements() {
        let mut buf = BytesMut::new();
        put_tlv(&mut buf, tag::INTEGER, &integer_content(1));
        put_tlv(&mut buf, tag::OCTET_STRING, b"private");

        let mut r = BerReader::new(&buf);
        assert_eq!(r.read_integer().unwrap(), 1);
        assert_eq!(r.expect(tag::OCTET_STRING).unwrap(), b"private");
        assert!(r.is_empty());
    }
}
