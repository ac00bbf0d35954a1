//! Typed SNMP values and variable bindings.

use std::fmt;
use std::net::Ipv4Addr;

use bytes::{Bytes, BytesMut};

use crate::error::CopyError;
use crate::snmp::ber::{self, BerReader, tag};
use crate::snmp::oid::Oid;

// ── Value ────────────────────────────────────────────────────────

/// A value carried in a variable binding.
///
/// Covers the SMIv2 base and application types plus the three
/// SNMPv2 exception markers a Get may return in place of a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Integer(i32),
    OctetString(Bytes),
    Null,
    ObjectIdentifier(Oid),
    IpAddress(Ipv4Addr),
    Counter32(u32),
    Gauge32(u32),
    TimeTicks(u32),
    Opaque(Bytes),
    Counter64(u64),
    NoSuchObject,
    NoSuchInstance,
    EndOfMibView,
}

impl Value {
    pub fn octet_string(text: impl Into<String>) -> Self {
        Value::OctetString(Bytes::from(text.into()))
    }

    /// `true` for Null and the SNMPv2 exception markers: the device had
    /// nothing to report for this identifier.
    pub fn is_absent(&self) -> bool {
        matches!(
            self,
            Value::Null | Value::NoSuchObject | Value::NoSuchInstance | Value::EndOfMibView
        )
    }

    pub fn as_integer(&self) -> Option<i32> {
        match self {
            Value::Integer(v) => Some(*v),
            _ => None,
        }
    }

    pub fn encode(&self, buf: &mut BytesMut) -> Result<(), CopyError> {
        match self {
            Value::Integer(v) => ber::put_tlv(buf, tag::INTEGER, &ber::integer_content(i64::from(*v))),
            Value::OctetString(b) => ber::put_tlv(buf, tag::OCTET_STRING, b),
            Value::Null => ber::put_tlv(buf, tag::NULL, &[]),
            Value::ObjectIdentifier(oid) => {
                ber::put_tlv(buf, tag::OBJECT_IDENTIFIER, &ber::oid_content(oid)?)
            }
            Value::IpAddress(addr) => ber::put_tlv(buf, tag::IP_ADDRESS, &addr.octets()),
            Value::Counter32(v) => {
                ber::put_tlv(buf, tag::COUNTER32, &ber::unsigned_content(u64::from(*v)))
            }
            Value::Gauge32(v) => ber::put_tlv(buf, tag::GAUGE32, &ber::unsigned_content(u64::from(*v))),
            Value::TimeTicks(v) => {
                ber::put_tlv(buf, tag::TIME_TICKS, &ber::unsigned_content(u64::from(*v)))
            }
            Value::Opaque(b) => ber::put_tlv(buf, tag::OPAQUE, b),
            Value::Counter64(v) => ber::put_tlv(buf, tag::COUNTER64, &ber::unsigned_content(*v)),
            Value::NoSuchObject => ber::put_tlv(buf, tag::NO_SUCH_OBJECT, &[]),
            Value::NoSuchInstance => ber::put_tlv(buf, tag::NO_SUCH_INSTANCE, &[]),
            Value::EndOfMibView => ber::put_tlv(buf, tag::END_OF_MIB_VIEW, &[]),
        }
        Ok(())
    }

    pub fn decode(tag_byte: u8, content: &[u8]) -> Result<Self, CopyError> {
        let value = match tag_byte {
            tag::INTEGER => {
                let v = ber::decode_integer(content)?;
                Value::Integer(i32::try_from(v).map_err(|_| {
                    CopyError::malformed(format!("INTEGER {v} exceeds 32 bits"))
                })?)
            }
            tag::OCTET_STRING => Value::OctetString(Bytes::copy_from_slice(content)),
            tag::NULL => Value::Null,
            tag::OBJECT_IDENTIFIER => Value::ObjectIdentifier(ber::decode_oid(content)?),
            tag::IP_ADDRESS => {
                let octets: [u8; 4] = content
                    .try_into()
                    .map_err(|_| CopyError::malformed(format!("{}-byte IpAddress", content.len())))?;
                Value::IpAddress(Ipv4Addr::from(octets))
            }
            tag::COUNTER32 => Value::Counter32(unsigned32(content)?),
            tag::GAUGE32 => Value::Gauge32(unsigned32(content)?),
            tag::TIME_TICKS => Value::TimeTicks(unsigned32(content)?),
            tag::OPAQUE => Value::Opaque(Bytes::copy_from_slice(content)),
            tag::COUNTER64 => Value::Counter64(ber::decode_unsigned(content)?),
            tag::NO_SUCH_OBJECT => Value::NoSuchObject,
            tag::NO_SUCH_INSTANCE => Value::NoSuchInstance,
            tag::END_OF_MIB_VIEW => Value::EndOfMibView,
            other => {
                return Err(CopyError::malformed(format!(
                    "unsupported value tag {other:#04x}"
                )));
            }
        };
        Ok(value)
    }
}

fn unsigned32(content: &[u8]) -> Result<u32, CopyError> {
    let v = ber::decode_unsigned(content)?;
    u32::try_from(v).map_err(|_| CopyError::malformed(format!("{v} exceeds 32 bits")))
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(v) => write!(f, "{v}"),
            Value::OctetString(b) | Value::Opaque(b) => match std::str::from_utf8(b) {
                Ok(text) => f.write_str(text),
                Err(_) => {
                    f.write_str("0x")?;
                    b.iter().try_for_each(|byte| write!(f, "{byte:02x}"))
                }
            },
            Value::Null => f.write_str("null"),
            Value::ObjectIdentifier(oid) => write!(f, "{oid}"),
            Value::IpAddress(addr) => write!(f, "{addr}"),
            Value::Counter32(v) | Value::Gauge32(v) => write!(f, "{v}"),
            Value::TimeTicks(v) => write!(f, "{v} ticks"),
            Value::Counter64(v) => write!(f, "{v}"),
            Value::NoSuchObject => f.write_str("noSuchObject"),
            Value::NoSuchInstance => f.write_str("noSuchInstance"),
            Value::EndOfMibView => f.write_str("endOfMibView"),
        }
    }
}

// ── VarBind ──────────────────────────────────────────────────────

/// One (identifier, value) pair of a request or response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarBind {
    pub oid: Oid,
    pub value: Value,
}

impl VarBind {
    pub fn new(oid: Oid, value: Value) -> Self {
        Self { oid, value }
    }

    /// A binding used to request `oid` in a Get.
    pub fn null(oid: Oid) -> Self {
        Self {
            oid,
            value: Value::Null,
        }
    }

    pub fn encode(&self, buf: &mut BytesMut) -> Result<(), CopyError> {
        let mut inner = BytesMut::new();
        ber::put_tlv(&mut inner, tag::OBJECT_IDENTIFIER, &ber::oid_content(&self.oid)?);
        self.value.encode(&mut inner)?;
        ber::put_tlv(buf, tag::SEQUENCE, &inner);
        Ok(())
    }

    pub fn decode(content: &[u8]) -> Result<Self, CopyError> {
        let mut r = BerReader::new(content);
        let oid = ber::decode_oid(r.expect(tag::OBJECT_IDENTIFIER)?)?;
        let (value_tag, value_content) = r.read_tlv()?;
        let value = Value::decode(value_tag, value_content)?;
        if !r.is_empty() {
            return Err(CopyError::malformed("trailing data in variable binding"));
        }
        Ok(Self { oid, value })
    }
}

impl fmt::Display for VarBind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.oid, self.value)
    }
}
