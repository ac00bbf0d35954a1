//! SNMPv2c messages and PDUs.
//!
//! ## Wire format
//! ```text
//! Message ::= SEQUENCE {
//!     version    INTEGER        -- 1 for v2c
//!     community  OCTET STRING
//!     pdu        [A0|A2|A3] {
//!         request-id    INTEGER
//!         error-status  INTEGER
//!         error-index   INTEGER
//!         bindings      SEQUENCE OF SEQUENCE { name OID, value ANY }
//!     }
//! }
//! ```

use std::fmt;

use bytes::{Bytes, BytesMut};

use crate::error::CopyError;
use crate::snmp::ber::{self, BerReader, tag};
use crate::snmp::value::VarBind;

/// Message version field for SNMPv2c.
pub const VERSION_2C: i64 = 1;

// ── PduType ──────────────────────────────────────────────────────

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PduType {
    GetRequest = tag::GET_REQUEST,
    GetNextRequest = tag::GET_NEXT_REQUEST,
    Response = tag::RESPONSE,
    SetRequest = tag::SET_REQUEST,
}

impl TryFrom<u8> for PduType {
    type Error = CopyError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            tag::GET_REQUEST => Ok(PduType::GetRequest),
            tag::GET_NEXT_REQUEST => Ok(PduType::GetNextRequest),
            tag::RESPONSE => Ok(PduType::Response),
            tag::SET_REQUEST => Ok(PduType::SetRequest),
            _ => Err(CopyError::UnknownVariant {
                type_name: "PduType",
                value: i64::from(value),
            }),
        }
    }
}

// ── ErrorStatus ──────────────────────────────────────────────────

/// The error-status field of a Response PDU (RFC 3416).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorStatus {
    NoError,
    TooBig,
    NoSuchName,
    BadValue,
    ReadOnly,
    GenErr,
    NoAccess,
    WrongType,
    WrongLength,
    WrongEncoding,
    WrongValue,
    NoCreation,
    InconsistentValue,
    ResourceUnavailable,
    CommitFailed,
    UndoFailed,
    AuthorizationError,
    NotWritable,
    InconsistentName,
    /// A code outside the RFC range; kept so the device's answer is not lost.
    Unknown(i64),
}

impl ErrorStatus {
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => ErrorStatus::NoError,
            1 => ErrorStatus::TooBig,
            2 => ErrorStatus::NoSuchName,
            3 => ErrorStatus::BadValue,
            4 => ErrorStatus::ReadOnly,
            5 => ErrorStatus::GenErr,
            6 => ErrorStatus::NoAccess,
            7 => ErrorStatus::WrongType,
            8 => ErrorStatus::WrongLength,
            9 => ErrorStatus::WrongEncoding,
            10 => ErrorStatus::WrongValue,
            11 => ErrorStatus::NoCreation,
            12 => ErrorStatus::InconsistentValue,
            13 => ErrorStatus::ResourceUnavailable,
            14 => ErrorStatus::CommitFailed,
            15 => ErrorStatus::UndoFailed,
            16 => ErrorStatus::AuthorizationError,
            17 => ErrorStatus::NotWritable,
            18 => ErrorStatus::InconsistentName,
            other => ErrorStatus::Unknown(other),
        }
    }

    pub fn code(&self) -> i64 {
        match self {
            ErrorStatus::NoError => 0,
            ErrorStatus::TooBig => 1,
            ErrorStatus::NoSuchName => 2,
            ErrorStatus::BadValue => 3,
            ErrorStatus::ReadOnly => 4,
            ErrorStatus::GenErr => 5,
            ErrorStatus::NoAccess => 6,
            ErrorStatus::WrongType => 7,
            ErrorStatus::WrongLength => 8,
            ErrorStatus::WrongEncoding => 9,
            ErrorStatus::WrongValue => 10,
            ErrorStatus::NoCreation => 11,
            ErrorStatus::InconsistentValue => 12,
            ErrorStatus::ResourceUnavailable => 13,
            ErrorStatus::CommitFailed => 14,
            ErrorStatus::UndoFailed => 15,
            ErrorStatus::AuthorizationError => 16,
            ErrorStatus::NotWritable => 17,
            ErrorStatus::InconsistentName => 18,
            ErrorStatus::Unknown(code) => *code,
        }
    }
}

impl fmt::Display for ErrorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorStatus::NoError => "noError",
            ErrorStatus::TooBig => "tooBig",
            ErrorStatus::NoSuchName => "noSuchName",
            ErrorStatus::BadValue => "badValue",
            ErrorStatus::ReadOnly => "readOnly",
            ErrorStatus::GenErr => "genErr",
            ErrorStatus::NoAccess => "noAccess",
            ErrorStatus::WrongType => "wrongType",
            ErrorStatus::WrongLength => "wrongLength",
            ErrorStatus::WrongEncoding => "wrongEncoding",
            ErrorStatus::WrongValue => "wrongValue",
            ErrorStatus::NoCreation => "noCreation",
            ErrorStatus::InconsistentValue => "inconsistentValue",
            ErrorStatus::ResourceUnavailable => "resourceUnavailable",
            ErrorStatus::CommitFailed => "commitFailed",
            ErrorStatus::UndoFailed => "undoFailed",
            ErrorStatus::AuthorizationError => "authorizationError",
            ErrorStatus::NotWritable => "notWritable",
            ErrorStatus::InconsistentName => "inconsistentName",
            ErrorStatus::Unknown(code) => return write!(f, "error-status {code}"),
        };
        f.write_str(name)
    }
}

// ── Pdu ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pdu {
    pub pdu_type: PduType,
    pub request_id: i32,
    pub error_status: ErrorStatus,
    pub error_index: u32,
    pub bindings: Vec<VarBind>,
}

impl Pdu {
    pub fn request(pdu_type: PduType, request_id: i32, bindings: Vec<VarBind>) -> Self {
        Self {
            pdu_type,
            request_id,
            error_status: ErrorStatus::NoError,
            error_index: 0,
            bindings,
        }
    }

    /// Build the Response answering `self`, echoing the request id.
    pub fn response(&self, bindings: Vec<VarBind>) -> Self {
        Self {
            pdu_type: PduType::Response,
            request_id: self.request_id,
            error_status: ErrorStatus::NoError,
            error_index: 0,
            bindings,
        }
    }

    pub fn with_error(mut self, status: ErrorStatus, index: u32) -> Self {
        self.error_status = status;
        self.error_index = index;
        self
    }

    /// Surface a non-zero error-status as [`CopyError::Protocol`].
    pub fn check(&self) -> Result<(), CopyError> {
        if self.error_status == ErrorStatus::NoError {
            return Ok(());
        }
        let offending = (self.error_index as usize)
            .checked_sub(1)
            .and_then(|i| self.bindings.get(i))
            .map(|vb| vb.oid.clone());
        Err(CopyError::Protocol {
            status: self.error_status,
            index: self.error_index,
            offending,
        })
    }

    fn encode(&self, buf: &mut BytesMut) -> Result<(), CopyError> {
        let mut list = BytesMut::new();
        for vb in &self.bindings {
            vb.encode(&mut list)?;
        }

        let mut inner = BytesMut::new();
        ber::put_tlv(&mut inner, tag::INTEGER, &ber::integer_content(i64::from(self.request_id)));
        ber::put_tlv(&mut inner, tag::INTEGER, &ber::integer_content(self.error_status.code()));
        ber::put_tlv(&mut inner, tag::INTEGER, &ber::integer_content(i64::from(self.error_index)));
        ber::put_tlv(&mut inner, tag::SEQUENCE, &list);

        ber::put_tlv(buf, self.pdu_type as u8, &inner);
        Ok(())
    }

    fn decode(pdu_tag: u8, content: &[u8]) -> Result<Self, CopyError> {
        let pdu_type = PduType::try_from(pdu_tag)?;
        let mut r = BerReader::new(content);

        let request_id = i32::try_from(r.read_integer()?)
            .map_err(|_| CopyError::malformed("request-id exceeds 32 bits"))?;
        let error_status = ErrorStatus::from_code(r.read_integer()?);
        let error_index = u32::try_from(r.read_integer()?)
            .map_err(|_| CopyError::malformed("negative error-index"))?;

        let mut list = BerReader::new(r.expect(tag::SEQUENCE)?);
        let mut bindings = Vec::new();
        while !list.is_empty() {
            bindings.push(VarBind::decode(list.expect(tag::SEQUENCE)?)?);
        }

        Ok(Self {
            pdu_type,
            request_id,
            error_status,
            error_index,
            bindings,
        })
    }
}

// ── Message ──────────────────────────────────────────────────────

/// A complete community-authenticated SNMP datagram.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub version: i64,
    pub community: Bytes,
    pub pdu: Pdu,
}

impl Message {
    pub fn new(community: impl Into<Bytes>, pdu: Pdu) -> Self {
        Self {
            version: VERSION_2C,
            community: community.into(),
            pdu,
        }
    }

    pub fn encode(&self, buf: &mut BytesMut) -> Result<(), CopyError> {
        let mut inner = BytesMut::new();
        ber::put_tlv(&mut inner, tag::INTEGER, &ber::integer_content(self.version));
        ber::put_tlv(&mut inner, tag::OCTET_STRING, &self.community);
        self.pdu.encode(&mut inner)?;
        ber::put_tlv(buf, tag::SEQUENCE, &inner);
        Ok(())
    }

    pub fn to_bytes(&self) -> Result<Bytes, CopyError> {
        let mut buf = BytesMut::new();
        self.encode(&mut buf)?;
        Ok(buf.freeze())
    }

    pub fn decode(datagram: &[u8]) -> Result<Self, CopyError> {
        let mut outer = BerReader::new(datagram);
        let content = outer.expect(tag::SEQUENCE)?;

        let mut r = BerReader::new(content);
        let version = r.read_integer()?;
        if version != VERSION_2C {
            return Err(CopyError::malformed(format!(
                "unsupported message version {version}"
            )));
        }
        let community = Bytes::copy_from_slice(r.expect(tag::OCTET_STRING)?);
        let (pdu_tag, pdu_content) = r.read_tlv()?;
        let pdu = Pdu::decode(pdu_tag, pdu_content)?;

        Ok(Self {
            version,
            community,
            pdu,
        })
    }
}
