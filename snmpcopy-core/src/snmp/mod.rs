//! SNMPv2c plumbing: identifiers, BER, messages and the UDP transport.
//!
//! The copy core consumes this layer only through [`Transport`]; tests
//! substitute scripted implementations.

pub mod ber;
pub mod codec;
pub mod oid;
pub mod pdu;
pub mod transport;
pub mod value;

pub use codec::SnmpCodec;
pub use oid::Oid;
pub use pdu::{ErrorStatus, Message, Pdu, PduType};
pub use transport::{SnmpTarget, Transport, UdpTransport};
pub use value::{Value, VarBind};
