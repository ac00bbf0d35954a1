//! `tokio_util` codec that frames one SNMP message per UDP datagram.

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

use crate::error::CopyError;
use crate::snmp::pdu::Message;

/// Largest datagram we are willing to emit (RFC 3417 minimum is 484;
/// Cisco agents accept up to 1500).
pub const MAX_MESSAGE_SIZE: usize = 1472;

#[derive(Debug, Default, Clone, Copy)]
pub struct SnmpCodec;

impl Decoder for SnmpCodec {
    type Item = Message;
    type Error = CopyError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.is_empty() {
            return Ok(None);
        }
        // A datagram is always complete; consume it whole so a bad one
        // cannot be re-decoded on the next poll.
        let datagram = src.split();
        Message::decode(&datagram).map(Some)
    }
}

impl Encoder<Message> for SnmpCodec {
    type Error = CopyError;

    fn encode(&mut self, item: Message, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let start = dst.len();
        item.encode(dst)?;
        let size = dst.len() - start;
        if size > MAX_MESSAGE_SIZE {
            dst.truncate(start);
            return Err(CopyError::InvalidArgument(format!(
                "message of {size} bytes exceeds {MAX_MESSAGE_SIZE}"
            )));
        }
        Ok(())
    }
}
