//! SNMPv1 message framing.
//!
//! `SEQUENCE { version INTEGER (0), community OCTET STRING, pdu PDU }`
//!
//! A single datagram may carry several messages back to back. [`Message::decode`]
//! returns the unconsumed suffix alongside the first message, and
//! [`Messages`] walks a buffer lazily until it is exhausted.

use crate::ber::{Decoder, EncodeBuf};
use crate::error::{DecodeErrorKind, Error, Result};
use crate::pdu::Pdu;
use bytes::Bytes;

/// Version field value for SNMPv1 (RFC 1157).
pub const SNMP_V1: i32 = 0;

/// Community-based SNMPv1 message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Community string, sent in clear text.
    pub community: Bytes,
    pub pdu: Pdu,
}

impl Message {
    /// Create a new message.
    pub fn new(community: impl Into<Bytes>, pdu: Pdu) -> Self {
        Self {
            community: community.into(),
            pdu,
        }
    }

    /// Encode to BER.
    pub fn encode(&self) -> Bytes {
        let mut buf = EncodeBuf::new();
        buf.push_sequence(|buf| {
            self.pdu.encode(buf);
            buf.push_octet_string(&self.community);
            buf.push_integer(SNMP_V1);
        });
        buf.finish()
    }

    /// Decode the first message in `data`, returning it with the bytes that
    /// follow it.
    ///
    /// Fails if `data` is empty, is not a complete SNMPv1 message, or claims a
    /// different version.
    pub fn decode(data: Bytes) -> Result<(Self, Bytes)> {
        if data.is_empty() {
            return Err(Error::decode(0, DecodeErrorKind::EmptyResponse));
        }
        let mut decoder = Decoder::new(data);
        let message = Self::decode_from(&mut decoder)?;
        Ok((message, decoder.remaining_bytes()))
    }

    fn decode_from(decoder: &mut Decoder) -> Result<Self> {
        let mut seq = decoder.read_sequence()?;

        let at = seq.offset();
        let version = seq.read_integer()?;
        if version != SNMP_V1 {
            tracing::debug!(
                target: "snmp_walker::ber",
                { snmp.offset = at, version },
                "not an SNMPv1 message"
            );
            return Err(Error::decode(at, DecodeErrorKind::UnknownVersion(version)));
        }

        let community = seq.read_octet_string()?;
        let pdu = Pdu::decode(&mut seq)?;

        Ok(Message { community, pdu })
    }

    /// Lazily decode every message in `data`.
    ///
    /// ```
    /// use snmp_walker::{Message, Pdu, oid};
    ///
    /// let first = Message::new("public", Pdu::get_next_request(1, &[oid!(1, 3, 6, 1)]));
    /// let second = Message::new("public", Pdu::get_next_request(2, &[oid!(1, 3, 6, 1)]));
    /// let mut datagram = first.encode().to_vec();
    /// datagram.extend_from_slice(&second.encode());
    ///
    /// let decoded: Vec<_> = Message::iter(datagram.into()).collect::<Result<_, _>>().unwrap();
    /// assert_eq!(decoded, vec![first, second]);
    /// ```
    pub fn iter(data: Bytes) -> Messages {
        Messages {
            rest: data,
            consumed: 0,
        }
    }
}

/// Iterator over the messages packed into one buffer.
///
/// Yields at most one error, after which it is exhausted: once framing is
/// lost the remaining bytes cannot be trusted.
pub struct Messages {
    rest: Bytes,
    consumed: usize,
}

impl Messages {
    /// Bytes not yet decoded.
    pub fn remaining(&self) -> &Bytes {
        &self.rest
    }
}

impl Iterator for Messages {
    type Item = Result<Message>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.rest.is_empty() {
            return None;
        }
        let data = std::mem::take(&mut self.rest);
        let len = data.len();
        match Message::decode(data) {
            Ok((message, rest)) => {
                self.consumed += len - rest.len();
                self.rest = rest;
                Some(Ok(message))
            }
            Err(Error::Decode { offset, kind }) => {
                Some(Err(Error::decode(self.consumed + offset, kind)))
            }
            Err(e) => Some(Err(e)),
        }
    }
}

impl std::iter::FusedIterator for Messages {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorStatus;
    use crate::oid;
    use crate::value::Value;
    use crate::varbind::VarBind;

    fn response(request_id: i32) -> Message {
        Message::new(
            "public",
            Pdu::response(
                request_id,
                ErrorStatus::NoError,
                0,
                vec![VarBind::new(
                    oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 2, 5),
                    Value::from("Ethernet0"),
                )],
            ),
        )
    }

    #[test]
    fn test_wire_format() {
        let msg = Message::new("public", Pdu::get_next_request(1, &[oid!(1, 3, 6, 1)]));
        let encoded = msg.encode();
        assert_eq!(
            &encoded[..13],
            &[0x30, 0x21, 0x02, 0x01, 0x00, 0x04, 0x06, b'p', b'u', b'b', b'l', b'i', b'c']
        );
        assert_eq!(encoded[13], 0xA1);
        assert_eq!(encoded.len(), 0x23);
    }

    #[test]
    fn test_decode_returns_remainder() {
        let first = response(10);
        let second = response(11);
        let mut data = first.encode().to_vec();
        data.extend_from_slice(&second.encode());

        let (decoded, rest) = Message::decode(data.into()).unwrap();
        assert_eq!(decoded, first);
        let (decoded, rest) = Message::decode(rest).unwrap();
        assert_eq!(decoded, second);
        assert!(rest.is_empty());
    }

    #[test]
    fn test_reject_empty() {
        assert!(matches!(
            Message::decode(Bytes::new()).unwrap_err(),
            Error::Decode {
                kind: DecodeErrorKind::EmptyResponse,
                ..
            }
        ));
    }

    #[test]
    fn test_reject_v2c() {
        let mut data = response(1).encode().to_vec();
        data[4] = 0x01;
        assert!(matches!(
            Message::decode(data.into()).unwrap_err(),
            Error::Decode {
                offset: 2,
                kind: DecodeErrorKind::UnknownVersion(1)
            }
        ));
    }

    #[test]
    fn test_reject_truncated() {
        let data = response(1).encode();
        for cut in 1..data.len() {
            assert!(Message::decode(data.slice(..cut)).is_err(), "cut at {cut}");
        }
    }

    #[test]
    fn test_iter_stops_after_error() {
        let good = response(1).encode();
        let mut data = good.to_vec();
        data.extend_from_slice(&[0x30, 0x05, 0x02]);
        data.extend_from_slice(&good);

        let mut iter = Message::iter(data.into());
        assert!(iter.next().unwrap().is_ok());
        match iter.next().unwrap() {
            Err(Error::Decode { offset, .. }) => assert!(offset >= good.len()),
            other => panic!("expected decode error, got {other:?}"),
        }
        assert!(iter.next().is_none());
    }
}
