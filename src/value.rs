//! SNMPv1 value types.
//!
//! The [`Value`] enum covers the SMIv1 types a GET-NEXT response can carry.
//! Anything else decodes to [`Value::Unknown`] with its tag and raw content,
//! so one odd column does not poison the whole response.

use crate::ber::{Decoder, EncodeBuf, tag};
use crate::error::{DecodeErrorKind, Error, Result};
use crate::oid::Oid;
use bytes::Bytes;
use std::fmt;
use std::net::Ipv4Addr;

/// SNMP value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value {
    /// NULL, the placeholder in requests and the "no more data" marker in
    /// responses.
    Null,
    /// INTEGER (signed 32-bit).
    Integer(i32),
    /// OCTET STRING. May hold binary data such as MAC addresses.
    OctetString(Bytes),
    /// OBJECT IDENTIFIER.
    ObjectIdentifier(Oid),
    /// IpAddress (4 bytes, network order).
    IpAddress([u8; 4]),
    /// Counter (monotonically increasing, wraps at 2^32).
    Counter32(u32),
    /// Gauge (may go up or down).
    Gauge32(u32),
    /// TimeTicks (hundredths of a second).
    TimeTicks(u32),
    /// Any other tag, including Opaque, kept verbatim.
    Unknown { tag: u8, data: Bytes },
}

impl Value {
    /// Whether this is [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Integer view of the numeric variants.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(v) => Some(*v as i64),
            Value::Counter32(v) | Value::Gauge32(v) | Value::TimeTicks(v) => Some(*v as i64),
            _ => None,
        }
    }

    /// Raw bytes of an OCTET STRING or an unknown value.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::OctetString(data) | Value::Unknown { data, .. } => Some(data),
            _ => None,
        }
    }

    /// OCTET STRING as text, if it is printable.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::OctetString(data) => printable(data),
            _ => None,
        }
    }

    /// The BER tag this value is encoded with.
    pub fn tag(&self) -> u8 {
        match self {
            Value::Null => tag::universal::NULL,
            Value::Integer(_) => tag::universal::INTEGER,
            Value::OctetString(_) => tag::universal::OCTET_STRING,
            Value::ObjectIdentifier(_) => tag::universal::OBJECT_IDENTIFIER,
            Value::IpAddress(_) => tag::application::IP_ADDRESS,
            Value::Counter32(_) => tag::application::COUNTER32,
            Value::Gauge32(_) => tag::application::GAUGE32,
            Value::TimeTicks(_) => tag::application::TIMETICKS,
            Value::Unknown { tag, .. } => *tag,
        }
    }

    /// Encode to BER.
    pub fn encode(&self, buf: &mut EncodeBuf) {
        match self {
            Value::Null => buf.push_null(),
            Value::Integer(v) => buf.push_integer(*v),
            Value::OctetString(data) => buf.push_octet_string(data),
            Value::ObjectIdentifier(oid) => buf.push_oid(oid),
            Value::IpAddress(addr) => buf.push_ip_address(*addr),
            Value::Counter32(v) | Value::Gauge32(v) | Value::TimeTicks(v) => {
                buf.push_unsigned32(self.tag(), *v)
            }
            Value::Unknown { tag, data } => buf.push_tlv(*tag, data),
        }
    }

    /// Decode from BER, dispatching on the tag.
    pub fn decode(decoder: &mut Decoder) -> Result<Self> {
        let at = decoder.offset();
        let tag = decoder.read_tag()?;
        let len = decoder.read_length()?;

        match tag {
            tag::universal::INTEGER => Ok(Value::Integer(decoder.read_integer_value(len)?)),
            tag::universal::OCTET_STRING => Ok(Value::OctetString(decoder.read_bytes(len)?)),
            tag::universal::NULL => {
                if len != 0 {
                    return Err(Error::decode(at, DecodeErrorKind::InvalidNull));
                }
                Ok(Value::Null)
            }
            tag::universal::OBJECT_IDENTIFIER => {
                Ok(Value::ObjectIdentifier(decoder.read_oid_value(len)?))
            }
            tag::application::IP_ADDRESS => {
                if len != 4 {
                    return Err(Error::decode(
                        at,
                        DecodeErrorKind::InvalidIpAddressLength { length: len },
                    ));
                }
                let data = decoder.read_bytes(4)?;
                Ok(Value::IpAddress([data[0], data[1], data[2], data[3]]))
            }
            tag::application::COUNTER32 => {
                Ok(Value::Counter32(decoder.read_unsigned32_value(len)?))
            }
            tag::application::GAUGE32 => Ok(Value::Gauge32(decoder.read_unsigned32_value(len)?)),
            tag::application::TIMETICKS => {
                Ok(Value::TimeTicks(decoder.read_unsigned32_value(len)?))
            }
            _ => {
                let data = decoder.read_bytes(len)?;
                tracing::trace!(
                    target: "snmp_walker::ber",
                    { snmp.offset = at, tag },
                    "unrecognized value tag kept as unknown"
                );
                Ok(Value::Unknown { tag, data })
            }
        }
    }
}

fn printable(data: &[u8]) -> Option<&str> {
    let text = std::str::from_utf8(data).ok()?;
    text.chars()
        .all(|c| !c.is_control() || matches!(c, '\t' | '\r' | '\n'))
        .then_some(text)
}

fn write_hex(f: &mut fmt::Formatter<'_>, data: &[u8]) -> fmt::Result {
    f.write_str("0x")?;
    for b in data {
        write!(f, "{:02x}", b)?;
    }
    Ok(())
}

/// Renders the value the way walk rows carry it: numbers in decimal, text
/// as-is, binary octet strings and unknown types as `0x` hex.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Integer(v) => write!(f, "{}", v),
            Value::OctetString(data) => match printable(data) {
                Some(text) => f.write_str(text),
                None => write_hex(f, data),
            },
            Value::ObjectIdentifier(oid) => write!(f, "{}", oid),
            Value::IpAddress(addr) => write!(f, "{}", Ipv4Addr::from(*addr)),
            Value::Counter32(v) | Value::Gauge32(v) | Value::TimeTicks(v) => write!(f, "{}", v),
            Value::Unknown { data, .. } => write_hex(f, data),
        }
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(v)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::OctetString(Bytes::copy_from_slice(s.as_bytes()))
    }
}

impl From<Oid> for Value {
    fn from(oid: Oid) -> Self {
        Value::ObjectIdentifier(oid)
    }
}

impl From<Ipv4Addr> for Value {
    fn from(addr: Ipv4Addr) -> Self {
        Value::IpAddress(addr.octets())
    }
}
