//! BER decoding.
//!
//! Zero-copy: every slice handed out is a [`Bytes`] view into the datagram.

use super::length::decode_length;
use super::tag;
use crate::error::{DecodeErrorKind, Error, Result};
use crate::oid::Oid;
use bytes::Bytes;

/// BER decoder that reads from a byte buffer.
///
/// Offsets reported in errors are relative to the start of the buffer the
/// outermost decoder was created with.
pub struct Decoder {
    data: Bytes,
    offset: usize,
    base: usize,
}

impl Decoder {
    /// Create a new decoder from bytes.
    pub fn new(data: Bytes) -> Self {
        Self {
            data,
            offset: 0,
            base: 0,
        }
    }

    /// Create a decoder from a byte slice (copies the data).
    pub fn from_slice(data: &[u8]) -> Self {
        Self::new(Bytes::copy_from_slice(data))
    }

    /// Current offset, relative to the outermost buffer.
    pub fn offset(&self) -> usize {
        self.base + self.offset
    }

    /// Get remaining bytes.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.offset
    }

    /// Check if we've reached the end.
    pub fn is_empty(&self) -> bool {
        self.offset >= self.data.len()
    }

    /// Peek at the next tag without consuming it.
    pub fn peek_tag(&self) -> Option<u8> {
        self.data.get(self.offset).copied()
    }

    fn fail<T>(&self, at: usize, kind: DecodeErrorKind) -> Result<T> {
        tracing::debug!(
            target: "snmp_walker::ber",
            { snmp.offset = at, kind = %kind },
            "decode failed"
        );
        Err(Error::decode(at, kind))
    }

    /// Read a tag byte.
    pub fn read_tag(&mut self) -> Result<u8> {
        match self.peek_tag() {
            Some(tag) => {
                self.offset += 1;
                Ok(tag)
            }
            None => self.fail(self.offset(), DecodeErrorKind::TruncatedData),
        }
    }

    /// Read a length.
    pub fn read_length(&mut self) -> Result<usize> {
        let (len, consumed) = decode_length(&self.data[self.offset..], self.offset())?;
        self.offset += consumed;
        Ok(len)
    }

    /// Read raw bytes without copying.
    pub fn read_bytes(&mut self, len: usize) -> Result<Bytes> {
        if len > self.remaining() {
            return self.fail(
                self.offset(),
                DecodeErrorKind::InsufficientData {
                    needed: len,
                    available: self.remaining(),
                },
            );
        }
        let bytes = self.data.slice(self.offset..self.offset + len);
        self.offset += len;
        Ok(bytes)
    }

    /// Read and expect a specific tag, returning the content length.
    pub fn expect_tag(&mut self, expected: u8) -> Result<usize> {
        let at = self.offset();
        let actual = self.read_tag()?;
        if actual != expected {
            return self.fail(at, DecodeErrorKind::UnexpectedTag { expected, actual });
        }
        self.read_length()
    }

    /// Read a BER integer (signed).
    pub fn read_integer(&mut self) -> Result<i32> {
        let len = self.expect_tag(tag::universal::INTEGER)?;
        self.read_integer_value(len)
    }

    /// Read integer content given the length.
    ///
    /// Non-minimal encodings are accepted as long as the value fits in 32 bits.
    pub fn read_integer_value(&mut self, len: usize) -> Result<i32> {
        let at = self.offset();
        if len == 0 {
            return self.fail(at, DecodeErrorKind::ZeroLengthInteger);
        }
        let bytes = self.read_bytes(len)?;
        let negative = bytes[0] & 0x80 != 0;
        let pad = if negative { 0xFF } else { 0x00 };
        let significant = bytes.len() - bytes.iter().take_while(|&&b| b == pad).count();
        // one pad octet may be needed to carry the sign
        if significant > 4 || (significant == 4 && (bytes[len - 4] & 0x80 != 0) != negative) {
            return self.fail(at, DecodeErrorKind::IntegerOverflow);
        }
        let value = bytes
            .iter()
            .fold(if negative { -1i64 } else { 0 }, |acc, &b| (acc << 8) | b as i64);
        Ok(value as i32)
    }

    /// Read an unsigned 32-bit integer with specific tag.
    pub fn read_unsigned32(&mut self, expected_tag: u8) -> Result<u32> {
        let len = self.expect_tag(expected_tag)?;
        self.read_unsigned32_value(len)
    }

    /// Read unsigned 32-bit content given the length.
    pub fn read_unsigned32_value(&mut self, len: usize) -> Result<u32> {
        let at = self.offset();
        if len == 0 {
            return self.fail(at, DecodeErrorKind::ZeroLengthInteger);
        }
        let bytes = self.read_bytes(len)?;
        let leading_zeros = bytes.iter().take_while(|&&b| b == 0).count();
        if len - leading_zeros > 4 {
            return self.fail(at, DecodeErrorKind::IntegerOverflow);
        }
        Ok(bytes.iter().fold(0u32, |acc, &b| (acc << 8) | b as u32))
    }

    /// Read an OCTET STRING.
    pub fn read_octet_string(&mut self) -> Result<Bytes> {
        let len = self.expect_tag(tag::universal::OCTET_STRING)?;
        self.read_bytes(len)
    }

    /// Read a NULL.
    pub fn read_null(&mut self) -> Result<()> {
        let len = self.expect_tag(tag::universal::NULL)?;
        if len != 0 {
            return self.fail(self.offset(), DecodeErrorKind::InvalidNull);
        }
        Ok(())
    }

    /// Read an OBJECT IDENTIFIER.
    pub fn read_oid(&mut self) -> Result<Oid> {
        let len = self.expect_tag(tag::universal::OBJECT_IDENTIFIER)?;
        self.read_oid_value(len)
    }

    /// Read OID content given a pre-read length.
    pub fn read_oid_value(&mut self, len: usize) -> Result<Oid> {
        let at = self.offset();
        let bytes = self.read_bytes(len)?;
        Oid::from_ber(&bytes).map_err(|e| match e {
            Error::Decode { offset, kind } => Error::decode(at + offset, kind),
            other => other,
        })
    }

    /// Read a SEQUENCE, returning a decoder for its contents.
    pub fn read_sequence(&mut self) -> Result<Decoder> {
        self.read_constructed(tag::universal::SEQUENCE)
    }

    /// Read a constructed element with a specific tag, returning a decoder
    /// for its contents.
    pub fn read_constructed(&mut self, expected_tag: u8) -> Result<Decoder> {
        let len = self.expect_tag(expected_tag)?;
        self.sub_decoder(len)
    }

    /// Split off the next `len` bytes as a decoder of their own.
    pub fn sub_decoder(&mut self, len: usize) -> Result<Decoder> {
        let base = self.offset();
        let data = self.read_bytes(len)?;
        Ok(Decoder {
            data,
            offset: 0,
            base,
        })
    }

    /// Unconsumed bytes, without copying.
    pub fn remaining_bytes(&self) -> Bytes {
        self.data.slice(self.offset..)
    }
}
