//! Definite-form BER lengths (X.690 Section 8.1.3).
//!
//! The indefinite form is never valid in SNMP and is rejected.

use crate::error::{DecodeErrorKind, Error, Result};

/// Largest element length accepted when decoding.
///
/// Everything this crate decodes arrived in one UDP datagram.
pub const MAX_LENGTH: usize = 65535;

/// Encode `len` least significant octet first, ready for
/// [`EncodeBuf`](super::EncodeBuf) to append. Returns the octets and how many
/// of them are used.
pub fn encode_length(len: usize) -> ([u8; 9], usize) {
    let mut out = [0u8; 9];
    if len < 0x80 {
        out[0] = len as u8;
        return (out, 1);
    }
    let octets = (usize::BITS - len.leading_zeros()).div_ceil(8) as usize;
    for (i, slot) in out.iter_mut().take(octets).enumerate() {
        *slot = (len >> (8 * i)) as u8;
    }
    out[octets] = 0x80 | octets as u8;
    (out, octets + 1)
}

/// Decode the length at the start of `data`, returning it with the number of
/// octets it took.
///
/// Errors are reported at `base_offset`, the position of `data` in the
/// enclosing buffer.
pub fn decode_length(data: &[u8], base_offset: usize) -> Result<(usize, usize)> {
    let fail = |kind| Err(Error::decode(base_offset, kind));

    let Some(&first) = data.first() else {
        return fail(DecodeErrorKind::TruncatedData);
    };
    match first {
        0x00..=0x7F => Ok((first as usize, 1)),
        0x80 => fail(DecodeErrorKind::IndefiniteLength),
        _ => {
            let octets = (first & 0x7F) as usize;
            if octets > 4 {
                return fail(DecodeErrorKind::LengthTooLong { octets });
            }
            let Some(content) = data.get(1..=octets) else {
                return fail(DecodeErrorKind::TruncatedData);
            };
            // leading zero octets are legal, so only the value is bounded
            let len = content
                .iter()
                .fold(0usize, |acc, &b| (acc << 8) | b as usize);
            if len > MAX_LENGTH {
                return fail(DecodeErrorKind::LengthExceedsMax {
                    length: len,
                    max: MAX_LENGTH,
                });
            }
            Ok((len, 1 + octets))
        }
    }
}
