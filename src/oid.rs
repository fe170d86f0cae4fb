//! Object Identifier (OID) type.
//!
//! OIDs are stored as `SmallVec<[u32; 16]>` so table-column OIDs such as
//! `1.3.6.1.2.1.2.2.1.2.5` never touch the heap.

use crate::error::{DecodeErrorKind, Error, OidErrorKind, Result};
use smallvec::SmallVec;
use std::fmt;

/// Maximum number of arcs (subidentifiers) allowed in an OID.
///
/// RFC 2578 Section 3.5: "there are at most 128 sub-identifiers in a value".
pub const MAX_OID_LEN: usize = 128;

/// Object Identifier.
///
/// Ordering is lexicographic over the arcs, which is the order agents
/// traverse their MIB view in for GET-NEXT.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Oid {
    arcs: SmallVec<[u32; 16]>,
}

impl Oid {
    /// Create an empty OID.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Create an OID from arc values.
    ///
    /// ```
    /// use snmp_walker::oid::Oid;
    ///
    /// let oid = Oid::new([1, 3, 6, 1, 2, 1]);
    /// assert_eq!(oid.arcs(), &[1, 3, 6, 1, 2, 1]);
    /// ```
    pub fn new(arcs: impl IntoIterator<Item = u32>) -> Self {
        Self {
            arcs: arcs.into_iter().collect(),
        }
    }

    /// Create an OID from a slice of arcs.
    pub fn from_slice(arcs: &[u32]) -> Self {
        Self {
            arcs: SmallVec::from_slice(arcs),
        }
    }

    /// Parse an OID from dotted notation (`"1.3.6.1.2.1.1.1.0"`).
    ///
    /// A single leading dot is accepted, as net-snmp tools print OIDs that way.
    ///
    /// ```
    /// use snmp_walker::oid::Oid;
    ///
    /// let oid = Oid::parse(".1.3.6.1.2.1.2.2.1.2").unwrap();
    /// assert_eq!(oid.to_string(), "1.3.6.1.2.1.2.2.1.2");
    /// assert!(Oid::parse("1.3.x").is_err());
    /// assert!(Oid::parse("").is_err());
    /// ```
    pub fn parse(s: &str) -> Result<Self> {
        let body = s.strip_prefix('.').unwrap_or(s);
        if body.is_empty() {
            return Err(Error::invalid_oid_with_input(OidErrorKind::Empty, s));
        }

        let mut arcs = SmallVec::new();
        for part in body.split('.') {
            let arc: u32 = part
                .parse()
                .map_err(|_| Error::invalid_oid_with_input(OidErrorKind::InvalidArc, s))?;
            arcs.push(arc);
        }

        let oid = Self { arcs };
        match oid.violation() {
            Some(kind) => Err(Error::invalid_oid_with_input(kind, s)),
            None => Ok(oid),
        }
    }

    /// Get the arc values.
    pub fn arcs(&self) -> &[u32] {
        &self.arcs
    }

    /// Get the number of arcs.
    pub fn len(&self) -> usize {
        self.arcs.len()
    }

    /// Check if the OID is empty.
    pub fn is_empty(&self) -> bool {
        self.arcs.is_empty()
    }

    /// Whether `self` lies within the subtree rooted at `root`.
    ///
    /// Every OID is within its own subtree.
    ///
    /// ```
    /// use snmp_walker::oid;
    ///
    /// let if_descr = oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 2);
    /// assert!(oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 2, 5).starts_with(&if_descr));
    /// assert!(!oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 7, 1).starts_with(&if_descr));
    /// ```
    pub fn starts_with(&self, root: &Oid) -> bool {
        self.arcs.starts_with(&root.arcs)
    }

    /// The arcs following `root`, or `None` if `self` is outside its subtree.
    pub fn strip_prefix(&self, root: &Oid) -> Option<&[u32]> {
        self.arcs.strip_prefix(&root.arcs[..])
    }

    /// Dotted index suffix relative to `root`.
    ///
    /// Rows of different columns of the same table share index strings, so
    /// these are what joins walks together. Empty when `self == root`.
    ///
    /// ```
    /// use snmp_walker::oid;
    ///
    /// let root = oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 2);
    /// assert_eq!(oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 2, 5).index_suffix(&root).as_deref(), Some("5"));
    /// ```
    pub fn index_suffix(&self, root: &Oid) -> Option<String> {
        self.strip_prefix(root).map(join_arcs)
    }

    /// Create a child OID by appending an arc.
    pub fn child(&self, arc: u32) -> Oid {
        let mut arcs = self.arcs.clone();
        arcs.push(arc);
        Oid { arcs }
    }

    /// Validate arcs per X.690 Section 8.19.4 and the arc count limit.
    pub fn validate(&self) -> Result<()> {
        match self.violation() {
            Some(kind) => Err(Error::invalid_oid(kind)),
            None => Ok(()),
        }
    }

    fn violation(&self) -> Option<OidErrorKind> {
        if self.arcs.len() > MAX_OID_LEN {
            return Some(OidErrorKind::TooManyArcs {
                count: self.arcs.len(),
                max: MAX_OID_LEN,
            });
        }
        match self.arcs[..] {
            [first, ..] if first > 2 => Some(OidErrorKind::InvalidFirstArc(first)),
            [first, second, ..] if first < 2 && second >= 40 => {
                Some(OidErrorKind::InvalidSecondArc { first, second })
            }
            _ => None,
        }
    }

    /// Encode the OID content octets (X.690 Section 8.19).
    ///
    /// The first two arcs share one subidentifier, `arc1 * 40 + arc2`.
    pub fn to_ber_smallvec(&self) -> SmallVec<[u8; 64]> {
        let mut bytes = SmallVec::new();
        let (head, rest) = match self.arcs[..] {
            [] => return bytes,
            [first] => (first.saturating_mul(40), &[][..]),
            [first, second, ref rest @ ..] => {
                (first.saturating_mul(40).saturating_add(second), rest)
            }
        };
        push_subidentifier(&mut bytes, head);
        for &arc in rest {
            push_subidentifier(&mut bytes, arc);
        }
        bytes
    }

    /// Decode OID content octets.
    ///
    /// Error offsets are relative to `data`.
    pub fn from_ber(data: &[u8]) -> Result<Self> {
        let mut arcs: SmallVec<[u32; 16]> = SmallVec::new();
        let mut pos = 0;

        while pos < data.len() {
            let (subid, consumed) = read_subidentifier(&data[pos..], pos)?;
            if pos == 0 {
                let first = (subid / 40).min(2);
                arcs.push(first);
                arcs.push(subid - first * 40);
            } else {
                arcs.push(subid);
            }
            pos += consumed;

            if arcs.len() > MAX_OID_LEN {
                return Err(Error::decode(
                    pos,
                    DecodeErrorKind::OidTooLong {
                        count: arcs.len(),
                        max: MAX_OID_LEN,
                    },
                ));
            }
        }

        Ok(Self { arcs })
    }
}

fn join_arcs(arcs: &[u32]) -> String {
    let mut out = String::with_capacity(arcs.len() * 4);
    for (i, arc) in arcs.iter().enumerate() {
        if i > 0 {
            out.push('.');
        }
        out.push_str(&arc.to_string());
    }
    out
}

/// Base-128, most significant group first, continuation bit on all but the last.
fn push_subidentifier(bytes: &mut SmallVec<[u8; 64]>, value: u32) {
    let groups = (32 - value.leading_zeros()).div_ceil(7).max(1);
    for i in (0..groups).rev() {
        let mut byte = ((value >> (i * 7)) & 0x7F) as u8;
        if i > 0 {
            byte |= 0x80;
        }
        bytes.push(byte);
    }
}

fn read_subidentifier(data: &[u8], base: usize) -> Result<(u32, usize)> {
    let mut value: u32 = 0;
    for (i, &byte) in data.iter().enumerate() {
        if value > (u32::MAX >> 7) {
            return Err(Error::decode(base + i, DecodeErrorKind::IntegerOverflow));
        }
        value = (value << 7) | (byte & 0x7F) as u32;
        if byte & 0x80 == 0 {
            return Ok((value, i + 1));
        }
    }
    Err(Error::decode(base + data.len(), DecodeErrorKind::TruncatedData))
}

impl fmt::Debug for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Oid({})", self)
    }
}

impl fmt::Display for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&join_arcs(&self.arcs))
    }
}

impl std::str::FromStr for Oid {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl From<&[u32]> for Oid {
    fn from(arcs: &[u32]) -> Self {
        Self::from_slice(arcs)
    }
}

impl<const N: usize> From<[u32; N]> for Oid {
    fn from(arcs: [u32; N]) -> Self {
        Self::new(arcs)
    }
}

impl From<Vec<u32>> for Oid {
    fn from(arcs: Vec<u32>) -> Self {
        Self::new(arcs)
    }
}

impl From<&Oid> for Oid {
    fn from(oid: &Oid) -> Self {
        oid.clone()
    }
}

/// Build an [`Oid`] from literal arcs.
///
/// ```
/// use snmp_walker::oid;
///
/// let if_oper_status = oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 8);
/// assert_eq!(if_oper_status.len(), 10);
/// ```
#[macro_export]
macro_rules! oid {
    ($($arc:expr),* $(,)?) => {
        $crate::oid::Oid::from_slice(&[$($arc),*])
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let oid = Oid::parse("1.3.6.1.2.1.1.1.0").unwrap();
        assert_eq!(oid.arcs(), &[1, 3, 6, 1, 2, 1, 1, 1, 0]);
        assert_eq!(oid.to_string(), "1.3.6.1.2.1.1.1.0");
        assert_eq!(format!("{:?}", oid), "Oid(1.3.6.1.2.1.1.1.0)");
    }

    #[test]
    fn test_parse_errors() {
        let kind = |s: &str| match Oid::parse(s).unwrap_err() {
            Error::InvalidOid { kind, .. } => kind,
            other => panic!("unexpected error {other:?}"),
        };
        assert_eq!(kind(""), OidErrorKind::Empty);
        assert_eq!(kind("."), OidErrorKind::Empty);
        assert_eq!(kind("1..3"), OidErrorKind::InvalidArc);
        assert_eq!(kind("1.3."), OidErrorKind::InvalidArc);
        assert_eq!(kind("1.3.-6"), OidErrorKind::InvalidArc);
        assert_eq!(kind("4.1"), OidErrorKind::InvalidFirstArc(4));
        assert_eq!(
            kind("1.40"),
            OidErrorKind::InvalidSecondArc {
                first: 1,
                second: 40
            }
        );
    }

    #[test]
    fn test_ber_roundtrip() {
        for s in ["1.3.6.1.2.1.2.2.1.2.5", "0.0", "2.999.3", "1.3.6.1.4.1.9.9.4294967295"] {
            let oid = Oid::parse(s).unwrap();
            assert_eq!(Oid::from_ber(&oid.to_ber_smallvec()).unwrap(), oid, "{s}");
        }
    }

    #[test]
    fn test_ber_encoding() {
        assert_eq!(&oid!(1, 3, 6, 1).to_ber_smallvec()[..], &[0x2B, 0x06, 0x01]);
        // 2.999 => 1079 => 0x88 0x37
        assert_eq!(&oid!(2, 999).to_ber_smallvec()[..], &[0x88, 0x37]);
        assert_eq!(&oid!(1, 3, 128).to_ber_smallvec()[..], &[0x2B, 0x81, 0x00]);
    }

    #[test]
    fn test_from_ber_truncated() {
        let err = Oid::from_ber(&[0x2B, 0x86]).unwrap_err();
        assert!(matches!(
            err,
            Error::Decode {
                offset: 2,
                kind: DecodeErrorKind::TruncatedData
            }
        ));
    }

    #[test]
    fn test_from_ber_overflow() {
        assert!(Oid::from_ber(&[0x2B, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x7F]).is_err());
    }

    #[test]
    fn test_from_ber_too_long() {
        let mut data = vec![0x2B];
        data.extend(std::iter::repeat_n(0x01, MAX_OID_LEN));
        assert!(matches!(
            Oid::from_ber(&data).unwrap_err(),
            Error::Decode {
                kind: DecodeErrorKind::OidTooLong { .. },
                ..
            }
        ));
    }

    #[test]
    fn test_subtree() {
        let root = oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 2);
        let inside = oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 2, 5);
        let sibling = oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 20);

        assert!(inside.starts_with(&root));
        assert!(root.starts_with(&root));
        assert!(!sibling.starts_with(&root));
        assert!(!root.starts_with(&inside));

        assert_eq!(inside.strip_prefix(&root), Some(&[5u32][..]));
        assert_eq!(sibling.strip_prefix(&root), None);
        assert_eq!(root.index_suffix(&root).as_deref(), Some(""));
        assert_eq!(
            oid!(1, 3, 6, 1, 2, 1, 4, 20, 1, 1, 10, 0, 0, 1)
                .index_suffix(&oid!(1, 3, 6, 1, 2, 1, 4, 20, 1, 1))
                .as_deref(),
            Some("10.0.0.1")
        );
    }

    #[test]
    fn test_ordering() {
        let a = oid!(1, 3, 6, 1, 2);
        let b = oid!(1, 3, 6, 1, 2, 0);
        let c = oid!(1, 3, 6, 1, 10);
        assert!(a < b);
        assert!(b < c);
    }
}
