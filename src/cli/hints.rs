//! Well-known OID names.
//!
//! A small hardcoded table of common OID names for display and for naming
//! walk roots on the command line. This is not MIB support.

use crate::Oid;

/// Well-known OID entries, most specific last within each group.
static WELL_KNOWN_OIDS: &[(&[u32], &str)] = &[
    // SNMPv2-MIB::system
    (&[1, 3, 6, 1, 2, 1, 1], "system"),
    (&[1, 3, 6, 1, 2, 1, 1, 1], "sysDescr"),
    (&[1, 3, 6, 1, 2, 1, 1, 2], "sysObjectID"),
    (&[1, 3, 6, 1, 2, 1, 1, 3], "sysUpTime"),
    (&[1, 3, 6, 1, 2, 1, 1, 4], "sysContact"),
    (&[1, 3, 6, 1, 2, 1, 1, 5], "sysName"),
    (&[1, 3, 6, 1, 2, 1, 1, 6], "sysLocation"),
    (&[1, 3, 6, 1, 2, 1, 1, 7], "sysServices"),
    // IF-MIB::interfaces
    (&[1, 3, 6, 1, 2, 1, 2], "interfaces"),
    (&[1, 3, 6, 1, 2, 1, 2, 1], "ifNumber"),
    (&[1, 3, 6, 1, 2, 1, 2, 2], "ifTable"),
    (&[1, 3, 6, 1, 2, 1, 2, 2, 1], "ifEntry"),
    (&[1, 3, 6, 1, 2, 1, 2, 2, 1, 1], "ifIndex"),
    (&[1, 3, 6, 1, 2, 1, 2, 2, 1, 2], "ifDescr"),
    (&[1, 3, 6, 1, 2, 1, 2, 2, 1, 3], "ifType"),
    (&[1, 3, 6, 1, 2, 1, 2, 2, 1, 4], "ifMtu"),
    (&[1, 3, 6, 1, 2, 1, 2, 2, 1, 5], "ifSpeed"),
    (&[1, 3, 6, 1, 2, 1, 2, 2, 1, 6], "ifPhysAddress"),
    (&[1, 3, 6, 1, 2, 1, 2, 2, 1, 7], "ifAdminStatus"),
    (&[1, 3, 6, 1, 2, 1, 2, 2, 1, 8], "ifOperStatus"),
    (&[1, 3, 6, 1, 2, 1, 2, 2, 1, 10], "ifInOctets"),
    (&[1, 3, 6, 1, 2, 1, 2, 2, 1, 16], "ifOutOctets"),
];

/// Exact name for an OID, if it is in the table.
pub fn lookup(oid: &Oid) -> Option<&'static str> {
    let arcs = oid.arcs();
    WELL_KNOWN_OIDS
        .iter()
        .find(|(pattern, _)| *pattern == arcs)
        .map(|(_, name)| *name)
}

/// Name an OID by its longest well-known prefix: `ifDescr.3`, `sysName.0`.
///
/// Returns `None` when no entry is a prefix.
pub fn describe(oid: &Oid) -> Option<String> {
    let arcs = oid.arcs();
    let (prefix, name) = WELL_KNOWN_OIDS
        .iter()
        .filter(|(prefix, _)| arcs.starts_with(prefix))
        .max_by_key(|(prefix, _)| prefix.len())?;

    let rest = &arcs[prefix.len()..];
    if rest.is_empty() {
        return Some(name.to_string());
    }
    let suffix: Vec<String> = rest.iter().map(u32::to_string).collect();
    Some(format!("{}.{}", name, suffix.join(".")))
}

/// Parse an OID from dotted notation or a well-known name.
///
/// Accepts:
/// - Dotted notation: "1.3.6.1.2.1.2.2.1.2", ".1.3.6.1"
/// - Well-known names, optionally with an instance: "ifDescr", "sysDescr.0"
pub fn parse_oid(s: &str) -> Result<Oid, String> {
    if s.starts_with(|c: char| c.is_ascii_digit() || c == '.') {
        return Oid::parse(s).map_err(|e| format!("invalid OID '{}': {}", s, e));
    }

    let (name, instance) = match s.split_once('.') {
        Some((name, instance)) => (name, Some(instance)),
        None => (s, None),
    };

    // names are case-insensitive
    let (arcs, _) = WELL_KNOWN_OIDS
        .iter()
        .find(|(_, known)| known.eq_ignore_ascii_case(name))
        .ok_or_else(|| {
            format!(
                "unknown OID name '{}'; use dotted notation (e.g., 1.3.6.1.2.1.2.2.1.2)",
                s
            )
        })?;

    let mut oid = Oid::from_slice(arcs);
    if let Some(instance) = instance {
        for arc in instance.split('.') {
            let arc = arc
                .parse::<u32>()
                .map_err(|_| format!("invalid instance '{}' in '{}'", instance, s))?;
            oid = oid.child(arc);
        }
    }
    Ok(oid)
}
