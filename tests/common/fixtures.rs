//! Common test fixtures and constants.

use snmp_walker::{Oid, Value, oid};
use std::collections::BTreeMap;

// =============================================================================
// IF-MIB ifTable columns (1.3.6.1.2.1.2.2.1.*)
// =============================================================================

pub fn if_descr() -> Oid {
    oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 2)
}
pub fn if_admin_status() -> Oid {
    oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 7)
}
pub fn if_oper_status() -> Oid {
    oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 8)
}

// =============================================================================
// Subtree roots (for walks)
// =============================================================================

/// System subtree root: 1.3.6.1.2.1.1
pub fn system_subtree() -> Oid {
    oid!(1, 3, 6, 1, 2, 1, 1)
}

/// Nonexistent subtree, past everything in [`router_mib`].
pub fn nonexistent_subtree() -> Oid {
    oid!(1, 3, 6, 1, 99, 99, 99)
}

pub const COMMUNITY: &str = "public";

/// A small router: two system objects and three interfaces.
///
/// | index | ifDescr   | admin | oper |
/// |-------|-----------|-------|------|
/// | 1     | lo        | up    | up   |
/// | 2     | Ethernet0 | up    | down |
/// | 10    | Serial0   | down  | down |
pub fn router_mib() -> BTreeMap<Oid, Value> {
    let mut mib = BTreeMap::new();
    mib.insert(oid!(1, 3, 6, 1, 2, 1, 1, 1, 0), Value::from("Test router"));
    mib.insert(oid!(1, 3, 6, 1, 2, 1, 1, 5, 0), Value::from("r1"));

    for (index, name, admin, oper) in [
        (1, "lo", 1, 1),
        (2, "Ethernet0", 1, 2),
        (10, "Serial0", 2, 2),
    ] {
        mib.insert(if_descr().child(index), Value::from(name));
        mib.insert(if_admin_status().child(index), Value::Integer(admin));
        mib.insert(if_oper_status().child(index), Value::Integer(oper));
    }
    mib
}
