//! Process-wide request-id allocation.
//!
//! Every job draws from one counter, so no two requests in flight anywhere
//! in the process share an id and a late reply can never be mistaken for the
//! answer to a newer request.

use std::sync::LazyLock;
use std::sync::atomic::{AtomicI32, Ordering};

/// Upper bound for the initial value, leaving room to count up before wrapping.
const SEED_RANGE: i32 = 1 << 30;

static NEXT_REQUEST_ID: LazyLock<AtomicI32> =
    LazyLock::new(|| AtomicI32::new(initial_request_id()));

/// Time-based starting point, so a quick restart does not reuse the ids of
/// the previous process while its replies may still be in flight.
fn initial_request_id() -> i32 {
    use std::time::{SystemTime, UNIX_EPOCH};
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos() as i32)
        .unwrap_or(0);
    nanos % SEED_RANGE + 1
}

/// Allocate the next request id.
///
/// Ids are positive and strictly increasing until `i32::MAX`, after which
/// the counter starts again at 1.
pub fn next_request_id() -> i32 {
    let mut current = NEXT_REQUEST_ID.load(Ordering::Relaxed);
    loop {
        let next = if current == i32::MAX { 1 } else { current + 1 };
        let swapped =
            NEXT_REQUEST_ID.compare_exchange_weak(current, next, Ordering::Relaxed, Ordering::Relaxed);
        match swapped {
            Ok(_) => return current,
            Err(actual) => current = actual,
        }
    }
}
