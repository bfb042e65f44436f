//! Splitting an event's attendees into per-pool confirmed and waitlist lists.

use std::collections::HashMap;

use tracing::trace;

use crate::models::{EventAttendanceBundle, PoolAttendees, PoolId};

/// Whether the event takes registrations at all: it has attendance with at least one pool.
pub fn is_registration_event(bundle: Option<&EventAttendanceBundle>) -> bool {
    bundle
        .and_then(|b| b.attendance.as_ref())
        .map_or(false, |a| !a.pools.is_empty())
}

/// Buckets the event's attendees into the pool at `pool_index`, the viewer's pool.
///
/// Returns one [`PoolAttendees`] per pool, indexed like the pools, or an empty vec when
/// the event takes no registrations. Every attendee goes into the same pool, `in` when
/// reserved and `waitlist` otherwise, in source order. With no index, or an index past the
/// last pool, nothing is bucketed and all lists stay empty.
pub fn sort_attendees_by_pool(
    bundle: Option<&EventAttendanceBundle>,
    pool_index: Option<usize>,
) -> Vec<PoolAttendees> {
    let Some(attendance) = bundle.and_then(|b| b.attendance.as_ref()) else {
        return Vec::new();
    };
    if attendance.pools.is_empty() {
        return Vec::new();
    }

    let mut pools = vec![PoolAttendees::default(); attendance.pools.len()];
    let Some(target) = pool_index.and_then(|i| pools.get_mut(i)) else {
        trace!(?pool_index, "no pool to bucket attendees into");
        return pools;
    };
    for attendee in &attendance.attendees {
        target.push(attendee.clone());
    }
    pools
}

/// Buckets every attendee into the pool named by its own `attendance_pool_id`.
///
/// Attendees pointing at a pool the attendance does not list are dropped.
pub fn bucket_attendees_by_own_pool(bundle: Option<&EventAttendanceBundle>) -> Vec<PoolAttendees> {
    let Some(attendance) = bundle.and_then(|b| b.attendance.as_ref()) else {
        return Vec::new();
    };
    if attendance.pools.is_empty() {
        return Vec::new();
    }

    let positions: HashMap<&PoolId, usize> = attendance
        .pools
        .iter()
        .enumerate()
        .map(|(i, pool)| (&pool.id, i))
        .collect();
    let mut pools = vec![PoolAttendees::default(); attendance.pools.len()];
    for attendee in &attendance.attendees {
        match positions.get(&attendee.attendance_pool_id) {
            Some(&i) => pools[i].push(attendee.clone()),
            None => trace!(attendee = %attendee.id, pool = %attendee.attendance_pool_id, "unknown pool"),
        }
    }
    pools
}
