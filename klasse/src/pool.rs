//! Matching a user to one of an attendance's registration pools.

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::trace;

use crate::{
    grade::{find_active_membership, membership_grade},
    models::{AttendancePool, Grade, MembershipType, User},
};

/// Why a user could not be placed in a pool.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum PoolMiss {
    #[error("no active membership")]
    NoActiveMembership,

    #[error("membership type {0} has no academic year")]
    NoGrade(MembershipType),

    #[error("no pool accepts year {0}")]
    NoMatchingPool(Grade),
}

/// Index of the first pool accepting the user's grade, or the reason there is none.
///
/// Pools are expected not to overlap; if they do, the earliest one wins.
pub fn resolve_user_pool(
    user: &User,
    pools: &[AttendancePool],
    now: DateTime<Utc>,
) -> Result<usize, PoolMiss> {
    let membership = find_active_membership(user, now).ok_or(PoolMiss::NoActiveMembership)?;
    let grade = membership_grade(membership, now).ok_or(PoolMiss::NoGrade(membership.kind))?;
    let index = pools
        .iter()
        .position(|pool| pool.accepts(grade))
        .ok_or(PoolMiss::NoMatchingPool(grade))?;
    trace!(user = %user.id, grade, index, "matched pool");
    Ok(index)
}

pub fn user_pool_index(user: &User, pools: &[AttendancePool], now: DateTime<Utc>) -> Option<usize> {
    resolve_user_pool(user, pools, now).ok()
}

pub fn user_pool<'a>(
    user: &User,
    pools: &'a [AttendancePool],
    now: DateTime<Utc>,
) -> Option<&'a AttendancePool> {
    user_pool_index(user, pools, now).map(|i| &pools[i])
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;
    use crate::models::{Membership, UserId};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap()
    }

    fn user_with(kind: MembershipType, start: DateTime<Utc>) -> User {
        User::new(UserId::new("u"), "Kari").with_membership(Membership::new(
            kind,
            start,
            now() + Duration::days(300),
        ))
    }

    fn pools() -> Vec<AttendancePool> {
        vec![
            AttendancePool::new("low", &[1, 2]),
            AttendancePool::new("high", &[3, 4, 5]),
        ]
    }

    #[test]
    fn first_accepting_pool_wins() {
        let knight = user_with(MembershipType::Knight, now());
        assert_eq!(user_pool_index(&knight, &pools(), now()), Some(1));

        let overlapping = vec![
            AttendancePool::new("all", &[1, 2, 3, 4, 5]),
            AttendancePool::new("seniors", &[5]),
        ];
        assert_eq!(user_pool_index(&knight, &overlapping, now()), Some(0));
        assert_eq!(
            user_pool(&knight, &overlapping, now()).map(|p| p.id.as_str()),
            Some("all")
        );
    }

    #[test]
    fn social_members_land_in_first_year_pool() {
        let social = user_with(MembershipType::SocialMember, now());
        assert_eq!(user_pool(&social, &pools(), now()).map(|p| p.id.as_str()), Some("low"));
    }

    #[test]
    fn missing_membership_or_grade_yields_none_even_with_pools() {
        let nobody = User::new(UserId::new("u"), "Kari");
        assert_eq!(user_pool_index(&nobody, &pools(), now()), None);
        assert_eq!(
            resolve_user_pool(&nobody, &pools(), now()),
            Err(PoolMiss::NoActiveMembership)
        );

        let other = user_with(MembershipType::Other, now());
        assert_eq!(user_pool_index(&other, &pools(), now()), None);
        assert_eq!(
            resolve_user_pool(&other, &pools(), now()),
            Err(PoolMiss::NoGrade(MembershipType::Other))
        );
    }

    #[test]
    fn unmatched_grade_is_reported() {
        let master = user_with(MembershipType::MasterStudent, now());
        let bachelors_only = vec![AttendancePool::new("b", &[1, 2, 3])];
        assert_eq!(
            resolve_user_pool(&master, &bachelors_only, now()),
            Err(PoolMiss::NoMatchingPool(4))
        );
        assert_eq!(user_pool(&master, &bachelors_only, now()), None);
        assert_eq!(user_pool_index(&master, &[], now()), None);
    }

    #[test]
    fn misses_explain_themselves() {
        assert_eq!(
            PoolMiss::NoGrade(MembershipType::Other).to_string(),
            "membership type Other has no academic year"
        );
        assert_eq!(PoolMiss::NoMatchingPool(4).to_string(), "no pool accepts year 4");
    }
}
