//! Active membership and academic year resolution.
//!
//! The academic year turns over on August 1 (UTC). Every function takes the current
//! instant as `now` so results do not depend on the system clock.

use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc};
use tracing::trace;

use crate::models::{Grade, Membership, MembershipType, User};

const ACADEMIC_START_MONTH: u32 = 8;

/// Calendar year in which the academic year containing `date` started.
pub fn academic_year(date: DateTime<Utc>) -> i32 {
    if date.month() >= ACADEMIC_START_MONTH {
        date.year()
    } else {
        date.year() - 1
    }
}

/// The most recent August 1, 00:00 UTC at or before `date`.
pub fn academic_start(date: DateTime<Utc>) -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(academic_year(date), ACADEMIC_START_MONTH, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map_or(DateTime::<Utc>::MIN_UTC, |d| Utc.from_utc_datetime(&d))
}

/// The last membership in list order that has not ended at `now`.
///
/// This is a list-order match, not a recency match: with `[A(ends in 10 days),
/// B(ends in 5 days)]` the result is `B`.
pub fn find_active_membership(user: &User, now: DateTime<Utc>) -> Option<&Membership> {
    user.memberships.iter().rev().find(|m| m.is_active_at(now))
}

/// Academic years since the membership started, counting the current one.
fn years_elapsed(membership: &Membership, now: DateTime<Utc>) -> i32 {
    academic_year(now) - academic_year(membership.start) + 1
}

/// Academic year a membership puts its holder in, `None` for [`MembershipType::Other`].
///
/// Bachelor students are clamped to `1..=3` however long they take, master students to
/// `4..=5` since they always hold a bachelor degree already.
pub fn membership_grade(membership: &Membership, now: DateTime<Utc>) -> Option<Grade> {
    let delta = years_elapsed(membership, now);
    let grade = match membership.kind {
        MembershipType::Knight | MembershipType::PhdStudent => 5,
        MembershipType::SocialMember => 1,
        MembershipType::BachelorStudent => delta.clamp(1, 3),
        MembershipType::MasterStudent => delta.clamp(4, 5),
        MembershipType::Other => return None,
    };
    trace!(kind = ?membership.kind, delta, grade, "resolved membership grade");
    Grade::try_from(grade).ok()
}

/// Grade of the user's active membership.
pub fn user_grade(user: &User, now: DateTime<Utc>) -> Option<Grade> {
    find_active_membership(user, now).and_then(|m| membership_grade(m, now))
}

pub fn grade_label(grade: Grade) -> String {
    format!("{grade}. klasse")
}
