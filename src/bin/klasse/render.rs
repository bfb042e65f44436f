//! Plain text views printed by the subcommands.

use std::{error::Error, fmt::Write as _};

use chrono::{DateTime, Utc};
use klasse::{
    attendees::{is_registration_event, sort_attendees_by_pool},
    grade::{find_active_membership, grade_label, membership_grade},
    models::{EventAttendanceBundle, Specialization},
    pool::resolve_user_pool,
    registration::{
        capacity_label, format_norwegian_date, format_registration_period, registration_status,
        waitlist_label,
    },
    session::Session,
};
use tracing::warn;

/// The viewer's memberships, the active one starred, followed by the grade.
pub fn render_grade(session: &Session, now: DateTime<Utc>) -> Result<String, Box<dyn Error>> {
    let user = session
        .current_user()
        .ok_or("no viewing user, pass --user or set KLASSE_USER")?;
    let active = find_active_membership(user, now);

    let mut out = String::new();
    writeln!(out, "{}", user.display_name())?;
    for membership in &user.memberships {
        let marker = if active == Some(membership) { "*" } else { " " };
        writeln!(
            out,
            "{marker} {}, {} ({} - {})",
            membership.kind,
            Specialization::label(membership.specialization),
            membership.start.date_naive(),
            membership.end.date_naive()
        )?;
    }
    match active.and_then(|m| membership_grade(m, now)) {
        Some(grade) => writeln!(out, "{}", grade_label(grade))?,
        None => writeln!(out, "ingen klasse")?,
    }
    Ok(out)
}

pub fn render_summary(bundle: &EventAttendanceBundle, now: DateTime<Utc>) -> String {
    let start = bundle
        .event
        .start
        .map(format_norwegian_date)
        .unwrap_or_else(|| String::from("-"));
    let mut line = format!("{start}  {}  [{}]", bundle.event.title, bundle.event.id);
    if is_registration_event(Some(bundle)) {
        let attendance = bundle.attendance.as_ref();
        line.push_str(&format!("  {}", registration_status(attendance, now)));
        if let Some(period) = format_registration_period(attendance, format_norwegian_date) {
            line.push_str(&format!(" {period}"));
        }
    }
    line
}

/// Summary line, then every pool with the viewer's pool starred and its attendees listed.
pub fn render_event(bundle: &EventAttendanceBundle, session: &Session, now: DateTime<Utc>) -> String {
    let mut out = render_summary(bundle, now);
    out.push('\n');

    let Some(attendance) = bundle.attendance.as_ref().filter(|_| is_registration_event(Some(bundle)))
    else {
        out.push_str("ingen påmelding\n");
        return out;
    };

    let pool_index = match session.current_user() {
        Some(user) => match resolve_user_pool(user, &attendance.pools, now) {
            Ok(index) => Some(index),
            Err(miss) => {
                warn!("{} has no pool: {miss}", user.id);
                None
            }
        },
        None => None,
    };

    let sorted = sort_attendees_by_pool(Some(bundle), pool_index);
    for (i, (pool, bucket)) in attendance.pools.iter().zip(&sorted).enumerate() {
        let marker = if pool_index == Some(i) { "*" } else { " " };
        out.push_str(&format!(
            "{marker} {}  {}  {}\n",
            pool.title,
            capacity_label(bucket.confirmed.len(), pool.capacity),
            waitlist_label(bucket.waitlist.len())
        ));
        for (n, attendee) in bucket.confirmed.iter().chain(&bucket.waitlist).enumerate() {
            let grade = attendee
                .user_grade
                .map(|g| format!(" ({})", grade_label(g)))
                .unwrap_or_default();
            let waiting = if attendee.reserved { "" } else { " venteliste" };
            out.push_str(&format!("    {}. {}{grade}{waiting}\n", n + 1, attendee.display_name()));
        }
    }
    out
}
