use chrono::{Duration, Utc};
use klasse::{
    attendees::sort_attendees_by_pool,
    grade::{grade_label, user_grade},
    models::{
        AttendancePool, Attendee, Database, EventBuilder, EventId, Membership, MembershipType,
        PoolId, Specialization, User, UserId,
    },
    pool::user_pool_index,
    registration::{format_norwegian_date, format_registration_period, registration_status},
    session::Session,
};

fn main() -> klasse::Result<()> {
    let now = Utc::now();

    // Create a snapshot store, the folders are created recursively.
    let db = Database::new("demo/")?;

    // A bachelor student whose membership started a year ago.
    let kari = User::new(UserId::new("kari"), "Kari Nordmann").with_membership(
        Membership::new(
            MembershipType::BachelorStudent,
            now - Duration::days(365),
            now + Duration::days(2 * 365),
        )
        .specialization(Specialization::SoftwareEngineering),
    );
    db.add_user(&kari)?;

    // Events are easiest to put together with the builder.
    let junior = PoolId::new("junior");
    let senior = PoolId::new("senior");
    let start = now + Duration::days(7);
    EventBuilder::new(EventId::new("bedpres"), "Bedriftspresentasjon", start)
        .subtitle("Med pizza etterpå")
        .description("Hør om sommerjobber og trainee-stillinger.")
        .end(start + Duration::hours(3))
        .location("Realfagbygget")
        .registration(now - Duration::days(1), now + Duration::days(3))
        .pools(vec![
            AttendancePool::new("junior", &[1, 2]).capacity(40),
            AttendancePool::new("senior", &[3, 4, 5]).capacity(20),
        ])
        .attendees(vec![
            Attendee::new("a1", &junior, true),
            Attendee::new("a2", &junior, false),
            Attendee::new("a3", &senior, true),
        ])
        .build()
        .save_to_db(&db)?;

    // The signed-in user lives in an explicit session.
    let mut session = Session::new();
    let status = session.subscribe();
    session.sign_in(db.fetch_user(&UserId::new("kari"))?);
    println!("logged in: {}", status.borrow().logged_in);

    let user = session.current_user().expect("just signed in");
    if let Some(grade) = user_grade(user, now) {
        println!("{} is in {}", user.display_name(), grade_label(grade));
    }

    let event = db.fetch_event(&EventId::new("bedpres"))?;
    let attendance = event.attendance.as_ref();
    println!(
        "{}: {} {}",
        event.event.title,
        registration_status(attendance, now),
        format_registration_period(attendance, format_norwegian_date).unwrap_or_default()
    );

    let pools = attendance.map(|a| a.pools.as_slice()).unwrap_or_default();
    let index = user_pool_index(user, pools, now);
    for (pool, bucket) in pools.iter().zip(sort_attendees_by_pool(Some(&event), index)) {
        println!(
            "{}: {} in, {} waiting",
            pool.title,
            bucket.confirmed.len(),
            bucket.waitlist.len()
        );
    }
    Ok(())
}
