use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, TimeZone, Utc};
use klasse::{
    models::{
        event::EventListener, AttendancePool, Attendee, Database, EventBuilder, EventId, Membership,
        MembershipType, PoolId, User, UserId,
    },
    StoreError,
};
use tokio::{sync::mpsc, time::timeout};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap()
}

#[test]
fn users_round_trip_through_the_store() {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::new(dir.path()).unwrap();

    let user = User::new(UserId::new("u1"), "Kari").with_membership(Membership::new(
        MembershipType::BachelorStudent,
        Utc.with_ymd_and_hms(2024, 8, 1, 0, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(2027, 7, 31, 0, 0, 0).unwrap(),
    ));
    db.add_user(&user).unwrap();

    let fetched = db.fetch_user(&user.id).unwrap();
    assert_eq!(fetched.memberships, user.memberships);
    assert_eq!(fetched.display_name(), "Kari");
    assert!(dir.path().join("db/users/u1.ron").is_file());
}

#[test]
fn missing_records_are_reported_as_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::new(dir.path()).unwrap();

    match db.fetch_user(&UserId::new("nobody")) {
        Err(StoreError::NotFound { kind, id }) => {
            assert_eq!(kind, "user");
            assert_eq!(id, "nobody");
        }
        other => panic!("expected not found, got {other:?}"),
    }
    assert!(matches!(
        db.fetch_event(&EventId::new("e404")),
        Err(StoreError::NotFound { kind: "event", .. })
    ));
}

#[test]
fn corrupt_files_fail_to_decode() {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::new(dir.path()).unwrap();
    std::fs::write(dir.path().join("db/events/broken.ron"), "(event: ").unwrap();

    assert!(matches!(
        db.fetch_event(&EventId::new("broken")),
        Err(StoreError::Decode { .. })
    ));
    // the index rebuild skips it instead of failing
    db.rebuild_index().unwrap();
    assert!(db.upcoming_events(now()).unwrap().is_empty());
}

#[test]
fn upcoming_events_are_ordered_by_start() {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::new(dir.path()).unwrap();

    EventBuilder::new(EventId::new("late"), "Julebord", now() + Duration::days(60))
        .build()
        .save_to_db(&db)
        .unwrap();
    EventBuilder::new(EventId::new("past"), "Fadderuke", now() - Duration::days(60))
        .build()
        .save_to_db(&db)
        .unwrap();
    EventBuilder::new(EventId::new("soon"), "Bedpres", now() + Duration::days(2))
        .build()
        .save_to_db(&db)
        .unwrap();

    let upcoming = db.upcoming_events(now()).unwrap();
    assert_eq!(upcoming, vec![EventId::new("soon"), EventId::new("late")]);
}

#[test]
fn moving_an_event_reindexes_it() {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::new(dir.path()).unwrap();

    let id = EventId::new("e1");
    EventBuilder::new(id.clone(), "Bedpres", now() + Duration::days(2))
        .build()
        .save_to_db(&db)
        .unwrap();
    EventBuilder::new(id.clone(), "Bedpres", now() - Duration::days(2))
        .build()
        .save_to_db(&db)
        .unwrap();
    assert!(db.upcoming_events(now()).unwrap().is_empty());

    // a fresh index from the files agrees
    db.rebuild_index().unwrap();
    assert!(db.upcoming_events(now()).unwrap().is_empty());
    assert_eq!(db.upcoming_events(now() - Duration::days(3)).unwrap(), vec![id]);
}

#[test]
fn event_bundles_keep_their_attendance() {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::new(dir.path()).unwrap();

    let pool = PoolId::new("p1");
    let bundle = EventBuilder::new(EventId::new("e1"), "Bedpres", now())
        .registration(now() - Duration::days(7), now() + Duration::days(1))
        .pools(vec![AttendancePool::new("p1", &[1, 2, 3]).capacity(30)])
        .attendees(vec![Attendee::new("a1", &pool, true), Attendee::new("a2", &pool, false)])
        .build();
    db.add_event(&bundle).unwrap();

    assert_eq!(db.fetch_event(&EventId::new("e1")).unwrap(), bundle);
}

fn crowded_event(id: &str, attendees: usize) -> klasse::models::EventAttendanceBundle {
    let pool = PoolId::new("p1");
    EventBuilder::new(EventId::new(id), "Bedpres", now() + Duration::days(3))
        .pools(vec![AttendancePool::new("p1", &[1, 2, 3, 4, 5])])
        .attendees(
            (0..attendees)
                .map(|n| Attendee::new(&format!("a{n}"), &pool, n % 4 != 0))
                .collect(),
        )
        .build()
}

#[test]
fn readers_never_see_a_half_written_event() {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::new(dir.path()).unwrap();
    let id = EventId::new("e1");
    db.add_event(&crowded_event("e1", 400)).unwrap();

    std::thread::scope(|s| {
        s.spawn(|| {
            for round in 0..100 {
                let size = if round % 2 == 0 { 50 } else { 400 };
                db.add_event(&crowded_event("e1", size)).unwrap();
            }
        });
        s.spawn(|| {
            for _ in 0..300 {
                let bundle = db.fetch_event(&id).unwrap();
                let attendees = bundle.attendance.unwrap().attendees.len();
                assert!(attendees == 50 || attendees == 400, "read {attendees} attendees");
            }
        });
        s.spawn(|| {
            for _ in 0..300 {
                assert_eq!(db.upcoming_events(now()).unwrap(), vec![id.clone()]);
            }
        });
    });
}

#[test]
fn concurrent_additions_all_reach_the_index() {
    let dir = tempfile::tempdir().unwrap();
    // separate handles on one folder share the index lock
    let handles: Vec<Database> = (0..4).map(|_| Database::new(dir.path()).unwrap()).collect();

    std::thread::scope(|s| {
        for (t, db) in handles.iter().enumerate() {
            s.spawn(move || {
                for n in 0..25 {
                    EventBuilder::new(
                        EventId::new(&format!("t{t}-e{n}")),
                        "Kurs",
                        now() + Duration::hours((t * 25 + n) as i64 + 1),
                    )
                    .build()
                    .save_to_db(db)
                    .unwrap();
                }
            });
        }
    });

    let upcoming = handles[0].upcoming_events(now()).unwrap();
    assert_eq!(upcoming.len(), 100);
    assert_eq!(upcoming[0], EventId::new("t0-e0"));
    assert_eq!(upcoming[99], EventId::new("t3-e24"));
}

#[tokio::test]
async fn listener_sends_rewritten_events() {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::new(dir.path()).unwrap();

    let (tx, mut rx) = mpsc::channel(16);
    let listener = tokio::spawn(EventListener::new(tx, &db).start());
    // let the watcher register before writing
    tokio::time::sleep(StdDuration::from_millis(250)).await;

    EventBuilder::new(EventId::new("e1"), "Bedpres", now())
        .pools(vec![AttendancePool::new("p1", &[1, 2])])
        .build()
        .save_to_db(&db)
        .unwrap();

    let received = timeout(StdDuration::from_secs(5), rx.recv())
        .await
        .expect("listener did not send in time")
        .expect("listener channel closed");
    assert_eq!(received.event.id, EventId::new("e1"));
    assert_eq!(received.attendance.map(|a| a.pools.len()), Some(1));

    listener.abort();
}

#[tokio::test]
async fn listener_skips_rewrites_without_changes() {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::new(dir.path()).unwrap();

    let (tx, mut rx) = mpsc::channel(16);
    let listener = tokio::spawn(EventListener::new(tx, &db).start());
    tokio::time::sleep(StdDuration::from_millis(250)).await;

    let first = crowded_event("e1", 3);
    db.add_event(&first).unwrap();
    let received = timeout(StdDuration::from_secs(5), rx.recv())
        .await
        .expect("listener did not send in time")
        .expect("listener channel closed");
    assert_eq!(received, first);

    // the same bundle again, once through the store and once written in place
    db.add_event(&first).unwrap();
    let path = dir.path().join("db/events/e1.ron");
    std::fs::write(&path, std::fs::read(&path).unwrap()).unwrap();
    let second = crowded_event("e1", 5);
    db.add_event(&second).unwrap();

    let received = timeout(StdDuration::from_secs(5), rx.recv())
        .await
        .expect("listener did not send in time")
        .expect("listener channel closed");
    assert_eq!(received, second);
    assert!(timeout(StdDuration::from_millis(500), rx.recv()).await.is_err());

    listener.abort();
}
