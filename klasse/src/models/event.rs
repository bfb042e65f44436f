use std::{
    collections::HashMap,
    ffi::OsStr,
    path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};
use notify::{
    event::{AccessKind, AccessMode, CreateKind, ModifyKind, RenameMode},
    EventKind, RecommendedWatcher, Watcher,
};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::{AttendanceId, AttendeeId, Database, EventId, PoolId, UserId};
use crate::error::Result;

/// An academic year, `1..=5`.
pub type Grade = u8;

/// An event together with its attendance configuration, as the backend bundles them.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EventAttendanceBundle {
    pub event: Event,
    #[serde(default)]
    pub attendance: Option<Attendance>,
}
impl EventAttendanceBundle {
    pub fn save_to_db(self, db: &Database) -> Result<()> {
        db.add_event(&self)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: EventId,
    pub title: String,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub start: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end: Option<DateTime<Utc>>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub location_address: Option<String>,
    #[serde(default)]
    pub location_link: Option<String>,
    #[serde(default)]
    pub attendance_id: Option<AttendanceId>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Attendance {
    #[serde(default)]
    pub id: AttendanceId,
    #[serde(default)]
    pub register_start: Option<DateTime<Utc>>,
    #[serde(default)]
    pub register_end: Option<DateTime<Utc>>,
    #[serde(default)]
    pub deregister_deadline: Option<DateTime<Utc>>,
    #[serde(default)]
    pub attendance_price: Option<u32>,
    #[serde(default)]
    pub pools: Vec<AttendancePool>,
    #[serde(default)]
    pub attendees: Vec<Attendee>,
}

/// One capacity bucket of an attendance. `capacity: None` means unlimited.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct AttendancePool {
    #[serde(default)]
    pub id: PoolId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub year_criteria: Vec<Grade>,
    #[serde(default)]
    pub capacity: Option<u32>,
    #[serde(default)]
    pub merge_delay_hours: Option<u32>,
}
impl AttendancePool {
    pub fn new(id: &str, year_criteria: &[Grade]) -> Self {
        Self {
            id: PoolId::new(id),
            title: year_criteria
                .iter()
                .map(|y| y.to_string())
                .collect::<Vec<_>>()
                .join("-")
                + ". klasse",
            year_criteria: year_criteria.to_vec(),
            ..Self::default()
        }
    }
    pub fn capacity(mut self, capacity: u32) -> Self {
        self.capacity = Some(capacity);
        self
    }
    pub fn accepts(&self, grade: Grade) -> bool {
        self.year_criteria.contains(&grade)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Attendee {
    #[serde(default)]
    pub id: AttendeeId,
    #[serde(default)]
    pub user_id: UserId,
    #[serde(default)]
    pub attendance_pool_id: PoolId,
    /// `true` is a confirmed seat, `false` a waitlist position.
    #[serde(default)]
    pub reserved: bool,
    /// Grade at registration time, kept for display.
    #[serde(default)]
    pub user_grade: Option<Grade>,
    #[serde(default)]
    pub user: Option<AttendeeUser>,
}
impl Attendee {
    pub fn new(id: &str, pool: &PoolId, reserved: bool) -> Self {
        Self {
            id: AttendeeId::new(id),
            attendance_pool_id: pool.clone(),
            reserved,
            ..Self::default()
        }
    }
    pub fn display_name(&self) -> &str {
        self.user
            .as_ref()
            .and_then(|u| u.name.as_deref())
            .unwrap_or_else(|| self.user_id.as_str())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct AttendeeUser {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Confirmed and waitlisted attendees of a single pool.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct PoolAttendees {
    #[serde(rename = "in")]
    pub confirmed: Vec<Attendee>,
    pub waitlist: Vec<Attendee>,
}
impl PoolAttendees {
    pub fn push(&mut self, attendee: Attendee) {
        if attendee.reserved {
            self.confirmed.push(attendee);
        } else {
            self.waitlist.push(attendee);
        }
    }
    pub fn len(&self) -> usize {
        self.confirmed.len() + self.waitlist.len()
    }
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Default)]
pub struct EventBuilder {
    id: EventId,
    title: String,
    subtitle: Option<String>,
    description: Option<String>,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
    location: Option<String>,
    attendance: Option<Attendance>,
}
impl EventBuilder {
    pub fn new(id: EventId, title: &str, start: DateTime<Utc>) -> Self {
        Self {
            id,
            title: String::from(title),
            start: Some(start),
            ..Self::default()
        }
    }
    pub fn subtitle(mut self, subtitle: &str) -> Self {
        self.subtitle = Some(String::from(subtitle));
        self
    }
    pub fn description(mut self, desc: &str) -> Self {
        self.description = Some(String::from(desc));
        self
    }
    pub fn end(mut self, end: DateTime<Utc>) -> Self {
        self.end = Some(end);
        self
    }
    pub fn location(mut self, location: &str) -> Self {
        self.location = Some(String::from(location));
        self
    }
    pub fn registration(mut self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        let attendance = self.attendance.get_or_insert_with(Attendance::default);
        attendance.register_start = Some(start);
        attendance.register_end = Some(end);
        self
    }
    pub fn pools(mut self, pools: Vec<AttendancePool>) -> Self {
        self.attendance.get_or_insert_with(Attendance::default).pools = pools;
        self
    }
    pub fn attendees(mut self, attendees: Vec<Attendee>) -> Self {
        self.attendance
            .get_or_insert_with(Attendance::default)
            .attendees = attendees;
        self
    }
    pub fn build(self) -> EventAttendanceBundle {
        let attendance_id = self.attendance.as_ref().map(|a| a.id.clone());
        EventAttendanceBundle {
            event: Event {
                id: self.id,
                title: self.title,
                subtitle: self.subtitle,
                description: self.description,
                start: self.start,
                end: self.end,
                location_address: self.location,
                attendance_id,
                ..Event::default()
            },
            attendance: self.attendance,
        }
    }
}

/// Sends every event bundle whose snapshot file is rewritten.
///
/// The listener watches `<base>/db/events` and reloads a bundle once a file backing it has
/// been written and closed, or renamed into place. A bundle equal to the last one sent for
/// the same event is not sent again. Files that fail to decode are skipped; the next write
/// picks them up again.
#[non_exhaustive]
#[derive(Debug)]
pub struct EventListener {
    sender: mpsc::Sender<EventAttendanceBundle>,
    events_dir: PathBuf,
}
impl EventListener {
    pub fn new(sender: mpsc::Sender<EventAttendanceBundle>, db: &Database) -> Self {
        Self {
            sender,
            events_dir: db.events_dir(),
        }
    }
    /// Runs until the receiving half of the channel is dropped.
    pub async fn start(self) -> Result<()> {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<notify::Event>| {
                // the receiver only goes away once `start` returns
                let _ = tx.send(res);
            },
            notify::Config::default(),
        )?;
        watcher.watch(&self.events_dir, notify::RecursiveMode::NonRecursive)?;
        info!("watching {}", self.events_dir.display());

        let mut last_sent: HashMap<EventId, EventAttendanceBundle> = HashMap::new();
        while let Some(fs_event) = rx.recv().await {
            let fs_event = match fs_event {
                Ok(e) => e,
                Err(e) => {
                    warn!("watcher error: {e}");
                    continue;
                }
            };
            if !is_finished_write(&fs_event.kind) {
                continue;
            }
            for path in fs_event.paths.iter().filter(|p| is_snapshot(p)) {
                let bundle = match Database::read_event_file(path) {
                    Ok(bundle) => bundle,
                    Err(e) => {
                        warn!("skipping {}: {e}", path.display());
                        continue;
                    }
                };
                if last_sent.get(&bundle.event.id) == Some(&bundle) {
                    debug!("event {} unchanged", bundle.event.id);
                    continue;
                }
                debug!("reloaded event {}", bundle.event.id);
                last_sent.insert(bundle.event.id.clone(), bundle.clone());
                if self.sender.send(bundle).await.is_err() {
                    info!("event receiver closed, stopping listener");
                    return Ok(());
                }
            }
        }
        Ok(())
    }
}

/// Writes closed in place, and files renamed or created in the folder.
fn is_finished_write(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Access(AccessKind::Close(AccessMode::Write))
            | EventKind::Modify(ModifyKind::Name(RenameMode::To))
            | EventKind::Create(CreateKind::File)
    )
}

fn is_snapshot(path: &Path) -> bool {
    path.extension() == Some(OsStr::new("ron"))
}
