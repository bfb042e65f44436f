mod database;
pub mod event;
mod id;
mod user;

pub use self::database::Database;
pub use self::event::{
    Attendance, AttendancePool, Attendee, AttendeeUser, Event, EventAttendanceBundle,
    EventBuilder, Grade, PoolAttendees,
};
pub use self::id::{AttendanceId, AttendeeId, EventId, MembershipId, PoolId, UserId};
pub use self::user::{Membership, MembershipType, Specialization, User};
