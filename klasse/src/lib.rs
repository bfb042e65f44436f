//! Klasse works out where a student organisation member stands for an event: which
//! academic year ("klasse") their membership puts them in, which registration pool that
//! year belongs to, and who is in or on the waitlist for that pool.
//!
//! All the rules are plain functions over data already fetched from the backend. They
//! take the current instant as an argument, never read the clock themselves, and never
//! fail: "no active membership", "no grade" or "no pool" come back as `None`.
//!
//! [`grade`] resolves a [`User`]'s active membership and its academic year.
//!
//! [`pool`] matches that year against an attendance's [`AttendancePool`]s, with
//! [`resolve_user_pool`] telling why a user has no pool when that matters.
//!
//! [`attendees`] splits an [`EventAttendanceBundle`]'s attendees into per-pool
//! [`PoolAttendees`].
//!
//! [`registration`] has the registration window status and the Norwegian labels around it.
//!
//! [`Database`] keeps captured payloads on disk as human readable [`.ron`] files so the
//! rules can be run offline, and [`EventListener`] sends bundles again whenever their
//! file is rewritten. [`Session`] holds the signed-in user and notifies subscribers when
//! that changes.
//!
//! [`User`]: crate::models::User
//! [`AttendancePool`]: crate::models::AttendancePool
//! [`EventAttendanceBundle`]: crate::models::EventAttendanceBundle
//! [`PoolAttendees`]: crate::models::PoolAttendees
//! [`resolve_user_pool`]: crate::pool::resolve_user_pool
//! [`Database`]: crate::models::Database
//! [`EventListener`]: crate::models::event::EventListener
//! [`Session`]: crate::session::Session
//! [`.ron`]: https://github.com/ron-rs/ron

pub mod attendees;
pub mod error;
pub mod grade;
/// Backend payload shapes, the snapshot store and its listener.
pub mod models;
pub mod pool;
pub mod registration;
pub mod session;

pub use error::{Result, StoreError};
