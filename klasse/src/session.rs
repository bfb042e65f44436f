//! The signed-in user, owned by whoever drives the client.
//!
//! A [`Session`] is passed explicitly to the code that needs it. Interested parties
//! [`subscribe`](Session::subscribe) to a [`watch`] channel and are woken only when the
//! login state or the signed-in user actually changes.

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::info;

use crate::{
    grade::user_grade,
    models::{Grade, User, UserId},
};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub logged_in: bool,
    pub user_id: Option<UserId>,
}

#[derive(Debug)]
pub struct Session {
    user: Option<User>,
    state: watch::Sender<SessionState>,
}
impl Session {
    pub fn new() -> Self {
        let (state, _) = watch::channel(SessionState::default());
        Self { user: None, state }
    }
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }
    pub fn is_logged_in(&self) -> bool {
        self.state.borrow().logged_in
    }
    pub fn current_user(&self) -> Option<&User> {
        self.user.as_ref()
    }
    /// Grade of the signed-in user, `None` when signed out or without a grade.
    pub fn current_grade(&self, now: DateTime<Utc>) -> Option<Grade> {
        self.user.as_ref().and_then(|u| user_grade(u, now))
    }

    pub fn sign_in(&mut self, user: User) {
        let next = SessionState {
            logged_in: true,
            user_id: Some(user.id.clone()),
        };
        self.user = Some(user);
        self.publish(next);
    }
    pub fn sign_out(&mut self) {
        self.user = None;
        self.publish(SessionState::default());
    }

    fn publish(&self, next: SessionState) {
        let changed = self.state.send_if_modified(|state| {
            if *state == next {
                return false;
            }
            *state = next.clone();
            true
        });
        if changed {
            info!(
                "login state changed: {}",
                if next.logged_in { "logged in" } else { "logged out" }
            );
        }
    }
}
impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
