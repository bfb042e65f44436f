use std::fmt::Display;

use serde::{Deserialize, Serialize};

macro_rules! string_id {
    ($($name:ident),* $(,)?) => {
        $(
            #[derive(Debug, Default, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
            #[serde(transparent)]
            pub struct $name(pub String);

            impl $name {
                pub fn new(id: &str) -> Self {
                    Self(String::from(id))
                }
                pub fn as_str(&self) -> &str {
                    &self.0
                }
            }

            impl Display for $name {
                fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                    write!(f, "{}", self.0)
                }
            }
        )*
    };
}

string_id!(UserId, EventId, MembershipId, AttendanceId, PoolId, AttendeeId);
