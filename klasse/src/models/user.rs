use std::fmt::Display;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{MembershipId, UserId};

/// A user as returned by the backend, memberships in the order they were received.
///
/// The order of `memberships` matters: the active membership is the *last* one that has
/// not ended yet, see [`find_active_membership`](crate::grade::find_active_membership).
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    #[serde(default)]
    pub profile_slug: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub biography: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub dietary_restrictions: Option<String>,
    #[serde(default)]
    pub ntnu_username: Option<String>,
    #[serde(default)]
    pub flags: Vec<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub memberships: Vec<Membership>,
}
impl User {
    pub fn new(id: UserId, name: &str) -> Self {
        Self {
            id,
            profile_slug: name.to_lowercase().replace(' ', "-"),
            name: Some(String::from(name)),
            email: None,
            image_url: None,
            biography: None,
            phone: None,
            gender: None,
            dietary_restrictions: None,
            ntnu_username: None,
            flags: Vec::new(),
            created_at: None,
            updated_at: None,
            memberships: Vec::new(),
        }
    }
    pub fn with_membership(mut self, membership: Membership) -> Self {
        self.memberships.push(membership);
        self
    }
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.profile_slug)
    }
}
impl PartialEq for User {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}
impl Eq for User {}

/// One affiliation period. `end` is exclusive.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Membership {
    #[serde(default)]
    pub id: MembershipId,
    #[serde(default)]
    pub user_id: UserId,
    #[serde(rename = "type")]
    pub kind: MembershipType,
    #[serde(default)]
    pub specialization: Option<Specialization>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}
impl Membership {
    pub fn new(kind: MembershipType, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            id: MembershipId::default(),
            user_id: UserId::default(),
            kind,
            specialization: None,
            start,
            end,
        }
    }
    pub fn specialization(mut self, specialization: Specialization) -> Self {
        self.specialization = Some(specialization);
        self
    }
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.end > now
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MembershipType {
    BachelorStudent,
    MasterStudent,
    PhdStudent,
    Knight,
    SocialMember,
    Other,
}
impl MembershipType {
    pub const fn as_wire(&self) -> &'static str {
        match self {
            MembershipType::BachelorStudent => "BACHELOR_STUDENT",
            MembershipType::MasterStudent => "MASTER_STUDENT",
            MembershipType::PhdStudent => "PHD_STUDENT",
            MembershipType::Knight => "KNIGHT",
            MembershipType::SocialMember => "SOCIAL_MEMBER",
            MembershipType::Other => "OTHER",
        }
    }
}
impl Display for MembershipType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", title_case(self.as_wire()))
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Specialization {
    ArtificialIntelligence,
    DatabaseAndSearch,
    InteractionDesign,
    SoftwareEngineering,
    Unknown,
}
impl Specialization {
    pub const fn as_wire(&self) -> &'static str {
        match self {
            Specialization::ArtificialIntelligence => "ARTIFICIAL_INTELLIGENCE",
            Specialization::DatabaseAndSearch => "DATABASE_AND_SEARCH",
            Specialization::InteractionDesign => "INTERACTION_DESIGN",
            Specialization::SoftwareEngineering => "SOFTWARE_ENGINEERING",
            Specialization::Unknown => "UNKNOWN",
        }
    }
    /// Label for an optional specialization, `"Not specified"` when missing.
    pub fn label(specialization: Option<Specialization>) -> String {
        match specialization {
            Some(s) => s.to_string(),
            None => String::from("Not specified"),
        }
    }
}
impl Display for Specialization {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", title_case(self.as_wire()))
    }
}

// "SOCIAL_MEMBER" -> "Social Member"
fn title_case(wire: &str) -> String {
    wire.split('_')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let lower = w.to_lowercase();
            let mut chars = lower.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
