//! Domain Entities - Core business objects
//!
//! These entities represent the records the service moves between the
//! inbound API, the key-value store and the upstream lookup service.
//! They have no external dependencies beyond serde.

use serde::{Deserialize, Serialize};

/// Geolocation and network metadata for an address.
///
/// Every field is returned verbatim from the upstream lookup service and is
/// never interpreted here. Fields absent from the upstream body decode to
/// their empty value, which is what the service sends on a `"fail"` status.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LookupRecord {
    /// `"success"` or `"fail"`
    pub status: String,
    pub country: String,
    /// ISO 3166-1 alpha-2
    pub country_code: String,
    pub region: String,
    pub region_name: String,
    pub city: String,
    pub zip: String,
    pub lat: f64,
    pub lon: f64,
    pub timezone: String,
    pub isp: String,
    pub org: String,
    /// Autonomous system, e.g. "AS15169 Google LLC"
    #[serde(rename = "as")]
    pub as_name: String,
    /// The address that was looked up
    pub query: String,
    /// Failure reason, only sent when `status` is `"fail"`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// A post in the feed list.
///
/// Posts are stored as their JSON encoding, so two posts are the same list
/// element exactly when both fields match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub value: String,
}

/// A ballot cast for the tracked candidate.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Ballot {
    /// Voter identifier; one vote per id
    #[serde(default)]
    pub id: String,
    #[allow(dead_code)]
    #[serde(default)]
    pub value: String,
}

/// Partial update of a user profile.
///
/// Text fields are written only when non-empty. A counter flag set to `1`
/// increments that counter by one; any other value leaves it untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub likes_count: i64,
    #[serde(default)]
    pub posts_count: i64,
    #[serde(default)]
    pub visitors_count: i64,
}

impl ProfileUpdate {
    /// Counter fields that this update increments.
    pub fn increments(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.likes_count == 1 {
            fields.push(UserProfile::LIKES_COUNT);
        }
        if self.posts_count == 1 {
            fields.push(UserProfile::POSTS_COUNT);
        }
        if self.visitors_count == 1 {
            fields.push(UserProfile::VISITORS_COUNT);
        }
        fields
    }

    /// Whether the update would not touch the stored hash at all.
    pub fn is_noop(&self) -> bool {
        self.name.is_empty() && self.email.is_empty() && self.increments().is_empty()
    }
}

/// Stored user profile, as read back from its hash.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub email: String,
    pub likes_count: i64,
    pub posts_count: i64,
    pub visitors_count: i64,
}

impl UserProfile {
    pub const NAME: &'static str = "name";
    pub const EMAIL: &'static str = "email";
    pub const LIKES_COUNT: &'static str = "likes_count";
    pub const POSTS_COUNT: &'static str = "posts_count";
    pub const VISITORS_COUNT: &'static str = "visitors_count";

    /// Build a profile from raw hash fields. Unknown fields are ignored and
    /// counters that are missing or not numeric read as zero.
    pub fn from_fields<'a, I>(id: &str, fields: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut profile = UserProfile {
            id: id.to_string(),
            ..Default::default()
        };
        for (field, value) in fields {
            match field {
                UserProfile::NAME => profile.name = value.to_string(),
                UserProfile::EMAIL => profile.email = value.to_string(),
                UserProfile::LIKES_COUNT => profile.likes_count = value.parse().unwrap_or(0),
                UserProfile::POSTS_COUNT => profile.posts_count = value.parse().unwrap_or(0),
                UserProfile::VISITORS_COUNT => profile.visitors_count = value.parse().unwrap_or(0),
                _ => {}
            }
        }
        profile
    }
}
