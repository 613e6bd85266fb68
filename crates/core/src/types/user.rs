//! User profiles.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{UserId, UserRole};

/// Display name given to profiles created without one.
pub const DEFAULT_DISPLAY_NAME: &str = "Usuário";

/// A staff or customer profile, keyed by the auth provider's user id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub uid: UserId,
    #[serde(default)]
    pub email: String,
    pub display_name: String,
    #[serde(default)]
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

impl UserProfile {
    /// Case-insensitive match on display name or email.
    #[must_use]
    pub fn matches(&self, text: &str) -> bool {
        let needle = text.to_lowercase();
        self.display_name.to_lowercase().contains(&needle)
            || self.email.to_lowercase().contains(&needle)
    }
}

/// Partial profile used for upserts. Missing fields take defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileDraft {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub role: Option<UserRole>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl ProfileDraft {
    /// Fill in defaults: empty email, [`DEFAULT_DISPLAY_NAME`], customer
    /// role and `now` as creation time. Empty strings count as missing
    /// for the display name.
    #[must_use]
    pub fn into_profile(self, uid: UserId, now: DateTime<Utc>) -> UserProfile {
        UserProfile {
            uid,
            email: self.email.unwrap_or_default(),
            display_name: self
                .display_name
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_DISPLAY_NAME.to_owned()),
            role: self.role.unwrap_or_default(),
            created_at: self.created_at.unwrap_or(now),
        }
    }
}
