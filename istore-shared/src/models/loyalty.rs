use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use super::UnknownVariant;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    User,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::User => "user",
            UserRole::Admin => "admin",
        }
    }
}

impl FromStr for UserRole {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(UserRole::User),
            "admin" => Ok(UserRole::Admin),
            other => Err(UnknownVariant { kind: "user role", value: other.to_string() }),
        }
    }
}

/// A loyalty tier. `min_points` is the threshold a customer must reach to hold `level`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LevelRule {
    pub level: i32,
    pub min_points: i32,
    pub discount_percent: f64,
    pub benefits_text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Profile {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub points: i32,
    pub level: i32,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

impl Profile {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewProfile {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub role: UserRole,
}

impl NewProfile {
    /// Profile created the first time an email signs in: level 1, no points,
    /// display name taken from the email's local part.
    pub fn first_access(email: &str) -> Self {
        let full_name = email.split('@').next().unwrap_or(email).to_string();
        Self {
            id: Uuid::new_v4(),
            email: email.to_string(),
            full_name,
            role: UserRole::User,
        }
    }

    pub fn into_profile(self, created_at: DateTime<Utc>) -> Profile {
        Profile {
            id: self.id,
            full_name: self.full_name,
            email: self.email,
            points: 0,
            level: 1,
            role: self.role,
            created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PointsTransaction {
    pub id: Uuid,
    pub user_id: Uuid,
    pub delta_points: i32,
    pub reason: String,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_access_profile() {
        let new = NewProfile::first_access("ana.perez@example.com");
        assert_eq!(new.full_name, "ana.perez");
        assert_eq!(new.role, UserRole::User);

        let profile = new.into_profile(Utc::now());
        assert_eq!(profile.points, 0);
        assert_eq!(profile.level, 1);
        assert!(!profile.is_admin());
    }
}
