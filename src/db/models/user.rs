use serde::{Deserialize, Serialize};
use sqlx::types::Uuid;
use time::OffsetDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, Serialize, Deserialize)]
#[sqlx(type_name = "user_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Student,
    Tutor,
    Counselor,
    Admin,
}

impl UserRole {
    /// Tutors and counselors are the bookable side of the platform.
    pub fn is_provider(self) -> bool {
        match self {
            UserRole::Tutor | UserRole::Counselor => true,
            UserRole::Student | UserRole::Admin => false,
        }
    }

    pub fn is_admin(self) -> bool {
        matches!(self, UserRole::Admin)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            UserRole::Student => "student",
            UserRole::Tutor => "tutor",
            UserRole::Counselor => "counselor",
            UserRole::Admin => "admin",
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "student" => Ok(UserRole::Student),
            "tutor" => Ok(UserRole::Tutor),
            "counselor" => Ok(UserRole::Counselor),
            "admin" => Ok(UserRole::Admin),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// Mirror of the identity provider's subject record. Rows are created on
/// first authenticated contact and are the source of the denormalized
/// name snapshots on slots and bookings.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub role: UserRole,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProviderSummary {
    pub id: Uuid,
    pub name: String,
    pub role: UserRole,
}

impl From<&User> for ProviderSummary {
    fn from(user: &User) -> Self {
        ProviderSummary {
            id: user.id,
            name: user.full_name.clone(),
            role: user.role,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_roles() {
        assert!(UserRole::Tutor.is_provider());
        assert!(UserRole::Counselor.is_provider());
        assert!(!UserRole::Student.is_provider());
        assert!(!UserRole::Admin.is_provider());
    }

    #[test]
    fn role_round_trips_through_str() {
        for role in [UserRole::Student, UserRole::Tutor, UserRole::Counselor, UserRole::Admin] {
            assert_eq!(role.as_str().parse::<UserRole>().unwrap(), role);
        }
        assert!("teacher".parse::<UserRole>().is_err());
    }
}
