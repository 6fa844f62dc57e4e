use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::HeaderMap, request::Parts},
};
use uuid::Uuid;

use crate::app_state::AppState;
use crate::db::models::UserRole;
use crate::db::repositories::UserRepository;
use crate::error::AppError;

/// The verified actor for the current request.
///
/// Authentication itself is terminated by the external identity provider
/// at the edge; this service trusts the subject it forwards as headers
/// (`x-user-id`, `x-user-role`, plus `x-user-email`/`x-user-name` used to
/// mirror first-seen subjects into the users table).
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub role: UserRole,
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let headers = &parts.headers;

        let id = header_str(headers, "x-user-id")
            .ok_or_else(|| AppError::Authentication("no verified identity provided".to_string()))?
            .parse::<Uuid>()
            .map_err(|_| AppError::Authentication("malformed user id".to_string()))?;

        let role = header_str(headers, "x-user-role")
            .ok_or_else(|| AppError::Authentication("no role provided".to_string()))?
            .parse::<UserRole>()
            .map_err(AppError::Authentication)?;

        // Mirror first-seen subjects so name snapshots have a source row.
        if UserRepository::find_by_id(&state.db, id).await?.is_none() {
            let email = header_str(headers, "x-user-email").ok_or_else(|| {
                AppError::Authentication("identity headers incomplete".to_string())
            })?;
            let name = header_str(headers, "x-user-name")
                .unwrap_or_else(|| email.split('@').next().unwrap_or(email));
            UserRepository::upsert_subject(&state.db, id, email, name, role).await?;
        }

        Ok(AuthUser { id, role })
    }
}

impl AuthUser {
    /// Guard for provider-only endpoints.
    pub fn require_provider(&self, action: &str) -> Result<(), AppError> {
        if self.role.is_provider() {
            Ok(())
        } else {
            Err(AppError::Authorization(format!(
                "only tutors and counselors can {action}"
            )))
        }
    }

    /// Guard for admin-only endpoints.
    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.role.is_admin() {
            Ok(())
        } else {
            Err(AppError::Authorization("admin access required".to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_guard() {
        let tutor = AuthUser { id: Uuid::new_v4(), role: UserRole::Tutor };
        assert!(tutor.require_provider("set availability").is_ok());
        assert!(tutor.require_admin().is_err());

        let student = AuthUser { id: Uuid::new_v4(), role: UserRole::Student };
        let err = student.require_provider("set availability").unwrap_err();
        assert!(matches!(err, AppError::Authorization(_)));
    }

    #[test]
    fn admin_guard() {
        let admin = AuthUser { id: Uuid::new_v4(), role: UserRole::Admin };
        assert!(admin.require_admin().is_ok());
        assert!(admin.require_provider("set availability").is_err());
    }
}
