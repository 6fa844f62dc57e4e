use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::db::models::{User, UserRole};
use crate::db::DatabaseError;

pub struct UserRepository;

impl UserRepository {
    pub async fn find_by_id(pool: &PgPool, user_id: Uuid) -> Result<Option<User>, DatabaseError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(pool)
            .await?;
        Ok(user)
    }

    /// Looks a user up only if they carry a provider role.
    pub async fn find_provider(
        pool: &PgPool,
        user_id: Uuid,
    ) -> Result<Option<User>, DatabaseError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE id = $1 AND role IN ('tutor', 'counselor')",
        )
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
        Ok(user)
    }

    /// Find-or-create for first authenticated contact. The identity
    /// provider owns the subject; this table only mirrors it.
    pub async fn upsert_subject(
        pool: &PgPool,
        user_id: Uuid,
        email: &str,
        full_name: &str,
        role: UserRole,
    ) -> Result<User, DatabaseError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, email, full_name, role)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO UPDATE SET role = EXCLUDED.role, updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(email)
        .bind(full_name)
        .bind(role)
        .fetch_one(pool)
        .await?;
        Ok(user)
    }

    /// Transaction-scoped provider lookup used inside the booking
    /// resolver's critical section.
    pub async fn find_provider_tx(
        tx: &mut Transaction<'_, Postgres>,
        user_id: Uuid,
    ) -> Result<Option<User>, DatabaseError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE id = $1 AND role IN ('tutor', 'counselor')",
        )
        .bind(user_id)
        .fetch_optional(&mut **tx)
        .await?;
        Ok(user)
    }
}
