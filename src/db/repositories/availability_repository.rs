use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::db::models::{AvailabilitySlot, Recurrence, SlotInsert, User};
use crate::db::DatabaseError;

pub struct AvailabilityRepository;

impl AvailabilityRepository {
    /// Inserts a validated batch for one provider. Caller owns the
    /// transaction, so the batch commits or rolls back as a whole.
    pub async fn insert_batch(
        tx: &mut Transaction<'_, Postgres>,
        provider: &User,
        items: &[SlotInsert],
    ) -> Result<Vec<AvailabilitySlot>, DatabaseError> {
        let mut created = Vec::with_capacity(items.len());

        for item in items {
            let slot = sqlx::query_as::<_, AvailabilitySlot>(
                r#"
                INSERT INTO availability_slots
                    (provider_id, provider_name, provider_role, day_of_week,
                     start_minute, end_minute, is_active, recurrence)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                RETURNING *
                "#,
            )
            .bind(provider.id)
            .bind(&provider.full_name)
            .bind(provider.role)
            .bind(item.day_of_week)
            .bind(item.start_minute)
            .bind(item.end_minute)
            .bind(item.is_active)
            .bind(item.recurrence)
            .fetch_one(&mut **tx)
            .await?;
            created.push(slot);
        }

        Ok(created)
    }

    pub async fn find_by_id(
        pool: &PgPool,
        slot_id: Uuid,
    ) -> Result<Option<AvailabilitySlot>, DatabaseError> {
        let slot =
            sqlx::query_as::<_, AvailabilitySlot>("SELECT * FROM availability_slots WHERE id = $1")
                .bind(slot_id)
                .fetch_optional(pool)
                .await?;
        Ok(slot)
    }

    pub async fn list_for_provider(
        pool: &PgPool,
        provider_id: Uuid,
        active_only: bool,
    ) -> Result<Vec<AvailabilitySlot>, DatabaseError> {
        let slots = sqlx::query_as::<_, AvailabilitySlot>(
            r#"
            SELECT * FROM availability_slots
            WHERE provider_id = $1 AND (NOT $2 OR is_active)
            ORDER BY day_of_week ASC, start_minute ASC
            "#,
        )
        .bind(provider_id)
        .bind(active_only)
        .fetch_all(pool)
        .await?;
        Ok(slots)
    }

    /// Active slots for one provider, snapshot-read inside the caller's
    /// transaction. Used by both the batch overlap check and the booking
    /// resolver.
    pub async fn list_active_tx(
        tx: &mut Transaction<'_, Postgres>,
        provider_id: Uuid,
    ) -> Result<Vec<AvailabilitySlot>, DatabaseError> {
        let slots = sqlx::query_as::<_, AvailabilitySlot>(
            r#"
            SELECT * FROM availability_slots
            WHERE provider_id = $1 AND is_active
            ORDER BY day_of_week ASC, start_minute ASC
            "#,
        )
        .bind(provider_id)
        .fetch_all(&mut **tx)
        .await?;
        Ok(slots)
    }

    /// The explicit-slot path of the booking resolver: the slot must
    /// belong to the provider and be active.
    pub async fn find_active_for_provider(
        tx: &mut Transaction<'_, Postgres>,
        slot_id: Uuid,
        provider_id: Uuid,
    ) -> Result<Option<AvailabilitySlot>, DatabaseError> {
        let slot = sqlx::query_as::<_, AvailabilitySlot>(
            "SELECT * FROM availability_slots WHERE id = $1 AND provider_id = $2 AND is_active",
        )
        .bind(slot_id)
        .bind(provider_id)
        .fetch_optional(&mut **tx)
        .await?;
        Ok(slot)
    }

    /// Writes the effective (already merged and re-validated) values.
    #[allow(clippy::too_many_arguments)]
    pub async fn update(
        pool: &PgPool,
        slot_id: Uuid,
        day_of_week: i16,
        start_minute: i16,
        end_minute: i16,
        is_active: bool,
        recurrence: Recurrence,
    ) -> Result<AvailabilitySlot, DatabaseError> {
        let slot = sqlx::query_as::<_, AvailabilitySlot>(
            r#"
            UPDATE availability_slots
            SET day_of_week = $1,
                start_minute = $2,
                end_minute = $3,
                is_active = $4,
                recurrence = $5,
                updated_at = NOW()
            WHERE id = $6
            RETURNING *
            "#,
        )
        .bind(day_of_week)
        .bind(start_minute)
        .bind(end_minute)
        .bind(is_active)
        .bind(recurrence)
        .bind(slot_id)
        .fetch_one(pool)
        .await?;
        Ok(slot)
    }

    /// Hard delete; returns whether a row was removed.
    pub async fn delete(pool: &PgPool, slot_id: Uuid) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM availability_slots WHERE id = $1")
            .bind(slot_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
