use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::db::models::{
    AdminBookingQuery, Booking, BookingFilter, BookingStatus, NewBooking, SessionType, User,
};
use crate::db::DatabaseError;

pub struct BookingRepository;

impl BookingRepository {
    /// Serializes booking creation per provider for the lifetime of the
    /// surrounding transaction. Two concurrent requests for the same
    /// provider cannot both pass the conflict check.
    pub async fn lock_provider(
        tx: &mut Transaction<'_, Postgres>,
        provider_id: Uuid,
    ) -> Result<(), DatabaseError> {
        let bits = provider_id.as_u128();
        let key = (bits as i64) ^ ((bits >> 64) as i64);
        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(key)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    /// An existing pending/confirmed booking whose window overlaps or
    /// contains the requested one. The containment branch is subsumed by
    /// the half-open test but is kept explicit as business policy.
    pub async fn find_conflicting(
        tx: &mut Transaction<'_, Postgres>,
        provider_id: Uuid,
        start_time: OffsetDateTime,
        end_time: OffsetDateTime,
    ) -> Result<Option<Booking>, DatabaseError> {
        let booking = sqlx::query_as::<_, Booking>(
            r#"
            SELECT * FROM bookings
            WHERE provider_id = $1
              AND status IN ('pending', 'confirmed')
              AND (
                    (start_time < $3 AND end_time > $2)
                 OR (start_time >= $2 AND end_time <= $3)
              )
            LIMIT 1
            "#,
        )
        .bind(provider_id)
        .bind(start_time)
        .bind(end_time)
        .fetch_optional(&mut **tx)
        .await?;
        Ok(booking)
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn insert(
        tx: &mut Transaction<'_, Postgres>,
        student: &User,
        provider: &User,
        availability_id: Uuid,
        payload: &NewBooking,
        day_of_week: i16,
    ) -> Result<Booking, DatabaseError> {
        let booking = sqlx::query_as::<_, Booking>(
            r#"
            INSERT INTO bookings
                (student_id, provider_id, availability_id, start_time, end_time,
                 day_of_week, status, session_type, notes, student_name,
                 provider_name, provider_role)
            VALUES ($1, $2, $3, $4, $5, $6, 'pending', $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(student.id)
        .bind(provider.id)
        .bind(availability_id)
        .bind(payload.start_time)
        .bind(payload.end_time)
        .bind(day_of_week)
        .bind(payload.session_type.unwrap_or(SessionType::Virtual))
        .bind(payload.notes.clone().unwrap_or_default())
        .bind(&student.full_name)
        .bind(&provider.full_name)
        .bind(provider.role)
        .fetch_one(&mut **tx)
        .await?;
        Ok(booking)
    }

    pub async fn find_by_id(
        pool: &PgPool,
        booking_id: Uuid,
    ) -> Result<Option<Booking>, DatabaseError> {
        let booking = sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = $1")
            .bind(booking_id)
            .fetch_optional(pool)
            .await?;
        Ok(booking)
    }

    /// Compare-and-set status update. Returns `None` when the row moved
    /// away from `expected` under the caller's feet.
    pub async fn update_status_if(
        pool: &PgPool,
        booking_id: Uuid,
        expected: BookingStatus,
        target: BookingStatus,
        cancellation_reason: Option<&str>,
    ) -> Result<Option<Booking>, DatabaseError> {
        let booking = sqlx::query_as::<_, Booking>(
            r#"
            UPDATE bookings
            SET status = $1,
                cancellation_reason = COALESCE($2, cancellation_reason),
                updated_at = NOW()
            WHERE id = $3 AND status = $4
            RETURNING *
            "#,
        )
        .bind(target)
        .bind(cancellation_reason)
        .bind(booking_id)
        .bind(expected)
        .fetch_optional(pool)
        .await?;
        Ok(booking)
    }

    pub async fn list_for_student(
        pool: &PgPool,
        student_id: Uuid,
        filter: &BookingFilter,
    ) -> Result<Vec<Booking>, DatabaseError> {
        let mut query = QueryBuilder::<Postgres>::new("SELECT * FROM bookings WHERE student_id = ");
        query.push_bind(student_id);
        push_filter(&mut query, filter);
        query.push(" ORDER BY start_time ASC");

        let bookings = query.build_query_as::<Booking>().fetch_all(pool).await?;
        Ok(bookings)
    }

    pub async fn list_for_provider(
        pool: &PgPool,
        provider_id: Uuid,
        filter: &BookingFilter,
    ) -> Result<Vec<Booking>, DatabaseError> {
        let mut query =
            QueryBuilder::<Postgres>::new("SELECT * FROM bookings WHERE provider_id = ");
        query.push_bind(provider_id);
        push_filter(&mut query, filter);
        query.push(" ORDER BY start_time ASC");

        let bookings = query.build_query_as::<Booking>().fetch_all(pool).await?;
        Ok(bookings)
    }

    /// The provider's pending inbox, newest request first.
    pub async fn list_pending_for_provider(
        pool: &PgPool,
        provider_id: Uuid,
    ) -> Result<Vec<Booking>, DatabaseError> {
        let bookings = sqlx::query_as::<_, Booking>(
            r#"
            SELECT * FROM bookings
            WHERE provider_id = $1 AND status = 'pending'
            ORDER BY created_at DESC
            "#,
        )
        .bind(provider_id)
        .fetch_all(pool)
        .await?;
        Ok(bookings)
    }

    /// All requests for a provider, optionally narrowed to one status,
    /// most recent session first.
    pub async fn list_requests_for_provider(
        pool: &PgPool,
        provider_id: Uuid,
        status: Option<BookingStatus>,
    ) -> Result<Vec<Booking>, DatabaseError> {
        let mut query =
            QueryBuilder::<Postgres>::new("SELECT * FROM bookings WHERE provider_id = ");
        query.push_bind(provider_id);
        if let Some(status) = status {
            query.push(" AND status = ");
            query.push_bind(status);
        }
        query.push(" ORDER BY start_time DESC");

        let bookings = query.build_query_as::<Booking>().fetch_all(pool).await?;
        Ok(bookings)
    }

    /// Admin overview with paging; returns the page and the total count
    /// for the same conditions.
    pub async fn admin_list(
        pool: &PgPool,
        params: &AdminBookingQuery,
        page: i64,
        limit: i64,
    ) -> Result<(Vec<Booking>, i64), DatabaseError> {
        let mut query = QueryBuilder::<Postgres>::new("SELECT * FROM bookings WHERE TRUE");
        push_admin_filter(&mut query, params);
        query.push(" ORDER BY start_time DESC LIMIT ");
        query.push_bind(limit);
        query.push(" OFFSET ");
        query.push_bind((page - 1) * limit);
        let bookings = query.build_query_as::<Booking>().fetch_all(pool).await?;

        let mut count_query =
            QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM bookings WHERE TRUE");
        push_admin_filter(&mut count_query, params);
        let total: i64 = count_query.build_query_scalar().fetch_one(pool).await?;

        Ok((bookings, total))
    }
}

fn push_filter(query: &mut QueryBuilder<'_, Postgres>, filter: &BookingFilter) {
    if let Some(status) = filter.status {
        query.push(" AND status = ");
        query.push_bind(status);
    }
    if let Some(start_date) = filter.start_date {
        query.push(" AND start_time >= ");
        query.push_bind(start_date);
    }
    if let Some(end_date) = filter.end_date {
        query.push(" AND end_time <= ");
        query.push_bind(end_date);
    }
}

fn push_admin_filter(query: &mut QueryBuilder<'_, Postgres>, params: &AdminBookingQuery) {
    if let Some(status) = params.status {
        query.push(" AND status = ");
        query.push_bind(status);
    }
    if let Some(start_date) = params.start_date {
        query.push(" AND start_time >= ");
        query.push_bind(start_date);
    }
    if let Some(end_date) = params.end_date {
        query.push(" AND end_time <= ");
        query.push_bind(end_date);
    }
    if let Some(student_id) = params.student_id {
        query.push(" AND student_id = ");
        query.push_bind(student_id);
    }
    if let Some(provider_id) = params.provider_id {
        query.push(" AND provider_id = ");
        query.push_bind(provider_id);
    }
}
