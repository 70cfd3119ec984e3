use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_core::{
    LotRepository, RepoResult, Repositories, ReservationRepository, SpotRepository,
    UserRepository,
};
use parking_shared::{ParkingLot, ParkingSpot, Reservation, SpotStatus, User};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

/// PostgreSQL-backed repositories. Schema lives in `migrations/`.
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn repositories(store: &Arc<Self>) -> Repositories {
        Repositories {
            lots: store.clone(),
            spots: store.clone(),
            reservations: store.clone(),
            users: store.clone(),
        }
    }
}

// Internal structs for type-safe querying
#[derive(sqlx::FromRow)]
struct LotRow {
    id: Uuid,
    location: String,
    address: String,
    postal_code: String,
    hourly_rate: f64,
    capacity: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<LotRow> for ParkingLot {
    fn from(row: LotRow) -> Self {
        Self {
            id: row.id,
            location: row.location,
            address: row.address,
            postal_code: row.postal_code,
            hourly_rate: row.hourly_rate,
            capacity: row.capacity,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct SpotRow {
    id: Uuid,
    lot_id: Uuid,
    number: i32,
    status: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<SpotRow> for ParkingSpot {
    type Error = String;

    fn try_from(row: SpotRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            lot_id: row.lot_id,
            number: row.number,
            status: row.status.parse::<SpotStatus>()?,
            created_at: row.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ReservationRow {
    id: Uuid,
    spot_id: Uuid,
    lot_id: Uuid,
    user_id: Uuid,
    vehicle_id: String,
    started_at: DateTime<Utc>,
    ended_at: Option<DateTime<Utc>>,
    total_cost: Option<f64>,
}

impl From<ReservationRow> for Reservation {
    fn from(row: ReservationRow) -> Self {
        Self {
            id: row.id,
            spot_id: row.spot_id,
            lot_id: row.lot_id,
            user_id: row.user_id,
            vehicle_id: row.vehicle_id,
            started_at: row.started_at,
            ended_at: row.ended_at,
            total_cost: row.total_cost,
        }
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    password_digest: String,
    name: String,
    address: Option<String>,
    postal_code: Option<String>,
    is_admin: bool,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            email: row.email,
            password_digest: row.password_digest,
            name: row.name,
            address: row.address,
            postal_code: row.postal_code,
            is_admin: row.is_admin,
            created_at: row.created_at,
        }
    }
}

const LOT_COLUMNS: &str =
    "id, location, address, postal_code, hourly_rate, capacity, created_at, updated_at";
const SPOT_COLUMNS: &str = "id, lot_id, number, status, created_at";
const RESERVATION_COLUMNS: &str =
    "id, spot_id, lot_id, user_id, vehicle_id, started_at, ended_at, total_cost";
const USER_COLUMNS: &str =
    "id, email, password_digest, name, address, postal_code, is_admin, created_at";

fn spots_from_rows(rows: Vec<SpotRow>) -> RepoResult<Vec<ParkingSpot>> {
    rows.into_iter()
        .map(|row| ParkingSpot::try_from(row).map_err(Into::into))
        .collect()
}

#[async_trait]
impl LotRepository for PgStore {
    async fn insert_lot(&self, lot: &ParkingLot) -> RepoResult<()> {
        sqlx::query(
            r#"
            INSERT INTO parking_lots (id, location, address, postal_code, hourly_rate, capacity, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(lot.id)
        .bind(&lot.location)
        .bind(&lot.address)
        .bind(&lot.postal_code)
        .bind(lot.hourly_rate)
        .bind(lot.capacity)
        .bind(lot.created_at)
        .bind(lot.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_lot(&self, id: Uuid) -> RepoResult<Option<ParkingLot>> {
        let row: Option<LotRow> = sqlx::query_as(&format!(
            "SELECT {} FROM parking_lots WHERE id = $1",
            LOT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(ParkingLot::from))
    }

    async fn list_lots(&self) -> RepoResult<Vec<ParkingLot>> {
        let rows: Vec<LotRow> = sqlx::query_as(&format!(
            "SELECT {} FROM parking_lots ORDER BY created_at, location",
            LOT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(ParkingLot::from).collect())
    }

    async fn search_lots(&self, needle: &str) -> RepoResult<Vec<ParkingLot>> {
        let pattern = format!("%{}%", escape_like(needle));
        let rows: Vec<LotRow> = sqlx::query_as(&format!(
            "SELECT {} FROM parking_lots WHERE location ILIKE $1 OR postal_code ILIKE $1 ORDER BY created_at, location",
            LOT_COLUMNS
        ))
        .bind(pattern)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(ParkingLot::from).collect())
    }

    async fn update_lot(&self, lot: &ParkingLot) -> RepoResult<()> {
        sqlx::query(
            r#"
            UPDATE parking_lots
            SET location = $1, address = $2, postal_code = $3, hourly_rate = $4, capacity = $5, updated_at = $6
            WHERE id = $7
            "#,
        )
        .bind(&lot.location)
        .bind(&lot.address)
        .bind(&lot.postal_code)
        .bind(lot.hourly_rate)
        .bind(lot.capacity)
        .bind(lot.updated_at)
        .bind(lot.id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete_lot(&self, id: Uuid) -> RepoResult<()> {
        sqlx::query("DELETE FROM parking_lots WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

#[async_trait]
impl SpotRepository for PgStore {
    async fn insert_spots(&self, spots: &[ParkingSpot]) -> RepoResult<()> {
        let mut tx = self.pool.begin().await?;

        for spot in spots {
            sqlx::query(
                "INSERT INTO parking_spots (id, lot_id, number, status, created_at) VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(spot.id)
            .bind(spot.lot_id)
            .bind(spot.number)
            .bind(spot.status.as_str())
            .bind(spot.created_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn get_spot(&self, id: Uuid) -> RepoResult<Option<ParkingSpot>> {
        let row: Option<SpotRow> = sqlx::query_as(&format!(
            "SELECT {} FROM parking_spots WHERE id = $1",
            SPOT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(ParkingSpot::try_from(row)?)),
            None => Ok(None),
        }
    }

    async fn list_spots(&self, lot_id: Uuid) -> RepoResult<Vec<ParkingSpot>> {
        let rows: Vec<SpotRow> = sqlx::query_as(&format!(
            "SELECT {} FROM parking_spots WHERE lot_id = $1 ORDER BY number",
            SPOT_COLUMNS
        ))
        .bind(lot_id)
        .fetch_all(&self.pool)
        .await?;

        spots_from_rows(rows)
    }

    async fn transition_status(
        &self,
        spot_id: Uuid,
        from: SpotStatus,
        to: SpotStatus,
    ) -> RepoResult<bool> {
        let result = sqlx::query("UPDATE parking_spots SET status = $1 WHERE id = $2 AND status = $3")
            .bind(to.as_str())
            .bind(spot_id)
            .bind(from.as_str())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn delete_spots(&self, ids: &[Uuid]) -> RepoResult<u64> {
        let result = sqlx::query("DELETE FROM parking_spots WHERE id = ANY($1)")
            .bind(ids.to_vec())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

#[async_trait]
impl ReservationRepository for PgStore {
    async fn insert_reservation(&self, reservation: &Reservation) -> RepoResult<()> {
        sqlx::query(
            r#"
            INSERT INTO reservations (id, spot_id, lot_id, user_id, vehicle_id, started_at, ended_at, total_cost)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(reservation.id)
        .bind(reservation.spot_id)
        .bind(reservation.lot_id)
        .bind(reservation.user_id)
        .bind(&reservation.vehicle_id)
        .bind(reservation.started_at)
        .bind(reservation.ended_at)
        .bind(reservation.total_cost)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_reservation(&self, id: Uuid) -> RepoResult<Option<Reservation>> {
        let row: Option<ReservationRow> = sqlx::query_as(&format!(
            "SELECT {} FROM reservations WHERE id = $1",
            RESERVATION_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Reservation::from))
    }

    async fn close_reservation(&self, reservation: &Reservation) -> RepoResult<bool> {
        let result = sqlx::query(
            "UPDATE reservations SET ended_at = $1, total_cost = $2 WHERE id = $3 AND ended_at IS NULL",
        )
        .bind(reservation.ended_at)
        .bind(reservation.total_cost)
        .bind(reservation.id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn find_open_by_vehicle(&self, vehicle_id: &str) -> RepoResult<Option<Reservation>> {
        let row: Option<ReservationRow> = sqlx::query_as(&format!(
            "SELECT {} FROM reservations WHERE vehicle_id = $1 AND ended_at IS NULL",
            RESERVATION_COLUMNS
        ))
        .bind(vehicle_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Reservation::from))
    }

    async fn find_open_by_spot(&self, spot_id: Uuid) -> RepoResult<Option<Reservation>> {
        let row: Option<ReservationRow> = sqlx::query_as(&format!(
            "SELECT {} FROM reservations WHERE spot_id = $1 AND ended_at IS NULL",
            RESERVATION_COLUMNS
        ))
        .bind(spot_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Reservation::from))
    }

    async fn list_open_by_user(&self, user_id: Uuid) -> RepoResult<Vec<Reservation>> {
        let rows: Vec<ReservationRow> = sqlx::query_as(&format!(
            "SELECT {} FROM reservations WHERE user_id = $1 AND ended_at IS NULL ORDER BY started_at",
            RESERVATION_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Reservation::from).collect())
    }

    async fn list_by_user(&self, user_id: Uuid) -> RepoResult<Vec<Reservation>> {
        let rows: Vec<ReservationRow> = sqlx::query_as(&format!(
            "SELECT {} FROM reservations WHERE user_id = $1 ORDER BY started_at",
            RESERVATION_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Reservation::from).collect())
    }

    async fn delete_by_spots(&self, spot_ids: &[Uuid]) -> RepoResult<u64> {
        let result = sqlx::query("DELETE FROM reservations WHERE spot_id = ANY($1)")
            .bind(spot_ids.to_vec())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

#[async_trait]
impl UserRepository for PgStore {
    async fn insert_user(&self, user: &User) -> RepoResult<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, email, password_digest, name, address, postal_code, is_admin, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.password_digest)
        .bind(&user.name)
        .bind(&user.address)
        .bind(&user.postal_code)
        .bind(user.is_admin)
        .bind(user.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_user(&self, id: Uuid) -> RepoResult<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(User::from))
    }

    async fn find_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "SELECT {} FROM users WHERE email = $1",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(User::from))
    }

    async fn update_user(&self, user: &User) -> RepoResult<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET password_digest = $1, name = $2, address = $3, postal_code = $4
            WHERE id = $5
            "#,
        )
        .bind(&user.password_digest)
        .bind(&user.name)
        .bind(&user.address)
        .bind(&user.postal_code)
        .bind(user.id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_users(&self) -> RepoResult<Vec<User>> {
        let rows: Vec<UserRow> = sqlx::query_as(&format!(
            "SELECT {} FROM users ORDER BY email",
            USER_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(User::from).collect())
    }
}

/// Escape LIKE wildcards so user input matches literally
fn escape_like(raw: &str) -> String {
    raw.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}
