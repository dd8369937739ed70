use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;

use crate::cars::dto::CarPayload;

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Car {
    pub id: i64,
    pub name: String,
    pub price: i64,
    pub size: String,
    pub image: String,
    pub is_currently_rented: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Car {
    pub async fn list(db: &PgPool, limit: i64, offset: i64) -> anyhow::Result<Vec<Car>> {
        let cars = sqlx::query_as::<_, Car>(
            r#"
            SELECT id, name, price, size, image, is_currently_rented, created_at, updated_at
            FROM cars
            ORDER BY id ASC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await?;
        Ok(cars)
    }

    pub async fn count(db: &PgPool) -> anyhow::Result<i64> {
        let count: i64 = sqlx::query_scalar(r#"SELECT COUNT(*) FROM cars"#)
            .fetch_one(db)
            .await?;
        Ok(count)
    }

    pub async fn find_by_id(db: &PgPool, id: i64) -> anyhow::Result<Option<Car>> {
        let car = sqlx::query_as::<_, Car>(
            r#"
            SELECT id, name, price, size, image, is_currently_rented, created_at, updated_at
            FROM cars
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(car)
    }

    pub async fn create(db: &PgPool, payload: &CarPayload) -> anyhow::Result<Car> {
        let car = sqlx::query_as::<_, Car>(
            r#"
            INSERT INTO cars (name, price, size, image, is_currently_rented)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, price, size, image, is_currently_rented, created_at, updated_at
            "#,
        )
        .bind(&payload.name)
        .bind(payload.price)
        .bind(payload.size.as_str())
        .bind(&payload.image)
        .bind(payload.is_currently_rented)
        .fetch_one(db)
        .await?;
        Ok(car)
    }

    pub async fn update(db: &PgPool, id: i64, payload: &CarPayload) -> anyhow::Result<Option<Car>> {
        let car = sqlx::query_as::<_, Car>(
            r#"
            UPDATE cars
            SET name = $2, price = $3, size = $4, image = $5,
                is_currently_rented = $6, updated_at = now()
            WHERE id = $1
            RETURNING id, name, price, size, image, is_currently_rented, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(&payload.name)
        .bind(payload.price)
        .bind(payload.size.as_str())
        .bind(&payload.image)
        .bind(payload.is_currently_rented)
        .fetch_optional(db)
        .await?;
        Ok(car)
    }

    /// Returns the number of rows removed (0 when the id is unknown).
    pub async fn delete(db: &PgPool, id: i64) -> anyhow::Result<u64> {
        let result = sqlx::query(r#"DELETE FROM cars WHERE id = $1"#)
            .bind(id)
            .execute(db)
            .await?;
        Ok(result.rows_affected())
    }
}

/// Rental assignment joining a user to a car for a date range.
/// Immutable once created.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct RentalAssignment {
    pub id: i64,
    pub user_id: i64,
    pub car_id: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub rent_started_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub rent_ended_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl RentalAssignment {
    /// Insert an assignment unless an existing one for the same car overlaps
    /// the requested window. The overlap test and the insert run as a single
    /// statement, so two concurrent requests for the same window cannot both
    /// succeed; the loser sees `None`.
    ///
    /// Overlap is the symmetric interval test
    /// (`existing.start < new.end AND existing.end > new.start`); windows that
    /// only touch at an endpoint do not conflict.
    pub async fn try_create(
        db: &PgPool,
        user_id: i64,
        car_id: i64,
        rent_started_at: OffsetDateTime,
        rent_ended_at: OffsetDateTime,
    ) -> anyhow::Result<Option<RentalAssignment>> {
        let assignment = sqlx::query_as::<_, RentalAssignment>(
            r#"
            INSERT INTO user_cars (user_id, car_id, rent_started_at, rent_ended_at)
            SELECT $1, $2, $3, $4
            WHERE NOT EXISTS (
                SELECT 1 FROM user_cars
                WHERE car_id = $2
                  AND rent_started_at < $4
                  AND rent_ended_at > $3
            )
            RETURNING id, user_id, car_id, rent_started_at, rent_ended_at,
                      created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(car_id)
        .bind(rent_started_at)
        .bind(rent_ended_at)
        .fetch_optional(db)
        .await?;
        Ok(assignment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn car_serializes_camel_case() {
        let car = Car {
            id: 1,
            name: "Mazda RX-1".into(),
            price: 300_000,
            size: "SMALL".into(),
            image: "https://source.unsplash.com/500x500".into(),
            is_currently_rented: false,
            created_at: OffsetDateTime::UNIX_EPOCH,
            updated_at: OffsetDateTime::UNIX_EPOCH,
        };
        let json = serde_json::to_value(&car).unwrap();
        assert_eq!(json["isCurrentlyRented"], false);
        assert_eq!(json["createdAt"], "1970-01-01T00:00:00Z");
        assert!(json.get("is_currently_rented").is_none());
    }

    #[test]
    fn rental_assignment_serializes_camel_case_rfc3339() {
        let assignment = RentalAssignment {
            id: 1,
            user_id: 5,
            car_id: 1,
            rent_started_at: datetime!(2024-01-01 00:00 UTC),
            rent_ended_at: datetime!(2024-01-02 00:00 UTC),
            created_at: OffsetDateTime::UNIX_EPOCH,
            updated_at: OffsetDateTime::UNIX_EPOCH,
        };
        let json = serde_json::to_value(&assignment).unwrap();
        assert_eq!(json["userId"], 5);
        assert_eq!(json["carId"], 1);
        assert_eq!(json["rentStartedAt"], "2024-01-01T00:00:00Z");
        assert_eq!(json["rentEndedAt"], "2024-01-02T00:00:00Z");
    }
}
