use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;

use crate::auth::role::Role;

/// User record joined with its role name from the `roles` table.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role_id: i64,
    pub role_name: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl User {
    pub fn role(&self) -> Option<Role> {
        Role::from_name(&self.role_name)
    }

    /// Find a user by email. Callers are expected to lowercase first; the
    /// query lowercases again so a raw value can never bypass normalization.
    pub async fn find_by_email(db: &PgPool, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT u.id, u.name, u.email, u.password_hash, u.role_id,
                   r.name AS role_name, u.created_at, u.updated_at
            FROM users u
            JOIN roles r ON r.id = u.role_id
            WHERE u.email = lower($1)
            "#,
        )
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_id(db: &PgPool, id: i64) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT u.id, u.name, u.email, u.password_hash, u.role_id,
                   r.name AS role_name, u.created_at, u.updated_at
            FROM users u
            JOIN roles r ON r.id = u.role_id
            WHERE u.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Create a new user with a hashed password.
    pub async fn create(
        db: &PgPool,
        name: &str,
        email: &str,
        password_hash: &str,
        role_id: i64,
    ) -> anyhow::Result<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            WITH inserted AS (
                INSERT INTO users (name, email, password_hash, role_id)
                VALUES ($1, lower($2), $3, $4)
                RETURNING id, name, email, password_hash, role_id, created_at, updated_at
            )
            SELECT i.id, i.name, i.email, i.password_hash, i.role_id,
                   r.name AS role_name, i.created_at, i.updated_at
            FROM inserted i
            JOIN roles r ON r.id = i.role_id
            "#,
        )
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .bind(role_id)
        .fetch_one(db)
        .await?;
        Ok(user)
    }
}

/// Static reference row from the `roles` table.
#[derive(Debug, Clone, FromRow)]
pub struct RoleRecord {
    pub id: i64,
    pub name: String,
}

impl RoleRecord {
    pub async fn find_by_role(db: &PgPool, role: Role) -> anyhow::Result<Option<RoleRecord>> {
        let record = sqlx::query_as::<_, RoleRecord>(
            r#"
            SELECT id, name
            FROM roles
            WHERE name = $1
            "#,
        )
        .bind(role.as_str())
        .fetch_optional(db)
        .await?;
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        User {
            id: 5,
            name: "Jayabaya".into(),
            email: "jayabaya@example.com".into(),
            password_hash: "$argon2id$opaque".into(),
            role_id: 1,
            role_name: "CUSTOMER".into(),
            created_at: OffsetDateTime::UNIX_EPOCH,
            updated_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn role_resolves_from_stored_name() {
        assert_eq!(sample_user().role(), Some(Role::Customer));
        let mut corrupted = sample_user();
        corrupted.role_name = "MANAGER".into();
        assert_eq!(corrupted.role(), None);
    }

    #[test]
    fn password_hash_never_serializes() {
        let json = serde_json::to_value(sample_user()).unwrap();
        assert!(json.get("passwordHash").is_none());
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["email"], "jayabaya@example.com");
    }
}
