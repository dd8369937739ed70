use serde::{Deserialize, Serialize};

use crate::auth::repo::User;
use crate::auth::role::Role;

/// Request body for user registration.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Response returned after login or register.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub access_token: String,
}

#[derive(Debug, Serialize)]
pub struct RolePayload {
    pub id: i64,
    pub name: Role,
}

/// Resolved user with role, as returned by the whoami endpoint.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: RolePayload,
}

impl UserResponse {
    pub fn from_user(user: &User, role: Role) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: RolePayload {
                id: user.role_id,
                name: role,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;

    #[test]
    fn token_response_uses_camel_case() {
        let json = serde_json::to_value(TokenResponse {
            access_token: "abc.def.ghi".into(),
        })
        .unwrap();
        assert_eq!(json["accessToken"], "abc.def.ghi");
        assert!(json.get("access_token").is_none());
    }

    #[test]
    fn user_response_exposes_role_but_not_hash() {
        let user = User {
            id: 5,
            name: "Jayabaya".into(),
            email: "jayabaya@example.com".into(),
            password_hash: "$argon2id$opaque".into(),
            role_id: 2,
            role_name: "CUSTOMER".into(),
            created_at: OffsetDateTime::UNIX_EPOCH,
            updated_at: OffsetDateTime::UNIX_EPOCH,
        };
        let json = serde_json::to_value(UserResponse::from_user(&user, Role::Customer)).unwrap();
        assert_eq!(json["id"], 5);
        assert_eq!(json["role"]["id"], 2);
        assert_eq!(json["role"]["name"], "CUSTOMER");
        assert!(json.get("passwordHash").is_none());
    }
}
