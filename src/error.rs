use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};

use crate::auth::role::Role;
use crate::cars::repo::Car;

/// Every failure the API can surface. Control flow uses the variants;
/// the wire shape is produced only by [`ApiError::to_payload`].
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("access token must be provided")]
    TokenMissing,
    #[error("{0}")]
    TokenMalformed(String),
    #[error("access token has expired")]
    TokenExpired,
    #[error("password does not match the registered credentials")]
    WrongPassword,
    #[error("{} access is required for this operation", .0.as_str())]
    InsufficientAccess(Role),
    #[error("{0} is not registered")]
    EmailNotRegistered(String),
    #[error("{0} is already registered")]
    EmailAlreadyTaken(String),
    #[error("{entity} with id {id} was not found")]
    RecordNotFound { entity: &'static str, id: i64 },
    #[error("{method} {path} is not available on this server")]
    RouteNotFound { method: String, path: String },
    #[error("{} is already rented at the requested time", .car.name)]
    CarAlreadyRented { car: Car },
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    /// Stable error name clients can dispatch on.
    pub fn name(&self) -> &'static str {
        match self {
            ApiError::TokenMissing => "TokenMissingError",
            ApiError::TokenMalformed(_) => "TokenMalformedError",
            ApiError::TokenExpired => "TokenExpiredError",
            ApiError::WrongPassword => "WrongPasswordError",
            ApiError::InsufficientAccess(_) => "InsufficientAccessError",
            ApiError::EmailNotRegistered(_) => "EmailNotRegisteredError",
            ApiError::EmailAlreadyTaken(_) => "EmailAlreadyTakenError",
            ApiError::RecordNotFound { .. } => "RecordNotFoundError",
            ApiError::RouteNotFound { .. } => "NotFoundError",
            ApiError::CarAlreadyRented { .. } => "CarAlreadyRentedError",
            ApiError::Validation(_) => "ValidationError",
            ApiError::Internal(_) => "InternalServerError",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::TokenMissing
            | ApiError::TokenMalformed(_)
            | ApiError::TokenExpired
            | ApiError::WrongPassword
            | ApiError::InsufficientAccess(_) => StatusCode::UNAUTHORIZED,
            ApiError::EmailNotRegistered(_)
            | ApiError::RecordNotFound { .. }
            | ApiError::RouteNotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::EmailAlreadyTaken(_)
            | ApiError::CarAlreadyRented { .. }
            | ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn details(&self) -> Value {
        match self {
            ApiError::CarAlreadyRented { car } => json!(car),
            _ => Value::Null,
        }
    }

    /// Uniform wire shape: `{"error": {"name", "message", "details"}}`.
    pub fn to_payload(&self) -> Value {
        json!({
            "error": {
                "name": self.name(),
                "message": self.to_string(),
                "details": self.details(),
            }
        })
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal(err) = &self {
            tracing::error!(error = %err, "unhandled error");
        }
        (self.status(), Json(self.to_payload())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;

    fn sample_car() -> Car {
        Car {
            id: 1,
            name: "Mazda RX-1".into(),
            price: 300_000,
            size: "SMALL".into(),
            image: "https://source.unsplash.com/500x500".into(),
            is_currently_rented: false,
            created_at: OffsetDateTime::UNIX_EPOCH,
            updated_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn payload_has_uniform_shape() {
        let payload = ApiError::WrongPassword.to_payload();
        let error = &payload["error"];
        assert_eq!(error["name"], "WrongPasswordError");
        assert_eq!(
            error["message"],
            "password does not match the registered credentials"
        );
        assert!(error["details"].is_null());
    }

    #[test]
    fn car_already_rented_carries_car_details() {
        let err = ApiError::CarAlreadyRented { car: sample_car() };
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let payload = err.to_payload();
        assert_eq!(payload["error"]["name"], "CarAlreadyRentedError");
        assert_eq!(payload["error"]["details"]["name"], "Mazda RX-1");
        assert_eq!(payload["error"]["details"]["isCurrentlyRented"], false);
    }

    #[test]
    fn status_codes_follow_the_taxonomy() {
        assert_eq!(ApiError::TokenMissing.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            ApiError::TokenMalformed("bad".into()).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(ApiError::TokenExpired.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            ApiError::InsufficientAccess(Role::Admin).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::EmailNotRegistered("a@b.c".into()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::RecordNotFound { entity: "car", id: 9 }.status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::Validation("bad range".into()).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ApiError::Internal(anyhow::anyhow!("boom")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn internal_errors_do_not_leak_details() {
        let payload = ApiError::Internal(anyhow::anyhow!("db exploded")).to_payload();
        assert_eq!(payload["error"]["name"], "InternalServerError");
        assert!(payload["error"]["details"].is_null());
    }
}
