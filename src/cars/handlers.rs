use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::auth::extractors::{RequireAdmin, RequireCustomer};
use crate::cars::dto::{CarListQuery, CarListResponse, CarPayload, ListMeta, Pagination, RentRequest};
use crate::cars::repo::{Car, RentalAssignment};
use crate::error::ApiError;
use crate::state::AppState;

pub fn car_routes() -> Router<AppState> {
    Router::new()
        .route("/cars", get(list_cars).post(create_car))
        .route(
            "/cars/:id",
            get(get_car).put(update_car).delete(delete_car),
        )
        .route("/cars/:id/rent", post(rent_car))
}

#[instrument(skip(state))]
pub async fn list_cars(
    State(state): State<AppState>,
    Query(query): Query<CarListQuery>,
) -> Result<Json<CarListResponse>, ApiError> {
    let cars = Car::list(&state.db, query.page_size, query.offset()).await?;
    let count = Car::count(&state.db).await?;
    Ok(Json(CarListResponse {
        cars,
        meta: ListMeta {
            pagination: Pagination::build(&query, count),
        },
    }))
}

#[instrument(skip(state))]
pub async fn get_car(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Car>, ApiError> {
    let car = Car::find_by_id(&state.db, id)
        .await?
        .ok_or(ApiError::RecordNotFound { entity: "car", id })?;
    Ok(Json(car))
}

#[instrument(skip(state, admin, payload))]
pub async fn create_car(
    State(state): State<AppState>,
    admin: RequireAdmin,
    Json(payload): Json<CarPayload>,
) -> Result<(StatusCode, Json<Car>), ApiError> {
    let car = Car::create(&state.db, &payload).await?;
    info!(car_id = car.id, admin_id = admin.0.user.id, "car created");
    Ok((StatusCode::CREATED, Json(car)))
}

#[instrument(skip(state, admin, payload))]
pub async fn update_car(
    State(state): State<AppState>,
    admin: RequireAdmin,
    Path(id): Path<i64>,
    Json(payload): Json<CarPayload>,
) -> Result<Json<Car>, ApiError> {
    let car = Car::update(&state.db, id, &payload)
        .await?
        .ok_or(ApiError::RecordNotFound { entity: "car", id })?;
    info!(car_id = car.id, admin_id = admin.0.user.id, "car updated");
    Ok(Json(car))
}

#[instrument(skip(state, admin))]
pub async fn delete_car(
    State(state): State<AppState>,
    admin: RequireAdmin,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let removed = Car::delete(&state.db, id).await?;
    if removed == 0 {
        return Err(ApiError::RecordNotFound { entity: "car", id });
    }
    info!(car_id = id, admin_id = admin.0.user.id, "car deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, customer, payload))]
pub async fn rent_car(
    State(state): State<AppState>,
    customer: RequireCustomer,
    Path(id): Path<i64>,
    Json(payload): Json<RentRequest>,
) -> Result<(StatusCode, Json<RentalAssignment>), ApiError> {
    payload.validate()?;

    let car = Car::find_by_id(&state.db, id)
        .await?
        .ok_or(ApiError::RecordNotFound { entity: "car", id })?;

    let user_id = customer.0.user.id;
    match RentalAssignment::try_create(
        &state.db,
        user_id,
        car.id,
        payload.rent_started_at,
        payload.rent_ended_at,
    )
    .await?
    {
        Some(assignment) => {
            info!(
                car_id = car.id,
                user_id,
                rent_started_at = %payload.rent_started_at,
                rent_ended_at = %payload.rent_ended_at,
                "car rented"
            );
            Ok((StatusCode::CREATED, Json(assignment)))
        }
        None => {
            warn!(car_id = car.id, user_id, "rental window conflict");
            Err(ApiError::CarAlreadyRented { car })
        }
    }
}
