use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::error::ApiError;

/// Closed set of car size classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CarSize {
    Small,
    Medium,
    Large,
}

impl CarSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            CarSize::Small => "SMALL",
            CarSize::Medium => "MEDIUM",
            CarSize::Large => "LARGE",
        }
    }
}

/// Create/update body for a car.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarPayload {
    pub name: String,
    pub price: i64,
    pub size: CarSize,
    pub image: String,
    #[serde(default)]
    pub is_currently_rented: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarListQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_page_size")]
    pub page_size: i64,
}

fn default_page() -> i64 {
    1
}
fn default_page_size() -> i64 {
    10
}

impl CarListQuery {
    pub fn offset(&self) -> i64 {
        (self.page.max(1) - 1) * self.page_size
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: i64,
    pub page_count: i64,
    pub page_size: i64,
    pub count: i64,
}

impl Pagination {
    pub fn build(query: &CarListQuery, count: i64) -> Self {
        let page_size = query.page_size.max(1);
        Self {
            page: query.page,
            page_count: (count + page_size - 1) / page_size,
            page_size: query.page_size,
            count,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ListMeta {
    pub pagination: Pagination,
}

#[derive(Debug, Serialize)]
pub struct CarListResponse {
    pub cars: Vec<crate::cars::repo::Car>,
    pub meta: ListMeta,
}

/// Requested rental window.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RentRequest {
    #[serde(with = "time::serde::rfc3339")]
    pub rent_started_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub rent_ended_at: OffsetDateTime,
}

impl RentRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.rent_started_at >= self.rent_ended_at {
            return Err(ApiError::Validation(
                "rentStartedAt must be earlier than rentEndedAt".into(),
            ));
        }
        Ok(())
    }
}
