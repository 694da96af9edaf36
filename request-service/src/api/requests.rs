//! `/api/requests` handlers.

use axum::Json;
use axum::extract::Path;
use axum::extract::Query;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::extract::rejection::QueryRejection;
use axum::http::StatusCode;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use servicedesk_core::ServiceRequest;
use servicedesk_core::query::ListFilter;
use servicedesk_core::query::PageMetadata;
use servicedesk_core::query::Pagination;
use utoipa::IntoParams;
use utoipa::ToSchema;

use crate::api::AppState;
use crate::api::error::ApiError;
use crate::api::error::ErrorResponse;
use crate::validation;
use crate::validation::CreateRequestBody;
use crate::validation::UpdateStatusBody;

/// Raw listing parameters. Kept as strings: unknown filter values simply
/// match nothing and bad pagination values fall back to defaults.
#[derive(Debug, Default, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListParams {
    /// Exact category, e.g. `IT`.
    pub category: Option<String>,
    /// Exact status, e.g. `IN_PROGRESS`.
    pub status: Option<String>,
    /// Exact priority, e.g. `High`.
    pub priority: Option<String>,
    /// Page size, default 10, capped at 100.
    pub limit: Option<String>,
    /// Records to skip, default 0.
    pub offset: Option<String>,
}

impl ListParams {
    /// Build from decoded query pairs. The first occurrence of a key wins
    /// and unknown keys are ignored.
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut params = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "category" => &mut params.category,
                "status" => &mut params.status,
                "priority" => &mut params.priority,
                "limit" => &mut params.limit,
                "offset" => &mut params.offset,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value);
            }
        }
        params
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RequestListResponse {
    pub data: Vec<ServiceRequest>,
    pub metadata: PageMetadata,
}

fn json_body(body: Result<Json<Value>, JsonRejection>) -> Result<Value, ApiError> {
    body.map(|Json(value)| value)
        .map_err(|rejection| ApiError::Validation(vec![rejection.body_text()]))
}

fn parse_id(raw: &str) -> Result<u64, ApiError> {
    raw.parse().map_err(|_| ApiError::InvalidId)
}

/// Create a service request
#[utoipa::path(
    post,
    path = "/api/requests",
    request_body = CreateRequestBody,
    security(("api_key" = [])),
    responses(
        (status = 201, description = "Created", body = ServiceRequest),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 401, description = "API key required", body = ErrorResponse),
        (status = 403, description = "Invalid API key", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn create_request(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<ServiceRequest>), ApiError> {
    let submission = validation::validate_create(&json_body(body)?)?;
    let record = state.desk.create(submission).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// List service requests
#[utoipa::path(
    get,
    path = "/api/requests",
    params(ListParams),
    responses(
        (status = 200, description = "One page of requests, oldest first", body = RequestListResponse),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_requests(
    State(state): State<AppState>,
    pairs: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Json<RequestListResponse> {
    // Listing never fails on its input: an undecodable query is no query.
    let pairs = match pairs {
        Ok(Query(pairs)) => pairs,
        Err(rejection) => {
            tracing::debug!("ignoring query string: {}", rejection.body_text());
            Vec::new()
        }
    };
    let params = ListParams::from_pairs(pairs);
    let filter = ListFilter {
        category: params.category,
        status: params.status,
        priority: params.priority,
    };
    let pagination = Pagination::from_raw(params.limit.as_deref(), params.offset.as_deref());

    let page = state.desk.list(&filter, pagination).await;
    Json(RequestListResponse {
        data: page.data,
        metadata: page.metadata,
    })
}

/// Fetch one service request
#[utoipa::path(
    get,
    path = "/api/requests/{id}",
    params(("id" = u64, Path, description = "Request id")),
    responses(
        (status = 200, description = "The request", body = ServiceRequest),
        (status = 400, description = "Invalid request ID", body = ErrorResponse),
        (status = 404, description = "Request not found", body = ErrorResponse),
    )
)]
#[tracing::instrument(skip(state))]
pub async fn get_request(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ServiceRequest>, ApiError> {
    let id = parse_id(&id)?;
    Ok(Json(state.desk.get(id).await?))
}

/// Move a service request to another status
#[utoipa::path(
    patch,
    path = "/api/requests/{id}/status",
    params(("id" = u64, Path, description = "Request id")),
    request_body = UpdateStatusBody,
    security(("api_key" = [])),
    responses(
        (status = 200, description = "Updated request", body = ServiceRequest),
        (status = 400, description = "Validation failed or invalid request ID", body = ErrorResponse),
        (status = 401, description = "API key required", body = ErrorResponse),
        (status = 403, description = "Invalid API key", body = ErrorResponse),
        (status = 404, description = "Request not found", body = ErrorResponse),
        (status = 422, description = "Invalid status transition", body = ErrorResponse),
    )
)]
#[tracing::instrument(skip(state, body))]
pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<ServiceRequest>, ApiError> {
    // Body first, then id.
    let target = validation::validate_status_update(&json_body(body)?)?;
    let id = parse_id(&id)?;
    Ok(Json(state.desk.update_status(id, target).await?))
}
