use axum::Json;
use servicedesk_core::Category;
use servicedesk_core::Priority;
use servicedesk_core::RequestStatus;
use servicedesk_core::ServiceRequest;
use servicedesk_core::query::PageMetadata;
use utoipa::Modify;
use utoipa::OpenApi;
use utoipa::openapi::security::ApiKey;
use utoipa::openapi::security::ApiKeyValue;
use utoipa::openapi::security::SecurityScheme;

use crate::api::error::ErrorResponse;
use crate::api::health;
use crate::api::health::HealthResponse;
use crate::api::requests;
use crate::api::requests::RequestListResponse;
use crate::auth::API_KEY_HEADER;
use crate::validation::CreateRequestBody;
use crate::validation::UpdateStatusBody;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Request Service API",
        description = "Service request intake and lifecycle",
    ),
    paths(
        health::health_handler,
        requests::create_request,
        requests::list_requests,
        requests::get_request,
        requests::update_status,
    ),
    components(
        schemas(
            Category,
            Priority,
            RequestStatus,
            ServiceRequest,
            PageMetadata,
            RequestListResponse,
            CreateRequestBody,
            UpdateStatusBody,
            ErrorResponse,
            HealthResponse,
        ),
    ),
    modifiers(&ApiKeyScheme),
    tags(
        (name = "request service", description = "Service request intake and lifecycle")
    )
)]
pub struct ApiDoc;

struct ApiKeyScheme;

impl Modify for ApiKeyScheme {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_key",
            SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new(API_KEY_HEADER))),
        );
    }
}

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
