use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::catalog::{CreateDeliveryZoneRequest, DeliveryZoneList, UpdateDeliveryZoneRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    models::DeliveryZone,
    response::ApiResponse,
    routes::params::ActiveFilterQuery,
    services::delivery_zone_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_zones).post(create_zone))
        .route(
            "/{id}",
            get(get_zone).patch(update_zone).delete(delete_zone),
        )
}

#[utoipa::path(
    get,
    path = "/api/delivery-zones",
    params(ActiveFilterQuery),
    responses(
        (status = 200, description = "List delivery zones", body = ApiResponse<DeliveryZoneList>)
    ),
    tag = "Delivery Zones"
)]
pub async fn list_zones(
    State(state): State<AppState>,
    user: Option<AuthUser>,
    Query(query): Query<ActiveFilterQuery>,
) -> AppResult<Json<ApiResponse<DeliveryZoneList>>> {
    let resp = delivery_zone_service::list_zones(&state, user.as_ref(), query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/delivery-zones/{id}",
    params(("id" = Uuid, Path, description = "Delivery zone ID")),
    responses(
        (status = 200, description = "Get delivery zone", body = ApiResponse<DeliveryZone>),
        (status = 404, description = "Delivery zone not found")
    ),
    tag = "Delivery Zones"
)]
pub async fn get_zone(
    State(state): State<AppState>,
    user: Option<AuthUser>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<DeliveryZone>>> {
    let resp = delivery_zone_service::get_zone(&state, user.as_ref(), id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/delivery-zones",
    request_body = CreateDeliveryZoneRequest,
    responses(
        (status = 201, description = "Create delivery zone", body = ApiResponse<DeliveryZone>),
        (status = 403, description = "Super admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Delivery Zones"
)]
pub async fn create_zone(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateDeliveryZoneRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<DeliveryZone>>)> {
    let resp = delivery_zone_service::create_zone(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    patch,
    path = "/api/delivery-zones/{id}",
    params(("id" = Uuid, Path, description = "Delivery zone ID")),
    request_body = UpdateDeliveryZoneRequest,
    responses(
        (status = 200, description = "Updated delivery zone", body = ApiResponse<DeliveryZone>),
        (status = 403, description = "Super admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Delivery Zones"
)]
pub async fn update_zone(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateDeliveryZoneRequest>,
) -> AppResult<Json<ApiResponse<DeliveryZone>>> {
    let resp = delivery_zone_service::update_zone(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/delivery-zones/{id}",
    params(("id" = Uuid, Path, description = "Delivery zone ID")),
    responses(
        (status = 200, description = "Deleted delivery zone", body = ApiResponse<serde_json::Value>),
        (status = 403, description = "Super admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Delivery Zones"
)]
pub async fn delete_zone(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = delivery_zone_service::delete_zone(&state, &user, id).await?;
    Ok(Json(resp))
}
