use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::discounts::{
        CalculateDiscountQuery, CreateDiscountRequest, DiscountCalculation, DiscountList,
        UpdateDiscountRequest,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::Discount,
    response::ApiResponse,
    routes::params::{DiscountQuery, Pagination},
    services::discount_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_discounts).post(create_discount))
        .route("/active", get(active_discounts))
        .route("/global_discounts", get(global_discounts))
        .route(
            "/{id}",
            get(get_discount)
                .patch(update_discount)
                .delete(delete_discount),
        )
        .route("/{id}/calculate", get(calculate_discount))
}

#[utoipa::path(
    get,
    path = "/api/discounts",
    params(DiscountQuery),
    responses(
        (status = 200, description = "List discounts", body = ApiResponse<DiscountList>)
    ),
    tag = "Discounts"
)]
pub async fn list_discounts(
    State(state): State<AppState>,
    user: Option<AuthUser>,
    Query(query): Query<DiscountQuery>,
) -> AppResult<Json<ApiResponse<DiscountList>>> {
    let resp = discount_service::list_discounts(&state, user.as_ref(), query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/discounts/active",
    params(Pagination),
    responses(
        (status = 200, description = "Currently valid discounts", body = ApiResponse<DiscountList>)
    ),
    tag = "Discounts"
)]
pub async fn active_discounts(
    State(state): State<AppState>,
    user: Option<AuthUser>,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<DiscountList>>> {
    let resp = discount_service::list_active(&state, user.as_ref(), pagination).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/discounts/global_discounts",
    params(Pagination),
    responses(
        (status = 200, description = "Discounts not tied to a restaurant", body = ApiResponse<DiscountList>)
    ),
    tag = "Discounts"
)]
pub async fn global_discounts(
    State(state): State<AppState>,
    user: Option<AuthUser>,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<DiscountList>>> {
    let resp = discount_service::list_global(&state, user.as_ref(), pagination).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/discounts/{id}",
    params(("id" = Uuid, Path, description = "Discount ID")),
    responses(
        (status = 200, description = "Get discount", body = ApiResponse<Discount>),
        (status = 404, description = "Discount not found")
    ),
    tag = "Discounts"
)]
pub async fn get_discount(
    State(state): State<AppState>,
    user: Option<AuthUser>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Discount>>> {
    let resp = discount_service::get_discount(&state, user.as_ref(), id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/discounts/{id}/calculate",
    params(
        ("id" = Uuid, Path, description = "Discount ID"),
        ("amount" = String, Query, description = "Order amount to price the discount against")
    ),
    responses(
        (status = 200, description = "Discount for the amount", body = ApiResponse<DiscountCalculation>),
        (status = 404, description = "Discount not found")
    ),
    tag = "Discounts"
)]
pub async fn calculate_discount(
    State(state): State<AppState>,
    user: Option<AuthUser>,
    Path(id): Path<Uuid>,
    Query(query): Query<CalculateDiscountQuery>,
) -> AppResult<Json<ApiResponse<DiscountCalculation>>> {
    let resp = discount_service::calculate(&state, user.as_ref(), id, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/discounts",
    request_body = CreateDiscountRequest,
    responses(
        (status = 201, description = "Create discount", body = ApiResponse<Discount>),
        (status = 400, description = "Validation failed")
    ),
    security(("bearer_auth" = [])),
    tag = "Discounts"
)]
pub async fn create_discount(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateDiscountRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Discount>>)> {
    let resp = discount_service::create_discount(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    patch,
    path = "/api/discounts/{id}",
    params(("id" = Uuid, Path, description = "Discount ID")),
    request_body = UpdateDiscountRequest,
    responses(
        (status = 200, description = "Updated discount", body = ApiResponse<Discount>),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Discounts"
)]
pub async fn update_discount(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateDiscountRequest>,
) -> AppResult<Json<ApiResponse<Discount>>> {
    let resp = discount_service::update_discount(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/discounts/{id}",
    params(("id" = Uuid, Path, description = "Discount ID")),
    responses(
        (status = 200, description = "Deleted discount", body = ApiResponse<serde_json::Value>),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Discounts"
)]
pub async fn delete_discount(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = discount_service::delete_discount(&state, &user, id).await?;
    Ok(Json(resp))
}
