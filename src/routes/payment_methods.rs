use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::catalog::{CreatePaymentMethodRequest, PaymentMethodList, UpdatePaymentMethodRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    models::PaymentMethod,
    response::ApiResponse,
    routes::params::ActiveFilterQuery,
    services::payment_method_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_payment_methods).post(create_payment_method))
        .route(
            "/{id}",
            get(get_payment_method)
                .patch(update_payment_method)
                .delete(delete_payment_method),
        )
}

#[utoipa::path(
    get,
    path = "/api/payment-methods",
    params(ActiveFilterQuery),
    responses(
        (status = 200, description = "List payment methods", body = ApiResponse<PaymentMethodList>)
    ),
    tag = "Payment Methods"
)]
pub async fn list_payment_methods(
    State(state): State<AppState>,
    user: Option<AuthUser>,
    Query(query): Query<ActiveFilterQuery>,
) -> AppResult<Json<ApiResponse<PaymentMethodList>>> {
    let resp = payment_method_service::list_payment_methods(&state, user.as_ref(), query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/payment-methods/{id}",
    params(("id" = Uuid, Path, description = "Payment method ID")),
    responses(
        (status = 200, description = "Get payment method", body = ApiResponse<PaymentMethod>),
        (status = 404, description = "Payment method not found")
    ),
    tag = "Payment Methods"
)]
pub async fn get_payment_method(
    State(state): State<AppState>,
    user: Option<AuthUser>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<PaymentMethod>>> {
    let resp = payment_method_service::get_payment_method(&state, user.as_ref(), id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/payment-methods",
    request_body = CreatePaymentMethodRequest,
    responses(
        (status = 201, description = "Create payment method", body = ApiResponse<PaymentMethod>),
        (status = 403, description = "Super admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Payment Methods"
)]
pub async fn create_payment_method(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreatePaymentMethodRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<PaymentMethod>>)> {
    let resp = payment_method_service::create_payment_method(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    patch,
    path = "/api/payment-methods/{id}",
    params(("id" = Uuid, Path, description = "Payment method ID")),
    request_body = UpdatePaymentMethodRequest,
    responses(
        (status = 200, description = "Updated payment method", body = ApiResponse<PaymentMethod>),
        (status = 403, description = "Super admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Payment Methods"
)]
pub async fn update_payment_method(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePaymentMethodRequest>,
) -> AppResult<Json<ApiResponse<PaymentMethod>>> {
    let resp =
        payment_method_service::update_payment_method(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/payment-methods/{id}",
    params(("id" = Uuid, Path, description = "Payment method ID")),
    responses(
        (status = 200, description = "Deleted payment method", body = ApiResponse<serde_json::Value>),
        (status = 403, description = "Super admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Payment Methods"
)]
pub async fn delete_payment_method(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = payment_method_service::delete_payment_method(&state, &user, id).await?;
    Ok(Json(resp))
}
