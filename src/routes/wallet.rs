use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::wallet::{CreateWalletTransactionRequest, WalletBalance, WalletTransactionList},
    error::AppResult,
    middleware::auth::AuthUser,
    models::WalletTransaction,
    policy::Action,
    response::ApiResponse,
    routes::params::Pagination,
    services::wallet_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_transactions).post(create_transaction))
        .route("/balance", get(balance))
        .route("/earned", get(earned))
        .route("/redeemed", get(redeemed))
        .route(
            "/{id}",
            get(get_transaction)
                .put(update_transaction)
                .patch(update_transaction)
                .delete(delete_transaction),
        )
}

#[utoipa::path(
    get,
    path = "/api/wallet-transactions",
    params(Pagination),
    responses(
        (status = 200, description = "Own ledger entries", body = ApiResponse<WalletTransactionList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Wallet"
)]
pub async fn list_transactions(
    State(state): State<AppState>,
    user: AuthUser,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<WalletTransactionList>>> {
    let resp = wallet_service::list_transactions(&state, &user, pagination).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/wallet-transactions",
    request_body = CreateWalletTransactionRequest,
    responses(
        (status = 201, description = "Entry recorded and applied", body = ApiResponse<WalletTransaction>),
        (status = 400, description = "Validation failed")
    ),
    security(("bearer_auth" = [])),
    tag = "Wallet"
)]
pub async fn create_transaction(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateWalletTransactionRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<WalletTransaction>>)> {
    let resp = wallet_service::create_transaction(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    get,
    path = "/api/wallet-transactions/balance",
    responses(
        (status = 200, description = "Balance, points and recent entries", body = ApiResponse<WalletBalance>)
    ),
    security(("bearer_auth" = [])),
    tag = "Wallet"
)]
pub async fn balance(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<WalletBalance>>> {
    let resp = wallet_service::balance(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/wallet-transactions/earned",
    params(Pagination),
    responses(
        (status = 200, description = "Earned entries", body = ApiResponse<WalletTransactionList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Wallet"
)]
pub async fn earned(
    State(state): State<AppState>,
    user: AuthUser,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<WalletTransactionList>>> {
    let resp = wallet_service::list_earned(&state, &user, pagination).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/wallet-transactions/redeemed",
    params(Pagination),
    responses(
        (status = 200, description = "Redeemed entries", body = ApiResponse<WalletTransactionList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Wallet"
)]
pub async fn redeemed(
    State(state): State<AppState>,
    user: AuthUser,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<WalletTransactionList>>> {
    let resp = wallet_service::list_redeemed(&state, &user, pagination).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/wallet-transactions/{id}",
    params(("id" = Uuid, Path, description = "Wallet transaction ID")),
    responses(
        (status = 200, description = "Ledger entry", body = ApiResponse<WalletTransaction>),
        (status = 404, description = "Entry not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Wallet"
)]
pub async fn get_transaction(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<WalletTransaction>>> {
    let resp = wallet_service::get_transaction(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/wallet-transactions/{id}",
    params(("id" = Uuid, Path, description = "Wallet transaction ID")),
    responses(
        (status = 403, description = "Ledger entries cannot be modified")
    ),
    security(("bearer_auth" = [])),
    tag = "Wallet"
)]
pub async fn update_transaction(
    user: AuthUser,
    Path(_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    Err(wallet_service::reject_mutation(&user, Action::Update))
}

#[utoipa::path(
    delete,
    path = "/api/wallet-transactions/{id}",
    params(("id" = Uuid, Path, description = "Wallet transaction ID")),
    responses(
        (status = 403, description = "Ledger entries cannot be deleted")
    ),
    security(("bearer_auth" = [])),
    tag = "Wallet"
)]
pub async fn delete_transaction(
    user: AuthUser,
    Path(_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    Err(wallet_service::reject_mutation(&user, Action::Delete))
}
