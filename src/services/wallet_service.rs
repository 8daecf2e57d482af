use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::LockType;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit,
    domain::ledger,
    dto::wallet::{CreateWalletTransactionRequest, WalletBalance, WalletTransactionList},
    entity::{
        Orders, Users, orders, users,
        wallet_transactions::{
            ActiveModel, Column, Entity as WalletTransactions, WalletTransactionType,
        },
    },
    error::{AppError, AppResult, FieldErrors},
    middleware::auth::AuthUser,
    models::WalletTransaction,
    policy::{self, Action, Resource, Scope},
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    services::fetch_page,
    state::AppState,
};

const RECENT_ENTRIES: u64 = 10;

fn owner(user: &AuthUser, action: Action) -> AppResult<Uuid> {
    match policy::authorize(Some(user), Resource::WalletTransaction, action)? {
        Scope::Owner(user_id) => Ok(user_id),
        _ => Err(AppError::Forbidden),
    }
}

async fn list_filtered(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
    transaction_type: Option<WalletTransactionType>,
) -> AppResult<ApiResponse<WalletTransactionList>> {
    let owner = owner(user, Action::List)?;
    let mut finder = WalletTransactions::find().filter(Column::UserId.eq(owner));
    if let Some(transaction_type) = transaction_type {
        finder = finder.filter(Column::TransactionType.eq(transaction_type));
    }
    let finder = finder.order_by_desc(Column::CreatedAt);

    let (rows, meta) = fetch_page(finder, &pagination, &state.orm).await?;
    let items = rows.into_iter().map(WalletTransaction::from).collect();
    Ok(ApiResponse::success(
        "Wallet transactions",
        WalletTransactionList { items },
        Some(meta),
    ))
}

pub async fn list_transactions(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<WalletTransactionList>> {
    list_filtered(state, user, pagination, None).await
}

pub async fn list_earned(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<WalletTransactionList>> {
    list_filtered(state, user, pagination, Some(WalletTransactionType::Earned)).await
}

pub async fn list_redeemed(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<WalletTransactionList>> {
    list_filtered(state, user, pagination, Some(WalletTransactionType::Redeemed)).await
}

pub async fn get_transaction(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<WalletTransaction>> {
    let owner = owner(user, Action::Retrieve)?;
    let entry = WalletTransactions::find_by_id(id)
        .filter(Column::UserId.eq(owner))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success(
        "Wallet transaction",
        WalletTransaction::from(entry),
        None,
    ))
}

pub async fn balance(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<WalletBalance>> {
    let owner = owner(user, Action::Retrieve)?;
    let account = Users::find_by_id(owner)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let entries = WalletTransactions::find().filter(Column::UserId.eq(owner));
    let total_transactions = entries.clone().count(&state.orm).await?;
    let recent_transactions = entries
        .order_by_desc(Column::CreatedAt)
        .limit(RECENT_ENTRIES)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(WalletTransaction::from)
        .collect();

    Ok(ApiResponse::success(
        "Wallet balance",
        WalletBalance {
            wallet_balance: account.wallet_balance,
            loyalty_points: account.loyalty_points,
            total_transactions,
            recent_transactions,
        },
        None,
    ))
}

/// Append a ledger entry for the caller and apply it to their balance.
///
/// The user row is locked for the duration so concurrent entries apply in
/// sequence. Balance and points never go below zero.
pub async fn create_transaction(
    state: &AppState,
    user: &AuthUser,
    payload: CreateWalletTransactionRequest,
) -> AppResult<ApiResponse<WalletTransaction>> {
    let owner = owner(user, Action::Create)?;

    let mut errors = FieldErrors::new();
    let description = payload.description.trim().to_string();
    if description.is_empty() {
        errors.add("description", "This field may not be blank.");
    }
    if let Some(order_id) = payload.order_id {
        let own_order = Orders::find_by_id(order_id)
            .filter(orders::Column::UserId.eq(owner))
            .one(&state.orm)
            .await?;
        if own_order.is_none() {
            errors.add("order_id", "Order not found.");
        }
    }
    errors.into_result()?;

    let txn = state.orm.begin().await?;
    let account = Users::find_by_id(owner)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    let entry = ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(owner),
        transaction_type: Set(payload.transaction_type),
        amount: Set(payload.amount),
        points: Set(payload.points),
        description: Set(description),
        order_id: Set(payload.order_id),
        created_at: NotSet,
    }
    .insert(&txn)
    .await?;

    let (wallet_balance, loyalty_points) = ledger::apply(
        account.wallet_balance,
        account.loyalty_points,
        entry.amount,
        entry.points,
    );
    let mut active: users::ActiveModel = account.into();
    active.wallet_balance = Set(wallet_balance);
    active.loyalty_points = Set(loyalty_points);
    active.updated_at = Set(chrono::Utc::now().into());
    active.update(&txn).await?;
    txn.commit().await?;

    tracing::debug!(
        user_id = %owner,
        %wallet_balance,
        loyalty_points,
        "wallet entry applied"
    );
    audit::record(
        &state.pool,
        Some(user.user_id),
        "wallet_transaction_create",
        "wallet_transactions",
        serde_json::json!({
            "transaction_id": entry.id,
            "amount": entry.amount,
            "points": entry.points,
        }),
    )
    .await;

    Ok(ApiResponse::success(
        "Wallet transaction created",
        WalletTransaction::from(entry),
        Some(Meta::empty()),
    ))
}

/// Ledger entries are immutable; reversal is a compensating entry.
pub fn reject_mutation(user: &AuthUser, action: Action) -> AppError {
    match policy::authorize(Some(user), Resource::WalletTransaction, action) {
        Err(err) => err,
        Ok(_) => AppError::Forbidden,
    }
}
