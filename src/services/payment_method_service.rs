use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use uuid::Uuid;

use crate::{
    audit,
    dto::catalog::{CreatePaymentMethodRequest, PaymentMethodList, UpdatePaymentMethodRequest},
    entity::payment_methods::{ActiveModel, Column, Entity as PaymentMethods},
    error::{AppError, AppResult, FieldErrors},
    middleware::auth::AuthUser,
    models::PaymentMethod,
    policy::{self, Action, Resource},
    response::{ApiResponse, Meta},
    routes::params::{ActiveFilterQuery, Paginated},
    services::{fetch_page, scoping},
    state::AppState,
};

pub async fn list_payment_methods(
    state: &AppState,
    actor: Option<&AuthUser>,
    query: ActiveFilterQuery,
) -> AppResult<ApiResponse<PaymentMethodList>> {
    let scope = policy::authorize(actor, Resource::PaymentMethod, Action::List)?;
    let mut condition = scoping::active_only(scope, Column::IsActive);
    if let Some(is_active) = query.is_active {
        condition = condition.add(Column::IsActive.eq(is_active));
    }
    let finder = PaymentMethods::find()
        .filter(condition)
        .order_by_asc(Column::Name);

    let (rows, meta) = fetch_page(finder, &query.pagination(), &state.orm).await?;
    let items = rows.into_iter().map(PaymentMethod::from).collect();
    Ok(ApiResponse::success("Payment methods", PaymentMethodList { items }, Some(meta)))
}

pub async fn get_payment_method(
    state: &AppState,
    actor: Option<&AuthUser>,
    id: Uuid,
) -> AppResult<ApiResponse<PaymentMethod>> {
    let scope = policy::authorize(actor, Resource::PaymentMethod, Action::Retrieve)?;
    let method = PaymentMethods::find_by_id(id)
        .filter(scoping::active_only(scope, Column::IsActive))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success("Payment method", PaymentMethod::from(method), None))
}

pub async fn create_payment_method(
    state: &AppState,
    user: &AuthUser,
    payload: CreatePaymentMethodRequest,
) -> AppResult<ApiResponse<PaymentMethod>> {
    policy::authorize(Some(user), Resource::PaymentMethod, Action::Create)?;
    let mut errors = FieldErrors::new();
    let name = payload.name.trim().to_string();
    if name.is_empty() {
        errors.add("name", "This field may not be blank.");
    }
    if payload.processing_fee.is_some_and(|fee| fee < Decimal::ZERO) {
        errors.add("processing_fee", "Ensure this value is greater than or equal to 0.");
    }
    errors.into_result()?;

    let method = ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name),
        method_type: Set(payload.method_type),
        is_active: Set(payload.is_active.unwrap_or(true)),
        supported_networks: Set(payload
            .supported_networks
            .unwrap_or_else(|| serde_json::json!([]))),
        processing_fee: Set(payload.processing_fee.unwrap_or(Decimal::ZERO)),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "payment_method_create",
        "payment_methods",
        serde_json::json!({ "payment_method_id": method.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Payment method created",
        PaymentMethod::from(method),
        Some(Meta::empty()),
    ))
}

pub async fn update_payment_method(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdatePaymentMethodRequest,
) -> AppResult<ApiResponse<PaymentMethod>> {
    policy::authorize(Some(user), Resource::PaymentMethod, Action::Update)?;
    let existing = PaymentMethods::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    if payload.processing_fee.is_some_and(|fee| fee < Decimal::ZERO) {
        return Err(AppError::validation(
            "processing_fee",
            "Ensure this value is greater than or equal to 0.",
        ));
    }

    let mut active: ActiveModel = existing.into();
    if let Some(name) = payload.name {
        active.name = Set(name.trim().to_string());
    }
    if let Some(method_type) = payload.method_type {
        active.method_type = Set(method_type);
    }
    if let Some(is_active) = payload.is_active {
        active.is_active = Set(is_active);
    }
    if let Some(supported_networks) = payload.supported_networks {
        active.supported_networks = Set(supported_networks);
    }
    if let Some(processing_fee) = payload.processing_fee {
        active.processing_fee = Set(processing_fee);
    }
    active.updated_at = Set(Utc::now().into());
    let method = active.update(&state.orm).await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "payment_method_update",
        "payment_methods",
        serde_json::json!({ "payment_method_id": method.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Updated",
        PaymentMethod::from(method),
        Some(Meta::empty()),
    ))
}

pub async fn delete_payment_method(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    policy::authorize(Some(user), Resource::PaymentMethod, Action::Delete)?;
    let result = PaymentMethods::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    audit::record(
        &state.pool,
        Some(user.user_id),
        "payment_method_delete",
        "payment_methods",
        serde_json::json!({ "payment_method_id": id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}
