//! Restaurant staff management. A restaurant admin manages the staff of
//! their own restaurant; super admins manage all staff.
//!
//! Unlike the other tenant-scoped resources, single-record access loads the
//! staff account without a scope filter and then compares restaurants, so a
//! foreign restaurant's staff member yields 403 rather than 404.

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use uuid::Uuid;

use crate::{
    audit,
    dto::users::{CreateStaffRequest, ProvisionedUser, UpdateStaffRequest, UserList},
    entity::users::{ActiveModel, Column, Entity as Users, Model as UserModel, UserRole},
    error::{AppError, AppResult, FieldErrors},
    middleware::auth::AuthUser,
    models::User,
    policy::{self, Action, Resource, Scope},
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    services::{
        fetch_page, scoping,
        user_service::{NewAccount, provision},
    },
    state::AppState,
};

pub async fn list_staff(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<UserList>> {
    let scope = policy::authorize(Some(user), Resource::Staff, Action::List)?;
    let finder = Users::find()
        .filter(scoping::users(scope).add(Column::Role.eq(UserRole::Staff)))
        .order_by_asc(Column::Name);

    let (rows, meta) = fetch_page(finder, &pagination, &state.orm).await?;
    let items = rows.into_iter().map(User::from).collect();
    Ok(ApiResponse::success("Staff", UserList { items }, Some(meta)))
}

async fn find_staff(
    state: &AppState,
    user: &AuthUser,
    action: Action,
    id: Uuid,
) -> AppResult<UserModel> {
    let scope = policy::authorize(Some(user), Resource::Staff, action)?;
    let staff = Users::find_by_id(id)
        .filter(Column::Role.eq(UserRole::Staff))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    match scope {
        Scope::All => Ok(staff),
        Scope::Tenant { restaurant_id, .. } if staff.restaurant_id == Some(restaurant_id) => {
            Ok(staff)
        }
        _ => Err(AppError::Forbidden),
    }
}

pub async fn get_staff(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<User>> {
    let staff = find_staff(state, user, Action::Retrieve, id).await?;
    Ok(ApiResponse::success("Staff member", User::from(staff), None))
}

pub async fn create_staff(
    state: &AppState,
    user: &AuthUser,
    payload: CreateStaffRequest,
) -> AppResult<ApiResponse<ProvisionedUser>> {
    let scope = policy::authorize(Some(user), Resource::Staff, Action::Create)?;
    let restaurant_id = match scope {
        Scope::Tenant { restaurant_id, .. } => restaurant_id,
        Scope::All => payload.restaurant_id.ok_or_else(|| {
            AppError::validation("restaurant_id", "Super admins must specify a restaurant.")
        })?,
        _ => return Err(AppError::Forbidden),
    };

    let provisioned = provision(
        state,
        user,
        NewAccount {
            email: payload.email,
            name: payload.name,
            role: UserRole::Staff,
            phone: payload.phone,
            address: payload.address,
            restaurant_id: Some(restaurant_id),
        },
    )
    .await?;
    let message = provisioned.message.clone();
    Ok(ApiResponse::success(message, provisioned, Some(Meta::empty())))
}

pub async fn update_staff(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateStaffRequest,
) -> AppResult<ApiResponse<User>> {
    let existing = find_staff(state, user, Action::Update, id).await?;

    let mut errors = FieldErrors::new();
    if payload.name.as_ref().is_some_and(|n| n.trim().is_empty()) {
        errors.add("name", "This field may not be blank.");
    }
    errors.into_result()?;

    let mut active: ActiveModel = existing.into();
    if let Some(name) = payload.name {
        active.name = Set(name.trim().to_string());
    }
    if let Some(phone) = payload.phone {
        active.phone = Set(Some(phone));
    }
    if let Some(address) = payload.address {
        active.address = Set(Some(address));
    }
    if let Some(is_active) = payload.is_active {
        active.is_active = Set(is_active);
    }
    active.updated_at = Set(Utc::now().into());
    let updated = active.update(&state.orm).await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "staff_update",
        "users",
        serde_json::json!({ "user_id": updated.id, "restaurant_id": updated.restaurant_id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Updated",
        User::from(updated),
        Some(Meta::empty()),
    ))
}

pub async fn delete_staff(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let existing = find_staff(state, user, Action::Delete, id).await?;
    Users::delete_by_id(existing.id).exec(&state.orm).await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "staff_delete",
        "users",
        serde_json::json!({ "user_id": id, "restaurant_id": existing.restaurant_id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}
