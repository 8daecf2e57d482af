use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::Expr;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::{
    audit,
    db::is_unique_violation,
    dto::users::{
        CreateUserRequest, ProvisionedUser, UpdateProfileRequest, UpdateUserRequest, UserList,
    },
    entity::{
        Restaurants,
        users::{ActiveModel, Column, Entity as Users, Model as UserModel, UserRole},
    },
    error::{AppError, AppResult, FieldErrors},
    mailer::WelcomeEmail,
    middleware::auth::AuthUser,
    models::User,
    policy::{self, Action, RecordOwner, Resource},
    response::{ApiResponse, Meta},
    routes::params::{Paginated, UserListQuery},
    services::{
        auth_service::{email_taken, generate_temporary_password, hash_password, normalize_email},
        fetch_page, scoping,
    },
    state::AppState,
};

/// Account an administrator is about to provision.
pub(crate) struct NewAccount {
    pub email: String,
    pub name: String,
    pub role: UserRole,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub restaurant_id: Option<Uuid>,
}

/// Create an account with a generated temporary password and mail the
/// credentials. A mail failure never undoes the account.
pub(crate) async fn provision(
    state: &AppState,
    actor: &AuthUser,
    account: NewAccount,
) -> AppResult<ProvisionedUser> {
    let email = normalize_email(&account.email);
    let name = account.name.trim().to_string();

    let mut errors = FieldErrors::new();
    if email.is_empty() || !email.contains('@') {
        errors.add("email", "Enter a valid email address.");
    }
    if name.is_empty() {
        errors.add("name", "This field may not be blank.");
    }
    let restaurant = match account.restaurant_id {
        Some(id) => {
            let found = Restaurants::find_by_id(id).one(&state.orm).await?;
            if found.is_none() {
                errors.add("restaurant_id", "Restaurant not found.");
            }
            found
        }
        None => {
            if account.role.is_restaurant_scoped() {
                errors.add("restaurant_id", "This role requires a restaurant.");
            }
            None
        }
    };
    if errors.is_empty() && email_taken(state, &email).await? {
        errors.add("email", "A user with this email already exists.");
    }
    errors.into_result()?;

    let temporary_password = generate_temporary_password();
    let user = ActiveModel {
        id: Set(Uuid::new_v4()),
        email: Set(email),
        name: Set(name),
        password_hash: Set(hash_password(&temporary_password)?),
        role: Set(account.role),
        phone: Set(account.phone),
        address: Set(account.address),
        restaurant_id: Set(account.restaurant_id),
        wallet_balance: Set(Decimal::ZERO),
        loyalty_points: Set(0),
        must_change_password: Set(true),
        is_active: Set(true),
        is_superuser: Set(false),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await
    .map_err(|err| {
        if is_unique_violation(&err) {
            AppError::validation("email", "A user with this email already exists.")
        } else {
            AppError::OrmError(err)
        }
    })?;

    let welcome = WelcomeEmail {
        to: user.email.clone(),
        name: user.name.clone(),
        role: user.role,
        temporary_password,
        login_url: format!("{}/login", state.config.frontend_url.trim_end_matches('/')),
        restaurant_name: restaurant.map(|r| r.name),
    };
    let email_sent = match state.mailer.send_welcome(&welcome).await {
        Ok(()) => true,
        Err(err) => {
            tracing::warn!(user_id = %user.id, error = %err, "welcome email failed");
            false
        }
    };

    audit::record(
        &state.pool,
        Some(actor.user_id),
        "user_provision",
        "users",
        serde_json::json!({
            "user_id": user.id,
            "role": user.role.as_str(),
            "restaurant_id": user.restaurant_id,
            "email_sent": email_sent,
        }),
    )
    .await;

    let message = if email_sent {
        "User created successfully. Welcome email sent."
    } else {
        "User created successfully, but the welcome email could not be sent."
    };
    Ok(ProvisionedUser {
        user: User::from(user),
        email_sent,
        message: message.to_string(),
    })
}

fn check_profile(name: Option<&String>, errors: &mut FieldErrors) {
    if name.is_some_and(|n| n.trim().is_empty()) {
        errors.add("name", "This field may not be blank.");
    }
}

pub async fn get_me(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<User>> {
    let me = Users::find_by_id(user.user_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success("Profile", User::from(me), None))
}

pub async fn update_me(
    state: &AppState,
    user: &AuthUser,
    payload: UpdateProfileRequest,
) -> AppResult<ApiResponse<User>> {
    let mut errors = FieldErrors::new();
    check_profile(payload.name.as_ref(), &mut errors);
    errors.into_result()?;

    let existing = Users::find_by_id(user.user_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
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
    active.updated_at = Set(Utc::now().into());
    let updated = active.update(&state.orm).await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "profile_update",
        "users",
        serde_json::json!({ "user_id": user.user_id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Profile updated",
        User::from(updated),
        Some(Meta::empty()),
    ))
}

pub async fn list_users(
    state: &AppState,
    user: &AuthUser,
    query: UserListQuery,
) -> AppResult<ApiResponse<UserList>> {
    let scope = policy::authorize(Some(user), Resource::User, Action::List)?;
    let mut condition = scoping::users(scope);
    if let Some(role) = query.role {
        condition = condition.add(Column::Role.eq(role));
    }
    if let Some(is_active) = query.is_active {
        condition = condition.add(Column::IsActive.eq(is_active));
    }
    if let Some(search) = query.q.as_ref().filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", search);
        condition = condition.add(
            Condition::any()
                .add(Expr::col(Column::Email).ilike(pattern.clone()))
                .add(Expr::col(Column::Name).ilike(pattern)),
        );
    }

    let finder = Users::find()
        .filter(condition)
        .order_by_desc(Column::CreatedAt);
    let (rows, meta) = fetch_page(finder, &query.pagination(), &state.orm).await?;
    let items = rows.into_iter().map(User::from).collect();
    Ok(ApiResponse::success("Users", UserList { items }, Some(meta)))
}

async fn find_visible(
    state: &AppState,
    user: &AuthUser,
    action: Action,
    id: Uuid,
) -> AppResult<UserModel> {
    let scope = policy::authorize(Some(user), Resource::User, action)?;
    Users::find_by_id(id)
        .filter(scoping::users(scope))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)
}

pub async fn get_user(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<User>> {
    let found = find_visible(state, user, Action::Retrieve, id).await?;
    Ok(ApiResponse::success("User", User::from(found), None))
}

pub async fn create_user(
    state: &AppState,
    user: &AuthUser,
    payload: CreateUserRequest,
) -> AppResult<ApiResponse<ProvisionedUser>> {
    policy::authorize(Some(user), Resource::User, Action::Create)?;
    let provisioned = provision(
        state,
        user,
        NewAccount {
            email: payload.email,
            name: payload.name,
            role: payload.role,
            phone: payload.phone,
            address: payload.address,
            restaurant_id: payload.restaurant_id,
        },
    )
    .await?;
    let message = provisioned.message.clone();
    Ok(ApiResponse::success(message, provisioned, Some(Meta::empty())))
}

pub async fn update_user(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateUserRequest,
) -> AppResult<ApiResponse<User>> {
    let existing = find_visible(state, user, Action::Update, id).await?;
    policy::ensure_can_modify(
        user,
        RecordOwner::Account {
            user_id: existing.id,
            restaurant_id: existing.restaurant_id,
        },
    )?;

    let privileged =
        payload.role.is_some() || payload.restaurant_id.is_some() || payload.is_active.is_some();
    if privileged && !user.is_super_admin() {
        return Err(AppError::Forbidden);
    }

    let mut errors = FieldErrors::new();
    check_profile(payload.name.as_ref(), &mut errors);
    let role = payload.role.unwrap_or(existing.role);
    let restaurant_id = payload.restaurant_id.or(existing.restaurant_id);
    if role.is_restaurant_scoped() && restaurant_id.is_none() {
        errors.add("restaurant_id", "This role requires a restaurant.");
    }
    if let Some(restaurant_id) = payload.restaurant_id {
        if Restaurants::find_by_id(restaurant_id).one(&state.orm).await?.is_none() {
            errors.add("restaurant_id", "Restaurant not found.");
        }
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
    if let Some(role) = payload.role {
        active.role = Set(role);
    }
    if let Some(restaurant_id) = payload.restaurant_id {
        active.restaurant_id = Set(Some(restaurant_id));
    }
    if let Some(is_active) = payload.is_active {
        active.is_active = Set(is_active);
    }
    active.updated_at = Set(Utc::now().into());
    let updated = active.update(&state.orm).await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "user_update",
        "users",
        serde_json::json!({ "user_id": updated.id, "role": updated.role.as_str() }),
    )
    .await;

    Ok(ApiResponse::success(
        "Updated",
        User::from(updated),
        Some(Meta::empty()),
    ))
}

pub async fn delete_user(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    policy::authorize(Some(user), Resource::User, Action::Delete)?;
    if id == user.user_id {
        return Err(AppError::BadRequest("You cannot delete your own account".into()));
    }
    let result = Users::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    audit::record(
        &state.pool,
        Some(user.user_id),
        "user_delete",
        "users",
        serde_json::json!({ "user_id": id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}
