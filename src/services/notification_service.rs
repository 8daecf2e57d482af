use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::{
    audit,
    domain::order_flow,
    dto::notifications::{CreateNotificationRequest, MarkAllReadResponse, NotificationList},
    entity::{
        Discounts, Users,
        notifications::{
            ActiveModel, Column, Entity as Notifications, Model as NotificationModel,
            NotificationType,
        },
        orders,
        users::{self, UserRole},
    },
    error::{AppError, AppResult, FieldErrors},
    middleware::auth::AuthUser,
    models::Notification,
    policy::{self, Action, Resource, Scope},
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    services::fetch_page,
    state::AppState,
};

struct NewNotification {
    user_id: Uuid,
    title: String,
    message: String,
    notification_type: NotificationType,
    order_id: Option<Uuid>,
    discount_id: Option<Uuid>,
}

async fn insert<C: ConnectionTrait>(conn: &C, new: NewNotification) -> AppResult<()> {
    ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(new.user_id),
        title: Set(new.title),
        message: Set(new.message),
        notification_type: Set(new.notification_type),
        is_read: Set(false),
        order_id: Set(new.order_id),
        discount_id: Set(new.discount_id),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(conn)
    .await?;
    Ok(())
}

/// Tell each restaurant involved in a new order about it: the first
/// restaurant admin by signup date and every staff member.
/// Returns the number of notifications created.
pub(crate) async fn fan_out_new_order<C: ConnectionTrait>(
    conn: &C,
    order: &orders::Model,
    customer_name: &str,
    restaurant_ids: &[Uuid],
) -> AppResult<usize> {
    let title = order_flow::restaurant_title(order.id);
    let mut created = 0;

    for restaurant_id in restaurant_ids {
        let admin = Users::find()
            .filter(users::Column::RestaurantId.eq(*restaurant_id))
            .filter(users::Column::Role.eq(UserRole::RestaurantAdmin))
            .order_by_asc(users::Column::CreatedAt)
            .order_by_asc(users::Column::Id)
            .one(conn)
            .await?;
        if let Some(admin) = admin {
            insert(
                conn,
                NewNotification {
                    user_id: admin.id,
                    title: title.clone(),
                    message: order_flow::restaurant_admin_message(customer_name, order.total),
                    notification_type: NotificationType::OrderUpdate,
                    order_id: Some(order.id),
                    discount_id: None,
                },
            )
            .await?;
            created += 1;
        }

        let staff = Users::find()
            .filter(users::Column::RestaurantId.eq(*restaurant_id))
            .filter(users::Column::Role.eq(UserRole::Staff))
            .all(conn)
            .await?;
        for member in staff {
            insert(
                conn,
                NewNotification {
                    user_id: member.id,
                    title: title.clone(),
                    message: order_flow::staff_message(customer_name, order.total),
                    notification_type: NotificationType::OrderUpdate,
                    order_id: Some(order.id),
                    discount_id: None,
                },
            )
            .await?;
            created += 1;
        }
    }

    tracing::debug!(order_id = %order.id, created, "order fan-out");
    Ok(created)
}

/// One customer notification describing the order's current status.
pub(crate) async fn notify_customer<C: ConnectionTrait>(
    conn: &C,
    order: &orders::Model,
) -> AppResult<()> {
    insert(
        conn,
        NewNotification {
            user_id: order.user_id,
            title: order_flow::customer_title(order.id),
            message: order_flow::customer_message(order.status),
            notification_type: NotificationType::OrderUpdate,
            order_id: Some(order.id),
            discount_id: None,
        },
    )
    .await
}

fn owner_of(scope: Scope) -> AppResult<Uuid> {
    match scope {
        Scope::Owner(user_id) => Ok(user_id),
        _ => Err(AppError::Forbidden),
    }
}

pub async fn list_notifications(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
    unread_only: bool,
) -> AppResult<ApiResponse<NotificationList>> {
    let owner = owner_of(policy::authorize(
        Some(user),
        Resource::Notification,
        Action::List,
    )?)?;
    let mut finder = Notifications::find().filter(Column::UserId.eq(owner));
    if unread_only {
        finder = finder.filter(Column::IsRead.eq(false));
    }
    let finder = finder.order_by_desc(Column::CreatedAt);

    let (rows, meta) = fetch_page(finder, &pagination, &state.orm).await?;
    let items = rows.into_iter().map(Notification::from).collect();
    Ok(ApiResponse::success("Notifications", NotificationList { items }, Some(meta)))
}

async fn find_own(
    state: &AppState,
    user: &AuthUser,
    action: Action,
    id: Uuid,
) -> AppResult<NotificationModel> {
    let owner = owner_of(policy::authorize(Some(user), Resource::Notification, action)?)?;
    Notifications::find_by_id(id)
        .filter(Column::UserId.eq(owner))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)
}

pub async fn get_notification(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Notification>> {
    let notification = find_own(state, user, Action::Retrieve, id).await?;
    Ok(ApiResponse::success("Notification", Notification::from(notification), None))
}

pub async fn mark_read(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Notification>> {
    let existing = find_own(state, user, Action::Update, id).await?;
    let mut active: ActiveModel = existing.into();
    active.is_read = Set(true);
    active.updated_at = Set(Utc::now().into());
    let notification = active.update(&state.orm).await?;

    Ok(ApiResponse::success(
        "Notification marked as read",
        Notification::from(notification),
        Some(Meta::empty()),
    ))
}

pub async fn mark_all_read(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<MarkAllReadResponse>> {
    let owner = owner_of(policy::authorize(
        Some(user),
        Resource::Notification,
        Action::Update,
    )?)?;
    let result = Notifications::update_many()
        .col_expr(Column::IsRead, Expr::value(true))
        .col_expr(Column::UpdatedAt, Expr::current_timestamp().into())
        .filter(Column::UserId.eq(owner))
        .filter(Column::IsRead.eq(false))
        .exec(&state.orm)
        .await?;

    Ok(ApiResponse::success(
        "All notifications marked as read",
        MarkAllReadResponse {
            updated: result.rows_affected,
        },
        Some(Meta::empty()),
    ))
}

pub async fn delete_notification(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let existing = find_own(state, user, Action::Delete, id).await?;
    Notifications::delete_by_id(existing.id)
        .exec(&state.orm)
        .await?;

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

/// Administrative promotion or system message to a single user.
pub async fn create_notification(
    state: &AppState,
    user: &AuthUser,
    payload: CreateNotificationRequest,
) -> AppResult<ApiResponse<Notification>> {
    policy::authorize(Some(user), Resource::Notification, Action::Create)?;

    let mut errors = FieldErrors::new();
    if !matches!(
        payload.notification_type,
        NotificationType::Promotion | NotificationType::System
    ) {
        errors.add("type", "Only promotion and system notifications can be sent manually.");
    }
    if payload.title.trim().is_empty() {
        errors.add("title", "This field may not be blank.");
    }
    if payload.message.trim().is_empty() {
        errors.add("message", "This field may not be blank.");
    }
    if Users::find_by_id(payload.user_id).one(&state.orm).await?.is_none() {
        errors.add("user_id", "User not found.");
    }
    if let Some(discount_id) = payload.discount_id {
        if Discounts::find_by_id(discount_id).one(&state.orm).await?.is_none() {
            errors.add("discount_id", "Discount not found.");
        }
    }
    errors.into_result()?;

    let notification = ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(payload.user_id),
        title: Set(payload.title.trim().to_string()),
        message: Set(payload.message),
        notification_type: Set(payload.notification_type),
        is_read: Set(false),
        order_id: Set(None),
        discount_id: Set(payload.discount_id),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "notification_create",
        "notifications",
        serde_json::json!({ "notification_id": notification.id, "user_id": notification.user_id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Notification created",
        Notification::from(notification),
        Some(Meta::empty()),
    ))
}
