use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use uuid::Uuid;

use crate::{
    audit,
    dto::catalog::{CreateDeliveryZoneRequest, DeliveryZoneList, UpdateDeliveryZoneRequest},
    entity::delivery_zones::{ActiveModel, Column, Entity as DeliveryZones},
    error::{AppError, AppResult, FieldErrors},
    middleware::auth::AuthUser,
    models::DeliveryZone,
    policy::{self, Action, Resource},
    response::{ApiResponse, Meta},
    routes::params::{ActiveFilterQuery, Paginated},
    services::{fetch_page, scoping},
    state::AppState,
};

pub async fn list_zones(
    state: &AppState,
    actor: Option<&AuthUser>,
    query: ActiveFilterQuery,
) -> AppResult<ApiResponse<DeliveryZoneList>> {
    let scope = policy::authorize(actor, Resource::DeliveryZone, Action::List)?;
    let mut condition = scoping::active_only(scope, Column::IsActive);
    if let Some(is_active) = query.is_active {
        condition = condition.add(Column::IsActive.eq(is_active));
    }
    let finder = DeliveryZones::find()
        .filter(condition)
        .order_by_asc(Column::Name);

    let (rows, meta) = fetch_page(finder, &query.pagination(), &state.orm).await?;
    let items = rows.into_iter().map(DeliveryZone::from).collect();
    Ok(ApiResponse::success("Delivery zones", DeliveryZoneList { items }, Some(meta)))
}

pub async fn get_zone(
    state: &AppState,
    actor: Option<&AuthUser>,
    id: Uuid,
) -> AppResult<ApiResponse<DeliveryZone>> {
    let scope = policy::authorize(actor, Resource::DeliveryZone, Action::Retrieve)?;
    let zone = DeliveryZones::find_by_id(id)
        .filter(scoping::active_only(scope, Column::IsActive))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success("Delivery zone", DeliveryZone::from(zone), None))
}

pub async fn create_zone(
    state: &AppState,
    user: &AuthUser,
    payload: CreateDeliveryZoneRequest,
) -> AppResult<ApiResponse<DeliveryZone>> {
    policy::authorize(Some(user), Resource::DeliveryZone, Action::Create)?;
    let mut errors = FieldErrors::new();
    let name = payload.name.trim().to_string();
    if name.is_empty() {
        errors.add("name", "This field may not be blank.");
    }
    if payload.delivery_fee < Decimal::ZERO {
        errors.add("delivery_fee", "Ensure this value is greater than or equal to 0.");
    }
    errors.into_result()?;

    let zone = ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name),
        description: Set(payload.description),
        delivery_fee: Set(payload.delivery_fee),
        estimated_time: Set(payload.estimated_time),
        is_active: Set(payload.is_active.unwrap_or(true)),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "delivery_zone_create",
        "delivery_zones",
        serde_json::json!({ "delivery_zone_id": zone.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Delivery zone created",
        DeliveryZone::from(zone),
        Some(Meta::empty()),
    ))
}

pub async fn update_zone(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateDeliveryZoneRequest,
) -> AppResult<ApiResponse<DeliveryZone>> {
    policy::authorize(Some(user), Resource::DeliveryZone, Action::Update)?;
    let existing = DeliveryZones::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    if payload.delivery_fee.is_some_and(|fee| fee < Decimal::ZERO) {
        return Err(AppError::validation(
            "delivery_fee",
            "Ensure this value is greater than or equal to 0.",
        ));
    }

    let mut active: ActiveModel = existing.into();
    if let Some(name) = payload.name {
        active.name = Set(name.trim().to_string());
    }
    if let Some(description) = payload.description {
        active.description = Set(Some(description));
    }
    if let Some(delivery_fee) = payload.delivery_fee {
        active.delivery_fee = Set(delivery_fee);
    }
    if let Some(estimated_time) = payload.estimated_time {
        active.estimated_time = Set(Some(estimated_time));
    }
    if let Some(is_active) = payload.is_active {
        active.is_active = Set(is_active);
    }
    active.updated_at = Set(Utc::now().into());
    let zone = active.update(&state.orm).await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "delivery_zone_update",
        "delivery_zones",
        serde_json::json!({ "delivery_zone_id": zone.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Updated",
        DeliveryZone::from(zone),
        Some(Meta::empty()),
    ))
}

pub async fn delete_zone(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    policy::authorize(Some(user), Resource::DeliveryZone, Action::Delete)?;
    let result = DeliveryZones::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    audit::record(
        &state.pool,
        Some(user.user_id),
        "delivery_zone_delete",
        "delivery_zones",
        serde_json::json!({ "delivery_zone_id": id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}
