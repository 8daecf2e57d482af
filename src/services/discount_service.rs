use std::collections::HashMap;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::discounts::{
        CalculateDiscountQuery, CreateDiscountRequest, DiscountCalculation, DiscountList,
        UpdateDiscountRequest,
    },
    entity::{
        DiscountProducts, Products, discount_products,
        discounts::{ActiveModel, Column, DiscountType, Entity as Discounts, Model as DiscountModel},
        products,
    },
    error::{AppError, AppResult, FieldErrors},
    middleware::auth::AuthUser,
    models::Discount,
    policy::{self, Action, RecordOwner, Resource},
    response::{ApiResponse, Meta},
    routes::params::{DiscountQuery, Paginated, Pagination},
    services::{fetch_page, scoping},
    state::AppState,
};

async fn product_ids_for<C: ConnectionTrait>(
    conn: &C,
    discount_ids: &[Uuid],
) -> AppResult<HashMap<Uuid, Vec<Uuid>>> {
    let mut map: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
    if discount_ids.is_empty() {
        return Ok(map);
    }
    let links = DiscountProducts::find()
        .filter(discount_products::Column::DiscountId.is_in(discount_ids.to_vec()))
        .all(conn)
        .await?;
    for link in links {
        map.entry(link.discount_id).or_default().push(link.product_id);
    }
    Ok(map)
}

async fn to_views<C: ConnectionTrait>(
    conn: &C,
    rows: Vec<DiscountModel>,
) -> AppResult<Vec<Discount>> {
    let ids: Vec<Uuid> = rows.iter().map(|d| d.id).collect();
    let mut links = product_ids_for(conn, &ids).await?;
    Ok(rows
        .into_iter()
        .map(|d| {
            let product_ids = links.remove(&d.id).unwrap_or_default();
            Discount::from_model(d, product_ids)
        })
        .collect())
}

/// Active, inside its window and not exhausted at `now`.
fn currently_valid() -> Condition {
    let now = Utc::now();
    Condition::all()
        .add(Column::IsActive.eq(true))
        .add(Column::StartDate.lte(now))
        .add(Column::EndDate.gte(now))
        .add(
            Condition::any()
                .add(Column::UsageLimit.is_null())
                .add(Expr::col(Column::UsedCount).lt(Expr::col(Column::UsageLimit))),
        )
}

pub async fn list_discounts(
    state: &AppState,
    actor: Option<&AuthUser>,
    query: DiscountQuery,
) -> AppResult<ApiResponse<DiscountList>> {
    let scope = policy::authorize(actor, Resource::Discount, Action::List)?;
    let mut condition = scoping::discounts(scope);
    if let Some(discount_type) = query.discount_type {
        condition = condition.add(Column::DiscountType.eq(discount_type));
    }
    if let Some(restaurant_id) = query.restaurant_id {
        condition = condition.add(Column::RestaurantId.eq(restaurant_id));
    }
    if let Some(is_active) = query.is_active {
        condition = condition.add(Column::IsActive.eq(is_active));
    }

    let finder = Discounts::find()
        .filter(condition)
        .order_by_desc(Column::CreatedAt);
    let (rows, meta) = fetch_page(finder, &query.pagination(), &state.orm).await?;
    let items = to_views(&state.orm, rows).await?;
    Ok(ApiResponse::success("Discounts", DiscountList { items }, Some(meta)))
}

pub async fn list_active(
    state: &AppState,
    actor: Option<&AuthUser>,
    pagination: Pagination,
) -> AppResult<ApiResponse<DiscountList>> {
    let scope = policy::authorize(actor, Resource::Discount, Action::List)?;
    let finder = Discounts::find()
        .filter(scoping::discounts(scope).add(currently_valid()))
        .order_by_asc(Column::EndDate);
    let (rows, meta) = fetch_page(finder, &pagination, &state.orm).await?;
    let items = to_views(&state.orm, rows).await?;
    Ok(ApiResponse::success("Active discounts", DiscountList { items }, Some(meta)))
}

pub async fn list_global(
    state: &AppState,
    actor: Option<&AuthUser>,
    pagination: Pagination,
) -> AppResult<ApiResponse<DiscountList>> {
    let scope = policy::authorize(actor, Resource::Discount, Action::List)?;
    let finder = Discounts::find()
        .filter(scoping::discounts(scope).add(Column::RestaurantId.is_null()))
        .order_by_desc(Column::CreatedAt);
    let (rows, meta) = fetch_page(finder, &pagination, &state.orm).await?;
    let items = to_views(&state.orm, rows).await?;
    Ok(ApiResponse::success("Global discounts", DiscountList { items }, Some(meta)))
}

pub(crate) async fn find_visible<C: ConnectionTrait>(
    conn: &C,
    actor: Option<&AuthUser>,
    action: Action,
    id: Uuid,
) -> AppResult<DiscountModel> {
    let scope = policy::authorize(actor, Resource::Discount, action)?;
    Discounts::find_by_id(id)
        .filter(scoping::discounts(scope))
        .one(conn)
        .await?
        .ok_or(AppError::NotFound)
}

pub async fn get_discount(
    state: &AppState,
    actor: Option<&AuthUser>,
    id: Uuid,
) -> AppResult<ApiResponse<Discount>> {
    let discount = find_visible(&state.orm, actor, Action::Retrieve, id).await?;
    let mut views = to_views(&state.orm, vec![discount]).await?;
    let view = views.pop().ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success("Discount", view, None))
}

pub async fn calculate(
    state: &AppState,
    actor: Option<&AuthUser>,
    id: Uuid,
    query: CalculateDiscountQuery,
) -> AppResult<ApiResponse<DiscountCalculation>> {
    let discount = find_visible(&state.orm, actor, Action::Retrieve, id).await?;
    let now = Utc::now();
    let data = DiscountCalculation {
        is_valid: discount.is_valid_at(now),
        can_be_used: discount.can_be_used_at(query.amount, now),
        discount_amount: discount.calculate_discount_at(query.amount, now),
    };
    Ok(ApiResponse::success("Discount calculation", data, Some(Meta::empty())))
}

/// Take one use of a discount. Returns `false` when the usage limit was
/// already reached; the check and the increment are a single statement.
/// A discount linked to specific products only covers orders containing one of them.
/// Without links it covers every product in its scope.
pub(crate) async fn covers_products<C: ConnectionTrait>(
    conn: &C,
    discount_id: Uuid,
    ordered: &[Uuid],
) -> AppResult<bool> {
    let linked = product_ids_for(conn, &[discount_id])
        .await?
        .remove(&discount_id)
        .unwrap_or_default();
    Ok(linked.is_empty() || linked.iter().any(|id| ordered.contains(id)))
}

pub(crate) async fn claim_usage<C: ConnectionTrait>(conn: &C, id: Uuid) -> AppResult<bool> {
    let result = Discounts::update_many()
        .col_expr(Column::UsedCount, Expr::col(Column::UsedCount).add(1))
        .filter(Column::Id.eq(id))
        .filter(
            Condition::any()
                .add(Column::UsageLimit.is_null())
                .add(Expr::col(Column::UsedCount).lt(Expr::col(Column::UsageLimit))),
        )
        .exec(conn)
        .await?;
    Ok(result.rows_affected == 1)
}

struct Terms {
    discount_type: DiscountType,
    discount_value: Decimal,
    start_date: chrono::DateTime<Utc>,
    end_date: chrono::DateTime<Utc>,
    minimum_order_amount: Decimal,
    maximum_discount: Option<Decimal>,
    usage_limit: Option<i32>,
}

fn check_terms(terms: &Terms, errors: &mut FieldErrors) {
    if terms.discount_value <= Decimal::ZERO {
        errors.add("discount_value", "Ensure this value is greater than 0.");
    }
    if terms.discount_type == DiscountType::Percentage
        && terms.discount_value > Decimal::ONE_HUNDRED
    {
        errors.add("discount_value", "Percentage discounts cannot exceed 100.");
    }
    if terms.end_date <= terms.start_date {
        errors.add("end_date", "End date must be after start date.");
    }
    if terms.minimum_order_amount < Decimal::ZERO {
        errors.add(
            "minimum_order_amount",
            "Ensure this value is greater than or equal to 0.",
        );
    }
    if terms.maximum_discount.is_some_and(|cap| cap < Decimal::ZERO) {
        errors.add("maximum_discount", "Ensure this value is greater than or equal to 0.");
    }
    if terms.usage_limit.is_some_and(|limit| limit < 0) {
        errors.add("usage_limit", "Ensure this value is greater than or equal to 0.");
    }
}

/// Linked products must exist and, for restaurant discounts, belong to that restaurant.
async fn check_products<C: ConnectionTrait>(
    conn: &C,
    restaurant_id: Option<Uuid>,
    product_ids: &[Uuid],
    errors: &mut FieldErrors,
) -> AppResult<()> {
    if product_ids.is_empty() {
        return Ok(());
    }
    let mut condition = Condition::all().add(products::Column::Id.is_in(product_ids.to_vec()));
    if let Some(restaurant_id) = restaurant_id {
        condition = condition.add(products::Column::RestaurantId.eq(restaurant_id));
    }
    let found = Products::find().filter(condition).count(conn).await?;
    let mut unique = product_ids.to_vec();
    unique.sort();
    unique.dedup();
    if found != unique.len() as u64 {
        errors.add(
            "product_ids",
            "Every product must exist and belong to the discount's restaurant.",
        );
    }
    Ok(())
}

async fn replace_products<C: ConnectionTrait>(
    conn: &C,
    discount_id: Uuid,
    product_ids: &[Uuid],
) -> AppResult<()> {
    DiscountProducts::delete_many()
        .filter(discount_products::Column::DiscountId.eq(discount_id))
        .exec(conn)
        .await?;
    let mut unique = product_ids.to_vec();
    unique.sort();
    unique.dedup();
    for product_id in unique {
        discount_products::ActiveModel {
            discount_id: Set(discount_id),
            product_id: Set(product_id),
        }
        .insert(conn)
        .await?;
    }
    Ok(())
}

pub async fn create_discount(
    state: &AppState,
    user: &AuthUser,
    payload: CreateDiscountRequest,
) -> AppResult<ApiResponse<Discount>> {
    policy::authorize(Some(user), Resource::Discount, Action::Create)?;
    let restaurant_id = policy::creation_restaurant(user, payload.restaurant_id)?;

    let terms = Terms {
        discount_type: payload.discount_type,
        discount_value: payload.discount_value,
        start_date: payload.start_date,
        end_date: payload.end_date,
        minimum_order_amount: payload.minimum_order_amount.unwrap_or(Decimal::ZERO),
        maximum_discount: payload.maximum_discount,
        usage_limit: payload.usage_limit,
    };
    let mut errors = FieldErrors::new();
    let name = payload.name.trim().to_string();
    if name.is_empty() {
        errors.add("name", "This field may not be blank.");
    }
    check_terms(&terms, &mut errors);
    check_products(&state.orm, restaurant_id, &payload.product_ids, &mut errors).await?;
    errors.into_result()?;

    let txn = state.orm.begin().await?;
    let discount = ActiveModel {
        id: Set(Uuid::new_v4()),
        restaurant_id: Set(restaurant_id),
        name: Set(name),
        description: Set(payload.description),
        discount_type: Set(terms.discount_type),
        discount_value: Set(terms.discount_value),
        start_date: Set(terms.start_date.into()),
        end_date: Set(terms.end_date.into()),
        is_active: Set(payload.is_active.unwrap_or(true)),
        minimum_order_amount: Set(terms.minimum_order_amount),
        maximum_discount: Set(terms.maximum_discount),
        usage_limit: Set(terms.usage_limit),
        used_count: Set(0),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;
    replace_products(&txn, discount.id, &payload.product_ids).await?;
    let view = to_views(&txn, vec![discount]).await?.pop().ok_or(AppError::NotFound)?;
    txn.commit().await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "discount_create",
        "discounts",
        serde_json::json!({ "discount_id": view.id, "restaurant_id": view.restaurant_id }),
    )
    .await;

    Ok(ApiResponse::success("Discount created", view, Some(Meta::empty())))
}

pub async fn update_discount(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateDiscountRequest,
) -> AppResult<ApiResponse<Discount>> {
    let existing = find_visible(&state.orm, Some(user), Action::Update, id).await?;
    policy::ensure_can_modify(user, RecordOwner::Restaurant(existing.restaurant_id))?;

    let terms = Terms {
        discount_type: payload.discount_type.unwrap_or(existing.discount_type),
        discount_value: payload.discount_value.unwrap_or(existing.discount_value),
        start_date: payload
            .start_date
            .unwrap_or_else(|| existing.start_date.with_timezone(&Utc)),
        end_date: payload
            .end_date
            .unwrap_or_else(|| existing.end_date.with_timezone(&Utc)),
        minimum_order_amount: payload
            .minimum_order_amount
            .unwrap_or(existing.minimum_order_amount),
        maximum_discount: payload.maximum_discount.or(existing.maximum_discount),
        usage_limit: payload.usage_limit.or(existing.usage_limit),
    };
    let mut errors = FieldErrors::new();
    if payload.name.as_ref().is_some_and(|n| n.trim().is_empty()) {
        errors.add("name", "This field may not be blank.");
    }
    check_terms(&terms, &mut errors);
    if let Some(product_ids) = &payload.product_ids {
        check_products(&state.orm, existing.restaurant_id, product_ids, &mut errors).await?;
    }
    errors.into_result()?;

    let txn = state.orm.begin().await?;
    let mut active: ActiveModel = existing.into();
    if let Some(name) = payload.name {
        active.name = Set(name.trim().to_string());
    }
    if let Some(description) = payload.description {
        active.description = Set(Some(description));
    }
    if let Some(is_active) = payload.is_active {
        active.is_active = Set(is_active);
    }
    active.discount_type = Set(terms.discount_type);
    active.discount_value = Set(terms.discount_value);
    active.start_date = Set(terms.start_date.into());
    active.end_date = Set(terms.end_date.into());
    active.minimum_order_amount = Set(terms.minimum_order_amount);
    active.maximum_discount = Set(terms.maximum_discount);
    active.usage_limit = Set(terms.usage_limit);
    active.updated_at = Set(Utc::now().into());
    let discount = active.update(&txn).await?;

    if let Some(product_ids) = &payload.product_ids {
        replace_products(&txn, discount.id, product_ids).await?;
    }
    let view = to_views(&txn, vec![discount]).await?.pop().ok_or(AppError::NotFound)?;
    txn.commit().await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "discount_update",
        "discounts",
        serde_json::json!({ "discount_id": view.id }),
    )
    .await;

    Ok(ApiResponse::success("Updated", view, Some(Meta::empty())))
}

pub async fn delete_discount(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let existing = find_visible(&state.orm, Some(user), Action::Delete, id).await?;
    policy::ensure_can_modify(user, RecordOwner::Restaurant(existing.restaurant_id))?;

    let result = Discounts::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    audit::record(
        &state.pool,
        Some(user.user_id),
        "discount_delete",
        "discounts",
        serde_json::json!({ "discount_id": id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}
