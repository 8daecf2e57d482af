use std::collections::{BTreeSet, HashMap, HashSet};

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::LockType;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseTransaction, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit,
    domain::order_flow::{self, OrderAction},
    dto::orders::{CreateOrderRequest, OrderDetail, OrderList, UpdateOrderRequest},
    entity::{
        Products, Restaurants, Users,
        order_items::{self, ActiveModel as OrderItemActive, Entity as OrderItems},
        orders::{
            ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel,
            OrderStatus, PaymentStatus,
        },
        products, restaurants,
    },
    error::{AppError, AppResult, FieldErrors},
    middleware::auth::AuthUser,
    models::{Order, OrderItem, RestaurantRef},
    policy::{self, Action, Resource},
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, Paginated, SortOrder},
    services::{discount_service, fetch_page, notification_service, scoping},
    state::AppState,
};

pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let scope = policy::authorize(Some(user), Resource::Order, Action::List)?;
    let mut condition = scoping::orders(scope);
    if let Some(status) = query.status {
        condition = condition.add(OrderCol::Status.eq(status));
    }
    if let Some(payment_status) = query.payment_status {
        condition = condition.add(OrderCol::PaymentStatus.eq(payment_status));
    }
    if let Some(from) = query.created_from {
        condition = condition.add(OrderCol::CreatedAt.gte(from));
    }
    if let Some(to) = query.created_to {
        condition = condition.add(OrderCol::CreatedAt.lte(to));
    }

    let mut finder = Orders::find().filter(condition);
    finder = match query.sort_order.unwrap_or(SortOrder::Desc) {
        SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
    };

    let (rows, meta) = fetch_page(finder, &query.pagination(), &state.orm).await?;
    let items = rows.into_iter().map(Order::from).collect();
    Ok(ApiResponse::success("Ok", OrderList { items }, Some(meta)))
}

async fn load_detail<C: ConnectionTrait>(conn: &C, order: OrderModel) -> AppResult<OrderDetail> {
    let items = OrderItems::find()
        .filter(order_items::Column::OrderId.eq(order.id))
        .all(conn)
        .await?;

    let product_ids: Vec<Uuid> = items.iter().map(|i| i.product_id).collect();
    let restaurant_ids: BTreeSet<Uuid> = if product_ids.is_empty() {
        BTreeSet::new()
    } else {
        Products::find()
            .filter(products::Column::Id.is_in(product_ids))
            .all(conn)
            .await?
            .into_iter()
            .map(|p| p.restaurant_id)
            .collect()
    };
    let restaurants = if restaurant_ids.is_empty() {
        Vec::new()
    } else {
        Restaurants::find()
            .filter(restaurants::Column::Id.is_in(restaurant_ids))
            .order_by_asc(restaurants::Column::Name)
            .all(conn)
            .await?
            .into_iter()
            .map(RestaurantRef::from)
            .collect()
    };

    Ok(OrderDetail {
        order: Order::from(order),
        items: items.into_iter().map(OrderItem::from).collect(),
        restaurants,
    })
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderDetail>> {
    let scope = policy::authorize(Some(user), Resource::Order, Action::Retrieve)?;
    let order = Orders::find_by_id(id)
        .filter(scoping::orders(scope))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let detail = load_detail(&state.orm, order).await?;
    Ok(ApiResponse::success("OK", detail, Some(Meta::empty())))
}

struct PricedLine {
    product_id: Uuid,
    restaurant_id: Uuid,
    quantity: i32,
    unit_price: Decimal,
}

fn check_order_request(payload: &CreateOrderRequest, errors: &mut FieldErrors) {
    if payload.delivery_address.trim().is_empty() {
        errors.add("delivery_address", "This field may not be blank.");
    }
    if payload.delivery_fee.is_some_and(|fee| fee < Decimal::ZERO) {
        errors.add("delivery_fee", "Ensure this value is greater than or equal to 0.");
    }
    if payload.items.is_empty() {
        errors.add("items", "An order needs at least one item.");
    }
    let mut seen = HashSet::new();
    for item in &payload.items {
        if item.quantity < 1 {
            errors.add(
                "items",
                format!("Quantity for product {} must be at least 1.", item.product_id),
            );
        }
        if !seen.insert(item.product_id) {
            errors.add(
                "items",
                format!("Product {} is listed more than once.", item.product_id),
            );
        }
    }
}

/// Price each requested line from the product's current final price.
async fn price_lines(
    txn: &DatabaseTransaction,
    payload: &CreateOrderRequest,
) -> AppResult<Vec<PricedLine>> {
    let ids: Vec<Uuid> = payload.items.iter().map(|i| i.product_id).collect();
    let found: HashMap<Uuid, products::Model> = Products::find()
        .filter(products::Column::Id.is_in(ids))
        .all(txn)
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();

    let mut errors = FieldErrors::new();
    let mut lines = Vec::with_capacity(payload.items.len());
    for item in &payload.items {
        match found.get(&item.product_id) {
            None => errors.add("items", format!("Product {} not found.", item.product_id)),
            Some(product) if !product.in_stock => {
                errors.add("items", format!("{} is out of stock.", product.name))
            }
            Some(product) => lines.push(PricedLine {
                product_id: product.id,
                restaurant_id: product.restaurant_id,
                quantity: item.quantity,
                unit_price: product.final_price(),
            }),
        }
    }
    errors.into_result()?;
    Ok(lines)
}

pub async fn create_order(
    state: &AppState,
    user: &AuthUser,
    payload: CreateOrderRequest,
) -> AppResult<ApiResponse<OrderDetail>> {
    policy::authorize(Some(user), Resource::Order, Action::Create)?;

    let mut errors = FieldErrors::new();
    check_order_request(&payload, &mut errors);
    errors.into_result()?;

    let txn = state.orm.begin().await?;
    let lines = price_lines(&txn, &payload).await?;
    let total: Decimal = lines
        .iter()
        .map(|l| order_items::line_total(l.unit_price, l.quantity))
        .sum();
    let restaurant_ids: Vec<Uuid> = lines
        .iter()
        .map(|l| l.restaurant_id)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let mut discount_amount = Decimal::ZERO;
    if let Some(discount_id) = payload.discount_id {
        let discount =
            discount_service::find_visible(&txn, Some(user), Action::Retrieve, discount_id)
                .await
                .map_err(|err| match err {
                    AppError::NotFound => {
                        AppError::validation("discount_id", "Discount not found.")
                    }
                    other => other,
                })?;

        let now = Utc::now();
        let ordered: Vec<Uuid> = lines.iter().map(|l| l.product_id).collect();
        let applies_to_order = discount
            .restaurant_id
            .is_none_or(|rid| restaurant_ids.contains(&rid))
            && discount_service::covers_products(&txn, discount.id, &ordered).await?;
        if !applies_to_order || !discount.can_be_used_at(total, now) {
            return Err(AppError::validation(
                "discount_id",
                "Discount cannot be applied to this order.",
            ));
        }
        if !discount_service::claim_usage(&txn, discount.id).await? {
            return Err(AppError::validation(
                "discount_id",
                "Discount usage limit has been reached.",
            ));
        }
        discount_amount = discount.calculate_discount_at(total, now).min(total);
    }

    let order = OrderActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        total: Set(total),
        status: Set(OrderStatus::Pending),
        delivery_address: Set(payload.delivery_address.trim().to_string()),
        delivery_fee: Set(payload.delivery_fee.unwrap_or(Decimal::ZERO)),
        payment_method: Set(payload.payment_method),
        payment_status: Set(PaymentStatus::Pending),
        discount_id: Set(payload.discount_id),
        discount_amount: Set(discount_amount),
        delivery_time: Set(None),
        notes: Set(payload.notes),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    for line in &lines {
        // total_price is filled in by the order item save hook.
        OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            product_id: Set(line.product_id),
            quantity: Set(line.quantity),
            unit_price: Set(line.unit_price),
            total_price: NotSet,
        }
        .insert(&txn)
        .await?;
    }

    let customer_name = Users::find_by_id(user.user_id)
        .one(&txn)
        .await?
        .map(|u| u.name)
        .unwrap_or_default();
    notification_service::fan_out_new_order(&txn, &order, &customer_name, &restaurant_ids)
        .await?;

    let detail = load_detail(&txn, order).await?;
    txn.commit().await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "order_create",
        "orders",
        serde_json::json!({
            "order_id": detail.order.id,
            "total": detail.order.total,
            "restaurants": restaurant_ids,
        }),
    )
    .await;

    Ok(ApiResponse::success(
        "Order created",
        detail,
        Some(Meta::empty()),
    ))
}

/// Lock an order inside the caller's scope for a status change.
async fn lock_visible(
    txn: &DatabaseTransaction,
    user: &AuthUser,
    action: Action,
    id: Uuid,
) -> AppResult<OrderModel> {
    let scope = policy::authorize(Some(user), Resource::Order, action)?;
    Orders::find_by_id(id)
        .filter(scoping::orders(scope))
        .lock(LockType::Update)
        .one(txn)
        .await?
        .ok_or(AppError::NotFound)
}

/// Persist the order and notify the customer when the save warrants it.
async fn save_and_notify(
    state: &AppState,
    txn: &DatabaseTransaction,
    before: OrderStatus,
    active: OrderActive,
) -> AppResult<OrderModel> {
    let order = active.update(txn).await?;
    if order_flow::should_notify_customer(state.config.notify_on_every_save, before, order.status)
    {
        notification_service::notify_customer(txn, &order).await?;
    }
    Ok(order)
}

pub async fn update_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateOrderRequest,
) -> AppResult<ApiResponse<OrderDetail>> {
    let txn = state.orm.begin().await?;
    let existing = lock_visible(&txn, user, Action::Update, id).await?;
    let before = existing.status;

    let mut active: OrderActive = existing.into();
    if let Some(status) = payload.status {
        active.status = Set(order_flow::transition(before, status)?);
    }
    if let Some(payment_status) = payload.payment_status {
        active.payment_status = Set(payment_status);
    }
    if let Some(delivery_time) = payload.delivery_time {
        active.delivery_time = Set(Some(delivery_time.into()));
    }
    if let Some(notes) = payload.notes {
        active.notes = Set(Some(notes));
    }
    active.updated_at = Set(Utc::now().into());

    let order = save_and_notify(state, &txn, before, active).await?;
    let detail = load_detail(&txn, order).await?;
    txn.commit().await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "order_update",
        "orders",
        serde_json::json!({
            "order_id": id,
            "from": before.as_str(),
            "to": detail.order.status.as_str(),
        }),
    )
    .await;

    Ok(ApiResponse::success("Updated", detail, Some(Meta::empty())))
}

/// Run one of the explicit order actions (cancel, confirm, mark delivered).
pub async fn apply_action(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    action: OrderAction,
) -> AppResult<ApiResponse<OrderDetail>> {
    let policy_action = match action {
        OrderAction::Cancel => Action::Cancel,
        OrderAction::Confirm | OrderAction::MarkDelivered => Action::Update,
    };

    let txn = state.orm.begin().await?;
    let existing = lock_visible(&txn, user, policy_action, id).await?;
    let before = existing.status;
    let after = order_flow::apply_action(before, action)?;

    let mut active: OrderActive = existing.into();
    active.status = Set(after);
    active.updated_at = Set(Utc::now().into());
    let order = save_and_notify(state, &txn, before, active).await?;
    let detail = load_detail(&txn, order).await?;
    txn.commit().await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "order_status_change",
        "orders",
        serde_json::json!({
            "order_id": id,
            "from": before.as_str(),
            "to": after.as_str(),
        }),
    )
    .await;

    let message = match action {
        OrderAction::Cancel => "Order cancelled",
        OrderAction::Confirm => "Order confirmed",
        OrderAction::MarkDelivered => "Order marked as delivered",
    };
    Ok(ApiResponse::success(message, detail, Some(Meta::empty())))
}

pub async fn delete_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    policy::authorize(Some(user), Resource::Order, Action::Delete)?;
    let result = Orders::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    audit::record(
        &state.pool,
        Some(user.user_id),
        "order_delete",
        "orders",
        serde_json::json!({ "order_id": id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}
