use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::Expr;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use uuid::Uuid;

use crate::{
    audit,
    dto::{
        products::ProductList,
        restaurants::{CreateRestaurantRequest, RestaurantList, UpdateRestaurantRequest},
    },
    entity::{
        Products, products,
        restaurants::{ActiveModel, Column, Entity as Restaurants, Model as RestaurantModel},
    },
    error::{AppError, AppResult, FieldErrors},
    middleware::auth::AuthUser,
    models::{Product, Restaurant},
    policy::{self, Action, RecordOwner, Resource},
    response::{ApiResponse, Meta},
    routes::params::{Paginated, Pagination, RestaurantQuery, RestaurantSortBy, SortOrder},
    services::{fetch_page, scoping},
    state::AppState,
};

pub async fn list_restaurants(
    state: &AppState,
    actor: Option<&AuthUser>,
    query: RestaurantQuery,
) -> AppResult<ApiResponse<RestaurantList>> {
    let scope = policy::authorize(actor, Resource::Restaurant, Action::List)?;
    let mut condition = scoping::restaurants(scope);

    if let Some(search) = query.q.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(Expr::col(Column::Name).ilike(format!("%{}%", search)));
    }
    if let Some(is_partner) = query.is_partner {
        condition = condition.add(Column::IsPartner.eq(is_partner));
    }
    if let Some(is_active) = query.is_active {
        condition = condition.add(Column::IsActive.eq(is_active));
    }

    let sort_col = match query.sort_by.unwrap_or(RestaurantSortBy::Name) {
        RestaurantSortBy::CreatedAt => Column::CreatedAt,
        RestaurantSortBy::Name => Column::Name,
        RestaurantSortBy::Rating => Column::Rating,
    };
    let mut finder = Restaurants::find().filter(condition);
    finder = match query.sort_order.unwrap_or(SortOrder::Asc) {
        SortOrder::Asc => finder.order_by_asc(sort_col),
        SortOrder::Desc => finder.order_by_desc(sort_col),
    };

    let (rows, meta) = fetch_page(finder, &query.pagination(), &state.orm).await?;
    let items = rows.into_iter().map(Restaurant::from).collect();
    Ok(ApiResponse::success("Restaurants", RestaurantList { items }, Some(meta)))
}

pub(crate) async fn find_visible(
    state: &AppState,
    actor: Option<&AuthUser>,
    id: Uuid,
) -> AppResult<RestaurantModel> {
    let scope = policy::authorize(actor, Resource::Restaurant, Action::Retrieve)?;
    Restaurants::find_by_id(id)
        .filter(scoping::restaurants(scope))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)
}

pub async fn get_restaurant(
    state: &AppState,
    actor: Option<&AuthUser>,
    id: Uuid,
) -> AppResult<ApiResponse<Restaurant>> {
    let restaurant = find_visible(state, actor, id).await?;
    Ok(ApiResponse::success("Restaurant", Restaurant::from(restaurant), None))
}

/// In-stock menu of one visible restaurant.
pub async fn list_restaurant_products(
    state: &AppState,
    actor: Option<&AuthUser>,
    id: Uuid,
    pagination: Pagination,
) -> AppResult<ApiResponse<ProductList>> {
    let restaurant = find_visible(state, actor, id).await?;
    let finder = Products::find()
        .filter(products::Column::RestaurantId.eq(restaurant.id))
        .filter(products::Column::InStock.eq(true))
        .order_by_asc(products::Column::Name);

    let (rows, meta) = fetch_page(finder, &pagination, &state.orm).await?;
    let items = rows.into_iter().map(Product::from).collect();
    Ok(ApiResponse::success("Products", ProductList { items }, Some(meta)))
}

fn check_fees(
    delivery_fee: Option<Decimal>,
    minimum_order: Option<Decimal>,
    errors: &mut FieldErrors,
) {
    if delivery_fee.is_some_and(|fee| fee < Decimal::ZERO) {
        errors.add("delivery_fee", "Ensure this value is greater than or equal to 0.");
    }
    if minimum_order.is_some_and(|amount| amount < Decimal::ZERO) {
        errors.add("minimum_order", "Ensure this value is greater than or equal to 0.");
    }
}

pub async fn create_restaurant(
    state: &AppState,
    user: &AuthUser,
    payload: CreateRestaurantRequest,
) -> AppResult<ApiResponse<Restaurant>> {
    policy::authorize(Some(user), Resource::Restaurant, Action::Create)?;

    let mut errors = FieldErrors::new();
    let name = payload.name.trim().to_string();
    if name.is_empty() {
        errors.add("name", "This field may not be blank.");
    }
    if payload.address.trim().is_empty() {
        errors.add("address", "This field may not be blank.");
    }
    if payload.phone.trim().is_empty() {
        errors.add("phone", "This field may not be blank.");
    }
    if !payload.email.contains('@') {
        errors.add("email", "Enter a valid email address.");
    }
    check_fees(payload.delivery_fee, payload.minimum_order, &mut errors);
    errors.into_result()?;

    let active = ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name),
        logo: Set(payload.logo),
        banner: Set(payload.banner),
        description: Set(payload.description),
        rating: Set(Decimal::ZERO),
        delivery_time: Set(payload.delivery_time),
        cuisine_type: Set(payload.cuisine_type.unwrap_or_else(|| serde_json::json!([]))),
        is_partner: Set(payload.is_partner.unwrap_or(false)),
        address: Set(payload.address),
        phone: Set(payload.phone),
        email: Set(payload.email),
        opening_hours: Set(payload.opening_hours.unwrap_or_else(|| serde_json::json!({}))),
        delivery_fee: Set(payload.delivery_fee.unwrap_or(Decimal::ZERO)),
        minimum_order: Set(payload.minimum_order.unwrap_or(Decimal::ZERO)),
        is_active: Set(payload.is_active.unwrap_or(true)),
        created_at: NotSet,
        updated_at: NotSet,
    };
    let restaurant = active.insert(&state.orm).await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "restaurant_create",
        "restaurants",
        serde_json::json!({ "restaurant_id": restaurant.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Restaurant created",
        Restaurant::from(restaurant),
        Some(Meta::empty()),
    ))
}

pub async fn update_restaurant(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateRestaurantRequest,
) -> AppResult<ApiResponse<Restaurant>> {
    policy::authorize(Some(user), Resource::Restaurant, Action::Update)?;
    let existing = Restaurants::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    policy::ensure_can_modify(user, RecordOwner::Restaurant(Some(existing.id)))?;

    let mut errors = FieldErrors::new();
    if payload.name.as_ref().is_some_and(|n| n.trim().is_empty()) {
        errors.add("name", "This field may not be blank.");
    }
    check_fees(payload.delivery_fee, payload.minimum_order, &mut errors);
    errors.into_result()?;

    let mut active: ActiveModel = existing.into();
    if let Some(name) = payload.name {
        active.name = Set(name.trim().to_string());
    }
    if let Some(logo) = payload.logo {
        active.logo = Set(Some(logo));
    }
    if let Some(banner) = payload.banner {
        active.banner = Set(Some(banner));
    }
    if let Some(description) = payload.description {
        active.description = Set(Some(description));
    }
    if let Some(delivery_time) = payload.delivery_time {
        active.delivery_time = Set(Some(delivery_time));
    }
    if let Some(cuisine_type) = payload.cuisine_type {
        active.cuisine_type = Set(cuisine_type);
    }
    if let Some(address) = payload.address {
        active.address = Set(address);
    }
    if let Some(phone) = payload.phone {
        active.phone = Set(phone);
    }
    if let Some(email) = payload.email {
        active.email = Set(email);
    }
    if let Some(opening_hours) = payload.opening_hours {
        active.opening_hours = Set(opening_hours);
    }
    if let Some(delivery_fee) = payload.delivery_fee {
        active.delivery_fee = Set(delivery_fee);
    }
    if let Some(minimum_order) = payload.minimum_order {
        active.minimum_order = Set(minimum_order);
    }
    // Partnership and visibility are platform decisions.
    if user.is_super_admin() {
        if let Some(is_partner) = payload.is_partner {
            active.is_partner = Set(is_partner);
        }
        if let Some(is_active) = payload.is_active {
            active.is_active = Set(is_active);
        }
    }
    active.updated_at = Set(Utc::now().into());
    let restaurant = active.update(&state.orm).await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "restaurant_update",
        "restaurants",
        serde_json::json!({ "restaurant_id": restaurant.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Updated",
        Restaurant::from(restaurant),
        Some(Meta::empty()),
    ))
}

pub async fn delete_restaurant(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    policy::authorize(Some(user), Resource::Restaurant, Action::Delete)?;
    let result = Restaurants::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    audit::record(
        &state.pool,
        Some(user.user_id),
        "restaurant_delete",
        "restaurants",
        serde_json::json!({ "restaurant_id": id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}
