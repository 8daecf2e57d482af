use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect, QueryTrait,
    Set,
};
use uuid::Uuid;

use crate::{
    audit,
    db::is_unique_violation,
    domain::targets::{self, Target},
    dto::favorites::{
        AddFavoriteRequest, FavoriteList, FavoriteProductList, FavoriteRestaurantList,
    },
    entity::{
        Products, Restaurants,
        favorites::{ActiveModel, Column, Entity as Favorites, FavoriteType},
        products, restaurants,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Favorite, Product, Restaurant},
    policy::{self, Action, Resource, Scope},
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    services::fetch_page,
    state::AppState,
};

fn owner(user: &AuthUser, action: Action) -> AppResult<Uuid> {
    match policy::authorize(Some(user), Resource::Favorite, action)? {
        Scope::Owner(user_id) => Ok(user_id),
        _ => Err(AppError::Forbidden),
    }
}

pub async fn list_favorites(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<FavoriteList>> {
    let owner = owner(user, Action::List)?;
    let finder = Favorites::find()
        .filter(Column::UserId.eq(owner))
        .order_by_desc(Column::CreatedAt);

    let (rows, meta) = fetch_page(finder, &pagination, &state.orm).await?;
    let items = rows.into_iter().map(Favorite::from).collect();
    Ok(ApiResponse::success("Favorites", FavoriteList { items }, Some(meta)))
}

/// Products the caller has marked as favorite.
pub async fn list_favorite_products(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<FavoriteProductList>> {
    let owner = owner(user, Action::List)?;
    let product_ids = Favorites::find()
        .select_only()
        .column(Column::ProductId)
        .filter(Column::UserId.eq(owner))
        .filter(Column::FavoriteType.eq(FavoriteType::Product))
        .into_query();
    let finder = Products::find()
        .filter(products::Column::Id.in_subquery(product_ids))
        .order_by_asc(products::Column::Name);

    let (rows, meta) = fetch_page(finder, &pagination, &state.orm).await?;
    let items = rows.into_iter().map(Product::from).collect();
    Ok(ApiResponse::success(
        "Favorite products",
        FavoriteProductList { items },
        Some(meta),
    ))
}

pub async fn list_favorite_restaurants(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<FavoriteRestaurantList>> {
    let owner = owner(user, Action::List)?;
    let restaurant_ids = Favorites::find()
        .select_only()
        .column(Column::RestaurantId)
        .filter(Column::UserId.eq(owner))
        .filter(Column::FavoriteType.eq(FavoriteType::Restaurant))
        .into_query();
    let finder = Restaurants::find()
        .filter(restaurants::Column::Id.in_subquery(restaurant_ids))
        .order_by_asc(restaurants::Column::Name);

    let (rows, meta) = fetch_page(finder, &pagination, &state.orm).await?;
    let items = rows.into_iter().map(Restaurant::from).collect();
    Ok(ApiResponse::success(
        "Favorite restaurants",
        FavoriteRestaurantList { items },
        Some(meta),
    ))
}

pub async fn add_favorite(
    state: &AppState,
    user: &AuthUser,
    payload: AddFavoriteRequest,
) -> AppResult<ApiResponse<Favorite>> {
    let owner = owner(user, Action::Create)?;
    let target = targets::favorite_target(
        payload.favorite_type,
        payload.restaurant_id,
        payload.product_id,
    )?;

    match target {
        Target::Product(id) => {
            if Products::find_by_id(id).one(&state.orm).await?.is_none() {
                return Err(AppError::validation("product", "Product not found."));
            }
        }
        Target::Restaurant(id) => {
            if Restaurants::find_by_id(id).one(&state.orm).await?.is_none() {
                return Err(AppError::validation("restaurant", "Restaurant not found."));
            }
        }
    }

    let favorite = ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(owner),
        favorite_type: Set(payload.favorite_type),
        restaurant_id: Set(target.restaurant_id()),
        product_id: Set(target.product_id()),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await
    .map_err(|err| {
        if is_unique_violation(&err) {
            AppError::validation("non_field_errors", "Already in your favorites.")
        } else {
            AppError::OrmError(err)
        }
    })?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "favorite_add",
        "favorites",
        serde_json::json!({
            "favorite_id": favorite.id,
            "product_id": favorite.product_id,
            "restaurant_id": favorite.restaurant_id,
        }),
    )
    .await;

    Ok(ApiResponse::success(
        "Added to favorites",
        Favorite::from(favorite),
        Some(Meta::empty()),
    ))
}

pub async fn remove_favorite(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let owner = owner(user, Action::Delete)?;
    let result = Favorites::delete_many()
        .filter(Column::Id.eq(id))
        .filter(Column::UserId.eq(owner))
        .exec(&state.orm)
        .await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    audit::record(
        &state.pool,
        Some(user.user_id),
        "favorite_remove",
        "favorites",
        serde_json::json!({ "favorite_id": id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Removed from favorites",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}
