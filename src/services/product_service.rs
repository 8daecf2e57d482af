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
    dto::products::{CreateProductRequest, ProductList, UpdateProductRequest},
    entity::{
        Categories, Restaurants,
        products::{ActiveModel, Column, Entity as Products, Model as ProductModel},
    },
    error::{AppError, AppResult, FieldErrors},
    middleware::auth::AuthUser,
    models::Product,
    policy::{self, Action, RecordOwner, Resource},
    response::{ApiResponse, Meta},
    routes::params::{Pagination, Paginated, ProductQuery, ProductSortBy, SortOrder},
    services::{fetch_page, scoping},
    state::AppState,
};

pub async fn list_products(
    state: &AppState,
    actor: Option<&AuthUser>,
    query: ProductQuery,
) -> AppResult<ApiResponse<ProductList>> {
    let scope = policy::authorize(actor, Resource::Product, Action::List)?;
    let mut condition = scoping::products(scope);

    if let Some(search) = query.q.as_ref().filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", search);
        condition = condition.add(
            Condition::any()
                .add(Expr::col(Column::Name).ilike(pattern.clone()))
                .add(Expr::col(Column::Description).ilike(pattern)),
        );
    }
    if let Some(restaurant_id) = query.restaurant_id {
        condition = condition.add(Column::RestaurantId.eq(restaurant_id));
    }
    if let Some(category_id) = query.category_id {
        condition = condition.add(Column::CategoryId.eq(category_id));
    }
    if let Some(is_flash_sale) = query.is_flash_sale {
        condition = condition.add(Column::IsFlashSale.eq(is_flash_sale));
    }
    if let Some(in_stock) = query.in_stock {
        condition = condition.add(Column::InStock.eq(in_stock));
    }
    if let Some(min_price) = query.min_price {
        condition = condition.add(Column::Price.gte(min_price));
    }
    if let Some(max_price) = query.max_price {
        condition = condition.add(Column::Price.lte(max_price));
    }

    let sort_by = query.sort_by.unwrap_or(ProductSortBy::CreatedAt);
    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);
    let sort_col = match sort_by {
        ProductSortBy::CreatedAt => Column::CreatedAt,
        ProductSortBy::Price => Column::Price,
        ProductSortBy::Name => Column::Name,
        ProductSortBy::Rating => Column::Rating,
    };

    let mut finder = Products::find().filter(condition);
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(sort_col),
        SortOrder::Desc => finder.order_by_desc(sort_col),
    };

    let (rows, meta) = fetch_page(finder, &query.pagination(), &state.orm).await?;
    let items = rows.into_iter().map(Product::from).collect();
    Ok(ApiResponse::success("Products", ProductList { items }, Some(meta)))
}

pub async fn list_flash_sale(
    state: &AppState,
    actor: Option<&AuthUser>,
    pagination: Pagination,
) -> AppResult<ApiResponse<ProductList>> {
    let scope = policy::authorize(actor, Resource::Product, Action::List)?;
    let finder = Products::find()
        .filter(scoping::products(scope).add(Column::IsFlashSale.eq(true)))
        .order_by_desc(Column::CreatedAt);

    let (rows, meta) = fetch_page(finder, &pagination, &state.orm).await?;
    let items = rows.into_iter().map(Product::from).collect();
    Ok(ApiResponse::success("Flash sale products", ProductList { items }, Some(meta)))
}

pub async fn list_discounted(
    state: &AppState,
    actor: Option<&AuthUser>,
    pagination: Pagination,
) -> AppResult<ApiResponse<ProductList>> {
    let scope = policy::authorize(actor, Resource::Product, Action::List)?;
    let finder = Products::find()
        .filter(
            scoping::products(scope)
                .add(Column::DiscountPrice.is_not_null())
                .add(Expr::col(Column::DiscountPrice).lt(Expr::col(Column::Price))),
        )
        .order_by_desc(Column::CreatedAt);

    let (rows, meta) = fetch_page(finder, &pagination, &state.orm).await?;
    let items = rows.into_iter().map(Product::from).collect();
    Ok(ApiResponse::success("Discounted products", ProductList { items }, Some(meta)))
}

/// Load a product through the caller's scope. Out-of-scope ids are not found.
pub(crate) async fn find_visible(
    state: &AppState,
    actor: Option<&AuthUser>,
    action: Action,
    id: Uuid,
) -> AppResult<ProductModel> {
    let scope = policy::authorize(actor, Resource::Product, action)?;
    Products::find_by_id(id)
        .filter(scoping::products(scope))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)
}

pub async fn get_product(
    state: &AppState,
    actor: Option<&AuthUser>,
    id: Uuid,
) -> AppResult<ApiResponse<Product>> {
    let product = find_visible(state, actor, Action::Retrieve, id).await?;
    Ok(ApiResponse::success("Product", Product::from(product), None))
}

fn check_pricing(
    price: Option<Decimal>,
    discount_price: Option<Decimal>,
    discount_percentage: Option<i32>,
    errors: &mut FieldErrors,
) {
    if price.is_some_and(|p| p <= Decimal::ZERO) {
        errors.add("price", "Ensure this value is greater than 0.");
    }
    if discount_price.is_some_and(|p| p < Decimal::ZERO) {
        errors.add("discount_price", "Ensure this value is greater than or equal to 0.");
    }
    if discount_percentage.is_some_and(|p| !(0..=100).contains(&p)) {
        errors.add("discount_percentage", "Ensure this value is between 0 and 100.");
    }
}

async fn check_category(
    state: &AppState,
    category_id: Option<Uuid>,
    errors: &mut FieldErrors,
) -> AppResult<()> {
    if let Some(category_id) = category_id {
        if Categories::find_by_id(category_id).one(&state.orm).await?.is_none() {
            errors.add("category_id", "Category not found.");
        }
    }
    Ok(())
}

pub async fn create_product(
    state: &AppState,
    user: &AuthUser,
    payload: CreateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    policy::authorize(Some(user), Resource::Product, Action::Create)?;
    let restaurant_id = policy::creation_restaurant(user, payload.restaurant_id)?;

    let mut errors = FieldErrors::new();
    let name = payload.name.trim().to_string();
    if name.is_empty() {
        errors.add("name", "This field may not be blank.");
    }
    check_pricing(
        Some(payload.price),
        payload.discount_price,
        payload.discount_percentage,
        &mut errors,
    );
    match restaurant_id {
        None => errors.add("restaurant_id", "This field is required."),
        Some(id) => {
            if Restaurants::find_by_id(id).one(&state.orm).await?.is_none() {
                errors.add("restaurant_id", "Restaurant not found.");
            }
        }
    }
    check_category(state, payload.category_id, &mut errors).await?;
    errors.into_result()?;
    let restaurant_id = restaurant_id.ok_or(AppError::NotFound)?;

    let active = ActiveModel {
        id: Set(Uuid::new_v4()),
        restaurant_id: Set(restaurant_id),
        category_id: Set(payload.category_id),
        name: Set(name),
        description: Set(payload.description),
        price: Set(payload.price),
        discount_price: Set(payload.discount_price),
        discount_percentage: Set(payload.discount_percentage.unwrap_or(0)),
        image: Set(payload.image),
        in_stock: Set(payload.in_stock.unwrap_or(true)),
        is_flash_sale: Set(payload.is_flash_sale.unwrap_or(false)),
        rating: Set(Decimal::ZERO),
        reviews_count: Set(0),
        ingredients: Set(payload.ingredients.unwrap_or_else(|| serde_json::json!([]))),
        allergens: Set(payload.allergens.unwrap_or_else(|| serde_json::json!([]))),
        calories: Set(payload.calories),
        preparation_time: Set(payload.preparation_time),
        created_at: NotSet,
        updated_at: NotSet,
    };
    let product = active.insert(&state.orm).await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "product_create",
        "products",
        serde_json::json!({ "product_id": product.id, "restaurant_id": product.restaurant_id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Product created",
        Product::from(product),
        Some(Meta::empty()),
    ))
}

pub async fn update_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    let existing = find_visible(state, Some(user), Action::Update, id).await?;
    policy::ensure_can_modify(user, RecordOwner::Restaurant(Some(existing.restaurant_id)))?;

    let mut errors = FieldErrors::new();
    if payload.name.as_ref().is_some_and(|n| n.trim().is_empty()) {
        errors.add("name", "This field may not be blank.");
    }
    check_pricing(
        payload.price,
        payload.discount_price,
        payload.discount_percentage,
        &mut errors,
    );
    check_category(state, payload.category_id, &mut errors).await?;
    errors.into_result()?;

    let mut active: ActiveModel = existing.into();
    if let Some(category_id) = payload.category_id {
        active.category_id = Set(Some(category_id));
    }
    if let Some(name) = payload.name {
        active.name = Set(name.trim().to_string());
    }
    if let Some(description) = payload.description {
        active.description = Set(Some(description));
    }
    if let Some(price) = payload.price {
        active.price = Set(price);
    }
    if let Some(discount_price) = payload.discount_price {
        active.discount_price = Set(Some(discount_price));
    }
    if let Some(discount_percentage) = payload.discount_percentage {
        active.discount_percentage = Set(discount_percentage);
    }
    if let Some(image) = payload.image {
        active.image = Set(Some(image));
    }
    if let Some(in_stock) = payload.in_stock {
        active.in_stock = Set(in_stock);
    }
    if let Some(is_flash_sale) = payload.is_flash_sale {
        active.is_flash_sale = Set(is_flash_sale);
    }
    if let Some(ingredients) = payload.ingredients {
        active.ingredients = Set(ingredients);
    }
    if let Some(allergens) = payload.allergens {
        active.allergens = Set(allergens);
    }
    if let Some(calories) = payload.calories {
        active.calories = Set(Some(calories));
    }
    if let Some(preparation_time) = payload.preparation_time {
        active.preparation_time = Set(Some(preparation_time));
    }
    active.updated_at = Set(Utc::now().into());

    let product = active.update(&state.orm).await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "product_update",
        "products",
        serde_json::json!({ "product_id": product.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Updated",
        Product::from(product),
        Some(Meta::empty()),
    ))
}

pub async fn delete_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let existing = find_visible(state, Some(user), Action::Delete, id).await?;
    policy::ensure_can_modify(user, RecordOwner::Restaurant(Some(existing.restaurant_id)))?;

    let result = Products::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    audit::record(
        &state.pool,
        Some(user.user_id),
        "product_delete",
        "products",
        serde_json::json!({ "product_id": id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}
