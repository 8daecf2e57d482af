use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::{Expr, LockType};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit,
    db::is_unique_violation,
    domain::{
        rating,
        targets::{self, Target},
    },
    dto::reviews::{CreateReviewRequest, ReviewList, UpdateReviewRequest},
    entity::{
        Products, Restaurants, products, restaurants,
        reviews::{ActiveModel, Column, Entity as Reviews, Model as ReviewModel},
    },
    error::{AppError, AppResult, FieldErrors},
    middleware::auth::AuthUser,
    models::Review,
    policy::{self, Action, RecordOwner, Resource, Scope},
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    services::{fetch_page, product_service, restaurant_service},
    state::AppState,
};

const HIGH_RATING: i32 = 4;

fn scoped(scope: Scope) -> Condition {
    match scope {
        Scope::All => Condition::all(),
        Scope::Owner(user_id) => Condition::all().add(Column::UserId.eq(user_id)),
        _ => Condition::all().add(Expr::cust("FALSE")),
    }
}

fn target_of(review: &ReviewModel) -> Option<Target> {
    match (review.product_id, review.restaurant_id) {
        (Some(product_id), _) => Some(Target::Product(product_id)),
        (None, Some(restaurant_id)) => Some(Target::Restaurant(restaurant_id)),
        (None, None) => None,
    }
}

/// Lock the reviewed row so concurrent writes re-aggregate one at a time.
async fn lock_target<C: ConnectionTrait>(conn: &C, target: Target) -> AppResult<()> {
    let found = match target {
        Target::Product(id) => Products::find_by_id(id)
            .lock(LockType::Update)
            .one(conn)
            .await?
            .is_some(),
        Target::Restaurant(id) => Restaurants::find_by_id(id)
            .lock(LockType::Update)
            .one(conn)
            .await?
            .is_some(),
    };
    if found { Ok(()) } else { Err(AppError::NotFound) }
}

/// Recompute the cached rating (and product review count) from every
/// review of `target`.
pub(crate) async fn reaggregate<C: ConnectionTrait>(conn: &C, target: Target) -> AppResult<()> {
    let ratings: Vec<i32> = Reviews::find()
        .select_only()
        .column(Column::Rating)
        .filter(match target {
            Target::Product(id) => Column::ProductId.eq(id),
            Target::Restaurant(id) => Column::RestaurantId.eq(id),
        })
        .into_tuple()
        .all(conn)
        .await?;
    let average = rating::average(&ratings);

    match target {
        Target::Product(id) => {
            Products::update_many()
                .col_expr(products::Column::Rating, Expr::value(average))
                .col_expr(products::Column::ReviewsCount, Expr::value(ratings.len() as i32))
                .filter(products::Column::Id.eq(id))
                .exec(conn)
                .await?;
        }
        Target::Restaurant(id) => {
            Restaurants::update_many()
                .col_expr(restaurants::Column::Rating, Expr::value(average))
                .filter(restaurants::Column::Id.eq(id))
                .exec(conn)
                .await?;
        }
    }
    tracing::debug!(?target, %average, count = ratings.len(), "ratings re-aggregated");
    Ok(())
}

pub async fn list_reviews(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<ReviewList>> {
    let scope = policy::authorize(Some(user), Resource::Review, Action::List)?;
    let finder = Reviews::find()
        .filter(scoped(scope))
        .order_by_desc(Column::CreatedAt);

    let (rows, meta) = fetch_page(finder, &pagination, &state.orm).await?;
    let items = rows.into_iter().map(Review::from).collect();
    Ok(ApiResponse::success("Reviews", ReviewList { items }, Some(meta)))
}

/// The caller's own reviews, whatever their role.
pub async fn my_reviews(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<ReviewList>> {
    policy::authorize(Some(user), Resource::Review, Action::List)?;
    let finder = Reviews::find()
        .filter(Column::UserId.eq(user.user_id))
        .order_by_desc(Column::CreatedAt);

    let (rows, meta) = fetch_page(finder, &pagination, &state.orm).await?;
    let items = rows.into_iter().map(Review::from).collect();
    Ok(ApiResponse::success("My reviews", ReviewList { items }, Some(meta)))
}

pub async fn high_rated(
    state: &AppState,
    actor: Option<&AuthUser>,
    pagination: Pagination,
) -> AppResult<ApiResponse<ReviewList>> {
    policy::authorize(actor, Resource::Review, Action::List)?;
    let finder = Reviews::find()
        .filter(Column::Rating.gte(HIGH_RATING))
        .order_by_desc(Column::Rating)
        .order_by_desc(Column::CreatedAt);

    let (rows, meta) = fetch_page(finder, &pagination, &state.orm).await?;
    let items = rows.into_iter().map(Review::from).collect();
    Ok(ApiResponse::success("High rated reviews", ReviewList { items }, Some(meta)))
}

/// Public reviews of a visible product.
pub async fn list_for_product(
    state: &AppState,
    actor: Option<&AuthUser>,
    product_id: Uuid,
    pagination: Pagination,
) -> AppResult<ApiResponse<ReviewList>> {
    let product = product_service::find_visible(state, actor, Action::Retrieve, product_id).await?;
    let finder = Reviews::find()
        .filter(Column::ProductId.eq(product.id))
        .order_by_desc(Column::CreatedAt);

    let (rows, meta) = fetch_page(finder, &pagination, &state.orm).await?;
    let items = rows.into_iter().map(Review::from).collect();
    Ok(ApiResponse::success("Product reviews", ReviewList { items }, Some(meta)))
}

/// Public reviews of a visible restaurant.
pub async fn list_for_restaurant(
    state: &AppState,
    actor: Option<&AuthUser>,
    restaurant_id: Uuid,
    pagination: Pagination,
) -> AppResult<ApiResponse<ReviewList>> {
    let restaurant = restaurant_service::find_visible(state, actor, restaurant_id).await?;
    let finder = Reviews::find()
        .filter(Column::RestaurantId.eq(restaurant.id))
        .order_by_desc(Column::CreatedAt);

    let (rows, meta) = fetch_page(finder, &pagination, &state.orm).await?;
    let items = rows.into_iter().map(Review::from).collect();
    Ok(ApiResponse::success("Restaurant reviews", ReviewList { items }, Some(meta)))
}

async fn find_scoped(
    state: &AppState,
    user: &AuthUser,
    action: Action,
    id: Uuid,
) -> AppResult<ReviewModel> {
    let scope = policy::authorize(Some(user), Resource::Review, action)?;
    Reviews::find_by_id(id)
        .filter(scoped(scope))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)
}

pub async fn get_review(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Review>> {
    let review = find_scoped(state, user, Action::Retrieve, id).await?;
    Ok(ApiResponse::success("Review", Review::from(review), None))
}

pub async fn create_review(
    state: &AppState,
    user: &AuthUser,
    payload: CreateReviewRequest,
) -> AppResult<ApiResponse<Review>> {
    policy::authorize(Some(user), Resource::Review, Action::Create)?;
    let target = targets::review_target(payload.product_id, payload.restaurant_id)?;
    let mut errors = FieldErrors::new();
    targets::validate_rating(payload.rating, &mut errors);
    errors.into_result()?;

    let txn = state.orm.begin().await?;
    lock_target(&txn, target).await.map_err(|err| match (err, target) {
        (AppError::NotFound, Target::Product(_)) => {
            AppError::validation("product_id", "Product not found.")
        }
        (AppError::NotFound, Target::Restaurant(_)) => {
            AppError::validation("restaurant_id", "Restaurant not found.")
        }
        (other, _) => other,
    })?;

    let review = ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        product_id: Set(target.product_id()),
        restaurant_id: Set(target.restaurant_id()),
        rating: Set(payload.rating),
        comment: Set(payload.comment),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await
    .map_err(|err| {
        if is_unique_violation(&err) {
            AppError::validation("non_field_errors", "You have already reviewed this item.")
        } else {
            AppError::OrmError(err)
        }
    })?;

    reaggregate(&txn, target).await?;
    txn.commit().await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "review_create",
        "reviews",
        serde_json::json!({
            "review_id": review.id,
            "product_id": review.product_id,
            "restaurant_id": review.restaurant_id,
            "rating": review.rating,
        }),
    )
    .await;

    Ok(ApiResponse::success(
        "Review created",
        Review::from(review),
        Some(Meta::empty()),
    ))
}

pub async fn update_review(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateReviewRequest,
) -> AppResult<ApiResponse<Review>> {
    let existing = find_scoped(state, user, Action::Update, id).await?;
    policy::ensure_can_modify(user, RecordOwner::User(existing.user_id))?;

    let mut errors = FieldErrors::new();
    if let Some(rating) = payload.rating {
        targets::validate_rating(rating, &mut errors);
    }
    errors.into_result()?;

    let target = target_of(&existing);
    let txn = state.orm.begin().await?;
    if let Some(target) = target {
        lock_target(&txn, target).await?;
    }

    let mut active: ActiveModel = existing.into();
    if let Some(rating) = payload.rating {
        active.rating = Set(rating);
    }
    if let Some(comment) = payload.comment {
        active.comment = Set(Some(comment));
    }
    active.updated_at = Set(Utc::now().into());
    let review = active.update(&txn).await?;

    if let Some(target) = target {
        reaggregate(&txn, target).await?;
    }
    txn.commit().await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "review_update",
        "reviews",
        serde_json::json!({ "review_id": review.id, "rating": review.rating }),
    )
    .await;

    Ok(ApiResponse::success(
        "Updated",
        Review::from(review),
        Some(Meta::empty()),
    ))
}

pub async fn delete_review(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let existing = find_scoped(state, user, Action::Delete, id).await?;
    policy::ensure_can_modify(user, RecordOwner::User(existing.user_id))?;

    let target = target_of(&existing);
    let txn = state.orm.begin().await?;
    if let Some(target) = target {
        lock_target(&txn, target).await?;
    }
    Reviews::delete_by_id(existing.id).exec(&txn).await?;
    if let Some(target) = target {
        reaggregate(&txn, target).await?;
    }
    txn.commit().await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "review_delete",
        "reviews",
        serde_json::json!({ "review_id": id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}
