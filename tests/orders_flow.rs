use std::sync::Arc;

use bitedrop_api::{
    config::AppConfig,
    db::{create_orm_conn, create_pool, run_migrations},
    domain::order_flow::OrderAction,
    dto::{
        favorites::AddFavoriteRequest,
        orders::{CreateOrderRequest, OrderItemRequest, UpdateOrderRequest},
        reviews::CreateReviewRequest,
        wallet::CreateWalletTransactionRequest,
    },
    entity::{
        AuditLogs, Discounts, Notifications, Products, audit_logs, discount_products,
        discounts::{ActiveModel as DiscountActive, DiscountType},
        favorites::FavoriteType,
        notifications,
        orders::{OrderStatus, PaymentMethodType},
        products::ActiveModel as ProductActive,
        restaurants::ActiveModel as RestaurantActive,
        users::{ActiveModel as UserActive, UserRole},
        wallet_transactions::WalletTransactionType,
    },
    error::AppError,
    mailer::TracingMailer,
    middleware::auth::AuthUser,
    routes::params::ProductQuery,
    services::{
        favorite_service, notification_service, order_service, product_service,
        review_service, staff_service, wallet_service,
    },
    state::AppState,
};
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    Set, Statement,
};
use uuid::Uuid;

// Integration flow: tenant scoping, order fan-out and transitions, wallet clamping, review aggregation.
#[tokio::test]
async fn marketplace_flow() -> anyhow::Result<()> {
    // Allow skipping when no DB is configured in the environment.
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!(
                "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
            );
            return Ok(());
        }
    };

    let state = setup_state(&database_url).await?;

    // Two restaurants, one product each
    let r1 = create_restaurant(&state, "Crab Shack").await?;
    let r2 = create_restaurant(&state, "Gopher Grill").await?;
    let p1 = create_product(&state, r1, "Crab Roll", 1000).await?;
    let p2 = create_product(&state, r2, "Gopher Burger", 800).await?;

    let owner_r1 = create_user(&state, UserRole::RestaurantAdmin, Some(r1), Decimal::ZERO).await?;
    let staff_a = create_user(&state, UserRole::Staff, Some(r1), Decimal::ZERO).await?;
    let staff_b = create_user(&state, UserRole::Staff, Some(r1), Decimal::ZERO).await?;
    let owner_r2 = create_user(&state, UserRole::RestaurantAdmin, Some(r2), Decimal::ZERO).await?;
    let customer = create_user(&state, UserRole::User, None, Decimal::from(30)).await?;

    // Restaurant admin of R1 sees only R1's product
    let listed = product_service::list_products(&state, Some(&owner_r1), ProductQuery::default())
        .await?
        .data
        .unwrap()
        .items;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, p1);
    assert!(product_service::get_product(&state, Some(&owner_r1), p1).await.is_ok());
    assert!(matches!(
        product_service::get_product(&state, Some(&owner_r1), p2).await,
        Err(AppError::NotFound)
    ));

    // Ordering an R1 product notifies R1's admin and each R1 staff member
    let detail = order_service::create_order(
        &state,
        &customer,
        CreateOrderRequest {
            delivery_address: "42 Harbour Road".into(),
            delivery_fee: Some(Decimal::from(2)),
            payment_method: PaymentMethodType::Cash,
            notes: None,
            discount_id: None,
            items: vec![OrderItemRequest {
                product_id: p1,
                quantity: 2,
            }],
        },
    )
    .await?
    .data
    .unwrap();
    let order_id = detail.order.id;
    assert_eq!(detail.order.total, Decimal::from(20));
    assert_eq!(detail.order.amount_due, Decimal::from(22));
    assert_eq!(detail.items[0].total_price, Decimal::from(20));
    assert_eq!(detail.restaurants.len(), 1);

    for member in [&owner_r1, &staff_a, &staff_b] {
        assert_eq!(count_notifications(&state, member.user_id).await?, 1);
    }
    assert_eq!(count_notifications(&state, owner_r2.user_id).await?, 0);

    let audited = AuditLogs::find()
        .filter(audit_logs::Column::UserId.eq(customer.user_id))
        .filter(audit_logs::Column::Action.eq("order_create"))
        .one(&state.orm)
        .await?
        .expect("order creation is audited");
    assert_eq!(audited.resource, "orders");
    assert_eq!(audited.metadata["order_id"], serde_json::json!(order_id));

    // The other restaurant cannot see the order
    assert!(matches!(
        order_service::get_order(&state, &owner_r2, order_id).await,
        Err(AppError::NotFound)
    ));

    // Restaurant moves the order forward; the customer hears about it
    for status in [OrderStatus::Confirmed, OrderStatus::Preparing] {
        let updated = order_service::update_order(
            &state,
            &owner_r1,
            order_id,
            UpdateOrderRequest {
                status: Some(status),
                payment_status: None,
                delivery_time: None,
                notes: None,
            },
        )
        .await?;
        assert_eq!(updated.data.unwrap().order.status, status);
    }
    assert_eq!(count_notifications(&state, customer.user_id).await?, 2);

    // Cancelling while preparing is a conflict and changes nothing
    let err = order_service::apply_action(&state, &customer, order_id, OrderAction::Cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
    let current = order_service::get_order(&state, &customer, order_id)
        .await?
        .data
        .unwrap();
    assert_eq!(current.order.status, OrderStatus::Preparing);
    assert_eq!(count_notifications(&state, customer.user_id).await?, 2);

    // Marking everything read touches only unread rows
    let marked = notification_service::mark_all_read(&state, &customer).await?;
    assert_eq!(marked.data.unwrap().updated, 2);
    let marked = notification_service::mark_all_read(&state, &customer).await?;
    assert_eq!(marked.data.unwrap().updated, 0);

    // A fresh order can be cancelled from pending
    let second = order_service::create_order(
        &state,
        &customer,
        CreateOrderRequest {
            delivery_address: "42 Harbour Road".into(),
            delivery_fee: None,
            payment_method: PaymentMethodType::Card,
            notes: None,
            discount_id: None,
            items: vec![OrderItemRequest {
                product_id: p2,
                quantity: 1,
            }],
        },
    )
    .await?
    .data
    .unwrap();
    let cancelled =
        order_service::apply_action(&state, &customer, second.order.id, OrderAction::Cancel)
            .await?;
    assert_eq!(cancelled.data.unwrap().order.status, OrderStatus::Cancelled);

    // Wallet debit larger than the balance clamps to zero
    wallet_service::create_transaction(
        &state,
        &customer,
        CreateWalletTransactionRequest {
            transaction_type: WalletTransactionType::Redeemed,
            amount: Decimal::from(-50),
            points: 0,
            description: "Paid with wallet".into(),
            order_id: Some(order_id),
        },
    )
    .await?;
    let balance = wallet_service::balance(&state, &customer).await?.data.unwrap();
    assert_eq!(balance.wallet_balance, Decimal::ZERO);
    assert_eq!(balance.total_transactions, 1);

    // Reviews: both targets rejected, three ratings aggregate to 4.00
    let err = review_service::create_review(
        &state,
        &customer,
        CreateReviewRequest {
            product_id: Some(p1),
            restaurant_id: Some(r1),
            rating: 5,
            comment: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let mut reviewers = vec![customer.clone()];
    reviewers.push(create_user(&state, UserRole::User, None, Decimal::ZERO).await?);
    reviewers.push(create_user(&state, UserRole::User, None, Decimal::ZERO).await?);
    for (reviewer, rating) in reviewers.iter().zip([3, 4, 5]) {
        review_service::create_review(
            &state,
            reviewer,
            CreateReviewRequest {
                product_id: Some(p1),
                restaurant_id: None,
                rating,
                comment: Some("Tasty".into()),
            },
        )
        .await?;
    }
    let product = Products::find_by_id(p1)
        .one(&state.orm)
        .await?
        .expect("product exists");
    assert_eq!(product.rating, Decimal::new(400, 2));
    assert_eq!(product.reviews_count, 3);

    // Staff of another restaurant is found without scope, then refused
    let staff_r2 = create_user(&state, UserRole::Staff, Some(r2), Decimal::ZERO).await?;
    assert!(staff_service::get_staff(&state, &owner_r1, staff_a.user_id).await.is_ok());
    assert!(matches!(
        staff_service::get_staff(&state, &owner_r1, staff_r2.user_id).await,
        Err(AppError::Forbidden)
    ));
    assert!(matches!(
        staff_service::delete_staff(&state, &owner_r1, staff_r2.user_id).await,
        Err(AppError::Forbidden)
    ));

    // A discount linked to p1 only covers orders that contain p1, once
    let p3 = create_product(&state, r1, "Crab Cake", 600).await?;
    let linked = create_discount(&state, Some(r1), Some(1)).await?;
    discount_products::ActiveModel {
        discount_id: Set(linked),
        product_id: Set(p1),
    }
    .insert(&state.orm)
    .await?;

    let err = order_service::create_order(&state, &customer, order_request(p3, Some(linked)))
        .await
        .unwrap_err();
    assert_discount_rejected(err);
    assert_eq!(used_count(&state, linked).await?, 0);

    let discounted =
        order_service::create_order(&state, &customer, order_request(p1, Some(linked)))
            .await?
            .data
            .unwrap();
    assert_eq!(discounted.order.discount_amount, Decimal::from(2));
    assert_eq!(used_count(&state, linked).await?, 1);

    // Usage limit reached: rejected and the counter stays put
    let err = order_service::create_order(&state, &customer, order_request(p1, Some(linked)))
        .await
        .unwrap_err();
    assert_discount_rejected(err);
    assert_eq!(used_count(&state, linked).await?, 1);

    // Favoriting the same product twice is a validation error
    let favorite = || AddFavoriteRequest {
        favorite_type: FavoriteType::Product,
        restaurant_id: None,
        product_id: Some(p1),
    };
    favorite_service::add_favorite(&state, &customer, favorite()).await?;
    let err = favorite_service::add_favorite(&state, &customer, favorite())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    Ok(())
}

fn order_request(product_id: Uuid, discount_id: Option<Uuid>) -> CreateOrderRequest {
    CreateOrderRequest {
        delivery_address: "42 Harbour Road".into(),
        delivery_fee: None,
        payment_method: PaymentMethodType::Cash,
        notes: None,
        discount_id,
        items: vec![OrderItemRequest {
            product_id,
            quantity: 1,
        }],
    }
}

fn assert_discount_rejected(err: AppError) {
    match err {
        AppError::Validation(fields) => assert!(fields.get("discount_id").is_some()),
        other => panic!("expected discount_id validation error, got {other:?}"),
    }
}

async fn setup_state(database_url: &str) -> anyhow::Result<AppState> {
    let orm = create_orm_conn(database_url).await?;
    run_migrations(&orm).await?;

    // Clean tables between runs
    let backend = orm.get_database_backend();
    orm.execute(Statement::from_string(
        backend,
        "TRUNCATE TABLE notifications, wallet_transactions, reviews, favorites, order_items, orders, \
         discount_products, discounts, products, categories, delivery_zones, payment_methods, \
         audit_logs, users, restaurants RESTART IDENTITY CASCADE",
    ))
    .await?;

    let pool = create_pool(database_url).await?;
    Ok(AppState {
        pool,
        orm,
        config: Arc::new(AppConfig::for_database(database_url, "test-secret")),
        mailer: Arc::new(TracingMailer::new(None)),
    })
}

async fn create_restaurant(state: &AppState, name: &str) -> anyhow::Result<Uuid> {
    let restaurant = RestaurantActive {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        logo: Set(None),
        banner: Set(None),
        description: Set(None),
        rating: Set(Decimal::ZERO),
        delivery_time: Set(None),
        cuisine_type: Set(serde_json::json!([])),
        is_partner: Set(false),
        address: Set("1 Test Street".into()),
        phone: Set("+10000000".into()),
        email: Set(format!("{}@example.com", Uuid::new_v4().simple())),
        opening_hours: Set(serde_json::json!({})),
        delivery_fee: Set(Decimal::ZERO),
        minimum_order: Set(Decimal::ZERO),
        is_active: Set(true),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(restaurant.id)
}

async fn create_product(
    state: &AppState,
    restaurant_id: Uuid,
    name: &str,
    price_cents: i64,
) -> anyhow::Result<Uuid> {
    let product = ProductActive {
        id: Set(Uuid::new_v4()),
        restaurant_id: Set(restaurant_id),
        category_id: Set(None),
        name: Set(name.to_string()),
        description: Set(None),
        price: Set(Decimal::new(price_cents, 2)),
        discount_price: Set(None),
        discount_percentage: Set(0),
        image: Set(None),
        in_stock: Set(true),
        is_flash_sale: Set(false),
        rating: Set(Decimal::ZERO),
        reviews_count: Set(0),
        ingredients: Set(serde_json::json!([])),
        allergens: Set(serde_json::json!([])),
        calories: Set(None),
        preparation_time: Set(None),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(product.id)
}

async fn create_user(
    state: &AppState,
    role: UserRole,
    restaurant_id: Option<Uuid>,
    wallet_balance: Decimal,
) -> anyhow::Result<AuthUser> {
    let user = UserActive {
        id: Set(Uuid::new_v4()),
        email: Set(format!("{}@example.com", Uuid::new_v4().simple())),
        name: Set(format!("{} tester", role.as_str())),
        password_hash: Set("dummy".into()),
        role: Set(role),
        phone: Set(None),
        address: Set(None),
        restaurant_id: Set(restaurant_id),
        wallet_balance: Set(wallet_balance),
        loyalty_points: Set(0),
        must_change_password: Set(false),
        is_active: Set(true),
        is_superuser: Set(false),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(AuthUser {
        user_id: user.id,
        role: user.role,
        restaurant_id: user.restaurant_id,
        is_superuser: user.is_superuser,
    })
}

async fn create_discount(
    state: &AppState,
    restaurant_id: Option<Uuid>,
    usage_limit: Option<i32>,
) -> anyhow::Result<Uuid> {
    let now = Utc::now();
    let discount = DiscountActive {
        id: Set(Uuid::new_v4()),
        restaurant_id: Set(restaurant_id),
        name: Set("Two off".into()),
        description: Set(None),
        discount_type: Set(DiscountType::Fixed),
        discount_value: Set(Decimal::from(2)),
        start_date: Set((now - Duration::days(1)).into()),
        end_date: Set((now + Duration::days(1)).into()),
        is_active: Set(true),
        minimum_order_amount: Set(Decimal::ZERO),
        maximum_discount: Set(None),
        usage_limit: Set(usage_limit),
        used_count: Set(0),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(discount.id)
}

async fn used_count(state: &AppState, discount_id: Uuid) -> anyhow::Result<i32> {
    let discount = Discounts::find_by_id(discount_id)
        .one(&state.orm)
        .await?
        .expect("discount exists");
    Ok(discount.used_count)
}

async fn count_notifications(state: &AppState, user_id: Uuid) -> anyhow::Result<u64> {
    let count = Notifications::find()
        .filter(notifications::Column::UserId.eq(user_id))
        .count(&state.orm)
        .await?;
    Ok(count)
}

