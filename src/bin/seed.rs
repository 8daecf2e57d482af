use bitedrop_api::{
    config::AppConfig,
    db::{create_orm_conn, create_pool, run_migrations},
    services::auth_service::hash_password,
};
use rust_decimal::Decimal;
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let orm = create_orm_conn(&config.database_url).await?;
    // Ensure migrations are applied.
    run_migrations(&orm).await?;
    let pool = create_pool(&config.database_url).await?;

    let restaurant_id = ensure_restaurant(&pool, "Ferris Kitchen").await?;
    let admin_id = ensure_user(
        &pool,
        "admin@example.com",
        "Site Admin",
        "admin123",
        "admin",
        None,
    )
    .await?;
    let owner_id = ensure_user(
        &pool,
        "owner@example.com",
        "Restaurant Owner",
        "owner123",
        "restaurant_admin",
        Some(restaurant_id),
    )
    .await?;
    let user_id = ensure_user(
        &pool,
        "user@example.com",
        "Hungry Customer",
        "user123",
        "user",
        None,
    )
    .await?;
    seed_products(&pool, restaurant_id).await?;

    println!(
        "Seed completed. Admin ID: {admin_id}, Owner ID: {owner_id}, User ID: {user_id}, Restaurant ID: {restaurant_id}"
    );
    Ok(())
}

async fn ensure_restaurant(pool: &sqlx::PgPool, name: &str) -> anyhow::Result<Uuid> {
    let existing: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM restaurants WHERE name = $1")
        .bind(name)
        .fetch_optional(pool)
        .await?;
    if let Some((id,)) = existing {
        return Ok(id);
    }

    let id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO restaurants (id, name, description, delivery_time, is_partner,
                                 address, phone, email, delivery_fee, minimum_order)
        VALUES ($1, $2, $3, $4, TRUE, $5, $6, $7, $8, $9)
        "#,
    )
    .bind(id)
    .bind(name)
    .bind("Crab-shaped comfort food")
    .bind("25-35 min")
    .bind("1 Cargo Lane")
    .bind("+100000000")
    .bind("kitchen@example.com")
    .bind(Decimal::new(299, 2))
    .bind(Decimal::new(1000, 2))
    .execute(pool)
    .await?;

    println!("Seeded restaurant {name}");
    Ok(id)
}

async fn ensure_user(
    pool: &sqlx::PgPool,
    email: &str,
    name: &str,
    password: &str,
    role: &str,
    restaurant_id: Option<Uuid>,
) -> anyhow::Result<Uuid> {
    let password_hash = hash_password(password).map_err(|e| anyhow::anyhow!(e.to_string()))?;

    let (user_id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO users (id, email, name, password_hash, role, restaurant_id, is_superuser)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ON CONFLICT (email) DO UPDATE SET role = EXCLUDED.role, restaurant_id = EXCLUDED.restaurant_id
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(email)
    .bind(name)
    .bind(password_hash)
    .bind(role)
    .bind(restaurant_id)
    .bind(role == "admin")
    .fetch_one(pool)
    .await?;

    Ok(user_id)
}

async fn seed_products(pool: &sqlx::PgPool, restaurant_id: Uuid) -> anyhow::Result<()> {
    let products = vec![
        ("Borrow Checker Burger", "Double patty, no dangling references", 1250, None, false),
        ("Lifetime Fries", "Crispy for as long as they live", 450, Some(350), true),
        ("Async Ramen", "Noodles that never block", 1100, None, false),
        ("Ferris Shrimp Bowl", "Orange and proud of it", 1400, Some(1190), false),
    ];

    for (name, description, price, discount_price, is_flash_sale) in products {
        let exists: Option<(Uuid,)> =
            sqlx::query_as("SELECT id FROM products WHERE restaurant_id = $1 AND name = $2")
                .bind(restaurant_id)
                .bind(name)
                .fetch_optional(pool)
                .await?;
        if exists.is_some() {
            continue;
        }

        sqlx::query(
            r#"
            INSERT INTO products (id, restaurant_id, name, description, price, discount_price,
                                  is_flash_sale)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(restaurant_id)
        .bind(name)
        .bind(description)
        .bind(Decimal::new(price, 2))
        .bind(discount_price.map(|cents| Decimal::new(cents, 2)))
        .bind(is_flash_sale)
        .execute(pool)
        .await?;
    }

    println!("Seeded products");
    Ok(())
}
