use axum::Router;

use crate::state::AppState;

pub mod auth;
pub mod categories;
pub mod delivery_zones;
pub mod discounts;
pub mod doc;
pub mod favorites;
pub mod health;
pub mod notifications;
pub mod orders;
pub mod params;
pub mod payment_methods;
pub mod products;
pub mod restaurants;
pub mod reviews;
pub mod users;
pub mod wallet;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/users", auth::router().merge(users::router()))
        .nest("/restaurants", restaurants::router())
        .nest("/categories", categories::router())
        .nest("/products", products::router())
        .nest("/discounts", discounts::router())
        .nest("/orders", orders::router())
        .nest("/favorites", favorites::router())
        .nest("/wallet-transactions", wallet::router())
        .nest("/notifications", notifications::router())
        .nest("/reviews", reviews::router())
        .nest("/delivery-zones", delivery_zones::router())
        .nest("/payment-methods", payment_methods::router())
}
