pub mod auth;
pub mod catalog;
pub mod categories;
pub mod discounts;
pub mod favorites;
pub mod notifications;
pub mod orders;
pub mod products;
pub mod restaurants;
pub mod reviews;
pub mod users;
pub mod wallet;
