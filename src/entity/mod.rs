pub mod audit_logs;
pub mod categories;
pub mod delivery_zones;
pub mod discount_products;
pub mod discounts;
pub mod favorites;
pub mod notifications;
pub mod order_items;
pub mod orders;
pub mod payment_methods;
pub mod products;
pub mod restaurants;
pub mod reviews;
pub mod users;
pub mod wallet_transactions;

pub use audit_logs::Entity as AuditLogs;
pub use categories::Entity as Categories;
pub use delivery_zones::Entity as DeliveryZones;
pub use discount_products::Entity as DiscountProducts;
pub use discounts::Entity as Discounts;
pub use favorites::Entity as Favorites;
pub use notifications::Entity as Notifications;
pub use order_items::Entity as OrderItems;
pub use orders::Entity as Orders;
pub use payment_methods::Entity as PaymentMethods;
pub use products::Entity as Products;
pub use restaurants::Entity as Restaurants;
pub use reviews::Entity as Reviews;
pub use users::Entity as Users;
pub use wallet_transactions::Entity as WalletTransactions;
