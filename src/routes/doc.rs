use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        auth::{
            LoginRequest, LoginResponse, PasswordChangeRequest, RefreshRequest, RegisterRequest,
            TokenPair,
        },
        catalog::{
            CreateDeliveryZoneRequest, CreatePaymentMethodRequest, DeliveryZoneList,
            PaymentMethodList, UpdateDeliveryZoneRequest, UpdatePaymentMethodRequest,
        },
        categories::{CategoryList, CreateCategoryRequest, UpdateCategoryRequest},
        discounts::{
            CreateDiscountRequest, DiscountCalculation, DiscountList, UpdateDiscountRequest,
        },
        favorites::{AddFavoriteRequest, FavoriteList, FavoriteProductList, FavoriteRestaurantList},
        notifications::{CreateNotificationRequest, MarkAllReadResponse, NotificationList},
        orders::{CreateOrderRequest, OrderDetail, OrderItemRequest, OrderList, UpdateOrderRequest},
        products::{CreateProductRequest, ProductList, UpdateProductRequest},
        restaurants::{CreateRestaurantRequest, RestaurantList, UpdateRestaurantRequest},
        reviews::{CreateReviewRequest, ReviewList, UpdateReviewRequest},
        users::{
            CreateStaffRequest, CreateUserRequest, ProvisionedUser, UpdateProfileRequest,
            UpdateStaffRequest, UpdateUserRequest, UserList,
        },
        wallet::{CreateWalletTransactionRequest, WalletBalance, WalletTransactionList},
    },
    models::{
        Category, DeliveryZone, Discount, Favorite, Notification, Order, OrderItem, PaymentMethod,
        Product, Restaurant, RestaurantRef, Review, User, WalletTransaction,
    },
    response::{ApiResponse, Meta},
    routes::{
        auth, categories, delivery_zones, discounts, favorites, health, notifications, orders,
        params, payment_methods, products, restaurants, reviews, users, wallet,
    },
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::register,
        auth::login,
        auth::refresh,
        auth::force_password_change,
        users::get_me,
        users::update_me,
        users::list_users,
        users::create_user,
        users::get_user,
        users::update_user,
        users::delete_user,
        users::list_staff,
        users::create_staff,
        users::get_staff,
        users::update_staff,
        users::delete_staff,
        restaurants::list_restaurants,
        restaurants::get_restaurant,
        restaurants::create_restaurant,
        restaurants::update_restaurant,
        restaurants::delete_restaurant,
        restaurants::list_restaurant_products,
        restaurants::list_restaurant_reviews,
        categories::list_categories,
        categories::get_category,
        categories::create_category,
        categories::update_category,
        categories::delete_category,
        delivery_zones::list_zones,
        delivery_zones::get_zone,
        delivery_zones::create_zone,
        delivery_zones::update_zone,
        delivery_zones::delete_zone,
        payment_methods::list_payment_methods,
        payment_methods::get_payment_method,
        payment_methods::create_payment_method,
        payment_methods::update_payment_method,
        payment_methods::delete_payment_method,
        products::list_products,
        products::flash_sale,
        products::discounted,
        products::get_product,
        products::create_product,
        products::update_product,
        products::delete_product,
        products::product_reviews,
        discounts::list_discounts,
        discounts::active_discounts,
        discounts::global_discounts,
        discounts::get_discount,
        discounts::calculate_discount,
        discounts::create_discount,
        discounts::update_discount,
        discounts::delete_discount,
        orders::list_orders,
        orders::create_order,
        orders::get_order,
        orders::update_order,
        orders::delete_order,
        orders::cancel_order,
        orders::confirm_order,
        orders::mark_delivered,
        favorites::list_favorites,
        favorites::add_favorite,
        favorites::favorite_products,
        favorites::favorite_restaurants,
        favorites::remove_favorite,
        wallet::list_transactions,
        wallet::create_transaction,
        wallet::balance,
        wallet::earned,
        wallet::redeemed,
        wallet::get_transaction,
        wallet::update_transaction,
        wallet::delete_transaction,
        notifications::list_notifications,
        notifications::unread_notifications,
        notifications::create_notification,
        notifications::get_notification,
        notifications::mark_read,
        notifications::mark_all_read,
        notifications::delete_notification,
        reviews::list_reviews,
        reviews::create_review,
        reviews::my_reviews,
        reviews::high_rated,
        reviews::get_review,
        reviews::update_review,
        reviews::delete_review
    ),
    components(
        schemas(
            User,
            Restaurant,
            RestaurantRef,
            Category,
            Product,
            Discount,
            Order,
            OrderItem,
            Review,
            Favorite,
            Notification,
            WalletTransaction,
            DeliveryZone,
            PaymentMethod,
            RegisterRequest,
            LoginRequest,
            LoginResponse,
            TokenPair,
            RefreshRequest,
            PasswordChangeRequest,
            UpdateProfileRequest,
            CreateUserRequest,
            UpdateUserRequest,
            CreateStaffRequest,
            UpdateStaffRequest,
            ProvisionedUser,
            UserList,
            CreateRestaurantRequest,
            UpdateRestaurantRequest,
            RestaurantList,
            CreateCategoryRequest,
            UpdateCategoryRequest,
            CategoryList,
            CreateDeliveryZoneRequest,
            UpdateDeliveryZoneRequest,
            DeliveryZoneList,
            CreatePaymentMethodRequest,
            UpdatePaymentMethodRequest,
            PaymentMethodList,
            CreateProductRequest,
            UpdateProductRequest,
            ProductList,
            CreateDiscountRequest,
            UpdateDiscountRequest,
            DiscountCalculation,
            DiscountList,
            OrderItemRequest,
            CreateOrderRequest,
            UpdateOrderRequest,
            OrderDetail,
            OrderList,
            AddFavoriteRequest,
            FavoriteList,
            FavoriteProductList,
            FavoriteRestaurantList,
            CreateWalletTransactionRequest,
            WalletBalance,
            WalletTransactionList,
            CreateNotificationRequest,
            MarkAllReadResponse,
            NotificationList,
            CreateReviewRequest,
            UpdateReviewRequest,
            ReviewList,
            params::Pagination,
            params::ProductQuery,
            params::RestaurantQuery,
            params::DiscountQuery,
            params::OrderListQuery,
            params::UserListQuery,
            Meta,
            ApiResponse<Product>,
            ApiResponse<ProductList>,
            ApiResponse<OrderDetail>,
            ApiResponse<OrderList>,
            ApiResponse<WalletBalance>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Registration, login and token endpoints"),
        (name = "Users", description = "Profile and user administration"),
        (name = "Staff", description = "Restaurant staff management"),
        (name = "Restaurants", description = "Restaurant endpoints"),
        (name = "Categories", description = "Category endpoints"),
        (name = "Delivery Zones", description = "Delivery zone endpoints"),
        (name = "Payment Methods", description = "Payment method endpoints"),
        (name = "Products", description = "Product endpoints"),
        (name = "Discounts", description = "Discount endpoints"),
        (name = "Orders", description = "Order endpoints"),
        (name = "Favorites", description = "Favorite endpoints"),
        (name = "Wallet", description = "Wallet ledger endpoints"),
        (name = "Notifications", description = "Notification endpoints"),
        (name = "Reviews", description = "Review endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
