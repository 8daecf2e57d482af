use bitedrop_api::{
    entity::users::UserRole,
    error::AppError,
    middleware::auth::AuthUser,
    policy::{
        self, Action, RecordOwner, Resource, Scope, authorize, can_modify, creation_restaurant,
    },
};
use uuid::Uuid;

fn actor(role: UserRole, restaurant_id: Option<Uuid>) -> AuthUser {
    AuthUser {
        user_id: Uuid::new_v4(),
        role,
        restaurant_id,
        is_superuser: false,
    }
}

#[test]
fn restaurant_admin_sees_only_own_products() {
    let r1 = Uuid::new_v4();
    let admin = actor(UserRole::RestaurantAdmin, Some(r1));

    let scope = authorize(Some(&admin), Resource::Product, Action::List).unwrap();
    assert_eq!(
        scope,
        Scope::Tenant {
            restaurant_id: r1,
            include_global: false
        }
    );
}

#[test]
fn restaurant_discounts_include_global_ones() {
    let r1 = Uuid::new_v4();
    let staff = actor(UserRole::Staff, Some(r1));

    let scope = policy::scope(Some(&staff), Resource::Discount);
    assert_eq!(
        scope,
        Scope::Tenant {
            restaurant_id: r1,
            include_global: true
        }
    );
}

#[test]
fn restaurant_role_without_restaurant_sees_no_catalog() {
    let orphan = actor(UserRole::Staff, None);
    assert_eq!(policy::scope(Some(&orphan), Resource::Product), Scope::Nothing);
    assert_eq!(policy::scope(Some(&orphan), Resource::Discount), Scope::Nothing);
}

#[test]
fn customers_and_anonymous_get_storefront_view() {
    let customer = actor(UserRole::User, None);
    assert_eq!(policy::scope(Some(&customer), Resource::Product), Scope::Public);
    assert_eq!(policy::scope(None, Resource::Product), Scope::Public);
    assert_eq!(policy::scope(None, Resource::Restaurant), Scope::Public);
    assert_eq!(
        policy::scope(Some(&customer), Resource::Order),
        Scope::Owner(customer.user_id)
    );
}

#[test]
fn anonymous_writes_are_unauthorized() {
    let err = authorize(None, Resource::Order, Action::Create).unwrap_err();
    assert!(matches!(err, AppError::Unauthorized));

    let err = authorize(None, Resource::Favorite, Action::List).unwrap_err();
    assert!(matches!(err, AppError::Unauthorized));
}

#[test]
fn super_admin_sees_everything_but_personal_resources_stay_personal() {
    let mut admin = actor(UserRole::User, None);
    admin.is_superuser = true;

    assert_eq!(policy::scope(Some(&admin), Resource::Order), Scope::All);
    assert_eq!(policy::scope(Some(&admin), Resource::Product), Scope::All);
    assert_eq!(
        policy::scope(Some(&admin), Resource::WalletTransaction),
        Scope::Owner(admin.user_id)
    );
    assert_eq!(
        policy::scope(Some(&admin), Resource::Notification),
        Scope::Owner(admin.user_id)
    );
}

#[test]
fn staff_may_create_but_not_modify_products() {
    let r1 = Uuid::new_v4();
    let staff = actor(UserRole::Staff, Some(r1));

    assert!(authorize(Some(&staff), Resource::Product, Action::Create).is_ok());
    let err = authorize(Some(&staff), Resource::Product, Action::Update).unwrap_err();
    assert!(matches!(err, AppError::Forbidden));
}

#[test]
fn creation_is_forced_onto_own_restaurant() {
    let r1 = Uuid::new_v4();
    let r2 = Uuid::new_v4();
    let admin = actor(UserRole::RestaurantAdmin, Some(r1));

    assert_eq!(creation_restaurant(&admin, Some(r2)).unwrap(), Some(r1));
    assert_eq!(creation_restaurant(&admin, None).unwrap(), Some(r1));

    let super_admin = actor(UserRole::Admin, None);
    assert_eq!(creation_restaurant(&super_admin, Some(r2)).unwrap(), Some(r2));

    let customer = actor(UserRole::User, None);
    assert!(matches!(
        creation_restaurant(&customer, Some(r2)),
        Err(AppError::Forbidden)
    ));
}

#[test]
fn restaurant_admin_cannot_modify_other_restaurant_records() {
    let r1 = Uuid::new_v4();
    let r2 = Uuid::new_v4();
    let admin = actor(UserRole::RestaurantAdmin, Some(r1));

    assert!(can_modify(&admin, RecordOwner::Restaurant(Some(r1))));
    assert!(!can_modify(&admin, RecordOwner::Restaurant(Some(r2))));
    assert!(!can_modify(&admin, RecordOwner::Restaurant(None)));
    assert!(can_modify(
        &admin,
        RecordOwner::Account {
            user_id: Uuid::new_v4(),
            restaurant_id: Some(r1)
        }
    ));
    assert!(!can_modify(
        &admin,
        RecordOwner::Account {
            user_id: Uuid::new_v4(),
            restaurant_id: Some(r2)
        }
    ));
}

#[test]
fn staff_management_is_limited_to_admins() {
    let r1 = Uuid::new_v4();
    let staff = actor(UserRole::Staff, Some(r1));
    let admin = actor(UserRole::RestaurantAdmin, Some(r1));

    assert!(matches!(
        authorize(Some(&staff), Resource::Staff, Action::List),
        Err(AppError::Forbidden)
    ));
    assert_eq!(
        authorize(Some(&admin), Resource::Staff, Action::Create).unwrap(),
        Scope::Tenant {
            restaurant_id: r1,
            include_global: false
        }
    );
}

#[test]
fn wallet_entries_are_append_only() {
    let customer = actor(UserRole::User, None);
    assert!(authorize(Some(&customer), Resource::WalletTransaction, Action::Create).is_ok());
    assert!(matches!(
        authorize(Some(&customer), Resource::WalletTransaction, Action::Update),
        Err(AppError::Forbidden)
    ));
    assert!(matches!(
        authorize(Some(&customer), Resource::WalletTransaction, Action::Delete),
        Err(AppError::Forbidden)
    ));
}

#[test]
fn customers_may_cancel_but_not_update_orders() {
    let customer = actor(UserRole::User, None);
    assert!(authorize(Some(&customer), Resource::Order, Action::Cancel).is_ok());
    assert!(matches!(
        authorize(Some(&customer), Resource::Order, Action::Update),
        Err(AppError::Forbidden)
    ));
}
