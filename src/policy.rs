//! Multi-tenant visibility and mutation rules.
//!
//! Every service asks this module two questions before touching a table:
//! which rows the caller may see ([`Scope`]), and whether the caller may
//! attempt the action at all. Record-level ownership for updates and deletes
//! is answered by [`can_modify`] once the row has been loaded.

use uuid::Uuid;

use crate::{
    entity::users::UserRole,
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Restaurant,
    Category,
    Product,
    Discount,
    Order,
    User,
    Staff,
    Review,
    Favorite,
    Notification,
    WalletTransaction,
    DeliveryZone,
    PaymentMethod,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    List,
    Retrieve,
    Create,
    Update,
    Delete,
    /// Customer-facing order cancellation.
    Cancel,
}

/// Subset of an entity's rows visible to one identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    All,
    Nothing,
    /// Rows belonging to one restaurant. With `include_global`, rows that
    /// belong to no restaurant are visible too.
    Tenant {
        restaurant_id: Uuid,
        include_global: bool,
    },
    /// Rows owned by one user account (or, for users, the account itself).
    Owner(Uuid),
    /// The public storefront view: in-stock products, active restaurants,
    /// active discounts and catalogs.
    Public,
}

/// Who a loaded record belongs to, for update/delete checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOwner {
    /// Owned by a restaurant, `None` for global records.
    Restaurant(Option<Uuid>),
    /// Owned by a customer account.
    User(Uuid),
    /// A user account that may belong to a restaurant.
    Account {
        user_id: Uuid,
        restaurant_id: Option<Uuid>,
    },
}

/// Outcome of evaluating an action: the visible rows and whether the
/// caller may attempt the action at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub scope: Scope,
    pub allowed: bool,
}

pub fn decide(actor: Option<&AuthUser>, resource: Resource, action: Action) -> Decision {
    Decision {
        scope: scope(actor, resource),
        allowed: allowed(actor, resource, action),
    }
}

/// Scope for the action, or the failure to report: 401 for anonymous
/// callers, 403 for authenticated ones.
pub fn authorize(actor: Option<&AuthUser>, resource: Resource, action: Action) -> AppResult<Scope> {
    let decision = decide(actor, resource, action);
    if decision.allowed {
        return Ok(decision.scope);
    }
    match actor {
        None => Err(AppError::Unauthorized),
        Some(_) => Err(AppError::Forbidden),
    }
}

pub fn scope(actor: Option<&AuthUser>, resource: Resource) -> Scope {
    let Some(actor) = actor else {
        return match resource {
            Resource::Restaurant
            | Resource::Product
            | Resource::Discount
            | Resource::DeliveryZone
            | Resource::PaymentMethod => Scope::Public,
            Resource::Category => Scope::All,
            _ => Scope::Nothing,
        };
    };

    // Personal resources stay personal, even for super admins.
    match resource {
        Resource::Favorite | Resource::Notification | Resource::WalletTransaction => {
            return Scope::Owner(actor.user_id);
        }
        Resource::Category => return Scope::All,
        _ => {}
    }

    if actor.is_super_admin() {
        return Scope::All;
    }

    let tenant = actor.tenant();
    match resource {
        Resource::Product => match tenant {
            Some(restaurant_id) => Scope::Tenant {
                restaurant_id,
                include_global: false,
            },
            None if actor.role.is_restaurant_scoped() => Scope::Nothing,
            None => Scope::Public,
        },
        Resource::Discount => match tenant {
            Some(restaurant_id) => Scope::Tenant {
                restaurant_id,
                include_global: true,
            },
            None if actor.role.is_restaurant_scoped() => Scope::Nothing,
            None => Scope::Public,
        },
        Resource::Order => match tenant {
            Some(restaurant_id) => Scope::Tenant {
                restaurant_id,
                include_global: false,
            },
            None => Scope::Owner(actor.user_id),
        },
        Resource::User => match (actor.role, tenant) {
            (UserRole::RestaurantAdmin, Some(restaurant_id)) => Scope::Tenant {
                restaurant_id,
                include_global: false,
            },
            _ => Scope::Owner(actor.user_id),
        },
        Resource::Staff => match (actor.role, tenant) {
            (UserRole::RestaurantAdmin, Some(restaurant_id)) => Scope::Tenant {
                restaurant_id,
                include_global: false,
            },
            _ => Scope::Nothing,
        },
        Resource::Review => Scope::Owner(actor.user_id),
        Resource::Restaurant | Resource::DeliveryZone | Resource::PaymentMethod => Scope::Public,
        Resource::Category
        | Resource::Favorite
        | Resource::Notification
        | Resource::WalletTransaction => Scope::Owner(actor.user_id),
    }
}

fn allowed(actor: Option<&AuthUser>, resource: Resource, action: Action) -> bool {
    let Some(actor) = actor else {
        return matches!(action, Action::List | Action::Retrieve)
            && matches!(
                resource,
                Resource::Restaurant
                    | Resource::Category
                    | Resource::Product
                    | Resource::Discount
                    | Resource::DeliveryZone
                    | Resource::PaymentMethod
                    | Resource::Review
            );
    };

    let is_super = actor.is_super_admin();
    let tenant_admin = actor.role == UserRole::RestaurantAdmin && actor.tenant().is_some();
    let tenant_member = actor.tenant().is_some();

    match (resource, action) {
        (Resource::Staff, _) => is_super || tenant_admin,
        (_, Action::List | Action::Retrieve) => true,
        (Resource::Order, Action::Cancel) => true,
        (_, Action::Cancel) => false,

        (Resource::Restaurant, Action::Update) => is_super || tenant_admin,
        (Resource::Restaurant, _) => is_super,

        (Resource::Category | Resource::DeliveryZone | Resource::PaymentMethod, _) => is_super,

        (Resource::Product | Resource::Discount, Action::Create) => is_super || tenant_member,
        (Resource::Product | Resource::Discount, _) => is_super || tenant_admin,

        (Resource::Order, Action::Create) => true,
        (Resource::Order, Action::Update) => is_super || tenant_member,
        (Resource::Order, _) => is_super,

        (Resource::User, Action::Update) => true,
        (Resource::User, _) => is_super,

        (Resource::Review | Resource::Favorite, _) => true,

        (Resource::Notification, Action::Create) => is_super,
        (Resource::Notification, _) => true,

        (Resource::WalletTransaction, Action::Create) => true,
        (Resource::WalletTransaction, _) => false,
    }
}

/// Whether `actor` may update or delete a record owned by `owner`.
pub fn can_modify(actor: &AuthUser, owner: RecordOwner) -> bool {
    if actor.is_super_admin() {
        return true;
    }
    let tenant_admin_of = |restaurant_id: Option<Uuid>| {
        actor.role == UserRole::RestaurantAdmin
            && restaurant_id.is_some()
            && actor.tenant() == restaurant_id
    };

    match owner {
        RecordOwner::Restaurant(restaurant_id) => tenant_admin_of(restaurant_id),
        RecordOwner::User(user_id) => actor.user_id == user_id,
        RecordOwner::Account {
            user_id,
            restaurant_id,
        } => actor.user_id == user_id || tenant_admin_of(restaurant_id),
    }
}

pub fn ensure_can_modify(actor: &AuthUser, owner: RecordOwner) -> AppResult<()> {
    if can_modify(actor, owner) {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}

/// Restaurant a newly created tenant-owned record must carry.
///
/// Restaurant-bound callers always get their own restaurant, whatever the
/// request asked for. Super admins get what they asked for.
pub fn creation_restaurant(actor: &AuthUser, requested: Option<Uuid>) -> AppResult<Option<Uuid>> {
    if let Some(restaurant_id) = actor.tenant() {
        return Ok(Some(restaurant_id));
    }
    if actor.is_super_admin() {
        return Ok(requested);
    }
    Err(AppError::Forbidden)
}
