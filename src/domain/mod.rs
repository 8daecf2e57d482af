//! Business rules that need no database: order transitions, ledger
//! arithmetic, rating aggregation and review/favorite target checks.

pub mod ledger;
pub mod order_flow;
pub mod rating;
pub mod targets;
