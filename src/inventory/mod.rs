//! Stock consistency core: portion calculation and the serving transaction.
//!
//! Both operations run against a unit of work ([`InventoryStore`] /
//! [`InventoryTx`]) owned by the caller, who decides when to commit.

#[cfg(test)]
pub mod memory;
pub mod model;
pub mod portions;
pub mod postgres;
pub mod serving;
pub mod store;

pub use model::{MaxPortions, ServingLog, ServingStatus};
pub use portions::max_portions;
pub use postgres::PgInventory;
pub use serving::{serve_meal, ServingError};
