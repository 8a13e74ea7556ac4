//! Persistence layer for the task scheduler: row models, repositories,
//! and the embedded-SQL migration runner (spec §4.6).

pub mod migration;
pub mod models;
pub mod pool;
pub mod repositories;

pub use migration::{embedded_migrations, Migration, Migrator};
pub use pool::connect;
