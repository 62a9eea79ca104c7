//! Database abstraction layer.
//!
//! Repository traits with two backends:
//! - **SQLite**: the persistent store, accessed through `spawn_blocking`
//! - **In-memory**: for tests and quick local runs

pub mod memory;
pub mod repository;
pub mod schema;
pub mod sqlite;

pub use memory::InMemoryStore;
pub use repository::{
    ActivityRepository, Database, NudgeRepository, PreferenceRepository, UserRepository,
};
pub use sqlite::SqliteStore;

use crate::config::{DatabaseConfig, DatabaseDriver};

/// Create a database instance from configuration, seeding the shared
/// catalogue when enabled.
///
/// # Errors
///
/// Returns an error if the database cannot be opened or seeded.
pub async fn create_database(config: &DatabaseConfig) -> anyhow::Result<Database> {
    let database = match config.driver {
        DatabaseDriver::Sqlite => Database::Sqlite(SqliteStore::open(&config.path).await?),
        DatabaseDriver::Memory => Database::in_memory(),
    };

    if config.seed_catalogue {
        let seeded = database.seed_catalogue().await?;
        if seeded > 0 {
            tracing::info!("🌱 Seeded {} catalogue nudges", seeded);
        }
    }

    Ok(database)
}
