use std::path::Path;

use soapbox_db::Database;

/// Open the database named by `SOAPBOX_DATABASE_URL`.
pub fn open(database_url: &str) -> anyhow::Result<Database> {
    if database_url == ":memory:" {
        tracing::warn!("Using an in-memory database; data is lost on exit");
        return Database::open_in_memory();
    }
    Database::open(Path::new(database_url))
}
