//! Static specialist directory backed by SQLite.
//!
//! The table is reset and seeded on startup, then loaded once into memory as
//! validated [`DirectoryRecord`]s. Nothing writes to it while the server runs.

mod config;
mod errors;
mod record;
mod seed;
mod store;

pub use config::{DEFAULT_DB_PATH, DirectoryConfig};
pub use errors::DirectoryError;
pub use record::DirectoryRecord;
pub use seed::SeedSet;
pub use store::DirectoryStore;
