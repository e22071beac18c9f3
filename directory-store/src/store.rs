//! SQLite access for the directory table.

use std::path::Path;

use rusqlite::{Connection, params};
use tracing::{debug, info};

use crate::{
    config::DirectoryConfig, errors::DirectoryError, record::DirectoryRecord, seed::SeedSet,
};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS doctors (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        doctor_name TEXT NOT NULL,
        specialty TEXT NOT NULL,
        hospital_clinic TEXT NOT NULL,
        location TEXT NOT NULL,
        city TEXT,
        contact_number TEXT NOT NULL
    );
";

/// Owns one SQLite connection to the directory database.
pub struct DirectoryStore {
    conn: Connection,
}

impl DirectoryStore {
    /// Opens (or creates) the database file at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DirectoryError> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;
        debug!(path = %path.display(), "opened directory database");
        Ok(Self { conn })
    }

    /// Private in-memory database, mostly for tests.
    pub fn in_memory() -> Result<Self, DirectoryError> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
        })
    }

    /// Drops the table, recreates it and writes `seed`, all in one transaction.
    ///
    /// Returns the number of inserted rows.
    pub fn reset(&mut self, seed: SeedSet) -> Result<usize, DirectoryError> {
        let tx = self.conn.transaction()?;
        tx.execute_batch("DROP TABLE IF EXISTS doctors;")?;
        tx.execute_batch(SCHEMA)?;
        let inserted = insert_all(&tx, &seed.records())?;
        tx.commit()?;
        info!(seed = %seed, inserted, "directory reset");
        Ok(inserted)
    }

    /// Creates the table when missing and seeds it only when empty.
    ///
    /// Older tables without a `city` column get one added (NULL for existing rows).
    ///
    /// Returns the number of inserted rows (0 when data was already present).
    pub fn ensure_seeded(&mut self, seed: SeedSet) -> Result<usize, DirectoryError> {
        let tx = self.conn.transaction()?;
        tx.execute_batch(SCHEMA)?;
        add_missing_city_column(&tx)?;
        let count: i64 = tx.query_row("SELECT COUNT(*) FROM doctors", [], |row| row.get(0))?;
        let inserted = if count == 0 {
            insert_all(&tx, &seed.records())?
        } else {
            0
        };
        tx.commit()?;
        debug!(existing = count, inserted, "directory seed check");
        Ok(inserted)
    }

    /// Reads every row in insertion (`rowid`) order and validates each one.
    ///
    /// A single malformed row fails the whole load.
    pub fn load_records(&self) -> Result<Vec<DirectoryRecord>, DirectoryError> {
        let mut stmt = self.conn.prepare(
            "SELECT doctor_name, specialty, hospital_clinic, location, city, contact_number
             FROM doctors ORDER BY rowid",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(DirectoryRecord {
                name: row.get::<_, Option<String>>(0)?.unwrap_or_default(),
                specialty: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                facility: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                locality: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
                city: row.get(4)?,
                contact: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
            })
        })?;

        let mut out = Vec::new();
        for (index, row) in rows.enumerate() {
            let record = row?;
            record.validate(index)?;
            out.push(record);
        }
        Ok(out)
    }

    /// Open + prepare + load according to `cfg`.
    pub fn bootstrap(cfg: &DirectoryConfig) -> Result<Vec<DirectoryRecord>, DirectoryError> {
        let mut store = if cfg.is_in_memory() {
            Self::in_memory()?
        } else {
            Self::open(&cfg.db_path)?
        };

        if cfg.reset_on_start {
            store.reset(cfg.seed)?;
        } else {
            store.ensure_seeded(cfg.seed)?;
        }

        let records = store.load_records()?;
        info!(
            path = %cfg.db_path.display(),
            records = records.len(),
            "directory loaded"
        );
        Ok(records)
    }

    /// [`DirectoryStore::bootstrap`] on the blocking pool.
    pub async fn bootstrap_async(
        cfg: DirectoryConfig,
    ) -> Result<Vec<DirectoryRecord>, DirectoryError> {
        tokio::task::spawn_blocking(move || Self::bootstrap(&cfg)).await?
    }
}

fn add_missing_city_column(conn: &Connection) -> Result<(), DirectoryError> {
    let mut stmt = conn.prepare("PRAGMA table_info(doctors)")?;
    let columns = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<Result<Vec<_>, _>>()?;
    if !columns.iter().any(|c| c == "city") {
        conn.execute_batch("ALTER TABLE doctors ADD COLUMN city TEXT;")?;
        info!("added missing city column to doctors table");
    }
    Ok(())
}

fn insert_all(conn: &Connection, records: &[DirectoryRecord]) -> Result<usize, DirectoryError> {
    let mut stmt = conn.prepare(
        "INSERT INTO doctors (doctor_name, specialty, hospital_clinic, location, city, contact_number)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )?;
    for r in records {
        stmt.execute(params![
            r.name,
            r.specialty,
            r.facility,
            r.locality,
            r.city,
            r.contact
        ])?;
    }
    Ok(records.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_replaces_previous_rows() {
        let mut store = DirectoryStore::in_memory().unwrap();
        assert_eq!(store.reset(SeedSet::Localities).unwrap(), 6);
        assert_eq!(store.reset(SeedSet::Clinics).unwrap(), 5);

        let records = store.load_records().unwrap();
        assert_eq!(records, SeedSet::Clinics.records());
    }

    #[test]
    fn ensure_seeded_keeps_existing_rows() {
        let mut store = DirectoryStore::in_memory().unwrap();
        assert_eq!(store.ensure_seeded(SeedSet::Clinics).unwrap(), 5);
        assert_eq!(store.ensure_seeded(SeedSet::Localities).unwrap(), 0);
        assert_eq!(store.load_records().unwrap().len(), 5);
    }

    #[test]
    fn load_preserves_insertion_order() {
        let mut store = DirectoryStore::in_memory().unwrap();
        store.reset(SeedSet::Localities).unwrap();
        let names: Vec<_> = store
            .load_records()
            .unwrap()
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names.first().map(String::as_str), Some("Dr. Ramesh Kumar"));
        assert_eq!(names.last().map(String::as_str), Some("Dr. Kavita Menon"));
    }

    #[test]
    fn ensure_seeded_adds_city_to_legacy_table() {
        let mut store = DirectoryStore::in_memory().unwrap();
        store
            .conn
            .execute_batch(
                "CREATE TABLE doctors (doctor_name TEXT, specialty TEXT,
                     hospital_clinic TEXT, location TEXT, contact_number TEXT);
                 INSERT INTO doctors VALUES
                     ('Dr. Priya Sharma', 'General Physician', 'Apollo Clinic', 'Bangalore', '080-12345678');",
            )
            .unwrap();

        assert_eq!(store.ensure_seeded(SeedSet::Clinics).unwrap(), 0);
        let records = store.load_records().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "Dr. Priya Sharma");
        assert_eq!(records[0].city, None);

        // second pass must not try to add the column again
        assert_eq!(store.ensure_seeded(SeedSet::Clinics).unwrap(), 0);
    }

    #[test]
    fn malformed_row_rejects_the_load() {
        let mut store = DirectoryStore::in_memory().unwrap();
        store.reset(SeedSet::Clinics).unwrap();
        store
            .conn
            .execute(
                "INSERT INTO doctors (doctor_name, specialty, hospital_clinic, location, contact_number)
                 VALUES ('Dr. X', 'Cardiologist', 'Clinic', 'Pune', '')",
                [],
            )
            .unwrap();

        match store.load_records() {
            Err(DirectoryError::InvalidRecord { index, field }) => {
                assert_eq!(index, 5);
                assert_eq!(field, "contact");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }
}
