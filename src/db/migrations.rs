use rusqlite::{Connection, Result};
use std::collections::HashMap;

/// Current database schema version
const CURRENT_VERSION: u32 = 2;

/// Id of the pipeline created by migration v2
pub const DEFAULT_PIPELINE_ID: &str = "00000000-0000-4000-8000-000000000001";

/// Stages seeded into the default pipeline: (id, name, color)
const DEFAULT_STAGES: &[(&str, &str, &str)] = &[
    ("00000000-0000-4000-8000-000000000101", "Novo", "blue"),
    ("00000000-0000-4000-8000-000000000102", "Contato", "cyan"),
    ("00000000-0000-4000-8000-000000000103", "Visita", "yellow"),
    ("00000000-0000-4000-8000-000000000104", "Proposta", "magenta"),
    ("00000000-0000-4000-8000-000000000105", "Fechado", "green"),
];

/// Migration system for managing database schema versions
pub struct MigrationManager;

impl MigrationManager {
    /// Initialize the database with the current schema
    /// This creates the schema_version table and applies all migrations
    pub fn initialize(conn: &Connection) -> Result<()> {
        // Must be set outside of a transaction to take effect
        conn.execute_batch("PRAGMA foreign_keys=ON")?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY
            )",
            [],
        )?;

        let current_version = Self::get_version(conn).unwrap_or(0);

        for version in (current_version + 1)..=CURRENT_VERSION {
            log::debug!("Applying schema migration v{}", version);
            Self::apply_migration(conn, version)?;
        }

        Ok(())
    }

    /// Apply a specific migration by version number
    fn apply_migration(conn: &Connection, version: u32) -> Result<()> {
        let migrations = get_migrations();
        if let Some(migration) = migrations.get(&version) {
            let tx = conn.unchecked_transaction()?;
            migration(&tx)?;
            tx.execute(
                "INSERT INTO schema_version (version) VALUES (?1)",
                [version],
            )?;
            tx.commit()
        } else {
            Err(rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_MISUSE),
                Some(format!("No migration found for version {}", version)),
            ))
        }
    }

    /// Get the current schema version
    pub fn get_version(conn: &Connection) -> Result<u32> {
        conn.query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_version",
            [],
            |row| row.get(0),
        )
    }
}

/// Get all migrations indexed by version
fn get_migrations() -> HashMap<u32, fn(&rusqlite::Transaction) -> Result<(), rusqlite::Error>> {
    let mut migrations: HashMap<u32, fn(&rusqlite::Transaction) -> Result<(), rusqlite::Error>> = HashMap::new();
    migrations.insert(1, migration_v1);
    migrations.insert(2, migration_v2);
    migrations
}

/// Migration v1: pipelines, stages and leads
fn migration_v1(tx: &rusqlite::Transaction) -> Result<(), rusqlite::Error> {
    tx.execute(
        "CREATE TABLE pipelines (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            created_ts INTEGER NOT NULL
        )",
        [],
    )?;

    tx.execute(
        "CREATE TABLE pipeline_stages (
            id TEXT PRIMARY KEY,
            pipeline_id TEXT NOT NULL REFERENCES pipelines(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            position INTEGER NOT NULL DEFAULT 0,
            color TEXT NULL,
            created_ts INTEGER NOT NULL
        )",
        [],
    )?;
    tx.execute(
        "CREATE INDEX idx_pipeline_stages_pipeline_position ON pipeline_stages(pipeline_id, position)",
        [],
    )?;

    // stage_id is nullable: unassigned leads stay off the board
    tx.execute(
        "CREATE TABLE leads (
            id TEXT PRIMARY KEY,
            stage_id TEXT NULL REFERENCES pipeline_stages(id) ON DELETE SET NULL,
            name TEXT NOT NULL,
            email TEXT NULL,
            phone TEXT NULL,
            source TEXT NULL,
            interest_value REAL NULL,
            notes TEXT NULL,
            created_ts INTEGER NOT NULL,
            modified_ts INTEGER NOT NULL
        )",
        [],
    )?;
    tx.execute("CREATE INDEX idx_leads_stage_id ON leads(stage_id)", [])?;
    tx.execute("CREATE INDEX idx_leads_created_ts ON leads(created_ts)", [])?;

    Ok(())
}

/// Migration v2: default pipeline with its stages
fn migration_v2(tx: &rusqlite::Transaction) -> Result<(), rusqlite::Error> {
    let now = chrono::Utc::now().timestamp();

    tx.execute(
        "INSERT INTO pipelines (id, name, created_ts) VALUES (?1, ?2, ?3)",
        rusqlite::params![DEFAULT_PIPELINE_ID, "Funil de Vendas", now],
    )?;

    for (position, (id, name, color)) in DEFAULT_STAGES.iter().enumerate() {
        tx.execute(
            "INSERT INTO pipeline_stages (id, pipeline_id, name, position, color, created_ts)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![id, DEFAULT_PIPELINE_ID, name, position as i64, color, now],
        )?;
    }

    Ok(())
}
