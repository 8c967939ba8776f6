use rusqlite::{Connection, OptionalExtension, Row};
use crate::models::Lead;
use crate::utils::fuzzy::{resolve_token, TokenMatch};
use anyhow::{Context, Result};

const LEAD_COLUMNS: &str =
    "id, name, phone, email, interest_value, stage_id, source, notes, created_ts, modified_ts";

fn lead_from_row(row: &Row) -> rusqlite::Result<Lead> {
    Ok(Lead {
        id: row.get(0)?,
        name: row.get(1)?,
        phone: row.get(2)?,
        email: row.get(3)?,
        interest_value: row.get(4)?,
        stage_id: row.get(5)?,
        source: row.get(6)?,
        notes: row.get(7)?,
        created_ts: row.get(8)?,
        modified_ts: row.get(9)?,
    })
}

/// Lead repository for database operations
///
/// # Example
///
/// ```no_run
/// use leadboard::config::Config;
/// use leadboard::db::DbConnection;
/// use leadboard::models::Lead;
/// use leadboard::repo::LeadRepo;
///
/// let conn = DbConnection::connect(&Config::default()).unwrap();
/// let lead = LeadRepo::create(&conn, &Lead::new("Ana")).unwrap();
/// ```
pub struct LeadRepo;

impl LeadRepo {
    /// Insert a lead as given (id and timestamps included)
    pub fn create(conn: &Connection, lead: &Lead) -> Result<Lead> {
        conn.execute(
            "INSERT INTO leads (id, name, phone, email, interest_value, stage_id, source, notes, created_ts, modified_ts)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            rusqlite::params![
                lead.id,
                lead.name,
                lead.phone,
                lead.email,
                lead.interest_value,
                lead.stage_id,
                lead.source,
                lead.notes,
                lead.created_ts,
                lead.modified_ts,
            ],
        )
        .with_context(|| format!("Failed to create lead: {}", lead.name))?;

        Ok(lead.clone())
    }

    /// Get lead by id
    pub fn get_by_id(conn: &Connection, id: &str) -> Result<Option<Lead>> {
        let mut stmt = conn.prepare(&format!("SELECT {} FROM leads WHERE id = ?1", LEAD_COLUMNS))?;
        let lead = stmt.query_row([id], lead_from_row).optional()?;
        Ok(lead)
    }

    /// All leads, newest first
    pub fn list(conn: &Connection) -> Result<Vec<Lead>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM leads ORDER BY created_ts DESC, rowid DESC",
            LEAD_COLUMNS
        ))?;

        let rows = stmt.query_map([], lead_from_row)?;

        let mut leads = Vec::new();
        for row in rows {
            leads.push(row?);
        }
        Ok(leads)
    }

    /// Set a lead's stage. Returns false when no lead has this id.
    pub fn update_stage(conn: &Connection, lead_id: &str, stage_id: &str) -> Result<bool> {
        let now = chrono::Utc::now().timestamp();
        let updated = conn
            .execute(
                "UPDATE leads SET stage_id = ?1, modified_ts = ?2 WHERE id = ?3",
                rusqlite::params![stage_id, now, lead_id],
            )
            .with_context(|| format!("Failed to update stage of lead {}", lead_id))?;
        Ok(updated > 0)
    }

    /// Resolve a lead reference (id, unique id prefix or name)
    pub fn resolve(conn: &Connection, token: &str) -> Result<Lead> {
        let leads = Self::list(conn)?;
        let candidates: Vec<(&str, &str)> = leads
            .iter()
            .map(|l| (l.id.as_str(), l.name.as_str()))
            .collect();

        match resolve_token(token, &candidates) {
            TokenMatch::Found(idx) => Ok(leads[idx].clone()),
            TokenMatch::Ambiguous(matches) => {
                let ids: Vec<&str> = matches.iter().map(|&i| short_id(&leads[i].id)).collect();
                anyhow::bail!("Lead '{}' is ambiguous (matches {})", token, ids.join(", "))
            }
            TokenMatch::NotFound(suggestions) if !suggestions.is_empty() => {
                anyhow::bail!("Lead '{}' not found. Did you mean: {}?", token, suggestions.join(", "))
            }
            TokenMatch::NotFound(_) => anyhow::bail!("Lead '{}' not found", token),
        }
    }
}

/// First 8 characters of an id, for display
pub fn short_id(id: &str) -> &str {
    match id.char_indices().nth(8) {
        Some((idx, _)) => &id[..idx],
        None => id,
    }
}
