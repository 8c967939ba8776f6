// Webhook-style lead ingestion
//
// Accepts one lead object or an array of them:
//   {"name": "Ana", "phone": "...", "email": "...", "interest_value": 350000,
//    "source": "site", "notes": "..."}
// Every imported lead lands in the first stage of the default pipeline.

use rusqlite::Connection;
use serde::Deserialize;
use anyhow::{Context, Result};
use crate::cli::error::{validate_email, validate_interest_value, validate_non_empty};
use crate::models::Lead;
use crate::repo::{LeadRepo, StageRepo};

const DEFAULT_SOURCE: &str = "webhook";

fn default_source() -> String {
    DEFAULT_SOURCE.to_string()
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LeadPayload {
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub interest_value: Option<f64>,
    #[serde(default = "default_source")]
    pub source: String,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Payload {
    Many(Vec<LeadPayload>),
    One(LeadPayload),
}

/// Parse a payload document into lead entries
pub fn parse_payload(content: &str) -> Result<Vec<LeadPayload>> {
    let payload: Payload = serde_json::from_str(content).context("Invalid lead payload")?;
    Ok(match payload {
        Payload::Many(entries) => entries,
        Payload::One(entry) => vec![entry],
    })
}

impl LeadPayload {
    /// Check the entry; `index` is only used to point at the offending entry
    pub fn validate(&self, index: usize) -> Result<(), String> {
        let at = |msg: String| format!("Entry {}: {}", index + 1, msg);
        validate_non_empty(&self.name, "Lead name").map_err(at)?;
        if let Some(email) = &self.email {
            validate_email(email).map_err(at)?;
        }
        if let Some(value) = self.interest_value {
            validate_interest_value(value).map_err(at)?;
        }
        Ok(())
    }

    fn into_lead(self, stage_id: Option<&str>) -> Lead {
        let mut lead = Lead::new(self.name.trim());
        lead.phone = self.phone.filter(|p| !p.trim().is_empty());
        lead.email = self.email;
        lead.interest_value = self.interest_value;
        lead.source = Some(self.source);
        lead.notes = self.notes;
        lead.stage_id = stage_id.map(str::to_string);
        lead
    }
}

/// Validate every entry, then insert all of them in one transaction.
/// Nothing is written when any entry is invalid.
pub fn import_leads(conn: &Connection, entries: Vec<LeadPayload>) -> Result<Vec<Lead>> {
    for (idx, entry) in entries.iter().enumerate() {
        if let Err(msg) = entry.validate(idx) {
            anyhow::bail!(msg);
        }
    }

    let first = StageRepo::first_stage(conn)?;
    if first.is_none() {
        log::warn!("No stages defined; imported leads will be unassigned");
    }
    let stage_id = first.as_ref().map(|s| s.id.as_str());

    let tx = conn.unchecked_transaction()?;
    let mut created = Vec::with_capacity(entries.len());
    for entry in entries {
        created.push(LeadRepo::create(&tx, &entry.into_lead(stage_id))?);
    }
    tx.commit().context("Failed to commit lead import")?;

    log::debug!("Imported {} lead(s)", created.len());
    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbConnection;

    #[test]
    fn test_parse_single_object() {
        let entries = parse_payload(r#"{"name": "Ana", "interest_value": 350000}"#).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "Ana");
        assert_eq!(entries[0].source, "webhook");
        assert_eq!(entries[0].interest_value, Some(350_000.0));
    }

    #[test]
    fn test_parse_array() {
        let entries = parse_payload(r#"[{"name": "Ana"}, {"name": "Bia", "source": "site"}]"#).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].source, "site");
    }

    #[test]
    fn test_parse_rejects_missing_name() {
        assert!(parse_payload(r#"{"phone": "123"}"#).is_err());
        assert!(parse_payload("not json").is_err());
    }

    #[test]
    fn test_validate() {
        let mut entry = parse_payload(r#"{"name": "Ana", "email": "ana@example.com"}"#).unwrap().remove(0);
        assert!(entry.validate(0).is_ok());

        entry.email = Some("ana".to_string());
        assert_eq!(
            entry.validate(2).unwrap_err(),
            "Entry 3: Invalid email: 'ana'. Email must contain '@'."
        );

        entry.email = None;
        entry.name = "  ".to_string();
        assert!(entry.validate(0).is_err());
    }

    #[test]
    fn test_import_into_first_stage() {
        let conn = DbConnection::connect_in_memory().unwrap();
        let first = StageRepo::first_stage(&conn).unwrap().unwrap();

        let entries = parse_payload(r#"[{"name": "Ana"}, {"name": "Bia", "phone": "11 99999-0000"}]"#).unwrap();
        let created = import_leads(&conn, entries).unwrap();

        assert_eq!(created.len(), 2);
        assert!(created.iter().all(|l| l.is_in(&first.id)));
        assert_eq!(created[0].source.as_deref(), Some("webhook"));
        assert_eq!(LeadRepo::list(&conn).unwrap().len(), 2);
    }

    #[test]
    fn test_import_is_all_or_nothing() {
        let conn = DbConnection::connect_in_memory().unwrap();
        let entries = parse_payload(r#"[{"name": "Ana"}, {"name": ""}]"#).unwrap();

        assert!(import_leads(&conn, entries).is_err());
        assert!(LeadRepo::list(&conn).unwrap().is_empty());
    }
}
