use rusqlite::{Connection, OptionalExtension, Row};
use crate::models::Stage;
use crate::utils::fuzzy::{resolve_token, TokenMatch};
use anyhow::{Context, Result};

const STAGE_COLUMNS: &str = "id, pipeline_id, name, position, color, created_ts";

fn stage_from_row(row: &Row) -> rusqlite::Result<Stage> {
    Ok(Stage {
        id: row.get(0)?,
        pipeline_id: row.get(1)?,
        name: row.get(2)?,
        position: row.get(3)?,
        color: row.get(4)?,
        created_ts: row.get(5)?,
    })
}

/// Pipeline stage repository
///
/// The board works against a single pipeline: the oldest one in the
/// database (the seeded "Funil de Vendas" unless another was created first).
pub struct StageRepo;

impl StageRepo {
    /// Id of the pipeline the board shows, if any exists
    pub fn default_pipeline_id(conn: &Connection) -> Result<Option<String>> {
        let id = conn
            .query_row(
                "SELECT id FROM pipelines ORDER BY created_ts, id LIMIT 1",
                [],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id)
    }

    /// Stages of a pipeline ordered by position
    pub fn list_for_pipeline(conn: &Connection, pipeline_id: &str) -> Result<Vec<Stage>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM pipeline_stages WHERE pipeline_id = ?1 ORDER BY position, created_ts",
            STAGE_COLUMNS
        ))?;

        let rows = stmt.query_map([pipeline_id], stage_from_row)?;

        let mut stages = Vec::new();
        for row in rows {
            stages.push(row?);
        }
        Ok(stages)
    }

    /// Stages of the default pipeline; empty when no pipeline exists
    pub fn list_default(conn: &Connection) -> Result<Vec<Stage>> {
        match Self::default_pipeline_id(conn)? {
            Some(pipeline_id) => Self::list_for_pipeline(conn, &pipeline_id),
            None => Ok(Vec::new()),
        }
    }

    /// First stage of the default pipeline (where new leads land)
    pub fn first_stage(conn: &Connection) -> Result<Option<Stage>> {
        Ok(Self::list_default(conn)?.into_iter().next())
    }

    /// Get stage by id
    pub fn get_by_id(conn: &Connection, id: &str) -> Result<Option<Stage>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM pipeline_stages WHERE id = ?1",
            STAGE_COLUMNS
        ))?;
        let stage = stmt.query_row([id], stage_from_row).optional()?;
        Ok(stage)
    }

    /// Create a stage in a pipeline. Without an explicit position the stage is appended.
    pub fn create(
        conn: &Connection,
        pipeline_id: &str,
        name: &str,
        position: Option<i64>,
        color: Option<&str>,
    ) -> Result<Stage> {
        let position = match position {
            Some(p) => p,
            None => conn.query_row(
                "SELECT COALESCE(MAX(position) + 1, 0) FROM pipeline_stages WHERE pipeline_id = ?1",
                [pipeline_id],
                |row| row.get(0),
            )?,
        };

        let mut stage = Stage::new(name, position);
        stage.pipeline_id = Some(pipeline_id.to_string());
        stage.color = color.map(|c| c.to_string());

        conn.execute(
            "INSERT INTO pipeline_stages (id, pipeline_id, name, position, color, created_ts)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![
                stage.id,
                pipeline_id,
                stage.name,
                stage.position,
                stage.color,
                stage.created_ts
            ],
        )
        .with_context(|| format!("Failed to create stage: {}", name))?;

        Ok(stage)
    }

    /// Resolve a stage reference (id, unique id prefix or name) in the default pipeline
    pub fn resolve(conn: &Connection, token: &str) -> Result<Stage> {
        let stages = Self::list_default(conn)?;
        let candidates: Vec<(&str, &str)> = stages
            .iter()
            .map(|s| (s.id.as_str(), s.name.as_str()))
            .collect();

        match resolve_token(token, &candidates) {
            TokenMatch::Found(idx) => Ok(stages[idx].clone()),
            TokenMatch::Ambiguous(_) => anyhow::bail!("Stage '{}' is ambiguous", token),
            TokenMatch::NotFound(suggestions) if !suggestions.is_empty() => {
                anyhow::bail!("Stage '{}' not found. Did you mean: {}?", token, suggestions.join(", "))
            }
            TokenMatch::NotFound(_) => anyhow::bail!("Stage '{}' not found", token),
        }
    }
}
