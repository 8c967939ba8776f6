// Record-store side of a stage reassignment

use std::rc::Rc;
use async_trait::async_trait;
use rusqlite::{Connection, ErrorCode};
use thiserror::Error;
use crate::repo::{LeadRepo, StageRepo};

/// Why the record store refused (or could not perform) a reassignment
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PersistError {
    #[error("lead not found")]
    NotFound,

    #[error("permission denied")]
    PermissionDenied,

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("record store unavailable: {0}")]
    Unavailable(String),
}

/// Durably records a lead's new stage.
///
/// Called once per committed drag; the board never retries.
#[async_trait(?Send)]
pub trait StagePersistence {
    async fn persist_stage(&self, lead_id: &str, stage_id: &str) -> Result<(), PersistError>;
}

/// `StagePersistence` over the local SQLite database
pub struct SqlitePersistence {
    conn: Rc<Connection>,
}

impl SqlitePersistence {
    pub fn new(conn: Rc<Connection>) -> Self {
        Self { conn }
    }
}

#[async_trait(?Send)]
impl StagePersistence for SqlitePersistence {
    async fn persist_stage(&self, lead_id: &str, stage_id: &str) -> Result<(), PersistError> {
        match StageRepo::get_by_id(&self.conn, stage_id) {
            Ok(Some(_)) => {}
            Ok(None) => return Err(PersistError::Validation(format!("unknown stage {}", stage_id))),
            Err(e) => return Err(classify(&e)),
        }

        match LeadRepo::update_stage(&self.conn, lead_id, stage_id) {
            Ok(true) => {
                log::debug!("Persisted lead {} -> stage {}", lead_id, stage_id);
                Ok(())
            }
            Ok(false) => Err(PersistError::NotFound),
            Err(e) => Err(classify(&e)),
        }
    }
}

/// Map a repository failure onto the persistence taxonomy
fn classify(err: &anyhow::Error) -> PersistError {
    match err.downcast_ref::<rusqlite::Error>() {
        Some(rusqlite::Error::SqliteFailure(failure, message)) => match failure.code {
            ErrorCode::ConstraintViolation => PersistError::Validation(
                message.clone().unwrap_or_else(|| "constraint violated".to_string()),
            ),
            ErrorCode::PermissionDenied | ErrorCode::ReadOnly | ErrorCode::AuthorizationForStatementDenied => {
                PersistError::PermissionDenied
            }
            _ => PersistError::Unavailable(format!("{:#}", err)),
        },
        _ => PersistError::Unavailable(format!("{:#}", err)),
    }
}
